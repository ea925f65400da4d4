//! Partial fuzzy ratio.
//!
//! The shorter string is slid over the longer one and each alignment is scored with
//! the indel similarity `2 * lcs / (len_a + len_b)`. Alignments near the end of the
//! longer string are clipped rather than skipped, so a word cut off at the end of a
//! text still counts. The best alignment wins, scaled to 0..=100. A string wholly
//! contained in the other therefore scores 100, and missing or swapped characters
//! cost a few points each instead of failing the match outright.


/// Scores how well the shorter of `a` and `b` fits somewhere inside the longer one.
///
/// Comparison is by `char`, case sensitive. Returns 0 when either side is empty.
pub(crate) fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return 0;
    }

    let mut best = 0.0_f64;
    for start in 0..long.len() {
        let window = &long[start..long.len().min(start + short.len())];
        let common = longest_common_subsequence(short, window);
        let score = 2.0 * common as f64 / (short.len() + window.len()) as f64;
        best = best.max(score);
        if common == short.len() {
            break;
        }
    }

    (100.0 * best).round() as u8
}


fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}
