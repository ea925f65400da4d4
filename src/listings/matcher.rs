use crate::query::MatchMode;

use super::fuzz::partial_ratio;
use super::CandidateListing;

const EXACT_PRODUCT_THRESHOLD: u8 = 70;
const EXACT_CITY_THRESHOLD: u8 = 50;
/// Partial mode keeps scores strictly above this.
const PARTIAL_PRODUCT_THRESHOLD: u8 = 50;


/// What a page's links are matched against.
#[derive(Debug, Clone)]
pub(crate) struct MatchCriteria {
    product: String,
    city: String,
    mode: MatchMode,
}


impl MatchCriteria {
    pub(crate) fn new(product: &str, city: &str, mode: MatchMode) -> Self {
        Self {
            product: product.to_lowercase(),
            city: city.to_lowercase(),
            mode,
        }
    }

    /// Whether a link with this text is a listing for the product in the city.
    pub(crate) fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        match self.mode {
            MatchMode::Exact => {
                partial_ratio(&self.product, &text) >= EXACT_PRODUCT_THRESHOLD
                    && partial_ratio(self.city.trim_end(), &text) >= EXACT_CITY_THRESHOLD
            }
            MatchMode::Partial => {
                partial_ratio(&self.product, &text) > PARTIAL_PRODUCT_THRESHOLD
                    && text.contains(&self.city)
            }
        }
    }
}


/// Keeps the candidates that match, in page order.
pub(crate) fn filter_candidates(candidates: Vec<CandidateListing>, criteria: &MatchCriteria) -> Vec<CandidateListing> {
    let total = candidates.len();
    let kept: Vec<_> = candidates
        .into_iter()
        .filter(|candidate| criteria.matches(&candidate.text()))
        .collect();
    tracing::debug!(total, kept = kept.len(), mode = ?criteria.mode, "filtered page links");
    kept
}


#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(lines: &[&str]) -> CandidateListing {
        CandidateListing {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            href: Some("/marketplace/item/1/".into()),
        }
    }

    #[test]
    fn exact_keeps_listing_naming_product_and_city() {
        let criteria = MatchCriteria::new("chair", "springfield", MatchMode::Exact);
        assert!(criteria.matches("Vintage wooden chair for sale in Springfield"));
    }

    #[test]
    fn exact_drops_unrelated_links() {
        let criteria = MatchCriteria::new("chair", "springfield", MatchMode::Exact);
        assert!(!criteria.matches("Log in or sign up"));
        assert!(!criteria.matches("Create new listing"));
    }

    #[test]
    fn exact_requires_the_city_too() {
        let criteria = MatchCriteria::new("chair", "springfield", MatchMode::Exact);
        assert!(!criteria.matches("chair"));
    }

    #[test]
    fn exact_tolerates_a_typo_and_trailing_city_whitespace() {
        let criteria = MatchCriteria::new("Chair", "Springfield  ", MatchMode::Exact);
        assert!(criteria.matches("$40 Old chiar Springfeld, IL"));
    }

    #[test]
    fn partial_needs_literal_city() {
        let criteria = MatchCriteria::new("chair", "springfield", MatchMode::Partial);
        assert!(criteria.matches("Chair Springfield, IL"));
        assert!(!criteria.matches("Chair Springfeld, IL"));
    }

    #[test]
    fn partial_threshold_is_strict() {
        // Best window is "a spr", sharing "ar" with "chair": exactly 40.
        let criteria = MatchCriteria::new("chair", "springfield", MatchMode::Partial);
        assert!(!criteria.matches("sofa springfield"));
    }

    #[test]
    fn partial_drops_a_score_of_exactly_50() {
        let criteria = MatchCriteria::new("abcd", "springfield", MatchMode::Partial);
        assert_eq!(partial_ratio("abcd", "abxx springfield"), 50);
        assert!(!criteria.matches("abxx springfield"));
        assert!(criteria.matches("abcx springfield"));
    }

    #[test]
    fn exact_keeps_a_product_score_of_exactly_70() {
        let criteria = MatchCriteria::new("abcdefghij", "springfield", MatchMode::Exact);
        assert_eq!(partial_ratio("abcdefghij", "abcdefgxyz springfield"), 70);
        assert!(criteria.matches("abcdefgxyz springfield"));
        assert_eq!(partial_ratio("abcdefghij", "abcdefxxyz springfield"), 60);
        assert!(!criteria.matches("abcdefxxyz springfield"));
    }

    #[test]
    fn exact_keeps_a_city_score_of_exactly_50() {
        let criteria = MatchCriteria::new("chair", "abcd", MatchMode::Exact);
        assert_eq!(partial_ratio("abcd", "chair abxx"), 50);
        assert!(criteria.matches("chair abxx"));
        assert_eq!(partial_ratio("abcd", "chair axxx"), 25);
        assert!(!criteria.matches("chair axxx"));
    }

    #[test]
    fn filter_preserves_page_order() {
        let criteria = MatchCriteria::new("chair", "springfield", MatchMode::Exact);
        let candidates = vec![
            candidate(&["$10", "Oak chair", "Springfield, IL"]),
            candidate(&["Marketplace"]),
            candidate(&["$25", "Rocking chair", "Springfield, IL"]),
        ];
        let kept = filter_candidates(candidates, &criteria);
        let titles: Vec<_> = kept.iter().map(CandidateListing::title).collect();
        assert_eq!(titles, ["Oak chair", "Rocking chair"]);
    }
}
