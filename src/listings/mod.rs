use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

pub(crate) mod fuzz;
pub(crate) mod matcher;

pub(crate) use matcher::{filter_candidates, MatchCriteria};


static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// A run of digits, possibly broken up by thousands separators or bullets, with an
/// optional decimal fraction.
static NUMERIC_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,•]*(?:\.\d+)?").unwrap());

/// What follows a number that makes it an age or a distance rather than a price:
/// a unit glued to the digits ("2d", "3h", "5mi"), a spelled out age ("2 days ago")
/// or a distance ("3 km", "12 miles").
static QUANTITY_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:(?:km|mi|m|min|mins|h|hr|hrs|d|w|wk|wks|mo|y|yr|yrs)\b",
        r"|\s*(?:minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?)\s+ago\b",
        r"|\s*(?:km|kilometers?|kilometres?|miles?)\b)",
    ))
    .unwrap()
});

const DISTANCE_MARKERS: [&str; 2] = ["km", "miles"];


/// An unvalidated link pulled out of a search results page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CandidateListing {
    /// The link's visible text, one trimmed non-empty entry per line.
    pub(crate) lines: Vec<String>,
    pub(crate) href: Option<String>,
}


/// A listing that passed the match filter. Columns of the exported tables follow
/// the field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ListingRecord {
    pub(crate) title: String,
    pub(crate) price: Option<f64>,
    pub(crate) location: String,
    /// Always absolute.
    pub(crate) url: String,
}


/// Collects every anchor of `html` in document order.
///
/// Never fails: an anchor without text or href simply yields an empty candidate.
pub(crate) fn extract_candidates(html: &str) -> Vec<CandidateListing> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .map(candidate_from_element)
        .collect()
}


fn candidate_from_element(element: ElementRef) -> CandidateListing {
    let lines = element
        .text()
        .flat_map(str::lines)
        .map(|line| line.replace('\u{a0}', " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    CandidateListing {
        lines,
        href: element.value().attr("href").map(str::to_string),
    }
}


impl CandidateListing {
    /// The text the match filter scores, lines joined by single spaces.
    pub(crate) fn text(&self) -> String {
        self.lines.join(" ")
    }

    /// The first number in the text that is not an age or a distance.
    pub(crate) fn price(&self) -> Option<f64> {
        self.lines.iter().find_map(|line| parse_price(line))
    }

    /// By convention the second line.
    pub(crate) fn title(&self) -> String {
        self.lines.get(1).cloned().unwrap_or_default()
    }

    /// The first line mentioning a distance, otherwise the last line.
    ///
    /// The title line is never taken as the location.
    pub(crate) fn location(&self) -> String {
        let by_distance = self
            .lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 1)
            .map(|(_, line)| line)
            .find(|line| {
                let lower = line.to_lowercase();
                DISTANCE_MARKERS.iter().any(|marker| lower.contains(marker))
            });

        match by_distance {
            Some(line) => line.clone(),
            None if self.lines.len() > 2 => self.lines[self.lines.len() - 1].clone(),
            None => String::new(),
        }
    }

    /// The absolute address of the listing. A missing or unparseable href resolves
    /// to `base` itself.
    pub(crate) fn absolute_url(&self, base: &Url) -> String {
        self.href
            .as_deref()
            .and_then(|href| base.join(href).ok())
            .unwrap_or_else(|| base.clone())
            .into()
    }

    pub(crate) fn into_record(self, base: &Url) -> ListingRecord {
        ListingRecord {
            title: self.title(),
            price: self.price(),
            location: self.location(),
            url: self.absolute_url(base),
        }
    }
}


fn parse_price(line: &str) -> Option<f64> {
    NUMERIC_RUN.find_iter(line).find_map(|run| {
        if QUANTITY_UNIT.is_match(&line[run.end()..]) {
            return None;
        }
        run.as_str().replace([',', '•'], "").parse().ok()
    })
}


/// Extracts, filters and finalises the listings of one loaded page.
pub(crate) fn listings_from_page(html: &str, criteria: &MatchCriteria, base: &Url) -> PageListings {
    let candidates = extract_candidates(html);
    let links_seen = candidates.len();
    let records = filter_candidates(candidates, criteria)
        .into_iter()
        .map(|candidate| candidate.into_record(base))
        .collect();
    PageListings { records, links_seen }
}


#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PageListings {
    pub(crate) records: Vec<ListingRecord>,
    /// How many links the page had before filtering.
    pub(crate) links_seen: usize,
}


#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
