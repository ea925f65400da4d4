use url::Url;

use crate::{
    error::LoaderError,
    listings::{listings_from_page, ListingRecord, MatchCriteria},
    page_loader::{BrowserLauncher, PageLoader},
    query::{MarketplaceQuery, MatchMode, QueryList},
};


/// What one query produced.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryResult {
    pub(crate) query: MarketplaceQuery,
    /// In page order.
    pub(crate) listings: Vec<ListingRecord>,
    pub(crate) links_seen: usize,
}


#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryFailure {
    pub(crate) query: MarketplaceQuery,
    pub(crate) error: String,
}


/// The outcome of scraping every registered query, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ScrapeReport {
    pub(crate) results: Vec<QueryResult>,
    pub(crate) failures: Vec<QueryFailure>,
}


impl ScrapeReport {
    /// All listings of all queries, query by query.
    pub(crate) fn combined(&self) -> impl Iterator<Item = &ListingRecord> {
        self.results.iter().flat_map(|result| result.listings.iter())
    }

    pub(crate) fn total_listings(&self) -> usize {
        self.results.iter().map(|result| result.listings.len()).sum()
    }

    /// True if there was something to scrape and none of it could be scraped.
    pub(crate) fn all_failed(&self) -> bool {
        self.results.is_empty() && !self.failures.is_empty()
    }
}


/// Runs the load, extract and filter pipeline once per query.
pub(crate) struct ResultAggregator<L> {
    loader: PageLoader<L>,
    search_host: String,
    listing_base: Url,
    mode: MatchMode,
}


impl<L: BrowserLauncher> ResultAggregator<L> {
    pub(crate) fn new(loader: PageLoader<L>, search_host: String, listing_base: Url, mode: MatchMode) -> Self {
        Self { loader, search_host, listing_base, mode }
    }

    pub(crate) fn scrape_query(&self, query: &MarketplaceQuery) -> Result<QueryResult, LoaderError> {
        let url = query.search_url(&self.search_host, self.mode)?;
        let html = self.loader.load(&url)?;

        let criteria = MatchCriteria::new(&query.product, &query.city, self.mode);
        let page = listings_from_page(&html, &criteria, &self.listing_base);
        tracing::info!(
            city = %query.city,
            product = %query.product,
            links = page.links_seen,
            listings = page.records.len(),
            "scraped marketplace"
        );

        Ok(QueryResult { query: query.clone(), listings: page.records, links_seen: page.links_seen })
    }

    /// Scrapes every query in turn. A query that fails is recorded and skipped.
    pub(crate) fn run(&self, queries: &QueryList) -> ScrapeReport {
        let mut report = ScrapeReport::default();
        for query in queries.as_slice() {
            match self.scrape_query(query) {
                Ok(result) => report.results.push(result),
                Err(e) => {
                    tracing::warn!(city = %query.city, product = %query.product, error = %e, "scrape failed");
                    report.failures.push(QueryFailure { query: query.clone(), error: e.to_string() });
                }
            }
        }
        report
    }
}


/// The registered queries and the last scrape over them.
#[derive(Debug, Clone, Default)]
pub(crate) struct AppState {
    pub(crate) queries: QueryList,
    pub(crate) last_report: Option<ScrapeReport>,
}


impl AppState {
    pub(crate) fn new(queries: QueryList) -> Self {
        Self { queries, last_report: None }
    }

    /// Replaces the last report with a fresh scrape of all queries.
    pub(crate) fn scrape<L: BrowserLauncher>(&mut self, aggregator: &ResultAggregator<L>) -> &ScrapeReport {
        let report = aggregator.run(&self.queries);
        self.last_report.insert(report)
    }
}
