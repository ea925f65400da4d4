use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use url::Url;
use validator::{Validate, ValidationError};

use crate::error::QueryError;


/// One product search in one city, as registered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_price_range"))]
pub(crate) struct MarketplaceQuery {
    /// Human readable city name. Listings are fuzzy matched against it.
    #[validate(custom = "not_blank")]
    pub(crate) city: String,
    /// What to search for.
    #[validate(custom = "not_blank")]
    pub(crate) product: String,
    #[validate(range(min = 0, message = "minimum price must not be negative"))]
    pub(crate) min_price: f64,
    #[validate(range(min = 0, message = "maximum price must not be negative"))]
    pub(crate) max_price: f64,
    /// The marketplace's own identifier for the city, used in the search path.
    #[validate(custom = "not_blank")]
    pub(crate) city_code: String,
}


fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("must not be empty"));
        return Err(err);
    }
    Ok(())
}


fn validate_price_range(query: &MarketplaceQuery) -> Result<(), ValidationError> {
    if !query.min_price.is_finite() || !query.max_price.is_finite() {
        let mut err = ValidationError::new("price_not_finite");
        err.message = Some(Cow::Borrowed("prices must be finite numbers"));
        return Err(err);
    }
    if query.min_price > query.max_price {
        let mut err = ValidationError::new("price_range");
        err.message = Some(Cow::Borrowed("minimum price must not exceed maximum price"));
        return Err(err);
    }
    Ok(())
}


/// How strictly listings have to resemble the query to be kept.
///
/// Also sent to the marketplace as the `exact` search parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub(crate) enum MatchMode {
    #[default]
    Exact,
    Partial,
}


impl MatchMode {
    fn as_param(self) -> &'static str {
        match self {
            MatchMode::Exact => "true",
            MatchMode::Partial => "false",
        }
    }
}


impl MarketplaceQuery {
    /// Builds the search results URL for this query.
    ///
    /// The city code is pushed as a path segment and every parameter is form encoded,
    /// so URL-safe input comes out exactly as typed and anything else is escaped
    /// instead of corrupting the URL.
    pub(crate) fn search_url(&self, host: &str, mode: MatchMode) -> Result<Url, QueryError> {
        let url_error = |reason: &str| QueryError::Url { host: host.to_owned(), reason: reason.to_owned() };

        let mut url = Url::parse(&format!("https://{host}/marketplace"))
            .map_err(|e| url_error(&e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| url_error("host cannot carry a path"))?
            .push(&self.city_code)
            .push("search");
        url.query_pairs_mut()
            .append_pair("query", &self.product)
            .append_pair("minPrice", &self.min_price.to_string())
            .append_pair("maxPrice", &self.max_price.to_string())
            .append_pair("daysSinceListed", "1")
            .append_pair("exact", mode.as_param());
        Ok(url)
    }

    /// Name of this query's table inside the results archive.
    pub(crate) fn result_file_name(&self) -> String {
        let clean = |s: &str| s.replace(['/', '\\'], "_");
        format!("{}_{}_result.csv", clean(&self.city), clean(&self.product))
    }
}


/// The ordered list of queries a scrape runs over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct QueryList(Vec<MarketplaceQuery>);


impl QueryList {
    /// Appends `query` if it is valid. An invalid query leaves the list untouched.
    pub(crate) fn add(&mut self, query: MarketplaceQuery) -> Result<(), QueryError> {
        query.validate()?;
        self.0.push(query);
        Ok(())
    }

    pub(crate) fn remove(&mut self, position: usize) -> Result<MarketplaceQuery, QueryError> {
        if position >= self.0.len() {
            return Err(QueryError::OutOfRange { position, len: self.0.len() });
        }
        Ok(self.0.remove(position))
    }

    pub(crate) fn as_slice(&self) -> &[MarketplaceQuery] {
        &self.0
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &MarketplaceQuery> {
        self.0.iter()
    }
}
