use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::{
    error::{ConfigError, QueryError},
    page_loader::LoadSettings,
    query::QueryList,
};

pub(crate) const DEFAULT_CONFIG_PATH: &str = "config.toml";


/// Everything the scraper remembers between runs, stored as TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Where the results archive is written.
    pub(crate) output_dir: PathBuf,
    pub(crate) loader: LoaderConfig,
    pub(crate) queries: QueryList,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LoaderConfig {
    /// Host the search pages are requested from.
    pub(crate) search_host: String,
    /// Listing links on the results page are resolved against this.
    pub(crate) listing_base: Url,
    pub(crate) settle_delay_secs: u64,
    pub(crate) scroll_delay_secs: u64,
    pub(crate) max_scrolls: u32,
    pub(crate) headless: bool,
}


impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results"),
            loader: LoaderConfig::default(),
            queries: QueryList::default(),
        }
    }
}


impl Default for LoaderConfig {
    fn default() -> Self {
        let settings = LoadSettings::default();
        Self {
            search_host: "www.facebook.com".into(),
            listing_base: Url::parse("https://web.facebook.com/").expect("default listing base is a valid URL"),
            settle_delay_secs: settings.settle_delay.as_secs(),
            scroll_delay_secs: settings.scroll_delay.as_secs(),
            max_scrolls: settings.max_scrolls,
            headless: true,
        }
    }
}


impl LoaderConfig {
    pub(crate) fn load_settings(&self) -> LoadSettings {
        LoadSettings {
            settle_delay: Duration::from_secs(self.settle_delay_secs),
            scroll_delay: Duration::from_secs(self.scroll_delay_secs),
            max_scrolls: self.max_scrolls,
        }
    }
}


impl Config {
    /// Reads the config at `path`. A missing file is an empty config.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path: path.to_owned(), source }),
        };
        Self::parse(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path: path.to_owned(), source },
            other => other,
        })
    }

    /// Parses config text, checking every stored query.
    pub(crate) fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse { path: PathBuf::new(), source })?;
        for (position, query) in config.queries.iter().enumerate() {
            query
                .validate()
                .map_err(|e| ConfigError::InvalidQuery { position, source: QueryError::Invalid(e) })?;
        }
        Ok(config)
    }

    pub(crate) fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::Write { path: path.to_owned(), source })
    }
}
