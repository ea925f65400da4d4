use std::{thread, time::Duration};

use serde_json::Value;
use url::Url;

use crate::error::LoaderError;

pub(crate) mod chrome;

pub(crate) use chrome::ChromeLauncher;


const PAGE_HEIGHT_SCRIPT: &str = "document.body.scrollHeight";
const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Dialogs that may cover the results, dismissed in this order when present.
const DIALOG_DISMISSALS: [&str; 2] = [
    r#"//div[@aria-label="Decline optional cookies" and @role="button"]"#,
    r#"//div[@aria-label="Close" and @role="button"]"#,
];


/// The few things a scrape needs from a browser tab.
pub(crate) trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), LoaderError>;

    /// Evaluates `script` in the page and returns its result.
    fn execute_script(&mut self, script: &str) -> Result<Value, LoaderError>;

    /// Locates the element matching the XPath `selector` and clicks it.
    fn click_element(&mut self, selector: &str) -> Result<(), LoaderError>;

    /// The current rendered markup.
    fn page_source(&mut self) -> Result<String, LoaderError>;

    fn close(&mut self) -> Result<(), LoaderError>;
}


/// Starts a fresh browser for every scrape.
pub(crate) trait BrowserLauncher {
    type Session: BrowserSession;

    fn launch(&self) -> Result<Self::Session, LoaderError>;
}


/// Timing of a page load.
#[derive(Debug, Clone)]
pub(crate) struct LoadSettings {
    /// Wait after navigation for the first render.
    pub(crate) settle_delay: Duration,
    /// Wait after each scroll for lazy content to arrive.
    pub(crate) scroll_delay: Duration,
    pub(crate) max_scrolls: u32,
}


impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(4),
            scroll_delay: Duration::from_secs(3),
            max_scrolls: 8,
        }
    }
}


pub(crate) struct PageLoader<L> {
    launcher: L,
    settings: LoadSettings,
}


impl<L: BrowserLauncher> PageLoader<L> {
    pub(crate) fn new(launcher: L, settings: LoadSettings) -> Self {
        Self { launcher, settings }
    }

    /// Loads `url` in a new browser, scrolls until nothing more appears and returns
    /// the rendered markup.
    ///
    /// The browser is closed before returning, whether loading succeeded or not.
    pub(crate) fn load(&self, url: &Url) -> Result<String, LoaderError> {
        let mut session = self.launcher.launch()?;
        let result = self.drive(&mut session, url);
        if let Err(e) = session.close() {
            tracing::warn!(error = %e, "browser was not released cleanly");
        }
        result
    }

    fn drive(&self, session: &mut L::Session, url: &Url) -> Result<String, LoaderError> {
        tracing::info!(url = %url, "loading search results");
        session.navigate(url.as_str())?;
        thread::sleep(self.settings.settle_delay);

        dismiss_dialogs(session);

        let scrolls = self.scroll_to_end(session)?;
        tracing::debug!(scrolls, "page fully loaded");

        session.page_source()
    }

    /// Scrolls to the bottom until the page stops growing or the cap is hit.
    /// Returns how many times it scrolled.
    fn scroll_to_end(&self, session: &mut L::Session) -> Result<u32, LoaderError> {
        let mut last_height = page_height(session)?;
        let mut scrolls = 0;

        while scrolls < self.settings.max_scrolls {
            session.execute_script(SCROLL_SCRIPT)?;
            scrolls += 1;
            thread::sleep(self.settings.scroll_delay);

            let new_height = page_height(session)?;
            if new_height <= last_height {
                break;
            }
            last_height = new_height;
        }

        Ok(scrolls)
    }
}


fn dismiss_dialogs<S: BrowserSession>(session: &mut S) {
    for selector in DIALOG_DISMISSALS {
        match session.click_element(selector) {
            Ok(()) => tracing::debug!(selector, "dismissed dialog"),
            Err(e) => tracing::debug!(selector, error = %e, "no dialog to dismiss"),
        }
    }
}


fn page_height<S: BrowserSession>(session: &mut S) -> Result<f64, LoaderError> {
    let value = session.execute_script(PAGE_HEIGHT_SCRIPT)?;
    value.as_f64().ok_or_else(|| LoaderError::NotANumber {
        script: PAGE_HEIGHT_SCRIPT.to_owned(),
        value: value.to_string(),
    })
}


#[cfg(test)]
pub(crate) mod fake;

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
