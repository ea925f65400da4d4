use std::{ffi::OsStr, sync::Arc};

use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;

use super::{BrowserLauncher, BrowserSession};
use crate::error::LoaderError;

const CHROME_ARGS: [&str; 3] = ["--disable-gpu", "--disable-dev-shm-usage", "--disable-quic"];


/// Launches a local Chrome without sandbox or GPU.
#[derive(Debug, Clone)]
pub(crate) struct ChromeLauncher {
    pub(crate) headless: bool,
}


impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> Result<ChromeSession, LoaderError> {
        let options = LaunchOptions::default_builder()
            .headless(self.headless)
            .sandbox(false)
            .args(CHROME_ARGS.into_iter().map(OsStr::new).collect())
            .build()
            .map_err(|e| LoaderError::Launch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| LoaderError::Launch(format!("{e:#}")))?;
        let tab = browser.new_tab().map_err(|e| LoaderError::Launch(format!("{e:#}")))?;
        tracing::debug!(headless = self.headless, "browser launched");

        Ok(ChromeSession { _browser: browser, tab })
    }
}


/// One tab in a browser owned by this session. Dropping the session ends the
/// browser process.
pub(crate) struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}


impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), LoaderError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| LoaderError::Navigation { url: url.to_owned(), reason: format!("{e:#}") })?;
        Ok(())
    }

    fn execute_script(&mut self, script: &str) -> Result<Value, LoaderError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| LoaderError::Script { script: script.to_owned(), reason: format!("{e:#}") })?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn click_element(&mut self, selector: &str) -> Result<(), LoaderError> {
        let element_error = |e: anyhow::Error| LoaderError::Element { selector: selector.to_owned(), reason: format!("{e:#}") };
        let element = self.tab.find_element_by_xpath(selector).map_err(element_error)?;
        element.click().map_err(element_error)?;
        Ok(())
    }

    fn page_source(&mut self) -> Result<String, LoaderError> {
        self.tab.get_content().map_err(|e| LoaderError::PageSource(format!("{e:#}")))
    }

    fn close(&mut self) -> Result<(), LoaderError> {
        self.tab
            .close(true)
            .map_err(|e| LoaderError::Close(format!("{e:#}")))?;
        Ok(())
    }
}
