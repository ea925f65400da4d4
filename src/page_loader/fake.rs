//! An in-memory browser that replays canned pages.

use std::{cell::RefCell, rc::Rc};

use serde_json::Value;

use super::{BrowserLauncher, BrowserSession, PAGE_HEIGHT_SCRIPT, SCROLL_SCRIPT};
use crate::error::LoaderError;


/// A page served for every URL containing `url_fragment`.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakePage {
    pub(crate) url_fragment: String,
    pub(crate) markup: String,
    /// Page height after 0, 1, 2, ... scrolls. The last value repeats.
    pub(crate) heights: Vec<f64>,
    /// XPath selectors of the dialogs showing on this page.
    pub(crate) dialogs: Vec<String>,
}


/// Everything the fake saw, shared between the launcher and its sessions.
#[derive(Debug, Default)]
pub(crate) struct FakeLog {
    pub(crate) launches: usize,
    pub(crate) closes: usize,
    pub(crate) navigations: Vec<String>,
    pub(crate) scrolls: usize,
    pub(crate) clicked: Vec<String>,
}


#[derive(Debug, Clone, Default)]
pub(crate) struct FakeBrowser {
    pub(crate) pages: Vec<FakePage>,
    pub(crate) fail_launch: bool,
    pub(crate) fail_close: bool,
    pub(crate) log: Rc<RefCell<FakeLog>>,
}


impl FakeBrowser {
    pub(crate) fn with_page(page: FakePage) -> Self {
        Self { pages: vec![page], ..Default::default() }
    }
}


pub(crate) struct FakeSession {
    pages: Vec<FakePage>,
    current: Option<FakePage>,
    scrolls: usize,
    fail_close: bool,
    log: Rc<RefCell<FakeLog>>,
}


impl BrowserLauncher for FakeBrowser {
    type Session = FakeSession;

    fn launch(&self) -> Result<FakeSession, LoaderError> {
        if self.fail_launch {
            return Err(LoaderError::Launch("no browser installed".into()));
        }
        self.log.borrow_mut().launches += 1;
        Ok(FakeSession {
            pages: self.pages.clone(),
            current: None,
            scrolls: 0,
            fail_close: self.fail_close,
            log: Rc::clone(&self.log),
        })
    }
}


impl FakeSession {
    fn page(&self) -> Result<&FakePage, LoaderError> {
        self.current
            .as_ref()
            .ok_or_else(|| LoaderError::PageSource("nothing loaded".into()))
    }
}


impl BrowserSession for FakeSession {
    fn navigate(&mut self, url: &str) -> Result<(), LoaderError> {
        self.log.borrow_mut().navigations.push(url.to_owned());
        let page = self
            .pages
            .iter()
            .find(|page| url.contains(&page.url_fragment))
            .cloned()
            .ok_or_else(|| LoaderError::Navigation { url: url.to_owned(), reason: "net::ERR_NAME_NOT_RESOLVED".into() })?;
        self.current = Some(page);
        Ok(())
    }

    fn execute_script(&mut self, script: &str) -> Result<Value, LoaderError> {
        match script {
            SCROLL_SCRIPT => {
                self.scrolls += 1;
                self.log.borrow_mut().scrolls += 1;
                Ok(Value::Null)
            }
            PAGE_HEIGHT_SCRIPT => {
                let heights = &self.page()?.heights;
                let height = heights.get(self.scrolls).or(heights.last()).copied().unwrap_or(0.0);
                Ok(Value::from(height))
            }
            other => Err(LoaderError::Script { script: other.to_owned(), reason: "unknown script".into() }),
        }
    }

    fn click_element(&mut self, selector: &str) -> Result<(), LoaderError> {
        if !self.page()?.dialogs.iter().any(|d| d == selector) {
            return Err(LoaderError::Element { selector: selector.to_owned(), reason: "no such element".into() });
        }
        self.log.borrow_mut().clicked.push(selector.to_owned());
        Ok(())
    }

    fn page_source(&mut self) -> Result<String, LoaderError> {
        Ok(self.page()?.markup.clone())
    }

    fn close(&mut self) -> Result<(), LoaderError> {
        self.log.borrow_mut().closes += 1;
        if self.fail_close {
            return Err(LoaderError::Close("tab already gone".into()));
        }
        Ok(())
    }
}
