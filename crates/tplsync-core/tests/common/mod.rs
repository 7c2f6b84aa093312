use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use tplsync_core::config::Source;
use tplsync_core::{Error, Fetcher, Result};

/// In-memory stand-in for the HTTP fetcher.
///
/// Unknown URLs answer 404. Every request is recorded with its headers.
#[derive(Default)]
pub struct MemoryFetcher {
    bodies: RefCell<HashMap<String, Vec<u8>>>,
    requests: RefCell<Vec<Source>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: impl AsRef<[u8]>) {
        self.bodies
            .borrow_mut()
            .insert(url.to_string(), body.as_ref().to_vec());
    }

    pub fn requests(&self) -> Vec<Source> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, source: &Source) -> Result<Vec<u8>> {
        self.requests.borrow_mut().push(source.clone());
        self.bodies
            .borrow()
            .get(&source.url)
            .cloned()
            .ok_or_else(|| Error::Fetch {
                url: source.url.clone(),
                status: 404,
            })
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap()
}
