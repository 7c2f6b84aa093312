//! The HTTP seam
//!
//! The engine only needs "bytes for a URL with headers, failing on non-2xx".
//! [`Fetcher`] captures that so tests can substitute an in-memory source.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::Source;
use crate::{Error, Result};

const FETCH_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads the full body of a [`Source`]
pub trait Fetcher {
    fn fetch(&self, source: &Source) -> Result<Vec<u8>>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, source: &Source) -> Result<Vec<u8>> {
        (**self).fetch(source)
    }
}

/// Blocking `reqwest` fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tplsync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(FETCH_CONNECT_TIMEOUT)
            .timeout(FETCH_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Transport {
                url: String::new(),
                message: format!("failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, source: &Source) -> Result<Vec<u8>> {
        let transport = |e: reqwest::Error| Error::Transport {
            url: source.url.clone(),
            message: e.to_string(),
        };

        let mut request = self.client.get(&source.url);
        for (name, value) in &source.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!(url = %source.url, headers = source.headers.len(), "Fetching source");
        let response = request.send().map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                url: source.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(transport)?;
        tracing::debug!(url = %source.url, size = body.len(), "Fetched source");
        Ok(body.to_vec())
    }
}
