//! Remote fetch transport for engine bundle sources.
//!
//! The resolver only ever needs "bytes for a URL", so that is the whole
//! trait. The host environment supplies the real transport; tests script
//! one, and offline mode swaps in a transport that refuses everything.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::error::TransportError;

/// Plain request/response transport to remote engine sources.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the resource at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the resource cannot be fetched;
    /// the resolver treats that as one failed source and moves on.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// HTTP transport over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Transport used when remote sources are disabled.
pub struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Offline)
    }
}

/// Scripted transport for tests: fixed responses per URL plus a fetch
/// counter, so de-duplication of concurrent loads is observable.
#[derive(Default)]
pub struct StaticTransport {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    fetches: AtomicU32,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock(&self, url: &str, body: impl Into<Vec<u8>>) {
        match self.responses.lock() {
            Ok(mut guard) => {
                guard.insert(url.to_string(), body.into());
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(url.to_string(), body.into());
            }
        }
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let body = match self.responses.lock() {
            Ok(guard) => guard.get(url).cloned(),
            Err(poisoned) => poisoned.into_inner().get(url).cloned(),
        };
        body.ok_or_else(|| TransportError::Status(404))
    }
}
