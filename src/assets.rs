//! Non-blocking resource loading
//!
//! Each distinct URL is requested exactly once. Consumers hold a cheap
//! [`Resource`] handle and poll its readiness every frame; "pending" and
//! "failed" are ordinary states, never a reason to block or panic.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::error::PlaygroundError;

/// Shared, immutable payload of a loaded resource
pub type SharedBytes = Arc<[u8]>;

/// Why a fetch failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{url}: {reason}")]
pub struct LoadError {
    pub url: String,
    pub reason: String,
}

impl From<LoadError> for PlaygroundError {
    fn from(e: LoadError) -> Self {
        PlaygroundError::ResourceLoad {
            url: e.url,
            reason: e.reason,
        }
    }
}

type Slot = Arc<OnceLock<Result<SharedBytes, LoadError>>>;

/// Readiness of a resource at the moment it is polled
#[derive(Debug, PartialEq, Eq)]
pub enum Readiness<'a> {
    Pending,
    Ready(&'a SharedBytes),
    Failed(&'a LoadError),
}

/// Handle to a (possibly still loading) resource
#[derive(Debug, Clone)]
pub struct Resource {
    url: Arc<str>,
    slot: Slot,
}

impl Resource {
    fn new(url: &str) -> Self {
        Self {
            url: Arc::from(url),
            slot: Arc::new(OnceLock::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn readiness(&self) -> Readiness<'_> {
        match self.slot.get() {
            None => Readiness::Pending,
            Some(Ok(bytes)) => Readiness::Ready(bytes),
            Some(Err(e)) => Readiness::Failed(e),
        }
    }

    /// Payload if loaded
    pub fn ready(&self) -> Option<&SharedBytes> {
        match self.slot.get() {
            Some(Ok(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready().is_some()
    }

    /// Completion side for this resource
    fn sink(&self) -> ResourceSink {
        ResourceSink {
            url: self.url.clone(),
            slot: self.slot.clone(),
        }
    }
}

/// Completion handle passed to a [`Fetch`] implementation.
///
/// Resolving is one-shot; a second resolution is ignored.
#[derive(Debug)]
pub struct ResourceSink {
    url: Arc<str>,
    slot: Slot,
}

impl ResourceSink {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn resolve(self, result: std::result::Result<Vec<u8>, String>) {
        let value = match result {
            Ok(bytes) => {
                log::info!("Loaded {} ({} bytes)", self.url, bytes.len());
                Ok(SharedBytes::from(bytes))
            }
            Err(reason) => {
                let error = LoadError {
                    url: self.url.to_string(),
                    reason,
                };
                log::warn!("Resource unavailable, using fallback: {error}");
                Err(error)
            }
        };
        if self.slot.set(value).is_err() {
            log::debug!("{} resolved twice; keeping first result", self.url);
        }
    }
}

/// Starts an asynchronous fetch. Must return immediately and resolve the
/// sink later (from another thread, a future, or a test).
pub trait Fetch {
    fn fetch(&mut self, url: &str, sink: ResourceSink);
}

/// Issues one request per distinct URL and hands out shared handles
pub struct ResourceLoader<F: Fetch> {
    fetcher: F,
    requested: HashMap<String, Resource>,
}

impl<F: Fetch> ResourceLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            requested: HashMap::new(),
        }
    }

    /// Handle for `url`, starting the fetch on first request
    pub fn request(&mut self, url: &str) -> Resource {
        if let Some(existing) = self.requested.get(url) {
            return existing.clone();
        }
        let resource = Resource::new(url);
        self.requested.insert(url.to_string(), resource.clone());
        log::debug!("Requesting {url}");
        self.fetcher.fetch(url, resource.sink());
        resource
    }

    /// Number of distinct URLs requested so far
    pub fn requested_count(&self) -> usize {
        self.requested.len()
    }

    /// Resources not yet resolved either way
    pub fn pending_count(&self) -> usize {
        self.requested
            .values()
            .filter(|r| r.readiness() == Readiness::Pending)
            .count()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }
}
