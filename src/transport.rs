//! The HTTP collaborator seam.
//!
//! The core never speaks HTTP. It hands a [`Request`] to a [`Transport`] and
//! receives the response body as owned text, which is decoded and dropped by
//! the step that asked for it.

use std::collections::HashMap;

use parking_lot::Mutex;
use thiserror::Error;

use crate::util;

/// One GET against the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    /// URL path plus query, e.g. `/groups/g-1/links/d1`.
    pub endpoint: String,
    /// Domain (file) the request is scoped to.
    pub domain: String,
}

impl Request {
    pub fn new(endpoint: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            domain: domain.into(),
        }
    }
}

/// Failure reported by the transport collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Server answered with a non-success HTTP status
    #[error("HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    /// Request could not be completed
    #[error("request to {endpoint} failed: {message}")]
    Failed { endpoint: String, message: String },
}

impl TransportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Send a request, receive the response body.
pub trait Transport {
    fn fetch(&self, request: &Request) -> Result<String, TransportError>;

    /// Called once an external domain opened during resolution is no longer needed.
    fn release_domain(&self, _domain: &str) {}
}

impl<T: Transport + ?Sized> Transport for &T {
    fn fetch(&self, request: &Request) -> Result<String, TransportError> {
        (**self).fetch(request)
    }

    fn release_domain(&self, domain: &str) {
        (**self).release_domain(domain)
    }
}

/// In-memory transport serving canned responses.
///
/// Unknown requests answer 404. Every request and every domain release is
/// recorded in order.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    responses: HashMap<Request, String>,
    log: Mutex<Vec<Request>>,
    released: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response body for `endpoint` on `domain`.
    pub fn insert(&mut self, domain: &str, endpoint: &str, body: impl Into<String>) {
        self.responses.insert(Request::new(endpoint, domain), body.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, domain: &str, endpoint: &str, body: impl Into<String>) -> Self {
        self.insert(domain, endpoint, body);
        self
    }

    /// Load a store snapshot: `{"<domain>": {"<endpoint>": <body>, ...}, ...}`.
    ///
    /// Bodies may be JSON values or strings holding raw text.
    pub fn from_store_json(json: &str) -> util::Result<Self> {
        let doc: serde_json::Value = serde_json::from_str(json)?;
        let domains = doc
            .as_object()
            .ok_or_else(|| util::Error::parse("store snapshot is not an object"))?;

        let mut transport = Self::new();
        for (domain, endpoints) in domains {
            let endpoints = endpoints.as_object().ok_or_else(|| {
                util::Error::parse(format!("endpoints of domain '{domain}' are not an object"))
            })?;
            for (endpoint, body) in endpoints {
                let body = match body {
                    serde_json::Value::String(raw) => raw.clone(),
                    other => other.to_string(),
                };
                transport.insert(domain, endpoint, body);
            }
        }
        Ok(transport)
    }

    /// Requests served so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Domains released so far.
    pub fn released(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

impl Transport for MemoryTransport {
    fn fetch(&self, request: &Request) -> Result<String, TransportError> {
        tracing::trace!(endpoint = %request.endpoint, domain = %request.domain, "fetch");
        self.log.lock().push(request.clone());
        self.responses
            .get(request)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 404,
                endpoint: request.endpoint.clone(),
            })
    }

    fn release_domain(&self, domain: &str) {
        self.released.lock().push(domain.to_string());
    }
}
