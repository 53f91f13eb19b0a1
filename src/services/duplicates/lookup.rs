//! Duplicate lookup transport.
//!
//! [`DuplicateLookup`] abstracts the single JSON request/response exchange
//! with the lookup service so the coordinator can be driven by fakes in
//! tests. [`HttpDuplicateLookup`] is the `reqwest` implementation.
//!
//! # Error Handling
//!
//! Every non-success outcome (connect failure, timeout, non-2xx status,
//! undecodable body) maps to [`Error::Lookup`]. There are no retries: a later
//! edit will issue a fresh lookup anyway.

use crate::models::{DuplicateCandidate, DuplicateCheckRequest, DuplicateCheckResponse};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;

use super::config::DuplicateCheckConfig;

/// Trait for duplicate lookup backends.
///
/// Allows for different implementations (HTTP, scripted fakes for testing).
pub trait DuplicateLookup: Send + Sync + 'static {
    /// Asks the lookup service for records similar to the request's attributes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lookup`] if no usable answer was obtained.
    fn lookup(
        &self,
        request: DuplicateCheckRequest,
    ) -> impl Future<Output = Result<Vec<DuplicateCandidate>>> + Send;
}

impl<T: DuplicateLookup> DuplicateLookup for Arc<T> {
    fn lookup(
        &self,
        request: DuplicateCheckRequest,
    ) -> impl Future<Output = Result<Vec<DuplicateCandidate>>> + Send {
        T::lookup(self, request)
    }
}

/// HTTP lookup backend using reqwest.
pub struct HttpDuplicateLookup {
    /// HTTP client with connection pooling.
    client: reqwest::Client,
    /// Endpoint the request is posted to.
    endpoint: String,
}

impl HttpDuplicateLookup {
    /// Creates a new HTTP lookup backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the HTTP client cannot be built.
    pub fn new(config: &DuplicateCheckConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| Error::OperationFailed {
                operation: "build_http_client".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Returns the endpoint requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DuplicateLookup for HttpDuplicateLookup {
    async fn lookup(&self, request: DuplicateCheckRequest) -> Result<Vec<DuplicateCandidate>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Lookup {
                status: e.status().map(|s| s.as_u16()),
                cause: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Lookup {
                status: Some(status.as_u16()),
                cause: format!("HTTP {} response", status.as_u16()),
            });
        }

        let body: DuplicateCheckResponse = response.json().await.map_err(|e| Error::Lookup {
            status: Some(status.as_u16()),
            cause: format!("invalid response body: {e}"),
        })?;

        Ok(body.into_candidates())
    }
}
