//! reqwest-backed transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::debug;

use super::sparql::{self, Binding, SPARQL_RESULTS_JSON};
use super::{SelectRequest, TextRequest, Transport};
use crate::error::{Error, Result, TransportError};

/// Connect timeout used when the builder is not given one
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// HTTP transport shared by every source client
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http_client: HttpClient,
}

/// Builder for creating an HttpTransport
#[derive(Default)]
pub struct HttpTransportBuilder {
    connect_timeout_ms: Option<u64>,
    pool_idle_per_host: Option<usize>,
}

impl HttpTransportBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TCP/TLS connect timeout
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = Some(ms);
        self
    }

    /// Cap idle connections kept per host
    pub fn pool_idle_per_host(mut self, max: usize) -> Self {
        self.pool_idle_per_host = Some(max);
        self
    }

    /// Build the HttpTransport
    pub fn build(self) -> Result<HttpTransport> {
        let mut builder = HttpClient::builder().connect_timeout(Duration::from_millis(
            self.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
        ));
        if let Some(max) = self.pool_idle_per_host {
            builder = builder.pool_max_idle_per_host(max);
        }

        let http_client = builder.build().map_err(Error::NetworkError)?;
        Ok(HttpTransport { http_client })
    }
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Result<Self> {
        HttpTransportBuilder::new().build()
    }

    /// Create a new builder for HttpTransport
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        accept: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> std::result::Result<String, TransportError> {
        let response = self
            .http_client
            .get(url)
            .query(params)
            .header(ACCEPT, accept)
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Non-success response");
            return Err(TransportError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| request_error(e, timeout))
    }
}

fn request_error(e: reqwest::Error, timeout: Duration) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(timeout.as_millis() as u64)
    } else {
        TransportError::Request(e)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn select(
        &self,
        request: &SelectRequest,
    ) -> std::result::Result<Vec<Binding>, TransportError> {
        debug!(endpoint = %request.endpoint, "Sending SPARQL select");
        let params = [("query".to_string(), request.query.clone())];
        let body = self
            .get(
                &request.endpoint,
                &params,
                SPARQL_RESULTS_JSON,
                &request.user_agent,
                request.timeout,
            )
            .await?;
        sparql::parse_select(&body)
    }

    async fn get_text(&self, request: &TextRequest) -> std::result::Result<String, TransportError> {
        debug!(url = %request.url, "Sending GET");
        self.get(
            &request.url,
            &request.params,
            "application/json",
            &request.user_agent,
            request.timeout,
        )
        .await
    }
}
