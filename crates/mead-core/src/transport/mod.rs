//! Raw transport to remote endpoints
//!
//! A [`Transport`] executes SPARQL `SELECT` queries and plain GET requests.
//! Failures come back as [`TransportError`] values; callers turn them into
//! empty contributions.

pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod sparql;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

pub use http::{HttpTransport, HttpTransportBuilder};
pub use sparql::{Binding, Term, TermKind};

/// A SPARQL `SELECT` against one endpoint
#[derive(Debug, Clone)]
pub struct SelectRequest {
    pub endpoint: String,
    pub query: String,
    pub user_agent: String,
    pub timeout: Duration,
}

/// A GET request expecting a text (usually JSON) body
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl TextRequest {
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            user_agent: user_agent.into(),
            timeout,
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }
}

/// Remote query execution
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run a `SELECT` and return its rows
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Binding>, TransportError>;

    /// GET a URL and return the body of a successful response
    async fn get_text(&self, request: &TextRequest) -> Result<String, TransportError>;
}

/// Bound a transport call by `limit`, mapping expiry to [`TransportError::Timeout`]
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit.as_millis() as u64)),
    }
}

/// [`Transport::select`] under the request's own timeout
pub async fn select(
    transport: &dyn Transport,
    request: &SelectRequest,
) -> Result<Vec<Binding>, TransportError> {
    bounded(request.timeout, transport.select(request)).await
}

/// [`Transport::get_text`] under the request's own timeout
pub async fn get_text(
    transport: &dyn Transport,
    request: &TextRequest,
) -> Result<String, TransportError> {
    bounded(request.timeout, transport.get_text(request)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl Transport for Stalled {
        async fn select(&self, _request: &SelectRequest) -> Result<Vec<Binding>, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        }

        async fn get_text(&self, _request: &TextRequest) -> Result<String, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_times_out() {
        let request = SelectRequest {
            endpoint: "http://localhost/sparql".to_string(),
            query: "SELECT * WHERE {}".to_string(),
            user_agent: "test".to_string(),
            timeout: Duration::from_millis(250),
        };

        let err = select(&Stalled, &request).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(250)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_text_times_out() {
        let request = TextRequest::new("http://localhost/api.php", "test", Duration::from_millis(40))
            .param("action", "parse");

        let err = get_text(&Stalled, &request).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn test_bounded_passes_through() {
        let value = bounded(Duration::from_secs(1), async { Ok::<_, TransportError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
