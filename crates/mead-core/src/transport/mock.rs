//! Scripted transport for unit tests

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::sparql::{Binding, Term};
use super::{SelectRequest, TextRequest, Transport};
use crate::error::TransportError;

enum Reply {
    Rows(Vec<Binding>),
    Text(String),
    Fail(u16),
}

/// Answers requests by the first rule whose needle occurs in the query
/// (or in the URL plus parameters). Unmatched requests get no rows / 404.
#[derive(Default)]
pub struct ScriptedTransport {
    rules: Mutex<Vec<(String, Reply)>>,
    pub calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(self, needle: &str, var: &str, terms: Vec<Term>) -> Self {
        let rows = terms
            .into_iter()
            .map(|t| Binding::from([(var.to_string(), t)]))
            .collect();
        self.push(needle, Reply::Rows(rows))
    }

    pub fn text(self, needle: &str, body: &str) -> Self {
        self.push(needle, Reply::Text(body.to_string()))
    }

    pub fn fail(self, needle: &str, status: u16) -> Self {
        self.push(needle, Reply::Fail(status))
    }

    fn push(self, needle: &str, reply: Reply) -> Self {
        self.rules
            .lock()
            .unwrap()
            .push((needle.to_string(), reply));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request key seen so far
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    fn answer(&self, key: &str) -> Option<Result<Reply, TransportError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(key.to_string());
        let rules = self.rules.lock().unwrap();
        let (_, reply) = rules.iter().find(|(needle, _)| key.contains(needle.as_str()))?;
        Some(match reply {
            Reply::Rows(rows) => Ok(Reply::Rows(rows.clone())),
            Reply::Text(body) => Ok(Reply::Text(body.clone())),
            Reply::Fail(status) => Err(TransportError::Status(*status)),
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Binding>, TransportError> {
        match self.answer(&request.query) {
            None => Ok(Vec::new()),
            Some(Ok(Reply::Rows(rows))) => Ok(rows),
            Some(Ok(_)) => Err(TransportError::Decode("expected rows".to_string())),
            Some(Err(e)) => Err(e),
        }
    }

    async fn get_text(&self, request: &TextRequest) -> Result<String, TransportError> {
        let mut key = request.url.clone();
        for (k, v) in &request.params {
            key.push_str(&format!("&{}={}", k, v));
        }
        match self.answer(&key) {
            None => Err(TransportError::Status(404)),
            Some(Ok(Reply::Text(body))) => Ok(body),
            Some(Ok(_)) => Err(TransportError::Decode("expected text".to_string())),
            Some(Err(e)) => Err(e),
        }
    }
}
