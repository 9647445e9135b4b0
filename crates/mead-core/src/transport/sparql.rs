//! SPARQL 1.1 JSON results format

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::TransportError;

/// Media type requested from SPARQL endpoints
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// One result row: variable name to bound term
pub type Binding = HashMap<String, Term>;

#[derive(Debug, Deserialize)]
struct SelectResponse {
    results: ResultsBody,
}

#[derive(Debug, Deserialize)]
struct ResultsBody {
    #[serde(default)]
    bindings: Vec<Binding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    Literal,
    TypedLiteral,
    Bnode,
}

/// A bound RDF term
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Term {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(rename = "xml:lang", default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
}

impl Term {
    pub fn literal(value: impl Into<String>, lang: Option<&str>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            lang: lang.map(String::from),
            datatype: None,
        }
    }

    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: value.into(),
            lang: None,
            datatype: None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TermKind::Literal | TermKind::TypedLiteral)
    }

    pub fn is_blank(&self) -> bool {
        self.kind == TermKind::Bnode
    }

    /// Tagged `en` or an `en-*` variant
    pub fn is_english(&self) -> bool {
        self.lang
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case("en") || l.to_ascii_lowercase().starts_with("en-"))
    }

    pub fn is_untagged(&self) -> bool {
        self.lang.as_deref().is_none_or(str::is_empty)
    }
}

/// Parse a `SELECT` response body into rows
pub fn parse_select(body: &str) -> Result<Vec<Binding>, TransportError> {
    let response: SelectResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(response.results.bindings)
}

/// Values bound to `var` across rows, blank nodes and blank strings skipped.
/// Literals yield their lexical form and resources their URI.
pub fn column<'a>(rows: &'a [Binding], var: &str) -> impl Iterator<Item = &'a Term> + 'a {
    let var = var.to_string();
    rows.iter()
        .filter_map(move |row| row.get(&var))
        .filter(|term| !term.is_blank() && !term.value.trim().is_empty())
}
