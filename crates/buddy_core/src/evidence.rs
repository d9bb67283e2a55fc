//! External evidence client.
//!
//! Wraps the remote literature-search API (PubMed E-utilities: esearch for
//! ids, esummary for article metadata) behind the shared rate limiter and
//! normalizes the provider's heterogeneous fields into the canonical
//! citation shape.
//!
//! `search` always resolves. Upstream failure, timeout or a malformed
//! payload degrades to an empty citation list with an explicit fallback
//! reason, so callers render a lower-quality but valid answer instead of an
//! error.

use crate::citations::Citation;
use crate::config::ExternalSearchConfig;
use crate::rate_limiter::RateLimiter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Why a search degraded instead of returning live results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FallbackReason {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider timed out")]
    Timeout,
    #[error("malformed provider payload: {0}")]
    MalformedPayload(String),
}

/// Outcome of an evidence search. Never an error: a degraded search is a
/// normal value with `fallback` set.
#[derive(Debug, Clone)]
pub struct EvidenceSearch {
    pub citations: Vec<Citation>,
    pub fallback: Option<FallbackReason>,
}

impl EvidenceSearch {
    pub fn degraded(reason: FallbackReason) -> Self {
        Self {
            citations: Vec::new(),
            fallback: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Transport-level failures, mapped to fallback reasons by the client.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("invalid JSON: {0}")]
    Decode(String),
}

/// Seam between the client and the wire so tests can inject canned or
/// failing transports.
#[async_trait::async_trait]
pub trait SearchTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError>;
}

/// Production transport over reqwest.
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("buddy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl SearchTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError> {
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Article metadata as the provider reports it, before it becomes a citation.
#[derive(Debug, Clone)]
pub struct ProviderArticle {
    pub id: String,
    pub title: String,
    pub journal: String,
    pub year: Option<String>,
    pub authors: Vec<String>,
}

impl ProviderArticle {
    pub fn into_citation(self) -> Citation {
        Citation::pubmed(
            self.title,
            format!("https://pubmed.ncbi.nlm.nih.gov/{}/", self.id),
            self.year,
        )
    }
}

/// Client for the external literature-search provider. All outbound calls
/// pass through the process-wide rate limiter.
pub struct EvidenceClient {
    transport: Arc<dyn SearchTransport>,
    limiter: Arc<RateLimiter>,
    config: ExternalSearchConfig,
}

impl EvidenceClient {
    pub fn new(config: ExternalSearchConfig, limiter: Arc<RateLimiter>) -> anyhow::Result<Self> {
        let transport = Arc::new(HttpTransport::new(Duration::from_millis(config.timeout_ms))?);
        Ok(Self::with_transport(config, limiter, transport))
    }

    /// Build with a custom transport (tests, alternative providers).
    pub fn with_transport(
        config: ExternalSearchConfig,
        limiter: Arc<RateLimiter>,
        transport: Arc<dyn SearchTransport>,
    ) -> Self {
        Self {
            transport,
            limiter,
            config,
        }
    }

    /// Search the provider. Always resolves; see module docs.
    pub async fn search(&self, query: &str, max_results: usize) -> EvidenceSearch {
        match self.try_search(query, max_results).await {
            Ok(citations) => {
                debug!(count = citations.len(), "evidence search completed");
                EvidenceSearch {
                    citations,
                    fallback: None,
                }
            }
            Err(reason) => {
                warn!(%reason, "evidence search degraded");
                EvidenceSearch::degraded(reason)
            }
        }
    }

    async fn try_search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<Citation>, FallbackReason> {
        let term = self.build_term(query);
        let search_url = format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmax=20&retmode=json&sort=relevance",
            self.config.base_url,
            urlencode(&term)
        );

        let payload = self.fetch(&search_url).await?;
        let ids = parse_id_list(&payload);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let summary_url = format!(
            "{}/esummary.fcgi?db=pubmed&id={}&retmode=json",
            self.config.base_url,
            ids.join(",")
        );
        let payload = self.fetch(&summary_url).await?;

        let citations = parse_summaries(&payload, &ids)
            .into_iter()
            .take(max_results.min(self.config.max_results))
            .map(ProviderArticle::into_citation)
            .collect();
        Ok(citations)
    }

    async fn fetch(&self, url: &str) -> Result<serde_json::Value, FallbackReason> {
        let transport = Arc::clone(&self.transport);
        let url = url.to_string();
        self.limiter
            .throttle(async move { transport.get_json(&url).await })
            .await
            .map_err(|error| match error {
                TransportError::Timeout => FallbackReason::Timeout,
                TransportError::Decode(detail) => FallbackReason::MalformedPayload(detail),
                other => FallbackReason::Unavailable(other.to_string()),
            })
    }

    /// Append the recency filter the provider understands, when configured.
    fn build_term(&self, query: &str) -> String {
        match self.config.recency_years {
            Some(years) => format!("{} AND (\"last {} years\"[PDat])", query, years),
            None => query.to_string(),
        }
    }
}

// ============================================================================
// Payload normalization
// ============================================================================

/// Ids from an esearch payload. A missing or oddly shaped id list is an
/// empty result, not an error.
pub fn parse_id_list(payload: &serde_json::Value) -> Vec<String> {
    payload["esearchresult"]["idlist"]
        .as_array()
        .map(|ids| {
            ids.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Articles from an esummary payload, in the id order the search returned.
/// Entries the provider omits or mangles are skipped.
pub fn parse_summaries(payload: &serde_json::Value, ids: &[String]) -> Vec<ProviderArticle> {
    let result = &payload["result"];
    ids.iter()
        .filter_map(|id| {
            let article = result.get(id)?;
            if !article.is_object() {
                return None;
            }

            let title = article["title"].as_str().unwrap_or("Untitled");
            let date = article["pubdate"]
                .as_str()
                .or_else(|| article["epubdate"].as_str())
                .unwrap_or("");
            let journal = article["source"]
                .as_str()
                .or_else(|| article["fulljournalname"].as_str())
                .unwrap_or("");
            let authors = article["authors"]
                .as_array()
                .map(|list| {
                    list.iter()
                        .filter_map(|a| a["name"].as_str().map(String::from))
                        .take(3)
                        .collect()
                })
                .unwrap_or_default();

            Some(ProviderArticle {
                id: id.clone(),
                title: clean_title(title),
                journal: journal.chars().take(50).collect(),
                year: extract_year(date),
                authors,
            })
        })
        .collect()
}

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());

/// First plausible year in a provider date string ("2019 Mar 4", "2021").
pub fn extract_year(date: &str) -> Option<String> {
    YEAR.find(date).map(|m| m.as_str().to_string())
}

fn clean_title(title: &str) -> String {
    title.trim().trim_end_matches('.').to_string()
}

/// Percent-encode a query term for the provider URL.
fn urlencode(term: &str) -> String {
    let mut encoded = String::with_capacity(term.len());
    for byte in term.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

// ============================================================================
// Tests
// ============================================================================
