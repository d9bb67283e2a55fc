//! Citation shapes shared by internal pages and external evidence.
//!
//! One citation type covers both pools; the provider tag tells them apart.
//! Citation lists attached to answers are always deduplicated by URL and
//! length-capped by the composer.

use serde::{Deserialize, Serialize};

/// Where a citation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationProvider {
    /// One of the site's own pages
    Internal,
    /// PubMed literature search
    PubMed,
    /// Curated crisis/helpline link, cited on safety-first responses
    Helpline,
}

impl CitationProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "Internal",
            Self::PubMed => "PubMed",
            Self::Helpline => "Helpline",
        }
    }
}

/// A reference accompanying an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub provider: CitationProvider,
    /// Year or review date label, when the provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<String>,
}

impl Citation {
    /// Citation for one of the site's own pages.
    pub fn internal(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: path.into(),
            provider: CitationProvider::Internal,
            last_reviewed: None,
        }
    }

    /// Citation for a PubMed article.
    pub fn pubmed(title: impl Into<String>, url: impl Into<String>, year: Option<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            provider: CitationProvider::PubMed,
            last_reviewed: year,
        }
    }

    /// Citation for a curated crisis helpline.
    pub fn helpline(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            provider: CitationProvider::Helpline,
            last_reviewed: None,
        }
    }

    /// External citations leave the site; internal ones do not.
    pub fn is_external(&self) -> bool {
        self.provider != CitationProvider::Internal
    }

    /// One-line rendering for the legacy flattened contract.
    pub fn format_line(&self) -> String {
        match &self.last_reviewed {
            Some(date) => format!("{} ({}, {}) - {}", self.title, self.provider.as_str(), date, self.url),
            None => format!("{} ({}) - {}", self.title, self.provider.as_str(), self.url),
        }
    }
}

/// Deduplicate by URL (first occurrence wins) and cap the list length.
pub fn dedup_and_cap(citations: Vec<Citation>, cap: usize) -> Vec<Citation> {
    let mut seen = std::collections::HashSet::new();
    citations
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_citation_not_external() {
        let citation = Citation::internal("Breathing Exercises", "/breathing");
        assert!(!citation.is_external());
        assert_eq!(citation.provider.as_str(), "Internal");
    }

    #[test]
    fn test_pubmed_citation_format_line() {
        let citation = Citation::pubmed(
            "Slow breathing and autonomic function",
            "https://pubmed.ncbi.nlm.nih.gov/29616846/",
            Some("2018".to_string()),
        );
        let line = citation.format_line();
        assert!(line.contains("PubMed"));
        assert!(line.contains("2018"));
        assert!(line.contains("29616846"));
    }

    #[test]
    fn test_dedup_and_cap() {
        let citations = vec![
            Citation::internal("A", "/a"),
            Citation::internal("A again", "/a"),
            Citation::internal("B", "/b"),
            Citation::internal("C", "/c"),
        ];
        let kept = dedup_and_cap(citations, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].url, "/a");
        assert_eq!(kept[0].title, "A");
        assert_eq!(kept[1].url, "/b");
    }
}
