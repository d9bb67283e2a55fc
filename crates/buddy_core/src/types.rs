//! Shared request-scoped types.

use serde::{Deserialize, Serialize};

/// Regional context for safety signposting and region-tagged content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Jurisdiction {
    Uk,
    Us,
    Eu,
}

impl Jurisdiction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uk => "UK",
            Self::Us => "US",
            Self::Eu => "EU",
        }
    }

    /// Parse a region path segment ("us", "uk") into a jurisdiction.
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment.to_ascii_lowercase().as_str() {
            "uk" => Some(Self::Uk),
            "us" => Some(Self::Us),
            "eu" => Some(Self::Eu),
            _ => None,
        }
    }
}

impl Default for Jurisdiction {
    fn default() -> Self {
        Self::Uk
    }
}

impl std::fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
