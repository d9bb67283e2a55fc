//! Engine configuration.
//!
//! Every tunable the engine consumes is data here, not a code branch:
//! provider rate limits and timeouts, index scoring weights and minimum
//! result counts, safety keyword lists and the jurisdiction signposting
//! table. Config file: buddy.toml (all sections optional, defaults apply).

use crate::safety::SafetyLevel;
use crate::types::Jurisdiction;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// External literature-search provider settings
    #[serde(default)]
    pub external: ExternalSearchConfig,

    /// Content index settings
    #[serde(default)]
    pub index: IndexConfig,

    /// Safety classifier settings
    #[serde(default)]
    pub safety: SafetyConfig,

    /// Answer composition settings
    #[serde(default)]
    pub compose: ComposeConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from a file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

// ============================================================================
// External provider
// ============================================================================

/// Settings for the external literature-search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalSearchConfig {
    /// Base URL of the provider's query endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum provider calls per interval (shared across all requests)
    #[serde(default = "default_max_calls")]
    pub max_calls_per_interval: u32,

    /// Rate-limit window length in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum citations returned from one search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Restrict results to articles from the last N years (None = no filter)
    #[serde(default = "default_recency_years")]
    pub recency_years: Option<u8>,
}

fn default_base_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}
fn default_max_calls() -> u32 {
    3
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_max_results() -> usize {
    6
}
fn default_recency_years() -> Option<u8> {
    Some(10)
}

impl Default for ExternalSearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_calls_per_interval: default_max_calls(),
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
            max_results: default_max_results(),
            recency_years: default_recency_years(),
        }
    }
}

// ============================================================================
// Content index
// ============================================================================

/// Field weights for content index ranking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexWeights {
    #[serde(default = "default_w_title")]
    pub title: u32,
    #[serde(default = "default_w_topics")]
    pub key_topics: u32,
    #[serde(default = "default_w_headings")]
    pub headings: u32,
    #[serde(default = "default_w_description")]
    pub description: u32,
    /// Boost for records under the same path prefix the visitor is on
    #[serde(default = "default_w_path_hint")]
    pub path_hint: u32,
}

fn default_w_title() -> u32 {
    4
}
fn default_w_topics() -> u32 {
    3
}
fn default_w_headings() -> u32 {
    2
}
fn default_w_description() -> u32 {
    1
}
fn default_w_path_hint() -> u32 {
    2
}

impl Default for IndexWeights {
    fn default() -> Self {
        Self {
            title: default_w_title(),
            key_topics: default_w_topics(),
            headings: default_w_headings(),
            description: default_w_description(),
            path_hint: default_w_path_hint(),
        }
    }
}

/// Settings for the in-process content index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Minimum results guaranteed after backfill
    #[serde(default = "default_min_results")]
    pub min_results: usize,

    /// Default result limit per search
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Scoring weights per field
    #[serde(default)]
    pub weights: IndexWeights,
}

fn default_min_results() -> usize {
    3
}
fn default_limit() -> usize {
    6
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_results: default_min_results(),
            default_limit: default_limit(),
            weights: IndexWeights::default(),
        }
    }
}

// ============================================================================
// Safety
// ============================================================================

/// One row of the signposting table, keyed by (level, jurisdiction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignpostRule {
    pub level: SafetyLevel,
    pub jurisdiction: Jurisdiction,
    pub message: String,
}

/// Settings for the safety classifier.
///
/// The keyword lists and phone numbers mirror the site's published
/// safeguarding policy; keep them in sync with it when editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Crisis-tier indicators, checked first
    #[serde(default = "default_crisis_keywords")]
    pub crisis_keywords: Vec<String>,

    /// Elevated-tier indicators, checked after crisis
    #[serde(default = "default_elevated_keywords")]
    pub elevated_keywords: Vec<String>,

    /// Signposting text per (level, jurisdiction)
    #[serde(default = "default_signposts")]
    pub signposts: Vec<SignpostRule>,
}

fn default_crisis_keywords() -> Vec<String> {
    [
        // Suicide and self-harm
        "suicide",
        "suicidal",
        "kill myself",
        "end my life",
        "end it all",
        "want to die",
        "better off dead",
        "no reason to live",
        "overdose",
        "self-harm",
        "self harm",
        "hurt myself",
        "hurting myself",
        "hopeless",
        // Medical emergency
        "immediate danger",
        "life threatening",
        "can't breathe",
        "unconscious",
        // Safeguarding
        "being abused",
        "abuse at home",
        "unsafe at home",
        "someone touching me",
        "adult hurting me",
        "domestic violence",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_elevated_keywords() -> Vec<String> {
    [
        "very depressed",
        "can't cope",
        "cannot cope",
        "urgent help",
        "crisis",
        "breakdown",
        "severe anxiety",
        "panic attack",
        "not eating",
        "can't sleep for days",
        "no point",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_signposts() -> Vec<SignpostRule> {
    let rule = |level, jurisdiction, message: &str| SignpostRule {
        level,
        jurisdiction,
        message: message.to_string(),
    };
    vec![
        rule(
            SafetyLevel::Crisis,
            Jurisdiction::Uk,
            "If you are in immediate danger or at risk of harming yourself, call 999 or go to A&E now. You can also talk to Samaritans free, any time, on 116 123.",
        ),
        rule(
            SafetyLevel::Crisis,
            Jurisdiction::Us,
            "If you are in immediate danger, call 911 now. For mental health crisis support, call or text 988 (Suicide & Crisis Lifeline, available 24/7).",
        ),
        rule(
            SafetyLevel::Crisis,
            Jurisdiction::Eu,
            "If you are in immediate danger, call 112 (the EU emergency number) now, or contact your local crisis service.",
        ),
        rule(
            SafetyLevel::Elevated,
            Jurisdiction::Uk,
            "For urgent support that is not life-threatening, call NHS 111 and select the mental health option. Samaritans are available any time on 116 123.",
        ),
        rule(
            SafetyLevel::Elevated,
            Jurisdiction::Us,
            "For urgent support, call or text 988 (Suicide & Crisis Lifeline), or text HELLO to 741741 for the Crisis Text Line.",
        ),
        rule(
            SafetyLevel::Elevated,
            Jurisdiction::Eu,
            "For urgent medical help that is not an emergency, call 116 117 where available, or contact your local health service.",
        ),
        rule(SafetyLevel::Informational, Jurisdiction::Uk, DISCLAIMER),
        rule(SafetyLevel::Informational, Jurisdiction::Us, DISCLAIMER),
        rule(SafetyLevel::Informational, Jurisdiction::Eu, DISCLAIMER),
    ]
}

/// Educational disclaimer attached to informational answers.
pub const DISCLAIMER: &str = "Educational information only, not medical advice. For diagnosis and treatment, speak to a qualified healthcare professional.";

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            crisis_keywords: default_crisis_keywords(),
            elevated_keywords: default_elevated_keywords(),
            signposts: default_signposts(),
        }
    }
}

// ============================================================================
// Composition
// ============================================================================

/// Settings for answer composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    /// Hard cap on citations per answer
    #[serde(default = "default_max_citations")]
    pub max_citations: usize,

    /// Hard cap on recommended actions per answer
    #[serde(default = "default_max_actions")]
    pub max_actions: usize,

    /// Questions longer than this are truncated during sanitization
    #[serde(default = "default_max_question_len")]
    pub max_question_len: usize,
}

fn default_max_citations() -> usize {
    8
}
fn default_max_actions() -> usize {
    3
}
fn default_max_question_len() -> usize {
    500
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            max_citations: default_max_citations(),
            max_actions: default_max_actions(),
            max_question_len: default_max_question_len(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
