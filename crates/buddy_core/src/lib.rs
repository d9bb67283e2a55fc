//! Buddy Core - Question answering and safety gating for the wellbeing site
//!
//! Given a free-text or quick-prompt question, the page the visitor was on
//! and their jurisdiction (UK/US/EU), the engine returns a structured,
//! cited answer built from the site's own page catalog and a rate-limited
//! external literature search, after running the question through a
//! deterministic safety classifier.
//!
//! Answers are composed from retrieved, known sources. Nothing here
//! generates text: a crisis question gets jurisdiction-specific signposting
//! before any lookup, everything else gets matched pages and citations.

pub mod catalog;
pub mod citations;
pub mod composer;
pub mod config;
pub mod content_index;
pub mod evidence;
pub mod intents;
pub mod rate_limiter;
pub mod safety;
pub mod types;

pub use citations::{Citation, CitationProvider};
pub use composer::{
    AnswerEngine, AnswerRequest, AnswerResponse, AnswerSection, EngineError, LegacyAnswer,
    RecommendedAction,
};
pub use config::EngineConfig;
pub use content_index::{ContentIndex, PageRecord, SearchOptions};
pub use evidence::{EvidenceClient, EvidenceSearch, FallbackReason, SearchTransport};
pub use intents::{Intent, IntentRegistry};
pub use rate_limiter::RateLimiter;
pub use safety::{SafetyAssessment, SafetyClassifier, SafetyLevel};
pub use types::Jurisdiction;
