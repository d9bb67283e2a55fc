//! Answer composition.
//!
//! The orchestrator behind every question: resolve quick-intents, run the
//! safety classifier before anything expensive, fan out to the content
//! index and the throttled evidence client, and compose a structured,
//! cited response. Composition is deterministic: section text reuses the
//! matched pages' own titles and descriptions, never paraphrase.
//!
//! Failure semantics: a crisis verdict short-circuits with a safety-first
//! response before any lookup; any single sub-lookup failure degrades the
//! answer (fewer sections or citations) instead of failing the request.
//! Only invalid input is an error, handled at the calling boundary.

use crate::catalog::{self, CRISIS_SUPPORT_PATH};
use crate::citations::{dedup_and_cap, Citation};
use crate::config::EngineConfig;
use crate::content_index::{ContentIndex, PageRecord, SearchOptions};
use crate::evidence::EvidenceClient;
use crate::intents::{registry, Intent, IntentRegistry};
use crate::rate_limiter::RateLimiter;
use crate::safety::{SafetyAssessment, SafetyClassifier, SafetyLevel};
use crate::types::Jurisdiction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Invalid-input errors. Everything else the engine absorbs.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("unknown intent id: {0}")]
    UnknownIntent(String),
}

/// An incoming question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerRequest {
    /// Free-text question, when the visitor typed one
    #[serde(default)]
    pub question: Option<String>,
    /// Quick-prompt intent id, when the visitor tapped a button
    #[serde(default)]
    pub intent_id: Option<String>,
    /// Pathname the visitor was on
    #[serde(default)]
    pub pathname: Option<String>,
    /// Visitor's region
    #[serde(default)]
    pub jurisdiction: Option<Jurisdiction>,
}

/// One answer section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSection {
    pub heading: String,
    pub text: String,
}

/// What a recommended action does on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Scroll,
}

/// A next step surfaced under the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub id: String,
    pub kind: ActionKind,
    pub label: String,
    pub description: String,
    pub target: String,
    pub primary: bool,
}

/// The structured answer returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub title: String,
    pub summary: String,
    pub sections: Vec<AnswerSection>,
    pub citations: Vec<Citation>,
    pub safety: SafetyAssessment,
    pub recommended_actions: Vec<RecommendedAction>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    /// When the answer was composed
    pub answered_at: DateTime<Utc>,
}

impl AnswerResponse {
    /// Collapse into the legacy single-string contract. Loss-tolerant:
    /// every citation survives, optional niceties (follow-ups, action
    /// metadata) are dropped.
    pub fn flatten(&self) -> LegacyAnswer {
        let mut answer = String::new();
        answer.push_str(&self.title);
        answer.push_str("\n\n");
        answer.push_str(&self.summary);
        for section in &self.sections {
            answer.push_str("\n\n");
            answer.push_str(&section.heading);
            answer.push('\n');
            answer.push_str(&section.text);
        }
        if self.safety.level > SafetyLevel::Informational {
            answer.push_str("\n\n");
            answer.push_str(&self.safety.message);
        }

        LegacyAnswer {
            answer,
            references: self
                .citations
                .iter()
                .map(|c| LegacyReference {
                    title: c.title.clone(),
                    url: c.url.clone(),
                    source_label: c.provider.as_str().to_string(),
                    is_external: c.is_external(),
                })
                .collect(),
            citations: self
                .citations
                .iter()
                .map(Citation::format_line)
                .collect::<Vec<_>>()
                .join("\n"),
            safety: LegacySafety {
                level: self.safety.level.as_str().to_string(),
                signposting: self.safety.message.clone(),
            },
        }
    }
}

/// Legacy flattened response shape, kept for older clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyAnswer {
    pub answer: String,
    pub references: Vec<LegacyReference>,
    pub citations: String,
    pub safety: LegacySafety,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyReference {
    pub title: String,
    pub url: String,
    pub source_label: String,
    pub is_external: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacySafety {
    pub level: String,
    pub signposting: String,
}

// ============================================================================
// Engine
// ============================================================================

/// The question-answering engine. Build once at process start and share;
/// every piece of state is either immutable or owned by the limiter task.
pub struct AnswerEngine {
    index: Arc<ContentIndex>,
    evidence: EvidenceClient,
    safety: SafetyClassifier,
    intents: &'static IntentRegistry,
    config: EngineConfig,
}

impl AnswerEngine {
    /// Build the engine with the production HTTP transport. Must be called
    /// inside a tokio runtime (the limiter spawns its worker task).
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let limiter = Arc::new(RateLimiter::new(
            config.external.max_calls_per_interval,
            Duration::from_millis(config.external.interval_ms),
        ));
        let evidence = EvidenceClient::new(config.external.clone(), limiter)?;
        Ok(Self::with_evidence_client(config, evidence))
    }

    /// Build with a caller-supplied evidence client (tests, custom
    /// transports). The client carries its own limiter.
    pub fn with_evidence_client(config: EngineConfig, evidence: EvidenceClient) -> Self {
        let index = ContentIndex::new(
            catalog::site_catalog().to_vec(),
            config.index.weights,
            catalog::fallback_paths(),
        );
        Self {
            index: Arc::new(index),
            evidence,
            safety: SafetyClassifier::new(&config.safety),
            intents: registry(),
            config,
        }
    }

    /// The page catalog index, shared and read-only.
    pub fn index(&self) -> &ContentIndex {
        &self.index
    }

    /// Answer a question. See module docs for failure semantics.
    pub async fn answer(&self, request: AnswerRequest) -> Result<AnswerResponse, EngineError> {
        let jurisdiction = request.jurisdiction.unwrap_or_default();
        let (raw_question, intent) = self.resolve_question(&request)?;
        let question = sanitize(&raw_question, self.config.compose.max_question_len);
        if question.is_empty() {
            return Err(EngineError::EmptyQuestion);
        }

        // Safety gate runs before any lookup so a crisis answer is never
        // delayed behind a network call.
        let safety = self
            .safety
            .classify(&question, jurisdiction, request.pathname.as_deref());
        if safety.level == SafetyLevel::Crisis {
            info!(%jurisdiction, "crisis indicator matched, short-circuiting to safety response");
            return Ok(self.crisis_response(safety));
        }

        let options = SearchOptions {
            limit: self.config.index.default_limit,
            region: request.jurisdiction,
            path_hint: request.pathname.clone(),
            preferred_paths: intent.map(|i| i.primary_paths.clone()).unwrap_or_default(),
        };

        let (hits, evidence) = tokio::join!(
            async {
                let found = self.index.search(&question, &options);
                self.index.ensure_minimum(found, self.config.index.min_results)
            },
            self.evidence.search(&question, self.config.external.max_results),
        );

        if let Some(reason) = &evidence.fallback {
            debug!(%reason, "composing without live evidence");
        }

        Ok(self.compose(&question, hits, evidence.citations, safety))
    }

    /// Resolve the effective question text: a known intent id expands to
    /// its canonical question, otherwise the free text is used as typed.
    fn resolve_question<'a>(
        &'a self,
        request: &AnswerRequest,
    ) -> Result<(String, Option<&'a Intent>), EngineError> {
        if let Some(id) = request.intent_id.as_deref() {
            if let Some(intent) = self.intents.resolve(id) {
                return Ok((intent.canonical_question.clone(), Some(intent)));
            }
            let has_text = request
                .question
                .as_deref()
                .map(|q| !q.trim().is_empty())
                .unwrap_or(false);
            if !has_text {
                return Err(EngineError::UnknownIntent(id.to_string()));
            }
        }
        match request.question.as_deref() {
            Some(question) if !question.trim().is_empty() => Ok((question.to_string(), None)),
            _ => Err(EngineError::EmptyQuestion),
        }
    }

    /// Minimal safety-first response for crisis-classified questions:
    /// signposting plus the crisis-support hub, nothing that needs a lookup.
    fn crisis_response(&self, safety: SafetyAssessment) -> AnswerResponse {
        let mut citations = Vec::new();
        let mut sections = Vec::new();
        let mut recommended_actions = Vec::new();

        if let Some(hub) = self.index.get(CRISIS_SUPPORT_PATH) {
            citations.push(Citation::internal(hub.title.clone(), hub.path.clone()));
            sections.push(AnswerSection {
                heading: hub.title.clone(),
                text: format!("{} ({})", hub.description, hub.path),
            });
            recommended_actions.push(RecommendedAction {
                id: "crisis-support".to_string(),
                kind: ActionKind::Navigate,
                label: hub.title.clone(),
                description: "Helplines and immediate next steps".to_string(),
                target: hub.path.clone(),
                primary: true,
            });
        }
        citations.push(helpline_citation(safety.jurisdiction));

        AnswerResponse {
            title: "Get help now".to_string(),
            summary: safety.message.clone(),
            sections,
            citations,
            safety,
            recommended_actions,
            follow_up_questions: Vec::new(),
            answered_at: Utc::now(),
        }
    }

    /// Deterministic composition from the retrieved material.
    fn compose(
        &self,
        question: &str,
        hits: Vec<&PageRecord>,
        external: Vec<Citation>,
        safety: SafetyAssessment,
    ) -> AnswerResponse {
        let title = hits
            .first()
            .map(|hit| hit.title.clone())
            .unwrap_or_else(|| question.to_string());

        let summary = hits
            .first()
            .map(|hit| hit.description.clone())
            .unwrap_or_else(|| {
                "We could not match this question to a specific page; start from the hubs below."
                    .to_string()
            });

        let mut sections: Vec<AnswerSection> = hits
            .iter()
            .take(3)
            .map(|hit| {
                let mut text = format!("{} ({})", hit.description, hit.path);
                if !hit.headings.is_empty() {
                    text.push_str("\nCovers: ");
                    text.push_str(&hit.headings.join(", "));
                }
                AnswerSection {
                    heading: hit.title.clone(),
                    text,
                }
            })
            .collect();

        if !external.is_empty() {
            let lines: Vec<String> = external.iter().map(Citation::format_line).collect();
            sections.push(AnswerSection {
                heading: "Research evidence".to_string(),
                text: lines.join("\n"),
            });
        }

        let mut citations: Vec<Citation> = hits
            .iter()
            .take(3)
            .map(|hit| Citation::internal(hit.title.clone(), hit.path.clone()))
            .collect();
        citations.extend(external);
        let citations = dedup_and_cap(citations, self.config.compose.max_citations);

        let recommended_actions: Vec<RecommendedAction> = hits
            .iter()
            .take(self.config.compose.max_actions)
            .enumerate()
            .map(|(position, hit)| RecommendedAction {
                id: action_id(&hit.path),
                kind: ActionKind::Navigate,
                label: hit.title.clone(),
                description: hit.description.clone(),
                target: hit.path.clone(),
                primary: position == 0,
            })
            .collect();

        AnswerResponse {
            title,
            summary,
            sections,
            citations,
            safety,
            recommended_actions,
            follow_up_questions: vec![
                "Do you want the steps, the evidence, or when to get help?".to_string(),
                "Is this for you or someone you support?".to_string(),
            ],
            answered_at: Utc::now(),
        }
    }
}

/// Crisis helpline link for the visitor's region.
fn helpline_citation(jurisdiction: Jurisdiction) -> Citation {
    match jurisdiction {
        Jurisdiction::Uk => Citation::helpline("Samaritans", "https://www.samaritans.org/"),
        Jurisdiction::Us => {
            Citation::helpline("988 Suicide & Crisis Lifeline", "https://988lifeline.org/")
        }
        Jurisdiction::Eu => Citation::helpline(
            "Find a crisis centre (IASP)",
            "https://www.iasp.info/resources/Crisis_Centres/",
        ),
    }
}

/// Stable slug for an action id, derived from the target path.
fn action_id(path: &str) -> String {
    let slug: String = path
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "home".to_string()
    } else {
        slug
    }
}

/// Strip control characters, collapse whitespace runs and cap the length.
fn sanitize(text: &str, max_len: usize) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_control() || c.is_whitespace() {
            if !last_was_space {
                cleaned.push(' ');
                last_was_space = true;
            }
        } else {
            cleaned.push(c);
            last_was_space = false;
        }
    }
    let cleaned = cleaned.trim_end().to_string();
    cleaned.chars().take(max_len).collect()
}

// ============================================================================
// Tests
// ============================================================================
