//! Safety Classifier v0.4.0
//!
//! Deterministic, total rule evaluator that runs BEFORE any retrieval so a
//! crisis-level question is never delayed behind a network call. Levels are
//! strictly ordered (crisis > elevated > informational) and the decision
//! table is evaluated top-down with the crisis tier first and
//! short-circuiting, which keeps rule precedence auditable.
//!
//! Signposting text is a pure lookup keyed by (level, jurisdiction). The
//! compiled-in defaults guarantee elevated and crisis levels always carry a
//! message, whatever a config file says.

use crate::config::{SafetyConfig, DISCLAIMER};
use crate::types::Jurisdiction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Safety level of a question. Ordering matters: crisis outranks elevated,
/// elevated outranks informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Informational,
    Elevated,
    Crisis,
}

impl SafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informational => "informational",
            Self::Elevated => "elevated",
            Self::Crisis => "crisis",
        }
    }
}

/// The classifier's verdict. Present on every answer, never absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyAssessment {
    pub level: SafetyLevel,
    /// Signposting for elevated/crisis, educational disclaimer otherwise.
    /// Never empty.
    pub message: String,
    pub jurisdiction: Jurisdiction,
}

/// One row of the decision table.
#[derive(Debug, Clone)]
struct SafetyRule {
    level: SafetyLevel,
    patterns: Vec<String>,
}

/// Deterministic safety classifier. `classify` is a total function: it
/// always returns a level and a non-empty message, and it never fails.
#[derive(Debug)]
pub struct SafetyClassifier {
    /// Decision table in evaluation order: crisis rows first.
    rules: Vec<SafetyRule>,
    signposts: HashMap<(SafetyLevel, Jurisdiction), String>,
}

impl SafetyClassifier {
    pub fn new(config: &SafetyConfig) -> Self {
        let rules = vec![
            SafetyRule {
                level: SafetyLevel::Crisis,
                patterns: config.crisis_keywords.iter().map(|k| normalize(k)).collect(),
            },
            SafetyRule {
                level: SafetyLevel::Elevated,
                patterns: config
                    .elevated_keywords
                    .iter()
                    .map(|k| normalize(k))
                    .collect(),
            },
        ];

        let mut signposts = HashMap::new();
        for rule in &config.signposts {
            signposts.insert((rule.level, rule.jurisdiction), rule.message.clone());
        }

        Self { rules, signposts }
    }

    /// Classify a question. Page context may raise an informational verdict
    /// to elevated; crisis is decided by the question text alone.
    pub fn classify(
        &self,
        question: &str,
        jurisdiction: Jurisdiction,
        page_context: Option<&str>,
    ) -> SafetyAssessment {
        let mut level = self
            .match_level(&normalize(question))
            .unwrap_or(SafetyLevel::Informational);

        if level == SafetyLevel::Informational {
            if let Some(context) = page_context {
                if self.match_level(&normalize(context)).is_some() {
                    level = SafetyLevel::Elevated;
                }
            }
        }

        if level > SafetyLevel::Informational {
            debug!(level = level.as_str(), %jurisdiction, "safety indicator matched");
        }

        SafetyAssessment {
            level,
            message: self.signposting(level, jurisdiction),
            jurisdiction,
        }
    }

    /// First matching tier in table order, or None.
    fn match_level(&self, normalized: &str) -> Option<SafetyLevel> {
        for rule in &self.rules {
            if rule.patterns.iter().any(|p| normalized.contains(p.as_str())) {
                return Some(rule.level);
            }
        }
        None
    }

    /// Signposting for (level, jurisdiction). Falls back to compiled-in
    /// text so elevated and crisis messages can never be empty.
    pub fn signposting(&self, level: SafetyLevel, jurisdiction: Jurisdiction) -> String {
        if let Some(message) = self.signposts.get(&(level, jurisdiction)) {
            if !message.trim().is_empty() {
                return message.clone();
            }
        }
        builtin_signposting(level, jurisdiction).to_string()
    }
}

/// Lowercase and fold typographic apostrophes so "can’t" matches "can't".
fn normalize(text: &str) -> String {
    text.to_lowercase().replace('\u{2019}', "'")
}

/// Last-resort signposting used when the config table has a hole.
fn builtin_signposting(level: SafetyLevel, jurisdiction: Jurisdiction) -> &'static str {
    match (level, jurisdiction) {
        (SafetyLevel::Crisis, Jurisdiction::Uk) => {
            "If you are in immediate danger, call 999 now. Samaritans are free to call any time on 116 123."
        }
        (SafetyLevel::Crisis, Jurisdiction::Us) => {
            "If you are in immediate danger, call 911 now. Call or text 988 for the Suicide & Crisis Lifeline."
        }
        (SafetyLevel::Crisis, Jurisdiction::Eu) => {
            "If you are in immediate danger, call 112 (the EU emergency number) now."
        }
        (SafetyLevel::Elevated, Jurisdiction::Uk) => {
            "For urgent support, call NHS 111 and select the mental health option."
        }
        (SafetyLevel::Elevated, Jurisdiction::Us) => {
            "For urgent support, call or text 988 (Suicide & Crisis Lifeline)."
        }
        (SafetyLevel::Elevated, Jurisdiction::Eu) => {
            "For urgent medical help that is not an emergency, call 116 117 or your local health service."
        }
        (SafetyLevel::Informational, _) => DISCLAIMER,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SafetyConfig;

    fn classifier() -> SafetyClassifier {
        SafetyClassifier::new(&SafetyConfig::default())
    }

    #[test]
    fn test_crisis_uk_signposting() {
        let assessment = classifier().classify("I want to end it all", Jurisdiction::Uk, None);
        assert_eq!(assessment.level, SafetyLevel::Crisis);
        assert!(assessment.message.contains("999"));
        assert!(assessment.message.contains("116 123"));
    }

    #[test]
    fn test_crisis_message_nonempty_for_every_jurisdiction() {
        for jurisdiction in [Jurisdiction::Uk, Jurisdiction::Us, Jurisdiction::Eu] {
            let assessment = classifier().classify("I am suicidal", jurisdiction, None);
            assert_eq!(assessment.level, SafetyLevel::Crisis);
            assert!(!assessment.message.trim().is_empty());
        }
    }

    #[test]
    fn test_crisis_us_numbers() {
        let assessment = classifier().classify("thinking about suicide", Jurisdiction::Us, None);
        assert!(assessment.message.contains("911"));
        assert!(assessment.message.contains("988"));
    }

    #[test]
    fn test_crisis_eu_number() {
        let assessment = classifier().classify("I took an overdose", Jurisdiction::Eu, None);
        assert!(assessment.message.contains("112"));
    }

    #[test]
    fn test_crisis_wins_over_elevated() {
        // Contains both an elevated indicator ("crisis") and a crisis one.
        let assessment = classifier().classify(
            "this is a crisis, I want to end my life",
            Jurisdiction::Uk,
            None,
        );
        assert_eq!(assessment.level, SafetyLevel::Crisis);
    }

    #[test]
    fn test_elevated_keyword() {
        let assessment = classifier().classify("I can't cope any more", Jurisdiction::Uk, None);
        assert_eq!(assessment.level, SafetyLevel::Elevated);
        assert!(assessment.message.contains("111"));
    }

    #[test]
    fn test_typographic_apostrophe_matches() {
        let assessment = classifier().classify("I can\u{2019}t cope", Jurisdiction::Uk, None);
        assert_eq!(assessment.level, SafetyLevel::Elevated);
    }

    #[test]
    fn test_informational_default() {
        let assessment =
            classifier().classify("breathing exercises for focus", Jurisdiction::Us, None);
        assert_eq!(assessment.level, SafetyLevel::Informational);
        assert!(!assessment.message.trim().is_empty());
    }

    #[test]
    fn test_total_on_empty_input() {
        let assessment = classifier().classify("", Jurisdiction::Eu, None);
        assert_eq!(assessment.level, SafetyLevel::Informational);
        assert!(!assessment.message.is_empty());
    }

    #[test]
    fn test_page_context_elevates_informational() {
        let assessment = classifier().classify(
            "what should I do next?",
            Jurisdiction::Uk,
            Some("crisis support helplines"),
        );
        assert_eq!(assessment.level, SafetyLevel::Elevated);
    }

    #[test]
    fn test_page_context_never_creates_crisis() {
        let assessment = classifier().classify(
            "what should I do next?",
            Jurisdiction::Uk,
            Some("suicide prevention resources"),
        );
        assert_eq!(assessment.level, SafetyLevel::Elevated);
    }

    #[test]
    fn test_level_ordering() {
        assert!(SafetyLevel::Crisis > SafetyLevel::Elevated);
        assert!(SafetyLevel::Elevated > SafetyLevel::Informational);
    }

    #[test]
    fn test_hostile_config_still_signposts() {
        let config = SafetyConfig {
            signposts: Vec::new(),
            ..SafetyConfig::default()
        };
        let classifier = SafetyClassifier::new(&config);
        for jurisdiction in [Jurisdiction::Uk, Jurisdiction::Us, Jurisdiction::Eu] {
            for level in [SafetyLevel::Elevated, SafetyLevel::Crisis] {
                assert!(!classifier.signposting(level, jurisdiction).is_empty());
            }
        }
    }
}
