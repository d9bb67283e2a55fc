//! Quick-intent registry.
//!
//! Each surface of the site ships a row of quick-prompt buttons. A button
//! carries a stable intent id; the server expands it into the canonical
//! full question before retrieval, so ranking quality never depends on how
//! a button happens to be labelled on one surface.
//!
//! Intent ids are referenced by analytics and client code. Once shipped an
//! id is stable forever: never reuse or repurpose one, add a new id instead.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A quick-prompt entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// Stable identifier, never reused
    pub id: String,
    /// Surface the button appears on
    pub surface: String,
    /// Short button label
    pub label: String,
    /// Full natural-language expansion used for retrieval
    pub canonical_question: String,
    /// Pages to favour when ranking answers for this intent
    #[serde(default)]
    pub primary_paths: Vec<String>,
}

/// Immutable catalog of quick-prompt intents with id and label lookups.
#[derive(Debug)]
pub struct IntentRegistry {
    intents: Vec<Intent>,
    by_id: HashMap<String, usize>,
}

impl IntentRegistry {
    fn new(intents: Vec<Intent>) -> Self {
        let mut by_id = HashMap::new();
        for (position, intent) in intents.iter().enumerate() {
            let replaced = by_id.insert(intent.id.clone(), position);
            debug_assert!(replaced.is_none(), "duplicate intent id {}", intent.id);
        }
        Self { intents, by_id }
    }

    /// Look up an intent by its stable id.
    pub fn resolve(&self, id: &str) -> Option<&Intent> {
        self.by_id.get(id).map(|&i| &self.intents[i])
    }

    /// Look up an intent by surface and button label (case-insensitive).
    pub fn resolve_by_label(&self, surface: &str, label: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| {
            intent.surface.eq_ignore_ascii_case(surface)
                && intent.label.eq_ignore_ascii_case(label)
        })
    }

    /// All intents shipped on one surface, in catalog order.
    pub fn for_surface(&self, surface: &str) -> Vec<&Intent> {
        self.intents
            .iter()
            .filter(|intent| intent.surface.eq_ignore_ascii_case(surface))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

fn intent(id: &str, surface: &str, label: &str, question: &str, paths: &[&str]) -> Intent {
    Intent {
        id: id.to_string(),
        surface: surface.to_string(),
        label: label.to_string(),
        canonical_question: question.to_string(),
        primary_paths: paths.iter().map(|p| p.to_string()).collect(),
    }
}

static REGISTRY: Lazy<IntentRegistry> = Lazy::new(|| {
    IntentRegistry::new(vec![
        intent(
            "calm_quick",
            "home",
            "Calm down fast",
            "What is the quickest breathing technique to calm down right now?",
            &["/breathing", "/techniques"],
        ),
        intent(
            "first_steps",
            "home",
            "Where do I start?",
            "Where should I start with the tools on this site?",
            &["/get-started", "/tools"],
        ),
        intent(
            "breathing_start",
            "breathing",
            "Which technique first?",
            "Which breathing technique should I start with as a beginner?",
            &["/breathing"],
        ),
        intent(
            "breathing_sleep",
            "breathing",
            "Breathing for sleep",
            "Which breathing exercise helps with falling asleep?",
            &["/conditions/sleep", "/breathing"],
        ),
        intent(
            "adhd_focus_timer",
            "adhd",
            "Focus Timer",
            "How do I use a focus timer to manage ADHD attention?",
            &["/adhd"],
        ),
        intent(
            "adhd_homework",
            "adhd",
            "Homework help",
            "How can I help my child with ADHD focus on homework?",
            &["/adhd", "/support/parents"],
        ),
        intent(
            "autism_calm_toolkit",
            "autism",
            "Calm Toolkit",
            "How can the calm toolkit help with sensory overwhelm?",
            &["/autism"],
        ),
        intent(
            "school_supports",
            "school",
            "School supports",
            "What support can my child get at school for ADHD or autism?",
            &["/schools", "/support/teachers"],
        ),
        intent(
            "classroom_strategies",
            "school",
            "Classroom strategies",
            "What classroom strategies help neurodivergent students focus and feel safe?",
            &["/support/teachers", "/schools"],
        ),
        intent(
            "evidence_overview",
            "conditions",
            "Is this evidence based?",
            "What research evidence supports the techniques on this site?",
            &["/evidence"],
        ),
    ])
});

/// The process-wide intent registry.
pub fn registry() -> &'static IntentRegistry {
    &REGISTRY
}

// ============================================================================
// Tests
// ============================================================================
