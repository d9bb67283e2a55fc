//! Static page catalog.
//!
//! Page metadata for the site's educational surfaces, mirrored from the
//! content pipeline's route metadata. Built once, immutable, and fed to the
//! content index at engine construction.

use crate::content_index::PageRecord;
use crate::types::Jurisdiction;
use once_cell::sync::Lazy;

/// Path of the crisis-support hub. Crisis responses always cite this page.
pub const CRISIS_SUPPORT_PATH: &str = "/support/crisis";

/// Curated backfill order when a search comes up short: home, tools hub,
/// techniques hub, evidence hub, then the condition hubs.
pub fn fallback_paths() -> Vec<String> {
    [
        "/",
        "/tools",
        "/techniques",
        "/evidence",
        "/adhd",
        "/autism",
        "/anxiety",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn entry(
    path: &str,
    title: &str,
    description: &str,
    headings: &[&str],
    key_topics: &[&str],
    jurisdictions: &[Jurisdiction],
) -> PageRecord {
    PageRecord {
        path: path.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        headings: headings.iter().map(|h| h.to_string()).collect(),
        key_topics: key_topics.iter().map(|t| t.to_string()).collect(),
        jurisdictions: jurisdictions.to_vec(),
    }
}

static SITE_CATALOG: Lazy<Vec<PageRecord>> = Lazy::new(|| {
    use Jurisdiction::{Uk, Us};
    vec![
        entry(
            "/",
            "Evidence-Based Neurodiversity and Wellbeing Support",
            "Evidence-based tools and resources for ADHD, autism, dyslexia and anxiety, plus breathing and focus support for families, teachers and carers",
            &["Start here", "Popular tools", "Latest evidence"],
            &["wellbeing", "neurodiversity", "support"],
            &[],
        ),
        entry(
            "/get-started",
            "Get Started",
            "A personalised pathway into the tools for ADHD, autism, anxiety and learning support, with simple steps and recommended routines",
            &["Choose a goal", "Pick a routine"],
            &["onboarding", "pathway"],
            &[],
        ),
        entry(
            "/tools",
            "Tools Hub",
            "Every interactive tool in one place: breathing, focus training, mood tracking, grounding and sleep wind-down",
            &["Breathing tools", "Focus tools", "Mood tools", "Sleep tools"],
            &["tools", "breathing", "focus", "mood", "sleep"],
            &[],
        ),
        entry(
            "/techniques",
            "Techniques Hub",
            "Step-by-step guides to every technique: box breathing, grounding, progressive muscle relaxation, thought records and more",
            &["Breathing techniques", "Grounding", "CBT techniques"],
            &["techniques", "guides", "grounding", "relaxation"],
            &[],
        ),
        entry(
            "/evidence",
            "Evidence Hub",
            "The research behind every technique, with plain-language summaries of the studies and guidance we draw on",
            &["How we grade evidence", "Research summaries"],
            &["evidence", "research", "studies"],
            &[],
        ),
        entry(
            "/breathing",
            "Breathing Exercises",
            "Interactive breathing tools: box breathing, 4-7-8, coherent breathing and diaphragmatic breathing for calm and focus",
            &["Box Breathing", "4-7-8 Breathing", "Coherent Breathing"],
            &["breathing", "calm", "relaxation"],
            &[],
        ),
        entry(
            "/uk/breathing/focus",
            "Breathing for Focus",
            "Paced breathing exercises that build concentration before study or work sessions",
            &["Box Breathing for focus", "Paced breathing drills"],
            &["breathing", "focus", "concentration"],
            &[Uk],
        ),
        entry(
            "/us/breathing/focus",
            "Breathing for Focus",
            "Paced breathing exercises that build concentration before study or work sessions",
            &["Box Breathing for focus", "Paced breathing drills"],
            &["breathing", "focus", "concentration"],
            &[Us],
        ),
        entry(
            "/adhd",
            "ADHD Hub",
            "Focus Timer, Daily Quests, Skills Library and evidence-based ADHD strategies for home, school and work",
            &["Focus Timer", "Daily Quests", "Skills Library"],
            &["adhd", "focus", "attention", "executive function"],
            &[],
        ),
        entry(
            "/autism",
            "Autism Hub",
            "Calm Toolkit, Skills Library, education pathways and workplace adjustment guidance",
            &[
                "Calm Toolkit",
                "Skills Library",
                "Education Pathways",
                "Workplace Adjustments",
            ],
            &["autism", "sensory", "calm", "school", "workplace"],
            &[],
        ),
        entry(
            "/anxiety",
            "Anxiety Support",
            "Breathing suites, grounding exercises, thought records and daily challenges for anxiety",
            &["Breathing Suite", "Grounding", "Thought Record"],
            &["anxiety", "panic", "worry", "calm"],
            &[],
        ),
        entry(
            "/conditions",
            "Conditions Hub",
            "Plain-language guides to ADHD, autism, anxiety, low mood, stress, sleep difficulties and dyslexia",
            &["Find your condition"],
            &["conditions", "guides"],
            &[],
        ),
        entry(
            "/conditions/depression",
            "Low Mood and Depression",
            "Understanding low mood and depression, with behavioural activation and mood toolkit resources",
            &["Mood Toolkit", "Daily Challenges", "When to get help"],
            &["depression", "low mood", "mood"],
            &[],
        ),
        entry(
            "/conditions/stress",
            "Stress and Burnout",
            "Recognising stress and burnout, with quick relief techniques and longer-term resilience building",
            &["Quick relief", "Burnout assessment"],
            &["stress", "burnout", "resilience"],
            &[],
        ),
        entry(
            "/conditions/sleep",
            "Sleep Support",
            "Wind-down routines, 4-7-8 breathing for sleep and sleep hygiene guidance",
            &["Wind-down routine", "Sleep hygiene"],
            &["sleep", "insomnia", "rest"],
            &[],
        ),
        entry(
            "/dyslexia-reading-training",
            "Dyslexia Reading Training",
            "Levelled passages, phonics drills and fluency practice for dyslexia support",
            &["Phonics Sounds Lab", "Word Construction", "Fluency Pacer"],
            &["dyslexia", "reading", "phonics", "fluency"],
            &[],
        ),
        entry(
            CRISIS_SUPPORT_PATH,
            "Crisis Support",
            "Immediate help lines and what to do right now if you or someone you support is in crisis",
            &["Get help now", "Helplines by region"],
            &["crisis", "help", "urgent", "support"],
            &[],
        ),
        entry(
            "/support/parents",
            "Support for Parents",
            "Practical guidance for parents supporting a neurodivergent child at home",
            &["Daily routines", "Working with school"],
            &["parents", "family", "home", "support"],
            &[],
        ),
        entry(
            "/support/teachers",
            "Support for Teachers",
            "Classroom strategies, reasonable adjustments and school support pathways",
            &["Classroom strategies", "Adjustments", "Support plans"],
            &["teachers", "school", "classroom", "education"],
            &[],
        ),
        entry(
            "/schools",
            "School Support Pathways",
            "How school support works, what can be put in place and how to ask for it",
            &["Support plans", "Who to talk to", "Templates"],
            &["school", "send", "iep", "support", "education"],
            &[],
        ),
        entry(
            "/uk/resources",
            "UK Resources",
            "NHS services, charities and helplines for families in the UK",
            &["NHS services", "Charities", "Helplines"],
            &["resources", "nhs", "helplines"],
            &[Uk],
        ),
        entry(
            "/us/resources",
            "US Resources",
            "National services, organisations and helplines for families in the US",
            &["National services", "Helplines"],
            &["resources", "helplines"],
            &[Us],
        ),
    ]
});

/// The site's page catalog. Built once, never mutated.
pub fn site_catalog() -> &'static [PageRecord] {
    &SITE_CATALOG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_paths_unique() {
        let mut seen = HashSet::new();
        for record in site_catalog() {
            assert!(seen.insert(record.path.as_str()), "duplicate {}", record.path);
        }
    }

    #[test]
    fn test_fallback_paths_exist_in_catalog() {
        let paths: HashSet<&str> = site_catalog().iter().map(|r| r.path.as_str()).collect();
        for fallback in fallback_paths() {
            assert!(paths.contains(fallback.as_str()), "missing {}", fallback);
        }
    }

    #[test]
    fn test_crisis_support_page_present() {
        assert!(site_catalog().iter().any(|r| r.path == CRISIS_SUPPORT_PATH));
    }

    #[test]
    fn test_every_record_has_title_and_description() {
        for record in site_catalog() {
            assert!(!record.title.trim().is_empty(), "{}", record.path);
            assert!(!record.description.trim().is_empty(), "{}", record.path);
        }
    }
}
