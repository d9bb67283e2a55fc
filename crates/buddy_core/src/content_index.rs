//! Content index.
//!
//! In-process search over the site's own page catalog. Built once at
//! process start from static page metadata, read-only afterwards, so any
//! number of concurrent requests can query it without synchronization.
//!
//! Ranking is weighted term overlap: title matches count most, then key
//! topics, then headings, then description text. The visitor's current
//! pathname acts as a ranking hint. When a query finds fewer than the
//! configured minimum of relevant pages, a curated fallback list (home,
//! tools hub, techniques hub, evidence hub, condition hubs) backfills the
//! result without ever duplicating a path.

use crate::config::IndexWeights;
use crate::types::Jurisdiction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Metadata for one site page. Immutable once the index is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub path: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub key_topics: Vec<String>,
    /// Empty means the page is visible to every region.
    #[serde(default)]
    pub jurisdictions: Vec<Jurisdiction>,
}

impl PageRecord {
    /// True when the page is visible to the requested region.
    fn visible_to(&self, region: Option<Jurisdiction>) -> bool {
        match region {
            None => true,
            Some(region) => self.jurisdictions.is_empty() || self.jurisdictions.contains(&region),
        }
    }
}

/// Search parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Maximum results returned (0 means no results)
    pub limit: usize,
    /// Requested region; pages tagged for other regions are excluded
    pub region: Option<Jurisdiction>,
    /// Pathname the visitor was on, used as a ranking hint
    pub path_hint: Option<String>,
    /// Pages a resolved quick-intent points at, boosted when relevant
    pub preferred_paths: Vec<String>,
}

/// A record with its pre-tokenized fields.
#[derive(Debug)]
struct IndexedRecord {
    record: PageRecord,
    title_tokens: HashSet<String>,
    topic_tokens: HashSet<String>,
    heading_tokens: HashSet<String>,
    description_tokens: HashSet<String>,
}

/// Read-only search index over the page catalog.
#[derive(Debug)]
pub struct ContentIndex {
    records: Vec<IndexedRecord>,
    by_path: HashMap<String, usize>,
    weights: IndexWeights,
    fallback_paths: Vec<String>,
}

impl ContentIndex {
    /// Build the index once from the page catalog. Later catalog entries
    /// with a duplicate path are dropped.
    pub fn new(
        catalog: Vec<PageRecord>,
        weights: IndexWeights,
        fallback_paths: Vec<String>,
    ) -> Self {
        let mut records = Vec::with_capacity(catalog.len());
        let mut by_path = HashMap::new();

        for record in catalog {
            if by_path.contains_key(&record.path) {
                debug!(path = %record.path, "duplicate catalog path dropped");
                continue;
            }
            by_path.insert(record.path.clone(), records.len());
            records.push(IndexedRecord {
                title_tokens: tokenize(&record.title).into_iter().collect(),
                topic_tokens: record
                    .key_topics
                    .iter()
                    .flat_map(|t| tokenize(t))
                    .collect(),
                heading_tokens: record.headings.iter().flat_map(|h| tokenize(h)).collect(),
                description_tokens: tokenize(&record.description).into_iter().collect(),
                record,
            });
        }

        Self {
            records,
            by_path,
            weights,
            fallback_paths,
        }
    }

    /// Number of pages in the catalog.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a page by exact path.
    pub fn get(&self, path: &str) -> Option<&PageRecord> {
        self.by_path.get(path).map(|&i| &self.records[i].record)
    }

    /// Search the catalog. Returns up to `limit` relevant pages (score > 0)
    /// in descending score order; ties keep catalog order.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<&PageRecord> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || options.limit == 0 {
            return Vec::new();
        }

        let hint_segments: Vec<String> = options
            .path_hint
            .as_deref()
            .map(path_segments)
            .unwrap_or_default();

        let mut scored: Vec<(u32, usize)> = Vec::new();
        for (position, indexed) in self.records.iter().enumerate() {
            if !indexed.record.visible_to(options.region) {
                continue;
            }
            let score = self.score(indexed, &query_tokens, &hint_segments, &options.preferred_paths);
            if score > 0 {
                scored.push((score, position));
            }
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut seen = HashSet::new();
        scored
            .into_iter()
            .map(|(_, position)| &self.records[position].record)
            .filter(|record| seen.insert(record.path.as_str()))
            .take(options.limit)
            .collect()
    }

    /// Guarantee at least `min` results by backfilling from the curated
    /// fallback list. Fallback entries are appended after genuine matches
    /// and never duplicate a path already present.
    pub fn ensure_minimum<'a>(
        &'a self,
        mut results: Vec<&'a PageRecord>,
        min: usize,
    ) -> Vec<&'a PageRecord> {
        if results.len() >= min {
            return results;
        }
        debug!(
            found = results.len(),
            min, "content index shortfall, backfilling from curated list"
        );

        let mut present: HashSet<&str> = results.iter().map(|r| r.path.as_str()).collect();
        for path in &self.fallback_paths {
            if results.len() >= min {
                break;
            }
            if let Some(record) = self.get(path) {
                if present.insert(record.path.as_str()) {
                    results.push(record);
                }
            }
        }
        results
    }

    fn score(
        &self,
        indexed: &IndexedRecord,
        query_tokens: &[String],
        hint: &[String],
        preferred: &[String],
    ) -> u32 {
        let w = &self.weights;
        let mut score = 0;

        for token in query_tokens {
            if indexed.title_tokens.contains(token) {
                score += w.title;
            }
            if indexed.topic_tokens.contains(token) {
                score += w.key_topics;
            }
            if indexed.heading_tokens.contains(token) {
                score += w.headings;
            }
            if indexed.description_tokens.contains(token) {
                score += w.description;
            }
        }

        // Hints only reorder relevant pages, they never make an unrelated
        // page relevant.
        if score > 0 {
            if !hint.is_empty() {
                let shared = path_segments(&indexed.record.path)
                    .iter()
                    .zip(hint.iter())
                    .take_while(|(a, b)| a == b)
                    .count() as u32;
                score += w.path_hint * shared.min(3);
            }
            if preferred.iter().any(|p| p == &indexed.record.path) {
                score += w.path_hint * 3;
            }
        }

        score
    }
}

/// Lowercase, strip punctuation, fold simple plurals. Single-character
/// fragments carry no signal and are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter_map(|word| {
            let cleaned = word.to_lowercase();
            if cleaned.len() < 2 {
                return None;
            }
            if cleaned.ends_with('s') && cleaned.len() > 3 {
                Some(cleaned[..cleaned.len() - 1].to_string())
            } else {
                Some(cleaned)
            }
        })
        .collect()
}

fn path_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str, title: &str, description: &str, topics: &[&str]) -> PageRecord {
        PageRecord {
            path: path.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            headings: Vec::new(),
            key_topics: topics.iter().map(|t| t.to_string()).collect(),
            jurisdictions: Vec::new(),
        }
    }

    fn test_index() -> ContentIndex {
        let mut us_page = page(
            "/us/breathing/focus",
            "Breathing for Focus",
            "Box breathing and paced breathing exercises for concentration",
            &["breathing", "focus"],
        );
        us_page.jurisdictions = vec![Jurisdiction::Us];

        let mut uk_page = page(
            "/uk/resources",
            "UK Resources",
            "Support resources for families in the UK",
            &["resources"],
        );
        uk_page.jurisdictions = vec![Jurisdiction::Uk];

        ContentIndex::new(
            vec![
                page("/", "Home", "Evidence-based wellbeing support", &[]),
                page(
                    "/breathing",
                    "Breathing Exercises",
                    "Interactive breathing tools for calm and focus",
                    &["breathing", "calm"],
                ),
                page(
                    "/adhd",
                    "ADHD Hub",
                    "Focus timer, daily quests and ADHD strategies",
                    &["adhd", "focus"],
                ),
                page(
                    "/evidence",
                    "Evidence Hub",
                    "Research behind every technique",
                    &["evidence", "research"],
                ),
                us_page,
                uk_page,
            ],
            IndexWeights::default(),
            vec!["/".to_string(), "/breathing".to_string(), "/evidence".to_string()],
        )
    }

    fn options(limit: usize) -> SearchOptions {
        SearchOptions {
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_title_outweighs_description() {
        let index = ContentIndex::new(
            vec![
                page("/a", "Sleep support", "General wellbeing advice", &[]),
                page("/b", "General advice", "Tips that mention sleep once", &[]),
            ],
            IndexWeights::default(),
            vec![],
        );
        let hits = index.search("sleep", &options(2));
        assert_eq!(hits[0].path, "/a");
    }

    #[test]
    fn test_region_filter_excludes_other_regions() {
        let index = test_index();
        let hits = index.search(
            "resources",
            &SearchOptions {
                limit: 5,
                region: Some(Jurisdiction::Us),
                ..Default::default()
            },
        );
        assert!(hits.iter().all(|r| r.path != "/uk/resources"));
    }

    #[test]
    fn test_untagged_pages_visible_everywhere() {
        let index = test_index();
        for region in [Jurisdiction::Uk, Jurisdiction::Us, Jurisdiction::Eu] {
            let hits = index.search(
                "breathing",
                &SearchOptions {
                    limit: 5,
                    region: Some(region),
                    ..Default::default()
                },
            );
            assert!(hits.iter().any(|r| r.path == "/breathing"));
        }
    }

    #[test]
    fn test_path_hint_boosts_local_page() {
        let index = test_index();
        let hits = index.search(
            "breathing exercises for focus",
            &SearchOptions {
                limit: 5,
                region: Some(Jurisdiction::Us),
                path_hint: Some("/us/breathing/focus".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(hits[0].path, "/us/breathing/focus");
    }

    #[test]
    fn test_preferred_paths_reorder_relevant_pages() {
        let index = ContentIndex::new(
            vec![
                page("/adhd", "Focus strategies for ADHD", "", &["focus"]),
                page("/breathing", "Breathing for focus", "", &["focus"]),
            ],
            IndexWeights::default(),
            vec![],
        );
        let hits = index.search(
            "focus",
            &SearchOptions {
                limit: 2,
                preferred_paths: vec!["/breathing".to_string()],
                ..Default::default()
            },
        );
        assert_eq!(hits[0].path, "/breathing");
    }

    #[test]
    fn test_preferred_path_never_revives_irrelevant_page() {
        let index = ContentIndex::new(
            vec![page("/adhd", "ADHD Hub", "Focus strategies", &[])],
            IndexWeights::default(),
            vec![],
        );
        let hits = index.search(
            "sleep routines",
            &SearchOptions {
                limit: 2,
                preferred_paths: vec!["/adhd".to_string()],
                ..Default::default()
            },
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn test_tie_break_keeps_catalog_order() {
        let index = ContentIndex::new(
            vec![
                page("/first", "Calm toolkit", "", &[]),
                page("/second", "Calm toolkit", "", &[]),
            ],
            IndexWeights::default(),
            vec![],
        );
        let hits = index.search("calm", &options(2));
        assert_eq!(hits[0].path, "/first");
        assert_eq!(hits[1].path, "/second");
    }

    #[test]
    fn test_ensure_minimum_backfills_without_duplicates() {
        let index = test_index();
        let hits = index.search("breathing", &options(1));
        assert_eq!(hits.len(), 1);

        let filled = index.ensure_minimum(hits, 3);
        assert_eq!(filled.len(), 3);

        let mut paths: Vec<&str> = filled.iter().map(|r| r.path.as_str()).collect();
        let before = paths.len();
        paths.dedup();
        assert_eq!(paths.len(), before);
        // Genuine match stays first.
        assert!(filled[0].path.contains("breathing"));
    }

    #[test]
    fn test_ensure_minimum_on_empty_query() {
        let index = test_index();
        let hits = index.search("zzzz qqqq", &options(5));
        assert!(hits.is_empty());

        let filled = index.ensure_minimum(hits, 3);
        assert_eq!(filled.len(), 3);
        assert_eq!(filled[0].path, "/");
    }

    #[test]
    fn test_search_never_mutates() {
        let index = test_index();
        let before = index.len();
        let _ = index.search("adhd focus", &options(5));
        let _ = index.search("breathing", &options(5));
        assert_eq!(index.len(), before);
        assert_eq!(index.get("/adhd").unwrap().title, "ADHD Hub");
    }

    #[test]
    fn test_tokenize_folds_plurals() {
        let tokens = tokenize("Breathing exercises for kids!");
        assert_eq!(tokens, vec!["breathing", "exercise", "for", "kid"]);
    }

    #[test]
    fn test_tokenize_drops_single_characters() {
        let tokens = tokenize("a 4-7-8 breath");
        assert_eq!(tokens, vec!["breath"]);
    }
}
