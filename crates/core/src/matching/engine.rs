//! Staged matching engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Asin, CatalogItem, EnrichedItem};
use crate::error::CoreError;
use crate::library::{LibraryEntry, LibraryStore};
use crate::metrics;
use crate::request::{Request, RequestStore};

use super::text::{normalize, normalize_isbn, similarity, strip_title_noise};

/// Thresholds for the fuzzy fallback stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum title similarity (high bar - titles carry the match).
    pub title_threshold: f32,
    /// Minimum author similarity (moderate bar - author names vary more).
    pub author_threshold: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            title_threshold: 0.85,
            author_threshold: 0.60,
        }
    }
}

/// Query against library entries.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    /// External identifier, when the catalog supplied one.
    pub asin: Option<Asin>,
    /// Title text.
    pub title: String,
    /// Author text.
    pub author: String,
    /// Narrator text, when known. Some catalog sources store narrators in
    /// the author slot, so the fuzzy stage also compares narrator-to-author.
    pub narrator: Option<String>,
    /// ISBN, when known.
    pub isbn: Option<String>,
}

impl From<&CatalogItem> for MatchQuery {
    fn from(item: &CatalogItem) -> Self {
        Self {
            asin: Some(item.asin.clone()),
            title: item.title.clone(),
            author: item.author.clone(),
            narrator: item.narrator.clone(),
            isbn: item.isbn.clone(),
        }
    }
}

/// Staged audiobook identity matcher.
///
/// Exact identifier matching first, fuzzy title/author similarity as the
/// fallback; stages are mutually exclusive shortcuts, never combined scores.
#[derive(Debug, Clone, Default)]
pub struct MatchingEngine {
    config: MatcherConfig,
}

impl MatchingEngine {
    /// Create an engine with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom thresholds.
    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Find the library entry corresponding to a query, if any.
    ///
    /// Stage 1 (identifier): an entry whose dedicated identifier equals the
    /// query identifier matches outright, titles notwithstanding; a
    /// differing dedicated identifier rejects the candidate the same way.
    /// Embedded-GUID containment at a delimiter boundary is weaker evidence
    /// and also requires title equality.
    ///
    /// Stage 2 (fuzzy): best candidate whose title similarity clears the
    /// high threshold and whose author (or the query narrator) clears the
    /// moderate one.
    pub fn find_library_match<'a>(
        &self,
        query: &MatchQuery,
        entries: &'a [LibraryEntry],
    ) -> Option<&'a LibraryEntry> {
        if query.title.trim().is_empty() {
            return None;
        }

        if let Some(asin) = &query.asin {
            let query_title = normalize(&query.title);

            for entry in entries {
                match &entry.asin {
                    Some(entry_asin) if entry_asin == asin => {
                        metrics::LIBRARY_MATCHES
                            .with_label_values(&["identifier"])
                            .inc();
                        return Some(entry);
                    }
                    // Identifier mismatch takes precedence over any title
                    // match: a different edition is not this book.
                    Some(_) => continue,
                    None => {
                        if normalize(&entry.title) != query_title {
                            continue;
                        }
                        if let Some(guid) = &entry.embedded_guid {
                            if guid_contains_asin(guid, asin) {
                                metrics::LIBRARY_MATCHES
                                    .with_label_values(&["identifier"])
                                    .inc();
                                return Some(entry);
                            }
                        }
                    }
                }
            }
        }

        let found = self.best_fuzzy_match(query, entries);
        metrics::LIBRARY_MATCHES
            .with_label_values(&[if found.is_some() { "fuzzy" } else { "none" }])
            .inc();
        found
    }

    /// Simplified variant over a flat candidate list: exact identifier, then
    /// normalized-ISBN equality, then the fuzzy rule. First stage to produce
    /// a result wins.
    pub fn match_audiobook<'a>(
        &self,
        query: &MatchQuery,
        candidates: &'a [LibraryEntry],
    ) -> Option<&'a LibraryEntry> {
        if query.title.trim().is_empty() {
            return None;
        }

        if let Some(asin) = &query.asin {
            if let Some(found) = candidates.iter().find(|c| c.asin.as_ref() == Some(asin)) {
                return Some(found);
            }
        }

        if let Some(isbn) = query.isbn.as_deref().filter(|i| !i.trim().is_empty()) {
            let wanted = normalize_isbn(isbn);
            if let Some(found) = candidates.iter().find(|c| {
                c.isbn
                    .as_deref()
                    .is_some_and(|candidate_isbn| normalize_isbn(candidate_isbn) == wanted)
            }) {
                return Some(found);
            }
        }

        self.best_fuzzy_match(query, candidates)
    }

    /// Annotate catalog items with library availability and live-request
    /// status.
    ///
    /// Exactly one library scan and one request scan per invocation,
    /// independent of the number of items.
    pub async fn enrich_with_matches(
        &self,
        items: &[CatalogItem],
        requesting_user: &str,
        library: &dyn LibraryStore,
        requests: &dyn RequestStore,
    ) -> Result<Vec<EnrichedItem>, CoreError> {
        metrics::ENRICHMENT_BATCH_SIZE
            .with_label_values(&[])
            .observe(items.len() as f64);

        let entries = library
            .list_entries()
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;

        let live = requests.live()?;
        let live_by_asin: HashMap<&Asin, &Request> =
            live.iter().map(|r| (&r.asin, r)).collect();

        let mut enriched = Vec::with_capacity(items.len());
        for item in items {
            let query = MatchQuery::from(item);
            let is_available = self.find_library_match(&query, &entries).is_some();

            let live_request = live_by_asin.get(&item.asin);
            let is_requested = live_request.is_some();
            let requested_by_username = live_request
                .filter(|r| r.requested_by != requesting_user)
                .map(|r| r.requested_by.clone());

            enriched.push(EnrichedItem {
                item: item.clone(),
                is_available,
                is_requested,
                requested_by_username,
            });
        }

        Ok(enriched)
    }

    fn best_fuzzy_match<'a>(
        &self,
        query: &MatchQuery,
        entries: &'a [LibraryEntry],
    ) -> Option<&'a LibraryEntry> {
        let narrator = query
            .narrator
            .as_deref()
            .filter(|n| !n.trim().is_empty());

        if query.author.trim().is_empty() && narrator.is_none() {
            // Nothing to corroborate a title match with.
            return None;
        }

        let mut best: Option<(&LibraryEntry, f32)> = None;

        for entry in entries {
            if entry.title.trim().is_empty() {
                debug!(library_key = %entry.library_key, "skipping library entry without title");
                continue;
            }

            let title_score = similarity(
                &strip_title_noise(&query.title),
                &strip_title_noise(&entry.title),
            );
            if title_score < self.config.title_threshold {
                continue;
            }

            let author_score = similarity(&query.author, &entry.author);
            let narrator_score = narrator
                .map(|n| similarity(n, &entry.author))
                .unwrap_or(0.0);

            if author_score < self.config.author_threshold
                && narrator_score < self.config.author_threshold
            {
                continue;
            }

            let combined = title_score + author_score.max(narrator_score);
            if best.map(|(_, score)| combined > score).unwrap_or(true) {
                best = Some((entry, combined));
            }
        }

        best.map(|(entry, _)| entry)
    }
}

/// Check whether an embedded GUID contains the identifier at a delimiter
/// boundary: start-of-string or preceded by `/`, and not followed by
/// further alphanumerics. Raw substring containment would false-positive on
/// identifiers embedded in longer keys.
fn guid_contains_asin(guid: &str, asin: &Asin) -> bool {
    let guid_lower = guid.to_lowercase();
    let needle = asin.as_str().to_lowercase();

    for (idx, _) in guid_lower.match_indices(&needle) {
        let preceded_ok = idx == 0 || guid_lower[..idx].ends_with('/');
        let end = idx + needle.len();
        let followed_ok = guid_lower[end..]
            .chars()
            .next()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        if preceded_ok && followed_ok {
            return true;
        }
    }
    false
}
