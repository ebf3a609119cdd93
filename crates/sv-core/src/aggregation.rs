//! # Aggregation Engine
//!
//! Derived statistics over one owner's snippets. Nothing here ever reads
//! another user's data.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{LanguageCount, RecentActivity, Snippet, SnippetStats, TagCount};
use crate::predicate::{Predicate, Window};
use crate::traits::SnippetRepo;

pub const TOP_LANGUAGES: usize = 10;
pub const RECENT_ACTIVITY: usize = 10;

pub struct AggregationEngine {
    repo: Arc<dyn SnippetRepo>,
}

impl AggregationEngine {
    pub fn new(repo: Arc<dyn SnippetRepo>) -> Self {
        Self { repo }
    }

    async fn owned(&self, owner: Uuid) -> Result<Vec<Snippet>> {
        Ok(self.repo.find(&Predicate::Owner(owner), Window::all()).await?)
    }

    /// Tag usage, most used first (ties alphabetical).
    pub async fn tag_stats(&self, owner: Uuid) -> Result<Vec<TagCount>> {
        let snippets = self.owned(owner).await?;
        let counts = tally(snippets.iter().flat_map(|s| s.tags.iter()));
        Ok(counts.into_iter().map(|(tag, count)| TagCount { tag, count }).collect())
    }

    /// Distinct tags, sorted.
    pub async fn all_tags(&self, owner: Uuid) -> Result<Vec<String>> {
        let snippets = self.owned(owner).await?;
        let tags: BTreeSet<&String> = snippets.iter().flat_map(|s| s.tags.iter()).collect();
        Ok(tags.into_iter().cloned().collect())
    }

    pub async fn snippet_stats(&self, owner: Uuid) -> Result<SnippetStats> {
        // Newest first, so the head is the recent activity.
        let snippets = self.owned(owner).await?;

        let mut most_used_languages: Vec<LanguageCount> = tally(snippets.iter().map(|s| &s.code_language))
            .into_iter()
            .map(|(language, count)| LanguageCount { language, count })
            .collect();
        most_used_languages.truncate(TOP_LANGUAGES);

        let recent_activity = snippets
            .iter()
            .take(RECENT_ACTIVITY)
            .map(|s| RecentActivity {
                title: s.title.clone(),
                code_language: s.code_language.clone(),
                created_at: s.created_at,
                is_public: s.is_public,
            })
            .collect();

        Ok(SnippetStats {
            total_snippets: snippets.len() as u64,
            most_used_languages,
            recent_activity,
            storage_usage: snippets.iter().map(|s| s.code.chars().count() as u64).sum(),
        })
    }
}

/// Counts occurrences, sorted by count descending then key ascending.
fn tally<'a>(values: impl Iterator<Item = &'a String>) -> Vec<(String, u64)> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for value in values {
        *counts.entry(value.as_str()).or_default() += 1;
    }
    let mut sorted: Vec<(String, u64)> = counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_orders_by_count_then_name() {
        let values: Vec<String> = ["rust", "go", "rust", "c", "go", "rust"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            tally(values.iter()),
            vec![("rust".to_string(), 3), ("go".to_string(), 2), ("c".to_string(), 1)]
        );
    }
}
