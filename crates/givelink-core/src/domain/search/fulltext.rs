//! Ranked full-text search path
//!
//! Scores the filtered candidate set with an explicit, reproducible
//! relevance function instead of an engine ranking mode, so ordering is
//! identical across storage backends. Terms too short to rank hand off to
//! the fallback path.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;

use super::entity::{PageInfo, SearchFilters, SearchResult, SearchResultSet, SortSpec};
use super::fallback::FallbackExecutor;
use super::repository_trait::SearchRepositoryTrait;

/// Terms shorter than this cannot be ranked meaningfully
pub const MIN_FULL_TEXT_TERM_LEN: usize = 3;

/// Field weight for donation titles
const TITLE_WEIGHT: f64 = 2.0;
/// Field weight for donation descriptions
const DESCRIPTION_WEIGHT: f64 = 1.0;

/// Split a term into lowercased tokens, stripping quote characters
pub fn tokenize(term: &str) -> Vec<String> {
    term.split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| !matches!(c, '"' | '\'' | '`'))
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Score one weighted field: occurrences x weight, dampened by field length
fn field_score(tokens: &[String], text: &str, weight: f64) -> f64 {
    let lowered = text.to_lowercase();
    let word_count = lowered.split_whitespace().count().max(1);
    let length_norm = 1.0 / (1.0 + (word_count as f64).ln());

    tokens
        .iter()
        .map(|token| count_occurrences(&lowered, token) as f64 * weight * length_norm)
        .sum()
}

/// Deterministic relevance of a donation against a tokenized term
pub fn relevance_score(tokens: &[String], title: &str, description: &str) -> f64 {
    field_score(tokens, title, TITLE_WEIGHT) + field_score(tokens, description, DESCRIPTION_WEIGHT)
}

/// Executor for the ranked full-text path
#[derive(Clone)]
pub struct FullTextExecutor {
    repository: Arc<dyn SearchRepositoryTrait>,
    fallback: FallbackExecutor,
}

impl FullTextExecutor {
    /// Create a new executor over the given repository port
    pub fn new(repository: Arc<dyn SearchRepositoryTrait>) -> Self {
        let fallback = FallbackExecutor::new(Arc::clone(&repository));
        Self {
            repository,
            fallback,
        }
    }

    /// Run a ranked search; ranking happens over the whole filtered set and
    /// pagination is applied afterwards
    pub async fn run(
        &self,
        term: &str,
        filters: &SearchFilters,
        page: i64,
        limit: i64,
    ) -> Result<SearchResultSet> {
        let trimmed = term.trim();
        if trimmed.chars().count() < MIN_FULL_TEXT_TERM_LEN {
            debug!(term = trimmed, "Term below full-text threshold, using fallback");
            return self
                .fallback
                .run(Some(trimmed), filters, &SortSpec::default(), page, limit)
                .await;
        }

        let tokens = tokenize(trimmed);
        if tokens.is_empty() {
            return self
                .fallback
                .run(Some(trimmed), filters, &SortSpec::default(), page, limit)
                .await;
        }

        let candidates = self.repository.full_text_candidates(filters).await?;

        let mut scored: Vec<(f64, _)> = candidates
            .into_iter()
            .filter_map(|record| {
                let score = relevance_score(&tokens, &record.title, &record.description);
                (score > 0.0).then_some((score, record))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.1.created_at.cmp(&a.1.created_at))
        });

        let total = scored.len() as u64;
        let offset = ((page - 1) * limit).max(0) as usize;
        let results: Vec<SearchResult> = scored
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .map(|(score, record)| SearchResult::full_text(record, score))
            .collect();

        debug!(term = trimmed, total, returned = results.len(), "Ranked search complete");

        Ok(SearchResultSet {
            results,
            pagination: PageInfo::new(total, page, limit),
            term: Some(trimmed.to_string()),
            used_full_text: true,
        })
    }
}
