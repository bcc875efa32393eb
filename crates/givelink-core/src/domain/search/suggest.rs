//! Typeahead suggestion engine
//!
//! Queries each requested entity source, merges, deduplicates
//! case-insensitively, and truncates. The per-source cap keeps one source
//! from crowding out the others.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;

use super::entity::{Suggestion, SuggestionKind, SuggestionScope};
use super::repository_trait::SearchRepositoryTrait;

/// Shortest partial term that produces suggestions
pub const MIN_PARTIAL_LEN: usize = 2;

/// Default number of suggestions returned
pub const DEFAULT_SUGGESTION_LIMIT: i64 = 10;

/// Typeahead suggestion engine
#[derive(Clone)]
pub struct SuggestionEngine {
    repository: Arc<dyn SearchRepositoryTrait>,
}

impl SuggestionEngine {
    /// Create a new engine over the given repository port
    pub fn new(repository: Arc<dyn SearchRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Produce up to `limit` suggestions for a partial term
    ///
    /// Partials shorter than two characters yield an empty list, which is
    /// not an error.
    pub async fn suggest(
        &self,
        partial: &str,
        scope: SuggestionScope,
        limit: Option<i64>,
    ) -> Result<Vec<Suggestion>> {
        let partial = partial.trim();
        if partial.chars().count() < MIN_PARTIAL_LEN {
            return Ok(Vec::new());
        }

        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_SUGGESTION_LIMIT);
        let sources = scope.sources();
        let per_source = (limit as u64).div_ceil(sources.len() as u64) as i64;

        let mut merged: Vec<Suggestion> = Vec::new();
        for kind in sources {
            let batch = match kind {
                SuggestionKind::DonationTitle => {
                    self.repository
                        .donation_title_matches(partial, per_source)
                        .await?
                }
                SuggestionKind::UserName => {
                    self.repository.user_name_matches(partial, per_source).await?
                }
            };
            merged.extend(batch);
        }

        let mut seen = HashSet::new();
        merged.retain(|suggestion| seen.insert(suggestion.text.to_lowercase()));
        merged.truncate(limit as usize);

        debug!(partial, returned = merged.len(), "Suggestions computed");
        Ok(merged)
    }
}
