//! Unranked substring/filter search path
//!
//! Used when no usable term exists (browsing, term below the full-text
//! threshold, or ranked search disabled). Sorting and pagination run in the
//! storage engine; no relevance score is produced.

use std::sync::Arc;

use crate::error::Result;

use super::entity::{PageInfo, SearchFilters, SearchResult, SearchResultSet, SortSpec};
use super::repository_trait::SearchRepositoryTrait;

/// Executor for the substring/filter path
#[derive(Clone)]
pub struct FallbackExecutor {
    repository: Arc<dyn SearchRepositoryTrait>,
}

impl FallbackExecutor {
    /// Create a new executor over the given repository port
    pub fn new(repository: Arc<dyn SearchRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Run a filter search; an empty or whitespace term is treated as absent
    pub async fn run(
        &self,
        term: Option<&str>,
        filters: &SearchFilters,
        sort: &SortSpec,
        page: i64,
        limit: i64,
    ) -> Result<SearchResultSet> {
        let term = term.map(str::trim).filter(|t| !t.is_empty());
        let offset = ((page - 1) * limit).max(0);

        let filtered = self
            .repository
            .substring_query(term, filters, sort, limit, offset)
            .await?;

        let results = filtered
            .records
            .into_iter()
            .map(SearchResult::fallback)
            .collect();

        Ok(SearchResultSet {
            results,
            pagination: PageInfo::new(filtered.total, page, limit),
            term: term.map(String::from),
            used_full_text: false,
        })
    }
}
