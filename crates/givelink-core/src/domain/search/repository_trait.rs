//! Repository port for search storage
//!
//! This module defines the trait for search storage operations.
//! The trait abstracts over the storage engine so ranking, fallback, and
//! logging logic never depend on a specific database, and is injected into
//! the search components as `Arc<dyn SearchRepositoryTrait>`.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::{
    DailyCount, DonationRecord, FacetField, FilteredPage, HistoryEntry, SearchFilters,
    SearchLogEntry, SortSpec, Suggestion, TermCount,
};

/// Repository port for search storage
///
/// Candidate reads serve the two search paths, suggestion reads serve
/// typeahead, and the log methods back history and analytics. Implementations
/// must pass every caller-supplied value as a bound parameter.
#[async_trait]
pub trait SearchRepositoryTrait: Send + Sync {
    // ========== Donation reads ==========

    /// Fetch the full filtered candidate set for in-process ranking
    async fn full_text_candidates(&self, filters: &SearchFilters) -> Result<Vec<DonationRecord>>;

    /// Substring/filter query with engine-side sort and pagination
    async fn substring_query(
        &self,
        term: Option<&str>,
        filters: &SearchFilters,
        sort: &SortSpec,
        limit: i64,
        offset: i64,
    ) -> Result<FilteredPage>;

    /// Distinct non-empty values of a facet field, sorted ascending
    async fn distinct_values(&self, field: FacetField) -> Result<Vec<String>>;

    // ========== Suggestion reads ==========

    /// Available donation titles containing `partial`, most viewed first
    async fn donation_title_matches(&self, partial: &str, limit: i64) -> Result<Vec<Suggestion>>;

    /// User names containing `partial`, most viewed first
    async fn user_name_matches(&self, partial: &str, limit: i64) -> Result<Vec<Suggestion>>;

    // ========== Search log ==========

    /// Append one search log entry
    async fn log_append(&self, entry: &SearchLogEntry) -> Result<()>;

    /// Distinct terms searched by a user, most recent first
    async fn user_history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryEntry>>;

    /// Delete all log entries for a user; returns the number removed
    async fn delete_user_history(&self, user_id: i64) -> Result<u64>;

    /// Terms grouped by count within the trailing window, count descending
    async fn popular_terms(&self, window_days: i64, limit: i64) -> Result<Vec<TermCount>>;

    // ========== Analytics aggregates ==========

    /// Total searches within the trailing window
    async fn search_count(&self, window_days: i64) -> Result<i64>;

    /// Distinct identified users within the trailing window
    async fn unique_user_count(&self, window_days: i64) -> Result<i64>;

    /// Per-day search volume within the trailing window, oldest first
    async fn daily_trend(&self, window_days: i64) -> Result<Vec<DailyCount>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify trait is object-safe
    fn _assert_object_safe(_: &dyn SearchRepositoryTrait) {}
}
