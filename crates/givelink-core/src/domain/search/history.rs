//! Best-effort search log and per-user history
//!
//! Nothing in this module is allowed to propagate a storage failure to the
//! search caller: appends swallow errors, reads degrade to empty, and clears
//! report `false`.

use std::sync::Arc;

use tracing::warn;

use super::entity::{HistoryEntry, MatchSource, SearchLogEntry, TermCount};
use super::repository_trait::SearchRepositoryTrait;

/// Longest term persisted in a log entry
pub const TERM_MAX_LEN: usize = 255;

/// Default number of history entries returned
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Default number of popular terms returned
pub const DEFAULT_POPULAR_LIMIT: i64 = 10;

/// Default trailing window for popularity and analytics, in days
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

fn truncate_term(term: &str) -> String {
    term.trim().chars().take(TERM_MAX_LEN).collect()
}

/// Best-effort store over the search log
#[derive(Clone)]
pub struct SearchLogStore {
    repository: Arc<dyn SearchRepositoryTrait>,
}

impl SearchLogStore {
    /// Create a new store over the given repository port
    pub fn new(repository: Arc<dyn SearchRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Append a log entry for one search invocation
    ///
    /// Failures are recorded as warnings and otherwise discarded; the search
    /// that triggered the append never observes them.
    pub async fn log_query(
        &self,
        user_id: Option<i64>,
        term: &str,
        search_type: MatchSource,
        result_count: i64,
    ) {
        let term = truncate_term(term);
        if term.is_empty() {
            return;
        }

        let entry = SearchLogEntry::new(user_id, term, search_type, result_count);
        if let Err(error) = self.repository.log_append(&entry).await {
            warn!(%error, search_type = %entry.search_type, "Search log append failed");
        }
    }

    /// Distinct terms a user has searched, most recent first
    ///
    /// A broken log store yields an empty history, not an error.
    pub async fn user_history(&self, user_id: i64, limit: Option<i64>) -> Vec<HistoryEntry> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_HISTORY_LIMIT);
        match self.repository.user_history(user_id, limit).await {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, user_id, "Search history read failed");
                Vec::new()
            }
        }
    }

    /// Delete all log entries for a user; `false` when the delete fails
    pub async fn clear_history(&self, user_id: i64) -> bool {
        match self.repository.delete_user_history(user_id).await {
            Ok(removed) => {
                tracing::debug!(user_id, removed, "Cleared search history");
                true
            }
            Err(error) => {
                warn!(%error, user_id, "Search history clear failed");
                false
            }
        }
    }

    /// Most searched terms within the trailing window
    pub async fn popular_terms(&self, limit: Option<i64>, window_days: Option<i64>) -> Vec<TermCount> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_POPULAR_LIMIT);
        let window_days = window_days.filter(|d| *d > 0).unwrap_or(DEFAULT_WINDOW_DAYS);
        match self.repository.popular_terms(window_days, limit).await {
            Ok(terms) => terms,
            Err(error) => {
                warn!(%error, "Popular terms read failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::repository::SearchRepository;
    use crate::storage::Database;

    async fn create_store() -> (SearchLogStore, sqlx::SqlitePool) {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let pool = db.pool().clone();
        let repository = Arc::new(SearchRepository::new(pool.clone()));
        (SearchLogStore::new(repository), pool)
    }

    /// Store over a closed pool, so every operation fails underneath
    async fn create_broken_store() -> SearchLogStore {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let pool = db.pool().clone();
        db.close().await;
        SearchLogStore::new(Arc::new(SearchRepository::new(pool)))
    }

    #[test]
    fn test_truncate_term() {
        assert_eq!(truncate_term("  winter  "), "winter");

        let long: String = "x".repeat(400);
        assert_eq!(truncate_term(&long).chars().count(), TERM_MAX_LEN);

        // Multi-byte characters truncate on a char boundary
        let wide: String = "å".repeat(300);
        let truncated = truncate_term(&wide);
        assert_eq!(truncated.chars().count(), TERM_MAX_LEN);
    }

    #[tokio::test]
    async fn test_popular_terms_ordering() {
        let (store, _pool) = create_store().await;

        for _ in 0..10 {
            store.log_query(None, "clothes", MatchSource::Fulltext, 3).await;
        }
        for _ in 0..8 {
            store.log_query(None, "food", MatchSource::Fulltext, 5).await;
        }

        let popular = store.popular_terms(Some(2), Some(30)).await;
        assert_eq!(
            popular,
            vec![
                TermCount { term: "clothes".into(), count: 10 },
                TermCount { term: "food".into(), count: 8 },
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_term_not_logged() {
        let (store, pool) = create_store().await;

        store.log_query(Some(1), "   ", MatchSource::Fallback, 0).await;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM search_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_long_term_truncated_before_append() {
        let (store, pool) = create_store().await;

        let long: String = "y".repeat(300);
        store.log_query(Some(1), &long, MatchSource::Fulltext, 0).await;

        let stored: String = sqlx::query_scalar("SELECT term FROM search_logs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored.chars().count(), TERM_MAX_LEN);
    }

    #[tokio::test]
    async fn test_log_query_swallows_storage_failure() {
        let store = create_broken_store().await;

        // Must not panic or propagate
        store.log_query(Some(1), "winter", MatchSource::Fulltext, 2).await;
    }

    #[tokio::test]
    async fn test_clear_history_returns_false_on_failure() {
        let store = create_broken_store().await;
        assert!(!store.clear_history(1).await);
    }

    #[tokio::test]
    async fn test_history_reads_degrade_to_empty() {
        let store = create_broken_store().await;
        assert!(store.user_history(1, None).await.is_empty());
        assert!(store.popular_terms(None, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_history_roundtrip() {
        let (store, _pool) = create_store().await;

        store.log_query(Some(7), "winter", MatchSource::Fulltext, 2).await;
        store.log_query(Some(7), "boots", MatchSource::Fulltext, 1).await;

        assert_eq!(store.user_history(7, None).await.len(), 2);
        assert!(store.clear_history(7).await);
        assert!(store.user_history(7, None).await.is_empty());
    }
}
