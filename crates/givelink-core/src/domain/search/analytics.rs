//! Admin search analytics
//!
//! Aggregates the search log into dashboard figures. The endpoint is
//! informational: each aggregate is computed independently and a failure in
//! one degrades to its zero/empty default instead of failing the report.

use std::sync::Arc;

use tracing::warn;

use super::entity::SearchAnalytics;
use super::history::DEFAULT_WINDOW_DAYS;
use super::repository_trait::SearchRepositoryTrait;

/// Number of top terms included in a report
const TOP_TERMS_LIMIT: i64 = 10;

/// Aggregator over the search log
#[derive(Clone)]
pub struct AnalyticsAggregator {
    repository: Arc<dyn SearchRepositoryTrait>,
}

impl AnalyticsAggregator {
    /// Create a new aggregator over the given repository port
    pub fn new(repository: Arc<dyn SearchRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Build the analytics envelope for the trailing window
    pub async fn report(&self, window_days: Option<i64>) -> SearchAnalytics {
        let window_days = window_days.filter(|d| *d > 0).unwrap_or(DEFAULT_WINDOW_DAYS);

        let total_searches = match self.repository.search_count(window_days).await {
            Ok(count) => count,
            Err(error) => {
                warn!(%error, "Search count aggregate failed");
                0
            }
        };

        let unique_users = match self.repository.unique_user_count(window_days).await {
            Ok(count) => count,
            Err(error) => {
                warn!(%error, "Unique user aggregate failed");
                0
            }
        };

        let top_terms = match self.repository.popular_terms(window_days, TOP_TERMS_LIMIT).await {
            Ok(terms) => terms,
            Err(error) => {
                warn!(%error, "Top terms aggregate failed");
                Vec::new()
            }
        };

        let daily_trend = match self.repository.daily_trend(window_days).await {
            Ok(trend) => trend,
            Err(error) => {
                warn!(%error, "Daily trend aggregate failed");
                Vec::new()
            }
        };

        let average_searches_per_user = if unique_users > 0 {
            format!("{:.2}", total_searches as f64 / unique_users as f64)
        } else {
            "0.00".to_string()
        };

        SearchAnalytics {
            total_searches,
            unique_users,
            top_terms,
            daily_trend,
            average_searches_per_user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::entity::{MatchSource, SearchLogEntry};
    use crate::domain::search::repository::SearchRepository;
    use crate::domain::search::repository_trait::SearchRepositoryTrait;
    use crate::storage::Database;

    async fn create_aggregator() -> (AnalyticsAggregator, Arc<SearchRepository>) {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let repository = Arc::new(SearchRepository::new(db.pool().clone()));
        (AnalyticsAggregator::new(repository.clone()), repository)
    }

    #[tokio::test]
    async fn test_average_formatted_to_two_decimals() {
        let (aggregator, repository) = create_aggregator().await;

        // 100 searches spread over 25 users
        for i in 0..100i64 {
            let entry =
                SearchLogEntry::new(Some(i % 25 + 1), "clothes", MatchSource::Fulltext, 1);
            repository.log_append(&entry).await.unwrap();
        }

        let report = aggregator.report(Some(30)).await;
        assert_eq!(report.total_searches, 100);
        assert_eq!(report.unique_users, 25);
        assert_eq!(report.average_searches_per_user, "4.00");
    }

    #[tokio::test]
    async fn test_empty_log_yields_zero_average() {
        let (aggregator, _repository) = create_aggregator().await;

        let report = aggregator.report(None).await;
        assert_eq!(report.total_searches, 0);
        assert_eq!(report.unique_users, 0);
        assert_eq!(report.average_searches_per_user, "0.00");
        assert!(report.top_terms.is_empty());
        assert!(report.daily_trend.is_empty());
    }

    #[tokio::test]
    async fn test_top_terms_capped_at_ten() {
        let (aggregator, repository) = create_aggregator().await;

        for i in 0..15 {
            let entry =
                SearchLogEntry::new(None, format!("term-{i:02}"), MatchSource::Fallback, 0);
            repository.log_append(&entry).await.unwrap();
        }

        let report = aggregator.report(None).await;
        assert_eq!(report.top_terms.len(), 10);
    }

    #[tokio::test]
    async fn test_broken_store_degrades_to_defaults() {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        let pool = db.pool().clone();
        db.close().await;
        let aggregator = AnalyticsAggregator::new(Arc::new(SearchRepository::new(pool)));

        let report = aggregator.report(Some(30)).await;
        assert_eq!(report.total_searches, 0);
        assert_eq!(report.unique_users, 0);
        assert!(report.top_terms.is_empty());
        assert!(report.daily_trend.is_empty());
        assert_eq!(report.average_searches_per_user, "0.00");
    }
}
