//! Query planner and service facade
//!
//! `SearchService` is the public entry point for donation search. It
//! normalizes pagination, validates sort and date input, chooses between the
//! ranked and fallback paths, and appends a best-effort log entry whose
//! outcome is discarded. Suggestions, history, popularity, facets, and
//! analytics are exposed through the same facade.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{Error, Result};

use super::analytics::AnalyticsAggregator;
use super::entity::{
    FacetField, HistoryEntry, MatchSource, SearchAnalytics, SearchFilters, SearchRequest,
    SearchResultSet, SortField, SortOrder, SortSpec, Suggestion, SuggestionScope, TermCount,
};
use super::fallback::FallbackExecutor;
use super::fulltext::FullTextExecutor;
use super::history::SearchLogStore;
use super::repository::SearchRepository;
use super::repository_trait::SearchRepositoryTrait;
use super::suggest::SuggestionEngine;

/// Page size used when the caller supplies none (or an out-of-range one)
pub const DEFAULT_LIMIT: i64 = 20;

/// Largest accepted page size
pub const MAX_LIMIT: i64 = 100;

/// Service facade for donation search
#[derive(Clone)]
pub struct SearchService {
    repository: Arc<dyn SearchRepositoryTrait>,
    full_text: FullTextExecutor,
    fallback: FallbackExecutor,
    suggestions: SuggestionEngine,
    log: SearchLogStore,
    analytics: AnalyticsAggregator,
}

impl SearchService {
    /// Create a service over an injected repository port
    pub fn new(repository: Arc<dyn SearchRepositoryTrait>) -> Self {
        Self {
            full_text: FullTextExecutor::new(Arc::clone(&repository)),
            fallback: FallbackExecutor::new(Arc::clone(&repository)),
            suggestions: SuggestionEngine::new(Arc::clone(&repository)),
            log: SearchLogStore::new(Arc::clone(&repository)),
            analytics: AnalyticsAggregator::new(Arc::clone(&repository)),
            repository,
        }
    }

    /// Create a service backed by the SQLite repository
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self::new(Arc::new(SearchRepository::new(pool)))
    }

    /// Get the underlying repository port
    pub fn repository(&self) -> &Arc<dyn SearchRepositoryTrait> {
        &self.repository
    }

    /// Execute a donation search
    ///
    /// A present, non-empty term takes the ranked path unless the request
    /// disables it; everything else (including plain browsing) takes the
    /// fallback path with the validated sort.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResultSet> {
        let page = normalize_page(request.page);
        let limit = normalize_limit(request.limit);
        let sort = resolve_sort(request.sort_by.as_deref(), request.sort_order.as_deref())?;
        let filters = resolve_filters(request)?;

        let term = request
            .term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let result = match term {
            Some(t) if request.prefer_full_text => {
                self.full_text.run(t, &filters, page, limit).await?
            }
            _ => self.fallback.run(term, &filters, &sort, page, limit).await?,
        };

        debug!(
            term = term.unwrap_or(""),
            used_full_text = result.used_full_text,
            total = result.pagination.total,
            "Search complete"
        );

        // Outcome discarded: logging must never affect the search result
        if let Some(t) = term {
            let search_type = if result.used_full_text {
                MatchSource::Fulltext
            } else {
                MatchSource::Fallback
            };
            self.log
                .log_query(request.user_id, t, search_type, result.pagination.total as i64)
                .await;
        }

        Ok(result)
    }

    /// Typeahead suggestions for a partial term
    pub async fn suggest(
        &self,
        partial: &str,
        scope: SuggestionScope,
        limit: Option<i64>,
    ) -> Result<Vec<Suggestion>> {
        self.suggestions.suggest(partial, scope, limit).await
    }

    /// A user's recent distinct search terms (best-effort)
    pub async fn user_history(&self, user_id: i64, limit: Option<i64>) -> Vec<HistoryEntry> {
        self.log.user_history(user_id, limit).await
    }

    /// Clear a user's search history; `false` when the store fails
    pub async fn clear_history(&self, user_id: i64) -> bool {
        self.log.clear_history(user_id).await
    }

    /// Most searched terms within the trailing window (best-effort)
    pub async fn popular_terms(
        &self,
        limit: Option<i64>,
        window_days: Option<i64>,
    ) -> Vec<TermCount> {
        self.log.popular_terms(limit, window_days).await
    }

    /// Admin analytics envelope; degraded aggregates default to zero/empty
    pub async fn analytics(&self, window_days: Option<i64>) -> SearchAnalytics {
        self.analytics.report(window_days).await
    }

    /// Distinct values of a facet field for the search UI
    pub async fn facet_values(&self, field: FacetField) -> Result<Vec<String>> {
        self.repository.distinct_values(field).await
    }
}

/// Normalize a page number; anything below 1 (or missing) becomes 1
fn normalize_page(page: Option<i64>) -> i64 {
    page.filter(|p| *p >= 1).unwrap_or(1)
}

/// Normalize a page size; anything outside [1, 100] (or missing) becomes 20
fn normalize_limit(limit: Option<i64>) -> i64 {
    limit
        .filter(|l| (1..=MAX_LIMIT).contains(l))
        .unwrap_or(DEFAULT_LIMIT)
}

/// Validate the sort; unknown fields and orders are rejected, not defaulted
fn resolve_sort(sort_by: Option<&str>, sort_order: Option<&str>) -> Result<SortSpec> {
    let field = match sort_by {
        Some(raw) => {
            SortField::parse(raw).ok_or_else(|| Error::UnknownSortField(raw.to_string()))?
        }
        None => SortField::CreatedAt,
    };
    let order = match sort_order {
        Some(raw) => {
            SortOrder::parse(raw).ok_or_else(|| Error::UnknownSortOrder(raw.to_string()))?
        }
        None => SortOrder::Desc,
    };
    Ok(SortSpec { field, order })
}

/// Build normalized filters; unparseable dates are a validation error
fn resolve_filters(request: &SearchRequest) -> Result<SearchFilters> {
    let start_date = request
        .start_date
        .as_deref()
        .map(|raw| parse_date_bound(raw, false))
        .transpose()?;
    let end_date = request
        .end_date
        .as_deref()
        .map(|raw| parse_date_bound(raw, true))
        .transpose()?;

    Ok(SearchFilters {
        category: request.category.clone(),
        condition: request.condition.clone(),
        location: request.location.clone(),
        status: request.status.clone(),
        available_only: request.available_only,
        start_date,
        end_date,
    })
}

/// Parse one date bound: RFC 3339, or YYYY-MM-DD expanded to the start or
/// end of that day so the range stays inclusive
fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let naive = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        if let Some(naive) = naive {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(Error::InvalidDate(raw.to_string()))
}
