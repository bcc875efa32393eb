//! SQLite implementation of the search repository port
//!
//! Query text is assembled only from static fragments; every caller-supplied
//! value is passed as a bound parameter, and substring input is escaped
//! before it enters a LIKE pattern.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

use super::entity::{
    DailyCount, DonationRecord, FacetField, FilteredPage, HistoryEntry, SearchFilters,
    SearchLogEntry, SortSpec, Suggestion, SuggestionKind, TermCount,
};
use super::repository_trait::SearchRepositoryTrait;

const DONATION_COLUMNS: &str = "id, donor_id, title, description, category, condition, \
     location, status, is_available, view_count, created_at";

/// Escape LIKE pattern metacharacters so user input matches literally
///
/// Pairs with `ESCAPE '\'` on every LIKE in this module.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn window_cutoff(window_days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(window_days.max(0))
}

/// Append the WHERE fragment for the structured filters
///
/// Bind order must mirror this clause order; see `bind_filters`.
fn push_filter_sql(sql: &mut String, filters: &SearchFilters) {
    if filters.category.is_some() {
        sql.push_str(" AND category = ?");
    }
    if filters.condition.is_some() {
        sql.push_str(" AND condition = ?");
    }
    if filters.location.is_some() {
        sql.push_str(" AND LOWER(location) LIKE '%' || ? || '%' ESCAPE '\\'");
    }
    if filters.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if filters.available_only.is_some() {
        sql.push_str(" AND is_available = ?");
    }
    if filters.start_date.is_some() {
        sql.push_str(" AND created_at >= ?");
    }
    if filters.end_date.is_some() {
        sql.push_str(" AND created_at <= ?");
    }
}

macro_rules! bind_filters {
    ($query:expr, $filters:expr) => {{
        let mut query = $query;
        if let Some(v) = &$filters.category {
            query = query.bind(v);
        }
        if let Some(v) = &$filters.condition {
            query = query.bind(v);
        }
        if let Some(v) = &$filters.location {
            query = query.bind(escape_like(&v.to_lowercase()));
        }
        if let Some(v) = &$filters.status {
            query = query.bind(v);
        }
        if let Some(v) = $filters.available_only {
            query = query.bind(v);
        }
        if let Some(v) = $filters.start_date {
            query = query.bind(v);
        }
        if let Some(v) = $filters.end_date {
            query = query.bind(v);
        }
        query
    }};
}

/// SQLite search repository
#[derive(Debug, Clone)]
pub struct SearchRepository {
    pool: SqlitePool,
}

impl SearchRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SearchRepositoryTrait for SearchRepository {
    // ========== Donation reads ==========

    async fn full_text_candidates(&self, filters: &SearchFilters) -> Result<Vec<DonationRecord>> {
        let mut sql = format!("SELECT {DONATION_COLUMNS} FROM donations WHERE 1=1");
        push_filter_sql(&mut sql, filters);

        let query = sqlx::query_as::<_, DonationRecord>(&sql);
        let rows = bind_filters!(query, filters).fetch_all(&self.pool).await?;

        debug!(candidates = rows.len(), "Fetched full-text candidate set");
        Ok(rows)
    }

    async fn substring_query(
        &self,
        term: Option<&str>,
        filters: &SearchFilters,
        sort: &SortSpec,
        limit: i64,
        offset: i64,
    ) -> Result<FilteredPage> {
        let mut where_sql = String::from(" WHERE 1=1");
        if term.is_some() {
            where_sql.push_str(
                " AND (LOWER(title) LIKE '%' || ? || '%' ESCAPE '\\' \
                 OR LOWER(description) LIKE '%' || ? || '%' ESCAPE '\\')",
            );
        }
        push_filter_sql(&mut where_sql, filters);

        let pattern = term.map(|t| escape_like(&t.to_lowercase()));

        let count_sql = format!("SELECT COUNT(*) FROM donations{where_sql}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p).bind(p);
        }
        let total = bind_filters!(count_query, filters)
            .fetch_one(&self.pool)
            .await?;

        // Secondary id sort keeps pagination stable across equal keys
        let page_sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donations{where_sql} \
             ORDER BY {} {}, id DESC LIMIT ? OFFSET ?",
            sort.field.column(),
            sort.order.sql(),
        );
        let mut page_query = sqlx::query_as::<_, DonationRecord>(&page_sql);
        if let Some(p) = &pattern {
            page_query = page_query.bind(p).bind(p);
        }
        let records = bind_filters!(page_query, filters)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(FilteredPage {
            records,
            total: total as u64,
        })
    }

    async fn distinct_values(&self, field: FacetField) -> Result<Vec<String>> {
        let column = field.column();
        let sql = format!(
            "SELECT DISTINCT {column} FROM donations \
             WHERE {column} IS NOT NULL AND {column} != '' ORDER BY {column} ASC"
        );
        let values = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    // ========== Suggestion reads ==========

    async fn donation_title_matches(&self, partial: &str, limit: i64) -> Result<Vec<Suggestion>> {
        let rows: Vec<SuggestionRow> = sqlx::query_as(
            r#"
            SELECT title AS text, category, NULL AS location
            FROM donations
            WHERE is_available = 1
              AND LOWER(title) LIKE '%' || ? || '%' ESCAPE '\'
            ORDER BY view_count DESC, created_at DESC
            LIMIT ?
            "#,
        )
        .bind(escape_like(&partial.to_lowercase()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_suggestion(SuggestionKind::DonationTitle))
            .collect())
    }

    async fn user_name_matches(&self, partial: &str, limit: i64) -> Result<Vec<Suggestion>> {
        let rows: Vec<SuggestionRow> = sqlx::query_as(
            r#"
            SELECT name AS text, NULL AS category, location
            FROM users
            WHERE LOWER(name) LIKE '%' || ? || '%' ESCAPE '\'
            ORDER BY profile_views DESC, created_at DESC
            LIMIT ?
            "#,
        )
        .bind(escape_like(&partial.to_lowercase()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_suggestion(SuggestionKind::UserName))
            .collect())
    }

    // ========== Search log ==========

    async fn log_append(&self, entry: &SearchLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO search_logs (user_id, term, search_type, result_count, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.term)
        .bind(entry.search_type.as_str())
        .bind(entry.result_count)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn user_history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryEntry>> {
        let rows: Vec<HistoryEntry> = sqlx::query_as(
            r#"
            SELECT term, MAX(created_at) AS last_searched
            FROM search_logs
            WHERE user_id = ?
            GROUP BY term
            ORDER BY last_searched DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete_user_history(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM search_logs WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn popular_terms(&self, window_days: i64, limit: i64) -> Result<Vec<TermCount>> {
        let rows: Vec<TermCount> = sqlx::query_as(
            r#"
            SELECT term, COUNT(*) AS count
            FROM search_logs
            WHERE created_at >= ?
            GROUP BY term
            ORDER BY count DESC, term ASC
            LIMIT ?
            "#,
        )
        .bind(window_cutoff(window_days))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ========== Analytics aggregates ==========

    async fn search_count(&self, window_days: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM search_logs WHERE created_at >= ?",
        )
        .bind(window_cutoff(window_days))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn unique_user_count(&self, window_days: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT user_id) FROM search_logs \
             WHERE created_at >= ? AND user_id IS NOT NULL",
        )
        .bind(window_cutoff(window_days))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn daily_trend(&self, window_days: i64) -> Result<Vec<DailyCount>> {
        let rows: Vec<DailyCount> = sqlx::query_as(
            r#"
            SELECT date(created_at) AS date,
                   COUNT(*) AS count,
                   COUNT(DISTINCT user_id) AS unique_users
            FROM search_logs
            WHERE created_at >= ?
            GROUP BY date(created_at)
            ORDER BY date ASC
            "#,
        )
        .bind(window_cutoff(window_days))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// ========== Database Row Types ==========

#[derive(sqlx::FromRow)]
struct SuggestionRow {
    text: String,
    category: Option<String>,
    location: Option<String>,
}

impl SuggestionRow {
    fn into_suggestion(self, kind: SuggestionKind) -> Suggestion {
        Suggestion {
            text: self.text,
            kind,
            category: self.category,
            location: self.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::entity::{MatchSource, SortField, SortOrder};
    use crate::storage::Database;

    async fn create_test_db() -> SqlitePool {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        db.pool().clone()
    }

    async fn insert_donation(
        pool: &SqlitePool,
        title: &str,
        category: &str,
        location: &str,
        available: bool,
        views: i64,
        created_at: DateTime<Utc>,
    ) -> i64 {
        let result = sqlx::query(
            r#"
            INSERT INTO donations
                (donor_id, title, description, category, condition, location,
                 status, is_available, view_count, created_at)
            VALUES (1, ?, '', ?, 'good', ?, 'active', ?, ?, ?)
            "#,
        )
        .bind(title)
        .bind(category)
        .bind(location)
        .bind(available)
        .bind(views)
        .bind(created_at)
        .execute(pool)
        .await
        .unwrap();
        result.last_insert_rowid()
    }

    async fn insert_user(pool: &SqlitePool, name: &str, location: Option<&str>, views: i64) {
        sqlx::query(
            "INSERT INTO users (name, location, profile_views, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(location)
        .bind(views)
        .bind(Utc::now())
        .execute(pool)
        .await
        .unwrap();
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        Utc::now() - Duration::days(days)
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn test_substring_query_escapes_wildcards() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        insert_donation(&pool, "50% wool blanket", "bedding", "Oslo", true, 0, Utc::now()).await;
        insert_donation(&pool, "Cotton blanket", "bedding", "Oslo", true, 0, Utc::now()).await;

        let page = repo
            .substring_query(
                Some("50%"),
                &SearchFilters::default(),
                &SortSpec::default(),
                20,
                0,
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].title, "50% wool blanket");

        // A bare wildcard must not match everything
        let page = repo
            .substring_query(
                Some("%"),
                &SearchFilters::default(),
                &SortSpec::default(),
                20,
                0,
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_substring_query_filters_and_sort() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        insert_donation(&pool, "Bike", "sports", "Bergen", true, 5, days_ago(3)).await;
        insert_donation(&pool, "Anorak", "clothing", "Bergen", true, 9, days_ago(2)).await;
        insert_donation(&pool, "Skates", "sports", "Oslo", false, 2, days_ago(1)).await;

        let filters = SearchFilters {
            category: Some("sports".into()),
            ..Default::default()
        };
        let sort = SortSpec {
            field: SortField::Title,
            order: SortOrder::Asc,
        };
        let page = repo
            .substring_query(None, &filters, &sort, 20, 0)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.records[0].title, "Bike");
        assert_eq!(page.records[1].title, "Skates");

        let filters = SearchFilters {
            category: Some("sports".into()),
            available_only: Some(true),
            ..Default::default()
        };
        let page = repo
            .substring_query(None, &filters, &SortSpec::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].title, "Bike");
    }

    #[tokio::test]
    async fn test_date_range_filter_inclusive() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        insert_donation(&pool, "Old lamp", "furniture", "Oslo", true, 0, days_ago(10)).await;
        insert_donation(&pool, "New lamp", "furniture", "Oslo", true, 0, days_ago(1)).await;

        let filters = SearchFilters {
            start_date: Some(days_ago(5)),
            ..Default::default()
        };
        let page = repo
            .substring_query(None, &filters, &SortSpec::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].title, "New lamp");

        let filters = SearchFilters {
            end_date: Some(days_ago(5)),
            ..Default::default()
        };
        let page = repo
            .substring_query(None, &filters, &SortSpec::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].title, "Old lamp");
    }

    #[tokio::test]
    async fn test_full_text_candidates_apply_filters() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        insert_donation(&pool, "Winter coat", "clothing", "Oslo", true, 0, Utc::now()).await;
        insert_donation(&pool, "Summer coat", "clothing", "Bergen", true, 0, Utc::now()).await;

        let filters = SearchFilters {
            location: Some("oslo".into()),
            ..Default::default()
        };
        let candidates = repo.full_text_candidates(&filters).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Winter coat");
    }

    #[tokio::test]
    async fn test_donation_suggestions_order_and_availability() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        insert_donation(&pool, "Winter Boots", "clothing", "Oslo", true, 3, days_ago(2)).await;
        insert_donation(&pool, "Winter Clothes", "clothing", "Oslo", true, 10, days_ago(3)).await;
        insert_donation(&pool, "Winter Skis", "sports", "Oslo", false, 50, days_ago(1)).await;

        let suggestions = repo.donation_title_matches("winter", 10).await.unwrap();
        assert_eq!(suggestions.len(), 2, "unavailable donations are excluded");
        assert_eq!(suggestions[0].text, "Winter Clothes");
        assert_eq!(suggestions[0].kind, SuggestionKind::DonationTitle);
        assert_eq!(suggestions[0].category.as_deref(), Some("clothing"));
        assert_eq!(suggestions[1].text, "Winter Boots");
    }

    #[tokio::test]
    async fn test_user_suggestions_carry_location() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        insert_user(&pool, "Winnie", Some("Oslo"), 4).await;
        insert_user(&pool, "Edwin", None, 9).await;

        let suggestions = repo.user_name_matches("win", 10).await.unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].text, "Edwin");
        assert_eq!(suggestions[0].kind, SuggestionKind::UserName);
        assert_eq!(suggestions[1].location.as_deref(), Some("Oslo"));
    }

    #[tokio::test]
    async fn test_distinct_values_sorted() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        insert_donation(&pool, "A", "toys", "Oslo", true, 0, Utc::now()).await;
        insert_donation(&pool, "B", "clothing", "Oslo", true, 0, Utc::now()).await;
        insert_donation(&pool, "C", "toys", "", true, 0, Utc::now()).await;

        let categories = repo.distinct_values(FacetField::Category).await.unwrap();
        assert_eq!(categories, vec!["clothing".to_string(), "toys".to_string()]);

        let locations = repo.distinct_values(FacetField::Location).await.unwrap();
        assert_eq!(locations, vec!["Oslo".to_string()], "empty values excluded");
    }

    #[tokio::test]
    async fn test_log_append_and_history_grouping() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        let mut first = SearchLogEntry::new(Some(1), "clothes", MatchSource::Fulltext, 4);
        first.created_at = days_ago(2);
        repo.log_append(&first).await.unwrap();

        repo.log_append(&SearchLogEntry::new(Some(1), "clothes", MatchSource::Fulltext, 6))
            .await
            .unwrap();
        repo.log_append(&SearchLogEntry::new(Some(1), "boots", MatchSource::Fallback, 2))
            .await
            .unwrap();
        repo.log_append(&SearchLogEntry::new(Some(2), "boots", MatchSource::Fulltext, 1))
            .await
            .unwrap();

        let history = repo.user_history(1, 20).await.unwrap();
        assert_eq!(history.len(), 2, "one entry per distinct term");
        assert!(history[0].last_searched >= history[1].last_searched);

        let removed = repo.delete_user_history(1).await.unwrap();
        assert_eq!(removed, 3);
        assert!(repo.user_history(1, 20).await.unwrap().is_empty());
        assert_eq!(repo.user_history(2, 20).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_popular_terms_window() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        for _ in 0..3 {
            repo.log_append(&SearchLogEntry::new(None, "clothes", MatchSource::Fulltext, 1))
                .await
                .unwrap();
        }
        repo.log_append(&SearchLogEntry::new(None, "food", MatchSource::Fulltext, 1))
            .await
            .unwrap();

        let mut stale = SearchLogEntry::new(None, "antiques", MatchSource::Fulltext, 1);
        stale.created_at = days_ago(90);
        repo.log_append(&stale).await.unwrap();

        let popular = repo.popular_terms(30, 10).await.unwrap();
        assert_eq!(popular.len(), 2, "entries outside the window are excluded");
        assert_eq!(popular[0].term, "clothes");
        assert_eq!(popular[0].count, 3);
        assert_eq!(popular[1].term, "food");
    }

    #[tokio::test]
    async fn test_analytics_aggregates() {
        let pool = create_test_db().await;
        let repo = SearchRepository::new(pool.clone());

        repo.log_append(&SearchLogEntry::new(Some(1), "a", MatchSource::Fulltext, 1))
            .await
            .unwrap();
        repo.log_append(&SearchLogEntry::new(Some(1), "b", MatchSource::Fulltext, 1))
            .await
            .unwrap();
        repo.log_append(&SearchLogEntry::new(Some(2), "a", MatchSource::Fallback, 1))
            .await
            .unwrap();
        repo.log_append(&SearchLogEntry::new(None, "a", MatchSource::Fallback, 1))
            .await
            .unwrap();

        assert_eq!(repo.search_count(30).await.unwrap(), 4);
        assert_eq!(
            repo.unique_user_count(30).await.unwrap(),
            2,
            "anonymous searches do not count as users"
        );

        let trend = repo.daily_trend(30).await.unwrap();
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].count, 4);
        assert_eq!(trend[0].unique_users, 2);
    }
}
