//! Search entities and related types
//!
//! Defines the core types for donation search: requests, filters, result
//! envelopes, typeahead suggestions, and search log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a result was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    /// Ranked full-text path
    Fulltext,
    /// Substring/filter-only path
    Fallback,
}

impl MatchSource {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fulltext => "fulltext",
            Self::Fallback => "fallback",
        }
    }

    /// Create from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fulltext" => Some(Self::Fulltext),
            "fallback" => Some(Self::Fallback),
            _ => None,
        }
    }
}

impl fmt::Display for MatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields a fallback search can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    Title,
    Category,
    ViewCount,
}

impl SortField {
    /// Create from string representation; accepts snake_case and camelCase
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "title" => Some(Self::Title),
            "category" => Some(Self::Category),
            "view_count" | "viewCount" => Some(Self::ViewCount),
            _ => None,
        }
    }

    /// Column this field sorts on
    pub fn column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Title => "title",
            Self::Category => "category",
            Self::ViewCount => "view_count",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Create from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// SQL keyword for this direction
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A validated sort specification for the fallback path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// Facet fields exposing distinct values for the search UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetField {
    Category,
    Condition,
    Location,
}

impl FacetField {
    /// Column this facet reads
    pub fn column(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Condition => "condition",
            Self::Location => "location",
        }
    }
}

/// A donation as exposed to search (read-only view)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonationRecord {
    pub id: i64,
    pub donor_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub location: String,
    pub status: String,
    pub is_available: bool,
    /// Popularity signal, used only for suggestion ranking
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Normalized structured filters, all ANDed onto the result set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub category: Option<String>,
    pub condition: Option<String>,
    /// Substring match against the donation location
    pub location: Option<String>,
    pub status: Option<String>,
    pub available_only: Option<bool>,
    /// Inclusive lower bound on `created_at`
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub end_date: Option<DateTime<Utc>>,
}

impl SearchFilters {
    /// Whether any structured filter is set
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.condition.is_none()
            && self.location.is_none()
            && self.status.is_none()
            && self.available_only.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

/// A raw search request as it arrives from the caller
///
/// Dates, sort fields, and pagination are carried unvalidated; the planner
/// normalizes pagination and rejects invalid dates and sort fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub term: Option<String>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub available_only: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    /// When false, the ranked path is skipped even if a term is present
    #[serde(default = "default_prefer_full_text")]
    pub prefer_full_text: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Caller identity, used only for search logging
    pub user_id: Option<i64>,
}

fn default_prefer_full_text() -> bool {
    true
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            term: None,
            category: None,
            condition: None,
            location: None,
            status: None,
            available_only: None,
            start_date: None,
            end_date: None,
            sort_by: None,
            sort_order: None,
            prefer_full_text: default_prefer_full_text(),
            page: None,
            limit: None,
            user_id: None,
        }
    }
}

impl SearchRequest {
    /// Create a new request with default settings
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Default::default()
        }
    }

    /// Create a request with no term (browsing)
    pub fn browse() -> Self {
        Self::default()
    }

    /// Set the category filter
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the condition filter
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Set the location substring filter
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the status filter
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Restrict to available (or unavailable) donations
    pub fn with_available_only(mut self, available: bool) -> Self {
        self.available_only = Some(available);
        self
    }

    /// Set the inclusive date range (raw strings, validated by the planner)
    pub fn with_date_range(
        mut self,
        start: Option<impl Into<String>>,
        end: Option<impl Into<String>>,
    ) -> Self {
        self.start_date = start.map(Into::into);
        self.end_date = end.map(Into::into);
        self
    }

    /// Set the sort (raw strings, validated by the planner)
    pub fn with_sort(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = Some(order.into());
        self
    }

    /// Set the page number
    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Disable the ranked full-text path
    pub fn without_full_text(mut self) -> Self {
        self.prefer_full_text = false;
        self
    }

    /// Attach the caller identity for logging
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Pagination block of a result envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub total: u64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl PageInfo {
    /// Compute pagination from a total count and normalized page/limit
    pub fn new(total: u64, page: i64, limit: i64) -> Self {
        let total_pages = total.div_ceil(limit.max(1) as u64);
        Self {
            total,
            page,
            limit,
            total_pages,
            has_more: (page as u64) < total_pages,
        }
    }
}

/// A single search result
///
/// `relevance_score` is present exactly when the result came from the
/// full-text path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub item: DonationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    pub matched_via: MatchSource,
}

impl SearchResult {
    /// Create a ranked full-text result
    pub fn full_text(item: DonationRecord, score: f64) -> Self {
        Self {
            item,
            relevance_score: Some(score),
            matched_via: MatchSource::Fulltext,
        }
    }

    /// Create an unranked fallback result
    pub fn fallback(item: DonationRecord) -> Self {
        Self {
            item,
            relevance_score: None,
            matched_via: MatchSource::Fallback,
        }
    }
}

/// A complete result envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultSet {
    pub results: Vec<SearchResult>,
    pub pagination: PageInfo,
    pub term: Option<String>,
    pub used_full_text: bool,
}

/// One page of filtered records plus the total match count
#[derive(Debug, Clone)]
pub struct FilteredPage {
    pub records: Vec<DonationRecord>,
    pub total: u64,
}

/// Entity source of a typeahead suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    DonationTitle,
    UserName,
}

impl SuggestionKind {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DonationTitle => "donation_title",
            Self::UserName => "user_name",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which entity sources a suggestion query draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuggestionScope {
    #[default]
    All,
    Donations,
    Users,
}

impl SuggestionScope {
    /// Create from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "donations" => Some(Self::Donations),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    /// Entity sources queried for this scope, in merge order
    pub fn sources(&self) -> &'static [SuggestionKind] {
        match self {
            Self::All => &[SuggestionKind::DonationTitle, SuggestionKind::UserName],
            Self::Donations => &[SuggestionKind::DonationTitle],
            Self::Users => &[SuggestionKind::UserName],
        }
    }
}

/// A typeahead candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub kind: SuggestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A search log entry, written best-effort on every search with a term
///
/// Rows are immutable once written; the surrogate id stays inside the
/// storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLogEntry {
    pub user_id: Option<i64>,
    pub term: String,
    pub search_type: MatchSource,
    pub result_count: i64,
    pub created_at: DateTime<Utc>,
}

impl SearchLogEntry {
    /// Create a new log entry stamped with the current time
    pub fn new(
        user_id: Option<i64>,
        term: impl Into<String>,
        search_type: MatchSource,
        result_count: i64,
    ) -> Self {
        Self {
            user_id,
            term: term.into(),
            search_type,
            result_count,
            created_at: Utc::now(),
        }
    }
}

/// One distinct term in a user's search history
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub term: String,
    pub last_searched: DateTime<Utc>,
}

/// A term with its search count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TermCount {
    pub term: String,
    pub count: i64,
}

/// Search volume for a single day
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyCount {
    pub date: chrono::NaiveDate,
    pub count: i64,
    pub unique_users: i64,
}

/// Admin analytics envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchAnalytics {
    pub total_searches: i64,
    pub unique_users: i64,
    pub top_terms: Vec<TermCount>,
    pub daily_trend: Vec<DailyCount>,
    /// Two-decimal string; "0.00" when there are no identified users
    pub average_searches_per_user: String,
}
