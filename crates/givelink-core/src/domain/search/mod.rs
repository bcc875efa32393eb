//! Search domain module
//!
//! Donation search and discovery: ranked full-text search with a substring
//! fallback, typeahead suggestions, best-effort search logging, and admin
//! analytics.
//!
//! # Architecture
//!
//! - **Entities**: requests, filters, result envelopes, suggestions, log rows
//! - **Repository port**: `SearchRepositoryTrait` abstracting the storage
//!   engine, with a SQLite adapter in `repository`
//! - **Planner**: `SearchService` facade choosing between the ranked and
//!   fallback paths and dispatching the best-effort log append
//! - **Executors**: `fulltext` (deterministic in-process ranking) and
//!   `fallback` (engine-side substring filtering)
//! - **Suggestions / history / analytics**: independent read paths
//!
//! # Example
//!
//! ```ignore
//! use givelink_core::domain::search::{SearchRequest, SearchService};
//!
//! let service = SearchService::with_pool(pool.clone());
//!
//! let results = service
//!     .search(&SearchRequest::new("winter coat").with_category("clothing"))
//!     .await?;
//!
//! let suggestions = service.suggest("win", Default::default(), None).await?;
//! ```

pub mod analytics;
pub mod entity;
pub mod fallback;
pub mod fulltext;
pub mod history;
pub mod planner;
pub mod repository;
pub mod repository_trait;
pub mod suggest;

// Re-export main types
pub use analytics::AnalyticsAggregator;
pub use entity::{
    DailyCount, DonationRecord, FacetField, FilteredPage, HistoryEntry, MatchSource, PageInfo,
    SearchAnalytics, SearchFilters, SearchLogEntry, SearchRequest, SearchResult, SearchResultSet,
    SortField, SortOrder, SortSpec, Suggestion, SuggestionKind, SuggestionScope, TermCount,
};
pub use fallback::FallbackExecutor;
pub use fulltext::{FullTextExecutor, MIN_FULL_TEXT_TERM_LEN};
pub use history::{DEFAULT_WINDOW_DAYS, SearchLogStore, TERM_MAX_LEN};
pub use planner::{DEFAULT_LIMIT, MAX_LIMIT, SearchService};
pub use repository::SearchRepository;
pub use repository_trait::SearchRepositoryTrait;
pub use suggest::{MIN_PARTIAL_LEN, SuggestionEngine};
