//! Search API
//!
//! High-level operations mirroring the HTTP search surface:
//! donation search, suggestions, history, popular terms, facets, and the
//! admin analytics endpoint.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Result;
use crate::domain::search::{
    DonationRecord, FacetField, PageInfo, SearchAnalytics, SearchRequest, SearchResult,
    SearchResultSet, SearchService, Suggestion, SuggestionScope, TermCount,
};

use super::get_database;

async fn service() -> Result<SearchService> {
    let db = get_database().await?;
    Ok(SearchService::with_pool(db.pool().clone()))
}

/// One donation in a search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationHit {
    #[serde(flatten)]
    pub donation: DonationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    pub matched_via: String,
}

impl From<SearchResult> for DonationHit {
    fn from(result: SearchResult) -> Self {
        Self {
            donation: result.item,
            relevance_score: result.relevance_score,
            matched_via: result.matched_via.as_str().to_string(),
        }
    }
}

/// Response for `GET /search/donations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub donations: Vec<DonationHit>,
    pub pagination: PageInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub used_full_text: bool,
}

impl From<SearchResultSet> for SearchResponse {
    fn from(set: SearchResultSet) -> Self {
        Self {
            donations: set.results.into_iter().map(DonationHit::from).collect(),
            pagination: set.pagination,
            query: set.term,
            used_full_text: set.used_full_text,
        }
    }
}

/// One typeahead suggestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionItem {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<Suggestion> for SuggestionItem {
    fn from(s: Suggestion) -> Self {
        Self {
            text: s.text,
            kind: s.kind.as_str().to_string(),
            category: s.category,
            location: s.location,
        }
    }
}

/// Response for `GET /search/suggestions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<SuggestionItem>,
}

/// One history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    pub term: String,
    pub last_searched: String,
}

/// Response for `GET /search/history`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryItem>,
}

/// Response for `DELETE /search/history`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearHistoryResponse {
    pub success: bool,
}

/// Response for `GET /search/popular`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularResponse {
    pub popular_terms: Vec<TermCount>,
}

/// One day of the analytics trend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTrendPoint {
    pub date: String,
    pub count: i64,
    pub unique_users: i64,
}

/// Response for `GET /search/analytics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResponse {
    pub total_searches: i64,
    pub unique_users: i64,
    pub top_terms: Vec<TermCount>,
    pub daily_trend: Vec<DailyTrendPoint>,
    pub average_searches_per_user: String,
}

impl From<SearchAnalytics> for AnalyticsResponse {
    fn from(a: SearchAnalytics) -> Self {
        Self {
            total_searches: a.total_searches,
            unique_users: a.unique_users,
            top_terms: a.top_terms,
            daily_trend: a
                .daily_trend
                .into_iter()
                .map(|d| DailyTrendPoint {
                    date: d.date.to_string(),
                    count: d.count,
                    unique_users: d.unique_users,
                })
                .collect(),
            average_searches_per_user: a.average_searches_per_user,
        }
    }
}

/// Response for `GET /search/filters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersResponse {
    pub categories: Vec<String>,
    pub conditions: Vec<String>,
    pub locations: Vec<String>,
}

/// Search donations
pub async fn search_donations(request: &SearchRequest) -> Result<SearchResponse> {
    let service = service().await?;
    let result = service.search(request).await?;
    Ok(SearchResponse::from(result))
}

/// Typeahead suggestions; a missing or too-short `q` yields an empty list
pub async fn suggestions(
    q: Option<&str>,
    kind: Option<&str>,
    limit: Option<i64>,
) -> Result<SuggestionsResponse> {
    let Some(partial) = q else {
        return Ok(SuggestionsResponse {
            suggestions: Vec::new(),
        });
    };

    let scope = match kind {
        Some(raw) => SuggestionScope::parse(raw)
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown suggestion type: {raw}")))?,
        None => SuggestionScope::All,
    };

    let service = service().await?;
    let suggestions = service.suggest(partial, scope, limit).await?;
    Ok(SuggestionsResponse {
        suggestions: suggestions.into_iter().map(SuggestionItem::from).collect(),
    })
}

/// A user's recent search terms; degrades to empty if the store is down
pub async fn user_history(user_id: i64, limit: Option<i64>) -> HistoryResponse {
    let service = match service().await {
        Ok(service) => service,
        Err(error) => {
            warn!(%error, "History unavailable");
            return HistoryResponse {
                history: Vec::new(),
            };
        }
    };

    let history = service
        .user_history(user_id, limit)
        .await
        .into_iter()
        .map(|entry| HistoryItem {
            term: entry.term,
            last_searched: entry.last_searched.to_rfc3339(),
        })
        .collect();
    HistoryResponse { history }
}

/// Clear a user's search history; reports `success: false` on failure
pub async fn clear_user_history(user_id: i64) -> ClearHistoryResponse {
    let service = match service().await {
        Ok(service) => service,
        Err(error) => {
            warn!(%error, "History clear unavailable");
            return ClearHistoryResponse { success: false };
        }
    };

    ClearHistoryResponse {
        success: service.clear_history(user_id).await,
    }
}

/// Most searched terms; degrades to empty if the store is down
pub async fn popular_terms(limit: Option<i64>, days: Option<i64>) -> PopularResponse {
    let service = match service().await {
        Ok(service) => service,
        Err(error) => {
            warn!(%error, "Popular terms unavailable");
            return PopularResponse {
                popular_terms: Vec::new(),
            };
        }
    };

    PopularResponse {
        popular_terms: service.popular_terms(limit, days).await,
    }
}

/// Admin analytics envelope
///
/// Authorization is the caller's responsibility; this endpoint is
/// informational and degrades to zero/empty figures rather than failing.
pub async fn analytics(days: Option<i64>) -> AnalyticsResponse {
    let service = match service().await {
        Ok(service) => service,
        Err(error) => {
            warn!(%error, "Analytics unavailable");
            return AnalyticsResponse::from(SearchAnalytics {
                total_searches: 0,
                unique_users: 0,
                top_terms: Vec::new(),
                daily_trend: Vec::new(),
                average_searches_per_user: "0.00".to_string(),
            });
        }
    };

    AnalyticsResponse::from(service.analytics(days).await)
}

/// Distinct facet values for the search UI
pub async fn search_filters() -> Result<FiltersResponse> {
    let service = service().await?;

    Ok(FiltersResponse {
        categories: service.facet_values(FacetField::Category).await?,
        conditions: service.facet_values(FacetField::Condition).await?,
        locations: service.facet_values(FacetField::Location).await?,
    })
}
