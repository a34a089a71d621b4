//! Handlers for keyword/domain analytics and the dashboard.

use axum::{
    Json,
    extract::{Query, State},
};
use validator::Validate;

use crate::api::dto::analytics::{
    DashboardResponse, DomainCountResponse, KeywordCountResponse, TopQuery,
};
use crate::domain::entities::AnalyticsSummary;
use crate::error::AppError;
use crate::state::AppState;

/// Most frequent keywords.
///
/// # Endpoint
///
/// `GET /api/analytics/keywords?limit=10` (limit 1..=100)
pub async fn top_keywords_handler(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<KeywordCountResponse>>, AppError> {
    query.validate()?;

    let keywords = state.analytics_service.top_keywords(query.limit()).await?;
    Ok(Json(keywords.into_iter().map(Into::into).collect()))
}

/// Most frequent domains.
///
/// # Endpoint
///
/// `GET /api/analytics/domains?limit=10` (limit 1..=100)
pub async fn top_domains_handler(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<DomainCountResponse>>, AppError> {
    query.validate()?;

    let domains = state.analytics_service.top_domains(query.limit()).await?;
    Ok(Json(domains.into_iter().map(Into::into).collect()))
}

/// `GET /api/analytics/summary`
pub async fn summary_handler(
    State(state): State<AppState>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    Ok(Json(state.analytics_service.summary().await?))
}

/// Top 10 items, keywords and domains with the summary.
///
/// # Endpoint
///
/// `GET /api/dashboard`
pub async fn dashboard_handler(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = state.analytics_service.dashboard().await?;
    Ok(Json(dashboard.into()))
}
