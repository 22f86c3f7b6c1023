use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use docket_core::config::StatisticsConfig;
use docket_core::{
    AccountId, ApplicationError, DataSource, Entry, InterfaceError, SimilarityResult,
    StatisticsOptions, StatisticsResult, TokenAuthority,
};

use crate::service::{EstimateService, Estimates};

#[derive(Clone)]
pub struct ApiState {
    service: Arc<EstimateService>,
    authority: Arc<TokenAuthority>,
    defaults: StatisticsOptions,
}

impl ApiState {
    pub fn new(
        service: Arc<EstimateService>,
        authority: Arc<TokenAuthority>,
        statistics: &StatisticsConfig,
    ) -> Self {
        let defaults = StatisticsOptions {
            months_count: statistics.default_months_count,
            days_count: statistics.default_days_count,
            data_source: statistics.default_data_source.clone(),
        };
        Self { service, authority, defaults }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct TextQuery {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub months_count: Option<u32>,
    pub days_count: Option<u32>,
    pub data_source: Option<DataSource>,
}

#[derive(Debug, Serialize)]
pub struct TopEntriesResponse {
    pub entries: Vec<Entry>,
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

/// Interface error rendered as `{error, correlationId}`.
#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(
                event_name = "api.request.failed",
                correlation_id = %self.0.correlation_id(),
                error = %self.0,
                "request failed"
            );
        } else {
            warn!(
                event_name = "api.request.rejected",
                correlation_id = %self.0.correlation_id(),
                error = %self.0,
                "request rejected"
            );
        }

        let body = ErrorBody {
            error: self.0.user_message().to_string(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/estimate", post(estimate))
        .route("/estimate/similarity-degree", post(similarity_degree))
        .route("/estimate/top-entries", get(top_entries))
        .route("/estimate/statistics", get(statistics))
        .with_state(state)
}

fn correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

fn authenticate(
    state: &ApiState,
    headers: &HeaderMap,
    correlation_id: &str,
) -> Result<AccountId, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApplicationError::Unauthorized("missing bearer token".to_string()))
        .map_err(|error| error.into_interface(correlation_id))?;

    state.authority.resolve(token).map_err(|error| {
        ApplicationError::Unauthorized(error.to_string()).into_interface(correlation_id).into()
    })
}

async fn estimate(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<TextRequest>,
) -> Result<Json<Estimates>, ApiError> {
    let correlation_id = correlation_id();
    let account_id = authenticate(&state, &headers, &correlation_id)?;

    let estimates = state
        .service
        .compute_estimates(&body.text, &account_id, &correlation_id)
        .await
        .map_err(|error| error.into_interface(&correlation_id))?;
    Ok(Json(estimates))
}

async fn similarity_degree(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<TextRequest>,
) -> Result<Json<Vec<SimilarityResult>>, ApiError> {
    let correlation_id = correlation_id();
    authenticate(&state, &headers, &correlation_id)?;

    let ranked = state
        .service
        .rank_similar_documents(&body.text, &correlation_id)
        .await
        .map_err(|error| error.into_interface(&correlation_id))?;
    Ok(Json(ranked))
}

async fn top_entries(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<TextQuery>,
) -> Result<Json<TopEntriesResponse>, ApiError> {
    let correlation_id = correlation_id();
    let account_id = authenticate(&state, &headers, &correlation_id)?;

    let entries = state
        .service
        .top_entries(&query.text, &account_id, &correlation_id)
        .await
        .map_err(|error| error.into_interface(&correlation_id))?;
    Ok(Json(TopEntriesResponse { entries, success: true }))
}

async fn statistics(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsResult>, ApiError> {
    let correlation_id = correlation_id();
    let account_id = authenticate(&state, &headers, &correlation_id)?;

    let options = StatisticsOptions {
        months_count: query.months_count.unwrap_or(state.defaults.months_count),
        days_count: query.days_count.unwrap_or(state.defaults.days_count),
        data_source: query.data_source.unwrap_or_else(|| state.defaults.data_source.clone()),
    };
    let result = state
        .service
        .compute_statistics(&account_id, options, Utc::now(), &correlation_id)
        .await
        .map_err(|error| error.into_interface(&correlation_id))?;
    Ok(Json(result))
}
