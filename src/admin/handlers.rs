use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::load_balancer::{LoadBalancerError, StrategyKind};
use crate::routing::{BackendSnapshot, RouterSnapshot};

#[derive(Debug, Deserialize)]
pub struct StrategyUpdate {
    pub strategy: String,
}

#[derive(Debug, Deserialize)]
pub struct BackendUpdate {
    pub url: String,
    pub alive: bool,
}

/// Maps registry errors onto admin API status codes.
pub struct AdminError(LoadBalancerError);

impl From<LoadBalancerError> for AdminError {
    fn from(err: LoadBalancerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LoadBalancerError::BackendNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub async fn get_stats(State(state): State<AppState>) -> Json<RouterSnapshot> {
    Json(state.router.snapshot())
}

pub async fn set_strategy(
    State(state): State<AppState>,
    Json(update): Json<StrategyUpdate>,
) -> Result<Json<serde_json::Value>, AdminError> {
    let kind: StrategyKind = update.strategy.parse()?;
    state.router.set_strategy(kind.build());
    Ok(Json(json!({ "strategy": kind.display_name() })))
}

pub async fn mark_backend(
    State(state): State<AppState>,
    Json(update): Json<BackendUpdate>,
) -> Result<Json<BackendSnapshot>, AdminError> {
    let backend = state.router.mark_backend(&update.url, update.alive)?;
    Ok(Json(BackendSnapshot::from(backend.as_ref())))
}
