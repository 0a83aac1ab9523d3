// Router for document schemas and client settings
use crate::http::{AppState, error::Error as HTTPError};
use crate::schemas::diagram::{DiagramDocument, LegacyDocument};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{Router, get},
};
use schemars::schema_for;
use serde_json::json;
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config/frontend", get(get_frontend))
        .route("/schema/diagram", get(get_diagram_schema))
        .route("/schema/legacy", get(get_legacy_schema))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn get_frontend(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "frontend_url": state.config.frontend_url }))
}

async fn get_diagram_schema() -> Result<impl IntoResponse, HTTPError> {
    log::debug!("Fetching diagram schema");
    let schema = schema_for!(DiagramDocument);
    Ok((StatusCode::OK, Json(schema)))
}

async fn get_legacy_schema() -> Result<impl IntoResponse, HTTPError> {
    log::debug!("Fetching legacy diagram schema");
    let schema = schema_for!(LegacyDocument);
    Ok((StatusCode::OK, Json(schema)))
}
