// Router for ad hoc analysis of an uploaded diagram
use crate::engine::narrative::build_narrative;
use crate::engine::risk::risk_scores;
use crate::engine::validator::diagram_from_value;
use crate::http::{AppState, error::Error as HTTPError};
use crate::schemas::analysis::{AnalysisResponse, ChainsResponse, InlineAnalysisRequest};
use axum::{
    extract::{Json, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{Router, post},
};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analysis", post(analyse))
        .with_state(state)
}

async fn analyse(
    payload: Result<Json<InlineAnalysisRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HTTPError> {
    log::debug!("Analysing uploaded diagram");
    let Json(InlineAnalysisRequest { diagram, scenario }) = payload?;

    let diagram = diagram_from_value(diagram)?;
    let failed = scenario.failed_set(&diagram);

    let response = AnalysisResponse {
        story: build_narrative(&diagram, &failed),
        chains: ChainsResponse::build(&diagram, &failed),
        risk: risk_scores(&diagram, &failed),
    };
    Ok((StatusCode::OK, Json(response)))
}
