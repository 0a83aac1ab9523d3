// Router for stored diagrams and their scenario queries
use crate::engine::narrative::build_narrative;
use crate::engine::report::render_report;
use crate::engine::risk::risk_scores;
use crate::engine::validator::parse_diagram;
use crate::http::{AppState, error::Error as HTTPError};
use crate::schemas::analysis::{
    ChainsResponse, FormatQuery, RiskResponse, ScenarioRequest, StoryResponse,
};
use axum::{
    body::Bytes,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{Router, get, post},
};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/diagrams", get(list_diagrams))
        .route(
            "/diagrams/{name}",
            get(get_diagram).put(put_diagram).delete(delete_diagram),
        )
        .route("/diagrams/{name}/story", post(story))
        .route("/diagrams/{name}/chains", post(chains))
        .route("/diagrams/{name}/risk", post(risk))
        .route("/diagrams/{name}/report", post(report))
        .with_state(state)
}

/// Scenario bodies are optional: an empty body means "use stored status".
fn scenario(body: &Bytes) -> Result<ScenarioRequest, HTTPError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ScenarioRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| HTTPError::BadRequest(format!("invalid scenario body: {}", e)))
}

async fn list_diagrams(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HTTPError> {
    let names = state.store.list().await?;
    Ok((StatusCode::OK, Json(names)))
}

async fn get_diagram(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<FormatQuery>,
) -> Result<Response, HTTPError> {
    log::debug!("Fetching diagram {}", name);
    let diagram = state.store.load(&name).await?;

    match query.format.as_deref() {
        None | Some("canonical") => Ok(Json(diagram.to_document()).into_response()),
        Some("legacy") => Ok(Json(diagram.to_legacy()).into_response()),
        Some(other) => Err(HTTPError::BadRequest(format!("unknown format '{}'", other))),
    }
}

async fn put_diagram(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HTTPError> {
    let diagram = parse_diagram(&body)?;
    state.store.save(&name, &diagram).await?;
    log::debug!("Saved diagram {} ({} nodes)", name, diagram.nodes.len());
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_diagram(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, HTTPError> {
    state.store.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn story(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HTTPError> {
    let scenario = scenario(&body)?;
    let diagram = state.store.load(&name).await?;
    let failed = scenario.failed_set(&diagram);
    let lines = build_narrative(&diagram, &failed);
    Ok((StatusCode::OK, Json(StoryResponse { lines })))
}

async fn chains(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HTTPError> {
    let scenario = scenario(&body)?;
    let diagram = state.store.load(&name).await?;
    let failed = scenario.failed_set(&diagram);
    Ok((StatusCode::OK, Json(ChainsResponse::build(&diagram, &failed))))
}

async fn risk(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HTTPError> {
    let scenario = scenario(&body)?;
    let diagram = state.store.load(&name).await?;
    let failed = scenario.failed_set(&diagram);
    let nodes = risk_scores(&diagram, &failed);
    Ok((StatusCode::OK, Json(RiskResponse { nodes })))
}

async fn report(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, HTTPError> {
    let scenario = scenario(&body)?;
    let diagram = state.store.load(&name).await?;
    let failed = scenario.failed_set(&diagram);
    let markdown = render_report(&diagram, &failed)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        markdown,
    ))
}
