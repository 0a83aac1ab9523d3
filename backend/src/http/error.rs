use crate::engine::validator::DiagramError;
use axum::extract::rejection::JsonRejection;
use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Diagram(#[from] DiagramError),

    #[error("an internal server error occurred")]
    Anyhow(#[from] anyhow::Error),

    #[error("bad request")]
    BadRequest(String),
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            // Clients only know diagrams by name, never by server path
            Error::Diagram(DiagramError::NotFound(path)) => {
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                (StatusCode::NOT_FOUND, format!("diagram not found: {}", name))
            }
            Error::Diagram(e) => {
                let status = match &e {
                    DiagramError::Parse(_) => StatusCode::BAD_REQUEST,
                    DiagramError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            Error::Anyhow(e) => {
                log::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
