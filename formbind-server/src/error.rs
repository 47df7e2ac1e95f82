//! Error types for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use formbind_mapper::MapError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error(transparent)]
    Map(#[from] MapError),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownType(_) => StatusCode::NOT_FOUND,
            Self::Map(MapError::Schema(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Map(MapError::Source(_)) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
