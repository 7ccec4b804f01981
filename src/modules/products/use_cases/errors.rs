use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("product {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Repository(#[from] anyhow::Error),
}

impl From<JsonRejection> for ApplicationError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(vec![rejection.body_text()])
    }
}

/// Body of every 400 response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<String>,
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(ValidationErrors { errors })).into_response()
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
            Self::Repository(error) => {
                tracing::error!(%error, "product repository failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while processing the product request",
                )
                    .into_response()
            }
        }
    }
}
