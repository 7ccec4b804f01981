use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::modules::products::use_cases::errors::ApplicationError;
use crate::shell::state::AppState;

pub async fn handle(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.queries.get(id).await {
        Ok(Some(product)) => Json(product).into_response(),
        Ok(None) => ApplicationError::NotFound(id).into_response(),
        Err(error) => ApplicationError::Repository(error).into_response(),
    }
}
