use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use crate::modules::products::core::product::ProductInput;
use crate::modules::products::use_cases::errors::ApplicationError;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(body) => body,
        Err(rejection) => return ApplicationError::from(rejection).into_response(),
    };

    match state.create_handler.handle(input).await {
        Ok(product) => (
            StatusCode::CREATED,
            [(LOCATION, format!("/products/{}", product.id))],
            Json(product),
        )
            .into_response(),
        Err(error) => error.into_response(),
    }
}
