use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::Deserialize;

use crate::modules::products::core::listing::ListQuery;
use crate::modules::products::use_cases::errors::ApplicationError;
use crate::shell::state::AppState;

#[derive(Deserialize)]
pub struct ListProductsParams {
    pub filter: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

pub async fn handle(
    State(state): State<AppState>,
    Query(params): Query<ListProductsParams>,
) -> Response {
    let query = ListQuery::from_params(params.filter.as_deref(), params.sort_order.as_deref());
    let today = Local::now().date_naive();
    match state.queries.list(&query, today).await {
        Ok(products) => Json(products).into_response(),
        Err(error) => ApplicationError::Repository(error).into_response(),
    }
}
