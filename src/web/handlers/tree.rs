//! Tree handler.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::{blocking, AppState};
use crate::web::dto::{ApiResponse, TreeQuery, TreeResponse};
use crate::web::error::ApiError;

/// GET /api/tree - Directory tree focused on `current_path`, with usage.
pub async fn get_tree(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<ApiResponse<TreeResponse>>, ApiError> {
    let tree = blocking(move || state.tree_response(&query.current_path)).await?;
    Ok(Json(ApiResponse::new(tree)))
}
