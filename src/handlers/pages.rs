// handlers/pages.rs - Placeholder screens behind the gates

use axum::extract::{MatchedPath, Path};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::middleware::ApiResponse;

/// GET on any page route: echoes the matched route and its captures
pub async fn render_page(
    matched: Option<MatchedPath>,
    params: Option<Path<HashMap<String, String>>>,
) -> ApiResponse<Value> {
    let page = matched.as_ref().map(MatchedPath::as_str).unwrap_or("/");
    let params = params.map(|Path(p)| p).unwrap_or_default();

    ApiResponse::success(json!({
        "page": page,
        "params": params,
    }))
}

/// The not-found page; also served for edge rewrites and unmatched paths
pub async fn not_found() -> ApiError {
    ApiError::not_found("Page not found")
}
