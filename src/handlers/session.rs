// handlers/session.rs - Current session inspection and logout

use axum::{
    extract::{Extension, State},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{edge::expire_cookies, ApiResponse, SessionContext};
use crate::state::AppState;

/// GET /api/session - Verdict, claims, tenant and effective permission document
pub async fn whoami(
    State(state): State<AppState>,
    session: Option<Extension<SessionContext>>,
) -> Result<ApiResponse<Value>, ApiError> {
    let Extension(session) =
        session.ok_or_else(|| ApiError::unauthorized("Session context missing; edge gate did not run"))?;

    let permissions = session
        .verdict
        .role()
        .and_then(|role| state.permissions.document(session.tenant.as_deref(), role));

    Ok(ApiResponse::success(json!({
        "authenticated": session.verdict.authenticated,
        "role": session.verdict.role(),
        "tenant": session.tenant,
        "claims": session.verdict.claims,
        "permissions": permissions.as_deref(),
    })))
}

/// POST /logout - Expire the session cookies and return to the login page
pub async fn logout(State(state): State<AppState>) -> Response {
    let session = &state.config.session;
    let mut response = Redirect::to(&state.config.gate.login_route).into_response();
    expire_cookies(
        response.headers_mut(),
        &[session.access_cookie.clone(), session.legacy_cookie.clone()],
    );
    response
}
