use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::AuthVerdict;
use crate::config::SessionConfig;
use crate::gate::{EdgeDecision, GateContext};
use crate::handlers::pages;
use crate::state::AppState;

/// Session details resolved by the edge gate, injected for downstream handlers
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub verdict: AuthVerdict,
    pub tenant: Option<String>,
}

/// Edge gate middleware: runs before routing decisions reach a page handler
/// and only knows the path and the session cookies.
pub async fn edge_gate_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = &state.config.session;
    let token = extract_session_token(request.headers(), session);
    let tenant = cookie_value(request.headers(), &session.tenant_cookie);

    let ctx = GateContext::new(request.uri().path())
        .with_token(token)
        .with_tenant(tenant.clone());
    let outcome = state.edge.evaluate(&ctx);

    match outcome.decision {
        EdgeDecision::Continue => {
            request.extensions_mut().insert(SessionContext {
                verdict: outcome.verdict,
                tenant,
            });
            next.run(request).await
        }
        EdgeDecision::NotFound => StatusCode::NOT_FOUND.into_response(),
        EdgeDecision::Redirect { to, clear_cookies } => {
            let mut response = Redirect::temporary(&to).into_response();
            expire_cookies(response.headers_mut(), &clear_cookies);
            response
        }
        EdgeDecision::Rewrite { to } => rewrite(&to, &state.config.gate.not_found_route, &ctx.path).await,
    }
}

/// Serve `to` in place of the requested page.
///
/// The router has already matched by the time this layer runs, so only the
/// not-found page can be served in place; any other target degrades to a
/// temporary redirect.
async fn rewrite(to: &str, not_found_route: &str, requested: &str) -> Response {
    if to == not_found_route {
        tracing::debug!("Serving {} in place of {}", to, requested);
        pages::not_found().await.into_response()
    } else {
        tracing::debug!("Rewrite of {} to {} sent as a redirect", requested, to);
        Redirect::temporary(to).into_response()
    }
}

/// Session token from the access cookie, falling back to a Bearer header
/// when the configuration allows it
pub fn extract_session_token(headers: &HeaderMap, session: &SessionConfig) -> Option<String> {
    cookie_value(headers, &session.access_cookie).or_else(|| {
        if !session.accept_bearer_header {
            return None;
        }
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

/// Value of a named cookie across all `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Append `Set-Cookie` headers that expire the given cookies
pub fn expire_cookies(headers: &mut HeaderMap, names: &[String]) {
    for name in names {
        match HeaderValue::from_str(&format!("{}=; Path=/; Max-Age=0", name)) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Cannot clear cookie '{}': {}", name, e),
        }
    }
}
