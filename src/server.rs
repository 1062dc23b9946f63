use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{pages, service, session};
use crate::middleware::{component_gate_middleware, edge_gate_middleware, PageGuard};
use crate::state::AppState;

/// Build the full router.
///
/// Every page route and the not-found fallback sit behind the edge gate;
/// guarded pages additionally declare the abilities the component gate checks.
/// `/` and `/health` are service endpoints added after the edge layer and are
/// therefore not gated.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Auth pages (anonymous only; signed-in users are sent to the landing page)
        .route("/login", get(pages::render_page))
        .route("/register", get(pages::render_page))
        .route("/forgot-password", get(pages::render_page))
        .route("/reset-password", get(pages::render_page))
        .route("/verify-otp", get(pages::render_page))
        // Guarded pages
        .route("/dashboard", guarded(&state, &[("read", "dashboard")]))
        .route("/users", guarded(&state, &[("read", "users")]))
        .route("/users/add-new-user", guarded(&state, &[("create", "users/add-new-user")]))
        .route("/users/:id", guarded(&state, &[("update", "users/{id}")]))
        .route("/roles", guarded(&state, &[("read", "roles")]))
        .route("/roles/add-role", guarded(&state, &[("create", "roles/add-role")]))
        .route("/roles/:id", guarded(&state, &[("update", "roles/{id}")]))
        .route("/project-listing", guarded(&state, &[("read", "project-listing")]))
        .route(
            "/project-listing/add-project",
            guarded(&state, &[("create", "project-listing/add-project")]),
        )
        .route("/project-listing/:id", guarded(&state, &[("update", "project-listing/{id}")]))
        .route(
            "/project-listing/:id/documents/:document",
            guarded(&state, &[("read", "project-listing"), ("read", "documents")]),
        )
        .route("/tasks", guarded(&state, &[("read", "tasks")]))
        .route("/tasks/:id", guarded(&state, &[("read", "tasks")]))
        .route("/attendance", guarded(&state, &[("read", "attendance")]))
        .route("/leave", guarded(&state, &[("read", "leave")]))
        .route("/chat", guarded(&state, &[("read", "chat")]))
        .route("/subscription", guarded(&state, &[("read", "subscription")]))
        .route("/settings", guarded(&state, &[("update", "settings")]))
        .route("/profile", guarded(&state, &[]))
        .route(&state.config.gate.not_found_route, get(pages::not_found))
        // Session
        .route("/api/session", get(session::whoami))
        .route("/logout", post(session::logout))
        .fallback(pages::not_found)
        .layer(from_fn_with_state(state.clone(), edge_gate_middleware))
        // Service endpoints
        .route("/", get(service::root))
        .route("/health", get(service::health));

    let router = if state.config.server.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn guarded(state: &AppState, required: &[(&str, &str)]) -> MethodRouter<AppState> {
    get(pages::render_page).route_layer(from_fn_with_state(
        PageGuard::new(state, required),
        component_gate_middleware,
    ))
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("TaskDesk gate listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::permissions::{PermissionDocument, StaticPermissionStore};
    use crate::routes::RouteTable;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn state() -> AppState {
        let staff: PermissionDocument = serde_json::from_value(json!({
            "modules": [
                { "key": "dashboard", "permissions": { "read": true } },
                { "key": "users", "permissions": { "read": true, "add": true, "edit": false } }
            ]
        }))
        .unwrap();

        AppState::new(
            AppConfig::development(),
            RouteTable::builtin().unwrap(),
            Arc::new(StaticPermissionStore::new().with_document("staff", staff)),
        )
    }

    fn token(role: &str) -> String {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        encode(&Header::default(), &json!({ "exp": exp, "role": role }), &EncodingKey::from_secret(b"k")).unwrap()
    }

    async fn fetch(path: &str, role: Option<&str>) -> axum::response::Response {
        let mut request = Request::builder().uri(path);
        if let Some(role) = role {
            request = request.header(header::COOKIE, format!("accessToken={}", token(role)));
        }
        app(state()).oneshot(request.body(Body::empty()).unwrap()).await.unwrap()
    }

    fn location(response: &axum::response::Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_guarded_page_renders() {
        let response = fetch("/dashboard", Some("staff")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_page_accepts_legacy_add() {
        let response = fetch("/users/add-new-user", Some("staff")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_denied_page_redirects_to_not_found() {
        let response = fetch("/users/42", Some("staff")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/page-not-found");

        let response = fetch("/tasks", Some("staff")).await;
        assert_eq!(location(&response), "/page-not-found");
    }

    #[tokio::test]
    async fn test_unknown_role_is_denied() {
        let response = fetch("/profile", Some("contractor")).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/page-not-found");

        // Empty requirements pass for any role with a document
        let response = fetch("/profile", Some("staff")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_service_endpoints_skip_the_gate() {
        assert_eq!(fetch("/health", None).await.status(), StatusCode::OK);
        assert_eq!(fetch("/", Some("staff")).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unlisted_path_for_anonymous_visitor_falls_through() {
        let response = fetch("/some/unlisted/path", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[tokio::test]
    async fn test_not_found_route_follows_config() {
        let mut config = AppConfig::development();
        config.gate.not_found_route = "/missing".to_string();
        let state = AppState::new(
            config,
            RouteTable::builtin().unwrap(),
            Arc::new(StaticPermissionStore::new().with_document("staff", PermissionDocument::with_modules(vec![]))),
        );

        let request = |path: &str| {
            Request::builder()
                .uri(path)
                .header(header::COOKIE, format!("accessToken={}", token("staff")))
                .body(Body::empty())
                .unwrap()
        };

        // Component denials point at the configured page
        let response = app(state.clone()).oneshot(request("/dashboard")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/missing");

        // Unlisted paths for signed-in users get it in place
        let response = app(state).oneshot(request("/nowhere")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}
