use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::collections::HashMap;
use std::sync::Arc;

use super::edge::SessionContext;
use crate::gate::{ComponentDecision, GateContext};
use crate::permissions::Ability;
use crate::state::AppState;

/// Required abilities declared by one guarded page.
///
/// Module paths may reference route captures, e.g. `users/{id}` on
/// `/users/:id`; they are filled in per request.
#[derive(Clone)]
pub struct PageGuard {
    state: AppState,
    required: Arc<[Ability]>,
}

impl PageGuard {
    pub fn new(state: &AppState, required: &[(&str, &str)]) -> Self {
        Self {
            state: state.clone(),
            required: required
                .iter()
                .map(|(action, module_path)| Ability::new(*action, *module_path))
                .collect(),
        }
    }
}

/// Component gate middleware for a single page route
pub async fn component_gate_middleware(
    State(guard): State<PageGuard>,
    params: Option<Path<HashMap<String, String>>>,
    request: Request,
    next: Next,
) -> Response {
    let params = params.map(|Path(p)| p).unwrap_or_default();
    let required: Vec<Ability> = guard.required.iter().map(|a| a.resolve(&params)).collect();

    let session = request.extensions().get::<SessionContext>();
    let tenant = session.and_then(|s| s.tenant.clone());
    let document = session.and_then(|s| {
        let role = s.verdict.role()?;
        guard.state.permissions.document(tenant.as_deref(), role)
    });

    let ctx = GateContext::new(request.uri().path())
        .with_tenant(tenant)
        .with_permissions(document);

    match guard.state.component.evaluate(&ctx, &required) {
        ComponentDecision::Render => next.run(request).await,
        ComponentDecision::Deny { redirect_to } => {
            tracing::warn!(
                "Component gate denied {} (required: {})",
                request.uri().path(),
                required.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
            );
            Redirect::temporary(&redirect_to).into_response()
        }
    }
}
