use serde::Serialize;
use std::sync::Arc;

use super::GateContext;
use crate::permissions::{can_access_with, Ability, FallbackLookup, PermissionDocument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ComponentDecision {
    Render,
    /// Render nothing and navigate away
    Deny { redirect_to: String },
}

impl ComponentDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, ComponentDecision::Render)
    }
}

/// Render-time permission check for a guarded page
#[derive(Debug, Clone)]
pub struct ComponentGate {
    not_found_route: String,
    lookup: FallbackLookup,
}

impl ComponentGate {
    pub fn new(not_found_route: impl Into<String>, lookup: FallbackLookup) -> Self {
        Self {
            not_found_route: not_found_route.into(),
            lookup,
        }
    }

    /// Decide for a request context carrying the resolved permission document
    pub fn evaluate(&self, ctx: &GateContext, required: &[Ability]) -> ComponentDecision {
        let decision = self.decide(ctx.permissions.as_deref(), required);
        if !decision.is_render() {
            tracing::debug!("Component gate: {} denied for tenant {:?}", ctx.path, ctx.tenant);
        }
        decision
    }

    pub fn decide(&self, document: Option<&PermissionDocument>, required: &[Ability]) -> ComponentDecision {
        if can_access_with(document, required, self.lookup) {
            ComponentDecision::Render
        } else {
            ComponentDecision::Deny {
                redirect_to: self.not_found_route.clone(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRender {
    Content,
    Nothing,
}

/// Long-lived guard for a UI surface that re-renders.
///
/// The decision is only recomputed when the permission document (by
/// identity) or the required abilities change. A denial queues exactly one
/// redirect per change, collected separately from the render result through
/// [`ComponentGuard::take_redirect`] so it never fires mid-render.
#[derive(Debug)]
pub struct ComponentGuard {
    gate: ComponentGate,
    document: Option<Arc<PermissionDocument>>,
    required: Vec<Ability>,
    evaluated: bool,
    allowed: bool,
    pending_redirect: Option<String>,
}

impl ComponentGuard {
    pub fn new(gate: ComponentGate) -> Self {
        Self {
            gate,
            document: None,
            required: Vec::new(),
            evaluated: false,
            allowed: false,
            pending_redirect: None,
        }
    }

    pub fn render(&mut self, document: Option<&Arc<PermissionDocument>>, required: &[Ability]) -> GuardRender {
        if !self.evaluated || self.inputs_changed(document, required) {
            self.document = document.cloned();
            self.required = required.to_vec();
            self.evaluated = true;

            match self.gate.decide(document.map(Arc::as_ref), required) {
                ComponentDecision::Render => {
                    self.allowed = true;
                    self.pending_redirect = None;
                }
                ComponentDecision::Deny { redirect_to } => {
                    self.allowed = false;
                    self.pending_redirect = Some(redirect_to);
                }
            }
        }

        if self.allowed {
            GuardRender::Content
        } else {
            GuardRender::Nothing
        }
    }

    /// Redirect queued by the last change of inputs, if any. Returns it once.
    pub fn take_redirect(&mut self) -> Option<String> {
        self.pending_redirect.take()
    }

    fn inputs_changed(&self, document: Option<&Arc<PermissionDocument>>, required: &[Ability]) -> bool {
        let same_document = match (&self.document, document) {
            (Some(current), Some(next)) => Arc::ptr_eq(current, next),
            (None, None) => true,
            _ => false,
        };
        !same_document || self.required != required
    }
}
