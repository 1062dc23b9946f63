//! The two enforcement points of the gate.
//!
//! The edge gate runs before any handler and only knows the path and the
//! session token. The component gate runs per guarded page with the full
//! permission document. Both work from an explicit [`GateContext`].

pub mod component;
pub mod edge;

use std::sync::Arc;

use crate::permissions::PermissionDocument;

pub use component::{ComponentDecision, ComponentGate, ComponentGuard, GuardRender};
pub use edge::{EdgeDecision, EdgeGate, EdgeOutcome};

/// Everything a gate evaluation may look at for one request
#[derive(Debug, Clone, Default)]
pub struct GateContext {
    pub path: String,
    pub token: Option<String>,
    /// Active tenant id from the tenant cookie
    pub tenant: Option<String>,
    pub permissions: Option<Arc<PermissionDocument>>,
}

impl GateContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_tenant(mut self, tenant: Option<String>) -> Self {
        self.tenant = tenant;
        self
    }

    pub fn with_permissions(mut self, permissions: Option<Arc<PermissionDocument>>) -> Self {
        self.permissions = permissions;
        self
    }
}
