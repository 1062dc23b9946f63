use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::GateError;
use crate::gate::{ComponentGate, EdgeGate};
use crate::permissions::{PermissionSource, StaticPermissionStore};
use crate::routes::RouteTable;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub edge: Arc<EdgeGate>,
    pub component: Arc<ComponentGate>,
    pub permissions: Arc<dyn PermissionSource>,
}

impl AppState {
    pub fn new(config: AppConfig, routes: RouteTable, permissions: Arc<dyn PermissionSource>) -> Self {
        let edge = EdgeGate::new(Arc::new(routes), &config.gate, &config.session);
        let component = ComponentGate::new(config.gate.not_found_route.clone(), config.gate.fallback_lookup);

        Self {
            config: Arc::new(config),
            edge: Arc::new(edge),
            component: Arc::new(component),
            permissions,
        }
    }

    /// Build state from configuration, loading the route table and
    /// permission documents from disk when files are configured
    pub fn from_config(config: AppConfig) -> Result<Self, GateError> {
        let routes = match &config.gate.routes_file {
            Some(path) => RouteTable::from_yaml_file(path)?,
            None => RouteTable::builtin()?,
        };

        let permissions = match &config.gate.permissions_file {
            Some(path) => StaticPermissionStore::from_yaml_file(path)?,
            None => {
                tracing::warn!("No permissions file configured; every guarded page will be denied");
                StaticPermissionStore::new()
            }
        };

        Ok(Self::new(config, routes, Arc::new(permissions)))
    }
}
