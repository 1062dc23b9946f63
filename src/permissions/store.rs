use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::PermissionDocument;
use crate::error::GateError;

/// Supplies the permission document for the current actor.
///
/// The gate only reads documents; whoever implements this owns fetching and
/// refreshing them.
pub trait PermissionSource: Send + Sync {
    fn document(&self, tenant: Option<&str>, role: &str) -> Option<Arc<PermissionDocument>>;
}

#[derive(Debug, Deserialize)]
struct PermissionFile {
    #[serde(default)]
    roles: HashMap<String, PermissionDocument>,
}

/// Role documents fixed at startup.
///
/// Keys are either a role id (`admin`) or a tenant-scoped role id
/// (`acme/admin`); the tenant-scoped entry wins when both exist.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionStore {
    documents: HashMap<String, Arc<PermissionDocument>>,
}

impl StaticPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, key: impl Into<String>, document: PermissionDocument) -> Self {
        self.documents.insert(key.into(), Arc::new(document));
        self
    }

    pub fn from_yaml_str(raw: &str, origin: &str) -> Result<Self, GateError> {
        let file: PermissionFile = serde_yaml::from_str(raw).map_err(|source| GateError::Parse {
            path: origin.to_string(),
            source,
        })?;

        let mut documents = HashMap::with_capacity(file.roles.len());
        for (key, mut document) in file.roles {
            document.validate(&key)?;
            if document.role.is_none() {
                document.role = Some(key.clone());
            }
            documents.insert(key, Arc::new(document));
        }

        tracing::info!("Loaded permission documents for {} role(s) from {}", documents.len(), origin);
        Ok(Self { documents })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| GateError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_yaml_str(&raw, &display)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl PermissionSource for StaticPermissionStore {
    fn document(&self, tenant: Option<&str>, role: &str) -> Option<Arc<PermissionDocument>> {
        tenant
            .and_then(|t| self.documents.get(&format!("{}/{}", t, role)))
            .or_else(|| self.documents.get(role))
            .cloned()
    }
}
