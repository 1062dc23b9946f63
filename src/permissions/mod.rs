//! Per-role module permissions and the access decision over them.

pub mod store;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::GateError;

pub use store::{PermissionSource, StaticPermissionStore};

/// Permission document for one role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// `None` when the collection is missing altogether, which always denies
    #[serde(default)]
    pub modules: Option<Vec<ModuleEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub key: String,
    /// Action name to flag; values are read for truthiness, not strictly as booleans
    #[serde(default)]
    pub permissions: Map<String, Value>,
    /// Any other property present on the module object
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ModuleEntry {
    pub fn new(key: impl Into<String>, permissions: Map<String, Value>) -> Self {
        Self {
            key: key.into(),
            permissions,
            attributes: Map::new(),
        }
    }

    fn permission(&self, action: &str) -> bool {
        self.permissions.get(action).map(truthy).unwrap_or(false)
    }

    fn property(&self, name: &str) -> bool {
        match name {
            "key" => !self.key.is_empty(),
            "permissions" => true,
            _ => self.attributes.get(name).map(truthy).unwrap_or(false),
        }
    }
}

impl PermissionDocument {
    pub fn with_modules(modules: Vec<ModuleEntry>) -> Self {
        Self {
            role: None,
            modules: Some(modules),
        }
    }

    pub fn module(&self, key: &str) -> Option<&ModuleEntry> {
        self.modules.as_ref()?.iter().find(|m| m.key == key)
    }

    /// Module keys must be unique within a document
    pub fn validate(&self, role: &str) -> Result<(), GateError> {
        let mut seen = HashSet::new();
        for module in self.modules.iter().flatten() {
            if !seen.insert(module.key.as_str()) {
                return Err(GateError::DuplicateModule {
                    role: role.to_string(),
                    key: module.key.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Where the plain-action branch of the check reads its flag from.
///
/// `Permissions` reads `module.permissions[action]`, like the create and edit
/// branches do. `ModuleProperty` reads `module[action]` off the module object
/// itself, which is what older clients did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackLookup {
    #[default]
    Permissions,
    #[serde(rename = "module")]
    ModuleProperty,
}

impl FromStr for FallbackLookup {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permissions" => Ok(FallbackLookup::Permissions),
            "module" | "module_property" => Ok(FallbackLookup::ModuleProperty),
            other => Err(GateError::InvalidSetting(format!("unknown fallback lookup '{}'", other))),
        }
    }
}

/// One `(action, module_path)` pair a surface needs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ability {
    pub action: String,
    pub module_path: String,
}

impl Ability {
    pub fn new(action: impl Into<String>, module_path: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            module_path: module_path.into(),
        }
    }

    /// First `/`-separated segment of the module path
    pub fn base_module(&self) -> &str {
        self.module_path.split('/').next().unwrap_or_default()
    }

    /// Substitute `{name}` placeholders in the module path with captured values
    pub fn resolve(&self, params: &HashMap<String, String>) -> Ability {
        let mut module_path = self.module_path.clone();
        for (name, value) in params {
            module_path = module_path.replace(&format!("{{{}}}", name), value);
        }
        Ability {
            action: self.action.clone(),
            module_path,
        }
    }

    pub fn intent(&self) -> Intent {
        Intent::of(&self.action, &self.module_path)
    }
}

impl FromStr for Ability {
    type Err = GateError;

    /// Parses `action:module/path`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((action, path)) if !action.is_empty() && !path.is_empty() => Ok(Ability::new(action, path)),
            _ => Err(GateError::InvalidAbility(s.to_string())),
        }
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.module_path)
    }
}

/// How a pair is checked, derived from the action and the shape of the path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// `create` on a path containing "add": `create` or legacy `add`
    Create,
    /// `edit`/`update` on `segment/<digits>`: `edit` or `update`
    Edit,
    /// Anything else: the action's own flag
    Direct,
}

impl Intent {
    pub fn of(action: &str, module_path: &str) -> Intent {
        if action == "create" && module_path.contains("add") {
            Intent::Create
        } else if (action == "edit" || action == "update") && is_edit_path(module_path) {
            Intent::Edit
        } else {
            Intent::Direct
        }
    }
}

/// `segment/<digits>` and nothing more
fn is_edit_path(module_path: &str) -> bool {
    match module_path.split_once('/') {
        Some((segment, id)) => {
            !segment.is_empty() && !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// JavaScript-style truthiness of a permission value
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Does the document grant every required ability?
///
/// A missing document, or one without a module collection, denies even an
/// empty requirement list.
pub fn can_access(document: Option<&PermissionDocument>, required: &[Ability]) -> bool {
    can_access_with(document, required, FallbackLookup::default())
}

pub fn can_access_with(
    document: Option<&PermissionDocument>,
    required: &[Ability],
    lookup: FallbackLookup,
) -> bool {
    let Some(document) = document.filter(|d| d.modules.is_some()) else {
        return false;
    };

    required.iter().all(|ability| {
        let allowed = check_ability(document, ability, lookup);
        if !allowed {
            tracing::debug!("Ability {} not granted", ability);
        }
        allowed
    })
}

fn check_ability(document: &PermissionDocument, ability: &Ability, lookup: FallbackLookup) -> bool {
    let Some(module) = document.module(ability.base_module()) else {
        return false;
    };

    match ability.intent() {
        Intent::Create => module.permission("create") || module.permission("add"),
        Intent::Edit => module.permission("edit") || module.permission("update"),
        Intent::Direct => match lookup {
            FallbackLookup::Permissions => module.permission(&ability.action),
            FallbackLookup::ModuleProperty => module.property(&ability.action),
        },
    }
}
