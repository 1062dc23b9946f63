//! Route classification for the edge gate.
//!
//! A path is classified against three disjoint tables: auth routes (login,
//! registration, ...), protected literal routes and protected dynamic
//! patterns. Anything else is public to anonymous visitors and not-found for
//! signed-in users. Static assets and a deny-list of broken legacy image
//! names are detected separately, before any token is looked at.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::GateError;

/// Characters a placeholder segment may contain
const PLACEHOLDER_CLASS: &str = "[a-zA-Z0-9-]+";

/// Result of classifying a normalized path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteClass {
    pub is_auth: bool,
    pub is_protected: bool,
}

/// Finer-grained view of a classification, used for logging and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Auth,
    ProtectedStatic,
    ProtectedDynamic,
    Unknown,
}

/// Paths the gate lets through (or rejects) before applying auth logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassThrough {
    /// Known broken legacy asset; answered with a bare 404
    DenyListed,
    /// Framework or static asset; always continues
    Asset,
}

/// Route tables as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteDefinitions {
    pub auth_routes: Vec<String>,
    pub protected_routes: Vec<String>,
    /// Templates such as `/project-listing/{id}/documents/{id}`
    pub dynamic_protected_patterns: Vec<String>,
    pub asset_prefixes: Vec<String>,
    pub deny_list: Vec<String>,
}

impl Default for RouteDefinitions {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        Self {
            auth_routes: owned(&[
                "/login",
                "/register",
                "/forgot-password",
                "/reset-password",
                "/verify-otp",
            ]),
            protected_routes: owned(&[
                "/dashboard",
                "/users",
                "/users/add-new-user",
                "/roles",
                "/roles/add-role",
                "/project-listing",
                "/project-listing/add-project",
                "/tasks",
                "/attendance",
                "/leave",
                "/chat",
                "/subscription",
                "/profile",
                "/settings",
                "/page-not-found",
                "/logout",
                "/api/session",
            ]),
            dynamic_protected_patterns: owned(&[
                "/users/{id}",
                "/roles/{id}",
                "/project-listing/{id}",
                "/project-listing/{id}/documents/{id}",
                "/tasks/{id}",
            ]),
            asset_prefixes: owned(&["/_app", "/static"]),
            deny_list: owned(&["profilePlaceholder.png", "user-placeholder.png", "logo-old.png"]),
        }
    }
}

/// A compiled dynamic route template
#[derive(Debug, Clone)]
pub struct DynamicPattern {
    template: String,
    regex: Regex,
}

impl DynamicPattern {
    /// Compile a template whose `{name}` segments match one or more of `[a-zA-Z0-9-]`.
    /// The resulting matcher is anchored at both ends.
    pub fn compile(template: &str) -> Result<Self, GateError> {
        let invalid = |reason: &str| GateError::InvalidPattern {
            pattern: template.to_string(),
            reason: reason.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut source = String::from("^");
        for segment in template.split('/').skip(1) {
            source.push('/');
            if segment.is_empty() {
                return Err(invalid("empty path segment"));
            }

            if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid("placeholder names must be alphanumeric"));
                }
                source.push_str(PLACEHOLDER_CLASS);
            } else if segment.contains('{') || segment.contains('}') {
                return Err(invalid("placeholders must span a whole segment"));
            } else {
                source.push_str(&regex::escape(segment));
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            template: template.to_string(),
            regex,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Compiled route tables
#[derive(Debug, Clone)]
pub struct RouteTable {
    auth_routes: HashSet<String>,
    protected_routes: HashSet<String>,
    dynamic_patterns: Vec<DynamicPattern>,
    asset_prefixes: Vec<String>,
    deny_list: HashSet<String>,
}

impl RouteTable {
    pub fn from_definitions(defs: RouteDefinitions) -> Result<Self, GateError> {
        let dynamic_patterns = defs
            .dynamic_protected_patterns
            .iter()
            .map(|template| DynamicPattern::compile(template))
            .collect::<Result<Vec<_>, _>>()?;

        let normalized = |routes: Vec<String>| {
            routes
                .iter()
                .map(|route| normalize_path(route).to_string())
                .collect::<HashSet<_>>()
        };

        Ok(Self {
            auth_routes: normalized(defs.auth_routes),
            protected_routes: normalized(defs.protected_routes),
            dynamic_patterns,
            asset_prefixes: defs.asset_prefixes,
            deny_list: defs.deny_list.into_iter().collect(),
        })
    }

    /// Route tables shipped with the service
    pub fn builtin() -> Result<Self, GateError> {
        Self::from_definitions(RouteDefinitions::default())
    }

    /// Load route tables from a YAML file. Omitted sections keep their built-in values.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let raw = std::fs::read_to_string(path).map_err(|source| GateError::Io {
            path: display.clone(),
            source,
        })?;
        let defs: RouteDefinitions =
            serde_yaml::from_str(&raw).map_err(|source| GateError::Parse { path: display, source })?;

        Self::from_definitions(defs)
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        let path = normalize_path(path);
        RouteClass {
            is_auth: self.auth_routes.contains(path),
            is_protected: self.protected_routes.contains(path) || self.matches_dynamic(path),
        }
    }

    pub fn kind(&self, path: &str) -> RouteKind {
        let path = normalize_path(path);
        if self.auth_routes.contains(path) {
            RouteKind::Auth
        } else if self.protected_routes.contains(path) {
            RouteKind::ProtectedStatic
        } else if self.matches_dynamic(path) {
            RouteKind::ProtectedDynamic
        } else {
            RouteKind::Unknown
        }
    }

    /// Deny-list first, then assets. `None` means the path goes through the auth checks.
    pub fn pass_through(&self, path: &str) -> Option<PassThrough> {
        if path.split('/').any(|segment| self.deny_list.contains(segment)) {
            return Some(PassThrough::DenyListed);
        }

        let is_asset = self
            .asset_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
            || path.contains('.');

        is_asset.then_some(PassThrough::Asset)
    }

    /// Patterns are OR-combined, so evaluation order has no effect on the result
    fn matches_dynamic(&self, path: &str) -> bool {
        self.dynamic_patterns.iter().any(|pattern| pattern.matches(path))
    }

    pub fn auth_routes(&self) -> impl Iterator<Item = &str> {
        self.auth_routes.iter().map(String::as_str)
    }
}

/// Strip trailing slashes, keeping the root path intact
pub fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}
