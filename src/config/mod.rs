use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::permissions::FallbackLookup;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub gate: GateConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

/// Cookie names the gate reads and clears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub access_cookie: String,
    /// Duplicate token cookie left behind by older clients; cleared on the login redirect
    pub legacy_cookie: String,
    pub tenant_cookie: String,
    pub accept_bearer_header: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    pub login_route: String,
    pub landing_route: String,
    pub not_found_route: String,
    pub routes_file: Option<String>,
    pub permissions_file: Option<String>,
    pub fallback_lookup: FallbackLookup,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub debug_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("GATE_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("GATE_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_ENABLE_CORS") {
            self.server.enable_cors = v.parse().unwrap_or(self.server.enable_cors);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_ACCESS_COOKIE") {
            self.session.access_cookie = v;
        }
        if let Ok(v) = env::var("SESSION_LEGACY_COOKIE") {
            self.session.legacy_cookie = v;
        }
        if let Ok(v) = env::var("SESSION_TENANT_COOKIE") {
            self.session.tenant_cookie = v;
        }
        if let Ok(v) = env::var("SESSION_ACCEPT_BEARER_HEADER") {
            self.session.accept_bearer_header = v.parse().unwrap_or(self.session.accept_bearer_header);
        }

        // Gate overrides
        if let Ok(v) = env::var("GATE_LOGIN_ROUTE") {
            self.gate.login_route = v;
        }
        if let Ok(v) = env::var("GATE_LANDING_ROUTE") {
            self.gate.landing_route = v;
        }
        if let Ok(v) = env::var("GATE_NOT_FOUND_ROUTE") {
            self.gate.not_found_route = v;
        }
        if let Ok(v) = env::var("GATE_ROUTES_FILE") {
            self.gate.routes_file = Some(v);
        }
        if let Ok(v) = env::var("GATE_PERMISSIONS_FILE") {
            self.gate.permissions_file = Some(v);
        }
        if let Ok(v) = env::var("GATE_FALLBACK_LOOKUP") {
            self.gate.fallback_lookup = v.parse().unwrap_or(self.gate.fallback_lookup);
        }

        // Logging overrides
        if let Ok(v) = env::var("LOGGING_DEBUG") {
            self.logging.debug_logging = v.parse().unwrap_or(self.logging.debug_logging);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                enable_cors: true,
            },
            session: SessionConfig::default(),
            gate: GateConfig {
                permissions_file: Some("config/permissions.yaml".to_string()),
                ..GateConfig::default()
            },
            logging: LoggingConfig { debug_logging: true },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                enable_cors: true,
            },
            session: SessionConfig::default(),
            gate: GateConfig::default(),
            logging: LoggingConfig { debug_logging: false },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                enable_cors: false,
            },
            session: SessionConfig {
                accept_bearer_header: false,
                ..SessionConfig::default()
            },
            gate: GateConfig::default(),
            logging: LoggingConfig { debug_logging: false },
        }
    }

    /// Default `tracing` filter directive for this configuration
    pub fn log_filter(&self) -> &'static str {
        if self.logging.debug_logging {
            "taskdesk_gate=debug,tower_http=debug"
        } else {
            "taskdesk_gate=info,tower_http=warn"
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_cookie: "accessToken".to_string(),
            legacy_cookie: "token".to_string(),
            tenant_cookie: "activeCompany".to_string(),
            accept_bearer_header: true,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            login_route: "/login".to_string(),
            landing_route: "/dashboard".to_string(),
            not_found_route: "/page-not-found".to_string(),
            routes_file: None,
            permissions_file: None,
            fallback_lookup: FallbackLookup::Permissions,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
