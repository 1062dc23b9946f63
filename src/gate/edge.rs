use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::GateContext;
use crate::auth::{authenticate_at, AuthVerdict};
use crate::config::{GateConfig, SessionConfig};
use crate::routes::{PassThrough, RouteTable};

/// What the edge gate does with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EdgeDecision {
    /// Hand the request to the router unchanged
    Continue,
    /// Bare 404, no page
    NotFound,
    Redirect {
        to: String,
        /// Cookies to expire on the redirect response
        clear_cookies: Vec<String>,
    },
    /// Serve another page in place of the requested one
    Rewrite { to: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeOutcome {
    pub decision: EdgeDecision,
    /// Anonymous when the path was a pass-through and the token was never read
    pub verdict: AuthVerdict,
}

/// Pre-render gate: classifies the path, authenticates the token, decides.
#[derive(Debug, Clone)]
pub struct EdgeGate {
    routes: Arc<RouteTable>,
    login_route: String,
    landing_route: String,
    not_found_route: String,
    legacy_cookie: String,
}

impl EdgeGate {
    pub fn new(routes: Arc<RouteTable>, gate: &GateConfig, session: &SessionConfig) -> Self {
        Self {
            routes,
            login_route: gate.login_route.clone(),
            landing_route: gate.landing_route.clone(),
            not_found_route: gate.not_found_route.clone(),
            legacy_cookie: session.legacy_cookie.clone(),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn evaluate(&self, ctx: &GateContext) -> EdgeOutcome {
        self.evaluate_at(ctx, Utc::now())
    }

    pub fn evaluate_at(&self, ctx: &GateContext, now: DateTime<Utc>) -> EdgeOutcome {
        // Pass-through paths are settled before the token is inspected
        match self.routes.pass_through(&ctx.path) {
            Some(PassThrough::DenyListed) => {
                tracing::debug!("Edge gate: {} is deny-listed", ctx.path);
                return EdgeOutcome {
                    decision: EdgeDecision::NotFound,
                    verdict: AuthVerdict::anonymous(),
                };
            }
            Some(PassThrough::Asset) => {
                return EdgeOutcome {
                    decision: EdgeDecision::Continue,
                    verdict: AuthVerdict::anonymous(),
                };
            }
            None => {}
        }

        let verdict = authenticate_at(ctx.token.as_deref(), now);
        let class = self.routes.classify(&ctx.path);

        let decision = if verdict.authenticated {
            if class.is_auth {
                EdgeDecision::Redirect {
                    to: self.landing_route.clone(),
                    clear_cookies: Vec::new(),
                }
            } else if class.is_protected {
                EdgeDecision::Continue
            } else {
                // Signed-in users only ever see classified routes
                EdgeDecision::Rewrite {
                    to: self.not_found_route.clone(),
                }
            }
        } else if class.is_protected {
            EdgeDecision::Redirect {
                to: self.login_route.clone(),
                clear_cookies: vec![self.legacy_cookie.clone()],
            }
        } else {
            EdgeDecision::Continue
        };

        tracing::debug!(
            "Edge gate: {} (authenticated: {}) -> {:?}",
            ctx.path,
            verdict.authenticated,
            decision
        );

        EdgeOutcome { decision, verdict }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn gate() -> EdgeGate {
        EdgeGate::new(
            Arc::new(RouteTable::builtin().unwrap()),
            &GateConfig::default(),
            &SessionConfig::default(),
        )
    }

    fn live_token() -> String {
        let exp = (Utc::now() + Duration::hours(1)).timestamp();
        encode(&Header::default(), &json!({ "exp": exp, "role": "admin" }), &EncodingKey::from_secret(b"k")).unwrap()
    }

    fn expired_token() -> String {
        let exp = (Utc::now() - Duration::hours(1)).timestamp();
        encode(&Header::default(), &json!({ "exp": exp }), &EncodingKey::from_secret(b"k")).unwrap()
    }

    fn decide(path: &str, token: Option<String>) -> EdgeDecision {
        gate().evaluate(&GateContext::new(path).with_token(token)).decision
    }

    #[test]
    fn test_authenticated_on_auth_route_goes_to_landing() {
        assert_eq!(
            decide("/login", Some(live_token())),
            EdgeDecision::Redirect {
                to: "/dashboard".to_string(),
                clear_cookies: vec![],
            }
        );
    }

    #[test]
    fn test_authenticated_on_protected_route_continues() {
        assert_eq!(decide("/dashboard", Some(live_token())), EdgeDecision::Continue);
        assert_eq!(
            decide("/project-listing/abc-123/documents/xyz-9", Some(live_token())),
            EdgeDecision::Continue
        );
    }

    #[test]
    fn test_authenticated_on_unlisted_route_is_rewritten() {
        assert_eq!(
            decide("/some/unlisted/path", Some(live_token())),
            EdgeDecision::Rewrite {
                to: "/page-not-found".to_string()
            }
        );
    }

    #[test]
    fn test_anonymous_on_protected_route_goes_to_login() {
        let expected = EdgeDecision::Redirect {
            to: "/login".to_string(),
            clear_cookies: vec!["token".to_string()],
        };
        assert_eq!(decide("/dashboard", None), expected);
        assert_eq!(decide("/dashboard", Some(expired_token())), expected);
        assert_eq!(decide("/dashboard", Some("garbage".to_string())), expected);
    }

    #[test]
    fn test_anonymous_on_public_routes_continues() {
        assert_eq!(decide("/login", None), EdgeDecision::Continue);
        assert_eq!(decide("/some/unlisted/path", None), EdgeDecision::Continue);
    }

    #[test]
    fn test_deny_list_wins_regardless_of_session() {
        let path = "/static/media/profilePlaceholder.png";
        assert_eq!(decide(path, None), EdgeDecision::NotFound);
        assert_eq!(decide(path, Some(live_token())), EdgeDecision::NotFound);
    }

    #[test]
    fn test_assets_skip_token_inspection() {
        let outcome = gate().evaluate(&GateContext::new("/static/media/logo.svg").with_token(Some(live_token())));
        assert_eq!(outcome.decision, EdgeDecision::Continue);
        assert!(!outcome.verdict.authenticated);
    }

    #[test]
    fn test_verdict_is_reported() {
        let outcome = gate().evaluate(&GateContext::new("/dashboard").with_token(Some(live_token())));
        assert!(outcome.verdict.authenticated);
        assert_eq!(outcome.verdict.role(), Some("admin"));
    }
}
