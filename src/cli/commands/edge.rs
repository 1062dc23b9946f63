use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cli::utils::{output_details, output_success};
use crate::cli::OutputFormat;
use crate::config::{GateConfig, SessionConfig};
use crate::gate::{EdgeDecision, EdgeGate, EdgeOutcome, GateContext};
use crate::routes::RouteTable;

/// Dry-run the edge gate with the default session and gate settings
pub fn evaluate(routes: RouteTable, path: &str, token: Option<String>, now: DateTime<Utc>) -> EdgeOutcome {
    let gate = EdgeGate::new(Arc::new(routes), &GateConfig::default(), &SessionConfig::default());
    gate.evaluate_at(&GateContext::new(path).with_token(token), now)
}

pub fn report(path: &str, outcome: &EdgeOutcome) -> Value {
    json!({
        "path": path,
        "authenticated": outcome.verdict.authenticated,
        "role": outcome.verdict.role(),
        "decision": outcome.decision,
    })
}

fn describe(decision: &EdgeDecision) -> String {
    match decision {
        EdgeDecision::Continue => "continue".to_string(),
        EdgeDecision::NotFound => "404".to_string(),
        EdgeDecision::Redirect { to, clear_cookies } if clear_cookies.is_empty() => format!("redirect to {}", to),
        EdgeDecision::Redirect { to, clear_cookies } => {
            format!("redirect to {} (clearing {})", to, clear_cookies.join(", "))
        }
        EdgeDecision::Rewrite { to } => format!("rewrite to {}", to),
    }
}

pub fn handle(routes: RouteTable, path: &str, token: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let outcome = evaluate(routes, path, token, Utc::now());
    let data = report(path, &outcome);

    output_success(&output_format, &format!("{}: {}", path, describe(&outcome.decision)), Some(data.clone()))?;
    output_details(
        &output_format,
        &[
            ("signed in", data["authenticated"].to_string()),
            ("role", data["role"].as_str().unwrap_or("-").to_string()),
        ],
    );
    Ok(())
}
