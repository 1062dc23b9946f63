use serde_json::{json, Value};

use crate::cli::utils::{output_details, output_success};
use crate::cli::OutputFormat;
use crate::routes::{normalize_path, RouteTable};

/// Everything the route tables say about one path
pub fn report(routes: &RouteTable, path: &str) -> Value {
    let class = routes.classify(path);
    json!({
        "path": path,
        "normalized": normalize_path(path),
        "kind": routes.kind(path),
        "is_auth": class.is_auth,
        "is_protected": class.is_protected,
        "pass_through": routes.pass_through(path),
    })
}

pub fn handle(routes: &RouteTable, path: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let data = report(routes, path);
    let kind = data["kind"].as_str().unwrap_or("unknown").to_string();

    output_success(&output_format, &format!("{} is {}", path, kind), Some(data.clone()))?;
    output_details(
        &output_format,
        &[
            ("normalized", data["normalized"].to_string()),
            ("auth", data["is_auth"].to_string()),
            ("protected", data["is_protected"].to_string()),
            ("passthrough", data["pass_through"].to_string()),
        ],
    );
    Ok(())
}
