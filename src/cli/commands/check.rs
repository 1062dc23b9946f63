use anyhow::Context;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::cli::utils::{output_details, output_error, output_success};
use crate::cli::OutputFormat;
use crate::permissions::{can_access_with, Ability, FallbackLookup, PermissionSource, StaticPermissionStore};

pub struct CheckArgs {
    pub permissions: PathBuf,
    pub role: String,
    pub tenant: Option<String>,
    pub module_lookup: bool,
    pub abilities: Vec<String>,
}

/// Evaluate `abilities` against the role's document, one entry per ability
/// plus the combined verdict
pub fn report(
    store: &dyn PermissionSource,
    role: &str,
    tenant: Option<&str>,
    abilities: &[Ability],
    lookup: FallbackLookup,
) -> Value {
    let document = store.document(tenant, role);
    let document = document.as_deref();

    let results: Vec<Value> = abilities
        .iter()
        .map(|ability| {
            json!({
                "ability": ability.to_string(),
                "allowed": can_access_with(document, std::slice::from_ref(ability), lookup),
            })
        })
        .collect();

    json!({
        "role": role,
        "tenant": tenant,
        "document_found": document.is_some(),
        "allowed": can_access_with(document, abilities, lookup),
        "abilities": results,
    })
}

pub fn handle(args: CheckArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = StaticPermissionStore::from_yaml_file(&args.permissions)
        .with_context(|| format!("loading permissions from {}", args.permissions.display()))?;

    let abilities = args
        .abilities
        .iter()
        .map(|raw| raw.parse::<Ability>())
        .collect::<Result<Vec<_>, _>>()?;

    let lookup = if args.module_lookup {
        FallbackLookup::ModuleProperty
    } else {
        FallbackLookup::Permissions
    };

    let data = report(&store, &args.role, args.tenant.as_deref(), &abilities, lookup);

    if data["allowed"] == true {
        output_success(&output_format, &format!("Role {} is allowed", args.role), Some(data.clone()))?;
    } else if data["document_found"] == false {
        output_error(
            &output_format,
            &format!("No permission document for role {}", args.role),
            Some("DOCUMENT_NOT_FOUND"),
            Some(data.clone()),
        )?;
    } else {
        output_error(
            &output_format,
            &format!("Role {} is denied", args.role),
            Some("ACCESS_DENIED"),
            Some(data.clone()),
        )?;
    }

    let details: Vec<(&str, String)> = data["abilities"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|entry| {
            let verdict = if entry["allowed"] == true { "granted" } else { "denied" };
            (verdict, entry["ability"].as_str().unwrap_or_default().to_string())
        })
        .collect();
    output_details(&output_format, &details);

    Ok(())
}
