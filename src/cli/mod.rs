pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::routes::RouteTable;

#[derive(Parser)]
#[command(name = "gatectl")]
#[command(about = "Inspect TaskDesk gate decisions from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Route table YAML (defaults to the built-in table)")]
    pub routes: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Classify a path against the route tables")]
    Classify {
        #[arg(help = "Request path, e.g. /project-listing/42")]
        path: String,
    },

    #[command(about = "Decode a session token and report whether it is live")]
    Token {
        #[arg(help = "Session token (JWT)")]
        token: String,
    },

    #[command(about = "Check required abilities against a role's permission document")]
    Check {
        #[arg(long, help = "Permission documents YAML")]
        permissions: PathBuf,
        #[arg(long, help = "Role id")]
        role: String,
        #[arg(long, help = "Active tenant id")]
        tenant: Option<String>,
        #[arg(long, help = "Read plain actions off the module object instead of its permissions")]
        module_lookup: bool,
        #[arg(help = "Required abilities as <action>:<module_path>")]
        abilities: Vec<String>,
    },

    #[command(about = "Show the edge gate decision for a request")]
    Edge {
        #[arg(help = "Request path")]
        path: String,
        #[arg(long, help = "Session token (JWT)")]
        token: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

fn load_routes(path: Option<&PathBuf>) -> anyhow::Result<RouteTable> {
    Ok(match path {
        Some(path) => RouteTable::from_yaml_file(path)?,
        None => RouteTable::builtin()?,
    })
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Classify { path } => {
            let routes = load_routes(cli.routes.as_ref())?;
            commands::classify::handle(&routes, &path, output_format)
        }
        Commands::Token { token } => commands::token::handle(&token, output_format),
        Commands::Check {
            permissions,
            role,
            tenant,
            module_lookup,
            abilities,
        } => commands::check::handle(
            commands::check::CheckArgs {
                permissions,
                role,
                tenant,
                module_lookup,
                abilities,
            },
            output_format,
        ),
        Commands::Edge { path, token } => {
            let routes = load_routes(cli.routes.as_ref())?;
            commands::edge::handle(routes, &path, token, output_format)
        }
    }
}
