use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::docs::{export_docs, DocsOptions};
use crate::router::{strip_path_prefix, RequestMatcher, RouteIndex};
use crate::routes::{load_routes, PatternRegistry, RouteDefinition};

/// Command-line interface for attrouter route files
#[derive(Parser, Debug)]
#[command(name = "attrouter", version)]
#[command(about = "Inspect and check attrouter route declarations", long_about = None)]
pub struct Cli {
    /// Log level when ATTROUTER_LOG_LEVEL is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the route index and report every configuration error
    Check {
        /// Route file (YAML or JSON)
        routes: PathBuf,
    },
    /// List declared routes in match order
    Routes {
        /// Route file (YAML or JSON)
        routes: PathBuf,
    },
    /// Resolve a request against the route file and print the match
    Match {
        /// Route file (YAML or JSON)
        routes: PathBuf,
        /// HTTP verb, e.g. GET
        verb: String,
        /// Request path, optionally with a query string
        path: String,
        /// Server config (TOML) whose path prefix is stripped first
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the documentation export as JSON
    Docs {
        /// Route file (YAML or JSON)
        routes: PathBuf,
        /// Include routes marked as unpublished
        #[arg(long, default_value_t = false)]
        include_unpublished: bool,
        /// Pretty-print the JSON output
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
}

fn build_index(path: &Path) -> Result<RouteIndex> {
    let routes = load_routes(path)?;
    RouteIndex::build(routes)
        .with_context(|| format!("Invalid route declarations in {}", path.display()))
}

fn check(routes: Vec<RouteDefinition>, out: &mut impl Write) -> Result<()> {
    let total = routes.len();
    let errors = RouteIndex::check(&routes, &PatternRegistry::new());
    if errors.is_empty() {
        writeln!(out, "OK: {total} routes")?;
        return Ok(());
    }
    for error in &errors {
        writeln!(out, "error: {error}")?;
    }
    bail!("{} configuration error(s) in {total} routes", errors.len())
}

fn list_routes(index: &RouteIndex, out: &mut impl Write) -> Result<()> {
    for route in index.routes() {
        let definition = &route.definition;
        let mut flags = Vec::new();
        if definition.requires_authorization {
            flags.push("auth");
        }
        if !definition.published {
            flags.push("unpublished");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(","))
        };
        writeln!(
            out,
            "{:<8}{:<40} -> {} ({}){flags}",
            definition.method.as_str(),
            route.template.as_str(),
            route.handler(),
            route.status().as_u16(),
        )?;
    }
    Ok(())
}

fn match_route(
    index: &RouteIndex,
    verb: &str,
    target: &str,
    config: &ServerConfig,
    out: &mut impl Write,
) -> Result<()> {
    let path = target.split_once('?').map_or(target, |(p, _)| p);
    let path = strip_path_prefix(path, &config.path_prefix);
    let Some(matched) = RequestMatcher::new(index).match_request(verb, path) else {
        bail!("No route matched {verb} {target}");
    };

    let path_variables: Map<String, Value> = matched
        .path_variables
        .iter()
        .map(|(name, value)| (name.to_string(), Value::from(value.as_str())))
        .collect();
    let report = json!({
        "handler": matched.route.handler(),
        "method": matched.route.definition.method.as_str(),
        "path": matched.route.template.as_str(),
        "status": matched.route.status().as_u16(),
        "pathVariables": path_variables,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

/// Execute one command, writing its report to `out`.
pub fn execute(command: &Commands, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Check { routes } => {
            info!(routes_file = %routes.display(), "Checking route declarations");
            check(load_routes(routes)?, out)
        }
        Commands::Routes { routes } => list_routes(&build_index(routes)?, out),
        Commands::Match {
            routes,
            verb,
            path,
            config,
        } => {
            let config = match config {
                Some(path) => ServerConfig::load(path)?,
                None => ServerConfig::default(),
            }
            .with_env_overrides();
            match_route(&build_index(routes)?, verb, path, &config, out)
        }
        Commands::Docs {
            routes,
            include_unpublished,
            pretty,
        } => {
            let docs = export_docs(
                &build_index(routes)?,
                DocsOptions {
                    include_unpublished: *include_unpublished,
                },
            );
            let rendered = if *pretty {
                serde_json::to_string_pretty(&docs)?
            } else {
                serde_json::to_string(&docs)?
            };
            writeln!(out, "{rendered}")?;
            Ok(())
        }
    }
}

/// Run a parsed command against stdout.
pub fn run_cli(cli: &Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out).inspect_err(|e| warn!(error = %e, "Command failed"))
}
