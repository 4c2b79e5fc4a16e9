use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::types::RouteDefinition;

/// On-disk encodings of a route declaration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFormat {
    Yaml,
    Json,
}

impl RouteFormat {
    /// Pick the format from a file extension (`.yaml`, `.yml`, `.json`).
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(RouteFormat::Yaml),
            Some("json") => Ok(RouteFormat::Json),
            _ => bail!(
                "cannot infer route file format from '{}' (expected .yaml, .yml or .json)",
                path.display()
            ),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RouteFile {
    routes: Vec<RouteDefinition>,
}

/// A route file is either `routes: [...]` or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum RouteDocument {
    Wrapped(RouteFile),
    Bare(Vec<RouteDefinition>),
}

/// Parse route declarations from a string.
pub fn parse_routes(content: &str, format: RouteFormat) -> anyhow::Result<Vec<RouteDefinition>> {
    let document: RouteDocument = match format {
        RouteFormat::Yaml => serde_yaml::from_str(content).context("invalid YAML route file")?,
        RouteFormat::Json => serde_json::from_str(content).context("invalid JSON route file")?,
    };
    Ok(match document {
        RouteDocument::Wrapped(file) => file.routes,
        RouteDocument::Bare(routes) => routes,
    })
}

/// Render route declarations as a string in the given format.
pub fn render_routes(routes: &[RouteDefinition], format: RouteFormat) -> anyhow::Result<String> {
    let file = RouteFile {
        routes: routes.to_vec(),
    };
    match format {
        RouteFormat::Yaml => serde_yaml::to_string(&file).context("failed to render routes as YAML"),
        RouteFormat::Json => {
            serde_json::to_string_pretty(&file).context("failed to render routes as JSON")
        }
    }
}

/// Load route declarations from a YAML or JSON file.
pub fn load_routes(path: impl AsRef<Path>) -> anyhow::Result<Vec<RouteDefinition>> {
    let path = path.as_ref();
    let format = RouteFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read route file '{}'", path.display()))?;
    let routes = parse_routes(&content, format)
        .with_context(|| format!("failed to parse route file '{}'", path.display()))?;
    info!(
        path = %path.display(),
        routes_count = routes.len(),
        "Route declarations loaded"
    );
    Ok(routes)
}

/// Write route declarations to a YAML or JSON file.
pub fn save_routes(path: impl AsRef<Path>, routes: &[RouteDefinition]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let content = render_routes(routes, RouteFormat::from_path(path)?)?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write route file '{}'", path.display()))
}
