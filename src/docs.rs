//! # Documentation Export
//!
//! Describes the registered routes as a JSON document grouped by controller
//! label:
//!
//! ```json
//! {"controllers": [{"controller": "PetController", "routes": [{
//!     "handler": "get_pet", "method": "GET", "statusCode": 200,
//!     "path": "/pets/{id}", "pathVariableNames": ["id"],
//!     "parameters": [{"name": "id", "source": "path_variable", "type": "int"}]
//! }]}]}
//! ```
//!
//! Controllers and routes keep declaration order. Routes without a
//! controller label are grouped under [`DEFAULT_CONTROLLER`]. Unpublished
//! routes are left out unless [`DocsOptions::include_unpublished`] is set.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::router::RouteIndex;
use crate::routes::CompiledRoute;

pub const DEFAULT_CONTROLLER: &str = "default";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocsOptions {
    pub include_unpublished: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDocs {
    pub controllers: Vec<ControllerDocs>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerDocs {
    pub controller: String,
    pub routes: Vec<RouteDocEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDocEntry {
    pub handler: String,
    pub method: String,
    pub status_code: u16,
    pub path: String,
    pub path_variable_names: Vec<String>,
    pub parameters: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_response: Option<Value>,
}

impl RouteDocEntry {
    fn from_route(route: &CompiledRoute) -> Self {
        let definition = &route.definition;
        let parameters = route
            .parameters
            .iter()
            .map(|param| {
                let mut value = serde_json::to_value(&param.spec).unwrap_or(Value::Null);
                // references are documented by the expression they resolved to
                if let (Some(expression), Value::Object(map)) =
                    (&param.pattern_source, &mut value)
                {
                    map.insert("pattern".to_string(), Value::from(expression.as_str()));
                }
                value
            })
            .collect();
        let docs = definition.docs.clone().unwrap_or_default();

        Self {
            handler: definition.handler.clone(),
            method: definition.method.as_str().to_string(),
            status_code: route.status().as_u16(),
            path: definition.path.clone(),
            path_variable_names: route
                .template
                .placeholder_names()
                .map(str::to_string)
                .collect(),
            parameters,
            return_filter: route.filter().cloned().map(Value::from),
            name: docs.name,
            description: docs.description,
            example_response: docs.example_response,
        }
    }
}

/// Build the documentation export for a set of compiled routes.
pub fn export_routes(routes: &[Arc<CompiledRoute>], options: DocsOptions) -> ApiDocs {
    let mut controllers: Vec<ControllerDocs> = Vec::new();
    let mut skipped = 0usize;

    for route in routes {
        if !route.definition.published && !options.include_unpublished {
            skipped += 1;
            continue;
        }
        let label = route
            .definition
            .controller
            .as_deref()
            .unwrap_or(DEFAULT_CONTROLLER);
        let entry = RouteDocEntry::from_route(route);
        match controllers.iter_mut().find(|c| c.controller == label) {
            Some(controller) => controller.routes.push(entry),
            None => controllers.push(ControllerDocs {
                controller: label.to_string(),
                routes: vec![entry],
            }),
        }
    }

    debug!(
        controllers = controllers.len(),
        skipped_unpublished = skipped,
        "Documentation export built"
    );
    ApiDocs { controllers }
}

/// Build the documentation export for every route in an index.
pub fn export_docs(index: &RouteIndex, options: DocsOptions) -> ApiDocs {
    export_routes(index.routes(), options)
}

impl ApiDocs {
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to convert documentation export");
            Value::Null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSpec;
    use crate::routes::{ParameterSpec, PatternRegistry, RouteDefinition, RouteDocs};
    use serde_json::json;

    fn index() -> RouteIndex {
        RouteIndex::build(vec![
            RouteDefinition::get("/pets/{id}", "get_pet")
                .in_controller("PetController")
                .param(ParameterSpec::path("id").int())
                .with_filter(FilterSpec::from_keys(["id", "name"]).unwrap())
                .with_docs(RouteDocs {
                    name: Some("Get pet".to_string()),
                    description: Some(json!("Fetch a single pet")),
                    example_response: Some(json!({"id": 1, "name": "Rex"})),
                }),
            RouteDefinition::post("/pets", "add_pet")
                .in_controller("PetController")
                .unpublished(),
            RouteDefinition::get("/health", "health"),
        ])
        .unwrap()
    }

    #[test]
    fn test_groups_by_controller_and_skips_unpublished() {
        let docs = export_docs(&index(), DocsOptions::default());
        assert_eq!(docs.controllers.len(), 2);
        assert_eq!(docs.controllers[0].controller, "PetController");
        assert_eq!(docs.controllers[0].routes.len(), 1);
        assert_eq!(docs.controllers[1].controller, DEFAULT_CONTROLLER);
    }

    #[test]
    fn test_include_unpublished() {
        let docs = export_docs(
            &index(),
            DocsOptions {
                include_unpublished: true,
            },
        );
        let pets = &docs.controllers[0];
        assert_eq!(pets.routes.len(), 2);
        assert_eq!(pets.routes[1].status_code, 201);
        assert_eq!(pets.routes[1].method, "POST");
    }

    #[test]
    fn test_route_entry_shape() {
        let value = export_docs(&index(), DocsOptions::default()).to_value();
        let route = &value["controllers"][0]["routes"][0];
        assert_eq!(route["handler"], "get_pet");
        assert_eq!(route["method"], "GET");
        assert_eq!(route["statusCode"], 200);
        assert_eq!(route["path"], "/pets/{id}");
        assert_eq!(route["pathVariableNames"], json!(["id"]));
        assert_eq!(route["parameters"][0]["name"], "id");
        assert_eq!(route["returnFilter"], json!(["id", "name"]));
        assert_eq!(route["name"], "Get pet");
        assert_eq!(route["exampleResponse"]["name"], "Rex");

        let health = &value["controllers"][1]["routes"][0];
        assert!(health.get("returnFilter").is_none());
        assert!(health.get("name").is_none());
    }

    #[test]
    fn test_patterns_are_documented_as_declared() {
        let mut patterns = PatternRegistry::new();
        patterns.register("Patterns", "slug", "[a-z-]+");
        let index = RouteIndex::build_with_patterns(
            vec![RouteDefinition::get("/posts", "posts")
                .param(ParameterSpec::query("name").pattern(r"/^[\w]+$/"))
                .param(ParameterSpec::query("slug").pattern_ref("Patterns", None))],
            &patterns,
        )
        .unwrap();
        let value = export_docs(&index, DocsOptions::default()).to_value();
        let params = &value["controllers"][0]["routes"][0]["parameters"];
        assert_eq!(params[0]["pattern"], r"/^[\w]+$/");
        assert_eq!(params[1]["pattern"], "[a-z-]+");
    }
}
