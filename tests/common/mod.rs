//! Shared fixtures for integration tests.
//!
//! `test_routes` mirrors a small controller: the `/test/{id}/` route used by
//! the end-to-end scenarios plus routes exercising bodies, headers, custom
//! types, authorization and failure paths.

#![allow(dead_code)]

use attrouter::config::ServerConfig;
use attrouter::dispatcher::Dispatcher;
use attrouter::error::ApiError;
use attrouter::filter::FilterSpec;
use attrouter::middleware::BearerAuthorization;
use attrouter::router::RouteIndex;
use attrouter::routes::{CustomType, ParameterSpec, RouteDefinition, RouteDocs};
use serde_json::{json, Value};
use std::path::PathBuf;

pub const CONTROLLER: &str = "TestController";

pub fn test_routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::get("/test/{id}/", "get_test")
            .in_controller(CONTROLLER)
            .param(ParameterSpec::path("id").int().min(0.0).max(4.0))
            .param(
                ParameterSpec::query("name")
                    .pattern(r"/^[\w]+$/")
                    .default_value("john"),
            )
            .with_filter(FilterSpec::from_keys(["name", "id"]).unwrap())
            .with_docs(RouteDocs {
                name: Some("Get test".to_string()),
                description: None,
                example_response: Some(json!({"id": "<3>", "name": "Ann"})),
            }),
        RouteDefinition::get("/test/latest", "latest_test").in_controller(CONTROLLER),
        RouteDefinition::post("/test", "create_test")
            .in_controller(CONTROLLER)
            .param(ParameterSpec::query("name").min(2.0).max(20.0))
            .param(ParameterSpec::query("email").custom(CustomType::Email))
            .param(
                ParameterSpec::query("tags")
                    .custom(CustomType::Json)
                    .optional(),
            ),
        RouteDefinition::put("/test/{id}", "update_test")
            .in_controller(CONTROLLER)
            .param(ParameterSpec::path("id").int())
            .param(ParameterSpec::query("payload").custom(CustomType::Xml)),
        RouteDefinition::get("/me", "me")
            .in_controller("AccountController")
            .authorized(),
        RouteDefinition::get("/headers", "echo_header")
            .in_controller("AccountController")
            .param(ParameterSpec::header("X-Api-Key")),
        RouteDefinition::delete("/test/{id}", "delete_test")
            .in_controller(CONTROLLER)
            .with_status(204)
            .param(ParameterSpec::path("id").int())
            .unpublished(),
        RouteDefinition::get("/boom", "boom"),
        RouteDefinition::get("/forbidden", "forbidden"),
    ]
}

pub fn test_index() -> RouteIndex {
    RouteIndex::build(test_routes()).unwrap()
}

pub fn arg_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Dispatcher with every fixture handler registered and bearer authorization
/// installed.
pub fn test_dispatcher(config: ServerConfig) -> Dispatcher {
    let mut dispatcher = Dispatcher::new(test_index(), config);
    dispatcher
        .register_handler("get_test", |call| {
            Ok(json!({
                "id": format!("<{}>", arg_text(call.arg("id"))),
                "name": call.arg("name"),
                "secret": "not for clients",
            }))
        })
        .register_handler("latest_test", |_| Ok(json!({"latest": true})))
        .register_handler("create_test", |call| Ok(Value::Object(call.args.clone().into_map())))
        .register_handler("update_test", |call| {
            Ok(json!({"id": call.arg("id"), "payload": call.arg("payload")}))
        })
        .register_handler("me", |call| Ok(json!({"token": call.token()})))
        .register_handler("echo_header", |call| Ok(json!({"key": call.arg("X-Api-Key")})))
        .register_handler("delete_test", |_| Ok(Value::Null))
        .register_handler("boom", |_| -> Result<Value, ApiError> { panic!("kaboom") })
        .register_handler("forbidden", |_| {
            Err(ApiError::forbidden("accessDenied", "Not allowed"))
        })
        .set_pre_route_hook(BearerAuthorization::new());
    dispatcher
}

pub fn write_routes(dir: &tempfile::TempDir, file_name: &str) -> PathBuf {
    let path = dir.path().join(file_name);
    attrouter::routes::save_routes(&path, &test_routes()).unwrap();
    path
}
