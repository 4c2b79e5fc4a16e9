//! End-to-end dispatch through match, hook, bind, handler and filter.
//!
//! # Key Test Cases
//!
//! - `test_get_with_query_parameter`: happy path with filter applied
//! - `test_bound_violation_returns_400`: first failing parameter wins
//! - `test_panic_handler_returns_500`: panics become `HandlerPanic`
//! - `test_index_swap_takes_effect`: rebuilds are visible to later requests

mod common;

use attrouter::binder::CgiHeaders;
use attrouter::config::ServerConfig;
use attrouter::dispatcher::{ApiResponse, DispatchRequest, Dispatcher};
use attrouter::error::ConfigurationError;
use attrouter::ids::RequestId;
use attrouter::middleware::BearerAuthorization;
use attrouter::router::RouteIndex;
use attrouter::routes::RouteDefinition;
use attrouter::ApiError;
use http::StatusCode;
use serde_json::{json, Value};

fn get(dispatcher: &Dispatcher, target: &str) -> ApiResponse {
    dispatcher.dispatch(DispatchRequest::new("GET", target))
}

fn assert_error(response: &ApiResponse, status: StatusCode, code: &str) {
    assert_eq!(response.status, status, "body: {}", response.body);
    assert_eq!(response.body["error"], code);
    assert_eq!(response.body["status"], status.as_u16());
    assert!(response.body["errorDescription"].is_string());
}

#[test]
fn test_get_with_query_parameter() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    let response = get(&dispatcher, "/test/3/?name=Ann");
    assert_eq!(response.status, StatusCode::OK);
    // "secret" is removed by the route filter
    assert_eq!(response.body, json!({"id": "<3>", "name": "Ann"}));
}

#[test]
fn test_default_value_reaches_handler() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    let response = get(&dispatcher, "/test/0/");
    assert_eq!(response.body, json!({"id": "<0>", "name": "john"}));
}

#[test]
fn test_bound_violation_returns_400() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    let response = get(&dispatcher, "/test/9/");
    assert_error(&response, StatusCode::BAD_REQUEST, "idValueMaxExceeded");
}

#[test]
fn test_unknown_route_returns_404() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    assert_error(&get(&dispatcher, "/nope"), StatusCode::NOT_FOUND, "routeNotFound");
    assert_error(&get(&dispatcher, "/test/3"), StatusCode::NOT_FOUND, "routeNotFound");
    let head = dispatcher.dispatch(DispatchRequest::new("HEAD", "/test/3/"));
    assert_error(&head, StatusCode::NOT_FOUND, "routeNotFound");
}

#[test]
fn test_post_uses_body_and_default_status() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    let request = DispatchRequest::new("POST", "/test?name=ignored")
        .with_headers(CgiHeaders::from_pairs([("CONTENT_TYPE", "application/json")]))
        .with_body(r#"{"name": "Ann", "email": "ann@example.com"}"#);
    let response = dispatcher.dispatch(request);
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.body,
        json!({"name": "Ann", "email": "ann@example.com", "tags": null})
    );
}

#[test]
fn test_declared_status_is_used() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    let response = dispatcher.dispatch(DispatchRequest::new("DELETE", "/test/1"));
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body, Value::Null);
}

#[test]
fn test_authorized_route_requires_bearer_token() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    assert_error(&get(&dispatcher, "/me"), StatusCode::UNAUTHORIZED, "tokenRequired");

    let malformed = DispatchRequest::new("GET", "/me")
        .with_headers(CgiHeaders::from_pairs([("HTTP_AUTHORIZATION", "Basic abc")]));
    assert_error(
        &dispatcher.dispatch(malformed),
        StatusCode::UNAUTHORIZED,
        "tokenFormatInvalid",
    );

    let ok = DispatchRequest::new("GET", "/me")
        .with_headers(CgiHeaders::from_pairs([("HTTP_AUTHORIZATION", "Bearer abc.def")]));
    let response = dispatcher.dispatch(ok);
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"token": "abc.def"}));
}

#[test]
fn test_hook_is_skipped_for_public_routes() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    assert_eq!(get(&dispatcher, "/test/latest").status, StatusCode::OK);
}

#[test]
fn test_token_verifier_rejection_is_propagated() {
    let mut dispatcher = common::test_dispatcher(ServerConfig::default());
    dispatcher.set_pre_route_hook(BearerAuthorization::with_verifier(|token, _| {
        if token == "good" {
            Ok(())
        } else {
            Err(ApiError::forbidden("tokenRejected", "Token is not valid"))
        }
    }));
    let bad = DispatchRequest::new("GET", "/me")
        .with_headers(CgiHeaders::from_pairs([("HTTP_AUTHORIZATION", "Bearer bad")]));
    assert_error(&dispatcher.dispatch(bad), StatusCode::FORBIDDEN, "tokenRejected");
}

#[test]
fn test_https_requirement() {
    let config = ServerConfig {
        require_https: true,
        ..ServerConfig::default()
    };
    let dispatcher = common::test_dispatcher(config);
    assert_error(&get(&dispatcher, "/test/latest"), StatusCode::FORBIDDEN, "httpsRequired");

    let secure = DispatchRequest::new("GET", "/test/latest").secure(true);
    assert_eq!(dispatcher.dispatch(secure).status, StatusCode::OK);
}

#[test]
fn test_path_prefix_is_stripped() {
    let config = ServerConfig {
        path_prefix: "/api".to_string(),
        ..ServerConfig::default()
    };
    let dispatcher = common::test_dispatcher(config);
    assert_eq!(get(&dispatcher, "/api/test/latest").status, StatusCode::OK);
    assert_eq!(get(&dispatcher, "/apitest/latest").status, StatusCode::NOT_FOUND);
}

#[test]
fn test_request_time_is_added_to_object_bodies() {
    let config = ServerConfig {
        add_request_time: true,
        ..ServerConfig::default()
    };
    let dispatcher = common::test_dispatcher(config);
    let response = get(&dispatcher, "/test/latest");
    assert!(response.body["time"].as_f64().unwrap() >= 0.0);

    let error = get(&dispatcher, "/nope");
    assert!(error.body.get("time").is_none());
}

#[test]
fn test_handler_error_keeps_status_and_code() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    assert_error(&get(&dispatcher, "/forbidden"), StatusCode::FORBIDDEN, "accessDenied");
}

#[test]
fn test_panic_handler_returns_500() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    let response = get(&dispatcher, "/boom");
    assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "HandlerPanic");
    assert!(response.body["errorDescription"]
        .as_str()
        .unwrap()
        .contains("kaboom"));

    // the dispatcher keeps serving after a panic
    assert_eq!(get(&dispatcher, "/test/latest").status, StatusCode::OK);
}

#[test]
fn test_request_id_is_propagated() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    let id = RequestId::new();
    let request = DispatchRequest::new("GET", "/test/latest").with_headers(
        CgiHeaders::from_pairs([("HTTP_X_REQUEST_ID", id.to_string().as_str())]),
    );
    assert_eq!(dispatcher.dispatch(request).request_id, id);
}

#[test]
fn test_verify_reports_missing_handlers() {
    let mut dispatcher = Dispatcher::new(common::test_index(), ServerConfig::default());
    dispatcher.register_handler("get_test", |_| Ok(Value::Null));
    let missing = dispatcher.missing_handlers();
    assert_eq!(missing.len(), common::test_routes().len() - 1);
    assert!(matches!(
        dispatcher.verify(),
        Err(ConfigurationError::UnknownHandler { .. })
    ));

    let response = get(&dispatcher, "/test/latest");
    assert_error(&response, StatusCode::INTERNAL_SERVER_ERROR, "UnknownHandler");

    assert!(common::test_dispatcher(ServerConfig::default()).verify().is_ok());
}

#[test]
fn test_index_swap_takes_effect() {
    let dispatcher = common::test_dispatcher(ServerConfig::default());
    assert_eq!(get(&dispatcher, "/test/latest").status, StatusCode::OK);

    let routes = vec![RouteDefinition::get("/latest", "latest_test")];
    dispatcher.swap_index(RouteIndex::build(routes).unwrap());
    assert_eq!(get(&dispatcher, "/test/latest").status, StatusCode::NOT_FOUND);
    assert_eq!(get(&dispatcher, "/latest").status, StatusCode::OK);
}

#[test]
fn test_dispatcher_is_shareable_across_threads() {
    let dispatcher = std::sync::Arc::new(common::test_dispatcher(ServerConfig::default()));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let dispatcher = std::sync::Arc::clone(&dispatcher);
            std::thread::spawn(move || get(&dispatcher, &format!("/test/{i}/")).body)
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap()["id"], format!("<{i}>"));
    }
}
