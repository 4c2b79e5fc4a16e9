use attrouter::config::ServerConfig;
use attrouter::dispatcher::{DispatchRequest, Dispatcher};
use attrouter::router::{RequestMatcher, RouteIndex};
use attrouter::routes::{parse_routes, ParameterSpec, RouteDefinition, RouteFormat};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::hint::black_box;

fn example_routes() -> &'static str {
    r#"
- method: GET
  path: /
  handler: root_handler
- method: GET
  path: /zoo/animals
  handler: get_animals
- method: POST
  path: /zoo/animals
  handler: create_animal
- method: GET
  path: /zoo/animals/{id}
  handler: get_animal
- method: PUT
  path: /zoo/animals/{id}
  handler: update_animal
- method: PATCH
  path: /zoo/animals/{id}
  handler: patch_animal
- method: DELETE
  path: /zoo/animals/{id}
  handler: delete_animal
- method: GET
  path: /zoo/animals/{id}/toys/{toy_id}
  handler: animal_toy
- method: GET
  path: /zoo/{category}/animals/{id}/habitats/{habitat_id}/sections/{section_id}
  handler: habitat_section
- method: POST
  path: /inventory/{warehouse_id}/feeds/{feed_id}/items/{item_id}/batches/{batch_id}
  handler: post_item_batch
- method: GET
  path: /complex/{a}/{b}/{c}/{d}/{e}/{f}/{g}/{h}/{i}
  handler: complex_many_params
- method: GET
  path: /zoo/health
  handler: health_check
- method: OPTIONS
  path: /zoo/health
  handler: supported_ops
"#
}

fn bench_route_throughput(c: &mut Criterion) {
    let routes = parse_routes(example_routes(), RouteFormat::Yaml).expect("valid route file");
    let index = RouteIndex::build(routes).expect("valid routes");
    let matcher = RequestMatcher::new(&index);
    c.bench_function("route_match", |b| {
        let test_paths = [
            ("GET", "/zoo/animals/123"),
            ("GET", "/zoo/animals/123/toys/456"),
            ("GET", "/zoo/cats/animals/123/habitats/88/sections/5"),
            ("POST", "/inventory/1/feeds/2/items/3/batches/4"),
            ("GET", "/complex/1/2/3/4/5/6/7/8/9"),
            ("GET", "/zoo/health"),
        ];
        b.iter(|| {
            for (method, path) in test_paths.iter() {
                let res = matcher.match_request(method, path);
                black_box(&res);
            }
        })
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let index = RouteIndex::build(vec![RouteDefinition::get("/test/{id}/", "get_test")
        .param(ParameterSpec::path("id").int().min(0.0).max(4.0))
        .param(
            ParameterSpec::query("name")
                .pattern(r"/^[\w]+$/")
                .default_value("john"),
        )])
    .expect("valid routes");
    let mut dispatcher = Dispatcher::new(index, ServerConfig::default());
    dispatcher.register_handler("get_test", |call| {
        Ok(json!({"id": call.arg("id"), "name": call.arg("name")}))
    });

    c.bench_function("dispatch_bind_validate", |b| {
        b.iter(|| {
            let response = dispatcher.dispatch(DispatchRequest::new("GET", "/test/3/?name=Ann"));
            black_box(response);
        })
    });
}

criterion_group!(benches, bench_route_throughput, bench_dispatch);
criterion_main!(benches);
