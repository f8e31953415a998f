//! Dispatch throughput benchmark.
//!
//! Measures the full request path (routing, parameter binding, invocation
//! and encoding) for query-string and JSON-body requests using Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use remote_dispatch::descriptor::{MethodSpec, ParamSpec, ServiceSpec};
use remote_dispatch::outcome::Fault;
use remote_dispatch::params::Arguments;
use remote_dispatch::reply::Reply;
use remote_dispatch::{Dispatcher, Registry, Request};
use serde_json::json;
use std::sync::Arc;

async fn echo(args: Arguments) -> Result<Reply, Fault> {
    let name = args.text("name")?.unwrap_or_default().to_string();
    let limit = args.int("limit")?.unwrap_or_default();
    Ok(Reply::object(json!({ "name": name, "limit": limit })))
}

fn dispatcher() -> Dispatcher {
    let mut registry = Registry::new();
    registry
        .register_spec(
            "bench",
            ServiceSpec::new().method(
                MethodSpec::derived(echo)
                    .param(ParamSpec::text("name").required().max_length(64))
                    .param(ParamSpec::int("limit").default_value("10")),
            ),
        )
        .unwrap();
    Dispatcher::builder(Arc::new(registry)).build()
}

fn bench_query_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dispatcher = dispatcher();

    c.bench_function("dispatch_query", |b| {
        b.iter(|| {
            rt.block_on(async {
                let request = Request::get("/bench/echo").param("name", "ali");
                dispatcher.dispatch(black_box(request)).await
            })
        });
    });
}

fn bench_json_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dispatcher = dispatcher();
    let name_sizes: &[usize] = &[1, 16, 64];

    let mut group = c.benchmark_group("dispatch_json");
    for &size in name_sizes {
        let body = json!({ "name": "a".repeat(size), "limit": 5 });
        group.bench_with_input(BenchmarkId::from_parameter(size), &body, |b, body| {
            b.iter(|| {
                rt.block_on(async {
                    let request = Request::post("/bench/echo").json(black_box(body));
                    dispatcher.dispatch(request).await
                })
            });
        });
    }
    group.finish();
}

fn bench_unknown_route(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dispatcher = dispatcher();

    c.bench_function("dispatch_unknown_method", |b| {
        b.iter(|| {
            rt.block_on(async {
                dispatcher
                    .dispatch(black_box(Request::get("/bench/missing")))
                    .await
            })
        });
    });
}

criterion_group!(benches, bench_query_dispatch, bench_json_dispatch, bench_unknown_route);
criterion_main!(benches);
