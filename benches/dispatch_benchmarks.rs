//! Dispatch path benchmarks for gridfn
//!
//! Run with: cargo bench --bench dispatch_benchmarks
//!
//! Measures a full resolve, invoke and adapt cycle against the in-process
//! grid, so the numbers reflect template overhead rather than a network.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use gridfn::execution::adapter::adapt;
use gridfn::execution::{
    FunctionId, FunctionTemplate, MemberTargets, PrimitiveKind, ResultShape, ServerTargets,
};
use gridfn::grid::local::{LocalCluster, LocalSession};
use gridfn::grid::{FnFunction, Value};
use serde_json::json;
use std::sync::Arc;

fn session(members: usize) -> Arc<LocalSession> {
    let names: Vec<String> = (1..=members).map(|i| format!("server{}", i)).collect();
    let cluster = LocalCluster::with_members(names);
    cluster
        .register_function(Arc::new(FnFunction::new("echo", |args| {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        })))
        .unwrap();
    cluster
        .register_function(Arc::new(FnFunction::new("returnFive", |_| Ok(json!(5)))))
        .unwrap();
    Arc::new(LocalSession::new("bench", cluster))
}

/// Benchmark one call through each server resolution step
fn bench_server_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("server_resolution");
    let session = session(3);
    let pool = session.create_pool("serverPool", session.cluster().member_ids());

    let explicit = FunctionTemplate::new(ServerTargets::with_pool(pool));
    group.bench_function("explicit_pool", |b| {
        b.iter(|| explicit.execute(black_box("returnFive"), vec![], ResultShape::Single).unwrap())
    });

    let mut named_targets = ServerTargets::with_session(session.clone());
    named_targets.set_pool_name("serverPool");
    let named = FunctionTemplate::new(named_targets);
    group.bench_function("named_pool", |b| {
        b.iter(|| named.execute(black_box("returnFive"), vec![], ResultShape::Single).unwrap())
    });

    let fallback = FunctionTemplate::new(ServerTargets::with_session(session));
    group.bench_function("session_fallback", |b| {
        b.iter(|| fallback.execute(black_box("returnFive"), vec![], ResultShape::Single).unwrap())
    });

    group.finish();
}

/// Benchmark fan-out width on member targets
fn bench_member_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("member_fan_out");

    for members in [1usize, 4, 16] {
        let template = FunctionTemplate::new(MemberTargets::all(session(members)));
        group.throughput(Throughput::Elements(members as u64));
        group.bench_with_input(BenchmarkId::from_parameter(members), &members, |b, _| {
            b.iter(|| {
                template
                    .execute("echo", vec![black_box(json!("payload"))], ResultShape::List)
                    .unwrap()
            })
        });
    }

    group.finish();
}

/// Benchmark the adapter alone
fn bench_adaptation(c: &mut Criterion) {
    let mut group = c.benchmark_group("adaptation");
    let id = FunctionId::new("bench").unwrap();

    for size in [1usize, 100, 10_000] {
        let raw: Vec<Value> = (0..size).map(|i| json!(i)).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("list", size), &raw, |b, raw| {
            b.iter(|| adapt(&id, Ok(raw.clone()), ResultShape::List).unwrap())
        });
    }

    group.bench_function("primitive_long", |b| {
        b.iter(|| {
            adapt(
                &id,
                Ok(vec![black_box(json!("42"))]),
                ResultShape::Primitive(PrimitiveKind::Long),
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_server_resolution,
    bench_member_fan_out,
    bench_adaptation
);
criterion_main!(benches);
