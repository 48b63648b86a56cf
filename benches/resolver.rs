//! Benchmarks comparing cached resolution vs development-mode scanning.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use soli_dispatch::config::{Environment, ResolverConfig};
use soli_dispatch::controller::{ControllerDescriptor, ControllerRegistry};
use soli_dispatch::resolver::ControllerResolver;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Registry of `count` controllers, each with a few actions.
fn registry(count: usize) -> ControllerRegistry {
    let mut registry = ControllerRegistry::new();
    for i in 0..count {
        registry.register(
            ControllerDescriptor::new(&format!("Resource{}Controller", i))
                .with_actions(["index", "show", "edit"]),
        );
    }
    registry
}

fn resolver(count: usize, environment: Environment) -> ControllerResolver {
    let config = ResolverConfig {
        environment,
        cache_max_size: NonZeroUsize::new(10_000).unwrap(),
    };
    ControllerResolver::new(Arc::new(registry(count)), None, config)
}

fn cached_vs_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_cached_vs_scan");

    for count in [10, 100, 1000].iter() {
        // Lowest priority controller: the scan walks the whole registry
        let uri = "/resource0/show/42";

        let cached = resolver(*count, Environment::Production);
        group.bench_with_input(BenchmarkId::new("cached", count), uri, |b, uri| {
            b.iter(|| cached.resolve_uri(black_box(uri)))
        });

        let scanning = resolver(*count, Environment::Development);
        group.bench_with_input(BenchmarkId::new("scan", count), uri, |b, uri| {
            b.iter(|| scanning.resolve_uri(black_box(uri)))
        });
    }

    group.finish();
}

fn memoized_miss(c: &mut Criterion) {
    let resolver = resolver(1000, Environment::Production);
    c.bench_function("resolve_memoized_miss", |b| {
        b.iter(|| resolver.resolve_uri(black_box("/missing/page")))
    });
}

fn qualified_lookup(c: &mut Criterion) {
    let resolver = resolver(100, Environment::Production);
    c.bench_function("resolve_namespaced_miss", |b| {
        b.iter(|| resolver.resolve_qualified(black_box("/resource50"), None, Some("admin")))
    });
}

criterion_group!(benches, cached_vs_scan, memoized_miss, qualified_lookup);
criterion_main!(benches);
