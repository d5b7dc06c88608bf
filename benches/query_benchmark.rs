//! Benchmarks for filter-rule classification.
//!
//! Run with: cargo bench
//!
//! Measures list parsing, linear rule evaluation at several list sizes, the
//! verdict cache, and refresh cost.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shieldrule::{Classifier, ClassifierConfig, MatchConfig, RuleSet};

/// Generate list text with domain anchors, wildcards and a few exceptions.
fn generate_list(domain_count: usize, wildcard_count: usize) -> String {
    let mut list = String::from("[Adblock Plus 2.0]\n! Title: bench\n");

    for i in 0..domain_count {
        list.push_str(&format!("||ads{}.example.com^\n", i));
    }
    for i in 0..wildcard_count {
        list.push_str(&format!("/banner{}/*/img?\n", i));
    }
    for i in (0..domain_count).step_by(100) {
        list.push_str(&format!("@@||ok.ads{}.example.com^\n", i));
    }

    list
}

/// Generate queries, `hit_ratio` of which are blocked.
fn generate_queries(count: usize, hit_ratio: f64) -> Vec<String> {
    let hits = (count as f64 * hit_ratio) as usize;

    (0..count)
        .map(|i| {
            if i < hits {
                format!("tracker.ads{}.example.com", i % 1000)
            } else {
                format!("unknown{}.nonexistent.org", i)
            }
        })
        .collect()
}

fn build(list: &str) -> RuleSet {
    RuleSet::build(list.lines(), MatchConfig::default()).0
}

/// Benchmark list parsing.
fn bench_build(c: &mut Criterion) {
    let list = generate_list(10_000, 500);

    let mut group = c.benchmark_group("build");
    group.throughput(Throughput::Elements(list.lines().count() as u64));
    group.bench_function("10k_rules", |b| b.iter(|| black_box(build(&list))));
    group.finish();
}

/// Benchmark evaluation without the verdict cache.
fn bench_evaluate_no_cache(c: &mut Criterion) {
    let classifier =
        Classifier::with_ruleset(build(&generate_list(5_000, 200)), ClassifierConfig::no_cache());
    let queries = generate_queries(200, 0.8);

    let mut group = c.benchmark_group("evaluate_no_cache");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("mixed_queries", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(classifier.evaluate(query));
            }
        })
    });

    group.finish();
}

/// Benchmark evaluation served from the verdict cache.
fn bench_evaluate_with_cache(c: &mut Criterion) {
    let classifier = Classifier::with_ruleset(
        build(&generate_list(5_000, 200)),
        ClassifierConfig::with_capacity(10_000),
    );
    let queries = generate_queries(200, 0.8);

    // Warm up cache
    for query in &queries {
        let _ = classifier.evaluate(query);
    }

    let mut group = c.benchmark_group("evaluate_with_cache");
    group.throughput(Throughput::Elements(queries.len() as u64));

    group.bench_function("cache_hit", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(classifier.evaluate(query));
            }
        })
    });

    group.bench_function("single_query_miss", |b| {
        b.iter_batched(
            || {
                classifier.clear_cache();
                "tracker.ads500.example.com"
            },
            |query| black_box(classifier.evaluate(query)),
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

/// Benchmark evaluation cost against list size.
fn bench_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("scalability");

    for size in [100, 1_000, 10_000].iter() {
        let ruleset = build(&generate_list(*size, size / 20));
        let queries: Vec<_> = (0..100)
            .map(|i| format!("x.ads{}.example.com", i % size))
            .collect();

        group.throughput(Throughput::Elements(queries.len() as u64));
        group.bench_with_input(BenchmarkId::new("rules", size), size, |b, _| {
            b.iter(|| {
                for query in &queries {
                    black_box(ruleset.is_blocked(query));
                }
            })
        });
    }

    group.finish();
}

/// Benchmark wildcard evaluation (regex path).
fn bench_wildcards(c: &mut Criterion) {
    let ruleset = build(&generate_list(0, 1_000));

    let mut group = c.benchmark_group("wildcards");
    group.bench_function("hit", |b| {
        b.iter(|| black_box(ruleset.is_blocked("cdn.net/banner999/x/imgA")))
    });
    group.bench_function("miss", |b| {
        b.iter(|| black_box(ruleset.is_blocked("cdn.net/static/app.js")))
    });
    group.finish();
}

/// Benchmark a full refresh (parse and swap).
fn bench_refresh(c: &mut Criterion) {
    let list = generate_list(10_000, 500);
    let classifier = Classifier::default();

    let mut group = c.benchmark_group("refresh");
    group.bench_function("refresh_10k_rules", |b| {
        b.iter(|| black_box(classifier.refresh(&list)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_evaluate_no_cache,
    bench_evaluate_with_cache,
    bench_scalability,
    bench_wildcards,
    bench_refresh,
);

criterion_main!(benches);
