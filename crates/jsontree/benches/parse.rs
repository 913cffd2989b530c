use codspeed_criterion_compat::{criterion_group, criterion_main, BenchmarkId, Criterion};
use jsontree::{minify_vec, Arena, ParseOptions};

/// A document with `size` records mixing every kind of value.
fn document(size: usize) -> String {
    let records: Vec<String> = (0..size)
        .map(|i| {
            format!(
                r#"{{"id": {i}, "name": "item \"{i}\"", "price": {i}.25, "tags": ["a", "b", "é"], "active": {}, "parent": null}}"#,
                i % 2 == 0
            )
        })
        .collect();
    format!("[\n  {}\n]", records.join(",\n  "))
}

fn bench_parse(c: &mut Criterion, name: &str, input: &str) {
    c.bench_with_input(BenchmarkId::new("parse", name), input, |b, input| {
        b.iter_with_large_drop(|| {
            let mut arena = Arena::new();
            let root = arena.parse(input).expect("Valid JSON");
            (arena, root)
        });
    });
}

fn bench_parse_with_comments(c: &mut Criterion, name: &str, input: &str) {
    let commented = input.replace(",\n", ", // next record\n");
    let options = ParseOptions::new().allow_comments(true);
    c.bench_with_input(
        BenchmarkId::new("parse_with_comments", name),
        &commented,
        |b, input| {
            b.iter_with_large_drop(|| {
                let mut arena = Arena::new();
                let root = arena
                    .parse_with_opts(input.as_bytes(), &options)
                    .expect("Valid JSON");
                (arena, root)
            });
        },
    );
}

fn bench_minify(c: &mut Criterion, name: &str, input: &str) {
    c.bench_with_input(BenchmarkId::new("minify", name), input, |b, input| {
        b.iter_with_large_drop(|| {
            let mut buffer = input.as_bytes().to_vec();
            minify_vec(&mut buffer);
            buffer
        });
    });
}

fn run_benchmarks(c: &mut Criterion) {
    for (name, size) in [("small", 10), ("medium", 1_000), ("large", 10_000)] {
        let input = document(size);
        bench_parse(c, name, &input);
        bench_parse_with_comments(c, name, &input);
        bench_minify(c, name, &input);
    }
}

criterion_group!(benches, run_benchmarks);
criterion_main!(benches);
