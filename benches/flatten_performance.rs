//! Benchmarks for the flattening walk across representative input shapes.
//!
//! Covers the hot shapes seen in practice: small flat errors, deeply nested
//! custom properties, wide property maps, cyclic graphs, and the
//! deserialization round trip.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use portable_errors::{
    deserialize_error_json, serialize_error, DeserializeOptions, ObjectNode, SerializeOptions,
    Thrown,
};

fn flat_error() -> Thrown {
    let error = Thrown::error("TypeError", "expected a string, got a number");
    let node = error.as_object().unwrap();
    node.insert("status", Thrown::from(422));
    node.insert("code", Thrown::from("E_TYPE"));
    error
}

fn deep_error(depth: usize) -> Thrown {
    let mut current = Thrown::object();
    for _ in 0..depth {
        let parent = ObjectNode::plain();
        parent.insert("next", current);
        current = Thrown::Object(parent);
    }
    let error = Thrown::error("Error", "deep");
    error.as_object().unwrap().insert("chain", current);
    error
}

fn wide_error(width: usize) -> Thrown {
    let error = Thrown::error("Error", "wide");
    let node = error.as_object().unwrap();
    for i in 0..width {
        node.insert(format!("field_{i}"), Thrown::from(i as i64));
    }
    error
}

fn cyclic_error() -> Thrown {
    let error = Thrown::error("Error", "cyclic");
    let node = error.as_object().unwrap();
    let ring = ObjectNode::plain();
    ring.insert("back", Thrown::Object(ring.clone()));
    node.insert("ring", Thrown::Object(ring));
    error
}

fn cause_chain(len: usize) -> Thrown {
    let mut error = Thrown::error("Error", "root cause");
    for i in 0..len {
        let wrapper = Thrown::error("Error", &format!("wrapper {i}"));
        wrapper.as_object().unwrap().insert_hidden("cause", error);
        error = wrapper;
    }
    error
}

fn bench_serialize_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    group.bench_function("flat_error", |b| {
        let error = flat_error();
        b.iter(|| serialize_error(black_box(&error), SerializeOptions::default()));
    });

    for depth in [8usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("deep", depth), &depth, |b, &depth| {
            let error = deep_error(depth);
            b.iter(|| serialize_error(black_box(&error), SerializeOptions::default()));
        });
    }

    for width in [16usize, 128, 512] {
        group.bench_with_input(BenchmarkId::new("wide", width), &width, |b, &width| {
            let error = wide_error(width);
            b.iter(|| serialize_error(black_box(&error), SerializeOptions::default()));
        });
    }

    group.bench_function("cyclic", |b| {
        let error = cyclic_error();
        b.iter(|| serialize_error(black_box(&error), SerializeOptions::default()));
    });

    group.bench_function("cause_chain_32", |b| {
        let error = cause_chain(32);
        b.iter(|| serialize_error(black_box(&error), SerializeOptions::default()));
    });

    group.finish();
}

fn bench_depth_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth_limit");
    let error = deep_error(256);

    for max_depth in [4usize, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(max_depth),
            &max_depth,
            |b, &max_depth| {
                let options = SerializeOptions::default().with_max_depth(max_depth);
                b.iter(|| serialize_error(black_box(&error), options));
            },
        );
    }

    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");

    group.bench_function("flat_error", |b| {
        let payload = serialize_error(&flat_error(), SerializeOptions::default());
        b.iter(|| {
            deserialize_error_json(black_box(payload.clone()), DeserializeOptions::default())
        });
    });

    group.bench_function("cause_chain_8", |b| {
        let payload = serialize_error(&cause_chain(8), SerializeOptions::default());
        b.iter(|| {
            deserialize_error_json(black_box(payload.clone()), DeserializeOptions::default())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_serialize_shapes,
    bench_depth_limits,
    bench_round_trip
);
criterion_main!(benches);
