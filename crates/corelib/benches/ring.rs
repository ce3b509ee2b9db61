use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use corelib::ring::RingBuilder;
use corelib::HashAlgorithm;

fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("locate");
    for algorithm in [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Murmur3,
        HashAlgorithm::Xxh3,
    ] {
        let mut builder = RingBuilder::new().with_hash_algorithm(algorithm);
        for i in 0..16 {
            builder = builder.add_node(format!("node{i}"));
        }
        let ring = builder.build().unwrap();
        let keys: Vec<String> = (0..1024).map(|i| format!("key-{i}")).collect();

        group.bench_with_input(BenchmarkId::from_parameter(algorithm), &keys, |b, keys| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % keys.len();
                black_box(ring.locate(keys[i].as_bytes()).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_replicas(c: &mut Criterion) {
    let mut builder = RingBuilder::new();
    for i in 0..16 {
        builder = builder.add_node(format!("node{i}"));
    }
    let ring = builder.build().unwrap();
    c.bench_function("locate_replicas/3", |b| {
        b.iter(|| black_box(ring.locate_replicas(black_box(b"some-key"), 3).unwrap()))
    });
}

fn bench_add_remove(c: &mut Criterion) {
    let mut builder = RingBuilder::new();
    for i in 0..16 {
        builder = builder.add_node(format!("node{i}"));
    }
    let ring = builder.build().unwrap();
    c.bench_function("add_remove_node/150", |b| {
        b.iter(|| {
            ring.add_node("transient", 1).unwrap();
            ring.remove_node("transient").unwrap();
        })
    });
}

criterion_group!(benches, bench_locate, bench_replicas, bench_add_remove);
criterion_main!(benches);
