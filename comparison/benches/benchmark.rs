use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::{Rng, RngCore, SeedableRng};
use siphash24::{Engine, SipHash24, KEY_LENGTH};
use siphasher::sip::SipHasher24 as Reference;
use std::{hash::Hasher, hint::black_box, iter};

fn oneshot(c: &mut Criterion) {
    let (key, data) = gen_data();
    let engine = Engine::from_key(&key);
    let mut g = c.benchmark_group("oneshot");

    for size in half_sizes(&data).take(10) {
        let data = &data[..size];
        g.throughput(Throughput::Bytes(data.len() as _));

        let id = format!("siphasher/{size}");
        g.bench_function(id, |b| {
            b.iter(|| {
                let mut hasher = Reference::new_with_key(&key);
                hasher.write(data);
                black_box(hasher.finish());
            })
        });

        let id = format!("engine/{size}");
        g.bench_function(id, |b| {
            b.iter(|| {
                let hash = engine.compute(data);
                black_box(hash);
            })
        });
    }

    g.finish();
}

fn streaming_one_chunk(c: &mut Criterion) {
    let (key, data) = gen_data();
    let mut g = c.benchmark_group("streaming_one_chunk");

    for size in half_sizes(&data).take(10) {
        let data = &data[..size];
        g.throughput(Throughput::Bytes(data.len() as _));

        let id = format!("siphasher/{size}");
        g.bench_function(id, |b| {
            b.iter(|| {
                let mut hasher = Reference::new_with_key(&key);
                hasher.write(data);
                black_box(hasher.finish());
            })
        });

        let id = format!("streaming/{size}");
        g.bench_function(id, |b| {
            b.iter(|| {
                let mut hasher = SipHash24::with_key(&key);
                hasher.write(data);
                black_box(hasher.finish());
            })
        });
    }

    g.finish();
}

fn tiny_inputs(c: &mut Criterion) {
    let (key, data) = gen_data();
    let engine = Engine::from_key(&key);
    let mut g = c.benchmark_group("tiny_inputs");

    // Every way the final block can be filled, plus one full block.
    for size in 0..=16 {
        let data = &data[..size];
        g.throughput(Throughput::Bytes(data.len() as _));

        let id = format!("engine/{size}");
        g.bench_function(id, |b| b.iter(|| black_box(engine.compute(black_box(data)))));
    }

    g.finish();
}

const SEED: u64 = 0x5195_4a57_2c3d_e461;
const DATA_SIZE: usize = 16 * 1024 * 1024;

fn gen_data() -> ([u8; KEY_LENGTH], Vec<u8>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(SEED);

    let key = rng.random();

    let mut data = vec![0; DATA_SIZE];
    rng.fill_bytes(&mut data);

    (key, data)
}

fn half_sizes(data: &[u8]) -> impl Iterator<Item = usize> {
    iter::successors(
        Some(data.len()),
        |&v| {
            if v == 1 {
                None
            } else {
                Some(v / 2)
            }
        },
    )
}

criterion_group!(benches, oneshot, streaming_one_chunk, tiny_inputs);
criterion_main!(benches);
