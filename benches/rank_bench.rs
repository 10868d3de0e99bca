use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keyrank::dimensions::Dimensions;
use keyrank::rank::{rank, rank_low_mem};
use keyrank::weights::WeightTable;
use num_bigint::BigUint;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");

    // a 64-bit key attacked byte-wise, weights from a 8-bit-precision map
    let dims = Dimensions::uniform(8, 8).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let weights: Vec<u64> = (0..8 * 256).map(|_| rng.gen_range(1..256)).collect();
    let table = WeightTable::with_weights(dims, weights).unwrap();
    let target = table.maximum_weight() / 2;

    group.bench_function("standard", |b| {
        b.iter(|| black_box(rank::<BigUint, _, _>(target, &table).unwrap()))
    });

    group.bench_function("low_mem", |b| {
        b.iter(|| black_box(rank_low_mem::<BigUint, _, _>(target, &table).unwrap()))
    });

    group.bench_function("standard_u64", |b| {
        b.iter(|| black_box(rank::<u64, _, _>(target, &table).unwrap()))
    });
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
