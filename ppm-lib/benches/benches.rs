use rand::{rngs::StdRng, Rng, SeedableRng};

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use ppm::framing::{Packet, SyncConfig, Synchronizer};
use ppm::modulation::{demodulate, encode_symbols, Params};
use ppm::Bit;

fn random_bits(len: usize) -> Vec<Bit> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..len).map(|_| rng.gen_range(0..=1)).collect()
}

fn bench_synchronization(c: &mut Criterion) {
    let config = SyncConfig::builder()
        .params(Params::new(16, 2).unwrap())
        .threshold(3)
        .build();
    let packet = Packet::from_bytes(0, 1, 2, &[0x55; 128]).unwrap();
    let mut bits = random_bits(8192);
    bits.extend(packet.frame(&config).unwrap());

    let mut group = c.benchmark_group("synchronize");
    group.throughput(Throughput::Elements(bits.len() as u64));
    group.bench_function("step", |b| {
        b.iter(|| {
            let mut sync = Synchronizer::new(config.clone()).unwrap();
            std::hint::black_box(sync.push(&bits));
        });
    });
    group.finish();
}

fn bench_demodulate(c: &mut Criterion) {
    let params = Params::new(16, 2).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let values: Vec<u32> = (0..1024).map(|_| rng.gen_range(0..16)).collect();
    let bits = encode_symbols(&values, &params).unwrap();

    let mut group = c.benchmark_group("demodulate");
    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("symbols", |b| {
        b.iter(|| {
            let zult = demodulate(&bits, &params, 3).unwrap();
            assert_eq!(zult.values.len(), values.len());
        });
    });
    group.finish();
}

criterion_group!(benches, bench_demodulate, bench_synchronization);
criterion_main!(benches);
