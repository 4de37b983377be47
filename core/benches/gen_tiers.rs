use std::hint::black_box;

use chromino_core::*;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn gen_tiers(c: &mut Criterion) {
    let generator = PuzzleGenerator::<BuiltinCampaign>::default();
    let mut group = c.benchmark_group("gen_tiers");
    group.sample_size(20);
    for difficulty in Difficulty::MIN..=Difficulty::MAX {
        group.bench_with_input(
            BenchmarkId::from_parameter(difficulty),
            &difficulty,
            |b, &difficulty| {
                let mut seed = 0u64;
                b.iter(|| {
                    seed += 1;
                    let seed = Some(LevelSeed::Free(seed));
                    black_box(generator.generate(Difficulty::new(difficulty), seed))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, gen_tiers);
criterion_main!(benches);
