use std::time::Instant;

use chromino_core::*;

const LEVELS_PER_TIER: u64 = 16;

fn main() {
    let generator = PuzzleGenerator::<BuiltinCampaign>::default();

    println!("difficulty  levels  fallback  solved  unproven  avg_ms  max_ms");
    for difficulty in Difficulty::MIN..=Difficulty::MAX {
        let difficulty = Difficulty::new(difficulty);
        let mut fallback = 0;
        let mut solved = 0;
        let mut unproven = 0;
        let mut total_ms = 0.0;
        let mut max_ms: f64 = 0.0;

        for seed in 0..LEVELS_PER_TIER {
            let level = generator.generate(difficulty, Some(LevelSeed::Free(seed)));
            if level == fallback_level() {
                fallback += 1;
            }

            let started = Instant::now();
            let verdict = is_solvable(&level.target, &level.pieces, SolverLimits::default());
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            total_ms += elapsed_ms;
            max_ms = max_ms.max(elapsed_ms);

            match verdict {
                Verdict::Solvable(_) => solved += 1,
                Verdict::Unproven(_) => unproven += 1,
                Verdict::Unsolvable => {
                    println!("level {seed} at {} is unsolvable", difficulty.get())
                }
            }
        }

        println!(
            "{:>10}  {:>6}  {:>8}  {:>6}  {:>8}  {:>6.1}  {:>6.1}",
            difficulty.get(),
            LEVELS_PER_TIER,
            fallback,
            solved,
            unproven,
            total_ms / LEVELS_PER_TIER as f64,
            max_ms
        );
    }
}
