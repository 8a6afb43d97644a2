//! Search and self-play throughput
//!
//! Measures:
//! 1. Simulations per second at various simulation counts and branching caps
//! 2. Self-play ticks per second
//! 3. Heuristic one-ply move rate, as a baseline

use std::time::Instant;

use generals_core::{Game, HeuristicEvaluator, PlayerId, PlayerView, UniformEvaluator};
use generals_mcts::selfplay::play_game;
use generals_mcts::{run_mcts, MctsConfig, SelfPlayConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// BENCHMARK STRUCTURES
// ============================================================================

#[derive(Clone, Debug)]
struct BenchmarkResult {
    name: String,
    config: String,
    avg_ms: f64,
    rate: f64,
    unit: &'static str,
}

impl BenchmarkResult {
    fn to_table_row(&self) -> String {
        format!(
            "| {} | {} | {:.2}ms | {:.0} {} |",
            self.name, self.config, self.avg_ms, self.rate, self.unit
        )
    }
}

fn test_position(size: usize, players: usize, seed: u64) -> Game {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut game = match Game::new(size, size, players, &mut rng) {
        Ok(game) => game,
        Err(err) => panic!("failed to build benchmark map: {err}"),
    };
    // Let generals build up some army first
    for _ in 0..20 {
        game.next_tick();
    }
    game
}

// ============================================================================
// BENCHMARK: Search
// ============================================================================

fn benchmark_search(game: &Game, label: &str) -> Vec<BenchmarkResult> {
    println!("\n=== SEARCH BENCHMARK: {} ===", label);
    let mut results = Vec::new();
    let evaluator = HeuristicEvaluator::default();

    for top_k in [2, 5] {
        for sims in [50u32, 200, 800] {
            print!("  top_k {} / {} sims ... ", top_k, sims);
            let config = MctsConfig {
                simulations: sims,
                top_k,
                ..MctsConfig::default()
            };
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let iterations = 3;
            let start = Instant::now();
            for _ in 0..iterations {
                if let Err(err) = run_mcts(&evaluator, game, &config, &mut rng) {
                    println!("failed: {err}");
                    continue;
                }
            }
            let total_ms = start.elapsed().as_secs_f64() * 1000.0;
            let avg_ms = total_ms / iterations as f64;

            results.push(BenchmarkResult {
                name: "MCTS".to_string(),
                config: format!("k={} sims={}", top_k, sims),
                avg_ms,
                rate: sims as f64 * 1000.0 / avg_ms,
                unit: "sims/s",
            });
            println!("{:.2}ms", avg_ms);
        }
    }

    results
}

// ============================================================================
// BENCHMARK: Self-play
// ============================================================================

fn benchmark_selfplay() -> BenchmarkResult {
    println!("\n=== SELF-PLAY BENCHMARK ===");
    let config = SelfPlayConfig {
        max_ticks: 50,
        mcts: MctsConfig {
            simulations: 50,
            ..MctsConfig::default()
        },
        ..SelfPlayConfig::default()
    };

    let start = Instant::now();
    let ticks = match play_game(&UniformEvaluator, &config, 7) {
        Ok(record) => record.ticks,
        Err(err) => panic!("self-play failed: {err}"),
    };
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;

    BenchmarkResult {
        name: "Self-play".to_string(),
        config: format!("{} ticks", ticks),
        avg_ms: total_ms / ticks.max(1) as f64,
        rate: ticks as f64 * 1000.0 / total_ms,
        unit: "ticks/s",
    }
}

fn benchmark_heuristic(game: &Game) -> BenchmarkResult {
    let evaluator = HeuristicEvaluator::default();
    let view = PlayerView::new(game, PlayerId(0));
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let iterations = 10_000;

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = evaluator.pick_move(&view, &mut rng);
    }
    let total_ms = start.elapsed().as_secs_f64() * 1000.0;

    BenchmarkResult {
        name: "Heuristic".to_string(),
        config: "one-ply top 5".to_string(),
        avg_ms: total_ms / iterations as f64,
        rate: iterations as f64 * 1000.0 / total_ms,
        unit: "moves/s",
    }
}

fn main() {
    let two = test_position(20, 2, 11);
    let four = test_position(25, 4, 12);

    let mut results = benchmark_search(&two, "20x20, 2 players");
    results.extend(benchmark_search(&four, "25x25, 4 players"));
    results.push(benchmark_selfplay());
    results.push(benchmark_heuristic(&two));

    println!("\n| Player | Config | Avg | Rate |");
    println!("|--------|--------|-----|------|");
    for result in &results {
        println!("{}", result.to_table_row());
    }
}
