//! Self-play game generation for training data.
//!
//! Plays full games with every alive player choosing its move from a shared
//! MCTS search each tick. Records the encoded view, every player's policy
//! and the root values per alive player per tick; once the game ends every
//! sample's value is overwritten with the final outcome.

use std::io::Write;

use generals_core::{encode, ActionSpace, Evaluator, Game, MapConfig, Move, PlayerId, PlayerView};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::SelfPlayError;
use crate::search::run_mcts;
use crate::MctsConfig;

/// Configuration for self-play game generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfPlayConfig {
    /// Smallest board side
    pub min_size: usize,
    /// Largest board side
    pub max_size: usize,
    pub players: usize,
    /// Tick budget per game
    pub max_ticks: u32,
    pub games: usize,
    /// Base seed; game `i` uses `seed + i`. `None` draws one from entropy.
    pub seed: Option<u64>,
    /// Temperature for move sampling (0.0 = argmax)
    pub temperature: f32,
    /// Worker threads for concurrent games (0 = one per core)
    pub threads: usize,
    /// Feature planes are padded to this width
    pub feature_width: usize,
    /// Feature planes are padded to this height
    pub feature_height: usize,
    pub mcts: MctsConfig,
    pub map: MapConfig,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            min_size: 18,
            max_size: 25,
            players: 2,
            max_ticks: 500,
            games: 1,
            seed: None,
            temperature: 1.0,
            threads: 1,
            feature_width: 25,
            feature_height: 25,
            mcts: MctsConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl SelfPlayConfig {
    pub fn validate(&self) -> Result<(), SelfPlayError> {
        if self.min_size == 0 || self.min_size > self.max_size {
            return Err(SelfPlayError::InvalidConfig(format!(
                "board size range {}..={} is empty",
                self.min_size, self.max_size
            )));
        }
        if self.max_size > self.feature_width || self.max_size > self.feature_height {
            return Err(SelfPlayError::InvalidConfig(format!(
                "boards up to {0}x{0} do not fit features of {1}x{2}",
                self.max_size, self.feature_width, self.feature_height
            )));
        }
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(SelfPlayError::InvalidConfig(format!(
                "temperature {} must be finite and non-negative",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// One training example: a player's view at one tick
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Seed of the game this sample came from
    pub game_seed: u64,
    pub player: PlayerId,
    pub tick: u32,
    /// Board size, which defines the policy action space
    pub width: usize,
    pub height: usize,
    /// Encoded planes, `PLANES x feature_height x feature_width`
    pub features: Vec<f32>,
    pub feature_width: usize,
    pub feature_height: usize,
    /// Every player's search policy at this tick
    pub policies: Vec<Vec<f32>>,
    /// Final outcome per player once the game is over
    pub value: Vec<f32>,
    /// Search root value per player at this tick
    pub root_values: Vec<f32>,
}

/// A complete self-play game
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameRecord {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub players: usize,
    pub ticks: u32,
    /// +1 for players still alive, -1 for eliminated players
    pub outcome: Vec<f32>,
    pub samples: Vec<TrainingSample>,
}

impl GameRecord {
    /// Players alive at the end, in id order
    pub fn survivors(&self) -> Vec<PlayerId> {
        self.outcome
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0.0)
            .map(|(i, _)| PlayerId(i as u8))
            .collect()
    }
}

/// Seed of game `index` in a run starting from `base`
pub fn game_seed(base: u64, index: usize) -> u64 {
    base.wrapping_add(index as u64)
}

/// Plays one game from `seed` and returns its record with outcome-backfilled values.
pub fn play_game<E>(evaluator: &E, config: &SelfPlayConfig, seed: u64) -> Result<GameRecord, SelfPlayError>
where
    E: Evaluator + ?Sized,
{
    config.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let width = rng.gen_range(config.min_size..=config.max_size);
    let height = rng.gen_range(config.min_size..=config.max_size);
    let mut game = Game::with_config(&config.map, width, height, config.players, &mut rng)?;
    let space = ActionSpace::new(width, height);

    tracing::info!(seed, width, height, players = config.players, "self-play game started");

    let mut samples = Vec::new();
    while !game.is_over() && game.tick() < config.max_ticks {
        let result = run_mcts(evaluator, &game, &config.mcts, &mut rng)?;

        let mut joint: Vec<Option<Move>> = vec![None; game.player_count()];
        for info in game.players().iter().filter(|p| p.alive) {
            let view = PlayerView::new(&game, info.id);
            let features = encode(
                &view,
                game.tick(),
                info.general,
                config.feature_width,
                config.feature_height,
            )
            .map_err(SelfPlayError::Encode)?;

            samples.push(TrainingSample {
                game_seed: seed,
                player: info.id,
                tick: game.tick(),
                width,
                height,
                features: features.data,
                feature_width: features.width,
                feature_height: features.height,
                policies: result.policies.clone(),
                value: vec![0.0; game.player_count()],
                root_values: result.values.clone(),
            });

            let policy = &result.policies[info.id.index()];
            let index = sample_action(policy, config.temperature, &mut rng);
            joint[info.id.index()] = space.decode(index, info.id).ok().flatten();
        }

        tracing::debug!(tick = game.tick(), moves = ?joint, "joint move");
        game.play_round(&joint);
    }

    let outcome = game.outcome();
    for sample in &mut samples {
        sample.value.clone_from(&outcome);
    }

    tracing::info!(
        seed,
        ticks = game.tick(),
        alive = game.alive_count(),
        samples = samples.len(),
        "self-play game finished"
    );

    Ok(GameRecord {
        seed,
        width,
        height,
        players: game.player_count(),
        ticks: game.tick(),
        outcome,
        samples,
    })
}

/// Pick an action index from a policy.
///
/// Temperature 0 takes the first maximum; otherwise samples from
/// `(p / max)^(1/temperature)`, so the most likely action keeps weight 1 at
/// any temperature. An all-zero policy yields the last slot (the pass).
pub fn sample_action<R: Rng>(policy: &[f32], temperature: f32, rng: &mut R) -> usize {
    let fallback = policy.len().saturating_sub(1);
    let (best, best_p) = policy
        .iter()
        .enumerate()
        .fold((fallback, 0.0f32), |(bi, bp), (i, &p)| if p > bp { (i, p) } else { (bi, bp) });
    if temperature <= 0.0 || best_p <= 0.0 {
        return best;
    }

    let exponent = 1.0 / temperature;
    let weights = policy.iter().map(|&p| (p.max(0.0) / best_p).powf(exponent));
    match WeightedIndex::new(weights) {
        Ok(dist) => dist.sample(rng),
        Err(_) => best,
    }
}

/// Runs `config.games` games, handing each finished record to `on_game`.
///
/// With the `parallel` feature and `threads != 1`, games run concurrently on
/// a rayon pool while `on_game` is still called on the current thread.
/// Returns the number of games delivered.
pub fn run_self_play<E, F>(evaluator: &E, config: &SelfPlayConfig, on_game: F) -> Result<usize, SelfPlayError>
where
    E: Evaluator + ?Sized,
    F: FnMut(GameRecord) -> Result<(), SelfPlayError>,
{
    config.validate()?;
    let base = config.seed.unwrap_or_else(rand::random);
    tracing::info!(games = config.games, seed = base, threads = config.threads, "starting self-play");

    #[cfg(feature = "parallel")]
    {
        if config.threads != 1 {
            return run_self_play_parallel(evaluator, config, base, on_game);
        }
    }

    run_self_play_sequential(evaluator, config, base, on_game)
}

fn run_self_play_sequential<E, F>(
    evaluator: &E,
    config: &SelfPlayConfig,
    base: u64,
    mut on_game: F,
) -> Result<usize, SelfPlayError>
where
    E: Evaluator + ?Sized,
    F: FnMut(GameRecord) -> Result<(), SelfPlayError>,
{
    for i in 0..config.games {
        let record = play_game(evaluator, config, game_seed(base, i))?;
        on_game(record)?;
    }
    Ok(config.games)
}

/// Parallel self-play: workers send finished games over a channel.
#[cfg(feature = "parallel")]
fn run_self_play_parallel<E, F>(
    evaluator: &E,
    config: &SelfPlayConfig,
    base: u64,
    mut on_game: F,
) -> Result<usize, SelfPlayError>
where
    E: Evaluator + ?Sized,
    F: FnMut(GameRecord) -> Result<(), SelfPlayError>,
{
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()
        .map_err(|e| SelfPlayError::InvalidConfig(format!("failed to build thread pool: {e}")))?;

    let stop = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<Result<GameRecord, SelfPlayError>>();

    std::thread::scope(|scope| {
        let pool = &pool;
        let stop = &stop;
        scope.spawn(move || {
            pool.install(|| {
                (0..config.games).into_par_iter().for_each_with(tx, |tx, i| {
                    if stop.load(Ordering::Relaxed) {
                        return;
                    }
                    let _ = tx.send(play_game(evaluator, config, game_seed(base, i)));
                });
            });
        });

        let mut delivered = 0;
        for record in rx {
            if let Err(err) = record.and_then(&mut on_game) {
                stop.store(true, Ordering::Relaxed);
                return Err(err);
            }
            delivered += 1;
        }
        Ok(delivered)
    })
}

/// Writes samples as JSON Lines (one sample per line).
pub fn write_jsonl<W: Write>(out: &mut W, samples: &[TrainingSample]) -> Result<(), SelfPlayError> {
    for sample in samples {
        serde_json::to_writer(&mut *out, sample)?;
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
