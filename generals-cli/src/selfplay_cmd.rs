//! Self-play command - generate training samples with MCTS
//!
//! ## Architecture
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), open_output(), play()
//! - Level 3: file naming, flushing

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use generals_core::persist::{self, EvaluatorMeta};
use generals_core::{HeuristicEvaluator, MapConfig, PlayerId};
use generals_mcts::selfplay::{run_self_play, write_jsonl};
use generals_mcts::{MctsConfig, SelfPlayConfig, TrainingSample};

use crate::network_cmd::network_path;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct SelfPlayArgs {
    /// Evaluator name (a fresh one is used if it cannot be loaded)
    #[arg(long)]
    pub network: String,

    /// Number of games to play
    #[arg(long, default_value = "1")]
    pub games: usize,

    /// MCTS simulations per tick
    #[arg(long, default_value = "100")]
    pub mcts: u32,

    /// UCB exploration constant
    #[arg(long, default_value = "1.41")]
    pub exploration: f32,

    /// Games buffered before samples are flushed to disk
    #[arg(long, default_value = "1")]
    pub batch: usize,

    /// Tick budget per game
    #[arg(long, default_value = "500")]
    pub max_ticks: u32,

    #[arg(long, default_value = "2")]
    pub players: usize,

    /// Candidate moves per player in each expansion
    #[arg(long, default_value = "5")]
    pub top_k: usize,

    /// Prior given to passing
    #[arg(long, default_value = "0.05")]
    pub pass_prior: f32,

    /// Smallest board side
    #[arg(long, default_value = "18")]
    pub min_size: usize,

    /// Largest board side (capped by the evaluator's maximum size)
    #[arg(long, default_value = "25")]
    pub max_size: usize,

    /// Base random seed (omit for entropy)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Move sampling temperature (0 = argmax)
    #[arg(long, default_value = "1.0")]
    pub temperature: f32,

    /// Map generation parameters (JSON)
    #[arg(long, value_name = "FILE")]
    pub map_config: Option<PathBuf>,

    /// Output JSONL file (default: timestamped file next to the evaluator)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value = "1")]
    pub threads: usize,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run self-play command
///
/// 1. Load the evaluator (fresh on failure)
/// 2. Build the self-play configuration
/// 3. Play games, flushing samples every `batch` games
pub fn run(args: SelfPlayArgs, data_dir: &Path) -> Result<()> {
    let path = network_path(data_dir, &args.network);
    let fallback = EvaluatorMeta::new(PlayerId(0), args.max_size, args.max_size);
    let (evaluator, meta): (HeuristicEvaluator, _) = persist::load_or_fresh(&path, fallback);

    let config = build_config(&args, &meta)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(data_dir, &args.network));

    tracing::info!(
        "Starting self-play: games={}, sims={}, players={}, output={}",
        config.games,
        config.mcts.simulations,
        config.players,
        output.display()
    );

    let summary = play(&evaluator, &config, &output, args.batch.max(1))?;

    println!(
        "Wrote {} samples from {} games to {}",
        summary.samples,
        summary.games,
        output.display()
    );
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn build_config(args: &SelfPlayArgs, meta: &EvaluatorMeta) -> Result<SelfPlayConfig> {
    let map = match &args.map_config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };

    let cap = meta.max_width.min(meta.max_height);
    let max_size = args.max_size.min(cap);
    if max_size < args.max_size {
        tracing::warn!(
            "Evaluator supports boards up to {}x{}, capping max size at {}",
            meta.max_width,
            meta.max_height,
            max_size
        );
    }

    let config = SelfPlayConfig {
        min_size: args.min_size.min(max_size),
        max_size,
        players: args.players,
        max_ticks: args.max_ticks,
        games: args.games,
        seed: args.seed,
        temperature: args.temperature,
        threads: args.threads,
        feature_width: meta.max_width,
        feature_height: meta.max_height,
        mcts: MctsConfig {
            simulations: args.mcts,
            exploration: args.exploration,
            top_k: args.top_k,
            pass_prior: args.pass_prior,
        },
        map,
    };
    config.validate()?;
    Ok(config)
}

struct Summary {
    games: usize,
    samples: usize,
}

fn play(
    evaluator: &HeuristicEvaluator,
    config: &SelfPlayConfig,
    output: &Path,
    batch: usize,
) -> Result<Summary> {
    let mut writer = open_output(output)?;
    let progress = ProgressBar::new(config.games as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} games {msg}")?,
    );

    let mut buffered: Vec<TrainingSample> = Vec::new();
    let mut pending_games = 0;
    let mut total_samples = 0;

    let games = run_self_play(evaluator, config, |record| {
        tracing::debug!(
            seed = record.seed,
            ticks = record.ticks,
            survivors = ?record.survivors(),
            "game complete"
        );
        total_samples += record.samples.len();
        buffered.extend(record.samples);
        pending_games += 1;

        if pending_games >= batch {
            write_jsonl(&mut writer, &buffered)?;
            buffered.clear();
            pending_games = 0;
        }

        progress.inc(1);
        progress.set_message(format!("{total_samples} samples"));
        Ok(())
    })?;

    if !buffered.is_empty() {
        write_jsonl(&mut writer, &buffered)?;
    }
    progress.finish();

    Ok(Summary {
        games,
        samples: total_samples,
    })
}

// ============================================================================
// LEVEL 3 - FILES
// ============================================================================

fn open_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// `DIR/NAME/selfplay-YYYYMMDD-HHMMSS.jsonl`
fn default_output(data_dir: &Path, network: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    data_dir.join(network).join(format!("selfplay-{stamp}.jsonl"))
}
