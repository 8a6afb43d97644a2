//! Evaluator commands - create and inspect saved evaluators
//!
//! An evaluator named `NAME` lives at `DIR/NAME/NAME.json` with its
//! metadata sidecar next to it.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use generals_core::persist::{self, EvaluatorMeta};
use generals_core::{HeuristicEvaluator, PlayerId, MAX_SIDE};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct CreateArgs {
    /// Evaluator name
    pub name: String,

    /// Player the evaluator plays as
    #[arg(long, default_value = "0")]
    pub player: u8,

    /// Largest supported board, as WIDTHxHEIGHT
    #[arg(long, default_value = "25x25", value_parser = parse_size)]
    pub size: (usize, usize),

    /// Replace an existing evaluator
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Evaluator name
    pub name: String,
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn create(args: CreateArgs, data_dir: &Path) -> Result<()> {
    let path = network_path(data_dir, &args.name);
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }

    let (width, height) = args.size;
    let meta = EvaluatorMeta::new(PlayerId(args.player), width, height);
    persist::save(&HeuristicEvaluator::default(), &meta, &path)
        .with_context(|| format!("Failed to create evaluator {}", args.name))?;

    tracing::info!(path = %path.display(), player = %meta.player, "created evaluator");
    println!("Created {} ({}x{}, player {})", path.display(), width, height, meta.player);
    Ok(())
}

pub fn info(args: InfoArgs, data_dir: &Path) -> Result<()> {
    let path = network_path(data_dir, &args.name);
    let summary = persist::info(&path)
        .with_context(|| format!("Failed to read evaluator {}", args.name))?;
    println!("{summary}");
    Ok(())
}

// ============================================================================
// UTILITIES
// ============================================================================

/// `DIR/NAME/NAME.json`
pub fn network_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(name).join(format!("{name}.json"))
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width: usize = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let height: usize = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    if width == 0 || height == 0 || width > MAX_SIDE || height > MAX_SIDE {
        return Err(format!("size must be between 1x1 and {MAX_SIDE}x{MAX_SIDE}"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("25x20"), Ok((25, 20)));
        assert_eq!(parse_size("18X18"), Ok((18, 18)));
        assert!(parse_size("25").is_err());
        assert!(parse_size("0x5").is_err());
        assert!(parse_size("300x5").is_err());
    }

    #[test]
    fn test_network_path_layout() {
        let path = network_path(Path::new("data"), "alpha");
        assert_eq!(path, Path::new("data").join("alpha").join("alpha.json"));
    }

    #[test]
    fn test_create_then_info() {
        let dir = tempfile::tempdir().unwrap();
        let args = CreateArgs {
            name: "net".to_string(),
            player: 1,
            size: (20, 18),
            force: false,
        };
        create(args, dir.path()).unwrap();

        let (_, meta): (HeuristicEvaluator, _) =
            persist::load(&network_path(dir.path(), "net")).unwrap();
        assert_eq!(meta, EvaluatorMeta::new(PlayerId(1), 20, 18));
        info(InfoArgs { name: "net".to_string() }, dir.path()).unwrap();

        let again = CreateArgs {
            name: "net".to_string(),
            player: 0,
            size: (20, 18),
            force: false,
        };
        assert!(create(again, dir.path()).is_err());
    }
}
