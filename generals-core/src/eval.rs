//! Evaluator boundary and the built-in evaluators
//!
//! Search talks to position evaluators only through [`Evaluator`]. A neural
//! model would implement the same trait; this crate ships a uniform
//! baseline and a hand-crafted territory heuristic.

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::Coord;
use crate::error::EvaluatorError;
use crate::game::Move;
use crate::view::{PlayerView, ViewType};

/// Prior probability per legal move
pub type Priors = FxHashMap<Move, f32>;

/// Output of one evaluation
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    pub priors: Priors,
    /// Position value for the viewing player, in `[-1, 1]`
    pub value: f32,
}

/// Policy/value function consumed by search.
///
/// Must be shareable across threads for concurrent self-play.
pub trait Evaluator: Send + Sync {
    /// Priors over the viewer's legal moves and a value for the position
    fn evaluate(
        &self,
        view: &PlayerView<'_>,
        tick: u32,
        general: Coord,
    ) -> Result<Evaluation, EvaluatorError>;

    /// Score a single move from the viewer's position (higher is better)
    fn score_move(&self, view: &PlayerView<'_>, mv: &Move) -> Result<f32, EvaluatorError> {
        let general = view.general().ok_or_else(|| {
            EvaluatorError::EvaluationFailed(format!("{} is not in the game", view.player()))
        })?;
        let eval = self.evaluate(view, view.tick(), general)?;
        Ok(eval.priors.get(mv).copied().unwrap_or(0.0))
    }
}

// ============================================================================
// UNIFORM
// ============================================================================

/// Equal priors over legal moves, neutral value
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(
        &self,
        view: &PlayerView<'_>,
        _tick: u32,
        _general: Coord,
    ) -> Result<Evaluation, EvaluatorError> {
        let moves = view.legal_moves();
        let prob = 1.0 / moves.len().max(1) as f32;
        Ok(Evaluation {
            priors: moves.into_iter().map(|mv| (mv, prob)).collect(),
            value: 0.0,
        })
    }
}

// ============================================================================
// HEURISTIC
// ============================================================================

/// Weights for the territory heuristic
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicEvaluator {
    /// Score for taking any tile
    pub capture: f32,
    /// Extra score for taking a city
    pub city_bonus: f32,
    /// Extra score for taking a general
    pub general_bonus: f32,
    /// Score scale for moving armies onto own tiles
    pub consolidation: f32,
    /// Score for an attack that does not take the tile (usually negative)
    pub failed_attack: f32,
    /// Softmax temperature for priors
    pub temperature: f32,
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self {
            capture: 1.0,
            city_bonus: 4.0,
            general_bonus: 50.0,
            consolidation: 0.5,
            failed_attack: -0.5,
            temperature: 1.0,
        }
    }
}

/// Number of best-scored moves the one-ply searcher chooses among
pub const HEURISTIC_TOP_K: usize = 5;

impl HeuristicEvaluator {
    /// Territory balance: own tiles versus visible enemy tiles
    pub fn territory_value(&self, view: &PlayerView<'_>) -> f32 {
        let player = view.player();
        let (mut own, mut enemy) = (0u32, 0u32);
        for (_, tile) in view.tiles() {
            match tile.owner {
                Some(owner) if owner == player => own += 1,
                Some(_) => enemy += 1,
                None => {}
            }
        }
        if own + enemy == 0 {
            return 0.0;
        }
        (own as f32 - enemy as f32) / (own + enemy) as f32
    }

    /// Score a move from view data alone; no-ops score zero
    pub fn move_score(&self, view: &PlayerView<'_>, mv: &Move) -> f32 {
        let Some(source) = view.tile(mv.from) else {
            return 0.0;
        };
        if source.owner != Some(view.player()) || source.army <= 1 {
            return 0.0;
        }
        let Some(to) = mv.target(view.width(), view.height()) else {
            return 0.0;
        };
        let Some(target) = view.tile(to) else {
            return 0.0;
        };
        let moving = source.army - 1;

        match target.kind {
            ViewType::Mountain => 0.0,
            _ if target.owner == Some(view.player()) => {
                self.consolidation * moving as f32 / (moving + target.army + 1) as f32
            }
            _ if moving > target.army => {
                let bonus = match target.kind {
                    ViewType::City => self.city_bonus,
                    ViewType::General => self.general_bonus,
                    _ => 0.0,
                };
                self.capture + bonus
            }
            _ => self.failed_attack,
        }
    }

    /// Rank legal moves and pick uniformly among the best few
    pub fn pick_move<R: Rng>(&self, view: &PlayerView<'_>, rng: &mut R) -> Option<Move> {
        let mut scored: Vec<(Move, f32)> = view
            .legal_moves()
            .into_iter()
            .map(|mv| (mv, self.move_score(view, &mv)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(HEURISTIC_TOP_K);
        scored.choose(rng).map(|(mv, _)| *mv)
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(
        &self,
        view: &PlayerView<'_>,
        _tick: u32,
        _general: Coord,
    ) -> Result<Evaluation, EvaluatorError> {
        if self.temperature <= 0.0 || !self.temperature.is_finite() {
            return Err(EvaluatorError::EvaluationFailed(format!(
                "invalid softmax temperature {}",
                self.temperature
            )));
        }

        let scored: Vec<(Move, f32)> = view
            .legal_moves()
            .into_iter()
            .map(|mv| (mv, self.move_score(view, &mv) / self.temperature))
            .collect();

        let max = scored.iter().map(|(_, s)| *s).fold(f32::NEG_INFINITY, f32::max);
        let total: f32 = scored.iter().map(|(_, s)| (s - max).exp()).sum();
        let priors = scored
            .into_iter()
            .map(|(mv, s)| (mv, (s - max).exp() / total))
            .collect();

        Ok(Evaluation {
            priors,
            value: self.territory_value(view),
        })
    }

    fn score_move(&self, view: &PlayerView<'_>, mv: &Move) -> Result<f32, EvaluatorError> {
        Ok(self.move_score(view, mv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Direction, PlayerId, Tile};
    use crate::game::Game;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);

    fn game() -> Game {
        let mut board = Board::new(6, 6);
        board[Coord::new(2, 0)] = Tile::city(5);
        Game::from_board(board, &[Coord::new(1, 0), Coord::new(5, 5)]).unwrap()
    }

    fn sum(priors: &Priors) -> f32 {
        priors.values().sum()
    }

    #[test]
    fn test_uniform_priors() {
        let g = game();
        let view = PlayerView::new(&g, P0);
        let eval = UniformEvaluator::new().evaluate(&view, 0, Coord::new(1, 0)).unwrap();

        // General at (1,0): left, right, down are on board
        assert_eq!(eval.priors.len(), 3);
        assert!((sum(&eval.priors) - 1.0).abs() < 1e-6);
        assert_eq!(eval.value, 0.0);
    }

    #[test]
    fn test_heuristic_prefers_city_capture() {
        let mut g = game();
        g.set_tile(Coord::new(1, 0), Tile::new(crate::TileType::General, Some(P0), 20));
        let view = PlayerView::new(&g, P0);
        let heuristic = HeuristicEvaluator::default();

        let to_city = Move::new(P0, Coord::new(1, 0), Direction::Right);
        let to_blank = Move::new(P0, Coord::new(1, 0), Direction::Down);
        assert!(heuristic.move_score(&view, &to_city) > heuristic.move_score(&view, &to_blank));

        let eval = heuristic.evaluate(&view, 0, Coord::new(1, 0)).unwrap();
        assert!((sum(&eval.priors) - 1.0).abs() < 1e-5);
        assert!(eval.priors[&to_city] > eval.priors[&to_blank]);
    }

    #[test]
    fn test_failed_attack_scores_low() {
        let mut g = game();
        g.set_tile(Coord::new(1, 0), Tile::new(crate::TileType::General, Some(P0), 3));
        let view = PlayerView::new(&g, P0);
        let heuristic = HeuristicEvaluator::default();
        let into_city = Move::new(P0, Coord::new(1, 0), Direction::Right);
        assert_eq!(heuristic.move_score(&view, &into_city), heuristic.failed_attack);
    }

    #[test]
    fn test_territory_value() {
        let mut g = game();
        g.set_tile(Coord::new(0, 0), Tile::land(P0, 1));
        g.set_tile(Coord::new(0, 1), Tile::land(P0, 1));
        g.set_tile(Coord::new(1, 1), Tile::land(P1, 1));
        let heuristic = HeuristicEvaluator::default();

        // P0 owns 3, sees 1 enemy tile; P1's general is hidden from P0
        let v = heuristic.territory_value(&PlayerView::new(&g, P0));
        assert!((v - 0.5).abs() < 1e-6);
        // P1 sees all 3 of P0's tiles next to its outpost and owns 2
        let v = heuristic.territory_value(&PlayerView::new(&g, P1));
        assert!((v + 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_default_score_move_reads_priors() {
        let g = game();
        let view = PlayerView::new(&g, P0);
        let mv = Move::new(P0, Coord::new(1, 0), Direction::Down);
        let score = UniformEvaluator.score_move(&view, &mv).unwrap();
        assert!((score - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_pick_move_within_top_k() {
        let mut g = game();
        g.set_tile(Coord::new(1, 0), Tile::new(crate::TileType::General, Some(P0), 20));
        let view = PlayerView::new(&g, P0);
        let heuristic = HeuristicEvaluator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let legal = view.legal_moves();
        for _ in 0..20 {
            let mv = heuristic.pick_move(&view, &mut rng).unwrap();
            assert!(legal.contains(&mv));
        }
    }

    #[test]
    fn test_invalid_temperature_is_an_error() {
        let g = game();
        let view = PlayerView::new(&g, P0);
        let heuristic = HeuristicEvaluator { temperature: 0.0, ..Default::default() };
        assert!(heuristic.evaluate(&view, 0, Coord::new(1, 0)).is_err());
    }
}
