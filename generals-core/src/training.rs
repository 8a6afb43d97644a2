//! Reward shaping and the rolling baseline used by policy-gradient training

use std::collections::VecDeque;

use crate::board::PlayerId;
use crate::game::Game;

/// Rewards kept for the rolling baseline
pub const HISTORY_SIZE: usize = 100;

/// Bonus per eliminated opponent
pub const ELIMINATION_BONUS: f32 = 100.0;

/// Material reward: `0.5 * army + 1` per owned tile plus an elimination bonus
pub fn reward(game: &Game, player: PlayerId) -> f32 {
    let material: f32 = game
        .board()
        .tiles()
        .iter()
        .filter(|t| t.is_owned_by(player))
        .map(|t| t.army as f32 * 0.5 + 1.0)
        .sum();
    let eliminated = game
        .players()
        .iter()
        .filter(|p| p.id != player && !p.alive)
        .count();
    material + eliminated as f32 * ELIMINATION_BONUS
}

/// Reward history for one training run
#[derive(Clone, Debug, Default)]
pub struct TrainingContext {
    history: VecDeque<f32>,
}

/// Reward paired with the baseline it was measured against
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Advantage {
    pub reward: f32,
    pub baseline: f32,
    pub advantage: f32,
}

impl TrainingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean of the recorded rewards, 0 when empty
    pub fn baseline(&self) -> f32 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    /// Record a reward and measure it against the updated baseline
    pub fn record(&mut self, reward: f32) -> Advantage {
        self.history.push_back(reward);
        if self.history.len() > HISTORY_SIZE {
            self.history.pop_front();
        }
        let baseline = self.baseline();
        Advantage {
            reward,
            baseline,
            advantage: reward - baseline,
        }
    }

    /// Score `player` in `game` and record the result
    pub fn observe(&mut self, game: &Game, player: PlayerId) -> Advantage {
        self.record(reward(game, player))
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Forget all history before an independent run
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
