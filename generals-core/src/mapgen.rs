//! MapConfig - random map generation parameters

use std::path::Path;

use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Coord, PlayerId, Tile, MAX_SIDE};
use crate::error::MapGenerationError;

/// Parameters controlling terrain density and general spacing.
///
/// Counts are derived from the board area: mountains are drawn from
/// `area / mountain_divisors.0 ..= area / mountain_divisors.1`, cities from
/// `area / city_divisors.0 ..= area / city_divisors.1`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub mountain_divisors: (u32, u32),
    pub city_divisors: (u32, u32),
    /// Inclusive range of a neutral city's starting garrison
    pub city_army: (u32, u32),
    /// Minimum general spacing is `area / players / general_distance_divisor`
    pub general_distance_divisor: u32,
    /// Rejection-sampling ceiling per general
    pub max_placement_attempts: u32,
    pub min_area_per_player: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            mountain_divisors: (6, 4),
            city_divisors: (35, 30),
            city_army: (30, 50),
            general_distance_divisor: 15,
            max_placement_attempts: 10_000,
            min_area_per_player: 10,
        }
    }
}

impl MapConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read map config: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse map config: {}", path.display()))?;
        Ok(config)
    }

    /// Minimum Manhattan distance between generals; placement needs strictly more
    pub fn general_distance(&self, area: u32, players: u32) -> u32 {
        area / players.max(1) / self.general_distance_divisor.max(1)
    }

    /// Check dimensions and player count before any sampling happens
    pub fn validate(
        &self,
        width: usize,
        height: usize,
        players: usize,
    ) -> Result<(), MapGenerationError> {
        if width == 0 || height == 0 || width > MAX_SIDE || height > MAX_SIDE {
            return Err(MapGenerationError::InvalidDimensions { width, height });
        }
        let area = width * height;
        if players == 0
            || players > u8::MAX as usize
            || area < self.min_area_per_player as usize * players
        {
            return Err(MapGenerationError::InvalidPlayerCount {
                players,
                width,
                height,
            });
        }
        Ok(())
    }

    /// Generate terrain and generals.
    ///
    /// Mountains and cities are placed independently; a later placement
    /// overwrites whatever an earlier one put on the same cell. Generals are
    /// placed by rejection sampling on unclaimed blank cells.
    pub fn generate<R: Rng>(
        &self,
        width: usize,
        height: usize,
        players: usize,
        rng: &mut R,
    ) -> Result<(Board, Vec<Coord>), MapGenerationError> {
        self.validate(width, height, players)?;

        let mut board = Board::new(width, height);
        let area = (width * height) as u32;

        let mountains = sample_count(area, self.mountain_divisors, rng);
        let cities = sample_count(area, self.city_divisors, rng);

        for _ in 0..mountains {
            let idx = rng.gen_range(0..area as usize);
            board.tiles_mut()[idx] = Tile::MOUNTAIN;
        }
        let (army_lo, army_hi) = ordered(self.city_army);
        for _ in 0..cities {
            let idx = rng.gen_range(0..area as usize);
            board.tiles_mut()[idx] = Tile::city(rng.gen_range(army_lo..=army_hi));
        }

        let min_distance = self.general_distance(area, players as u32);
        let mut generals: Vec<Coord> = Vec::with_capacity(players);

        for p in 0..players {
            let player = PlayerId(p as u8);
            let pos = self.place_general(&board, &generals, min_distance, player, rng)?;
            board[pos] = Tile::general(player);
            generals.push(pos);
        }

        tracing::debug!(
            width,
            height,
            mountains,
            cities,
            min_distance,
            "generated map"
        );

        Ok((board, generals))
    }

    fn place_general<R: Rng>(
        &self,
        board: &Board,
        placed: &[Coord],
        min_distance: u32,
        player: PlayerId,
        rng: &mut R,
    ) -> Result<Coord, MapGenerationError> {
        for _ in 0..self.max_placement_attempts {
            let pos = board.coord_of(rng.gen_range(0..board.cells()));
            if board[pos] != Tile::BLANK {
                continue;
            }
            if placed.iter().all(|&g| g.manhattan(pos) > min_distance) {
                return Ok(pos);
            }
        }
        Err(MapGenerationError::GeneralPlacement {
            player,
            attempts: self.max_placement_attempts,
        })
    }
}

fn ordered((a, b): (u32, u32)) -> (u32, u32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Draw a count from `area / divisors.0 ..= area / divisors.1`
fn sample_count<R: Rng>(area: u32, divisors: (u32, u32), rng: &mut R) -> u32 {
    let lo = area / divisors.0.max(1);
    let hi = area / divisors.1.max(1);
    let (lo, hi) = ordered((lo, hi));
    rng.gen_range(lo..=hi)
}
