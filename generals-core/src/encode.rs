//! Feature planes for policy/value evaluators
//!
//! A view is encoded into `PLANES` planes of `max_height x max_width`
//! floats, plane-major then row-major. Smaller boards sit in the top-left
//! corner and the padding stays zero.

use crate::board::{Coord, PlayerId};
use crate::error::EvaluatorError;
use crate::view::{PlayerView, ViewTile, ViewType};

pub const PLANES: usize = 13;

/// Tick at which the clock plane saturates
pub const MAX_TICK: u32 = 500;

// Plane indices
pub const OWN_ARMY: usize = 0;
pub const ENEMY_ARMY: usize = 1;
pub const NEUTRAL_ARMY: usize = 2;
pub const OWN_TERRITORY: usize = 3;
pub const ENEMY_TERRITORY: usize = 4;
pub const NEUTRAL_TERRITORY: usize = 5;
pub const OBSTACLE: usize = 6;
pub const OWN_GENERAL: usize = 7;
pub const ENEMY_GENERAL: usize = 8;
pub const FOG: usize = 9;
pub const CLOCK: usize = 10;
pub const ONES: usize = 11;
pub const ZEROS: usize = 12;

/// Encoded planes for one view
#[derive(Clone, Debug, PartialEq)]
pub struct Features {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Features {
    pub fn plane(&self, index: usize) -> &[f32] {
        let size = self.width * self.height;
        &self.data[index * size..(index + 1) * size]
    }

    pub fn at(&self, plane: usize, pos: Coord) -> f32 {
        self.plane(plane)[pos.y as usize * self.width + pos.x as usize]
    }
}

/// Encode `view` into planes padded to `max_width x max_height`
pub fn encode(
    view: &PlayerView<'_>,
    tick: u32,
    general: Coord,
    max_width: usize,
    max_height: usize,
) -> Result<Features, EvaluatorError> {
    let (width, height) = (view.width(), view.height());
    if width > max_width || height > max_height {
        return Err(EvaluatorError::BoardTooLarge {
            width,
            height,
            max_width,
            max_height,
        });
    }

    let size = max_width * max_height;
    let mut data = vec![0.0f32; PLANES * size];
    let player = view.player();

    let mut set = |plane: usize, pos: Coord, value: f32| {
        data[plane * size + pos.y as usize * max_width + pos.x as usize] = value;
    };

    for (pos, tile) in view.tiles() {
        let army = tile.army as f32;
        match Side::of(&tile, player) {
            Side::Own => {
                set(OWN_ARMY, pos, army);
                set(OWN_TERRITORY, pos, 1.0);
            }
            Side::Enemy => {
                set(ENEMY_ARMY, pos, army);
                set(ENEMY_TERRITORY, pos, 1.0);
                if tile.kind == ViewType::General {
                    set(ENEMY_GENERAL, pos, 1.0);
                }
            }
            Side::Neutral => {
                set(NEUTRAL_ARMY, pos, army);
                set(NEUTRAL_TERRITORY, pos, 1.0);
            }
        }

        let enemy_city = tile.kind == ViewType::City && Side::of(&tile, player) == Side::Enemy;
        if matches!(tile.kind, ViewType::Mountain | ViewType::UnknownObstacles) || enemy_city {
            set(OBSTACLE, pos, 1.0);
        }
        if tile.kind.is_hidden() {
            set(FOG, pos, 1.0);
        }
    }

    if general.in_bounds(width, height) {
        set(OWN_GENERAL, general, 1.0);
    }

    let clock = (tick as f32 / MAX_TICK as f32).min(1.0);
    data[CLOCK * size..(CLOCK + 1) * size].fill(clock);
    data[ONES * size..(ONES + 1) * size].fill(1.0);

    for plane in [OWN_ARMY, ENEMY_ARMY, NEUTRAL_ARMY] {
        l2_normalize(&mut data[plane * size..(plane + 1) * size]);
    }

    Ok(Features {
        width: max_width,
        height: max_height,
        data,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Own,
    Enemy,
    Neutral,
}

impl Side {
    fn of(tile: &ViewTile, player: PlayerId) -> Side {
        match tile.owner {
            Some(owner) if owner == player => Side::Own,
            Some(_) => Side::Enemy,
            None => Side::Neutral,
        }
    }
}

fn l2_normalize(plane: &mut [f32]) {
    let norm = plane.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        plane.iter_mut().for_each(|v| *v /= norm);
    }
}
