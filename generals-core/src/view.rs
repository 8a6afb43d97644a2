//! Fog-of-war projection of a game for one player
//!
//! A tile is visible to a player when the tile itself or any of its 8
//! neighbours is owned by that player. Hidden tiles reveal only whether
//! they are open ground (`Unknown`) or some obstacle (`UnknownObstacles`);
//! owner and army are never exposed.

use serde::{Deserialize, Serialize};

use crate::board::{Coord, PlayerId, TileType, ALL_DIRECTIONS};
use crate::game::{Game, Move};

/// Tile type as seen by a player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewType {
    Blank,
    Mountain,
    City,
    General,
    Unknown,
    UnknownObstacles,
}

impl From<TileType> for ViewType {
    fn from(kind: TileType) -> Self {
        match kind {
            TileType::Blank => ViewType::Blank,
            TileType::Mountain => ViewType::Mountain,
            TileType::City => ViewType::City,
            TileType::General => ViewType::General,
        }
    }
}

impl ViewType {
    pub fn is_hidden(self) -> bool {
        matches!(self, ViewType::Unknown | ViewType::UnknownObstacles)
    }
}

/// A tile as seen by a player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewTile {
    pub kind: ViewType,
    pub owner: Option<PlayerId>,
    pub army: u32,
}

impl ViewTile {
    pub const UNKNOWN: ViewTile = ViewTile { kind: ViewType::Unknown, owner: None, army: 0 };
    pub const UNKNOWN_OBSTACLES: ViewTile =
        ViewTile { kind: ViewType::UnknownObstacles, owner: None, army: 0 };
}

/// Read-only lens over a game for one player
#[derive(Clone, Copy, Debug)]
pub struct PlayerView<'a> {
    game: &'a Game,
    player: PlayerId,
}

impl<'a> PlayerView<'a> {
    pub fn new(game: &'a Game, player: PlayerId) -> Self {
        Self { game, player }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn width(&self) -> usize {
        self.game.width()
    }

    pub fn height(&self) -> usize {
        self.game.height()
    }

    pub fn tick(&self) -> u32 {
        self.game.tick()
    }

    /// The viewing player's own general position
    pub fn general(&self) -> Option<Coord> {
        self.game.player(self.player).map(|info| info.general)
    }

    /// Whether the tile or any of its 8 neighbours belongs to the viewer
    pub fn is_visible(&self, pos: Coord) -> bool {
        let board = self.game.board();
        board.contains(pos) && board.nearby(pos).any(|n| board[n].is_owned_by(self.player))
    }

    /// Tile at `pos`, redacted when hidden; `None` when out of bounds
    pub fn tile(&self, pos: Coord) -> Option<ViewTile> {
        let tile = self.game.tile(pos)?;
        if self.is_visible(pos) {
            return Some(ViewTile {
                kind: tile.kind.into(),
                owner: tile.owner,
                army: tile.army,
            });
        }
        Some(match tile.kind {
            TileType::Blank => ViewTile::UNKNOWN,
            TileType::Mountain | TileType::City | TileType::General => {
                ViewTile::UNKNOWN_OBSTACLES
            }
        })
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = (Coord, ViewTile)> + '_ {
        self.game.board().iter().filter_map(move |(pos, _)| {
            self.tile(pos).map(|t| (pos, t))
        })
    }

    /// Moves from each owned tile toward an in-bounds tile that is not a mountain.
    ///
    /// Every neighbour of an owned tile is visible, so this never needs
    /// hidden information.
    pub fn legal_moves(&self) -> Vec<Move> {
        let (w, h) = (self.width(), self.height());
        let mut moves = Vec::new();
        for (pos, tile) in self.tiles() {
            if tile.owner != Some(self.player) {
                continue;
            }
            for direction in ALL_DIRECTIONS {
                let Some(target) = pos.step(direction, w, h) else {
                    continue;
                };
                let blocked = self
                    .tile(target)
                    .map_or(true, |t| t.kind == ViewType::Mountain);
                if !blocked {
                    moves.push(Move::new(self.player, pos, direction));
                }
            }
        }
        moves
    }
}
