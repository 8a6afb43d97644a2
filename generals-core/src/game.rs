//! Game state, move resolution, and income

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Coord, Direction, PlayerId, Tile, TileType, ALL_DIRECTIONS};
use crate::error::MapGenerationError;
use crate::mapgen::MapConfig;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Owned blank tiles grow only on ticks divisible by this
pub const LAND_INCOME_PERIOD: u32 = 25;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Roster entry for one player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub alive: bool,
    pub general: Coord,
}

/// A single army move: everything but one unit leaves `from` toward `direction`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Move {
    pub player: PlayerId,
    pub from: Coord,
    pub direction: Direction,
}

impl Move {
    pub const fn new(player: PlayerId, from: Coord, direction: Direction) -> Self {
        Self { player, from, direction }
    }

    /// Destination tile, if it is on the board
    pub fn target(&self, width: usize, height: usize) -> Option<Coord> {
        self.from.step(self.direction, width, height)
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Authoritative game state (clone to branch)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    board: Board,
    players: Vec<PlayerInfo>,
    tick: u32,
    alive_count: usize,
}

impl Game {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Create a random map with default terrain parameters
    pub fn new<R: Rng>(
        width: usize,
        height: usize,
        player_count: usize,
        rng: &mut R,
    ) -> Result<Self, MapGenerationError> {
        Self::with_config(&MapConfig::default(), width, height, player_count, rng)
    }

    /// Create a random map with custom terrain parameters
    pub fn with_config<R: Rng>(
        config: &MapConfig,
        width: usize,
        height: usize,
        player_count: usize,
        rng: &mut R,
    ) -> Result<Self, MapGenerationError> {
        let (board, generals) = config.generate(width, height, player_count, rng)?;
        Self::from_board(board, &generals)
    }

    /// Build a game from a prepared board.
    ///
    /// Player `i` gets `generals[i]`; that tile becomes a general owned by
    /// player `i` with one army unless it already is one. Fails when a
    /// general lies off the board or there are more generals than player ids.
    pub fn from_board(mut board: Board, generals: &[Coord]) -> Result<Self, MapGenerationError> {
        let (width, height) = (board.width(), board.height());
        if generals.len() > usize::from(u8::MAX) + 1 {
            return Err(MapGenerationError::InvalidPlayerCount {
                players: generals.len(),
                width,
                height,
            });
        }

        let mut players = Vec::with_capacity(generals.len());
        for (i, &general) in generals.iter().enumerate() {
            let id = PlayerId(i as u8);
            let tile = board
                .get_mut(general)
                .ok_or(MapGenerationError::GeneralOutOfBounds {
                    player: i,
                    x: general.x,
                    y: general.y,
                    width,
                    height,
                })?;
            if tile.kind != TileType::General || tile.owner != Some(id) {
                *tile = Tile::general(id);
            }
            players.push(PlayerInfo {
                id,
                alive: true,
                general,
            });
        }

        Ok(Self {
            board,
            alive_count: players.len(),
            players,
            tick: 0,
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn width(&self) -> usize {
        self.board.width()
    }

    pub fn height(&self) -> usize {
        self.board.height()
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerInfo> {
        self.players.get(id.index())
    }

    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.player(id).map_or(false, |info| info.alive)
    }

    /// Ids of players still in the game, ascending
    pub fn alive_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().filter(|p| p.alive).map(|p| p.id)
    }

    pub fn tile(&self, pos: Coord) -> Option<&Tile> {
        self.board.get(pos)
    }

    /// Overwrite a tile (scenario setup); ignored when out of bounds
    pub fn set_tile(&mut self, pos: Coord, tile: Tile) {
        if let Some(slot) = self.board.get_mut(pos) {
            *slot = tile;
        }
    }

    /// Game ends once at most one player is alive
    pub fn is_over(&self) -> bool {
        self.alive_count <= 1
    }

    /// Per-player outcome: +1 for players still alive, -1 for eliminated ones
    pub fn outcome(&self) -> Vec<f32> {
        self.players
            .iter()
            .map(|p| if p.alive { 1.0 } else { -1.0 })
            .collect()
    }

    // ========================================================================
    // MOVE GENERATION
    // ========================================================================

    /// Moves from every tile `player` owns toward any in-bounds non-mountain tile
    pub fn legal_moves(&self, player: PlayerId) -> Vec<Move> {
        let mut moves = Vec::new();
        for (pos, tile) in self.board.iter() {
            if !tile.is_owned_by(player) {
                continue;
            }
            for direction in ALL_DIRECTIONS {
                if let Some(target) = self.board.step(pos, direction) {
                    if self.board[target].kind != TileType::Mountain {
                        moves.push(Move::new(player, pos, direction));
                    }
                }
            }
        }
        moves
    }

    // ========================================================================
    // MOVE APPLICATION
    // ========================================================================

    /// Resolve one move. Illegal moves are silently ignored.
    pub fn apply(&mut self, mv: Move) {
        let source = match self.board.get(mv.from) {
            Some(tile) => *tile,
            None => return,
        };
        if source.owner != Some(mv.player) || source.army <= 1 {
            return;
        }

        let to = match self.board.step(mv.from, mv.direction) {
            Some(pos) => pos,
            None => return,
        };
        if self.board[to].kind == TileType::Mountain {
            return;
        }

        let moving = source.army - 1;
        self.board[mv.from].army = 1;

        let target = &mut self.board[to];
        if target.owner == Some(mv.player) {
            target.army += moving;
            return;
        }

        let delta = moving as i64 - target.army as i64;
        target.army = delta.unsigned_abs() as u32;
        if delta <= 0 {
            // Defender holds, even at zero army
            return;
        }

        let previous = target.owner.replace(mv.player);
        if target.kind == TileType::General {
            target.kind = TileType::City;
            if let Some(victim) = previous {
                self.eliminate(victim);
            }
        }
    }

    /// Apply one joint move (indexed by player, `None` = pass) in player order,
    /// then advance the clock
    pub fn play_round(&mut self, moves: &[Option<Move>]) {
        for mv in moves.iter().flatten() {
            self.apply(*mv);
        }
        self.next_tick();
    }

    fn eliminate(&mut self, victim: PlayerId) {
        if let Some(info) = self.players.get_mut(victim.index()) {
            if info.alive {
                info.alive = false;
                self.alive_count -= 1;
                tracing::debug!(player = %victim, tick = self.tick, "player eliminated");
            }
        }
    }

    // ========================================================================
    // INCOME
    // ========================================================================

    /// Advance one tick and pay income
    pub fn next_tick(&mut self) {
        self.tick += 1;
        let land_tick = self.tick % LAND_INCOME_PERIOD == 0;

        for tile in self.board.tiles_mut() {
            if tile.has_tick_income() || (land_tick && tile.has_land_income()) {
                tile.army += 1;
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
