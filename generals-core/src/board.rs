//! Grid geometry, tiles, and the row-major board

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest supported side length (coordinates are stored as `u8`)
pub const MAX_SIDE: usize = u8::MAX as usize;

/// Player identifier, 0-based in roster order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Grid coordinate: `x` is the column, `y` is the row (rows grow downward)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: u8,
    pub y: u8,
}

impl Coord {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Check if this coordinate lies inside a `width x height` grid
    pub fn in_bounds(&self, width: usize, height: usize) -> bool {
        (self.x as usize) < width && (self.y as usize) < height
    }

    /// Apply a signed offset, returning `None` when the result leaves the grid
    pub fn offset(&self, dx: i8, dy: i8, width: usize, height: usize) -> Option<Coord> {
        let x = self.x as i16 + dx as i16;
        let y = self.y as i16 + dy as i16;
        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            return None;
        }
        Some(Coord::new(x as u8, y as u8))
    }

    /// Step one tile in a direction, bounds-checked
    pub fn step(&self, direction: Direction, width: usize, height: usize) -> Option<Coord> {
        let (dx, dy) = direction.delta();
        self.offset(dx, dy, width, height)
    }

    /// Manhattan distance between two coordinates
    pub fn manhattan(&self, other: Coord) -> u32 {
        (self.x as i32 - other.x as i32).unsigned_abs()
            + (self.y as i32 - other.y as i32).unsigned_abs()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Movement direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

/// Direction vectors `(dx, dy)`, indexed by `Direction as usize`
/// Index: 0=Up, 1=Down, 2=Left, 3=Right
pub const DIRECTIONS: [(i8, i8); 4] = [
    (0, -1), // Up
    (0, 1),  // Down
    (-1, 0), // Left
    (1, 0),  // Right
];

/// All directions in canonical order
pub const ALL_DIRECTIONS: [Direction; 4] =
    [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

impl Direction {
    pub const fn delta(self) -> (i8, i8) {
        DIRECTIONS[self as usize]
    }

    pub fn from_index(index: usize) -> Option<Direction> {
        ALL_DIRECTIONS.get(index).copied()
    }
}

/// Offsets of the 8 surrounding tiles plus the tile itself
pub const NEARBY: [(i8, i8); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

// ============================================================================
// TILES
// ============================================================================

/// Terrain / structure of a tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Blank,
    Mountain,
    City,
    General,
}

/// A single grid cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileType,
    pub owner: Option<PlayerId>,
    pub army: u32,
}

impl Tile {
    pub const BLANK: Tile = Tile { kind: TileType::Blank, owner: None, army: 0 };
    pub const MOUNTAIN: Tile = Tile { kind: TileType::Mountain, owner: None, army: 0 };

    pub const fn new(kind: TileType, owner: Option<PlayerId>, army: u32) -> Self {
        Self { kind, owner, army }
    }

    /// Unclaimed city with a garrison
    pub const fn city(army: u32) -> Self {
        Self { kind: TileType::City, owner: None, army }
    }

    /// Freshly placed general
    pub const fn general(owner: PlayerId) -> Self {
        Self { kind: TileType::General, owner: Some(owner), army: 1 }
    }

    /// Owned blank tile
    pub const fn land(owner: PlayerId, army: u32) -> Self {
        Self { kind: TileType::Blank, owner: Some(owner), army }
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Tiles that gain income every tick regardless of the tick number
    pub fn has_tick_income(&self) -> bool {
        match self.kind {
            TileType::General => true,
            TileType::City => self.owner.is_some(),
            TileType::Blank | TileType::Mountain => false,
        }
    }

    /// Tiles that gain income only on the periodic land tick
    pub fn has_land_income(&self) -> bool {
        match self.kind {
            TileType::Blank => self.owner.is_some(),
            TileType::Mountain | TileType::City | TileType::General => false,
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::BLANK
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Fixed-size row-major grid of tiles
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Board {
    /// Create a board filled with unclaimed blank tiles
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::BLANK; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells
    pub fn cells(&self) -> usize {
        self.tiles.len()
    }

    /// Row-major index of a coordinate
    pub fn index_of(&self, pos: Coord) -> usize {
        pos.y as usize * self.width + pos.x as usize
    }

    /// Coordinate of a row-major index
    pub fn coord_of(&self, index: usize) -> Coord {
        Coord::new((index % self.width) as u8, (index / self.width) as u8)
    }

    pub fn contains(&self, pos: Coord) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    pub fn get(&self, pos: Coord) -> Option<&Tile> {
        if !self.contains(pos) {
            return None;
        }
        self.tiles.get(self.index_of(pos))
    }

    pub fn get_mut(&mut self, pos: Coord) -> Option<&mut Tile> {
        if !self.contains(pos) {
            return None;
        }
        let idx = self.index_of(pos);
        self.tiles.get_mut(idx)
    }

    /// Raw tile storage, row-major
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Iterate `(coord, tile)` pairs in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Tile)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| (self.coord_of(i), tile))
    }

    /// Step from `pos` in `direction`, bounds-checked
    pub fn step(&self, pos: Coord, direction: Direction) -> Option<Coord> {
        pos.step(direction, self.width, self.height)
    }

    /// In-bounds coordinates of the tile and its 8 surrounding tiles
    pub fn nearby(&self, pos: Coord) -> impl Iterator<Item = Coord> + '_ {
        NEARBY
            .iter()
            .filter_map(move |&(dx, dy)| pos.offset(dx, dy, self.width, self.height))
    }
}

impl std::ops::Index<Coord> for Board {
    type Output = Tile;

    fn index(&self, pos: Coord) -> &Tile {
        &self.tiles[self.index_of(pos)]
    }
}

impl std::ops::IndexMut<Coord> for Board {
    fn index_mut(&mut self, pos: Coord) -> &mut Tile {
        let idx = self.index_of(pos);
        &mut self.tiles[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_table() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Right.delta(), (1, 0));
        for (i, dir) in ALL_DIRECTIONS.iter().enumerate() {
            assert_eq!(Direction::from_index(i), Some(*dir));
        }
        assert_eq!(Direction::from_index(4), None);
    }

    #[test]
    fn test_step_bounds() {
        let origin = Coord::new(0, 0);
        assert_eq!(origin.step(Direction::Up, 3, 3), None);
        assert_eq!(origin.step(Direction::Left, 3, 3), None);
        assert_eq!(origin.step(Direction::Right, 3, 3), Some(Coord::new(1, 0)));
        assert_eq!(origin.step(Direction::Down, 3, 3), Some(Coord::new(0, 1)));

        let corner = Coord::new(2, 2);
        assert_eq!(corner.step(Direction::Right, 3, 3), None);
        assert_eq!(corner.step(Direction::Down, 3, 3), None);
    }

    #[test]
    fn test_manhattan() {
        assert_eq!(Coord::new(0, 0).manhattan(Coord::new(3, 4)), 7);
        assert_eq!(Coord::new(5, 1).manhattan(Coord::new(2, 1)), 3);
    }

    #[test]
    fn test_row_major_layout() {
        let board = Board::new(4, 3);
        assert_eq!(board.cells(), 12);
        assert_eq!(board.index_of(Coord::new(1, 2)), 9);
        assert_eq!(board.coord_of(9), Coord::new(1, 2));

        let coords: Vec<Coord> = board.iter().map(|(c, _)| c).collect();
        assert_eq!(coords[0], Coord::new(0, 0));
        assert_eq!(coords[3], Coord::new(3, 0));
        assert_eq!(coords[4], Coord::new(0, 1));
    }

    #[test]
    fn test_iteration_is_restartable() {
        let board = Board::new(2, 2);
        assert_eq!(board.iter().count(), 4);
        assert_eq!(board.iter().count(), 4);
    }

    #[test]
    fn test_nearby_clipped_at_corner() {
        let board = Board::new(3, 3);
        assert_eq!(board.nearby(Coord::new(0, 0)).count(), 4);
        assert_eq!(board.nearby(Coord::new(1, 1)).count(), 9);
        assert_eq!(board.nearby(Coord::new(2, 1)).count(), 6);
    }

    #[test]
    fn test_income_eligibility() {
        let p = PlayerId(0);
        assert!(Tile::general(p).has_tick_income());
        assert!(!Tile::city(40).has_tick_income());
        assert!(Tile::new(TileType::City, Some(p), 5).has_tick_income());
        assert!(Tile::land(p, 2).has_land_income());
        assert!(!Tile::BLANK.has_land_income());
        assert!(!Tile::MOUNTAIN.has_tick_income());
        assert!(!Tile::MOUNTAIN.has_land_income());
    }
}
