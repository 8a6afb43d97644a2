//! Flat action indexing for policy vectors
//!
//! Index layout: `direction * cells + y * width + x`, followed by a single
//! pass slot at `4 * cells`.

use crate::board::{Coord, Direction, PlayerId};
use crate::error::ActionError;
use crate::game::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionSpace {
    width: usize,
    height: usize,
}

impl ActionSpace {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub const fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Length of a policy vector, including the pass slot
    pub const fn size(&self) -> usize {
        4 * self.cells() + 1
    }

    pub const fn pass_index(&self) -> usize {
        4 * self.cells()
    }

    pub fn index(&self, mv: &Move) -> usize {
        mv.direction as usize * self.cells() + mv.from.y as usize * self.width + mv.from.x as usize
    }

    /// Index of an optional move, `None` mapping to the pass slot
    pub fn index_of(&self, mv: Option<&Move>) -> usize {
        mv.map_or(self.pass_index(), |m| self.index(m))
    }

    /// Decode an index back into a move; `Ok(None)` is the pass slot
    pub fn decode(&self, index: usize, player: PlayerId) -> Result<Option<Move>, ActionError> {
        let out_of_range = ActionError::OutOfRange {
            index,
            size: self.size(),
        };
        if index == self.pass_index() {
            return Ok(None);
        }
        let cells = self.cells();
        if index > self.pass_index() || cells == 0 {
            return Err(out_of_range);
        }
        let direction = Direction::from_index(index / cells).ok_or(out_of_range)?;
        let cell = index % cells;
        let from = Coord::new((cell % self.width) as u8, (cell / self.width) as u8);
        Ok(Some(Move::new(player, from, direction)))
    }
}
