//! Board geometry: square grid coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid coordinate (row, col). Signed so off-board neighbors can be
/// represented before validity filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: i8,
    pub col: i8,
}

/// Orthogonal direction vectors (d_row, d_col): up, left, down, right.
pub const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// All 8 surrounding vectors, orthogonals plus diagonals.
pub const SURROUNDING: [(i8, i8); 8] = [
    (-1, 0),
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

impl Coord {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    /// The 4 orthogonally adjacent coordinates (movement/attack/repair range).
    pub fn adjacent(&self) -> impl Iterator<Item = Coord> + '_ {
        ORTHOGONAL
            .iter()
            .map(move |&(dr, dc)| Coord::new(self.row + dr, self.col + dc))
    }

    /// All 8 surrounding coordinates (self-destruct blast area).
    pub fn surrounding(&self) -> impl Iterator<Item = Coord> + '_ {
        SURROUNDING
            .iter()
            .map(move |&(dr, dc)| Coord::new(self.row + dr, self.col + dc))
    }

    pub fn is_adjacent_to(&self, other: Coord) -> bool {
        self.adjacent().any(|c| c == other)
    }

    /// Straight-line distance, used by the Virus proximity bonus.
    pub fn euclidean_distance_to(&self, other: Coord) -> f64 {
        let dr = (other.row - self.row) as f64;
        let dc = (other.col - self.col) as f64;
        (dr * dr + dc * dc).sqrt()
    }
}

impl fmt::Display for Coord {
    /// Letter row + digit column, e.g. "A3".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = if (0..26).contains(&self.row) {
            (b'A' + self.row as u8) as char
        } else {
            '?'
        };
        let col = if (0..16).contains(&self.col) {
            char::from_digit(self.col as u32, 16).unwrap_or('?')
        } else {
            '?'
        };
        write!(f, "{}{}", row, col)
    }
}
