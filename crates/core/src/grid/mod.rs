//! Sensor grid: an N×N array of independently guarded cells
//!
//! The grid is created once, never resized, and shared by reference between
//! every concurrent unit of a simulation. All state access goes through a
//! single cell's guard at a time; no method ever holds two guards at once.

pub mod cell;

pub use cell::{Cell, CellState};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default edge length of the grid
pub const DEFAULT_GRID_SIZE: usize = 30;

/// Largest number of cells a grid may hold
pub const MAX_GRID_CELLS: usize = 1 << 20;

/// Row/column position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Row index (0 = top)
    pub row: usize,
    /// Column index (0 = left)
    pub col: usize,
}

impl Coord {
    /// Create a coordinate (not bounds-checked; the grid checks on access)
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Fixed-size square grid of sensor cells
#[derive(Debug)]
pub struct Grid {
    size: usize,
    /// Row-major cell storage
    cells: Vec<Cell>,
}

impl Grid {
    /// Create a `size × size` grid with every cell in the `Sensor` state
    ///
    /// # Panics
    /// Panics if `size` is zero or `size²` exceeds [`MAX_GRID_CELLS`].
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "grid size must be positive");
        let len = cell_count(size)
            .unwrap_or_else(|| panic!("grid size {size} exceeds {MAX_GRID_CELLS} cells"));
        let cells = (0..len).map(|_| Cell::new()).collect();
        Self { size, cells }
    }

    /// Edge length of the grid
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; a grid has at least one cell
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Bounds-checked coordinate constructor
    pub fn try_coord(&self, row: usize, col: usize) -> Option<Coord> {
        (row < self.size && col < self.size).then_some(Coord::new(row, col))
    }

    #[inline]
    fn index(&self, coord: Coord) -> usize {
        assert!(
            coord.row < self.size && coord.col < self.size,
            "coordinate {coord} outside {size}x{size} grid",
            size = self.size
        );
        coord.row * self.size + coord.col
    }

    /// Coordinate of the cell stored at a row-major index
    pub fn coord_of(&self, index: usize) -> Coord {
        assert!(index < self.cells.len(), "cell index {index} out of range");
        Coord::new(index / self.size, index % self.size)
    }

    /// The cell at `coord`
    ///
    /// # Panics
    /// Panics if `coord` lies outside the grid.
    pub fn cell(&self, coord: Coord) -> &Cell {
        &self.cells[self.index(coord)]
    }

    /// Read a cell's state (takes and releases that cell's guard)
    pub fn state(&self, coord: Coord) -> CellState {
        self.cell(coord).state()
    }

    /// Move a cell `from → to` under its guard; see [`Cell::transition`]
    pub fn transition(&self, coord: Coord, from: CellState, to: CellState) -> bool {
        self.cell(coord).transition(from, to)
    }

    /// Whether `coord` lies on the outer edge
    pub fn is_border(&self, coord: Coord) -> bool {
        let last = self.size - 1;
        coord.row == 0 || coord.row == last || coord.col == 0 || coord.col == last
    }

    /// Orthogonal in-bounds neighbors, in the order up, down, left, right
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> {
        let size = self.size;
        let Coord { row, col } = coord;
        [
            row.checked_sub(1).map(|r| Coord::new(r, col)),
            (row + 1 < size).then(|| Coord::new(row + 1, col)),
            col.checked_sub(1).map(|c| Coord::new(row, c)),
            (col + 1 < size).then(|| Coord::new(row, col + 1)),
        ]
        .into_iter()
        .flatten()
    }

    /// Every coordinate in row-major order
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.cells.len()).map(|i| self.coord_of(i))
    }

    /// Copy every cell state, taking one guard at a time
    ///
    /// The copy is not a global atomic instant: watchers keep running while it
    /// is taken, so two cells may be read at slightly different moments.
    pub fn snapshot(&self) -> GridSnapshot {
        let states = self.cells.par_iter().map(Cell::state).collect();
        GridSnapshot {
            size: self.size,
            states,
        }
    }

    /// Number of cells currently in `state`
    pub fn count(&self, state: CellState) -> usize {
        self.cells.par_iter().filter(|c| c.state() == state).count()
    }
}

/// `size²` if it fits under [`MAX_GRID_CELLS`]
pub fn cell_count(size: usize) -> Option<usize> {
    size.checked_mul(size).filter(|&len| len <= MAX_GRID_CELLS)
}

/// Owned, read-only copy of every cell state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    size: usize,
    states: Vec<CellState>,
}

impl GridSnapshot {
    /// Build a snapshot from row-major states
    ///
    /// # Panics
    /// Panics if `states.len() != size * size`.
    pub fn from_states(size: usize, states: Vec<CellState>) -> Self {
        assert_eq!(states.len(), size * size, "snapshot must hold size² states");
        Self { size, states }
    }

    /// Edge length
    pub fn size(&self) -> usize {
        self.size
    }

    /// State at `coord`
    pub fn get(&self, coord: Coord) -> CellState {
        assert!(
            coord.row < self.size && coord.col < self.size,
            "coordinate {coord} outside snapshot"
        );
        self.states[coord.row * self.size + coord.col]
    }

    /// Rows in top-to-bottom order
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.states.chunks(self.size)
    }

    /// Number of cells in `state`
    pub fn count(&self, state: CellState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}

/// Rows of space-separated glyphs, one line per grid row
impl fmt::Display for GridSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for (i, state) in row.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{}", state.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
