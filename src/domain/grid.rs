/// MazeGrid: cell storage plus maze metadata.
///
/// Storage is a fixed-capacity flat array sized for the largest maze,
/// indexed `y * MAX_SIDE + x`. Only `[0, width) x [0, height)` is active.
///
/// Two accessors with different contracts:
///   - `get()`  checked, `None` outside the active extents.
///   - `cell()` total, anything outside the active extents is `Solid`.
///
/// Everything that renders or moves uses `cell()` / `is_solid()`, so the
/// "outside is wall" rule lives in exactly one place.

use super::cell::CellType;
use super::direction::{Coord, Direction};

pub const MIN_SIDE: i32 = 10;
pub const MAX_SIDE: i32 = 20;
pub const CAPACITY: usize = (MAX_SIDE * MAX_SIDE) as usize;

/// Elapsed-time ceiling: 59:59.
pub const MAX_SECONDS: u16 = 3599;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MazeGrid {
    cells: [CellType; CAPACITY],
    width: i32,
    height: i32,
    pub entrance: Coord,
    pub exit: Coord,
    pub starting_direction: Direction,
    elapsed_seconds: u16,
}

impl MazeGrid {
    /// A fully solid grid with the given active extents.
    /// Extents are clamped into `[MIN_SIDE, MAX_SIDE]`.
    pub fn solid(width: i32, height: i32) -> Self {
        MazeGrid {
            cells: [CellType::Solid; CAPACITY],
            width: width.clamp(MIN_SIDE, MAX_SIDE),
            height: height.clamp(MIN_SIDE, MAX_SIDE),
            entrance: Coord::default(),
            exit: Coord::default(),
            starting_direction: Direction::North,
            elapsed_seconds: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn area(&self) -> u32 {
        (self.width * self.height) as u32
    }

    #[inline]
    pub fn in_bounds(&self, c: Coord) -> bool {
        c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height
    }

    #[inline]
    fn index(&self, c: Coord) -> Option<usize> {
        if self.in_bounds(c) {
            Some((c.y * MAX_SIDE + c.x) as usize)
        } else {
            None
        }
    }

    /// Checked read of an active cell.
    #[inline]
    pub fn get(&self, c: Coord) -> Option<CellType> {
        self.index(c).map(|i| self.cells[i])
    }

    /// Total read: out-of-bounds cells are solid.
    #[inline]
    pub fn cell(&self, c: Coord) -> CellType {
        self.get(c).unwrap_or(CellType::Solid)
    }

    #[inline]
    pub fn is_solid(&self, c: Coord) -> bool {
        self.cell(c).is_solid()
    }

    /// Write an active cell. Returns false (and writes nothing) outside
    /// the active extents.
    pub fn set(&mut self, c: Coord, t: CellType) -> bool {
        match self.index(c) {
            Some(i) => {
                self.cells[i] = t;
                true
            }
            None => false,
        }
    }

    pub fn elapsed_seconds(&self) -> u16 {
        self.elapsed_seconds
    }

    /// Store an elapsed time, clamped to `MAX_SECONDS`.
    /// Returns true if clamping was necessary.
    pub fn set_elapsed_seconds(&mut self, secs: u32) -> bool {
        if secs > MAX_SECONDS as u32 {
            self.elapsed_seconds = MAX_SECONDS;
            true
        } else {
            self.elapsed_seconds = secs as u16;
            false
        }
    }

    /// Iterate all active coordinates in row-major order.
    #[cfg(test)]
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coord::new(x, y)))
    }

    /// Raw row-major view over the full capacity, for the save codec.
    pub(crate) fn raw_cells(&self) -> &[CellType; CAPACITY] {
        &self.cells
    }

    pub(crate) fn raw_cells_mut(&mut self) -> &mut [CellType; CAPACITY] {
        &mut self.cells
    }
}
