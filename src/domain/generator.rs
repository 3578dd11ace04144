/// Maze generator: randomized carving from entrance to exit.
///
/// ## Algorithm
///
///   1. Draw width and height uniformly from `[MIN_SIDE, MAX_SIDE]`.
///   2. Fill the active grid with `Solid`.
///   3. Pick a random side. The entrance goes in the near quarter on that
///      side, the exit in the far quarter on the opposite side.
///   4. Carve: a walker starts on the entrance with a random heading. Each
///      step it empties its cell (never the entrance), advances one cell
///      (clamped at the border), and with `turn_percent` chance re-rolls its
///      heading. It stops on the exit, which is then marked `Exit`.
///   5. Try the four headings in random order until one faces an open
///      neighbour of the entrance; that becomes the starting direction.
///
/// The walk is connected by construction, so entrance → exit is always
/// reachable. It terminates with probability 1 but has no natural bound, so
/// the walk is capped at `width * height * CARVE_STEPS_PER_CELL` steps.
/// A capped attempt is thrown away and a fresh maze is drawn.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use super::cell::CellType;
use super::direction::{cell_ahead, Coord, Direction};
use super::grid::{MazeGrid, MAX_SIDE, MIN_SIDE};
use crate::error::GenerationError;

pub const CARVE_STEPS_PER_CELL: usize = 50;
pub const MAX_ATTEMPTS: usize = 16;
pub const DEFAULT_TURN_PERCENT: u32 = 25;

/// Outcome of a single successful carve.
#[derive(Clone, Debug)]
pub struct Carved {
    pub grid: MazeGrid,
    pub carve_steps: usize,
}

pub struct MazeGenerator {
    rng: ChaCha8Rng,
    turn_percent: u32,
}

impl MazeGenerator {
    /// Seeded generators are fully deterministic; `None` seeds from entropy.
    pub fn new(seed: Option<u64>, turn_percent: u32) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        MazeGenerator {
            rng,
            // 0% would never turn and could never leave a straight line.
            turn_percent: turn_percent.clamp(1, 100),
        }
    }

    #[cfg(test)]
    pub fn from_seed(seed: u64) -> Self {
        Self::new(Some(seed), DEFAULT_TURN_PERCENT)
    }

    /// Shared randomness for other per-maze choices (e.g. message text).
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Produce a complete maze. Never fails: after `MAX_ATTEMPTS` capped
    /// walks it falls back to a plain corridor.
    pub fn generate(&mut self) -> MazeGrid {
        let mut last = (MIN_SIDE, MIN_SIDE);
        for attempt in 1..=MAX_ATTEMPTS {
            let width = self.rng.gen_range(MIN_SIDE..=MAX_SIDE);
            let height = self.rng.gen_range(MIN_SIDE..=MAX_SIDE);
            last = (width, height);
            match self.generate_sized(width, height) {
                Ok(carved) => {
                    debug!(
                        width, height, attempt,
                        steps = carved.carve_steps,
                        "maze generated"
                    );
                    return carved.grid;
                }
                Err(e) => warn!(attempt, width, height, "maze generation retry: {e}"),
            }
        }
        warn!("falling back to corridor maze");
        self.corridor(last.0, last.1)
    }

    /// One carve attempt with fixed extents.
    pub fn generate_sized(&mut self, width: i32, height: i32) -> Result<Carved, GenerationError> {
        let mut grid = MazeGrid::solid(width, height);
        let (entrance, exit) = self.place_endpoints(&grid);
        grid.entrance = entrance;
        grid.exit = exit;
        grid.set(entrance, CellType::Entrance);

        let limit = grid.area() as usize * CARVE_STEPS_PER_CELL;
        let carve_steps = self.carve(&mut grid, limit)?;
        grid.set(exit, CellType::Exit);

        grid.starting_direction = self.pick_starting_direction(&grid);
        grid.set_elapsed_seconds(0);
        Ok(Carved { grid, carve_steps })
    }

    fn place_endpoints(&mut self, grid: &MazeGrid) -> (Coord, Coord) {
        let side = *Direction::ALL.choose(&mut self.rng).unwrap_or(&Direction::North);
        let entrance = self.point_near_side(grid, side);
        let exit = self.point_near_side(grid, side.opposite());
        (entrance, exit)
    }

    /// A random cell within the quarter of the grid adjacent to `side`.
    fn point_near_side(&mut self, grid: &MazeGrid, side: Direction) -> Coord {
        let (w, h) = (grid.width(), grid.height());
        let (qw, qh) = (w / 4, h / 4);
        let rng = &mut self.rng;
        match side {
            Direction::North => Coord::new(rng.gen_range(0..w), rng.gen_range(0..qh)),
            Direction::South => Coord::new(rng.gen_range(0..w), h - 1 - rng.gen_range(0..qh)),
            Direction::East  => Coord::new(w - 1 - rng.gen_range(0..qw), rng.gen_range(0..h)),
            Direction::West  => Coord::new(rng.gen_range(0..qw), rng.gen_range(0..h)),
        }
    }

    /// Random walk from the entrance until it lands on the exit.
    /// Returns the number of steps taken.
    fn carve(&mut self, grid: &mut MazeGrid, limit: usize) -> Result<usize, GenerationError> {
        let exit = grid.exit;
        let mut pos = grid.entrance;
        let mut heading = self.random_direction();
        let mut steps = 0usize;

        while pos != exit {
            if steps >= limit {
                return Err(GenerationError::CarveLimit { limit });
            }
            steps += 1;

            if grid.cell(pos) != CellType::Entrance {
                grid.set(pos, CellType::Empty);
            }
            let next = cell_ahead(pos, heading, 1);
            if grid.in_bounds(next) {
                pos = next;
            }
            if self.rng.gen_range(0..100) < self.turn_percent {
                heading = self.random_direction();
            }
        }
        Ok(steps)
    }

    /// First heading (in random order) that faces an open cell.
    /// Falls back to the last heading tried.
    fn pick_starting_direction(&mut self, grid: &MazeGrid) -> Direction {
        let mut order = Direction::ALL;
        order.shuffle(&mut self.rng);
        order
            .iter()
            .copied()
            .find(|&d| !grid.is_solid(cell_ahead(grid.entrance, d, 1)))
            .unwrap_or(order[order.len() - 1])
    }

    fn random_direction(&mut self) -> Direction {
        Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())]
    }

    /// Last-resort maze: an L-shaped corridor from entrance to exit.
    fn corridor(&mut self, width: i32, height: i32) -> MazeGrid {
        let mut grid = MazeGrid::solid(width, height);
        let (entrance, exit) = self.place_endpoints(&grid);
        grid.entrance = entrance;
        grid.exit = exit;

        let mut pos = entrance;
        while pos.x != exit.x {
            pos.x += (exit.x - pos.x).signum();
            grid.set(pos, CellType::Empty);
        }
        while pos.y != exit.y {
            pos.y += (exit.y - pos.y).signum();
            grid.set(pos, CellType::Empty);
        }
        grid.set(entrance, CellType::Entrance);
        grid.set(exit, CellType::Exit);
        grid.starting_direction = self.pick_starting_direction(&grid);
        grid
    }
}

/// Flood fill over passable cells. Used by tests and to reject
/// disconnected save records.
pub fn reachable(grid: &MazeGrid, from: Coord, to: Coord) -> bool {
    if grid.is_solid(from) || grid.is_solid(to) {
        return false;
    }
    let mut seen = vec![false; (MAX_SIDE * MAX_SIDE) as usize];
    let mut stack = vec![from];
    while let Some(c) = stack.pop() {
        if c == to {
            return true;
        }
        let idx = (c.y * MAX_SIDE + c.x) as usize;
        if seen[idx] {
            continue;
        }
        seen[idx] = true;
        for d in Direction::ALL {
            let n = cell_ahead(c, d, 1);
            if !grid.is_solid(n) {
                stack.push(n);
            }
        }
    }
    false
}
