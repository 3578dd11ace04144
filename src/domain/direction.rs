/// Direction-relative coordinate math.
///
/// Grid axes: north = -y, south = +y, east = +x, west = -x.
/// "Left" and "right" rotate the forward axis by 90 degrees, so the
/// (ahead, left, right) triple forms a rotated frame for each facing.

/// A grid coordinate. Signed so that offsets past the border stay
/// representable; out-of-bounds cells are simply solid.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    fn offset(self, dx: i32, dy: i32) -> Self {
        Coord { x: self.x + dx, y: self.y + dy }
    }
}

/// Cardinal facing. Closed domain: there is no "invalid direction".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Unit step along this direction.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East  => (1, 0),
            Direction::West  => (-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East  => Direction::West,
            Direction::West  => Direction::East,
        }
    }

    /// Quarter turn counter-clockwise: N -> W -> S -> E -> N.
    pub fn turned_left(self) -> Direction {
        match self {
            Direction::North => Direction::West,
            Direction::West  => Direction::South,
            Direction::South => Direction::East,
            Direction::East  => Direction::North,
        }
    }

    /// Quarter turn clockwise: N -> E -> S -> W -> N.
    pub fn turned_right(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East  => Direction::South,
            Direction::South => Direction::West,
            Direction::West  => Direction::North,
        }
    }

    /// Compass needle rotation in degrees, clockwise in screen space.
    /// The unrotated needle points down (south).
    pub fn compass_angle(self) -> u16 {
        match self {
            Direction::North => 180,
            Direction::South => 0,
            Direction::East  => 270,
            Direction::West  => 90,
        }
    }

    /// Stable wire value used by the save format.
    pub fn to_u8(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East  => 2,
            Direction::West  => 3,
        }
    }

    pub fn from_u8(v: u8) -> Option<Direction> {
        match v {
            0 => Some(Direction::North),
            1 => Some(Direction::South),
            2 => Some(Direction::East),
            3 => Some(Direction::West),
            _ => None,
        }
    }
}

/// The cell `distance` steps ahead of `from` along `dir`.
#[inline]
pub fn cell_ahead(from: Coord, dir: Direction, distance: i32) -> Coord {
    let (dx, dy) = dir.delta();
    from.offset(dx * distance, dy * distance)
}

/// The cell `distance` steps to the left of `from`, as seen facing `dir`.
#[inline]
pub fn cell_to_left(from: Coord, dir: Direction, distance: i32) -> Coord {
    cell_ahead(from, dir.turned_left(), distance)
}

/// The cell `distance` steps to the right of `from`, as seen facing `dir`.
#[inline]
pub fn cell_to_right(from: Coord, dir: Direction, distance: i32) -> Coord {
    cell_ahead(from, dir.turned_right(), distance)
}
