/// Cell types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellType {
    Solid,
    Empty,
    Entrance,
    Exit,
}

impl CellType {
    /// Impassable; drawn as the walls of its neighbours, never as a cell.
    pub fn is_solid(self) -> bool {
        matches!(self, CellType::Solid)
    }

    /// Wire value for the maze record.
    pub fn to_u8(self) -> u8 {
        match self {
            CellType::Solid    => 0,
            CellType::Empty    => 1,
            CellType::Entrance => 2,
            CellType::Exit     => 3,
        }
    }

    pub fn from_u8(v: u8) -> Option<CellType> {
        match v {
            0 => Some(CellType::Solid),
            1 => Some(CellType::Empty),
            2 => Some(CellType::Entrance),
            3 => Some(CellType::Exit),
            _ => None,
        }
    }
}

impl Default for CellType {
    fn default() -> Self {
        CellType::Solid
    }
}
