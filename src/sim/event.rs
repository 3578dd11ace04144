/// Input actions consumed by the controller, and events it emits.
/// The presentation layer consumes events for sound and persistence.

use crate::domain::direction::{Coord, Direction};
use crate::domain::player::Achievement;

/// Device-independent player intent. Keyboard and gamepad both map here.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    Confirm,
    Cancel,
    Menu,
    Quit,
}

impl Action {
    /// Moves repeat while their key is held; everything else is one-shot.
    pub fn repeats(self) -> bool {
        matches!(self, Action::Forward | Action::Backward)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Moved { to: Coord },
    Bumped,
    Turned { direction: Direction },
    MazeCompleted { points: u32, elapsed: u16 },
    MazeGenerated,
    NewBestTime { seconds: u16 },
    AchievementUnlocked(Achievement),
}
