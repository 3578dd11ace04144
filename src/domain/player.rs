/// Player progress: position, facing and the saturating counters.

use super::direction::{Coord, Direction};
use super::grid::{MazeGrid, MAX_SECONDS};

pub const MAX_LEVEL: u16 = 9999;
pub const MAX_POINTS: u32 = 999_999_999;

/// Closed set of achievements. The discriminant is the persisted bit index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Achievement {
    Addicted = 0,
    Speedy = 1,
    SuperSpeedy = 2,
    FellAsleep = 3,
    Novice = 4,
    Apprentice = 5,
    Journeyman = 6,
    Master = 7,
    Dedicated = 8,
    Devoted = 9,
    Obsessed = 10,
    Fanatical = 11,
}

impl Achievement {
    pub const COUNT: usize = 12;

    pub const ALL: [Achievement; Achievement::COUNT] = [
        Achievement::Addicted,
        Achievement::Speedy,
        Achievement::SuperSpeedy,
        Achievement::FellAsleep,
        Achievement::Novice,
        Achievement::Apprentice,
        Achievement::Journeyman,
        Achievement::Master,
        Achievement::Dedicated,
        Achievement::Devoted,
        Achievement::Obsessed,
        Achievement::Fanatical,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Achievement::Addicted    => "Addicted",
            Achievement::Speedy      => "Speedy",
            Achievement::SuperSpeedy => "Super Speedy",
            Achievement::FellAsleep  => "Fell Asleep",
            Achievement::Novice      => "Novice",
            Achievement::Apprentice  => "Apprentice",
            Achievement::Journeyman  => "Journeyman",
            Achievement::Master      => "Master",
            Achievement::Dedicated   => "Dedicated",
            Achievement::Devoted     => "Devoted",
            Achievement::Obsessed    => "Obsessed",
            Achievement::Fanatical   => "Fanatical",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Achievement::Addicted    => "Reached the max. number of points!",
            Achievement::Speedy      => "Completed a maze in < 30 seconds!",
            Achievement::SuperSpeedy => "Completed a maze in < 10 seconds!",
            Achievement::FellAsleep  => "In a maze for one hour!",
            Achievement::Novice      => "Completed your first maze!",
            Achievement::Apprentice  => "Reached level 10!",
            Achievement::Journeyman  => "Reached level 50!",
            Achievement::Master      => "Reached level 100!",
            Achievement::Dedicated   => "Reached level 500!",
            Achievement::Devoted     => "Reached level 1000!",
            Achievement::Obsessed    => "Reached level 5000!",
            Achievement::Fanatical   => "Completed level 9999!",
        }
    }

    /// The achievement earned by arriving at exactly `level`, if any.
    pub fn for_level(level: u16) -> Option<Achievement> {
        match level {
            2    => Some(Achievement::Novice),
            10   => Some(Achievement::Apprentice),
            50   => Some(Achievement::Journeyman),
            100  => Some(Achievement::Master),
            500  => Some(Achievement::Dedicated),
            1000 => Some(Achievement::Devoted),
            5000 => Some(Achievement::Obsessed),
            _ => None,
        }
    }
}

/// Monotonic flag set, one bit per achievement.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct AchievementSet(u16);

impl AchievementSet {
    const MASK: u16 = (1 << Achievement::COUNT) - 1;

    /// Unknown high bits are dropped.
    pub fn from_bits(bits: u16) -> Self {
        AchievementSet(bits & Self::MASK)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, a: Achievement) -> bool {
        self.0 & (1 << a.index()) != 0
    }

    /// Set a flag. Returns true only on the unset -> set transition.
    pub fn unlock(&mut self, a: Achievement) -> bool {
        if self.contains(a) {
            return false;
        }
        self.0 |= 1 << a.index();
        true
    }

    /// Clear and return the lowest-index flag.
    pub fn take_first(&mut self) -> Option<Achievement> {
        let first = self.iter().next()?;
        self.0 &= !(1 << first.index());
        Some(first)
    }

    pub fn iter(self) -> impl Iterator<Item = Achievement> {
        Achievement::ALL.into_iter().filter(move |a| self.contains(*a))
    }

    #[cfg(test)]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[cfg(test)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Player {
    pub position: Coord,
    pub direction: Direction,
    pub level: u16,
    pub best_time: u16,
    pub points: u32,
    pub achievements: AchievementSet,
}

impl Player {
    pub fn new() -> Self {
        Player {
            position: Coord::default(),
            direction: Direction::North,
            level: 1,
            best_time: MAX_SECONDS,
            points: 0,
            achievements: AchievementSet::default(),
        }
    }

    /// Stand on the entrance facing the maze's starting direction.
    pub fn enter(&mut self, maze: &MazeGrid) {
        self.position = maze.entrance;
        self.direction = maze.starting_direction;
    }

    /// Mazes finished so far. A player parked at the level cap who has
    /// completed it counts the cap itself.
    pub fn mazes_completed(&self) -> u16 {
        if self.level == MAX_LEVEL && self.achievements.contains(Achievement::Fanatical) {
            MAX_LEVEL
        } else {
            self.level.saturating_sub(1)
        }
    }

    /// Best time is meaningless before the first completion.
    pub fn has_best_time(&self) -> bool {
        self.level > 1
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_table_order() {
        for (i, a) in Achievement::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
            assert!(!a.name().is_empty());
            assert!(a.description().ends_with('!'));
        }
    }

    #[test]
    fn unlock_reports_only_the_first_transition() {
        let mut set = AchievementSet::default();
        assert!(set.unlock(Achievement::FellAsleep));
        assert!(!set.unlock(Achievement::FellAsleep));
        assert!(set.contains(Achievement::FellAsleep));
        assert_eq!(set.len(), 1);
        assert_eq!(set.bits(), 1 << 3);
    }

    #[test]
    fn take_first_drains_in_index_order() {
        let mut set = AchievementSet::default();
        set.unlock(Achievement::Master);
        set.unlock(Achievement::Speedy);
        assert_eq!(set.take_first(), Some(Achievement::Speedy));
        assert_eq!(set.take_first(), Some(Achievement::Master));
        assert_eq!(set.take_first(), None);
    }

    #[test]
    fn from_bits_drops_unknown_flags() {
        let set = AchievementSet::from_bits(0xFFFF);
        assert_eq!(set.len(), Achievement::COUNT);
        assert_eq!(set.iter().count(), Achievement::COUNT);
    }

    #[test]
    fn level_milestones() {
        assert_eq!(Achievement::for_level(2), Some(Achievement::Novice));
        assert_eq!(Achievement::for_level(5000), Some(Achievement::Obsessed));
        assert_eq!(Achievement::for_level(3), None);
        assert_eq!(Achievement::for_level(MAX_LEVEL), None);
    }

    #[test]
    fn fresh_player_defaults() {
        let p = Player::new();
        assert_eq!(p.level, 1);
        assert_eq!(p.best_time, MAX_SECONDS);
        assert_eq!(p.points, 0);
        assert!(p.achievements.is_empty());
        assert!(!p.has_best_time());
        assert_eq!(p.mazes_completed(), 0);
    }

    #[test]
    fn mazes_completed_at_the_cap() {
        let mut p = Player::new();
        p.level = MAX_LEVEL;
        assert_eq!(p.mazes_completed(), MAX_LEVEL - 1);
        p.achievements.unlock(Achievement::Fanatical);
        assert_eq!(p.mazes_completed(), MAX_LEVEL);
    }
}
