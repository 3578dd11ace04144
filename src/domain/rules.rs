/// Movement legality and completion scoring, table driven.
///
/// Pure functions over maze and player state. They decide what is legal and
/// what a completion is worth; `sim::step` performs the mutation.
///
/// ## Movement Truth Table
///
/// ┌──────────────────────────────┬───────────┐
/// │ Condition                     │ Allow?    │
/// ├──────────────────────────────┼───────────┤
/// │ Dest out of active extents    │ DENY      │
/// │ Dest cell Solid               │ DENY      │
/// │ Dest Empty / Entrance / Exit  │ ALLOW     │
/// └──────────────────────────────┴───────────┘
///
/// ## Completion Scoring
///
/// ┌──────────────────────────────┬────────────────────────────────┐
/// │ Quantity                      │ Rule                            │
/// ├──────────────────────────────┼────────────────────────────────┤
/// │ base points                   │ area / 10, rounded half up      │
/// │ time bonus cap                │ ceil(area / 2)                  │
/// │ time bonus                    │ cap - elapsed, if elapsed < cap │
/// │ points total                  │ saturates at MAX_POINTS         │
/// │ level                         │ +1, stops at MAX_LEVEL          │
/// │ best time                     │ min(best, elapsed)              │
/// └──────────────────────────────┴────────────────────────────────┘
///
/// ## Achievement Triggers
///
/// ┌──────────────────────────────┬─────────────┐
/// │ Condition                     │ Unlocks     │
/// ├──────────────────────────────┼─────────────┤
/// │ points hit MAX_POINTS         │ Addicted    │
/// │ completed while at MAX_LEVEL  │ Fanatical   │
/// │ elapsed < 30                  │ Speedy      │
/// │ elapsed < 10                  │ SuperSpeedy │
/// │ new level is a milestone      │ Novice..Obsessed │
/// │ timer clamps at MAX_SECONDS   │ FellAsleep (tick, not here) │
/// └──────────────────────────────┴─────────────┘

use super::direction::{cell_ahead, Coord, Direction};
use super::grid::{MazeGrid, MAX_SECONDS};
use super::player::{Achievement, Player, MAX_LEVEL, MAX_POINTS};

pub const SPEEDY_SECONDS: u16 = 30;
pub const SUPER_SPEEDY_SECONDS: u16 = 10;

// ── Movement ──

/// Destination of a one-cell step, or `None` if blocked.
pub fn step_target(maze: &MazeGrid, from: Coord, dir: Direction) -> Option<Coord> {
    let dest = cell_ahead(from, dir, 1);
    if maze.is_solid(dest) {
        None
    } else {
        Some(dest)
    }
}

// ── Scoring ──

pub fn base_points(area: u32) -> u32 {
    area / 10 + u32::from(area % 10 >= 5)
}

pub fn time_bonus_cap(area: u32) -> u32 {
    area / 2 + area % 2
}

/// Points for finishing a maze of `area` cells in `elapsed` seconds.
pub fn points_earned(area: u32, elapsed: u16) -> u32 {
    let cap = time_bonus_cap(area);
    let bonus = cap.saturating_sub(u32::from(elapsed));
    base_points(area) + bonus
}

/// What a completion did to the player.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CompletionReport {
    pub elapsed: u16,
    pub points_earned: u32,
    pub new_best_time: Option<u16>,
    /// Newly unlocked, in trigger order.
    pub unlocked: Vec<Achievement>,
}

/// Apply one completion to the player's counters.
pub fn apply_completion(player: &mut Player, area: u32, elapsed: u16) -> CompletionReport {
    let elapsed = elapsed.min(MAX_SECONDS);
    let earned = points_earned(area, elapsed);
    let mut unlocked = Vec::new();

    let total = u64::from(player.points) + u64::from(earned);
    if total >= u64::from(MAX_POINTS) {
        player.points = MAX_POINTS;
        unlock(player, Achievement::Addicted, &mut unlocked);
    } else {
        player.points = total as u32;
    }

    if player.level < MAX_LEVEL {
        player.level += 1;
    } else {
        unlock(player, Achievement::Fanatical, &mut unlocked);
    }

    let new_best_time = if elapsed < player.best_time {
        player.best_time = elapsed;
        Some(elapsed)
    } else {
        None
    };

    if elapsed < SPEEDY_SECONDS {
        unlock(player, Achievement::Speedy, &mut unlocked);
    }
    if elapsed < SUPER_SPEEDY_SECONDS {
        unlock(player, Achievement::SuperSpeedy, &mut unlocked);
    }
    if let Some(a) = Achievement::for_level(player.level) {
        unlock(player, a, &mut unlocked);
    }

    CompletionReport { elapsed, points_earned: earned, new_best_time, unlocked }
}

fn unlock(player: &mut Player, a: Achievement, out: &mut Vec<Achievement>) {
    if player.achievements.unlock(a) {
        out.push(a);
    }
}

/// `MM:SS`, clamped to 59:59.
pub fn format_time(secs: u32) -> String {
    let s = secs.min(u32::from(MAX_SECONDS));
    format!("{:02}:{:02}", s / 60, s % 60)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::CellType;

    // ── Movement ──

    #[test]
    fn step_into_open_cell() {
        let mut m = MazeGrid::solid(10, 10);
        m.set(Coord::new(5, 5), CellType::Empty);
        m.set(Coord::new(5, 4), CellType::Exit);
        assert_eq!(step_target(&m, Coord::new(5, 5), Direction::North), Some(Coord::new(5, 4)));
    }

    #[test]
    fn step_blocked_by_wall_and_border() {
        let mut m = MazeGrid::solid(10, 10);
        m.set(Coord::new(5, 5), CellType::Empty);
        m.set(Coord::new(0, 0), CellType::Entrance);
        assert_eq!(step_target(&m, Coord::new(5, 5), Direction::North), None);
        assert_eq!(step_target(&m, Coord::new(0, 0), Direction::West), None);
        assert_eq!(step_target(&m, Coord::new(0, 0), Direction::North), None);
    }

    // ── Scoring ──

    #[test]
    fn base_points_round_half_up() {
        assert_eq!(base_points(100), 10);
        assert_eq!(base_points(104), 10);
        assert_eq!(base_points(105), 11);
        assert_eq!(base_points(399), 40);
    }

    #[test]
    fn time_bonus_vanishes_past_half_area() {
        // 11 x 13 = 143 cells: base 14, cap 72.
        assert_eq!(time_bonus_cap(143), 72);
        assert_eq!(points_earned(143, 0), 14 + 72);
        assert_eq!(points_earned(143, 70), 14 + 2);
        assert_eq!(points_earned(143, 72), 14);
        assert_eq!(points_earned(143, 3000), 14);
    }

    #[test]
    fn first_completion() {
        let mut p = Player::new();
        let r = apply_completion(&mut p, 100, 45);
        assert_eq!(p.level, 2);
        assert_eq!(p.points, 10 + 5);
        assert_eq!(r.points_earned, 15);
        assert_eq!(p.best_time, 45);
        assert_eq!(r.new_best_time, Some(45));
        assert_eq!(r.unlocked, vec![Achievement::Novice]);
    }

    #[test]
    fn fast_completion_unlocks_both_speed_flags_once() {
        let mut p = Player::new();
        p.level = 4;
        let r = apply_completion(&mut p, 100, 5);
        assert_eq!(r.unlocked, vec![Achievement::Speedy, Achievement::SuperSpeedy]);
        let r = apply_completion(&mut p, 100, 5);
        assert!(r.unlocked.is_empty());
        assert_eq!(r.new_best_time, None);
    }

    #[test]
    fn best_time_only_improves() {
        let mut p = Player::new();
        apply_completion(&mut p, 100, 40);
        let r = apply_completion(&mut p, 100, 50);
        assert_eq!(r.new_best_time, None);
        assert_eq!(p.best_time, 40);
    }

    #[test]
    fn points_saturate_without_wrapping() {
        let mut p = Player::new();
        p.points = MAX_POINTS - 3;
        let r = apply_completion(&mut p, 400, 0);
        assert_eq!(p.points, MAX_POINTS);
        assert!(r.unlocked.contains(&Achievement::Addicted));
        for _ in 0..50 {
            apply_completion(&mut p, 400, 0);
            assert_eq!(p.points, MAX_POINTS);
        }
    }

    #[test]
    fn level_cap_unlocks_fanatical_instead_of_incrementing() {
        let mut p = Player::new();
        p.level = MAX_LEVEL - 1;
        apply_completion(&mut p, 100, 100);
        assert_eq!(p.level, MAX_LEVEL);
        assert!(!p.achievements.contains(Achievement::Fanatical));
        let r = apply_completion(&mut p, 100, 100);
        assert_eq!(p.level, MAX_LEVEL);
        assert_eq!(r.unlocked, vec![Achievement::Fanatical]);
    }

    #[test]
    fn format_time_clamps() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(75), "01:15");
        assert_eq!(format_time(3599), "59:59");
        assert_eq!(format_time(100_000), "59:59");
    }
}
