/// The controller: every mutation of `GameState` happens here, inside
/// one discrete input or timer call.
///
/// Entry points:
///   - `step(state, action)` routes one input action by the top view
///   - `tick(state)` advances the 1 Hz clock
///   - `set_focus(state, focused)` tracks terminal focus
///
/// Each returns the events it produced. Nothing here draws; mutations
/// set `dirty` and the host repaints on its next frame.

use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::domain::cell::CellType;
use crate::domain::direction::Direction;
use crate::domain::player::Achievement;
use crate::domain::rules::{self, format_time};
use super::event::{Action, GameEvent};
use super::narration::{NarrationKind, EXCLAMATIONS};
use super::world::{GameState, MenuItem, Phase};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(state: &mut GameState, action: Action) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if action == Action::Quit {
        state.running = false;
        return events;
    }
    match state.phase() {
        Phase::MainMenu | Phase::InGameMenu => step_menu(state, action, &mut events),
        Phase::Playing => step_playing(state, action, &mut events),
        Phase::Narration => step_narration(state, action),
        Phase::Message => {
            if matches!(action, Action::Confirm | Action::Cancel | Action::Menu) {
                state.pop_view();
            }
        }
    }
    events
}

fn step_playing(state: &mut GameState, action: Action, events: &mut Vec<GameEvent>) {
    match action {
        Action::Forward => {
            move_forward(state, events);
        }
        Action::Backward => {
            move_backward(state, events);
        }
        Action::TurnLeft => turn_left(state, events),
        Action::TurnRight => turn_right(state, events),
        Action::Confirm | Action::Menu => {
            state.menu_cursor = 0;
            state.push_view(Phase::InGameMenu);
        }
        Action::Cancel => {
            state.pop_view();
            state.menu_cursor = 0;
        }
        Action::Quit => {}
    }
}

fn step_menu(state: &mut GameState, action: Action, events: &mut Vec<GameEvent>) {
    let len = state.menu_items().len();
    if len == 0 {
        return;
    }
    match action {
        Action::Forward | Action::TurnLeft => {
            state.menu_cursor = (state.menu_cursor + len - 1) % len;
            state.dirty = true;
        }
        Action::Backward | Action::TurnRight => {
            state.menu_cursor = (state.menu_cursor + 1) % len;
            state.dirty = true;
        }
        Action::Confirm => {
            let item = state.menu_items()[state.menu_cursor.min(len - 1)];
            activate(state, item, events);
        }
        Action::Cancel | Action::Menu => {
            if state.phase() == Phase::MainMenu {
                if action == Action::Cancel {
                    state.running = false;
                }
            } else {
                state.pop_view();
            }
        }
        Action::Quit => {}
    }
}

fn activate(state: &mut GameState, item: MenuItem, events: &mut Vec<GameEvent>) {
    match item {
        MenuItem::Play => state.push_view(Phase::Playing),
        MenuItem::NewMaze => {
            new_maze(state, events);
            state.pop_view();
        }
        MenuItem::Stats => state.show_narration(NarrationKind::Stats),
        MenuItem::Controls => state.show_narration(NarrationKind::Controls),
        MenuItem::About => state.show_narration(NarrationKind::About),
    }
}

fn step_narration(state: &mut GameState, action: Action) {
    match action {
        Action::Confirm | Action::Forward | Action::TurnRight => {
            let advanced = state.narration.as_mut().map_or(false, |n| n.advance());
            if advanced {
                state.dirty = true;
            } else {
                state.pop_view();
            }
        }
        Action::Cancel | Action::Menu => {
            state.pop_view();
        }
        _ => {}
    }
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

/// Step one cell toward `dir` without changing facing.
/// Solid or out-of-bounds destinations leave the state untouched.
pub fn attempt_move(state: &mut GameState, dir: Direction, events: &mut Vec<GameEvent>) -> bool {
    let dest = match rules::step_target(&state.maze, state.player.position, dir) {
        Some(d) => d,
        None => {
            events.push(GameEvent::Bumped);
            return false;
        }
    };
    state.player.position = dest;
    state.dirty = true;
    events.push(GameEvent::Moved { to: dest });
    check_for_completion(state, events);
    true
}

pub fn move_forward(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    let dir = state.player.direction;
    attempt_move(state, dir, events)
}

pub fn move_backward(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    let dir = state.player.direction.opposite();
    attempt_move(state, dir, events)
}

pub fn turn_left(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.player.direction = state.player.direction.turned_left();
    state.dirty = true;
    events.push(GameEvent::Turned { direction: state.player.direction });
}

pub fn turn_right(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.player.direction = state.player.direction.turned_right();
    state.dirty = true;
    events.push(GameEvent::Turned { direction: state.player.direction });
}

// ══════════════════════════════════════════════════════════════
// Completion
// ══════════════════════════════════════════════════════════════

/// Score and replace the maze if the player stands on the exit.
/// One call performs at most one completion.
pub fn check_for_completion(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    if state.maze.cell(state.player.position) != CellType::Exit {
        return false;
    }

    let elapsed = state.maze.elapsed_seconds();
    let report = rules::apply_completion(&mut state.player, state.maze.area(), elapsed);
    info!(
        level = state.player.level,
        elapsed,
        points = report.points_earned,
        "maze completed"
    );
    events.push(GameEvent::MazeCompleted { points: report.points_earned, elapsed });
    if let Some(seconds) = report.new_best_time {
        state.pending_best_time = true;
        events.push(GameEvent::NewBestTime { seconds });
    }
    for a in report.unlocked {
        state.pending_achievements.unlock(a);
        events.push(GameEvent::AchievementUnlocked(a));
    }

    let exclamation = EXCLAMATIONS.choose(state.generator.rng()).copied().unwrap_or("Well done!");
    new_maze(state, events);
    state.show_message(completion_message(exclamation, elapsed, report.points_earned));
    true
}

pub fn completion_message(exclamation: &str, elapsed: u16, points: u32) -> String {
    format!(
        "{}\n\nTime: {}\nPoints: {}",
        exclamation,
        format_time(u32::from(elapsed)),
        points
    )
}

/// Replace the maze without scoring and put the player at its entrance.
pub fn new_maze(state: &mut GameState, events: &mut Vec<GameEvent>) {
    state.maze = state.generator.generate();
    state.player.enter(&state.maze);
    state.dirty = true;
    debug!(
        width = state.maze.width(),
        height = state.maze.height(),
        "entered new maze"
    );
    events.push(GameEvent::MazeGenerated);
}

// ══════════════════════════════════════════════════════════════
// Clock and focus
// ══════════════════════════════════════════════════════════════

/// One second of wall time. No effect while paused.
pub fn tick(state: &mut GameState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.paused() {
        return events;
    }

    let secs = u32::from(state.maze.elapsed_seconds()) + 1;
    if state.maze.set_elapsed_seconds(secs)
        && state.player.achievements.unlock(Achievement::FellAsleep)
    {
        state.pending_achievements.unlock(Achievement::FellAsleep);
        events.push(GameEvent::AchievementUnlocked(Achievement::FellAsleep));
    }
    state.dirty = true;

    // At most one deferred notification per tick.
    if state.pending_best_time {
        state.pending_best_time = false;
        let text = format!(
            "\nNew Best Time!\n{}",
            format_time(u32::from(state.player.best_time))
        );
        state.show_message(text);
    } else if let Some(a) = state.pending_achievements.take_first() {
        state.show_message(format!("Achievement Unlocked!\n\n\"{}\"", a.name()));
    }
    events
}

pub fn set_focus(state: &mut GameState, focused: bool) {
    if state.focused != focused {
        debug!(focused, "focus changed");
        state.focused = focused;
        state.dirty = true;
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
