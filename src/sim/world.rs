/// GameState: the complete snapshot of a running game.
///
/// ## View Stack
///
/// Views are a stack of phases with `MainMenu` at the bottom. The top
/// view receives input and decides what is drawn:
///
///   MainMenu ── Play ──────────────▶ Playing
///   Playing  ── Menu ──────────────▶ InGameMenu
///   any menu ── Stats/Controls/About ▶ Narration
///   Playing  ── tick / completion ──▶ Message
///
/// Popping returns to whatever was underneath. The bottom view is never
/// popped; leaving the main menu ends the session.
///
/// ## Pause
///
/// The game is paused unless `Playing` is on top and the terminal has
/// focus. Pause only stops the clock.

use crate::domain::generator::MazeGenerator;
use crate::domain::grid::MazeGrid;
use crate::domain::player::{AchievementSet, Player};
use super::narration::{Narration, NarrationKind};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    MainMenu,
    Playing,
    InGameMenu,
    Narration,
    Message,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuItem {
    Play,
    NewMaze,
    Stats,
    Controls,
    About,
}

impl MenuItem {
    pub fn label(self) -> &'static str {
        match self {
            MenuItem::Play => "Play",
            MenuItem::NewMaze => "New Maze",
            MenuItem::Stats => "Stats",
            MenuItem::Controls => "Controls",
            MenuItem::About => "About",
        }
    }
}

pub const MAIN_MENU: [MenuItem; 4] =
    [MenuItem::Play, MenuItem::Stats, MenuItem::Controls, MenuItem::About];
pub const IN_GAME_MENU: [MenuItem; 4] =
    [MenuItem::NewMaze, MenuItem::Stats, MenuItem::Controls, MenuItem::About];

pub struct GameState {
    // ── World ──
    pub maze: MazeGrid,
    pub player: Player,
    pub generator: MazeGenerator,

    // ── Views ──
    views: Vec<Phase>,
    pub menu_cursor: usize,
    pub narration: Option<Narration>,
    pub message: String,

    // ── Deferred notifications ──
    /// Set on completion; surfaced by the next unpaused tick.
    pub pending_best_time: bool,
    pub pending_achievements: AchievementSet,

    // ── Host signals ──
    pub focused: bool,
    /// Scene needs repainting.
    pub dirty: bool,
    pub running: bool,
}

// ── Construction ──

impl GameState {
    /// Resume with an existing maze and player, on the main menu.
    pub fn new(maze: MazeGrid, player: Player, generator: MazeGenerator) -> Self {
        GameState {
            maze,
            player,
            generator,
            views: vec![Phase::MainMenu],
            menu_cursor: 0,
            narration: None,
            message: String::new(),
            pending_best_time: false,
            pending_achievements: AchievementSet::default(),
            focused: true,
            dirty: true,
            running: true,
        }
    }

    /// First launch: new player in a new maze, intro narration on top.
    pub fn fresh(mut generator: MazeGenerator) -> Self {
        let maze = generator.generate();
        let mut player = Player::new();
        player.enter(&maze);
        let mut state = GameState::new(maze, player, generator);
        state.show_narration(NarrationKind::Intro);
        state
    }
}

// ── View stack ──

impl GameState {
    #[inline]
    pub fn phase(&self) -> Phase {
        self.views.last().copied().unwrap_or(Phase::MainMenu)
    }

    pub fn views(&self) -> &[Phase] {
        &self.views
    }

    /// The view directly beneath the top one.
    #[cfg(test)]
    pub fn underlying_phase(&self) -> Option<Phase> {
        self.views.len().checked_sub(2).map(|i| self.views[i])
    }

    pub fn push_view(&mut self, phase: Phase) {
        self.views.push(phase);
        self.dirty = true;
    }

    /// Pop the top view. The main menu at the bottom stays.
    pub fn pop_view(&mut self) -> Option<Phase> {
        if self.views.len() <= 1 {
            return None;
        }
        let top = self.views.pop();
        if top == Some(Phase::Narration) {
            self.narration = None;
        }
        self.dirty = true;
        top
    }

    #[inline]
    pub fn paused(&self) -> bool {
        !(self.phase() == Phase::Playing && self.focused)
    }

    pub fn show_message(&mut self, text: String) {
        self.message = text;
        self.push_view(Phase::Message);
    }

    pub fn show_narration(&mut self, kind: NarrationKind) {
        self.narration = Some(Narration::new(kind, &self.player));
        self.push_view(Phase::Narration);
    }

    /// Items of the menu on top, empty outside menus.
    pub fn menu_items(&self) -> &'static [MenuItem] {
        match self.phase() {
            Phase::MainMenu => &MAIN_MENU,
            Phase::InGameMenu => &IN_GAME_MENU,
            _ => &[],
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        let mut gen = MazeGenerator::from_seed(7);
        let maze = gen.generate();
        let mut player = Player::new();
        player.enter(&maze);
        GameState::new(maze, player, gen)
    }

    #[test]
    fn main_menu_is_never_popped() {
        let mut s = state();
        assert_eq!(s.pop_view(), None);
        assert_eq!(s.phase(), Phase::MainMenu);
    }

    #[test]
    fn paused_unless_playing_with_focus() {
        let mut s = state();
        assert!(s.paused());
        s.push_view(Phase::Playing);
        assert!(!s.paused());
        s.focused = false;
        assert!(s.paused());
        s.focused = true;
        s.show_message("hi".into());
        assert!(s.paused());
        assert_eq!(s.underlying_phase(), Some(Phase::Playing));
    }

    #[test]
    fn fresh_state_opens_with_intro() {
        let s = GameState::fresh(MazeGenerator::from_seed(3));
        assert_eq!(s.phase(), Phase::Narration);
        assert_eq!(s.narration.as_ref().map(|n| n.kind), Some(NarrationKind::Intro));
        assert_eq!(s.player.position, s.maze.entrance);
        assert_eq!(s.player.direction, s.maze.starting_direction);
    }

    #[test]
    fn popping_narration_drops_it() {
        let mut s = state();
        s.show_narration(NarrationKind::About);
        assert!(s.narration.is_some());
        s.pop_view();
        assert!(s.narration.is_none());
        assert_eq!(s.menu_items(), &MAIN_MENU);
    }
}
