/// Keyboard input tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Edge-triggered actions (turns, menu, confirm) on the initial press
///   - Repeating moves while a move key is held, paced by `Repeater`
///   - Focus and resize notifications from the same event stream
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::event::Action;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

/// Keys for each action. Letters match either case.
pub fn action_for(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Up => Some(Action::Forward),
        KeyCode::Down => Some(Action::Backward),
        KeyCode::Left => Some(Action::TurnLeft),
        KeyCode::Right => Some(Action::TurnRight),
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc | KeyCode::Backspace => Some(Action::Cancel),
        KeyCode::Tab => Some(Action::Menu),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Some(Action::Forward),
            's' => Some(Action::Backward),
            'a' | 'q' => Some(Action::TurnLeft),
            'd' | 'e' => Some(Action::TurnRight),
            ' ' => Some(Action::Confirm),
            'm' => Some(Action::Menu),
            _ => None,
        },
        _ => None,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the most recent
    /// `drain_events()`.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Focus transitions in arrival order (true = gained).
    pub focus_changes: Vec<bool>,
    pub resized: bool,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            focus_changes: Vec::with_capacity(2),
            resized: false,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before stepping the game.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
        self.focus_changes.clear();
        self.resized = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key),
                Ok(Event::FocusGained) => self.focus_changes.push(true),
                Ok(Event::FocusLost) => self.focus_changes.push(false),
                Ok(Event::Resize(..)) => self.resized = true,
                _ => {}
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn on_key(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    /// Actions for keys freshly pressed this frame, in arrival order.
    pub fn actions(&self) -> Vec<Action> {
        if self.ctrl_c_pressed() {
            return vec![Action::Quit];
        }
        self.fresh_presses.iter().filter_map(|c| action_for(*c)).collect()
    }

    /// A repeating move whose key is still held.
    pub fn held_move(&self) -> Option<Action> {
        self.last_active
            .keys()
            .filter_map(|c| action_for(*c))
            .find(|a| a.repeats())
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

/// Paces a held move to one step per interval. The initial press is
/// handled as a normal action; the first repeat waits a full interval.
pub struct Repeater {
    every: Duration,
    last: Option<(Action, Instant)>,
}

impl Repeater {
    pub fn new(every: Duration) -> Self {
        Repeater { every, last: None }
    }

    pub fn pressed(&mut self, action: Action, now: Instant) {
        if action.repeats() {
            self.last = Some((action, now));
        }
    }

    pub fn poll(&mut self, held: Option<Action>, now: Instant) -> Option<Action> {
        let action = match held {
            Some(a) => a,
            None => {
                self.last = None;
                return None;
            }
        };
        match self.last {
            Some((prev, t)) if prev == action => {
                if now.duration_since(t) >= self.every {
                    self.last = Some((action, now));
                    Some(action)
                } else {
                    None
                }
            }
            _ => {
                self.last = Some((action, now));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_letters_share_actions() {
        assert_eq!(action_for(KeyCode::Up), Some(Action::Forward));
        assert_eq!(action_for(KeyCode::Char('W')), Some(Action::Forward));
        assert_eq!(action_for(KeyCode::Char('q')), Some(Action::TurnLeft));
        assert_eq!(action_for(KeyCode::Char('E')), Some(Action::TurnRight));
        assert_eq!(action_for(KeyCode::Esc), Some(Action::Cancel));
        assert_eq!(action_for(KeyCode::Char('m')), Some(Action::Menu));
        assert_eq!(action_for(KeyCode::Char('z')), None);
    }

    #[test]
    fn repeater_waits_a_full_interval() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut r = Repeater::new(ms(150));
        r.pressed(Action::Forward, t0);
        assert_eq!(r.poll(Some(Action::Forward), t0 + ms(100)), None);
        assert_eq!(r.poll(Some(Action::Forward), t0 + ms(150)), Some(Action::Forward));
        assert_eq!(r.poll(Some(Action::Forward), t0 + ms(200)), None);
        assert_eq!(r.poll(Some(Action::Forward), t0 + ms(300)), Some(Action::Forward));
    }

    #[test]
    fn repeater_resets_on_release_and_ignores_turns() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut r = Repeater::new(ms(100));
        r.pressed(Action::TurnLeft, t0);
        assert_eq!(r.poll(None, t0 + ms(500)), None);
        // Held without a recorded press: start timing, no step yet.
        assert_eq!(r.poll(Some(Action::Backward), t0 + ms(500)), None);
        assert_eq!(r.poll(Some(Action::Backward), t0 + ms(600)), Some(Action::Backward));
    }
}
