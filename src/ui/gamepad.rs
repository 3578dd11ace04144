/// Gamepad input via gilrs.
///
/// D-pad and left stick drive movement: up/down repeat as Forward/Backward,
/// left/right turn. Face and shoulder buttons come from `[gamepad]` in
/// config.toml; by default Y/L1 and X/R1 turn, A confirms, B cancels and
/// Start/Select open the menu.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::sim::event::Action;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Configurable buttons.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        let b = match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Btn::A,
            "B" | "EAST" => Btn::B,
            "X" | "WEST" => Btn::X,
            "Y" | "NORTH" => Btn::Y,
            "L1" | "LB" => Btn::L1,
            "R1" | "RB" => Btn::R1,
            "L2" | "LT" => Btn::L2,
            "R2" | "RT" => Btn::R2,
            "START" => Btn::Start,
            "SELECT" | "BACK" => Btn::Select,
            _ => return None,
        };
        Some(b)
    }
}

/// The four movement directions shared by the d-pad and the stick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Pad {
    Up,
    Down,
    Left,
    Right,
}

/// Where a gilrs button lands: a movement direction or a mappable button.
#[cfg(feature = "gamepad")]
enum Input {
    Pad(Pad),
    Btn(Btn),
}

#[cfg(feature = "gamepad")]
fn classify(btn: Button) -> Option<Input> {
    let input = match btn {
        Button::DPadUp => Input::Pad(Pad::Up),
        Button::DPadDown => Input::Pad(Pad::Down),
        Button::DPadLeft => Input::Pad(Pad::Left),
        Button::DPadRight => Input::Pad(Pad::Right),
        Button::South => Input::Btn(Btn::A),
        Button::East => Input::Btn(Btn::B),
        Button::West => Input::Btn(Btn::X),
        Button::North => Input::Btn(Btn::Y),
        Button::LeftTrigger => Input::Btn(Btn::L1),
        Button::RightTrigger => Input::Btn(Btn::R1),
        Button::LeftTrigger2 => Input::Btn(Btn::L2),
        Button::RightTrigger2 => Input::Btn(Btn::R2),
        Button::Start => Input::Btn(Btn::Start),
        Button::Select => Input::Btn(Btn::Select),
        _ => return None,
    };
    Some(input)
}

/// Held plus a one-frame edge.
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

struct ActionMap {
    turn_left: Vec<Btn>,
    turn_right: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    menu: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            turn_left: vec![Btn::Y, Btn::L1],
            turn_right: vec![Btn::X, Btn::R1],
            confirm: vec![Btn::A],
            cancel: vec![Btn::B],
            menu: vec![Btn::Start, Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
    buttons: [BtnState; BTN_COUNT],
    /// Indexed by `Pad`.
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    axes: (f32, f32),
    action_map: ActionMap,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg_attr(not(feature = "gamepad"), allow(unused_mut))]
        let mut pad = Self::offline();
        #[cfg(feature = "gamepad")]
        {
            pad.gilrs = Gilrs::new().ok();
        }
        pad
    }

    /// No backend attached; every query reports idle.
    fn offline() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            axes: (0.0, 0.0),
            action_map: ActionMap::default(),
        }
    }

    /// Replace each mapping that names at least one known button.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn apply(slot: &mut Vec<Btn>, names: &[String]) {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if !parsed.is_empty() {
                *slot = parsed;
            }
        }
        let map = &mut self.action_map;
        apply(&mut map.turn_left, &cfg.turn_left);
        apply(&mut map.turn_right, &cfg.turn_right);
        apply(&mut map.confirm, &cfg.confirm);
        apply(&mut map.cancel, &cfg.cancel);
        apply(&mut map.menu, &cfg.menu);
    }

    pub fn update(&mut self) {
        for s in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            s.just_pressed = false;
        }

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };
        let events: Vec<EventType> = std::iter::from_fn(|| gilrs.next_event()).map(|e| e.event).collect();

        for event in events {
            match event {
                EventType::ButtonPressed(btn, _) => self.set_button(btn, true),
                EventType::ButtonReleased(btn, _) => self.set_button(btn, false),
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.axes.0 = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.axes.1 = v,
                EventType::Disconnected => {
                    let map = std::mem::take(&mut self.action_map);
                    let gilrs = self.gilrs.take();
                    *self = Self::offline();
                    self.action_map = map;
                    self.gilrs = gilrs;
                }
                _ => {}
            }
        }

        let (x, y) = self.axes;
        self.stick[Pad::Up as usize].set(y > STICK_DEADZONE);
        self.stick[Pad::Down as usize].set(y < -STICK_DEADZONE);
        self.stick[Pad::Left as usize].set(x < -STICK_DEADZONE);
        self.stick[Pad::Right as usize].set(x > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, btn: Button, held: bool) {
        match classify(btn) {
            Some(Input::Pad(p)) => self.dpad[p as usize].set(held),
            Some(Input::Btn(b)) => self.buttons[b as usize].set(held),
            None => {}
        }
    }

    // ── Action queries ──

    fn pad_pressed(&self, p: Pad) -> bool {
        self.dpad[p as usize].just_pressed || self.stick[p as usize].just_pressed
    }

    fn pad_held(&self, p: Pad) -> bool {
        self.dpad[p as usize].held || self.stick[p as usize].held
    }

    fn any_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    /// Actions for inputs freshly pressed this frame.
    pub fn actions(&self) -> Vec<Action> {
        let map = &self.action_map;
        let edges = [
            (self.pad_pressed(Pad::Up), Action::Forward),
            (self.pad_pressed(Pad::Down), Action::Backward),
            (self.pad_pressed(Pad::Left) || self.any_pressed(&map.turn_left), Action::TurnLeft),
            (self.pad_pressed(Pad::Right) || self.any_pressed(&map.turn_right), Action::TurnRight),
            (self.any_pressed(&map.confirm), Action::Confirm),
            (self.any_pressed(&map.cancel), Action::Cancel),
            (self.any_pressed(&map.menu), Action::Menu),
        ];
        edges.iter().filter(|(hit, _)| *hit).map(|(_, a)| *a).collect()
    }

    /// Forward or backward while the d-pad or stick is held.
    pub fn held_move(&self) -> Option<Action> {
        if self.pad_held(Pad::Up) {
            Some(Action::Forward)
        } else if self.pad_held(Pad::Down) {
            Some(Action::Backward)
        } else {
            None
        }
    }
}
