/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::generator::MazeGenerator;
use sim::event::{Action, GameEvent};
use sim::save::{self, FileStorage};
use sim::step;
use sim::world::GameState;
use ui::gamepad::GamepadState;
use ui::input::{InputState, Repeater};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const TICK: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    let config = GameConfig::load();
    let mut storage = FileStorage::open(config.save_dir.as_deref());
    init_logging(&config, storage.dir());
    for w in &config.warnings {
        warn!("config: {w}");
    }

    let generator = MazeGenerator::new(config.maze.seed, config.maze.turn_percent);
    let mut state = save::load_game(&mut storage, generator);

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let sound = SoundEngine::new();
    let result = game_loop(&mut state, &mut renderer, &mut storage, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        error!("terminal cleanup failed: {e}");
    }
    persist(&mut storage, &state);
    result?;

    println!();
    println!("Thanks for playing MazeCrawler!");
    println!("Level {}  Points {}", state.player.level, state.player.points);
    Ok(())
}

/// File logger; stdout belongs to the terminal UI. `RUST_LOG` overrides
/// the configured level. Logging is skipped if the file cannot be opened.
fn init_logging(config: &GameConfig, save_dir: &Path) {
    let path = config.log_path(save_dir);
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(f) => f,
        Err(_) => return,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    info!(log = %path.display(), "mazecrawler starting");
}

fn game_loop(
    state: &mut GameState,
    renderer: &mut Renderer,
    storage: &mut FileStorage,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.key_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut repeat = Repeater::new(Duration::from_millis(config.controls.repeat_ms));
    let frame = Duration::from_millis(config.controls.frame_ms);
    let mut last_tick = Instant::now();

    while state.running {
        kb.drain_events();
        gp.update();
        let now = Instant::now();

        for focused in kb.focus_changes.drain(..) {
            step::set_focus(state, focused);
        }
        if kb.resized {
            state.dirty = true;
        }

        let mut actions = kb.actions();
        actions.extend(gp.actions());
        for &a in &actions {
            repeat.pressed(a, now);
        }
        if let Some(a) = repeat.poll(kb.held_move().or_else(|| gp.held_move()), now) {
            actions.push(a);
        }

        for action in actions {
            let events = step::step(state, action);
            handle_events(state, storage, sound, &events);
            if action == Action::Quit || !state.running {
                break;
            }
        }

        // Catch up on missed seconds without drifting.
        while now.duration_since(last_tick) >= TICK {
            last_tick += TICK;
            let events = step::tick(state);
            handle_events(state, storage, sound, &events);
        }

        if state.dirty {
            renderer.render(state).context("render failed")?;
            state.dirty = false;
        }
        std::thread::sleep(frame);
    }

    Ok(())
}

fn handle_events(
    state: &GameState,
    storage: &mut FileStorage,
    sound: Option<&SoundEngine>,
    events: &[GameEvent],
) {
    for event in events {
        match event {
            GameEvent::Moved { to } => trace!(x = to.x, y = to.y, "moved"),
            GameEvent::Turned { direction } => trace!(?direction, "turned"),
            GameEvent::MazeCompleted { points, elapsed } => debug!(points, elapsed, "maze scored"),
            GameEvent::NewBestTime { seconds } => info!(seconds, "new best time"),
            GameEvent::AchievementUnlocked(a) => info!(achievement = a.name(), "achievement unlocked"),
            GameEvent::Bumped | GameEvent::MazeGenerated => {}
        }
        if let Some(sfx) = sound {
            match event {
                GameEvent::Moved { .. } => sfx.play_step(),
                GameEvent::Bumped => sfx.play_bump(),
                GameEvent::Turned { .. } => sfx.play_turn(),
                GameEvent::MazeCompleted { .. } => sfx.play_complete(),
                GameEvent::AchievementUnlocked(_) => sfx.play_achievement(),
                GameEvent::MazeGenerated | GameEvent::NewBestTime { .. } => {}
            }
        }
    }
    if events.contains(&GameEvent::MazeGenerated) {
        persist(storage, state);
    }
}

/// Best-effort snapshot; failures are logged, never retried.
fn persist(storage: &mut FileStorage, state: &GameState) {
    if let Err(e) = save::save_game(storage, state) {
        warn!("save failed: {e}");
    }
}
