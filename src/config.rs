/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, CWD, or the data
/// directories. Falls back to sensible defaults if the file is missing or
/// incomplete.
///
/// ```toml
/// [controls]
/// frame_ms = 33        # input poll / repaint period
/// repeat_ms = 180      # held-move repeat period
///
/// [maze]
/// turn_percent = 25    # carver turn chance per step
/// seed = 42            # optional, makes mazes reproducible
///
/// [gamepad]
/// turn_left = ["Y", "L1"]
///
/// [general]
/// save_dir = "/path"   # optional
/// log_file = "/path"   # optional, default <save_dir>/mazecrawler.log
/// log_level = "info"   # overridden by RUST_LOG
/// ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::generator::DEFAULT_TURN_PERCENT;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub controls: ControlsConfig,
    pub maze: MazeConfig,
    pub gamepad: GamepadConfig,
    pub save_dir: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    /// Problems met while loading, reported once logging is up.
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ControlsConfig {
    pub frame_ms: u64,
    pub repeat_ms: u64,
}

#[derive(Clone, Debug)]
pub struct MazeConfig {
    pub turn_percent: u32,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub turn_left: Vec<String>,
    pub turn_right: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub menu: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    controls: TomlControls,
    #[serde(default)]
    maze: TomlMaze,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlControls {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_repeat_ms")]
    repeat_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlMaze {
    #[serde(default = "default_turn_percent")]
    turn_percent: u32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_turn_left")]
    turn_left: Vec<String>,
    #[serde(default = "default_turn_right")]
    turn_right: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_menu")]
    menu: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    save_dir: Option<String>,
    #[serde(default)]
    log_file: Option<String>,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_frame_ms() -> u64 { 33 }
fn default_repeat_ms() -> u64 { 180 }
fn default_turn_percent() -> u32 { DEFAULT_TURN_PERCENT }

fn default_turn_left() -> Vec<String> { vec!["Y".into(), "L1".into()] }
fn default_turn_right() -> Vec<String> { vec!["X".into(), "R1".into()] }
fn default_confirm() -> Vec<String> { vec!["A".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into()] }
fn default_menu() -> Vec<String> { vec!["Start".into(), "Select".into()] }
fn default_log_level() -> String { "info".into() }

impl Default for TomlControls {
    fn default() -> Self {
        TomlControls {
            frame_ms: default_frame_ms(),
            repeat_ms: default_repeat_ms(),
        }
    }
}

impl Default for TomlMaze {
    fn default() -> Self {
        TomlMaze {
            turn_percent: default_turn_percent(),
            seed: None,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            turn_left: default_turn_left(),
            turn_right: default_turn_right(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            menu: default_menu(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            save_dir: None,
            log_file: None,
            log_level: default_log_level(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, CWD, `~/.local/share/mazecrawler`,
    /// `/usr/share/mazecrawler`. The first file found wins.
    pub fn load() -> Self {
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&candidate_dirs(), &mut warnings);
        let mut cfg = GameConfig::from_toml(toml_cfg);
        cfg.warnings = warnings;
        cfg
    }

    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from_toml)
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            controls: ControlsConfig {
                frame_ms: t.controls.frame_ms.max(1),
                repeat_ms: t.controls.repeat_ms,
            },
            maze: MazeConfig {
                turn_percent: t.maze.turn_percent,
                seed: t.maze.seed,
            },
            gamepad: GamepadConfig {
                turn_left: t.gamepad.turn_left,
                turn_right: t.gamepad.turn_right,
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                menu: t.gamepad.menu,
            },
            save_dir: t.general.save_dir.map(PathBuf::from),
            log_file: t.general.log_file.map(PathBuf::from),
            log_level: t.general.log_level,
            warnings: Vec::new(),
        }
    }

    /// Log file location: configured path, else inside the save directory.
    pub fn log_path(&self, save_dir: &Path) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| save_dir.join("mazecrawler.log"))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so /usr/bin/mazecrawler → /usr/games/mazecrawler
        // still finds data relative to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/mazecrawler)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/mazecrawler");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/mazecrawler)
    let sys = PathBuf::from("/usr/share/mazecrawler");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warnings.push(format!("{}: parse error, using defaults: {e}", path.display()));
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warnings.push(format!("could not read {}: {e}", path.display()));
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.controls.frame_ms, 33);
        assert_eq!(cfg.controls.repeat_ms, 180);
        assert_eq!(cfg.maze.turn_percent, DEFAULT_TURN_PERCENT);
        assert_eq!(cfg.maze.seed, None);
        assert_eq!(cfg.gamepad.confirm, vec!["A".to_string()]);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.save_dir.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            r#"
            [maze]
            seed = 42

            [gamepad]
            menu = ["Start"]

            [general]
            save_dir = "/tmp/mc"
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.maze.seed, Some(42));
        assert_eq!(cfg.maze.turn_percent, DEFAULT_TURN_PERCENT);
        assert_eq!(cfg.gamepad.menu, vec!["Start".to_string()]);
        assert_eq!(cfg.gamepad.turn_left, vec!["Y".to_string(), "L1".to_string()]);
        assert_eq!(cfg.save_dir, Some(PathBuf::from("/tmp/mc")));
        assert_eq!(cfg.log_path(Path::new("/tmp/mc")), PathBuf::from("/tmp/mc/mazecrawler.log"));
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn bad_types_are_errors() {
        assert!(GameConfig::parse("[controls]\nframe_ms = \"fast\"").is_err());
    }

    #[test]
    fn unreadable_search_dirs_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[maze\nseed = ").unwrap();
        let mut warnings = Vec::new();
        let t = load_toml(&[dir.path().to_path_buf()], &mut warnings);
        assert_eq!(warnings.len(), 1);
        assert_eq!(t.maze.turn_percent, DEFAULT_TURN_PERCENT);
    }
}
