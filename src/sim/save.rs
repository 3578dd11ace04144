/// Save and load game progress: two fixed-size binary records.
///
/// ## Records
///
///   **Player** (key 8417, 21 bytes):
///     magic "MCPL" | version u16 | pos.x i16 | pos.y i16 | direction u8 |
///     level u16 | best_time u16 | points u32 | achievements u16
///
///   **Maze** (key 8418, 415 bytes):
///     magic "MCMZ" | version u16 | width u8 | height u8 | elapsed u16 |
///     starting_direction u8 | entrance x,y u8 | exit x,y u8 | cells[400] u8
///
/// All integers little-endian. Cells are row-major with a stride of
/// `MAX_SIDE`, independent of the active extents. Direction codes are
/// 0=N 1=S 2=E 3=W; cell codes 0=Solid 1=Empty 2=Entrance 3=Exit.
///
/// ## Recovery
///
/// Every failure is a `SaveError` that is logged and never retried:
///   - no usable player record: fresh player, fresh maze, intro narration
///   - no usable maze record: fresh maze, player moved to its entrance
///   - restored player on a solid cell: moved to the entrance
///
/// A maze generated by either fallback is saved before play starts.
/// Maze records whose exit cannot be reached from the entrance are corrupt.
///
/// Records are stored one per file as `<key>.dat`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::cell::CellType;
use crate::domain::direction::{Coord, Direction};
use crate::domain::generator::{reachable, MazeGenerator};
use crate::domain::grid::{MazeGrid, CAPACITY, MAX_SECONDS, MAX_SIDE, MIN_SIDE};
use crate::domain::player::{AchievementSet, Player, MAX_LEVEL, MAX_POINTS};
use crate::error::SaveError;
use crate::sim::world::GameState;

pub const PLAYER_KEY: u32 = 8417;
pub const MAZE_KEY: u32 = 8418;
pub const PLAYER_RECORD_LEN: usize = 21;
pub const MAZE_RECORD_LEN: usize = 15 + CAPACITY;

const PLAYER_MAGIC: [u8; 4] = *b"MCPL";
const MAZE_MAGIC: [u8; 4] = *b"MCMZ";
const VERSION: u16 = 1;

// ══════════════════════════════════════════════════════════════
// Storage
// ══════════════════════════════════════════════════════════════

/// Fixed-size key/value store.
pub trait Storage {
    fn exists(&self, key: u32) -> bool;

    /// Copy the record into `buf`, returning the stored record length.
    /// A length different from `buf.len()` means the record is unusable.
    fn read(&self, key: u32, buf: &mut [u8]) -> Result<usize, SaveError>;

    /// Store `buf`, returning the number of bytes written.
    fn write(&mut self, key: u32, buf: &[u8]) -> Result<usize, SaveError>;
}

/// One `<key>.dat` file per record in a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    /// Use `dir` if given, else the default save directory.
    pub fn open(dir: Option<&Path>) -> Self {
        let dir = match dir {
            Some(d) => {
                if let Err(e) = fs::create_dir_all(d) {
                    warn!(dir = %d.display(), "cannot create save dir: {e}");
                }
                d.to_path_buf()
            }
            None => default_save_dir(),
        };
        debug!(dir = %dir.display(), "save directory");
        FileStorage { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: u32) -> PathBuf {
        self.dir.join(format!("{}.dat", key))
    }
}

impl Storage for FileStorage {
    fn exists(&self, key: u32) -> bool {
        self.path(key).is_file()
    }

    fn read(&self, key: u32, buf: &mut [u8]) -> Result<usize, SaveError> {
        let data = fs::read(self.path(key)).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                SaveError::Missing { key }
            } else {
                SaveError::Io { key, source }
            }
        })?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(data.len())
    }

    fn write(&mut self, key: u32, buf: &[u8]) -> Result<usize, SaveError> {
        fs::write(self.path(key), buf).map_err(|source| SaveError::Io { key, source })?;
        Ok(buf.len())
    }
}

/// Exe directory if writable, else `~/.local/share/mazecrawler`, else CWD.
pub fn default_save_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ are not writable.
            let test_path = parent.join(".write_test_mazecrawler");
            if fs::write(&test_path, "").is_ok() {
                let _ = fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/mazecrawler");
        if fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Save / load
// ══════════════════════════════════════════════════════════════

/// Write both records. Stops at the first failure.
pub fn save_game<S: Storage + ?Sized>(storage: &mut S, state: &GameState) -> Result<(), SaveError> {
    write_record(storage, PLAYER_KEY, &encode_player(&state.player))?;
    write_record(storage, MAZE_KEY, &encode_maze(&state.maze))?;
    debug!(level = state.player.level, "game saved");
    Ok(())
}

/// Restore the game, falling back to fresh state for anything unusable.
/// A maze generated as a fallback is written back immediately, so the
/// stored records always describe the maze being played.
pub fn load_game<S: Storage + ?Sized>(storage: &mut S, generator: MazeGenerator) -> GameState {
    let (state, generated) = restore(storage, generator);
    if generated {
        if let Err(e) = save_game(storage, &state) {
            warn!("save failed: {e}");
        }
    }
    state
}

/// Decode both records. The flag is set when a new maze had to be generated.
fn restore<S: Storage + ?Sized>(storage: &S, mut generator: MazeGenerator) -> (GameState, bool) {
    let mut player = match read_record(storage, PLAYER_KEY, PLAYER_RECORD_LEN)
        .and_then(|buf| decode_player(&buf))
    {
        Ok(p) => p,
        Err(SaveError::Missing { .. }) => {
            info!("no saved player, starting fresh");
            return (GameState::fresh(generator), true);
        }
        Err(e) => {
            warn!("discarding saved player: {e}");
            return (GameState::fresh(generator), true);
        }
    };

    let mut generated = false;
    let maze = match read_record(storage, MAZE_KEY, MAZE_RECORD_LEN).and_then(|buf| decode_maze(&buf)) {
        Ok(m) => m,
        Err(e) => {
            warn!("discarding saved maze: {e}");
            let m = generator.generate();
            player.enter(&m);
            generated = true;
            m
        }
    };

    if maze.is_solid(player.position) {
        warn!(x = player.position.x, y = player.position.y, "saved position is solid, moving to entrance");
        player.position = maze.entrance;
    }

    info!(level = player.level, points = player.points, "game restored");
    (GameState::new(maze, player, generator), generated)
}

fn write_record<S: Storage + ?Sized>(storage: &mut S, key: u32, buf: &[u8]) -> Result<(), SaveError> {
    let written = storage.write(key, buf)?;
    if written != buf.len() {
        return Err(SaveError::SizeMismatch { key, expected: buf.len(), actual: written });
    }
    Ok(())
}

fn read_record<S: Storage + ?Sized>(storage: &S, key: u32, len: usize) -> Result<Vec<u8>, SaveError> {
    if !storage.exists(key) {
        return Err(SaveError::Missing { key });
    }
    let mut buf = vec![0u8; len];
    let n = storage.read(key, &mut buf)?;
    if n != len {
        return Err(SaveError::SizeMismatch { key, expected: len, actual: n });
    }
    Ok(buf)
}

// ══════════════════════════════════════════════════════════════
// Byte cursor
// ══════════════════════════════════════════════════════════════

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn with_capacity(n: usize) -> Self {
        Writer { buf: Vec::with_capacity(n) }
    }

    fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.bytes(&v.to_le_bytes());
    }

    fn i16(&mut self, v: i16) {
        self.bytes(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.bytes(&v.to_le_bytes());
    }
}

/// Reads from a buffer already checked to be the full record length.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    key: u32,
}

impl<'a> Reader<'a> {
    fn new(key: u32, buf: &'a [u8], expected: usize) -> Result<Self, SaveError> {
        if buf.len() != expected {
            return Err(SaveError::SizeMismatch { key, expected, actual: buf.len() });
        }
        Ok(Reader { buf, pos: 0, key })
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take())
    }

    fn i16(&mut self) -> i16 {
        i16::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn header(&mut self, magic: [u8; 4]) -> Result<(), SaveError> {
        if self.take::<4>() != magic {
            return Err(SaveError::BadMagic { key: self.key });
        }
        let version = self.u16();
        if version != VERSION {
            return Err(SaveError::UnsupportedVersion { key: self.key, version });
        }
        Ok(())
    }

    fn invalid(&self, field: &'static str) -> SaveError {
        SaveError::InvalidField { key: self.key, field }
    }
}

// ══════════════════════════════════════════════════════════════
// Player record
// ══════════════════════════════════════════════════════════════

pub fn encode_player(p: &Player) -> Vec<u8> {
    let mut w = Writer::with_capacity(PLAYER_RECORD_LEN);
    w.bytes(&PLAYER_MAGIC);
    w.u16(VERSION);
    w.i16(p.position.x as i16);
    w.i16(p.position.y as i16);
    w.u8(p.direction.to_u8());
    w.u16(p.level);
    w.u16(p.best_time);
    w.u32(p.points);
    w.u16(p.achievements.bits());
    w.buf
}

pub fn decode_player(buf: &[u8]) -> Result<Player, SaveError> {
    let mut r = Reader::new(PLAYER_KEY, buf, PLAYER_RECORD_LEN)?;
    r.header(PLAYER_MAGIC)?;
    let x = r.i16();
    let y = r.i16();
    let direction = Direction::from_u8(r.u8()).ok_or_else(|| r.invalid("direction"))?;
    let level = r.u16();
    if !(1..=MAX_LEVEL).contains(&level) {
        return Err(r.invalid("level"));
    }
    let best_time = r.u16();
    if best_time > MAX_SECONDS {
        return Err(r.invalid("best_time"));
    }
    let points = r.u32();
    if points > MAX_POINTS {
        return Err(r.invalid("points"));
    }
    let achievements = AchievementSet::from_bits(r.u16());
    Ok(Player {
        position: Coord::new(i32::from(x), i32::from(y)),
        direction,
        level,
        best_time,
        points,
        achievements,
    })
}

// ══════════════════════════════════════════════════════════════
// Maze record
// ══════════════════════════════════════════════════════════════

pub fn encode_maze(m: &MazeGrid) -> Vec<u8> {
    let mut w = Writer::with_capacity(MAZE_RECORD_LEN);
    w.bytes(&MAZE_MAGIC);
    w.u16(VERSION);
    w.u8(m.width() as u8);
    w.u8(m.height() as u8);
    w.u16(m.elapsed_seconds());
    w.u8(m.starting_direction.to_u8());
    w.u8(m.entrance.x as u8);
    w.u8(m.entrance.y as u8);
    w.u8(m.exit.x as u8);
    w.u8(m.exit.y as u8);
    for c in m.raw_cells() {
        w.u8(c.to_u8());
    }
    w.buf
}

pub fn decode_maze(buf: &[u8]) -> Result<MazeGrid, SaveError> {
    let mut r = Reader::new(MAZE_KEY, buf, MAZE_RECORD_LEN)?;
    r.header(MAZE_MAGIC)?;
    let side = MIN_SIDE..=MAX_SIDE;
    let width = i32::from(r.u8());
    let height = i32::from(r.u8());
    if !side.contains(&width) || !side.contains(&height) {
        return Err(r.invalid("extents"));
    }
    let elapsed = r.u16();
    if elapsed > MAX_SECONDS {
        return Err(r.invalid("elapsed"));
    }
    let starting_direction = Direction::from_u8(r.u8()).ok_or_else(|| r.invalid("starting_direction"))?;
    let entrance = Coord::new(i32::from(r.u8()), i32::from(r.u8()));
    let exit = Coord::new(i32::from(r.u8()), i32::from(r.u8()));

    let mut maze = MazeGrid::solid(width, height);
    for slot in maze.raw_cells_mut().iter_mut() {
        *slot = CellType::from_u8(r.u8()).ok_or_else(|| r.invalid("cells"))?;
    }
    if entrance == exit || maze.get(entrance) != Some(CellType::Entrance) {
        return Err(r.invalid("entrance"));
    }
    if maze.get(exit) != Some(CellType::Exit) {
        return Err(r.invalid("exit"));
    }
    if !reachable(&maze, entrance, exit) {
        return Err(r.invalid("path"));
    }
    maze.entrance = entrance;
    maze.exit = exit;
    maze.starting_direction = starting_direction;
    maze.set_elapsed_seconds(u32::from(elapsed));
    Ok(maze)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::domain::player::Achievement;
    use crate::sim::world::Phase;

    #[derive(Default)]
    struct MemoryStorage {
        records: HashMap<u32, Vec<u8>>,
        /// Simulates a short write.
        truncate_writes: bool,
    }

    impl Storage for MemoryStorage {
        fn exists(&self, key: u32) -> bool {
            self.records.contains_key(&key)
        }

        fn read(&self, key: u32, buf: &mut [u8]) -> Result<usize, SaveError> {
            let data = self.records.get(&key).ok_or(SaveError::Missing { key })?;
            let n = data.len().min(buf.len());
            buf[..n].copy_from_slice(&data[..n]);
            Ok(data.len())
        }

        fn write(&mut self, key: u32, buf: &[u8]) -> Result<usize, SaveError> {
            let n = if self.truncate_writes { buf.len() / 2 } else { buf.len() };
            self.records.insert(key, buf[..n].to_vec());
            Ok(n)
        }
    }

    fn played_state() -> GameState {
        let mut gen = MazeGenerator::from_seed(21);
        let mut maze = gen.generate();
        maze.set_elapsed_seconds(93);
        let mut player = Player::new();
        player.enter(&maze);
        player.direction = player.direction.turned_right();
        player.level = 57;
        player.best_time = 14;
        player.points = 123_456;
        player.achievements.unlock(Achievement::Speedy);
        player.achievements.unlock(Achievement::Journeyman);
        GameState::new(maze, player, gen)
    }

    #[test]
    fn record_sizes_are_fixed() {
        let s = played_state();
        assert_eq!(encode_player(&s.player).len(), PLAYER_RECORD_LEN);
        assert_eq!(encode_maze(&s.maze).len(), MAZE_RECORD_LEN);
        assert_eq!(MAZE_RECORD_LEN, 415);
    }

    #[test]
    fn player_layout_is_little_endian() {
        let mut p = Player::new();
        p.position = Coord::new(3, 258);
        p.direction = Direction::West;
        p.points = 0x0102_0304;
        let b = encode_player(&p);
        assert_eq!(&b[0..4], b"MCPL");
        assert_eq!(&b[4..6], &[1, 0]);
        assert_eq!(&b[6..8], &[3, 0]);
        assert_eq!(&b[8..10], &[2, 1]);
        assert_eq!(b[10], 3);
        assert_eq!(&b[15..19], &[4, 3, 2, 1]);
    }

    #[test]
    fn save_then_load_restores_everything() {
        let s = played_state();
        let mut store = MemoryStorage::default();
        save_game(&mut store, &s).unwrap();
        let loaded = load_game(&mut store, MazeGenerator::from_seed(1));
        assert_eq!(loaded.player, s.player);
        assert_eq!(loaded.maze, s.maze);
        assert_eq!(loaded.phase(), Phase::MainMenu);
    }

    #[test]
    fn missing_player_starts_fresh_with_intro() {
        let mut store = MemoryStorage::default();
        let s = load_game(&mut store, MazeGenerator::from_seed(1));
        assert_eq!(s.player.level, 1);
        assert_eq!(s.phase(), Phase::Narration);
        assert_eq!(s.player.position, s.maze.entrance);
    }

    #[test]
    fn fresh_start_is_written_before_play() {
        let mut store = MemoryStorage::default();
        let s = load_game(&mut store, MazeGenerator::from_seed(1));
        assert!(store.exists(PLAYER_KEY));
        assert!(store.exists(MAZE_KEY));
        assert_eq!(decode_player(&store.records[&PLAYER_KEY]).unwrap(), s.player);
        assert_eq!(decode_maze(&store.records[&MAZE_KEY]).unwrap(), s.maze);
    }

    #[test]
    fn intact_records_are_not_rewritten() {
        let s = played_state();
        let mut store = MemoryStorage::default();
        save_game(&mut store, &s).unwrap();
        store.truncate_writes = true;
        // Any write would now corrupt the stored records.
        load_game(&mut store, MazeGenerator::from_seed(1));
        assert_eq!(store.records[&PLAYER_KEY].len(), PLAYER_RECORD_LEN);
        assert_eq!(store.records[&MAZE_KEY].len(), MAZE_RECORD_LEN);
    }

    #[test]
    fn short_write_is_reported() {
        let s = played_state();
        let mut store = MemoryStorage { truncate_writes: true, ..Default::default() };
        let err = save_game(&mut store, &s).unwrap_err();
        assert!(matches!(err, SaveError::SizeMismatch { key: PLAYER_KEY, .. }));

        // The truncated record reads back as unusable.
        let loaded = load_game(&mut store, MazeGenerator::from_seed(1));
        assert_eq!(loaded.player.level, 1);
    }

    #[test]
    fn corrupt_maze_regenerates_and_repositions() {
        let s = played_state();
        let mut store = MemoryStorage::default();
        save_game(&mut store, &s).unwrap();
        store.records.get_mut(&MAZE_KEY).unwrap()[0] = b'X';
        let loaded = load_game(&mut store, MazeGenerator::from_seed(1));
        assert_eq!(loaded.player.level, 57);
        assert_eq!(loaded.player.position, loaded.maze.entrance);
        assert_eq!(loaded.player.direction, loaded.maze.starting_direction);

        // The replacement maze overwrites the corrupt record right away.
        assert_eq!(decode_maze(&store.records[&MAZE_KEY]).unwrap(), loaded.maze);
        assert_eq!(decode_player(&store.records[&PLAYER_KEY]).unwrap(), loaded.player);
    }

    #[test]
    fn solid_position_moves_to_entrance() {
        let mut s = played_state();
        s.player.position = Coord::new(-4, 2);
        let mut store = MemoryStorage::default();
        save_game(&mut store, &s).unwrap();
        let loaded = load_game(&mut store, MazeGenerator::from_seed(1));
        assert_eq!(loaded.player.position, s.maze.entrance);
    }

    #[test]
    fn decode_rejects_bad_fields() {
        let s = played_state();

        let mut b = encode_player(&s.player);
        b[4] = 2;
        assert!(matches!(decode_player(&b), Err(SaveError::UnsupportedVersion { version: 2, .. })));

        let mut b = encode_player(&s.player);
        b[10] = 9;
        assert!(matches!(decode_player(&b), Err(SaveError::InvalidField { field: "direction", .. })));

        let mut b = encode_maze(&s.maze);
        b[6] = 25;
        assert!(matches!(decode_maze(&b), Err(SaveError::InvalidField { field: "extents", .. })));

        let mut b = encode_maze(&s.maze);
        b[20] = 7;
        assert!(matches!(decode_maze(&b), Err(SaveError::InvalidField { field: "cells", .. })));

        // Entrance coordinate pointing at the exit cell.
        let mut b = encode_maze(&s.maze);
        b[11] = s.maze.exit.x as u8;
        b[12] = s.maze.exit.y as u8;
        assert!(matches!(decode_maze(&b), Err(SaveError::InvalidField { field: "entrance", .. })));

        assert!(matches!(decode_maze(&b[..100]), Err(SaveError::SizeMismatch { .. })));

        // Every corridor walled up: entrance and exit no longer connect.
        let mut b = encode_maze(&s.maze);
        for cell in &mut b[15..] {
            if *cell == 1 {
                *cell = 0;
            }
        }
        assert!(matches!(decode_maze(&b), Err(SaveError::InvalidField { field: "path", .. })));
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStorage::new(dir.path());
        assert!(!store.exists(PLAYER_KEY));
        let s = played_state();
        save_game(&mut store, &s).unwrap();
        assert!(dir.path().join("8417.dat").is_file());
        assert!(dir.path().join("8418.dat").is_file());

        let loaded = load_game(&mut store, MazeGenerator::from_seed(1));
        assert_eq!(loaded.player, s.player);
        assert_eq!(loaded.maze, s.maze);
    }

    #[test]
    fn file_storage_reports_oversized_records() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("8417.dat"), vec![0u8; 64]).unwrap();
        let store = FileStorage::new(dir.path());
        let mut buf = [0u8; PLAYER_RECORD_LEN];
        assert_eq!(store.read(PLAYER_KEY, &mut buf).unwrap(), 64);
        let err = read_record(&store, PLAYER_KEY, PLAYER_RECORD_LEN).unwrap_err();
        assert!(matches!(err, SaveError::SizeMismatch { actual: 64, .. }));
    }
}
