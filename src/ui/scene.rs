/// First-person scene: painter's algorithm over the perspective table.
///
/// Frame order:
///   1. clear the graphics frame to black
///   2. dithered floor and ceiling, mirrored about the horizon
///   3. for depth = far..near: the cell dead ahead, then its lateral
///      neighbours out to `depth + 1` on each side
///   4. status bar: black strip with the compass
///
/// Each open cell contributes up to three wall quads (back, left, right),
/// two corner seams, and an entrance/exit marker. Solid cells are never
/// drawn themselves; they only show up as the walls of open neighbours.
///
/// Everything is integer math. Off-screen walls and markers report
/// "not drawn" and are skipped.

use super::canvas::{Color, Point, Rect, Surface};
use super::perspective::{
    PerspectiveTable, CANVAS_HEIGHT, DEPTHS, GRAPHICS_FRAME_HEIGHT, MAX_VISIBILITY_DEPTH,
    MIN_WALL_HEIGHT, SCREEN_WIDTH, STATUS_BAR_HEIGHT, STRAIGHT_AHEAD,
};
use crate::domain::cell::CellType;
use crate::domain::direction::{cell_ahead, cell_to_left, cell_to_right, Coord, Direction};
use crate::domain::grid::MazeGrid;

/// Dither period grows by one every `SHADE_BAND` rows away from the edge.
const SHADE_BAND: i32 = MAX_VISIBILITY_DEPTH as i32;

/// Marker radius as a fraction of the cell rectangle: 2/5.
const ELLIPSE_NUM: i32 = 2;
const ELLIPSE_DEN: i32 = 5;

/// cos/sin * 1024 at 0, 12, 24 .. 84 degrees.
const TRIG_SCALE: i32 = 1024;
const COS_12: [i32; 8] = [1024, 1002, 935, 828, 685, 512, 316, 107];
const SIN_12: [i32; 8] = [0, 213, 416, 602, 761, 887, 974, 1018];

pub const COMPASS_RADIUS: i32 = 5;
pub const COMPASS_CENTER: Point =
    Point::new(SCREEN_WIDTH / 2, GRAPHICS_FRAME_HEIGHT + STATUS_BAR_HEIGHT / 2);
/// Unrotated needle, pointing down (south).
const COMPASS_NEEDLE: [Point; 3] = [Point::new(-3, -3), Point::new(3, -3), Point::new(0, 6)];

/// What the viewer sees from: maze, cell, facing.
#[derive(Clone, Copy)]
pub struct View<'a> {
    pub maze: &'a MazeGrid,
    pub position: Coord,
    pub direction: Direction,
}

pub struct SceneRenderer {
    table: PerspectiveTable,
}

impl SceneRenderer {
    pub fn new() -> Self {
        SceneRenderer { table: PerspectiveTable::new() }
    }

    #[cfg(test)]
    pub fn table(&self) -> &PerspectiveTable {
        &self.table
    }

    /// Paint one full frame, status bar included.
    pub fn draw<S: Surface>(&self, s: &mut S, view: &View) {
        s.set_fill_color(Color::Black);
        s.fill_rect(graphics_frame());

        self.draw_floor_and_ceiling(s);

        for depth in (0..DEPTHS).rev() {
            let ahead = cell_ahead(view.position, view.direction, depth as i32);
            if !view.maze.in_bounds(ahead) {
                continue;
            }
            self.draw_cell_contents(s, view, ahead, depth, STRAIGHT_AHEAD);
            for i in 1..=depth + 1 {
                let l = cell_to_left(ahead, view.direction, i as i32);
                self.draw_cell_contents(s, view, l, depth, STRAIGHT_AHEAD - i);
                let r = cell_to_right(ahead, view.direction, i as i32);
                self.draw_cell_contents(s, view, r, depth, STRAIGHT_AHEAD + i);
            }
        }

        draw_status_bar(s, view.direction);
    }

    /// Dither rows from the frame edge to the farthest drawable wall top,
    /// mirrored onto the floor.
    fn draw_floor_and_ceiling<S: Surface>(&self, s: &mut S) {
        let horizon_limit = GRAPHICS_FRAME_HEIGHT / 2 - MIN_WALL_HEIGHT / 2;
        let max_y = (0..DEPTHS)
            .rev()
            .map(|d| self.table.center(d).tl.y)
            .find(|&y| y <= horizon_limit)
            .unwrap_or(horizon_limit);

        s.set_stroke_color(Color::White);
        for y in 0..max_y {
            let period = shade_period(y);
            let start = if y % 2 == 1 { 0 } else { half_up(period) };
            let mut x = start;
            while x < SCREEN_WIDTH {
                s.draw_pixel(Point::new(x, y));
                s.draw_pixel(Point::new(x, GRAPHICS_FRAME_HEIGHT - y));
                x += period;
            }
        }
    }

    /// Walls, seams and marker of one open cell. Returns false if nothing
    /// was drawn (solid cell, slot outside the table, or too small).
    pub fn draw_cell_contents<S: Surface>(
        &self,
        s: &mut S,
        view: &View,
        cell: Coord,
        depth: usize,
        slot: usize,
    ) -> bool {
        if view.maze.is_solid(cell) {
            return false;
        }
        let Some(rect) = self.table.rect(depth, slot) else {
            return false;
        };
        if rect.height() < MIN_WALL_HEIGHT {
            return false;
        }
        let prev = depth.checked_sub(1).and_then(|d| self.table.rect(d, slot));
        let dir = view.direction;
        let (top, bottom) = (rect.tl.y, rect.br.y);

        // Back wall.
        let beyond = cell_ahead(cell, dir, 1);
        let back = view.maze.is_solid(beyond);
        if back {
            draw_wall(
                s,
                Point::new(rect.tl.x, top),
                Point::new(rect.tl.x, bottom),
                Point::new(rect.br.x, top),
                Point::new(rect.br.x, bottom),
            );
        }

        // Side walls connect this rectangle to the one in front of it,
        // or to the frame edge at depth 0.
        let y_offset = match prev {
            Some(p) => top - p.tl.y,
            None => top,
        };

        let mut left = false;
        if slot <= STRAIGHT_AHEAD && view.maze.is_solid(cell_to_left(cell, dir, 1)) {
            let outer = prev.map_or(0, |p| p.tl.x);
            draw_wall(
                s,
                Point::new(outer, top - y_offset),
                Point::new(outer, bottom + y_offset),
                Point::new(rect.tl.x, top),
                Point::new(rect.tl.x, bottom),
            );
            left = true;
        }

        let mut right = false;
        if slot >= STRAIGHT_AHEAD && view.maze.is_solid(cell_to_right(cell, dir, 1)) {
            let outer = prev.map_or(SCREEN_WIDTH - 1, |p| p.br.x);
            draw_wall(
                s,
                Point::new(rect.br.x, top),
                Point::new(rect.br.x, bottom),
                Point::new(outer, top - y_offset),
                Point::new(outer, bottom + y_offset),
            );
            right = true;
        }

        // Corner seams, only where an edge would otherwise be missing.
        s.set_stroke_color(Color::Black);
        let open_left_beyond = !view.maze.is_solid(cell_to_left(beyond, dir, 1));
        let open_right_beyond = !view.maze.is_solid(cell_to_right(beyond, dir, 1));
        if (back && (left || open_left_beyond)) || (left && open_left_beyond) {
            s.draw_line(rect.tl, Point::new(rect.tl.x, rect.br.y));
        }
        if (back && (right || open_right_beyond)) || (right && open_right_beyond) {
            s.draw_line(rect.br, Point::new(rect.br.x, rect.tl.y));
        }

        match view.maze.cell(cell) {
            CellType::Entrance => {
                self.draw_entrance(s, depth, slot);
            }
            CellType::Exit => {
                self.draw_exit(s, depth, slot);
            }
            _ => {}
        }
        true
    }

    fn draw_entrance<S: Surface>(&self, s: &mut S, depth: usize, slot: usize) -> bool {
        let Some(rect) = self.table.rect(depth, slot) else {
            return false;
        };
        let h_radius = ratio(rect.width());
        let v_radius = match depth.checked_sub(1).and_then(|d| self.table.rect(d, slot)) {
            Some(p) => ratio(rect.tl.y - p.tl.y),
            None => ratio(rect.tl.y),
        };
        let floor = self.floor_center(depth, slot);
        let ceiling = Point::new(floor.x, GRAPHICS_FRAME_HEIGHT - floor.y);
        fill_ellipse(s, ceiling, h_radius, v_radius, Color::Black)
    }

    fn draw_exit<S: Surface>(&self, s: &mut S, depth: usize, slot: usize) -> bool {
        let Some(rect) = self.table.rect(depth, slot) else {
            return false;
        };
        let h_radius = ratio(rect.width());
        let v_radius = match depth.checked_sub(1).and_then(|d| self.table.rect(d, slot)) {
            Some(p) => ratio(p.br.y - rect.br.y),
            None => ratio(GRAPHICS_FRAME_HEIGHT - rect.br.y),
        };
        fill_ellipse(s, self.floor_center(depth, slot), h_radius, v_radius, Color::Black)
    }

    /// Middle of a cell's floor patch: halfway between this row's bottom
    /// edge and the row in front (or the frame bottom at depth 0).
    pub fn floor_center(&self, depth: usize, slot: usize) -> Point {
        let rect = self.table.rect(depth, slot).unwrap_or_default();
        let mid1 = rect.center_x();
        let (mid2, y) = match depth.checked_sub(1).and_then(|d| self.table.rect(d, slot)) {
            Some(p) => (p.center_x(), (rect.br.y + p.br.y) / 2),
            None => {
                let mid2 = if slot < STRAIGHT_AHEAD {
                    -SCREEN_WIDTH / 2
                } else if slot > STRAIGHT_AHEAD {
                    SCREEN_WIDTH + SCREEN_WIDTH / 2
                } else {
                    mid1
                };
                (mid2, GRAPHICS_FRAME_HEIGHT)
            }
        };
        Point::new((mid1 + mid2) / 2, y)
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn graphics_frame() -> Rect {
    Rect::new(Point::new(0, 0), Point::new(SCREEN_WIDTH, GRAPHICS_FRAME_HEIGHT))
}

pub fn status_bar() -> Rect {
    Rect::new(Point::new(0, GRAPHICS_FRAME_HEIGHT), Point::new(SCREEN_WIDTH, CANVAS_HEIGHT))
}

#[inline]
fn half_up(n: i32) -> i32 {
    n / 2 + n % 2
}

#[inline]
fn ratio(n: i32) -> i32 {
    n * ELLIPSE_NUM / ELLIPSE_DEN
}

/// Pixel stride for a row `y` pixels from the frame edge.
#[inline]
fn shade_period(y: i32) -> i32 {
    let mut p = 1 + y / SHADE_BAND;
    if y % SHADE_BAND >= half_up(SHADE_BAND) {
        p += 1;
    }
    p
}

// ── Walls ──

/// Fill a wall quad column by column with the depth dither, then outline
/// its top and bottom edges. The left edge runs `ul..ll`, the right edge
/// `ur..lr`; slanted side walls have `ul.y != ur.y`.
pub fn draw_wall<S: Surface + ?Sized>(s: &mut S, ul: Point, ll: Point, ur: Point, lr: Point) -> bool {
    if ul.x >= SCREEN_WIDTH || ur.x < 0 {
        return false;
    }

    let dx = ur.x - ul.x;
    let dy = ur.y - ul.y;
    for i in ul.x.max(0)..=ur.x.min(SCREEN_WIDTH - 1) {
        let slant = if dx == 0 { 0 } else { (i - ul.x) * dy / dx };
        let base = ul.y + slant;
        let period = shade_period(base);
        let phase = if i % 2 == 0 { 0 } else { half_up(period) };

        for j in base..ll.y - slant {
            let lit = (j + slant + phase) % period == 0;
            s.set_stroke_color(if lit { Color::White } else { Color::Black });
            s.draw_pixel(Point::new(i, j));
        }
    }

    s.set_stroke_color(Color::Black);
    s.draw_line(ul, ur);
    s.draw_line(ll, lr);
    true
}

// ── Markers ──

/// Filled ellipse from horizontal chords every 12 degrees of the first
/// quadrant, mirrored. False if the ellipse misses the graphics frame.
pub fn fill_ellipse<S: Surface + ?Sized>(
    s: &mut S,
    center: Point,
    h_radius: i32,
    v_radius: i32,
    color: Color,
) -> bool {
    if center.x + h_radius < 0
        || center.x - h_radius >= SCREEN_WIDTH
        || center.y + v_radius < 0
        || center.y - v_radius >= GRAPHICS_FRAME_HEIGHT
    {
        return false;
    }

    s.set_stroke_color(color);
    for (cos, sin) in COS_12.iter().zip(SIN_12.iter()) {
        let xo = cos * h_radius / TRIG_SCALE;
        let yo = sin * v_radius / TRIG_SCALE;
        s.draw_line(
            Point::new(center.x - xo, center.y - yo),
            Point::new(center.x + xo, center.y - yo),
        );
        s.draw_line(
            Point::new(center.x - xo, center.y + yo),
            Point::new(center.x + xo, center.y + yo),
        );
    }
    true
}

// ── Status bar ──

/// Needle triangle rotated to `dir`, in canvas coordinates.
pub fn compass_needle(dir: Direction) -> [Point; 3] {
    let (cos, sin) = match dir.compass_angle() {
        0 => (1, 0),
        90 => (0, 1),
        180 => (-1, 0),
        _ => (0, -1),
    };
    COMPASS_NEEDLE.map(|p| {
        Point::new(
            COMPASS_CENTER.x + p.x * cos - p.y * sin,
            COMPASS_CENTER.y + p.x * sin + p.y * cos,
        )
    })
}

/// Black strip, white compass disc, black needle. Text is overlaid by the
/// terminal layer.
pub fn draw_status_bar<S: Surface + ?Sized>(s: &mut S, dir: Direction) {
    s.set_fill_color(Color::Black);
    s.fill_rect(status_bar());
    s.set_fill_color(Color::White);
    s.fill_circle(COMPASS_CENTER, COMPASS_RADIUS);

    let tri = compass_needle(dir);
    s.set_stroke_color(Color::Black);
    fill_triangle(s, tri);
}

fn fill_triangle<S: Surface + ?Sized>(s: &mut S, [a, b, c]: [Point; 3]) {
    let edge = |p: Point, q: Point, r: Point| (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x);
    let area = edge(a, b, c);
    let min_x = a.x.min(b.x).min(c.x);
    let max_x = a.x.max(b.x).max(c.x);
    let min_y = a.y.min(b.y).min(c.y);
    let max_y = a.y.max(b.y).max(c.y);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Point::new(x, y);
            let (w0, w1, w2) = (edge(b, c, p), edge(c, a, p), edge(a, b, p));
            let inside = if area >= 0 {
                w0 >= 0 && w1 >= 0 && w2 >= 0
            } else {
                w0 <= 0 && w1 <= 0 && w2 <= 0
            };
            if inside {
                s.draw_pixel(p);
            }
        }
    }
    s.draw_line(a, b);
    s.draw_line(b, c);
    s.draw_line(c, a);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::canvas::Canvas;
    use crate::ui::perspective::SLOTS;

    fn canvas() -> Canvas {
        Canvas::new(SCREEN_WIDTH, CANVAS_HEIGHT)
    }

    /// Fully open 20x20 maze; everything past the border is solid.
    fn open_maze() -> MazeGrid {
        let mut m = MazeGrid::solid(20, 20);
        for c in m.coords().collect::<Vec<_>>() {
            m.set(c, CellType::Empty);
        }
        m
    }

    fn frame_pixels(c: &Canvas) -> Vec<bool> {
        let mut v = Vec::new();
        for y in 0..GRAPHICS_FRAME_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                v.push(c.is_white(x, y));
            }
        }
        v
    }

    // ── Floor / ceiling ──

    #[test]
    fn floor_mirrors_ceiling_and_leaves_the_horizon_dark() {
        let r = SceneRenderer::new();
        let mut c = canvas();
        r.draw_floor_and_ceiling(&mut c);
        for y in 1..60 {
            for x in 0..SCREEN_WIDTH {
                assert_eq!(c.is_white(x, y), c.is_white(x, GRAPHICS_FRAME_HEIGHT - y));
            }
        }
        let band = Rect::new(Point::new(0, 60), Point::new(SCREEN_WIDTH, 77));
        assert_eq!(c.count_white(band), 0);
    }

    #[test]
    fn dither_thins_out_toward_the_horizon() {
        let r = SceneRenderer::new();
        let mut c = canvas();
        r.draw_floor_and_ceiling(&mut c);
        let row = |y: i32| c.count_white(Rect::new(Point::new(0, y), Point::new(SCREEN_WIDTH, y + 1)));
        assert_eq!(row(1), SCREEN_WIDTH as usize);
        assert!(row(55) < row(25));
        assert!(row(25) < row(5));
    }

    // ── Cells ──

    #[test]
    fn open_space_draws_no_walls() {
        let r = SceneRenderer::new();
        let maze = open_maze();
        let view = View { maze: &maze, position: Coord::new(10, 15), direction: Direction::North };

        let mut scene = canvas();
        r.draw(&mut scene, &view);

        let mut bare = canvas();
        bare.set_fill_color(Color::Black);
        bare.fill_rect(graphics_frame());
        r.draw_floor_and_ceiling(&mut bare);

        assert!(frame_pixels(&scene) == frame_pixels(&bare));
    }

    #[test]
    fn dead_end_draws_back_and_side_walls() {
        let r = SceneRenderer::new();
        let mut maze = MazeGrid::solid(10, 10);
        maze.set(Coord::new(5, 5), CellType::Empty);
        let view = View { maze: &maze, position: Coord::new(5, 5), direction: Direction::North };

        let mut c = canvas();
        assert!(r.draw_cell_contents(&mut c, &view, Coord::new(5, 5), 0, STRAIGHT_AHEAD));

        let near = r.table().center(0);
        // Outlined top and bottom edges of the back wall.
        for x in near.tl.x..=near.br.x {
            assert!(!c.is_white(x, near.tl.y));
            assert!(!c.is_white(x, near.br.y));
        }
        // Dithered faces: back wall and both side walls carry lit pixels.
        assert!(c.count_white(near) > 0);
        let left = Rect::new(Point::new(0, near.tl.y), Point::new(near.tl.x, near.br.y));
        let right = Rect::new(Point::new(near.br.x + 1, near.tl.y), Point::new(SCREEN_WIDTH, near.br.y));
        assert!(c.count_white(left) > 0);
        assert!(c.count_white(right) > 0);
    }

    #[test]
    fn solid_and_out_of_table_cells_are_skipped() {
        let r = SceneRenderer::new();
        let maze = open_maze();
        let view = View { maze: &maze, position: Coord::new(10, 10), direction: Direction::East };
        let mut c = canvas();
        assert!(!r.draw_cell_contents(&mut c, &view, Coord::new(-1, 3), 0, STRAIGHT_AHEAD));
        assert!(!r.draw_cell_contents(&mut c, &view, Coord::new(3, 3), DEPTHS, STRAIGHT_AHEAD));
        assert!(!r.draw_cell_contents(&mut c, &view, Coord::new(3, 3), 0, SLOTS));
        assert_eq!(c.count_white(c.bounds()), 0);
    }

    #[test]
    fn exit_marker_darkens_the_floor_only() {
        let r = SceneRenderer::new();
        let plain = open_maze();
        let mut with_exit = open_maze();
        with_exit.set(Coord::new(10, 13), CellType::Exit);

        let draw = |m: &MazeGrid| {
            let mut c = canvas();
            r.draw(&mut c, &View { maze: m, position: Coord::new(10, 14), direction: Direction::North });
            c
        };
        let a = draw(&plain);
        let b = draw(&with_exit);

        let mut changed = 0;
        for y in 0..GRAPHICS_FRAME_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                if a.is_white(x, y) != b.is_white(x, y) {
                    changed += 1;
                    assert!(!b.is_white(x, y), "marker lit ({}, {})", x, y);
                    assert!(y > GRAPHICS_FRAME_HEIGHT / 2, "marker above horizon at y={}", y);
                }
            }
        }
        assert!(changed > 0);
    }

    #[test]
    fn entrance_marker_sits_on_the_ceiling() {
        let r = SceneRenderer::new();
        let plain = open_maze();
        let mut with_entrance = open_maze();
        with_entrance.set(Coord::new(10, 13), CellType::Entrance);

        let draw = |m: &MazeGrid| {
            let mut c = canvas();
            r.draw(&mut c, &View { maze: m, position: Coord::new(10, 14), direction: Direction::North });
            c
        };
        let a = draw(&plain);
        let b = draw(&with_entrance);
        let mut changed = 0;
        for y in 0..GRAPHICS_FRAME_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                if a.is_white(x, y) != b.is_white(x, y) {
                    changed += 1;
                    assert!(y < GRAPHICS_FRAME_HEIGHT / 2);
                }
            }
        }
        assert!(changed > 0);
    }

    #[test]
    fn floor_center_tracks_the_cell() {
        let r = SceneRenderer::new();
        assert_eq!(r.floor_center(0, STRAIGHT_AHEAD), Point::new(72, GRAPHICS_FRAME_HEIGHT));
        assert_eq!(r.floor_center(1, STRAIGHT_AHEAD), Point::new(72, 113));
        assert!(r.floor_center(0, STRAIGHT_AHEAD - 1).x < 0);
        assert!(r.floor_center(0, STRAIGHT_AHEAD + 1).x > SCREEN_WIDTH);
    }

    // ── Primitives ──

    #[test]
    fn off_screen_geometry_is_not_drawn() {
        let mut c = canvas();
        assert!(!draw_wall(&mut c, Point::new(150, 10), Point::new(150, 50), Point::new(160, 10), Point::new(160, 50)));
        assert!(!draw_wall(&mut c, Point::new(-40, 10), Point::new(-40, 50), Point::new(-1, 10), Point::new(-1, 50)));
        assert!(!fill_ellipse(&mut c, Point::new(-50, 60), 10, 4, Color::White));
        assert!(!fill_ellipse(&mut c, Point::new(70, 200), 10, 4, Color::White));
        assert_eq!(c.count_white(c.bounds()), 0);
    }

    #[test]
    fn ellipse_fills_inside_its_radii() {
        let mut c = canvas();
        assert!(fill_ellipse(&mut c, Point::new(70, 60), 20, 8, Color::White));
        assert!(c.is_white(70, 60));
        assert!(c.is_white(50, 60));
        assert!(!c.is_white(49, 60));
        assert!(!c.is_white(70, 50));
    }

    #[test]
    fn wall_outline_is_black() {
        let mut c = canvas();
        c.set_fill_color(Color::White);
        c.fill_rect(graphics_frame());
        let (ul, ll, ur, lr) = (Point::new(20, 30), Point::new(20, 90), Point::new(60, 40), Point::new(60, 80));
        assert!(draw_wall(&mut c, ul, ll, ur, lr));
        assert!(!c.is_white(20, 30));
        assert!(!c.is_white(60, 40));
        assert!(!c.is_white(40, 35));
        assert!(!c.is_white(60, 80));
    }

    // ── Compass ──

    #[test]
    fn needle_points_along_the_facing() {
        let tip = |d| compass_needle(d)[2];
        assert!(tip(Direction::North).y < COMPASS_CENTER.y);
        assert!(tip(Direction::South).y > COMPASS_CENTER.y);
        assert!(tip(Direction::East).x > COMPASS_CENTER.x);
        assert!(tip(Direction::West).x < COMPASS_CENTER.x);
        assert_eq!(tip(Direction::North), Point::new(72, 138));
    }

    #[test]
    fn status_bar_draws_disc_and_needle() {
        let mut c = canvas();
        draw_status_bar(&mut c, Direction::North);
        assert!(c.count_white(status_bar()) > 0);
        // Needle covers the disc center.
        assert!(!c.is_white(COMPASS_CENTER.x, COMPASS_CENTER.y));
        // Disc rim off the needle stays lit.
        assert!(c.is_white(COMPASS_CENTER.x, COMPASS_CENTER.y + COMPASS_RADIUS));
    }
}
