/// Monochrome drawing surface.
///
/// `Surface` is the narrow set of primitives the scene is drawn with.
/// `Canvas` is the in-memory implementation: one bit per pixel, every
/// primitive clipped to the bounds, so callers may pass off-screen
/// coordinates freely.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

/// Axis-aligned rectangle, `tl` inclusive, `br` exclusive.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub tl: Point,
    pub br: Point,
}

impl Rect {
    pub const fn new(tl: Point, br: Point) -> Self {
        Rect { tl, br }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.br.x - self.tl.x
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.br.y - self.tl.y
    }

    pub fn center_x(&self) -> i32 {
        (self.tl.x + self.br.x) / 2
    }

    /// Shift horizontally by `dx`.
    pub fn translated_x(&self, dx: i32) -> Rect {
        Rect::new(
            Point::new(self.tl.x + dx, self.tl.y),
            Point::new(self.br.x + dx, self.br.y),
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Color {
    Black,
    White,
}

/// Drawing primitives. Stroke color applies to pixels and lines, fill
/// color to rectangles and circles.
pub trait Surface {
    fn bounds(&self) -> Rect;
    fn set_stroke_color(&mut self, color: Color);
    fn set_fill_color(&mut self, color: Color);
    fn draw_pixel(&mut self, p: Point);
    fn draw_line(&mut self, a: Point, b: Point);
    fn fill_rect(&mut self, r: Rect);

    /// Filled disc built from horizontal spans, drawn in the fill color.
    fn fill_circle(&mut self, center: Point, radius: i32);
}

pub struct Canvas {
    width: i32,
    height: i32,
    pixels: Vec<bool>,
    stroke: Color,
    fill: Color,
}

impl Canvas {
    pub fn new(width: i32, height: i32) -> Self {
        Canvas {
            width,
            height,
            pixels: vec![false; (width.max(0) * height.max(0)) as usize],
            stroke: Color::White,
            fill: Color::Black,
        }
    }

    /// Pixel color, `None` outside the canvas.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| if self.pixels[i] { Color::White } else { Color::Black })
    }

    #[inline]
    pub fn is_white(&self, x: i32, y: i32) -> bool {
        self.pixel(x, y) == Some(Color::White)
    }

    /// Number of white pixels in `r` (clipped).
    #[cfg(test)]
    pub fn count_white(&self, r: Rect) -> usize {
        let mut n = 0;
        for y in r.tl.y.max(0)..r.br.y.min(self.height) {
            for x in r.tl.x.max(0)..r.br.x.min(self.width) {
                if self.is_white(x, y) {
                    n += 1;
                }
            }
        }
        n
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, color: Color) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color == Color::White;
        }
    }

    fn span(&mut self, x0: i32, x1: i32, y: i32, color: Color) {
        if y < 0 || y >= self.height {
            return;
        }
        for x in x0.max(0)..=x1.min(self.width - 1) {
            self.put(x, y, color);
        }
    }
}

impl Surface for Canvas {
    fn bounds(&self) -> Rect {
        Rect::new(Point::new(0, 0), Point::new(self.width, self.height))
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.stroke = color;
    }

    fn set_fill_color(&mut self, color: Color) {
        self.fill = color;
    }

    fn draw_pixel(&mut self, p: Point) {
        self.put(p.x, p.y, self.stroke);
    }

    /// Bresenham; endpoints inclusive.
    fn draw_line(&mut self, a: Point, b: Point) {
        let (mut x, mut y) = (a.x, a.y);
        let dx = (b.x - a.x).abs();
        let dy = -(b.y - a.y).abs();
        let sx = if a.x < b.x { 1 } else { -1 };
        let sy = if a.y < b.y { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x, y, self.stroke);
            if x == b.x && y == b.y {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn fill_rect(&mut self, r: Rect) {
        for y in r.tl.y.max(0)..r.br.y.min(self.height) {
            self.span(r.tl.x, r.br.x - 1, y, self.fill);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: i32) {
        let r2 = radius * radius;
        for dy in -radius..=radius {
            let mut half = 0;
            while (half + 1) * (half + 1) + dy * dy <= r2 {
                half += 1;
            }
            self.span(center.x - half, center.x + half, center.y + dy, self.fill);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_clip_silently() {
        let mut c = Canvas::new(8, 6);
        c.set_fill_color(Color::White);
        c.fill_rect(Rect::new(Point::new(-10, -10), Point::new(100, 100)));
        assert_eq!(c.count_white(c.bounds()), 48);

        c.set_stroke_color(Color::Black);
        c.draw_line(Point::new(-5, 2), Point::new(50, 2));
        assert_eq!(c.count_white(c.bounds()), 40);
        c.draw_pixel(Point::new(99, 99));
        assert_eq!(c.pixel(99, 99), None);
    }

    #[test]
    fn rect_fill_is_half_open() {
        let mut c = Canvas::new(10, 10);
        c.set_fill_color(Color::White);
        c.fill_rect(Rect::new(Point::new(2, 3), Point::new(5, 4)));
        assert_eq!(c.count_white(c.bounds()), 3);
        assert!(c.is_white(2, 3));
        assert!(c.is_white(4, 3));
        assert!(!c.is_white(5, 3));
    }

    #[test]
    fn line_endpoints_are_inclusive() {
        let mut c = Canvas::new(10, 10);
        c.set_stroke_color(Color::White);
        c.draw_line(Point::new(1, 1), Point::new(7, 4));
        assert!(c.is_white(1, 1));
        assert!(c.is_white(7, 4));
        // One pixel per column on a shallow line.
        assert_eq!(c.count_white(c.bounds()), 7);
    }

    #[test]
    fn circle_is_symmetric() {
        let mut c = Canvas::new(21, 21);
        c.set_fill_color(Color::White);
        c.fill_circle(Point::new(10, 10), 5);
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(c.is_white(x, y), c.is_white(20 - x, y));
                assert_eq!(c.is_white(x, y), c.is_white(x, 20 - y));
            }
        }
        assert!(c.is_white(10, 5));
        assert!(!c.is_white(10, 4));
    }
}
