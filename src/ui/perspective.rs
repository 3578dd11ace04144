/// Precomputed viewing frustum.
///
/// Row `d` holds the back-wall rectangle of every cell `d` steps ahead,
/// slot `STRAIGHT_AHEAD` being dead ahead. The center rectangle's inset
/// from the frame edges grows by a shrinking step each row:
///
/// ```text
///   inset[0] = FIRST_WALL_OFFSET
///   inset[d] = inset[d-1] + FIRST_WALL_OFFSET - PERSPECTIVE_STEP * d
/// ```
///
/// giving insets 16, 30, 42, 52, 60 on a 144x136 frame. Lateral slots are
/// the center rectangle translated by whole widths, so each row tiles.
///
/// The scene is painted far-to-near with no depth buffer; it relies on
/// every row being strictly nested inside the row in front of it.

use super::canvas::{Point, Rect};

pub const SCREEN_WIDTH: i32 = 144;
pub const GRAPHICS_FRAME_HEIGHT: i32 = 136;
pub const STATUS_BAR_HEIGHT: i32 = 16;
pub const CANVAS_HEIGHT: i32 = GRAPHICS_FRAME_HEIGHT + STATUS_BAR_HEIGHT;

pub const FIRST_WALL_OFFSET: i32 = 16;
pub const PERSPECTIVE_STEP: i32 = 2;
pub const MAX_VISIBILITY_DEPTH: usize = 6;
pub const MIN_WALL_HEIGHT: i32 = 16;

/// Table rows: depths `0..DEPTHS`.
pub const DEPTHS: usize = MAX_VISIBILITY_DEPTH - 1;
pub const STRAIGHT_AHEAD: usize = 5;
pub const SLOTS: usize = STRAIGHT_AHEAD * 2 + 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PerspectiveTable {
    rects: [[Rect; SLOTS]; DEPTHS],
}

impl PerspectiveTable {
    pub fn new() -> Self {
        let mut rects = [[Rect::default(); SLOTS]; DEPTHS];
        let mut inset = 0;
        for (depth, row) in rects.iter_mut().enumerate() {
            inset += FIRST_WALL_OFFSET - PERSPECTIVE_STEP * depth as i32;
            let center = Rect::new(
                Point::new(inset, inset),
                Point::new(SCREEN_WIDTH - inset, GRAPHICS_FRAME_HEIGHT - inset),
            );
            let width = center.width();
            for (slot, r) in row.iter_mut().enumerate() {
                let shift = slot as i32 - STRAIGHT_AHEAD as i32;
                *r = center.translated_x(width * shift);
            }
        }
        let table = PerspectiveTable { rects };
        debug_assert!(table.is_nested(), "perspective rows must nest strictly");
        table
    }

    /// `None` outside the table.
    #[inline]
    pub fn rect(&self, depth: usize, slot: usize) -> Option<Rect> {
        self.rects.get(depth).and_then(|row| row.get(slot)).copied()
    }

    #[inline]
    pub fn center(&self, depth: usize) -> Rect {
        self.rects[depth.min(DEPTHS - 1)][STRAIGHT_AHEAD]
    }

    /// Every center rectangle lies strictly inside the one before it.
    pub fn is_nested(&self) -> bool {
        (1..DEPTHS).all(|d| {
            let (near, far) = (self.center(d - 1), self.center(d));
            far.tl.x > near.tl.x
                && far.tl.y > near.tl.y
                && far.br.x < near.br.x
                && far.br.y < near.br.y
        })
    }
}

impl Default for PerspectiveTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_insets_follow_the_contraction() {
        let t = PerspectiveTable::new();
        let insets: Vec<i32> = (0..DEPTHS).map(|d| t.center(d).tl.x).collect();
        assert_eq!(insets, vec![16, 30, 42, 52, 60]);
        assert_eq!(t.center(0).br, Point::new(128, 120));
        assert_eq!(t.center(4).height(), MIN_WALL_HEIGHT);
    }

    #[test]
    fn rectangles_shrink_with_depth_in_every_slot() {
        let t = PerspectiveTable::new();
        for slot in 0..SLOTS {
            for d in 1..DEPTHS {
                let near = t.rect(d - 1, slot).unwrap();
                let far = t.rect(d, slot).unwrap();
                assert!(far.width() < near.width(), "slot {} depth {}", slot, d);
                assert!(far.height() < near.height(), "slot {} depth {}", slot, d);
            }
        }
        assert!(t.is_nested());
    }

    #[test]
    fn rows_tile_without_gaps_or_overlap() {
        let t = PerspectiveTable::new();
        for d in 0..DEPTHS {
            for slot in 1..SLOTS {
                let a = t.rect(d, slot - 1).unwrap();
                let b = t.rect(d, slot).unwrap();
                assert_eq!(a.br.x, b.tl.x);
                assert_eq!((a.tl.y, a.br.y), (b.tl.y, b.br.y));
                assert_eq!(a.width(), b.width());
            }
        }
    }

    #[test]
    fn rows_are_mirror_symmetric() {
        let t = PerspectiveTable::new();
        for d in 0..DEPTHS {
            for k in 0..=STRAIGHT_AHEAD {
                let l = t.rect(d, STRAIGHT_AHEAD - k).unwrap();
                let r = t.rect(d, STRAIGHT_AHEAD + k).unwrap();
                assert_eq!(l.tl.x + r.br.x, SCREEN_WIDTH);
            }
        }
    }

    #[test]
    fn out_of_table_lookups_are_none() {
        let t = PerspectiveTable::new();
        assert!(t.rect(DEPTHS, 0).is_none());
        assert!(t.rect(0, SLOTS).is_none());
    }
}
