//! Screen-space geometry: rectangles, regions and display rotation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle anchored at the origin.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub const fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub const fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Whether `other` lies entirely inside `self`. Empty rectangles are
    /// contained everywhere.
    pub const fn contains_rect(&self, other: &Self) -> bool {
        other.is_empty()
            || (self.left <= other.left
                && self.top <= other.top
                && self.right >= other.right
                && self.bottom >= other.bottom)
    }

    /// Intersection, or `None` if the rectangles do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let rect = Self::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        rect.is_not_empty().then_some(rect)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) - ({}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Union of rectangles.
///
/// Rectangles are stored as given; overlap is allowed. Coverage queries are
/// exact at pixel granularity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.add(rect);
        region
    }

    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Self {
        let mut region = Self::new();
        for rect in rects {
            region.add(rect);
        }
        region
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Add a rectangle to the union. Empty rectangles are ignored.
    pub fn add(&mut self, rect: Rect) {
        if rect.is_not_empty() {
            self.rects.push(rect);
        }
    }

    /// Add every rectangle of `other` to the union.
    pub fn union(&mut self, other: &Self) {
        self.rects.extend_from_slice(&other.rects);
    }

    /// Bounding box of the region.
    pub fn bounds(&self) -> Rect {
        self.rects
            .iter()
            .copied()
            .reduce(|a, b| {
                Rect::new(
                    a.left.min(b.left),
                    a.top.min(b.top),
                    a.right.max(b.right),
                    a.bottom.max(b.bottom),
                )
            })
            .unwrap_or(Rect::EMPTY)
    }

    /// Whether every pixel of `target` lies inside the region.
    pub fn covers(&self, target: &Rect) -> bool {
        self.uncovered(target).is_empty()
    }

    /// The part of `target` not covered by the region.
    ///
    /// The target is cut into a grid along every rectangle edge that crosses
    /// it; each grid cell is either fully inside some rectangle or fully
    /// outside all of them. Uncovered cells are merged along rows.
    pub fn uncovered(&self, target: &Rect) -> Self {
        if target.is_empty() {
            return Self::new();
        }

        let clipped: Vec<Rect> = self
            .rects
            .iter()
            .filter_map(|r| r.intersect(target))
            .collect();

        let mut xs = vec![target.left, target.right];
        let mut ys = vec![target.top, target.bottom];
        for r in &clipped {
            xs.extend([r.left, r.right]);
            ys.extend([r.top, r.bottom]);
        }
        xs.sort_unstable();
        xs.dedup();
        ys.sort_unstable();
        ys.dedup();

        let mut missing = Self::new();
        for row in ys.windows(2) {
            let (top, bottom) = (row[0], row[1]);
            let mut run: Option<Rect> = None;
            for col in xs.windows(2) {
                let cell = Rect::new(col[0], top, col[1], bottom);
                if clipped.iter().any(|r| r.contains_rect(&cell)) {
                    if let Some(done) = run.take() {
                        missing.add(done);
                    }
                } else if let Some(open) = run.as_mut() {
                    // Cells in a row are contiguous.
                    open.right = cell.right;
                } else {
                    run = Some(cell);
                }
            }
            if let Some(done) = run {
                missing.add(done);
            }
        }
        missing
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rects.is_empty() {
            return f.write_str("[empty]");
        }
        f.write_str("[")?;
        for (i, rect) in self.rects.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{rect}")?;
        }
        f.write_str("]")
    }
}

/// Display rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rotation0 => "ROTATION_0",
            Self::Rotation90 => "ROTATION_90",
            Self::Rotation180 => "ROTATION_180",
            Self::Rotation270 => "ROTATION_270",
        };
        f.write_str(name)
    }
}

/// Display transform. Only the rotation component is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: Rotation,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: Rotation::Rotation0,
    };

    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_emptiness() {
        assert!(Rect::EMPTY.is_empty());
        assert!(Rect::new(5, 5, 5, 10).is_empty());
        assert!(Rect::from_size(1, 1).is_not_empty());
    }

    #[test]
    fn single_rect_covers_itself() {
        let screen = Rect::from_size(1080, 2400);
        assert!(Region::from_rect(screen).covers(&screen));
    }

    #[test]
    fn adjacent_rects_cover_union() {
        let region = Region::from_rects([Rect::new(0, 0, 100, 50), Rect::new(0, 50, 100, 100)]);
        assert!(region.covers(&Rect::from_size(100, 100)));
    }

    #[test]
    fn missing_pixel_is_reported() {
        let region = Region::from_rects([
            Rect::new(0, 0, 100, 99),
            Rect::new(0, 99, 99, 100),
        ]);
        let target = Rect::from_size(100, 100);
        assert!(!region.covers(&target));
        let missing = region.uncovered(&target);
        assert_eq!(missing.rects(), &[Rect::new(99, 99, 100, 100)]);
    }

    #[test]
    fn overlapping_rects_cover() {
        let region = Region::from_rects([Rect::new(0, 0, 70, 100), Rect::new(30, 0, 100, 100)]);
        assert!(region.covers(&Rect::from_size(100, 100)));
    }

    #[test]
    fn empty_region_leaves_target_uncovered() {
        let target = Rect::from_size(10, 10);
        let missing = Region::new().uncovered(&target);
        assert_eq!(missing.rects(), &[target]);
    }

    #[test]
    fn empty_target_is_always_covered() {
        assert!(Region::new().covers(&Rect::EMPTY));
    }

    #[test]
    fn uncovered_rows_are_merged() {
        let region = Region::from_rect(Rect::new(40, 0, 60, 10));
        let missing = region.uncovered(&Rect::from_size(100, 10));
        assert_eq!(
            missing.rects(),
            &[Rect::new(0, 0, 40, 10), Rect::new(60, 0, 100, 10)]
        );
    }

    #[test]
    fn bounds_spans_all_rects() {
        let region = Region::from_rects([Rect::new(10, 10, 20, 20), Rect::new(-5, 0, 1, 1)]);
        assert_eq!(region.bounds(), Rect::new(-5, 0, 20, 20));
    }
}
