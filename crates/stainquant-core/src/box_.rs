//! Box - Rectangle regions
//!
//! Bounding rectangles of particles and other image regions.

/// A rectangle region
///
/// A simple `Copy` type since it's small and frequently copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Box {
    /// Left x coordinate
    pub x: i32,
    /// Top y coordinate
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Box {
    /// Create a box without validation
    pub const fn new_unchecked(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Create a box covering the inclusive pixel range `[x1, x2] x [y1, y2]`.
    pub fn from_extent(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let (xmin, xmax) = (x1.min(x2), x1.max(x2));
        let (ymin, ymax) = (y1.min(y2), y1.max(y2));
        Self {
            x: xmin,
            y: ymin,
            w: xmax - xmin + 1,
            h: ymax - ymin + 1,
        }
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Get the bottom y coordinate (exclusive)
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Check if the box is empty (zero area)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Grow the box so that it contains the pixel `(x, y)`.
    pub fn include_point(&mut self, x: i32, y: i32) {
        if self.is_empty() {
            *self = Self::new_unchecked(x, y, 1, 1);
            return;
        }
        let x1 = self.x.min(x);
        let y1 = self.y.min(y);
        let x2 = (self.right() - 1).max(x);
        let y2 = (self.bottom() - 1).max(y);
        *self = Self::from_extent(x1, y1, x2, y2);
    }
}
