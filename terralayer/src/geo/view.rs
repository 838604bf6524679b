use std::fmt;

use crate::raster::RasterShape;

/// Inclusive rectangle in projected block coordinates.
///
/// Both corners are part of the view, so `GeoView::new(0, 0, 15, 15)` covers
/// 16×16 blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeoView {
    pub x0: i32,
    pub z0: i32,
    pub x1: i32,
    pub z1: i32,
}

impl GeoView {
    pub const fn new(x0: i32, z0: i32, x1: i32, z1: i32) -> Self {
        Self { x0, z0, x1, z1 }
    }

    /// View of `shape` with its top-left corner at `(x0, z0)`.
    pub fn of_shape(x0: i32, z0: i32, shape: RasterShape) -> Self {
        Self::new(
            x0,
            z0,
            x0 + shape.width() as i32 - 1,
            z0 + shape.height() as i32 - 1,
        )
    }

    pub const fn width(&self) -> i32 {
        self.x1 - self.x0 + 1
    }

    pub const fn height(&self) -> i32 {
        self.z1 - self.z0 + 1
    }

    /// Shape of a raster covering this view.
    ///
    /// # Panics
    ///
    /// Panics if the view is inverted.
    pub fn shape(&self) -> RasterShape {
        assert!(
            self.width() >= 0 && self.height() >= 0,
            "inverted view {}",
            self
        );
        RasterShape::new(self.width() as usize, self.height() as usize)
    }

    /// Converts block coordinates into the bounds of the cells of `cell`
    /// size that cover them, rounding towards negative infinity.
    pub fn floor_div(&self, cell: RasterShape) -> Self {
        let w = cell.width() as i32;
        let h = cell.height() as i32;
        Self::new(
            self.x0.div_euclid(w),
            self.z0.div_euclid(h),
            self.x1.div_euclid(w),
            self.z1.div_euclid(h),
        )
    }

    /// Grows the view by `before` on the low sides and `after` on the high
    /// sides.
    pub const fn expand(&self, before: i32, after: i32) -> Self {
        Self::new(
            self.x0 - before,
            self.z0 - before,
            self.x1 + after,
            self.z1 + after,
        )
    }

    pub const fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.x0 && x <= self.x1 && z >= self.z0 && z <= self.z1
    }
}

impl fmt::Display for GeoView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]..[{}, {}]", self.x0, self.z0, self.x1, self.z1)
    }
}
