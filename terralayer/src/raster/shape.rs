use std::fmt;

/// Dimensions of a raster buffer.
///
/// Points are addressed row-major: `index(x, y) = x + y * width`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RasterShape {
    width: usize,
    height: usize,
}

impl RasterShape {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub const fn width(self) -> usize {
        self.width
    }

    pub const fn height(self) -> usize {
        self.height
    }

    /// Number of elements in a raster of this shape.
    pub const fn size(self) -> usize {
        self.width * self.height
    }

    pub const fn contains(self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Returns the buffer index of `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the point lies outside of this shape.
    #[inline]
    pub fn index(self, x: usize, y: usize) -> usize {
        assert!(
            self.contains(x, y),
            "point ({}; {}) out of bounds for raster of shape {}",
            x,
            y,
            self
        );
        self.index_unchecked(x, y)
    }

    /// Returns the buffer index of `(x, y)` without checking bounds.
    ///
    /// The result is only meaningful when `contains(x, y)` holds.
    #[inline]
    pub const fn index_unchecked(self, x: usize, y: usize) -> usize {
        x + y * self.width
    }
}

impl fmt::Display for RasterShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
