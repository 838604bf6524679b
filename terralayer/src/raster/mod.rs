//! Typed fixed-shape raster buffers.
//!
//! Every raster owns a flat row-major buffer of a single element type:
//!
//! | Type | Element | Storage |
//! |------|---------|---------|
//! | [`BitRaster`] | `bool` | packed `u64` words |
//! | [`ByteRaster`] | `i8` | one byte |
//! | [`UnsignedByteRaster`] | `u8` | one byte |
//! | [`ShortRaster`] | `i16` | two bytes |
//! | [`EnumRaster`] | [`RasterEnum`] | one ordinal byte |
//!
//! Copies are typed on `Self`, so mixing raster types is rejected at compile
//! time. Mismatched shapes are a contract violation and panic.
//!
//! # Clipped copies
//!
//! ```text
//!        x0
//!   ┌────┼──────────────┐ destination
//!   │    ┌─────────┐    │
//! y0┼────┤ source  │    │
//!   │    │         │    │
//!   └────┼─────────┼────┘
//!        └─────────┘  ◄── rows and columns outside the
//!                         destination are dropped
//! ```

mod bit;
mod byte;
mod enums;
mod shape;
mod short;
mod unsigned;

pub use bit::BitRaster;
pub use byte::ByteRaster;
pub use enums::{EnumRaster, PaletteError, PalettedBuffer, RasterEnum};
pub use shape::RasterShape;
pub use short::ShortRaster;
pub use unsigned::UnsignedByteRaster;

/// A typed, fixed-shape 2D buffer.
pub trait Raster: Clone + Send + Sync + 'static {
    /// Creates a raster filled with the type's default value.
    fn create(shape: RasterShape) -> Self
    where
        Self: Sized;

    fn shape(&self) -> RasterShape;

    fn width(&self) -> usize {
        self.shape().width()
    }

    fn height(&self) -> usize {
        self.shape().height()
    }

    /// Overwrites this raster with the contents of `source`.
    ///
    /// # Panics
    ///
    /// Panics if the shapes differ.
    fn copy_from(&mut self, source: &Self);

    /// Copies `source` into this raster with its origin at `(x0, y0)`,
    /// dropping whatever falls outside of this raster's bounds.
    fn copy_from_clipped(&mut self, source: &Self, x0: isize, y0: isize);

    /// Copies `source` into this raster with its origin at `(x0, y0)`.
    ///
    /// # Panics
    ///
    /// Panics if `source` does not fit entirely inside this raster.
    fn copy_from_at(&mut self, source: &Self, x0: usize, y0: usize) {
        let fits = x0 + source.width() <= self.width() && y0 + source.height() <= self.height();
        assert!(
            fits,
            "raster of shape {} does not fit into {} at ({}; {})",
            source.shape(),
            self.shape(),
            x0,
            y0
        );
        self.copy_from_clipped(source, x0 as isize, y0 as isize);
    }
}

/// A raster whose elements can be read and written as integers.
///
/// `put_int` truncates to the element width the same way a cast would, so
/// values wrap rather than saturate.
pub trait IntRaster: Raster {
    fn get_int(&self, x: usize, y: usize) -> i32;

    fn put_int(&mut self, x: usize, y: usize, value: i32);
}

/// Intersection of a clipped copy, in both coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClipRegion {
    pub dst_x: usize,
    pub dst_y: usize,
    pub src_x: usize,
    pub src_y: usize,
    pub width: usize,
    pub height: usize,
}

/// Computes the region of `source` placed at `(x0, y0)` that lands inside
/// `destination`. Returns `None` when nothing overlaps.
pub(crate) fn clip(
    destination: RasterShape,
    source: RasterShape,
    x0: isize,
    y0: isize,
) -> Option<ClipRegion> {
    let x_start = x0.max(0);
    let y_start = y0.max(0);
    let x_end = (x0 + source.width() as isize).min(destination.width() as isize);
    let y_end = (y0 + source.height() as isize).min(destination.height() as isize);

    if x_start >= x_end || y_start >= y_end {
        return None;
    }

    Some(ClipRegion {
        dst_x: x_start as usize,
        dst_y: y_start as usize,
        src_x: (x_start - x0) as usize,
        src_y: (y_start - y0) as usize,
        width: (x_end - x_start) as usize,
        height: (y_end - y_start) as usize,
    })
}

pub(crate) fn assert_same_shape(destination: RasterShape, source: RasterShape) {
    assert!(
        destination == source,
        "raster shapes differ: expected {}, got {}",
        destination,
        source
    );
}

/// Row-wise clipped copy shared by the byte-addressed raster types.
pub(crate) fn copy_clipped<T: Copy>(
    dst: &mut [T],
    dst_shape: RasterShape,
    src: &[T],
    src_shape: RasterShape,
    x0: isize,
    y0: isize,
) {
    if x0 == 0 && y0 == 0 && dst_shape == src_shape {
        dst.copy_from_slice(src);
        return;
    }

    let Some(region) = clip(dst_shape, src_shape, x0, y0) else {
        return;
    };

    for row in 0..region.height {
        let d = dst_shape.index_unchecked(region.dst_x, region.dst_y + row);
        let s = src_shape.index_unchecked(region.src_x, region.src_y + row);
        dst[d..d + region.width].copy_from_slice(&src[s..s + region.width]);
    }
}
