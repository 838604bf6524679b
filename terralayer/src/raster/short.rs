use super::{assert_same_shape, copy_clipped, IntRaster, Raster, RasterShape};

/// A raster of signed 16-bit values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortRaster {
    shape: RasterShape,
    values: Vec<i16>,
}

impl ShortRaster {
    /// Wraps an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from `shape.size()`.
    pub fn wrap(shape: RasterShape, values: Vec<i16>) -> Self {
        assert_eq!(
            values.len(),
            shape.size(),
            "buffer length does not match raster shape {}",
            shape
        );
        Self { shape, values }
    }

    pub fn get(&self, x: usize, y: usize) -> i16 {
        self.values[self.shape.index(x, y)]
    }

    pub fn put(&mut self, x: usize, y: usize, value: i16) {
        let index = self.shape.index(x, y);
        self.values[index] = value;
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.values
    }

    /// Smallest and largest value, or `None` for an empty raster.
    pub fn min_max(&self) -> Option<(i16, i16)> {
        let mut values = self.values.iter().copied();
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

impl Raster for ShortRaster {
    fn create(shape: RasterShape) -> Self {
        Self {
            shape,
            values: vec![0; shape.size()],
        }
    }

    fn shape(&self) -> RasterShape {
        self.shape
    }

    fn copy_from(&mut self, source: &Self) {
        assert_same_shape(self.shape, source.shape);
        self.values.copy_from_slice(&source.values);
    }

    fn copy_from_clipped(&mut self, source: &Self, x0: isize, y0: isize) {
        copy_clipped(
            &mut self.values,
            self.shape,
            &source.values,
            source.shape,
            x0,
            y0,
        );
    }
}

impl IntRaster for ShortRaster {
    fn get_int(&self, x: usize, y: usize) -> i32 {
        self.get(x, y) as i32
    }

    fn put_int(&mut self, x: usize, y: usize, value: i32) {
        self.put(x, y, value as i16);
    }
}
