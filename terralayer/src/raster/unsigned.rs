use super::{
    assert_same_shape, copy_clipped, EnumRaster, IntRaster, Raster, RasterEnum, RasterShape,
};

/// A raster of unsigned bytes (0..=255).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedByteRaster {
    shape: RasterShape,
    values: Vec<u8>,
}

impl UnsignedByteRaster {
    /// Wraps an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` differs from `shape.size()`.
    pub fn wrap(shape: RasterShape, values: Vec<u8>) -> Self {
        assert_eq!(
            values.len(),
            shape.size(),
            "buffer length does not match raster shape {}",
            shape
        );
        Self { shape, values }
    }

    /// Creates a raster with every element set to `value`.
    pub fn filled(shape: RasterShape, value: u8) -> Self {
        Self {
            shape,
            values: vec![value; shape.size()],
        }
    }

    /// Converts any integer raster, truncating each value to its low byte.
    pub fn copy_of<R: IntRaster>(source: &R) -> Self {
        let shape = source.shape();
        let mut raster = Self::create(shape);
        for y in 0..shape.height() {
            for x in 0..shape.width() {
                raster.put_int(x, y, source.get_int(x, y));
            }
        }
        raster
    }

    /// Interprets every byte as an id and maps it through `lookup`.
    ///
    /// `lookup` is evaluated once per possible byte value.
    pub fn map_to_enum<E, F>(&self, lookup: F) -> EnumRaster<E>
    where
        E: RasterEnum,
        F: Fn(u8) -> E,
    {
        let mut ordinals = [0u8; 256];
        for (id, ordinal) in ordinals.iter_mut().enumerate() {
            *ordinal = lookup(id as u8).ordinal();
        }
        let mapped = self.values.iter().map(|&v| ordinals[v as usize]).collect();
        EnumRaster::from_ordinals(self.shape, mapped)
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.values[self.shape.index(x, y)]
    }

    pub fn put(&mut self, x: usize, y: usize, value: u8) {
        let index = self.shape.index(x, y);
        self.values[index] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.values
    }
}

impl Raster for UnsignedByteRaster {
    fn create(shape: RasterShape) -> Self {
        Self::filled(shape, 0)
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

impl IntRaster for UnsignedByteRaster {
    fn get_int(&self, x: usize, y: usize) -> i32 {
        self.get(x, y) as i32
    }

    fn put_int(&mut self, x: usize, y: usize, value: i32) {
        self.put(x, y, value as u8);
    }
}
