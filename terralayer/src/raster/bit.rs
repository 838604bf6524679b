use super::{assert_same_shape, clip, IntRaster, Raster, RasterShape};

const WORD_BITS: usize = 64;

/// A raster of single bits, packed 64 to a word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitRaster {
    shape: RasterShape,
    words: Vec<u64>,
}

impl BitRaster {
    /// Builds a raster from bytes packed least-significant bit first.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `ceil(size / 8)`.
    pub fn from_packed_bytes(shape: RasterShape, bytes: &[u8]) -> Self {
        let byte_len = shape.size().div_ceil(8);
        assert!(
            bytes.len() >= byte_len,
            "expected {} packed bytes for bit raster of shape {}, got {}",
            byte_len,
            shape,
            bytes.len()
        );

        let mut raster = Self::create(shape);
        for (i, chunk) in bytes[..byte_len].chunks(8).enumerate() {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            raster.words[i] = u64::from_le_bytes(word);
        }
        raster.clear_trailing_bits();
        raster
    }

    /// Packs the raster into bytes, least-significant bit first.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let byte_len = self.shape.size().div_ceil(8);
        let mut bytes: Vec<u8> = self.words.iter().flat_map(|w| w.to_le_bytes()).collect();
        bytes.truncate(byte_len);
        bytes
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        let index = self.shape.index(x, y);
        self.bit(index)
    }

    pub fn put(&mut self, x: usize, y: usize, value: bool) {
        let index = self.shape.index(x, y);
        self.set_bit(index, value);
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    fn bit(&self, index: usize) -> bool {
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 != 0
    }

    #[inline]
    fn set_bit(&mut self, index: usize, value: bool) {
        let mask = 1u64 << (index % WORD_BITS);
        let word = &mut self.words[index / WORD_BITS];
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    fn clear_trailing_bits(&mut self) {
        let used = self.shape.size() % WORD_BITS;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

impl Raster for BitRaster {
    fn create(shape: RasterShape) -> Self {
        Self {
            shape,
            words: vec![0; shape.size().div_ceil(WORD_BITS)],
        }
    }

    fn shape(&self) -> RasterShape {
        self.shape
    }

    fn copy_from(&mut self, source: &Self) {
        assert_same_shape(self.shape, source.shape);
        self.words.copy_from_slice(&source.words);
    }

    fn copy_from_clipped(&mut self, source: &Self, x0: isize, y0: isize) {
        if x0 == 0 && y0 == 0 && self.shape == source.shape {
            self.copy_from(source);
            return;
        }

        let Some(region) = clip(self.shape, source.shape, x0, y0) else {
            return;
        };

        for row in 0..region.height {
            for col in 0..region.width {
                let value = source.bit(
                    source
                        .shape
                        .index_unchecked(region.src_x + col, region.src_y + row),
                );
                let index = self
                    .shape
                    .index_unchecked(region.dst_x + col, region.dst_y + row);
                self.set_bit(index, value);
            }
        }
    }
}

impl IntRaster for BitRaster {
    fn get_int(&self, x: usize, y: usize) -> i32 {
        self.get(x, y) as i32
    }

    fn put_int(&mut self, x: usize, y: usize, value: i32) {
        self.put(x, y, value & 1 != 0);
    }
}
