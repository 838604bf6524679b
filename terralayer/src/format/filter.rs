use crate::raster::IntRaster;

/// Row-wise delta filter applied to chunk payloads before compression.
///
/// Each element is stored as the difference to a prediction built from its
/// neighbours: `a` (left), `b` (up) and `c` (up-left). Neighbours outside the
/// raster read as 0.
///
/// ```text
///   c b
///   a x
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RasterFilter {
    #[default]
    None,
    Left,
    Up,
    Average,
    Paeth,
}

impl RasterFilter {
    pub fn id(self) -> u8 {
        match self {
            RasterFilter::None => 0,
            RasterFilter::Left => 1,
            RasterFilter::Up => 2,
            RasterFilter::Average => 3,
            RasterFilter::Paeth => 4,
        }
    }

    /// Resolves a filter id. Unknown ids decode as [`RasterFilter::None`].
    pub fn by_id(id: u8) -> Self {
        match id {
            1 => RasterFilter::Left,
            2 => RasterFilter::Up,
            3 => RasterFilter::Average,
            4 => RasterFilter::Paeth,
            _ => RasterFilter::None,
        }
    }

    /// Prediction for an element given its neighbours.
    pub fn predict(self, a: i32, b: i32, c: i32) -> i32 {
        match self {
            RasterFilter::None => 0,
            RasterFilter::Left => a,
            RasterFilter::Up => b,
            RasterFilter::Average => a.wrapping_add(b) / 2,
            RasterFilter::Paeth => {
                let p = a.wrapping_add(b).wrapping_sub(c);
                let da = a.wrapping_sub(p).wrapping_abs();
                let db = b.wrapping_sub(p).wrapping_abs();
                let dc = c.wrapping_sub(p).wrapping_abs();
                if da < db && da < dc {
                    a
                } else if db < dc {
                    b
                } else {
                    c
                }
            }
        }
    }

    /// Reconstructs an element from its stored delta `x`.
    pub fn evaluate(self, x: i32, a: i32, b: i32, c: i32) -> i32 {
        x.wrapping_add(self.predict(a, b, c))
    }

    /// Undoes the filter in place, row-major.
    ///
    /// `a` is the previously evaluated value of the row before it is written
    /// back, so it may lie outside the element range; `b` and `c` are read
    /// back from the raster.
    pub fn decode_in_place<R: IntRaster>(self, raster: &mut R) {
        if self == RasterFilter::None {
            return;
        }

        let shape = raster.shape();
        for y in 0..shape.height() {
            let mut last = 0;
            for x in 0..shape.width() {
                let value = raster.get_int(x, y);
                let b = if y > 0 { raster.get_int(x, y - 1) } else { 0 };
                let c = if x > 0 && y > 0 {
                    raster.get_int(x - 1, y - 1)
                } else {
                    0
                };
                let evaluated = self.evaluate(value, last, b, c);
                raster.put_int(x, y, evaluated);
                last = evaluated;
            }
        }
    }

    /// Applies the filter, producing the deltas that
    /// [`decode_in_place`](Self::decode_in_place) turns back into `raster`.
    pub fn encode<R: IntRaster>(self, raster: &R) -> R {
        if self == RasterFilter::None {
            return raster.clone();
        }

        let shape = raster.shape();
        let mut deltas = R::create(shape);
        for y in 0..shape.height() {
            let mut last = 0;
            for x in 0..shape.width() {
                let value = raster.get_int(x, y);
                let b = if y > 0 { raster.get_int(x, y - 1) } else { 0 };
                let c = if x > 0 && y > 0 {
                    raster.get_int(x - 1, y - 1)
                } else {
                    0
                };
                let prediction = self.predict(last, b, c);
                deltas.put_int(x, y, value.wrapping_sub(prediction));
                // Track what the decoder will see after truncation
                last = deltas.get_int(x, y).wrapping_add(prediction);
            }
        }
        deltas
    }
}
