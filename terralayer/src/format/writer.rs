//! Encoding of raster containers.

use std::io::{self, Write};

use bytes::BufMut;
use xz2::write::XzEncoder;

use super::{FormatRaster, RasterFilter, SIGNATURE, VERSION};
use crate::raster::{EnumRaster, RasterEnum, RasterShape};

/// Default edge length of the square chunks a raster is split into.
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// Default xz preset.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Encoder for raster containers.
///
/// # Example
///
/// ```ignore
/// let bytes = RasterWriter::new()
///     .with_chunk_size(500)
///     .with_filter(RasterFilter::Paeth)
///     .write(&elevation)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RasterWriter {
    chunk_size: usize,
    filter: RasterFilter,
    compression_level: u32,
}

impl Default for RasterWriter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            filter: RasterFilter::None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl RasterWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// Panics if `chunk_size` is 0.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_filter(mut self, filter: RasterFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Encodes `raster`, split into chunks of at most `chunk_size`².
    pub fn write<R: FormatRaster>(&self, raster: &R) -> io::Result<Vec<u8>> {
        let shape = raster.shape();
        let mut out = Vec::new();
        out.put_slice(SIGNATURE);
        out.put_u8(VERSION);
        out.put_i32(to_i32(shape.width())?);
        out.put_i32(to_i32(shape.height())?);
        out.put_u8(R::FORMAT.id());

        for y in (0..shape.height()).step_by(self.chunk_size) {
            for x in (0..shape.width()).step_by(self.chunk_size) {
                let chunk_shape = RasterShape::new(
                    self.chunk_size.min(shape.width() - x),
                    self.chunk_size.min(shape.height() - y),
                );
                self.write_chunk(&mut out, raster, x, y, chunk_shape)?;
            }
        }

        Ok(out)
    }

    /// Encodes an enum raster as a container of its wire ids.
    pub fn write_enum<E: RasterEnum>(&self, raster: &EnumRaster<E>) -> io::Result<Vec<u8>> {
        self.write(&raster.to_ids())
    }

    fn write_chunk<R: FormatRaster>(
        &self,
        out: &mut Vec<u8>,
        raster: &R,
        x: usize,
        y: usize,
        shape: RasterShape,
    ) -> io::Result<()> {
        let chunk = if x == 0 && y == 0 && shape == raster.shape() {
            self.filter.encode(raster)
        } else {
            let mut region = R::create(shape);
            region.copy_from_clipped(raster, -(x as isize), -(y as isize));
            self.filter.encode(&region)
        };

        let mut encoder = XzEncoder::new(Vec::new(), self.compression_level);
        encoder.write_all(&chunk.encode_payload())?;
        let payload = encoder.finish()?;

        let body_len = 4 * 4 + 1 + payload.len();
        out.put_u32(u32::try_from(body_len).map_err(|_| too_large(body_len))?);
        out.put_i32(to_i32(x)?);
        out.put_i32(to_i32(y)?);
        out.put_i32(to_i32(shape.width())?);
        out.put_i32(to_i32(shape.height())?);
        out.put_u8(self.filter.id());
        out.put_slice(&payload);
        Ok(())
    }
}

fn to_i32(value: usize) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| too_large(value))
}

fn too_large(value: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("value {} does not fit the raster container", value),
    )
}
