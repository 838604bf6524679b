//! Decoding of raster containers.

use std::io::Read;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::{Buf, Bytes};
use futures::future::FutureExt;
use thiserror::Error;
use tracing::{error, trace};
use xz2::read::XzDecoder;

use super::{FormatRaster, RasterFilter, RasterFormat, SIGNATURE, VERSION};
use crate::executor::{BlockingExecutorExt, SharedExecutor};
use crate::loader::{LoadFuture, Loader};
use crate::raster::{EnumRaster, RasterEnum, RasterShape, UnsignedByteRaster};

const DATA_HEADER_LEN: usize = 4 + 4 + 1;
const CHUNK_HEADER_LEN: usize = 4 * 4 + 1;

/// Largest accepted edge length of a raster or chunk.
pub const MAX_RASTER_SIDE: i32 = 1 << 15;

/// Largest accepted element count of a raster or chunk.
pub const MAX_RASTER_ELEMENTS: usize = 1 << 26;

/// Errors raised while decoding a raster container.
#[derive(Debug, Error)]
pub enum RasterReadError {
    #[error("invalid signature: {0:?}")]
    InvalidSignature(String),

    #[error("unrecognized raster version: {0}")]
    UnsupportedVersion(u8),

    #[error("expected raster of format {expected}, but got format id {actual}")]
    FormatMismatch { expected: RasterFormat, actual: u8 },

    #[error("invalid raster shape {width}x{height}")]
    InvalidShape { width: i32, height: i32 },

    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("failed to decompress chunk: {0}")]
    Decompression(#[from] std::io::Error),

    #[error("expected {expected} payload bytes, got {actual}")]
    PayloadSize { expected: usize, actual: usize },
}

/// Splits `len` bytes off the front of `buf`.
fn take<'a>(buf: &mut &'a [u8], len: usize) -> Result<&'a [u8], RasterReadError> {
    if buf.len() < len {
        return Err(RasterReadError::Truncated {
            needed: len,
            remaining: buf.len(),
        });
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

/// Validates a declared shape before anything is allocated for it.
fn shape_of(width: i32, height: i32) -> Result<RasterShape, RasterReadError> {
    let in_range = |side: i32| (0..=MAX_RASTER_SIDE).contains(&side);
    if !in_range(width) || !in_range(height) {
        return Err(RasterReadError::InvalidShape { width, height });
    }
    match (width as usize).checked_mul(height as usize) {
        Some(size) if size <= MAX_RASTER_ELEMENTS => {
            Ok(RasterShape::new(width as usize, height as usize))
        }
        _ => Err(RasterReadError::InvalidShape { width, height }),
    }
}

/// Decoder for raster containers.
pub struct RasterReader;

impl RasterReader {
    /// Decodes a container holding a raster of type `R`.
    pub fn read<R: FormatRaster>(bytes: &[u8]) -> Result<R, RasterReadError> {
        let mut buf = bytes;

        let signature = take(&mut buf, SIGNATURE.len())?;
        if signature != SIGNATURE {
            return Err(RasterReadError::InvalidSignature(
                String::from_utf8_lossy(signature).into_owned(),
            ));
        }
        let version = take(&mut buf, 1)?[0];
        if version != VERSION {
            return Err(RasterReadError::UnsupportedVersion(version));
        }

        let mut header = take(&mut buf, DATA_HEADER_LEN)?;
        let width = header.get_i32();
        let height = header.get_i32();
        let format_id = header.get_u8();
        if RasterFormat::by_id(format_id) != Some(R::FORMAT) {
            return Err(RasterReadError::FormatMismatch {
                expected: R::FORMAT,
                actual: format_id,
            });
        }
        let shape = shape_of(width, height)?;

        let mut output: Option<R> = None;
        while !buf.is_empty() {
            let chunk_len = take(&mut buf, 4)?.get_u32() as usize;
            let chunk = take(&mut buf, chunk_len)?;
            output = Some(Self::read_chunk(chunk, output, shape)?);
        }

        Ok(output.unwrap_or_else(|| R::create(shape)))
    }

    /// Decodes a container of enum ids, mapping every id through `lookup`.
    pub fn read_enum<E, F>(bytes: &[u8], lookup: F) -> Result<EnumRaster<E>, RasterReadError>
    where
        E: RasterEnum,
        F: Fn(u8) -> E,
    {
        Ok(Self::read::<UnsignedByteRaster>(bytes)?.map_to_enum(lookup))
    }

    fn read_chunk<R: FormatRaster>(
        mut chunk: &[u8],
        output: Option<R>,
        output_shape: RasterShape,
    ) -> Result<R, RasterReadError> {
        let mut header = take(&mut chunk, CHUNK_HEADER_LEN)?;
        let x = header.get_i32();
        let y = header.get_i32();
        let width = header.get_i32();
        let height = header.get_i32();
        let filter = RasterFilter::by_id(header.get_u8());
        let shape = shape_of(width, height)?;
        if shape.width() > output_shape.width() || shape.height() > output_shape.height() {
            return Err(RasterReadError::InvalidShape { width, height });
        }

        // One byte past the expected length is enough to report a mismatch
        let expected = R::FORMAT.payload_len(shape);
        let mut payload = Vec::new();
        XzDecoder::new(chunk)
            .take(expected as u64 + 1)
            .read_to_end(&mut payload)?;

        let mut raw = R::decode_payload(shape, &payload)?;
        filter.decode_in_place(&mut raw);
        trace!(x, y, shape = %shape, filter = ?filter, "decoded raster chunk");

        if x == 0 && y == 0 && shape == output_shape {
            return Ok(raw);
        }

        let mut output = output.unwrap_or_else(|| R::create(output_shape));
        output.copy_from_clipped(&raw, x as isize, y as isize);
        Ok(output)
    }

    /// Loader decoding containers of `R` on `executor`.
    pub fn loader<R: FormatRaster>(executor: SharedExecutor) -> RasterLoader<R> {
        RasterLoader::new(executor, |bytes| Self::read::<R>(bytes))
    }

    /// Loader decoding containers of enum ids on `executor`.
    pub fn enum_loader<E: RasterEnum>(
        executor: SharedExecutor,
        lookup: fn(u8) -> E,
    ) -> RasterLoader<EnumRaster<E>> {
        RasterLoader::new(executor, move |bytes| Self::read_enum(bytes, lookup))
    }
}

type DecodeFn<T> = dyn Fn(&[u8]) -> Result<T, RasterReadError> + Send + Sync;

/// Loader turning container bytes into shared rasters.
///
/// Decode errors are logged and folded into `None`.
pub struct RasterLoader<T> {
    executor: SharedExecutor,
    decode: Arc<DecodeFn<T>>,
    _output: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> RasterLoader<T> {
    fn new<F>(executor: SharedExecutor, decode: F) -> Self
    where
        F: Fn(&[u8]) -> Result<T, RasterReadError> + Send + Sync + 'static,
    {
        Self {
            executor,
            decode: Arc::new(decode),
            _output: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> Loader<Bytes, Arc<T>> for RasterLoader<T> {
    fn load(&self, bytes: Bytes) -> LoadFuture<Arc<T>> {
        let decode = Arc::clone(&self.decode);
        let decoded = self.executor.execute(move || decode(&bytes));
        async move {
            match decoded.await {
                Ok(Ok(raster)) => Some(Arc::new(raster)),
                Ok(Err(e)) => {
                    error!(
                        raster = std::any::type_name::<T>(),
                        error = %e,
                        "failed to read raster"
                    );
                    None
                }
                Err(e) => {
                    error!(error = %e, "raster decode task failed");
                    None
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::format::RasterWriter;
    use crate::raster::{Raster, ShortRaster};
    use std::io::Write;
    use xz2::write::XzEncoder;

    fn header(width: i32, height: i32, format: u8) -> Vec<u8> {
        let mut bytes = SIGNATURE.to_vec();
        bytes.push(VERSION);
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.push(format);
        bytes
    }

    fn chunk(x: i32, y: i32, w: i32, h: i32, filter: u8, raw: &[u8]) -> Vec<u8> {
        let mut encoder = XzEncoder::new(Vec::new(), 6);
        encoder.write_all(raw).unwrap();
        let payload = encoder.finish().unwrap();

        let mut body = Vec::new();
        for v in [x, y, w, h] {
            body.extend_from_slice(&v.to_be_bytes());
        }
        body.push(filter);
        body.extend_from_slice(&payload);

        let mut bytes = (body.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(&body);
        bytes
    }

    #[test]
    fn test_no_chunks_yields_zero_raster() {
        let raster: ShortRaster = RasterReader::read(&header(3, 2, 2)).unwrap();

        assert_eq!(raster.shape(), RasterShape::new(3, 2));
        assert!(raster.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_filtered_chunk_decodes() {
        let mut bytes = header(3, 1, 2);
        bytes.extend(chunk(0, 0, 3, 1, 1, &[0, 5, 0xff, 0xfd, 0, 2]));

        let raster: ShortRaster = RasterReader::read(&bytes).unwrap();

        assert_eq!(raster.as_slice(), &[5, 2, 4]);
    }

    #[test]
    fn test_partial_chunks_are_clipped_into_output() {
        let mut bytes = header(3, 2, 0);
        bytes.extend(chunk(2, 1, 2, 2, 0, &[7, 8, 9, 10]));
        bytes.extend(chunk(-1, 0, 2, 1, 0, &[1, 2]));

        let raster: UnsignedByteRaster = RasterReader::read(&bytes).unwrap();

        assert_eq!(raster.as_slice(), &[2, 0, 0, 0, 0, 7]);
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = header(1, 1, 0);
        bytes[0] = b'X';

        let result = RasterReader::read::<UnsignedByteRaster>(&bytes);

        assert!(matches!(result, Err(RasterReadError::InvalidSignature(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = header(1, 1, 0);
        bytes[SIGNATURE.len()] = 1;

        let result = RasterReader::read::<UnsignedByteRaster>(&bytes);

        assert!(matches!(result, Err(RasterReadError::UnsupportedVersion(1))));
    }

    #[test]
    fn test_format_mismatch() {
        let result = RasterReader::read::<UnsignedByteRaster>(&header(1, 1, 2));

        assert!(matches!(
            result,
            Err(RasterReadError::FormatMismatch {
                expected: RasterFormat::UnsignedByte,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_truncated_chunk() {
        let mut bytes = header(1, 1, 0);
        bytes.extend(chunk(0, 0, 1, 1, 0, &[3]));
        bytes.truncate(bytes.len() - 2);

        let result = RasterReader::read::<UnsignedByteRaster>(&bytes);

        assert!(matches!(result, Err(RasterReadError::Truncated { .. })));
    }

    #[test]
    fn test_trailing_bytes_are_truncation() {
        let mut bytes = header(1, 1, 0);
        bytes.extend_from_slice(&[0, 0]);

        let result = RasterReader::read::<UnsignedByteRaster>(&bytes);

        assert!(matches!(
            result,
            Err(RasterReadError::Truncated {
                needed: 4,
                remaining: 2
            })
        ));
    }

    #[test]
    fn test_corrupt_payload_fails_decompression() {
        let mut bytes = header(1, 1, 0);
        let mut body = Vec::new();
        for v in [0i32, 0, 1, 1] {
            body.extend_from_slice(&v.to_be_bytes());
        }
        body.push(0);
        body.extend_from_slice(b"not xz at all");
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend(body);

        let result = RasterReader::read::<UnsignedByteRaster>(&bytes);

        assert!(matches!(result, Err(RasterReadError::Decompression(_))));
    }

    fn chunk_header_only(x: i32, y: i32, w: i32, h: i32, rest: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        for v in [x, y, w, h] {
            body.extend_from_slice(&v.to_be_bytes());
        }
        body.push(0);
        body.extend_from_slice(rest);
        let mut bytes = (body.len() as u32).to_be_bytes().to_vec();
        bytes.extend(body);
        bytes
    }

    #[test]
    fn test_huge_chunk_shape_is_rejected() {
        let mut bytes = header(1, 1, 2);
        bytes.extend(chunk_header_only(0, 0, i32::MAX, i32::MAX, b"garbage"));

        let result = RasterReader::read::<ShortRaster>(&bytes);

        assert!(matches!(
            result,
            Err(RasterReadError::InvalidShape {
                width: i32::MAX,
                height: i32::MAX
            })
        ));
    }

    #[test]
    fn test_chunk_larger_than_output_is_rejected() {
        let mut bytes = header(2, 2, 0);
        bytes.extend(chunk(0, 0, 3, 1, 0, &[1, 2, 3]));

        let result = RasterReader::read::<UnsignedByteRaster>(&bytes);

        assert!(matches!(
            result,
            Err(RasterReadError::InvalidShape { width: 3, height: 1 })
        ));
    }

    #[test]
    fn test_oversized_header_is_rejected() {
        for (width, height) in [(i32::MAX, 1), (1, MAX_RASTER_SIDE + 1), (-1, 4)] {
            let result = RasterReader::read::<UnsignedByteRaster>(&header(width, height, 0));

            assert!(
                matches!(result, Err(RasterReadError::InvalidShape { .. })),
                "{}x{} should be rejected",
                width,
                height
            );
        }

        // Both sides in range, but too many elements in total
        let result =
            RasterReader::read::<UnsignedByteRaster>(&header(MAX_RASTER_SIDE, MAX_RASTER_SIDE, 0));
        assert!(matches!(result, Err(RasterReadError::InvalidShape { .. })));
    }

    #[test]
    fn test_payload_shorter_than_chunk_shape() {
        let mut bytes = header(2, 2, 0);
        bytes.extend(chunk(0, 0, 2, 2, 0, &[1, 2, 3]));

        let result = RasterReader::read::<UnsignedByteRaster>(&bytes);

        assert!(matches!(
            result,
            Err(RasterReadError::PayloadSize {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_payload_longer_than_chunk_shape() {
        let mut bytes = header(2, 2, 2);
        bytes.extend(chunk(0, 0, 1, 1, 0, &[0u8; 64]));

        let result = RasterReader::read::<ShortRaster>(&bytes);

        assert!(matches!(
            result,
            Err(RasterReadError::PayloadSize {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_chunk_outside_output_is_dropped() {
        let mut bytes = header(2, 2, 0);
        bytes.extend(chunk(5, -7, 2, 2, 0, &[9, 9, 9, 9]));

        let raster: UnsignedByteRaster = RasterReader::read(&bytes).unwrap();

        assert_eq!(raster.as_slice(), &[0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_loader_folds_huge_shape() {
        let loader = RasterReader::loader::<ShortRaster>(InlineExecutor::shared());
        let mut bytes = header(i32::MAX, i32::MAX, 2);
        bytes.extend(chunk_header_only(0, 0, i32::MAX, i32::MAX, b"garbage"));

        assert!(loader.load(Bytes::from(bytes)).await.is_none());
    }

    #[tokio::test]
    async fn test_loader_folds_errors() {
        let loader = RasterReader::loader::<ShortRaster>(InlineExecutor::shared());

        let garbage = loader.load(Bytes::from_static(b"garbage")).await;
        assert!(garbage.is_none());

        let raster = ShortRaster::wrap(RasterShape::new(2, 1), vec![-7, 300]);
        let bytes = RasterWriter::new().write(&raster).unwrap();
        let loaded = loader.load(Bytes::from(bytes)).await.unwrap();
        assert_eq!(*loaded, raster);
    }
}
