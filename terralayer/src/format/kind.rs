use std::fmt;

use super::RasterReadError;
use crate::raster::{BitRaster, ByteRaster, IntRaster, RasterShape, ShortRaster, UnsignedByteRaster};

/// Element encoding declared by a raster container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RasterFormat {
    UnsignedByte,
    Byte,
    Short,
    Bit,
}

impl RasterFormat {
    pub fn id(self) -> u8 {
        match self {
            RasterFormat::UnsignedByte => 0,
            RasterFormat::Byte => 1,
            RasterFormat::Short => 2,
            RasterFormat::Bit => 3,
        }
    }

    pub fn by_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(RasterFormat::UnsignedByte),
            1 => Some(RasterFormat::Byte),
            2 => Some(RasterFormat::Short),
            3 => Some(RasterFormat::Bit),
            _ => None,
        }
    }

    /// Number of payload bytes holding a raster of `shape`.
    pub fn payload_len(self, shape: RasterShape) -> usize {
        match self {
            RasterFormat::UnsignedByte | RasterFormat::Byte => shape.size(),
            RasterFormat::Short => shape.size() * 2,
            RasterFormat::Bit => shape.size().div_ceil(8),
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RasterFormat::UnsignedByte => "unsigned_byte",
            RasterFormat::Byte => "byte",
            RasterFormat::Short => "short",
            RasterFormat::Bit => "bit",
        };
        f.write_str(name)
    }
}

/// A raster type with a wire encoding.
pub trait FormatRaster: IntRaster {
    const FORMAT: RasterFormat;

    /// Decodes raw (decompressed) elements.
    fn decode_payload(shape: RasterShape, payload: &[u8]) -> Result<Self, RasterReadError>;

    /// Encodes raw elements, ready for compression.
    fn encode_payload(&self) -> Vec<u8>;
}

fn check_payload_len(
    format: RasterFormat,
    shape: RasterShape,
    payload: &[u8],
) -> Result<(), RasterReadError> {
    let expected = format.payload_len(shape);
    if payload.len() != expected {
        return Err(RasterReadError::PayloadSize {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

impl FormatRaster for UnsignedByteRaster {
    const FORMAT: RasterFormat = RasterFormat::UnsignedByte;

    fn decode_payload(shape: RasterShape, payload: &[u8]) -> Result<Self, RasterReadError> {
        check_payload_len(Self::FORMAT, shape, payload)?;
        Ok(Self::wrap(shape, payload.to_vec()))
    }

    fn encode_payload(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

impl FormatRaster for ByteRaster {
    const FORMAT: RasterFormat = RasterFormat::Byte;

    fn decode_payload(shape: RasterShape, payload: &[u8]) -> Result<Self, RasterReadError> {
        check_payload_len(Self::FORMAT, shape, payload)?;
        Ok(Self::wrap(shape, payload.iter().map(|&b| b as i8).collect()))
    }

    fn encode_payload(&self) -> Vec<u8> {
        self.as_slice().iter().map(|&v| v as u8).collect()
    }
}

impl FormatRaster for ShortRaster {
    const FORMAT: RasterFormat = RasterFormat::Short;

    fn decode_payload(shape: RasterShape, payload: &[u8]) -> Result<Self, RasterReadError> {
        check_payload_len(Self::FORMAT, shape, payload)?;
        let values = payload
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self::wrap(shape, values))
    }

    fn encode_payload(&self) -> Vec<u8> {
        self.as_slice().iter().flat_map(|v| v.to_be_bytes()).collect()
    }
}

impl FormatRaster for BitRaster {
    const FORMAT: RasterFormat = RasterFormat::Bit;

    fn decode_payload(shape: RasterShape, payload: &[u8]) -> Result<Self, RasterReadError> {
        check_payload_len(Self::FORMAT, shape, payload)?;
        Ok(Self::from_packed_bytes(shape, payload))
    }

    fn encode_payload(&self) -> Vec<u8> {
        self.to_packed_bytes()
    }
}
