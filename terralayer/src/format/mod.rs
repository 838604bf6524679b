//! Binary raster container.
//!
//! All integers are big-endian.
//!
//! ```text
//! ┌──────────────────────────────┬─────────┐
//! │ "TERRARIUM/RASTER" (16)      │ version │  version must be 0
//! ├──────────┬──────────┬────────┴─────────┤
//! │ width:i32│height:i32│ format:u8        │  0 ubyte, 1 byte, 2 short, 3 bit
//! ├──────────┴──────────┴──────────────────┤
//! │ chunk*                                 │  until end of stream
//! └────────────────────────────────────────┘
//!
//! chunk:
//! ┌─────────┬──────┬──────┬──────┬──────┬───────────┬─────────────┐
//! │ len:u32 │ x:i32│ y:i32│ w:i32│ h:i32│ filter:u8 │ xz payload  │
//! └─────────┴──────┴──────┴──────┴──────┴───────────┴─────────────┘
//! ```
//!
//! The payload decompresses to `w * h` raw elements (shorts big-endian, bits
//! packed least-significant first) that still carry the chunk's delta
//! filter; see [`RasterFilter`].

mod filter;
mod kind;
mod reader;
mod writer;

pub use filter::RasterFilter;
pub use kind::{FormatRaster, RasterFormat};
pub use reader::{
    RasterLoader, RasterReadError, RasterReader, MAX_RASTER_ELEMENTS, MAX_RASTER_SIDE,
};
pub use writer::{RasterWriter, DEFAULT_CHUNK_SIZE, DEFAULT_COMPRESSION_LEVEL};

/// Leading bytes of every raster container.
pub const SIGNATURE: &[u8; 16] = b"TERRARIUM/RASTER";

/// The only supported container version.
pub const VERSION: u8 = 0;
