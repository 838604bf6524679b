use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

use super::{assert_same_shape, copy_clipped, Raster, RasterShape, UnsignedByteRaster};

/// A closed set of symbolic values storable in an [`EnumRaster`].
///
/// Each variant has an ordinal (its position in [`RasterEnum::VARIANTS`]),
/// used for in-memory storage, and a stable wire `id`, used by datasets.
/// Implementations are normally generated with [`raster_enum!`](crate::raster_enum).
pub trait RasterEnum: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// All variants, in ordinal order. At most 255 entries.
    const VARIANTS: &'static [Self];

    /// Value used to fill newly created rasters.
    const DEFAULT: Self;

    fn ordinal(self) -> u8;

    fn id(self) -> u8;

    fn name(self) -> &'static str;

    /// Resolves a wire id, falling back to [`RasterEnum::DEFAULT`].
    fn by_id(id: u8) -> Self;

    fn from_ordinal(ordinal: u8) -> Self {
        Self::VARIANTS[ordinal as usize]
    }
}

/// Declares an enum implementing [`RasterEnum`].
///
/// ```ignore
/// raster_enum! {
///     pub enum Surface: default None {
///         None = (0, "none"),
///         Water = (210, "water"),
///     }
/// }
/// ```
#[macro_export]
macro_rules! raster_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: default $default:ident {
            $($(#[$vmeta:meta])* $variant:ident = ($id:literal, $key:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        const _: () = assert!(
            [$(stringify!($variant)),+].len() <= 255,
            "raster enums are limited to 255 variants"
        );

        impl $crate::raster::RasterEnum for $name {
            const VARIANTS: &'static [Self] = &[$($name::$variant),+];
            const DEFAULT: Self = $name::$default;

            fn ordinal(self) -> u8 {
                self as u8
            }

            fn id(self) -> u8 {
                match self {
                    $($name::$variant => $id),+
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }

            fn by_id(id: u8) -> Self {
                static LOOKUP: ::std::sync::OnceLock<[$name; 256]> = ::std::sync::OnceLock::new();
                LOOKUP.get_or_init(|| {
                    let mut table = [$name::$default; 256];
                    for variant in <$name as $crate::raster::RasterEnum>::VARIANTS {
                        table[$crate::raster::RasterEnum::id(*variant) as usize] = *variant;
                    }
                    table
                })[id as usize]
            }
        }
    };
}

/// A raster of enum values, stored as one ordinal byte per element.
#[derive(Clone, PartialEq, Eq)]
pub struct EnumRaster<E> {
    shape: RasterShape,
    ordinals: Vec<u8>,
    _variant: PhantomData<E>,
}

impl<E: RasterEnum> EnumRaster<E> {
    pub(crate) fn from_ordinals(shape: RasterShape, ordinals: Vec<u8>) -> Self {
        debug_assert_eq!(ordinals.len(), shape.size());
        Self {
            shape,
            ordinals,
            _variant: PhantomData,
        }
    }

    /// Creates a raster with every element set to `value`.
    pub fn filled(shape: RasterShape, value: E) -> Self {
        Self::from_ordinals(shape, vec![value.ordinal(); shape.size()])
    }

    pub fn get(&self, x: usize, y: usize) -> E {
        E::from_ordinal(self.ordinals[self.shape.index(x, y)])
    }

    pub fn put(&mut self, x: usize, y: usize, value: E) {
        let index = self.shape.index(x, y);
        self.ordinals[index] = value.ordinal();
    }

    #[inline]
    pub(crate) fn ordinal_at(&self, x: usize, y: usize) -> u8 {
        self.ordinals[self.shape.index(x, y)]
    }

    #[inline]
    pub(crate) fn put_ordinal(&mut self, x: usize, y: usize, ordinal: u8) {
        let index = self.shape.index(x, y);
        self.ordinals[index] = ordinal;
    }

    /// Encodes every element as its wire id.
    pub fn to_ids(&self) -> UnsignedByteRaster {
        let ids = self
            .ordinals
            .iter()
            .map(|&ordinal| E::from_ordinal(ordinal).id())
            .collect();
        UnsignedByteRaster::wrap(self.shape, ids)
    }

    /// Iterates over every element in row-major order.
    pub fn values(&self) -> impl Iterator<Item = E> + '_ {
        self.ordinals.iter().map(|&ordinal| E::from_ordinal(ordinal))
    }

    /// Packs the raster into a palette of the values actually present.
    pub fn pack(&self) -> PalettedBuffer<E> {
        PalettedBuffer::pack(&self.ordinals)
    }

    /// Rebuilds a raster from a palette produced by [`EnumRaster::pack`].
    pub fn unpack(shape: RasterShape, buffer: &PalettedBuffer<E>) -> Result<Self, PaletteError> {
        let ordinals = buffer.unpack(shape.size())?;
        Ok(Self::from_ordinals(shape, ordinals))
    }
}

impl<E: RasterEnum> Raster for EnumRaster<E> {
    fn create(shape: RasterShape) -> Self {
        Self::filled(shape, E::DEFAULT)
    }

    fn shape(&self) -> RasterShape {
        self.shape
    }

    fn copy_from(&mut self, source: &Self) {
        assert_same_shape(self.shape, source.shape);
        self.ordinals.copy_from_slice(&source.ordinals);
    }

    fn copy_from_clipped(&mut self, source: &Self, x0: isize, y0: isize) {
        copy_clipped(
            &mut self.ordinals,
            self.shape,
            &source.ordinals,
            source.shape,
            x0,
            y0,
        );
    }
}

impl<E: RasterEnum> fmt::Debug for EnumRaster<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumRaster")
            .field("shape", &self.shape)
            .field("variants", &E::VARIANTS.len())
            .finish()
    }
}

/// Errors produced when unpacking a [`PalettedBuffer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("palette is empty")]
    EmptyPalette,

    #[error("expected data for palette with {palette_len} entries, but none was present")]
    MissingData { palette_len: usize },

    #[error("value {index} does not exist in palette of size {palette_len}")]
    IndexOutOfRange { index: u8, palette_len: usize },

    #[error("expected {expected} packed values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Enum raster contents re-indexed against the values actually present.
///
/// Decouples stored data from variant ordinals. A single-entry palette
/// carries no data at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedBuffer<E> {
    palette: Vec<E>,
    data: Option<Vec<u8>>,
}

impl<E: RasterEnum> PalettedBuffer<E> {
    const UNASSIGNED: u8 = u8::MAX;

    pub fn new(palette: Vec<E>, data: Option<Vec<u8>>) -> Self {
        Self { palette, data }
    }

    fn pack(ordinals: &[u8]) -> Self {
        let mut palette = Vec::new();
        let mut packed_by_ordinal = [Self::UNASSIGNED; 256];
        let mut data = Vec::with_capacity(ordinals.len());

        for &ordinal in ordinals {
            let slot = &mut packed_by_ordinal[ordinal as usize];
            if *slot == Self::UNASSIGNED {
                *slot = palette.len() as u8;
                palette.push(E::from_ordinal(ordinal));
            }
            data.push(*slot);
        }

        if palette.len() == 1 {
            return Self {
                palette,
                data: None,
            };
        }
        Self {
            palette,
            data: Some(data),
        }
    }

    fn unpack(&self, expected_size: usize) -> Result<Vec<u8>, PaletteError> {
        match (self.palette.as_slice(), &self.data) {
            ([], _) if expected_size == 0 => Ok(Vec::new()),
            ([], _) => Err(PaletteError::EmptyPalette),
            ([only], _) => Ok(vec![only.ordinal(); expected_size]),
            (palette, None) => Err(PaletteError::MissingData {
                palette_len: palette.len(),
            }),
            (palette, Some(data)) => {
                if data.len() != expected_size {
                    return Err(PaletteError::SizeMismatch {
                        expected: expected_size,
                        actual: data.len(),
                    });
                }
                data.iter()
                    .map(|&index| {
                        palette
                            .get(index as usize)
                            .map(|value| value.ordinal())
                            .ok_or(PaletteError::IndexOutOfRange {
                                index,
                                palette_len: palette.len(),
                            })
                    })
                    .collect()
            }
        }
    }

    pub fn palette(&self) -> &[E] {
        &self.palette
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }
}
