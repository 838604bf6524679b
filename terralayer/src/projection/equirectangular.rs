use super::{blocks_x_for, CylindricalProjection, ProjectionError};

/// Plate carrée: longitude and latitude map linearly onto blocks.
///
/// Covers `blocks_x × blocks_x / 2` blocks, centred on (0, 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equirectangular {
    meters_per_block: f64,
    blocks_x: f64,
    blocks_z: f64,
}

impl Equirectangular {
    pub fn new(meters_per_block: f64) -> Result<Self, ProjectionError> {
        let blocks_x = blocks_x_for(meters_per_block)?;
        Ok(Self {
            meters_per_block,
            blocks_x: blocks_x as f64,
            blocks_z: (blocks_x / 2) as f64,
        })
    }

    pub fn blocks_x(&self) -> f64 {
        self.blocks_x
    }

    pub fn blocks_z(&self) -> f64 {
        self.blocks_z
    }
}

impl CylindricalProjection for Equirectangular {
    fn block_x(&self, lon: f64) -> f64 {
        lon / 360.0 * self.blocks_x
    }

    fn block_z(&self, lat: f64) -> f64 {
        -lat / 180.0 * self.blocks_z
    }

    fn lon(&self, block_x: f64) -> f64 {
        block_x / self.blocks_x * 360.0
    }

    fn lat(&self, block_z: f64) -> f64 {
        -block_z / self.blocks_z * 180.0
    }

    fn meters_per_block(&self) -> f64 {
        self.meters_per_block
    }
}
