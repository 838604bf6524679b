use std::f64::consts::{FRAC_PI_4, TAU};

use super::{blocks_x_for, CylindricalProjection, ProjectionError};

/// Web-Mercator style conformal projection.
///
/// The z axis is unbounded towards the poles; sampling is clipped by the
/// data, not by the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    meters_per_block: f64,
    blocks_x: f64,
}

impl Mercator {
    pub fn new(meters_per_block: f64) -> Result<Self, ProjectionError> {
        Ok(Self {
            meters_per_block,
            blocks_x: blocks_x_for(meters_per_block)? as f64,
        })
    }

    pub fn blocks_x(&self) -> f64 {
        self.blocks_x
    }
}

fn project_y(lat: f64) -> f64 {
    (FRAC_PI_4 - lat / 2.0).tan().ln()
}

fn unproject_y(y: f64) -> f64 {
    (FRAC_PI_4 - y.exp().atan()) * 2.0
}

impl CylindricalProjection for Mercator {
    fn block_x(&self, lon: f64) -> f64 {
        lon / 360.0 * self.blocks_x
    }

    fn block_z(&self, lat: f64) -> f64 {
        project_y(lat.to_radians()) / TAU * self.blocks_x
    }

    fn lon(&self, block_x: f64) -> f64 {
        block_x / self.blocks_x * 360.0
    }

    fn lat(&self, block_z: f64) -> f64 {
        unproject_y(block_z / self.blocks_x * TAU).to_degrees()
    }

    fn meters_per_block(&self) -> f64 {
        self.meters_per_block
    }
}
