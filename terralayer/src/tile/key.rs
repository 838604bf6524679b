use std::fmt;

/// Grid coordinates of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub x: i32,
    pub y: i32,
}

impl TileKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Relative path of the tile, `"x/y"`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.x, self.y)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
