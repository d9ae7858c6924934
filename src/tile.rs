use std::{
    fmt,
    path::{Path, PathBuf},
};

/// The highest zoom level accepted. Keeps `2^z` and every index within `u32`.
pub const MAX_ZOOM: u8 = 30;

/// A TMS/XYZ tile with x, y and z-coordinate.
/// ref: https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl Tile {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Where this tile lives below `root`: `root/{z}/{x}/{y}.png`.
    ///
    /// # Example
    /// ```rust
    /// # use tms_tile_downloader::Tile;
    /// # use std::path::Path;
    /// let path = Tile::new(1, 3, 2).path_in("/data/tiles");
    /// assert_eq!(path, Path::new("/data/tiles/2/1/3.png"));
    /// ```
    pub fn path_in(&self, root: impl AsRef<Path>) -> PathBuf {
        let mut target = root.as_ref().join(self.z.to_string());
        target.push(self.x.to_string());
        target.push(format!("{}.png", self.y));

        target
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Number of tiles along one axis at the given zoom level.
///
/// # Panics
/// Panics if `zoom` exceeds [`MAX_ZOOM`].
pub fn tiles_per_axis(zoom: u8) -> u32 {
    assert!(zoom <= MAX_ZOOM, "zoom level {} out of range", zoom);

    1 << zoom
}
