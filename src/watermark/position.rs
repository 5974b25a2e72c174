//! Gravity-based overlay placement.
//!
//! The nine compass points anchor the overlay against the edges of the
//! target; there is no margin.
//!
//! ```text
//! nw  n  ne
//!  w  c  e
//! sw  s  se
//! ```

use std::fmt;
use std::str::FromStr;

/// Alignment anchor for an overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    North,
    NorthEast,
    NorthWest,
    South,
    SouthEast,
    SouthWest,
    West,
    East,
    #[default]
    Centre,
}

impl FromStr for Gravity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(Gravity::North),
            "ne" => Ok(Gravity::NorthEast),
            "nw" => Ok(Gravity::NorthWest),
            "s" => Ok(Gravity::South),
            "se" => Ok(Gravity::SouthEast),
            "sw" => Ok(Gravity::SouthWest),
            "w" => Ok(Gravity::West),
            "e" => Ok(Gravity::East),
            "c" => Ok(Gravity::Centre),
            _ => Err(format!(
                "invalid gravity {:?}; must be one of n, ne, nw, s, se, sw, w, e, c",
                s
            )),
        }
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gravity::North => "n",
            Gravity::NorthEast => "ne",
            Gravity::NorthWest => "nw",
            Gravity::South => "s",
            Gravity::SouthEast => "se",
            Gravity::SouthWest => "sw",
            Gravity::West => "w",
            Gravity::East => "e",
            Gravity::Centre => "c",
        };
        f.write_str(s)
    }
}

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the overlay to be placed.
#[derive(Debug, Clone, Copy)]
pub struct OverlayDimensions {
    pub width: u32,
    pub height: u32,
}

/// Top-left corner of a placed overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Calculate where the overlay's top-left corner lands.
///
/// Coordinates may be negative if the overlay is larger than the image.
pub fn calculate_position(
    gravity: Gravity,
    image: &ImageDimensions,
    overlay: &OverlayDimensions,
) -> PlacementPosition {
    let img_w = image.width as i32;
    let img_h = image.height as i32;
    let ov_w = overlay.width as i32;
    let ov_h = overlay.height as i32;

    let left = 0;
    let centre_x = (img_w - ov_w) / 2;
    let right = img_w - ov_w;
    let top = 0;
    let centre_y = (img_h - ov_h) / 2;
    let bottom = img_h - ov_h;

    match gravity {
        Gravity::NorthWest => PlacementPosition::new(left, top),
        Gravity::North => PlacementPosition::new(centre_x, top),
        Gravity::NorthEast => PlacementPosition::new(right, top),
        Gravity::West => PlacementPosition::new(left, centre_y),
        Gravity::Centre => PlacementPosition::new(centre_x, centre_y),
        Gravity::East => PlacementPosition::new(right, centre_y),
        Gravity::SouthWest => PlacementPosition::new(left, bottom),
        Gravity::South => PlacementPosition::new(centre_x, bottom),
        Gravity::SouthEast => PlacementPosition::new(right, bottom),
    }
}
