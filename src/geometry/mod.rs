//! ImageMagick-compatible geometry strings.
//!
//! A geometry such as `100x50+10+10!` describes a size, an optional offset
//! and a set of flags:
//!
//! | Flag | Meaning |
//! |------|---------|
//! | `%`  | value is a percentage of the image dimension |
//! | `!`  | ignore aspect ratio |
//! | `<`  | only enlarge |
//! | `>`  | only shrink |
//! | `^`  | fill the area (cover) instead of fitting inside it |
//!
//! [`Geometry::parse`] turns the text into a [`Geometry`];
//! [`Geometry::project`] resolves it against concrete image dimensions.

use std::fmt;

pub mod parser;

/// Geometry flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryFlags {
    pub width_pct: bool,
    pub height_pct: bool,
    pub x_pct: bool,
    pub y_pct: bool,
    pub force: bool,
    pub only_grow: bool,
    pub only_shrink: bool,
    pub fill: bool,
}

/// Parsed geometry; a zero width or height means "not specified"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
    pub x: i64,
    pub y: i64,
    pub flags: GeometryFlags,
}

/// Syntax error raised for any input outside the geometry grammar
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("syntax error at column {column}: {message}")]
pub struct GeometryError {
    pub column: usize,
    pub message: String,
}

impl GeometryError {
    pub(crate) fn new(column: usize, message: impl Into<String>) -> Self {
        Self {
            column,
            message: message.into(),
        }
    }
}

impl Geometry {
    /// Parse a geometry string
    pub fn parse(input: &str) -> Result<Geometry, GeometryError> {
        parser::parse(input)
    }

    /// Resolve this geometry against an image of `orig_width` x `orig_height`
    ///
    /// The result is in absolute pixels with every percentage flag cleared.
    /// Unspecified axes take the image dimension, `^` scales to cover, and
    /// unless `!` is set the aspect ratio of the image is kept.
    pub fn project(&self, orig_width: u32, orig_height: u32) -> Geometry {
        let orig_w = orig_width as f64;
        let orig_h = orig_height as f64;
        let requested_w = self.width;
        let requested_h = self.height;

        let mut out = *self;

        if out.width == 0.0 {
            out.width = orig_w;
        }
        if out.height == 0.0 {
            out.height = orig_h;
        }

        if self.flags.width_pct {
            out.width = orig_w * self.width / 100.0;
            out.flags.width_pct = false;
        }
        if self.flags.height_pct {
            out.height = orig_h * self.height / 100.0;
            out.flags.height_pct = false;
        }
        if self.flags.x_pct {
            out.x = (orig_w * self.x as f64 / 100.0) as i64;
            out.flags.x_pct = false;
        }
        if self.flags.y_pct {
            out.y = (orig_h * self.y as f64 / 100.0) as i64;
            out.flags.y_pct = false;
        }

        if self.flags.fill {
            let scale = (out.width / orig_w).max(out.height / orig_h);
            out.width = orig_w * scale;
            out.height = orig_h * scale;
        }

        if !self.flags.force && (requested_w != 0.0 || requested_h != 0.0) {
            let ratio = orig_w / orig_h;
            if out.width / out.height > ratio {
                out.width = out.height * ratio;
            } else {
                out.height = out.width / ratio;
            }
        }

        if self.flags.only_grow {
            out.width = out.width.max(orig_w);
            out.height = out.height.max(orig_h);
        }

        if self.flags.only_shrink {
            out.width = out.width.min(orig_w);
            out.height = out.height.min(orig_h);
        }

        out
    }

    /// Whether both axes were given explicitly
    pub fn has_both_axes(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.width as i64)?;
        if self.flags.width_pct {
            f.write_str("%")?;
        }
        f.write_str("x")?;
        if self.height > 0.0 {
            write!(f, "{}", self.height as i64)?;
            if self.flags.height_pct {
                f.write_str("%")?;
            }
        }
        if self.x != 0 || self.y != 0 {
            write!(f, "+{}", self.x)?;
            if self.flags.x_pct {
                f.write_str("%")?;
            }
            write!(f, "+{}", self.y)?;
            if self.flags.y_pct {
                f.write_str("%")?;
            }
        }
        if self.flags.force {
            f.write_str("!")?;
        }
        if self.flags.only_grow {
            f.write_str("<")?;
        }
        if self.flags.only_shrink {
            f.write_str(">")?;
        }
        if self.flags.fill {
            f.write_str("^")?;
        }
        Ok(())
    }
}
