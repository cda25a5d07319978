//! Drawing surface capability for doodle.
//!
//! This crate defines the fixed operation set that generated drawing
//! programs are allowed to call ([`Canvas`]), the open options record
//! each operation accepts ([`DrawOptions`]), and two implementations:
//!
//! - [`RasterSurface`]: a CPU rasterizer over a fixed-size square frame,
//!   with rough-sketch stroke jitter and PNG export.
//! - [`Recorder`]: a test double that records every invocation.
//!
//! [`SharedSurface`] wraps one persistent [`RasterSurface`] and hands out
//! per-attempt bindings. A binding carries the attempt generation it was
//! created for; operations from a superseded generation are discarded, so
//! a cancelled attempt can never touch the live frame.

pub use options::{Color, DrawOptions};
pub use raster::{RasterSurface, SharedSurface, SurfaceBinding};
pub use record::{Op, Recorder};

mod options;
mod raster;
mod record;

/// Default side length of the square render target, in canvas units.
pub const DEFAULT_SIZE: u16 = 512;

/// A point in canvas coordinates, origin top-left.
pub type Point = (f64, f64);

/// Errors raised by a drawing surface.
#[derive(thiserror::Error, Debug)]
pub enum CanvasError {
    /// The `path` operation received a string that is not valid SVG path data.
    #[error("invalid path data: {0}")]
    PathData(String),

    /// Frame encoding failed.
    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The fixed drawing capability exposed to generated programs.
///
/// Every operation mutates the bound render target the moment it is
/// invoked; there is no draw buffer to flush. `clear` resets the target
/// to its base state (solid paper background) and is called before every
/// replay of a program.
pub trait Canvas {
    /// Reset the target to the base background.
    fn clear(&mut self);

    /// Straight segment from `(x1, y1)` to `(x2, y2)`.
    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, opts: &DrawOptions)
    -> Result<(), CanvasError>;

    /// Axis-aligned rectangle with top-left `(x, y)`.
    fn rectangle(&mut self, x: f64, y: f64, w: f64, h: f64, opts: &DrawOptions)
    -> Result<(), CanvasError>;

    /// Circle by center and diameter.
    fn circle(&mut self, cx: f64, cy: f64, diameter: f64, opts: &DrawOptions)
    -> Result<(), CanvasError>;

    /// Ellipse by center and bounding-box width/height.
    fn ellipse(&mut self, cx: f64, cy: f64, w: f64, h: f64, opts: &DrawOptions)
    -> Result<(), CanvasError>;

    /// Open polyline through the ordered points.
    fn linear_path(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError>;

    /// Smooth curve through the ordered points.
    fn curve(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError>;

    /// Closed polygon through the ordered points.
    fn polygon(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError>;

    /// Arbitrary SVG path data.
    fn path(&mut self, data: &str, opts: &DrawOptions) -> Result<(), CanvasError>;
}
