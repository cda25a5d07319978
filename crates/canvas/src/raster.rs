//! CPU raster backend.
//!
//! A [`RasterSurface`] rasterizes the capability ops with `vello_cpu`
//! over `kurbo` geometry. The sketchy look comes from jittering stroke
//! geometry with a seeded RNG: every shape is stroked twice with small
//! independent offsets, the same trick rough.js uses. Reseeding at the
//! start of an attempt keeps successive replays of a growing program
//! pixel-stable.

use crate::{Canvas, CanvasError, Color, DrawOptions, Point};
use kurbo::BezPath;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Base background: solid white paper.
const BACKGROUND: Color = Color::WHITE;

/// Error presentation background, distinct from the base state.
const ERROR_TINT: Color = Color::rgb(0xfe, 0xe2, 0xe2);

/// Scale from a roughness of 1.0 to the maximum jitter offset in units.
const JITTER_SCALE: f64 = 2.0;

/// Segments used to approximate a full ellipse outline.
const ELLIPSE_SEGMENTS: usize = 48;

/// A fixed-size square render target rasterized on the CPU.
pub struct RasterSurface {
    size: u16,
    ctx: vello_cpu::RenderContext,
    rng: StdRng,
}

impl RasterSurface {
    /// Create a surface with the given side length, cleared to the base
    /// background.
    pub fn new(size: u16) -> Self {
        let mut surface = Self {
            size,
            ctx: vello_cpu::RenderContext::new(size, size),
            rng: StdRng::seed_from_u64(0),
        };
        surface.clear();
        surface
    }

    /// Side length in canvas units.
    pub fn size(&self) -> u16 {
        self.size
    }

    /// Reseed the jitter RNG. Called at the start of every attempt so a
    /// binding's look is stable across replays and cannot leak between
    /// attempts.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Paint the error presentation: a flat tinted frame, never a
    /// half-drawn picture.
    pub fn paint_error(&mut self) {
        self.fill_frame(ERROR_TINT);
    }

    /// Render the current frame and return straight-alpha RGBA8 bytes.
    pub fn pixels(&mut self) -> Vec<u8> {
        let mut pixmap = vello_cpu::Pixmap::new(self.size, self.size);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        let mut bytes = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut bytes);
        bytes
    }

    /// Encode the current frame as PNG.
    pub fn encode_png(&mut self) -> Result<Vec<u8>, CanvasError> {
        let size = u32::from(self.size);
        let img = image::RgbaImage::from_raw(size, size, self.pixels())
            .ok_or_else(|| CanvasError::Encode("frame byte length mismatch".into()))?;
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| CanvasError::Encode(e.to_string()))?;
        Ok(out.into_inner())
    }

    /// Write the current frame to `path` as PNG.
    pub fn save_png(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), CanvasError> {
        let png = self.encode_png()?;
        std::fs::write(path, png)?;
        Ok(())
    }

    fn fill_frame(&mut self, color: Color) {
        self.ctx.reset();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(cpu_color(color));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.size),
            f64::from(self.size),
        ));
    }

    fn fill(&mut self, path: &BezPath, color: Color) {
        self.ctx.set_paint(cpu_color(color));
        self.ctx.fill_path(&to_cpu(path));
    }

    fn stroke(&mut self, path: &BezPath, color: Color, width: f64) {
        self.ctx
            .set_stroke(vello_cpu::kurbo::Stroke::new(width.max(0.05)));
        self.ctx.set_paint(cpu_color(color));
        self.ctx.stroke_path(&to_cpu(path));
    }

    fn offset(&mut self, roughness: f64) -> f64 {
        if roughness <= 0.0 {
            0.0
        } else {
            self.rng.random_range(-1.0..1.0) * roughness * JITTER_SCALE
        }
    }

    /// Build one wobbly pass over a polyline: endpoints and midpoints get
    /// independent offsets, midpoints become quadratic control points.
    fn sketch_pass(&mut self, points: &[Point], closed: bool, roughness: f64) -> BezPath {
        let mut path = BezPath::new();
        let Some(&(x0, y0)) = points.first() else {
            return path;
        };
        let start = (x0 + self.offset(roughness), y0 + self.offset(roughness));
        path.move_to(start);

        let mut prev = start;
        let tail = points.iter().skip(1).copied();
        let segments: Vec<Point> = if closed {
            tail.chain(std::iter::once((x0, y0))).collect()
        } else {
            tail.collect()
        };
        for (x, y) in segments {
            let end = (x + self.offset(roughness), y + self.offset(roughness));
            if roughness > 0.0 {
                let mid = (
                    (prev.0 + end.0) / 2.0 + self.offset(roughness),
                    (prev.1 + end.1) / 2.0 + self.offset(roughness),
                );
                path.quad_to(mid, end);
            } else {
                path.line_to(end);
            }
            prev = end;
        }
        path
    }

    /// Stroke a polyline with the sketchy double pass (or a single clean
    /// pass when roughness is 0).
    fn stroke_sketchy(&mut self, points: &[Point], closed: bool, opts: &DrawOptions) {
        let Some(color) = opts.stroke_paint() else {
            return;
        };
        let roughness = opts.roughness();
        let width = opts.stroke_width();
        let passes = if roughness > 0.0 { 2 } else { 1 };
        for _ in 0..passes {
            let pass = self.sketch_pass(points, closed, roughness);
            self.stroke(&pass, color, width);
        }
    }

    fn fill_polygon(&mut self, points: &[Point], opts: &DrawOptions) {
        let Some(color) = opts.fill_paint() else {
            return;
        };
        if points.len() < 3 {
            return;
        }
        let mut path = BezPath::new();
        path.move_to(points[0]);
        for &p in &points[1..] {
            path.line_to(p);
        }
        path.close_path();
        self.fill(&path, color);
    }
}

impl Default for RasterSurface {
    fn default() -> Self {
        Self::new(crate::DEFAULT_SIZE)
    }
}

impl Canvas for RasterSurface {
    fn clear(&mut self) {
        self.fill_frame(BACKGROUND);
    }

    fn line(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        self.stroke_sketchy(&[(x1, y1), (x2, y2)], false, opts);
        Ok(())
    }

    fn rectangle(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        self.fill_polygon(&corners, opts);
        self.stroke_sketchy(&corners, true, opts);
        Ok(())
    }

    fn circle(
        &mut self,
        cx: f64,
        cy: f64,
        diameter: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        let r = diameter / 2.0;
        let outline = ellipse_points(cx, cy, r, r);
        self.fill_polygon(&outline, opts);
        self.stroke_sketchy(&outline, true, opts);
        Ok(())
    }

    fn ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        w: f64,
        h: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        let outline = ellipse_points(cx, cy, w / 2.0, h / 2.0);
        self.fill_polygon(&outline, opts);
        self.stroke_sketchy(&outline, true, opts);
        Ok(())
    }

    fn linear_path(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        if points.len() < 2 {
            return Ok(());
        }
        self.stroke_sketchy(points, false, opts);
        Ok(())
    }

    fn curve(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        if points.len() < 2 {
            return Ok(());
        }
        let Some(color) = opts.stroke_paint() else {
            return Ok(());
        };
        if let Some(fill) = opts.fill_paint() {
            let path = catmull_rom(points);
            self.fill(&path, fill);
        }
        let roughness = opts.roughness();
        let width = opts.stroke_width();
        let passes = if roughness > 0.0 { 2 } else { 1 };
        for _ in 0..passes {
            let jittered: Vec<Point> = points
                .iter()
                .map(|&(x, y)| (x + self.offset(roughness), y + self.offset(roughness)))
                .collect();
            let path = catmull_rom(&jittered);
            self.stroke(&path, color, width);
        }
        Ok(())
    }

    fn polygon(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        if points.len() < 2 {
            return Ok(());
        }
        self.fill_polygon(points, opts);
        self.stroke_sketchy(points, true, opts);
        Ok(())
    }

    fn path(&mut self, data: &str, opts: &DrawOptions) -> Result<(), CanvasError> {
        let path = BezPath::from_svg(data).map_err(|e| CanvasError::PathData(e.to_string()))?;
        if let Some(fill) = opts.fill_paint() {
            self.fill(&path, fill);
        }
        if let Some(stroke) = opts.stroke_paint() {
            self.stroke(&path, stroke, opts.stroke_width());
        }
        Ok(())
    }
}

/// One persistent render target shared across stream attempts.
///
/// Attempts never touch the target directly: [`SharedSurface::begin_attempt`]
/// bumps the attempt generation, reseeds and clears the target, and hands
/// back a fresh [`SurfaceBinding`]. Ops through a binding whose generation
/// has been superseded are discarded, which keeps a cancelled attempt's
/// in-flight replay from mutating the live frame.
#[derive(Clone)]
pub struct SharedSurface {
    target: Arc<Mutex<RasterSurface>>,
    generation: Arc<AtomicU64>,
}

impl SharedSurface {
    pub fn new(size: u16) -> Self {
        Self {
            target: Arc::new(Mutex::new(RasterSurface::new(size))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current attempt generation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Invalidate all outstanding bindings without starting a new attempt.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Start a new attempt: supersede outstanding bindings, reseed the
    /// jitter RNG, clear the target, and return the attempt's binding.
    pub fn begin_attempt(&self, seed: u64) -> SurfaceBinding {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        {
            let mut target = self.target.lock();
            target.reseed(seed);
            target.clear();
        }
        SurfaceBinding {
            target: self.target.clone(),
            generation: self.generation.clone(),
            attempt: generation,
        }
    }

    /// Encode the live frame as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CanvasError> {
        self.target.lock().encode_png()
    }

    /// Write the live frame to `path` as PNG.
    pub fn save_png(&self, path: impl AsRef<std::path::Path>) -> Result<(), CanvasError> {
        self.target.lock().save_png(path)
    }
}

impl Default for SharedSurface {
    fn default() -> Self {
        Self::new(crate::DEFAULT_SIZE)
    }
}

/// One attempt's capability handle onto a [`SharedSurface`].
pub struct SurfaceBinding {
    target: Arc<Mutex<RasterSurface>>,
    generation: Arc<AtomicU64>,
    attempt: u64,
}

impl SurfaceBinding {
    /// Whether this binding still belongs to the current attempt.
    pub fn is_live(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.attempt
    }

    /// Paint the error presentation, if this binding is still live.
    pub fn paint_error(&mut self) {
        if self.is_live() {
            self.target.lock().paint_error();
        }
    }

    fn with_target(
        &mut self,
        f: impl FnOnce(&mut RasterSurface) -> Result<(), CanvasError>,
    ) -> Result<(), CanvasError> {
        if !self.is_live() {
            tracing::trace!(attempt = self.attempt, "discarding op from stale binding");
            return Ok(());
        }
        f(&mut self.target.lock())
    }
}

impl Canvas for SurfaceBinding {
    fn clear(&mut self) {
        let _ = self.with_target(|t| {
            t.clear();
            Ok(())
        });
    }

    fn line(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        self.with_target(|t| t.line(x1, y1, x2, y2, opts))
    }

    fn rectangle(
        &mut self,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        self.with_target(|t| t.rectangle(x, y, w, h, opts))
    }

    fn circle(
        &mut self,
        cx: f64,
        cy: f64,
        diameter: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        self.with_target(|t| t.circle(cx, cy, diameter, opts))
    }

    fn ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        w: f64,
        h: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        self.with_target(|t| t.ellipse(cx, cy, w, h, opts))
    }

    fn linear_path(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        self.with_target(|t| t.linear_path(points, opts))
    }

    fn curve(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        self.with_target(|t| t.curve(points, opts))
    }

    fn polygon(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        self.with_target(|t| t.polygon(points, opts))
    }

    fn path(&mut self, data: &str, opts: &DrawOptions) -> Result<(), CanvasError> {
        self.with_target(|t| t.path(data, opts))
    }
}

fn ellipse_points(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<Point> {
    (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let t = (i as f64 / ELLIPSE_SEGMENTS as f64) * std::f64::consts::TAU;
            (cx + rx * t.cos(), cy + ry * t.sin())
        })
        .collect()
}

/// Catmull-Rom spline through the points, converted to cubic beziers.
fn catmull_rom(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    match points {
        [] => return path,
        [p] => {
            path.move_to(*p);
            return path;
        }
        [a, b] => {
            path.move_to(*a);
            path.line_to(*b);
            return path;
        }
        _ => {}
    }

    path.move_to(points[0]);
    for i in 0..points.len() - 1 {
        let p0 = if i == 0 { points[0] } else { points[i - 1] };
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = if i + 2 < points.len() {
            points[i + 2]
        } else {
            points[i + 1]
        };

        let c1 = (p1.0 + (p2.0 - p0.0) / 6.0, p1.1 + (p2.1 - p0.1) / 6.0);
        let c2 = (p2.0 - (p3.0 - p1.0) / 6.0, p2.1 - (p3.1 - p1.1) / 6.0);
        path.curve_to(c1, c2, p2);
    }
    path
}

fn cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}
