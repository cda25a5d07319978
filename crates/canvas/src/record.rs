//! A recording canvas for tests.

use crate::{Canvas, CanvasError, DrawOptions, Point};
use parking_lot::Mutex;
use std::sync::Arc;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Clear,
    Line(f64, f64, f64, f64, DrawOptions),
    Rectangle(f64, f64, f64, f64, DrawOptions),
    Circle(f64, f64, f64, DrawOptions),
    Ellipse(f64, f64, f64, f64, DrawOptions),
    LinearPath(Vec<Point>, DrawOptions),
    Curve(Vec<Point>, DrawOptions),
    Polygon(Vec<Point>, DrawOptions),
    Path(String, DrawOptions),
}

impl Op {
    /// Whether this op draws (everything except `Clear`).
    pub fn is_draw(&self) -> bool {
        !matches!(self, Op::Clear)
    }
}

/// A [`Canvas`] that records every invocation instead of rasterizing.
///
/// Clones share the same op log, so a test can keep a handle while the
/// runner owns the capability.
#[derive(Clone, Default)]
pub struct Recorder {
    ops: Arc<Mutex<Vec<Op>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded op, in invocation order.
    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    /// Recorded ops excluding `Clear`.
    pub fn draws(&self) -> Vec<Op> {
        self.ops.lock().iter().filter(|o| o.is_draw()).cloned().collect()
    }

    /// Number of `Clear` invocations.
    pub fn clears(&self) -> usize {
        self.ops.lock().iter().filter(|o| !o.is_draw()).count()
    }

    /// Ops since the most recent `Clear`: what is actually visible on a
    /// surface that resets before every replay.
    pub fn last_frame(&self) -> Vec<Op> {
        let ops = self.ops.lock();
        let start = ops
            .iter()
            .rposition(|o| !o.is_draw())
            .map(|i| i + 1)
            .unwrap_or(0);
        ops[start..].to_vec()
    }

    /// Drop everything recorded so far.
    pub fn reset(&self) {
        self.ops.lock().clear();
    }

    fn push(&self, op: Op) {
        self.ops.lock().push(op);
    }
}

impl Canvas for Recorder {
    fn clear(&mut self) {
        self.push(Op::Clear);
    }

    fn line(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        self.push(Op::Line(x1, y1, x2, y2, opts.clone()));
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
        self.push(Op::Rectangle(x, y, w, h, opts.clone()));
        Ok(())
    }

    fn circle(
        &mut self,
        cx: f64,
        cy: f64,
        diameter: f64,
        opts: &DrawOptions,
    ) -> Result<(), CanvasError> {
        self.push(Op::Circle(cx, cy, diameter, opts.clone()));
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
        self.push(Op::Ellipse(cx, cy, w, h, opts.clone()));
        Ok(())
    }

    fn linear_path(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        self.push(Op::LinearPath(points.to_vec(), opts.clone()));
        Ok(())
    }

    fn curve(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        self.push(Op::Curve(points.to_vec(), opts.clone()));
        Ok(())
    }

    fn polygon(&mut self, points: &[Point], opts: &DrawOptions) -> Result<(), CanvasError> {
        self.push(Op::Polygon(points.to_vec(), opts.clone()));
        Ok(())
    }

    fn path(&mut self, data: &str, opts: &DrawOptions) -> Result<(), CanvasError> {
        self.push(Op::Path(data.to_string(), opts.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_log() {
        let recorder = Recorder::new();
        let mut handle = recorder.clone();
        handle.clear();
        handle
            .line(0.0, 0.0, 10.0, 10.0, &DrawOptions::default())
            .unwrap();

        assert_eq!(recorder.clears(), 1);
        assert_eq!(
            recorder.draws(),
            vec![Op::Line(0.0, 0.0, 10.0, 10.0, DrawOptions::default())]
        );
    }

    #[test]
    fn reset_drops_history() {
        let mut recorder = Recorder::new();
        recorder.clear();
        recorder.reset();
        assert!(recorder.ops().is_empty());
    }
}
