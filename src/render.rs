//! Output side of the 2D turtle.
//!
//! The turtle never touches pixels. It hands segments and marked points to a
//! [`RenderSink`]; rasterizing, clipping and out-of-bounds handling belong to
//! whoever implements the sink.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Receives the drawing requests of a 2D interpretation pass.
pub trait RenderSink {
    /// Draws a line from `a` to `b`. Coordinates may lie outside the
    /// drawable surface; implementations clip rather than fail.
    fn draw_line(&mut self, a: Vec2, b: Vec2, color: Color);

    /// Records a point of interest (e.g. a leaf tip). Ignored by default.
    fn mark_point(&mut self, _point: Vec2) {}
}

/// A single drawn segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub a: Vec2,
    pub b: Vec2,
    pub color: Color,
}

impl LineSegment {
    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }
}

/// A [`RenderSink`] that keeps everything in memory.
///
/// Useful as a hand-off to a rasterizer or a hull computation later on.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LineBuffer {
    pub lines: Vec<LineSegment>,
    pub points: Vec<Vec2>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.points.clear();
    }

    /// Axis-aligned bounds of every segment endpoint and marked point, as
    /// `(min, max)`. `None` when nothing was recorded.
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        self.lines
            .iter()
            .flat_map(|l| [l.a, l.b])
            .chain(self.points.iter().copied())
            .fold(None, |acc, p| match acc {
                None => Some((p, p)),
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
            })
    }
}

impl RenderSink for LineBuffer {
    fn draw_line(&mut self, a: Vec2, b: Vec2, color: Color) {
        self.lines.push(LineSegment { a, b, color });
    }

    fn mark_point(&mut self, point: Vec2) {
        self.points.push(point);
    }
}
