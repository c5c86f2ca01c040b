//! # fractal-turtle
//!
//! Procedural fractals from L-System rewriting and turtle interpretation.
//!
//! Generation runs in two strictly sequential phases. An [`LSystem`] first
//! expands its axiom into a full symbol sequence; a turtle interpreter then
//! walks that sequence:
//!
//! - [`Turtle2DInterpreter`] draws line segments into a [`RenderSink`]
//!   supplied by the caller (a rasterizer, or a [`LineBuffer`]).
//! - [`Turtle3DInterpreter`] batches repeated symbols, records a
//!   [`TurtleEvent`] trace and, through [`SkeletonBuilder`], produces a
//!   [`Skeleton`] of bones grouped into [`FractalBranch`]es.
//!
//! All randomness flows through one explicitly seeded [`RandomSource`], so a
//! seed reproduces both the sequence and the geometry.

pub mod error;
pub mod grammar;
pub mod interpreter;
pub mod presets;
pub mod random;
pub mod render;
pub mod skeleton;
pub mod turtle;

pub use error::*;
pub use grammar::*;
pub use interpreter::*;
pub use random::*;
pub use render::*;
pub use skeleton::*;
pub use turtle::*;
