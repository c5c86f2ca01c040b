//! Interpreters that walk an expanded symbol sequence with a turtle.
//!
//! Both interpreters keep a symbol-indexed action table. Register actions via
//! `set_action` or `populate_standard_symbols`, then call `interpret`.
//!
//! - [`Turtle2DInterpreter`] dispatches one symbol at a time and draws into a
//!   [`RenderSink`].
//! - [`Turtle3DInterpreter`] first collapses runs of a repeated symbol and
//!   dispatches each run once with its length, recording a [`TurtleEvent`]
//!   trace that [`SkeletonBuilder`] can turn into bones.

use crate::error::Result;
use crate::grammar::Symbol;
use crate::random::RandomSource;
use crate::render::{Color, RenderSink};
use crate::skeleton::{Skeleton, SkeletonBuilder};
use crate::turtle::{Action2D, Action3D, Turtle2D, Turtle3D, TurtleEvent, TurtleState3D};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Configuration for the standard 2D symbols.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Turtle2DConfig {
    /// Length of one `F`/`G`/`f` step.
    pub step_length: f32,
    /// Degrees turned by `+` and `-`.
    pub angle_degrees: f32,
    /// Initial pen color.
    pub color: Color,
}

impl Default for Turtle2DConfig {
    fn default() -> Self {
        Self {
            step_length: 10.0,
            angle_degrees: 45.0,
            color: Color::BLACK,
        }
    }
}

/// Interprets a symbol sequence with a [`Turtle2D`].
#[derive(Clone, Debug, Default)]
pub struct Turtle2DInterpreter {
    actions: Vec<Action2D>,
    config: Turtle2DConfig,
}

impl Turtle2DInterpreter {
    /// Creates an interpreter with an empty action table.
    pub fn new(config: Turtle2DConfig) -> Self {
        Self {
            actions: Vec::new(),
            config,
        }
    }

    /// Replaces the whole action table, indexed by symbol (builder pattern).
    pub fn with_map(mut self, map: Vec<Action2D>) -> Self {
        self.actions = map;
        self
    }

    /// Binds one action (builder pattern).
    pub fn with_action(mut self, symbol: Symbol, action: Action2D) -> Self {
        self.set_action(symbol, action);
        self
    }

    /// Binds `action` to `symbol`.
    ///
    /// The table grows as needed; gaps are [`Action2D::Ignore`].
    pub fn set_action(&mut self, symbol: Symbol, action: Action2D) {
        let idx = symbol as usize;
        if idx >= self.actions.len() {
            self.actions.resize(idx + 1, Action2D::Ignore);
        }
        self.actions[idx] = action;
    }

    /// Gives `target` a copy of the action currently bound to `source`.
    pub fn alias(&mut self, target: Symbol, source: Symbol) {
        let action = self.action(source).cloned().unwrap_or_default();
        self.set_action(target, action);
    }

    pub fn action(&self, symbol: Symbol) -> Option<&Action2D> {
        self.actions.get(symbol as usize)
    }

    pub fn config(&self) -> &Turtle2DConfig {
        &self.config
    }

    /// Registers the conventional symbols using the configured step and angle.
    ///
    /// `F`, `G` draw; `f` moves; `+`/`-` turn; `|` turns around; `[`/`]` save
    /// and restore.
    pub fn populate_standard_symbols(&mut self) {
        let step = self.config.step_length;
        let angle = self.config.angle_degrees;
        let mappings = [
            (b'F', Action2D::Draw(step)),
            (b'G', Action2D::Draw(step)),
            (b'f', Action2D::Move(step)),
            (b'+', Action2D::Rotate(angle)),
            (b'-', Action2D::Rotate(-angle)),
            (b'|', Action2D::Rotate(180.0)),
            (b'[', Action2D::Push),
            (b']', Action2D::Pop),
        ];

        for (sym, action) in mappings {
            self.set_action(sym, action);
        }
    }

    /// Walks `sequence` from `origin`, heading `start_heading` degrees.
    ///
    /// Symbols without an action are skipped. Returns the turtle as it stands
    /// after the last symbol.
    ///
    /// # Errors
    ///
    /// Aborts with [`FractalError::StackUnderflow`](crate::FractalError) on an
    /// unmatched pop, or with whatever a custom action returns.
    pub fn interpret(
        &self,
        sequence: &[Symbol],
        origin: Vec2,
        start_heading: f32,
        sink: &mut dyn RenderSink,
        rng: &mut dyn RandomSource,
    ) -> Result<Turtle2D> {
        let mut turtle = Turtle2D::new(origin, start_heading);
        turtle.state.color = self.config.color;

        for (index, &sym) in sequence.iter().enumerate() {
            let Some(action) = self.action(sym) else {
                continue;
            };
            apply_2d(action, &mut turtle, sink, rng).inspect_err(|err| {
                debug!(index, symbol = %char::from(sym), %err, "2D interpretation aborted");
            })?;
        }

        debug!(
            symbols = sequence.len(),
            open_pushes = turtle.depth(),
            "2D interpretation finished"
        );
        Ok(turtle)
    }
}

fn apply_2d(
    action: &Action2D,
    turtle: &mut Turtle2D,
    sink: &mut dyn RenderSink,
    rng: &mut dyn RandomSource,
) -> Result<()> {
    match action {
        Action2D::Draw(len) => turtle.draw_forward(*len, sink),
        Action2D::Move(len) => {
            turtle.advance(*len);
        }
        Action2D::Rotate(deg) => turtle.rotate(*deg),
        Action2D::Push => turtle.push_state(),
        Action2D::Pop => turtle.pop_state()?,
        Action2D::PushRotate(deg) => {
            turtle.push_state();
            turtle.rotate(*deg);
        }
        Action2D::PopRotate(deg) => {
            turtle.pop_state()?;
            turtle.rotate(*deg);
        }
        Action2D::Mark => sink.mark_point(turtle.position()),
        Action2D::SetColor(color) => turtle.state.color = *color,
        Action2D::Custom(f) => f(turtle, sink, rng)?,
        Action2D::Ignore => {}
    }
    Ok(())
}

/// Configuration for the standard 3D symbols.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Turtle3DConfig {
    /// Distance moved per repeated `F`/`G`/`f`.
    pub step_length: f32,
    /// Degrees applied by `+`/`-`.
    pub yaw_degrees: f32,
    /// Degrees applied by `&`/`^`.
    pub pitch_degrees: f32,
}

impl Default for Turtle3DConfig {
    fn default() -> Self {
        Self {
            step_length: 0.1,
            yaw_degrees: 45.0,
            pitch_degrees: 25.0,
        }
    }
}

/// Splits `sequence` into maximal runs of one symbol, as `(symbol, count)`.
pub fn symbol_runs(sequence: &[Symbol]) -> impl Iterator<Item = (Symbol, usize)> + '_ {
    sequence.chunk_by(|a, b| a == b).map(|run| (run[0], run.len()))
}

/// Interprets a symbol sequence with a [`Turtle3D`], one dispatch per run.
#[derive(Clone, Debug, Default)]
pub struct Turtle3DInterpreter {
    actions: Vec<Action3D>,
    config: Turtle3DConfig,
}

impl Turtle3DInterpreter {
    pub fn new(config: Turtle3DConfig) -> Self {
        Self {
            actions: Vec::new(),
            config,
        }
    }

    pub fn with_map(mut self, map: Vec<Action3D>) -> Self {
        self.actions = map;
        self
    }

    pub fn with_action(mut self, symbol: Symbol, action: Action3D) -> Self {
        self.set_action(symbol, action);
        self
    }

    /// Binds `action` to `symbol`; gaps are [`Action3D::Ignore`].
    pub fn set_action(&mut self, symbol: Symbol, action: Action3D) {
        let idx = symbol as usize;
        if idx >= self.actions.len() {
            self.actions.resize(idx + 1, Action3D::Ignore);
        }
        self.actions[idx] = action;
    }

    /// Gives `target` a copy of the action currently bound to `source`.
    pub fn alias(&mut self, target: Symbol, source: Symbol) {
        let action = self.action(source).cloned().unwrap_or_default();
        self.set_action(target, action);
    }

    pub fn action(&self, symbol: Symbol) -> Option<&Action3D> {
        self.actions.get(symbol as usize)
    }

    pub fn config(&self) -> &Turtle3DConfig {
        &self.config
    }

    /// Registers the conventional 3D symbols.
    ///
    /// `F`, `G`, `f` move; `+`/`-` yaw; `&`/`^` pitch; `|` turns around;
    /// `[`/`]` save and restore.
    pub fn populate_standard_symbols(&mut self) {
        let step = self.config.step_length;
        let yaw = self.config.yaw_degrees;
        let pitch = self.config.pitch_degrees;
        let mappings = [
            (b'F', Action3D::Forward(step)),
            (b'G', Action3D::Forward(step)),
            (b'f', Action3D::Forward(step)),
            (b'+', Action3D::Rotate { yaw, pitch: 0.0 }),
            (b'-', Action3D::Rotate { yaw: -yaw, pitch: 0.0 }),
            (b'&', Action3D::Rotate { yaw: 0.0, pitch }),
            (b'^', Action3D::Rotate { yaw: 0.0, pitch: -pitch }),
            (b'|', Action3D::Rotate { yaw: 0.0, pitch: 180.0 }),
            (b'[', Action3D::Push),
            (b']', Action3D::Pop),
        ];

        for (sym, action) in mappings {
            self.set_action(sym, action);
        }
    }

    /// Walks `sequence` from the origin facing +Y and returns the event trace.
    pub fn interpret(
        &self,
        sequence: &[Symbol],
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<TurtleEvent>> {
        self.interpret_from(sequence, TurtleState3D::default(), rng)
            .map(Turtle3D::into_events)
    }

    /// Walks `sequence` from `start` and returns the final turtle.
    ///
    /// Consecutive identical symbols are dispatched once, with the run length.
    ///
    /// # Errors
    ///
    /// Aborts with [`FractalError::StackUnderflow`](crate::FractalError) on an
    /// unmatched pop, or with whatever a custom action returns.
    pub fn interpret_from(
        &self,
        sequence: &[Symbol],
        start: TurtleState3D,
        rng: &mut dyn RandomSource,
    ) -> Result<Turtle3D> {
        let mut turtle = Turtle3D::with_state(start);
        let mut dispatches = 0usize;

        for (sym, count) in symbol_runs(sequence) {
            let Some(action) = self.action(sym) else {
                continue;
            };
            trace!(symbol = %char::from(sym), count, "dispatch run");
            apply_3d(action, &mut turtle, count, rng).inspect_err(|err| {
                debug!(symbol = %char::from(sym), count, %err, "3D interpretation aborted");
            })?;
            dispatches += 1;
        }

        debug!(
            symbols = sequence.len(),
            dispatches,
            events = turtle.events().len(),
            "3D interpretation finished"
        );
        Ok(turtle)
    }

    /// Interprets `sequence`, feeds the trace to `builder` and hands the
    /// resulting skeleton to `on_result`.
    pub fn generate_skeleton<R>(
        &self,
        sequence: &[Symbol],
        rng: &mut dyn RandomSource,
        mut builder: SkeletonBuilder,
        on_result: impl FnOnce(Skeleton) -> R,
    ) -> Result<R> {
        let events = self.interpret(sequence, rng)?;
        builder.observe_all(&events)?;
        Ok(builder.finish(on_result))
    }
}

fn apply_3d(
    action: &Action3D,
    turtle: &mut Turtle3D,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Result<()> {
    match action {
        Action3D::Forward(step) => turtle.move_forward(step * count as f32),
        Action3D::Rotate { yaw, pitch } => {
            for _ in 0..count {
                turtle.rotate(*yaw, *pitch);
            }
        }
        Action3D::Push => {
            for _ in 0..count {
                turtle.push_state();
            }
        }
        Action3D::Pop => {
            for _ in 0..count {
                turtle.pop_state()?;
            }
        }
        Action3D::Custom(f) => f(turtle, count, rng)?,
        Action3D::Ignore => {}
    }
    Ok(())
}
