//! Turtle state and primitive operations for 2D and 3D interpretation.

use crate::error::{FractalError, Result};
use crate::random::RandomSource;
use crate::render::{Color, RenderSink};
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Position, heading and pen of the 2D turtle.
///
/// `heading` is in degrees. 0° points along +X and 90° along +Y, so a start
/// heading of 90° makes the first move go "up".
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurtleState2D {
    pub position: Vec2,
    pub heading: f32,
    pub color: Color,
}

impl TurtleState2D {
    /// Unit vector for the current heading.
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.heading.to_radians())
    }
}

/// The 2D turtle: a current state plus its save/restore stack.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Turtle2D {
    pub state: TurtleState2D,
    stack: Vec<TurtleState2D>,
}

impl Turtle2D {
    pub fn new(origin: Vec2, heading: f32) -> Self {
        Self {
            state: TurtleState2D {
                position: origin,
                heading,
                color: Color::default(),
            },
            stack: Vec::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.state.position
    }

    pub fn heading(&self) -> f32 {
        self.state.heading
    }

    pub fn direction(&self) -> Vec2 {
        self.state.direction()
    }

    /// Number of saved states.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Moves `distance` along the heading without drawing.
    /// Returns the `(from, to)` positions.
    pub fn advance(&mut self, distance: f32) -> (Vec2, Vec2) {
        let from = self.state.position;
        let to = from + self.direction() * distance;
        self.state.position = to;
        (from, to)
    }

    /// Moves `distance` along the heading and draws the travelled segment.
    pub fn draw_forward(&mut self, distance: f32, sink: &mut dyn RenderSink) {
        let (from, to) = self.advance(distance);
        sink.draw_line(from, to, self.state.color);
    }

    pub fn rotate(&mut self, delta_degrees: f32) {
        self.state.heading += delta_degrees;
    }

    pub fn push_state(&mut self) {
        self.stack.push(self.state);
    }

    /// Restores the most recently pushed state.
    ///
    /// # Errors
    ///
    /// [`FractalError::StackUnderflow`] if nothing was pushed; the current
    /// state is left as it was.
    pub fn pop_state(&mut self) -> Result<()> {
        self.state = self.stack.pop().ok_or(FractalError::StackUnderflow)?;
        Ok(())
    }
}

/// Position and orientation of the 3D turtle.
///
/// The turtle grows along its local +Y axis, like a plant stem.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState3D {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for TurtleState3D {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl TurtleState3D {
    /// Returns the turtle's local forward (growth) direction (Y-axis) in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Returns the turtle's local right direction (X-axis) in world space.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Returns the turtle's local normal direction (Z-axis) in world space.
    pub fn normal(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Rotates the turtle around its local X axis by `angle` radians.
    pub fn rotate_local_x(&mut self, angle: f32) {
        self.rotation *= Quat::from_axis_angle(Vec3::X, angle);
    }

    /// Rotates the turtle around its local Z axis by `angle` radians.
    pub fn rotate_local_z(&mut self, angle: f32) {
        self.rotation *= Quat::from_axis_angle(Vec3::Z, angle);
    }
}

/// One primitive applied to a [`Turtle3D`], in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TurtleEvent {
    /// Straight move; `rotation` is the orientation the move was made with.
    Move { from: Vec3, to: Vec3, rotation: Quat },
    /// Yaw then pitch, in degrees.
    Rotate { yaw: f32, pitch: f32 },
    Push,
    Pop,
}

/// The 3D turtle: current state, save/restore stack, and the trace of every
/// primitive applied so far.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Turtle3D {
    pub state: TurtleState3D,
    stack: Vec<TurtleState3D>,
    events: Vec<TurtleEvent>,
}

impl Turtle3D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: TurtleState3D) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn forward(&self) -> Vec3 {
        self.state.forward()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn events(&self) -> &[TurtleEvent] {
        &self.events
    }

    /// Consumes the turtle, keeping only its trace.
    pub fn into_events(self) -> Vec<TurtleEvent> {
        self.events
    }

    /// Moves `distance` along the forward axis.
    pub fn move_forward(&mut self, distance: f32) {
        let from = self.state.position;
        let to = from + self.state.forward() * distance;
        self.state.position = to;
        self.events.push(TurtleEvent::Move {
            from,
            to,
            rotation: self.state.rotation,
        });
    }

    /// Turns the heading `yaw` degrees about the local normal (Z) axis, then
    /// tilts it `pitch` degrees about the (new) local right (X) axis.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.state.rotate_local_z(yaw.to_radians());
        self.state.rotate_local_x(pitch.to_radians());
        self.events.push(TurtleEvent::Rotate { yaw, pitch });
    }

    pub fn push_state(&mut self) {
        self.stack.push(self.state);
        self.events.push(TurtleEvent::Push);
    }

    /// Restores the most recently pushed frame and position.
    ///
    /// # Errors
    ///
    /// [`FractalError::StackUnderflow`] if nothing was pushed. Neither the
    /// state nor the trace changes in that case.
    pub fn pop_state(&mut self) -> Result<()> {
        self.state = self.stack.pop().ok_or(FractalError::StackUnderflow)?;
        self.events.push(TurtleEvent::Pop);
        Ok(())
    }
}

/// Signature of a custom 2D action.
pub type Action2DFn =
    Rc<dyn Fn(&mut Turtle2D, &mut dyn RenderSink, &mut dyn RandomSource) -> Result<()>>;

/// Signature of a custom 3D action. The `usize` is the run length.
pub type Action3DFn = Rc<dyn Fn(&mut Turtle3D, usize, &mut dyn RandomSource) -> Result<()>>;

/// What a symbol does to the 2D turtle.
///
/// Cloning copies the action itself, closures included, so an alias made by
/// cloning never follows later rebinding of the original symbol.
#[derive(Clone, Default)]
pub enum Action2D {
    /// Draw a segment of the given length (`F`).
    Draw(f32),
    /// Move without drawing (`f`).
    Move(f32),
    /// Add degrees to the heading (`+`/`-`).
    Rotate(f32),
    /// Save the state (`[`).
    Push,
    /// Restore the state (`]`).
    Pop,
    /// Save, then rotate.
    PushRotate(f32),
    /// Restore, then rotate.
    PopRotate(f32),
    /// Report the current position to the sink.
    Mark,
    /// Change the pen color.
    SetColor(Color),
    Custom(Action2DFn),
    /// No-op.
    #[default]
    Ignore,
}

impl Action2D {
    pub fn custom(
        f: impl Fn(&mut Turtle2D, &mut dyn RenderSink, &mut dyn RandomSource) -> Result<()> + 'static,
    ) -> Self {
        Self::Custom(Rc::new(f))
    }
}

impl fmt::Debug for Action2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draw(len) => f.debug_tuple("Draw").field(len).finish(),
            Self::Move(len) => f.debug_tuple("Move").field(len).finish(),
            Self::Rotate(deg) => f.debug_tuple("Rotate").field(deg).finish(),
            Self::Push => f.write_str("Push"),
            Self::Pop => f.write_str("Pop"),
            Self::PushRotate(deg) => f.debug_tuple("PushRotate").field(deg).finish(),
            Self::PopRotate(deg) => f.debug_tuple("PopRotate").field(deg).finish(),
            Self::Mark => f.write_str("Mark"),
            Self::SetColor(c) => f.debug_tuple("SetColor").field(c).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Ignore => f.write_str("Ignore"),
        }
    }
}

/// What a run of one symbol does to the 3D turtle.
///
/// Built-in variants scale with the run length; custom actions receive it
/// and decide for themselves.
#[derive(Clone, Default)]
pub enum Action3D {
    /// Move `step × count` forward in a single segment.
    Forward(f32),
    /// Apply `(yaw, pitch)` degrees `count` times.
    Rotate { yaw: f32, pitch: f32 },
    /// Push `count` times.
    Push,
    /// Pop `count` times.
    Pop,
    Custom(Action3DFn),
    #[default]
    Ignore,
}

impl Action3D {
    pub fn custom(
        f: impl Fn(&mut Turtle3D, usize, &mut dyn RandomSource) -> Result<()> + 'static,
    ) -> Self {
        Self::Custom(Rc::new(f))
    }
}

impl fmt::Debug for Action3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward(step) => f.debug_tuple("Forward").field(step).finish(),
            Self::Rotate { yaw, pitch } => f
                .debug_struct("Rotate")
                .field("yaw", yaw)
                .field("pitch", pitch)
                .finish(),
            Self::Push => f.write_str("Push"),
            Self::Pop => f.write_str("Pop"),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Ignore => f.write_str("Ignore"),
        }
    }
}
