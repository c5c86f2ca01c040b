//! Ready-made grammars paired with the interpreters that draw them.
//!
//! Each function returns the grammar and a configured interpreter; the caller
//! still picks the generation count, origin, heading and sink.

use crate::error::Result;
use crate::grammar::LSystem;
use crate::interpreter::{Turtle2DConfig, Turtle2DInterpreter, Turtle3DConfig, Turtle3DInterpreter};
use crate::random::RandomSource;
use crate::render::{Color, RenderSink};
use crate::skeleton::{Skeleton, SkeletonBuilder, SkeletonConfig, branch_falloff};
use crate::turtle::{Action2D, Action3D, Turtle2D};
use glam::Vec2;

/// A 2D grammar and its interpreter.
#[derive(Clone, Debug)]
pub struct Preset2D {
    pub grammar: LSystem,
    pub interpreter: Turtle2DInterpreter,
}

impl Preset2D {
    /// Expands `iterations` generations and draws the result.
    pub fn draw(
        &self,
        iterations: usize,
        origin: Vec2,
        start_heading: f32,
        sink: &mut dyn RenderSink,
        rng: &mut dyn RandomSource,
    ) -> Result<Turtle2D> {
        let sequence = self.grammar.expand(iterations, rng)?;
        self.interpreter
            .interpret(&sequence, origin, start_heading, sink, rng)
    }
}

/// A 3D grammar and its interpreter.
#[derive(Clone, Debug)]
pub struct Preset3D {
    pub grammar: LSystem,
    pub interpreter: Turtle3DInterpreter,
}

impl Preset3D {
    /// Expands `iterations` generations and builds a skeleton from the walk.
    pub fn skeleton<R>(
        &self,
        iterations: usize,
        rng: &mut dyn RandomSource,
        builder: SkeletonBuilder,
        on_result: impl FnOnce(Skeleton) -> R,
    ) -> Result<R> {
        let sequence = self.grammar.expand(iterations, rng)?;
        self.interpreter
            .generate_skeleton(&sequence, rng, builder, on_result)
    }
}

fn interpreter_2d(scale: f32) -> Turtle2DInterpreter {
    Turtle2DInterpreter::new(Turtle2DConfig {
        step_length: scale,
        ..Default::default()
    })
}

/// Binary tree: `0 → 1[0]0`, `1 → 11`, branches at ±45°.
pub fn fractal_tree(scale: f32) -> Preset2D {
    let grammar = LSystem::new("0")
        .with_rule(b'0', "1[0]0")
        .with_rule(b'1', "11");

    let mut interpreter = interpreter_2d(scale)
        .with_action(b'0', Action2D::Draw(scale))
        .with_action(b'[', Action2D::PushRotate(45.0))
        .with_action(b']', Action2D::PopRotate(-45.0));
    interpreter.alias(b'1', b'0');

    Preset2D {
        grammar,
        interpreter,
    }
}

/// Quadratic Koch curve.
pub fn koch_curve(scale: f32) -> Preset2D {
    let grammar = LSystem::new("F").with_rule(b'F', "F+F-F-F+F");
    let interpreter = interpreter_2d(scale)
        .with_action(b'F', Action2D::Draw(scale))
        .with_action(b'+', Action2D::Rotate(90.0))
        .with_action(b'-', Action2D::Rotate(-90.0));

    Preset2D {
        grammar,
        interpreter,
    }
}

/// Sierpinski triangle: `F-G-G` with `F → F-G+F+G-F`, `G → GG`, 120° turns.
pub fn sierpinski_triangle(scale: f32) -> Preset2D {
    let grammar = LSystem::new("F-G-G")
        .with_rule(b'F', "F-G+F+G-F")
        .with_rule(b'G', "GG");

    let mut interpreter = interpreter_2d(scale)
        .with_action(b'F', Action2D::Draw(scale))
        .with_action(b'+', Action2D::Rotate(120.0))
        .with_action(b'-', Action2D::Rotate(-120.0));
    interpreter.alias(b'G', b'F');

    Preset2D {
        grammar,
        interpreter,
    }
}

/// Heighway dragon.
pub fn dragon_curve(scale: f32) -> Preset2D {
    let grammar = LSystem::new("FX")
        .with_rule(b'X', "X+YF+")
        .with_rule(b'Y', "-FX-Y");
    let interpreter = interpreter_2d(scale)
        .with_action(b'F', Action2D::Draw(scale))
        .with_action(b'+', Action2D::Rotate(-90.0))
        .with_action(b'-', Action2D::Rotate(90.0));

    Preset2D {
        grammar,
        interpreter,
    }
}

/// Barnsley-style fern plant with 25° turns.
pub fn fractal_plant(scale: f32) -> Preset2D {
    let grammar = LSystem::new("X")
        .with_rule(b'X', "F+[[X]-X]-F[-FX]+X")
        .with_rule(b'F', "FF");
    let interpreter = interpreter_2d(scale)
        .with_action(b'F', Action2D::Draw(scale))
        .with_action(b'+', Action2D::Rotate(-25.0))
        .with_action(b'-', Action2D::Rotate(25.0))
        .with_action(b'[', Action2D::Push)
        .with_action(b']', Action2D::Pop);

    Preset2D {
        grammar,
        interpreter,
    }
}

/// Leaf outline. The stem base (`o`) and every tip (`e`) are reported through
/// [`RenderSink::mark_point`], ready for a hull computation.
pub fn fractal_leaf(scale: f32, color: Color) -> Preset2D {
    let mut grammar = LSystem::new("o0")
        .with_rule(b'0', "1[-0][+0]1e")
        .with_rule(b'1', "11");
    grammar.alias_rule(b'e', b'0');

    let mut interpreter = Turtle2DInterpreter::new(Turtle2DConfig {
        step_length: scale,
        color,
        ..Default::default()
    })
    .with_action(b'0', Action2D::Draw(scale))
    .with_action(b'o', Action2D::Mark)
    .with_action(b'e', Action2D::Mark)
    .with_action(b'[', Action2D::Push)
    .with_action(b']', Action2D::Pop)
    .with_action(b'+', Action2D::Rotate(45.0))
    .with_action(b'-', Action2D::Rotate(-45.0));
    interpreter.alias(b'1', b'0');

    Preset2D {
        grammar,
        interpreter,
    }
}

/// Stochastic 3D plant.
///
/// `0` rewrites to `1[0]0`, or to `1[0][0]0` half of the time. A run of `n`
/// growth symbols moves `scale × (u₁ + … + uₙ)` with `uᵢ` uniform in `[0, 1)`.
/// Brackets push/pop and then yaw/pitch by random amounts, with mirrored yaw
/// on the way out.
pub fn fractal_plant_3d(scale: f32) -> Preset3D {
    let grammar = LSystem::new("0")
        .with_dynamic_rule(b'0', |rng| {
            let mut result = b"1[0]".to_vec();
            if rng.uniform() < 0.5 {
                result.extend_from_slice(b"[0]");
            }
            result.push(b'0');
            result
        })
        .with_rule(b'1', "11");

    let grow = Action3D::custom(move |t, count, rng| {
        let growth: f32 = (0..count).map(|_| rng.uniform()).sum();
        t.move_forward(growth * scale);
        Ok(())
    });
    let open = Action3D::custom(|t, count, rng| {
        for _ in 0..count {
            t.push_state();
            let yaw = 180.0 * rng.uniform_range(0.1, 1.0);
            let pitch = 45.0 * rng.uniform_range(0.2, 1.0);
            t.rotate(yaw, pitch);
        }
        Ok(())
    });
    let close = Action3D::custom(|t, count, rng| {
        for _ in 0..count {
            t.pop_state()?;
            let yaw = -180.0 * rng.uniform_range(0.1, 1.0);
            let pitch = 45.0 * rng.uniform_range(0.2, 1.0);
            t.rotate(yaw, pitch);
        }
        Ok(())
    });

    let mut interpreter = Turtle3DInterpreter::new(Turtle3DConfig {
        step_length: scale,
        ..Default::default()
    })
    .with_action(b'0', grow)
    .with_action(b'[', open)
    .with_action(b']', close);
    interpreter.alias(b'1', b'0');

    Preset3D {
        grammar,
        interpreter,
    }
}

/// Grows [`fractal_plant_3d`] for `iterations` generations and hands the
/// skeleton to `on_result`. Each branch opening shortens bones by 20% and
/// thins them by 30%.
pub fn fractal_tree_3d<R>(
    rng: &mut dyn RandomSource,
    iterations: usize,
    on_result: impl FnOnce(Skeleton) -> R,
) -> Result<R> {
    let builder =
        SkeletonBuilder::new(SkeletonConfig::default()).with_falloff(branch_falloff(0.8, 0.7));
    fractal_plant_3d(0.1).skeleton(iterations, rng, builder, on_result)
}
