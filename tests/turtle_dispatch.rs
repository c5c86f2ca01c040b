// tests/turtle_dispatch.rs
use fractal_turtle::{
    Action2D, Action3D, FractalError, LineBuffer, RandomSource, SeededRandom, Turtle2D,
    Turtle2DConfig, Turtle2DInterpreter, Turtle3D, Turtle3DConfig, Turtle3DInterpreter,
};
use glam::Vec2;
use std::cell::RefCell;
use std::rc::Rc;

const EPS: f32 = 1e-4;

#[test]
fn test_run_dispatched_once_with_count() {
    let calls: Rc<RefCell<Vec<usize>>> = Rc::default();
    let log = Rc::clone(&calls);

    let interpreter = Turtle3DInterpreter::new(Turtle3DConfig::default()).with_action(
        b'0',
        Action3D::custom(move |_, count, _| {
            log.borrow_mut().push(count);
            Ok(())
        }),
    );

    let mut rng = SeededRandom::new(0);
    interpreter.interpret(b"000", &mut rng).unwrap();
    assert_eq!(*calls.borrow(), vec![3]);

    calls.borrow_mut().clear();
    interpreter.interpret(b"00x0", &mut rng).unwrap();
    assert_eq!(*calls.borrow(), vec![2, 1]);
}

#[test]
fn test_2d_dispatch_is_per_symbol() {
    let calls = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&calls);
    let interpreter = Turtle2DInterpreter::new(Turtle2DConfig::default()).with_action(
        b'0',
        Action2D::custom(move |_, _, _| {
            *counter.borrow_mut() += 1;
            Ok(())
        }),
    );

    let mut sink = LineBuffer::new();
    let mut rng = SeededRandom::new(0);
    interpreter
        .interpret(b"000", Vec2::ZERO, 90.0, &mut sink, &mut rng)
        .unwrap();
    assert_eq!(*calls.borrow(), 3);
}

#[test]
fn test_pop_restores_state_after_random_walk() {
    let mut rng = SeededRandom::new(21);
    for _ in 0..32 {
        let mut turtle = Turtle2D::new(Vec2::new(rng.uniform(), rng.uniform()), 90.0);
        let before = turtle.state;
        turtle.push_state();
        for _ in 0..16 {
            if rng.uniform() < 0.5 {
                turtle.advance(rng.uniform_range(-5.0, 5.0));
            } else {
                turtle.rotate(rng.uniform_range(-180.0, 180.0));
            }
        }
        turtle.pop_state().unwrap();
        assert!(turtle.position().abs_diff_eq(before.position, EPS));
        assert!((turtle.heading() - before.heading).abs() < EPS);

        let mut turtle = Turtle3D::new();
        turtle.rotate(rng.uniform_range(0.0, 90.0), rng.uniform_range(0.0, 90.0));
        let before = turtle.state;
        turtle.push_state();
        for _ in 0..16 {
            if rng.uniform() < 0.5 {
                turtle.move_forward(rng.uniform_range(0.0, 3.0));
            } else {
                turtle.rotate(rng.uniform_range(-180.0, 180.0), rng.uniform_range(-45.0, 45.0));
            }
        }
        turtle.pop_state().unwrap();
        assert!(turtle.state.position.abs_diff_eq(before.position, EPS));
        assert!(turtle.state.rotation.abs_diff_eq(before.rotation, EPS));
    }
}

#[test]
fn test_empty_pop_is_fatal_and_harmless() {
    let mut turtle = Turtle2D::new(Vec2::new(2.0, 3.0), 45.0);
    let before = turtle.state;
    assert_eq!(turtle.pop_state(), Err(FractalError::StackUnderflow));
    assert_eq!(turtle.state, before);

    let mut turtle = Turtle3D::new();
    let before = turtle.state;
    assert_eq!(turtle.pop_state(), Err(FractalError::StackUnderflow));
    assert_eq!(turtle.state, before);
    assert!(turtle.events().is_empty());
}

#[test]
fn test_custom_action_errors_propagate() {
    let interpreter = Turtle3DInterpreter::new(Turtle3DConfig::default())
        .with_action(b']', Action3D::custom(|t, _, _| t.pop_state()));
    let mut rng = SeededRandom::new(0);
    assert_eq!(
        interpreter.interpret(b"]", &mut rng),
        Err(FractalError::StackUnderflow)
    );
}

#[test]
fn test_alias_survives_rebinding() {
    let mut interpreter = Turtle2DInterpreter::new(Turtle2DConfig::default())
        .with_action(b'0', Action2D::Draw(2.0));
    interpreter.alias(b'1', b'0');
    interpreter.set_action(b'0', Action2D::Ignore);

    let mut sink = LineBuffer::new();
    let mut rng = SeededRandom::new(0);
    interpreter
        .interpret(b"0101", Vec2::ZERO, 0.0, &mut sink, &mut rng)
        .unwrap();
    assert_eq!(sink.lines.len(), 2);
    assert!((sink.lines[0].length() - 2.0).abs() < EPS);
}

#[test]
fn test_plant_draws_balanced_tree() {
    let preset = fractal_turtle::presets::fractal_plant(1.0);
    let mut sink = LineBuffer::new();
    let mut rng = SeededRandom::new(0);
    let turtle = preset
        .draw(3, Vec2::ZERO, 90.0, &mut sink, &mut rng)
        .unwrap();
    assert_eq!(turtle.depth(), 0);
    assert!(!sink.lines.is_empty());
    let (_, hi) = sink.bounds().unwrap();
    assert!(hi.y > 0.0, "Plant grows upward from the origin");
}
