// tests/determinism.rs
use fractal_turtle::{SeededRandom, Skeleton, SkeletonBuilder, presets};

fn grow(seed: u64, iterations: usize) -> (Vec<u8>, Skeleton) {
    let preset = presets::fractal_plant_3d(0.1);
    let mut rng = SeededRandom::new(seed);
    let sequence = preset.grammar.expand(iterations, &mut rng).unwrap();
    let skeleton = preset
        .interpreter
        .generate_skeleton(&sequence, &mut rng, SkeletonBuilder::default(), |s| s)
        .unwrap();
    (sequence, skeleton)
}

#[test]
fn test_same_seed_same_sequence_and_tree() {
    let (seq_a, tree_a) = grow(1234, 5);
    let (seq_b, tree_b) = grow(1234, 5);

    assert_eq!(seq_a, seq_b, "Expanded sequences must be byte-identical");
    assert_eq!(tree_a, tree_b, "Bone trees must be identical");
}

#[test]
fn test_different_seeds_diverge() {
    let (seq_a, tree_a) = grow(1, 6);
    let (seq_b, tree_b) = grow(2, 6);
    assert!(seq_a != seq_b || tree_a != tree_b);
}

#[test]
fn test_preset_tree_is_reproducible() {
    let a = presets::fractal_tree_3d(&mut SeededRandom::new(77), 4, |s| s).unwrap();
    let b = presets::fractal_tree_3d(&mut SeededRandom::new(77), 4, |s| s).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.total_mass(500.0, 0.05), b.total_mass(500.0, 0.05));
}

#[test]
fn test_tree_invariants() {
    let (_, tree) = grow(42, 5);

    let root = tree.root().expect("tree has a root");
    assert_eq!(root.props.depth, 0);
    assert!(root.parent.is_none());

    for bone in tree.bones() {
        for child in tree.children(bone.id) {
            assert_eq!(child.parent, Some(bone.id));
            assert!(child.props.depth > bone.props.depth);
        }
    }

    // Every bone belongs to exactly one branch.
    let mut seen: Vec<_> = tree.branches().iter().flat_map(|b| b.nodes.clone()).collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), tree.len());
    assert_eq!(
        tree.branches().iter().map(|b| b.len()).sum::<usize>(),
        tree.len()
    );
}
