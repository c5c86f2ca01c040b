//! Bone skeletons extracted from a 3D turtle walk.
//!
//! [`SkeletonBuilder`] listens to [`TurtleEvent`]s: every move becomes a bone,
//! `[` remembers which bone to come back to and `]` returns there. When the
//! walk is done, [`SkeletonBuilder::finish`] groups bones into
//! [`FractalBranch`]es and hands the whole [`Skeleton`] to the caller.
//!
//! Bones live in one arena (`Vec<Bone>`) and refer to each other by
//! [`BoneId`]. Children are owned id lists; the parent link is a plain id.

use crate::error::{FractalError, Result};
use crate::turtle::TurtleEvent;
use bevy_heavy::ComputeMassProperties3d as _;
use bevy_math::primitives::Cylinder;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Index of a bone inside its [`Skeleton`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoneId(pub u32);

impl BoneId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-bone properties, inherited from the parent and adjusted by the falloff.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneProps {
    /// Bones between this one and the root. The root is 0.
    pub depth: u32,
    /// How many branch openings (`[`) lie on the path from the root.
    pub branch_order: u32,
    pub length_factor: f32,
    pub thickness: f32,
}

/// One straight segment of the skeleton.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bone {
    pub id: BoneId,
    pub parent: Option<BoneId>,
    pub children: Vec<BoneId>,
    pub start: Vec3,
    pub end: Vec3,
    /// Turtle orientation while the bone was laid down.
    pub rotation: Quat,
    pub props: BoneProps,
    /// First bone laid after a `[`, so it opens a branch of its own even
    /// when it is its parent's only child.
    pub starts_branch: bool,
}

impl Bone {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Unit direction from start to end, or zero for a degenerate bone.
    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// How a [`FractalBranch`] ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchKind {
    /// The last bone has no children.
    Leaf,
    /// The last bone has children that each start a new branch: two or more,
    /// or a single one opened by a `[`.
    BranchPoint,
}

/// A maximal chain of bones with no branch point before its last node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractalBranch {
    pub nodes: Vec<BoneId>,
    pub kind: BranchKind,
}

impl FractalBranch {
    pub fn first(&self) -> Option<BoneId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<BoneId> {
        self.nodes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == BranchKind::Leaf
    }
}

/// The finished bone tree. The root is always bone 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    bones: Vec<Bone>,
    branches: Vec<FractalBranch>,
}

impl Skeleton {
    pub fn root(&self) -> Option<&Bone> {
        self.bones.first()
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Branches in depth-first order, starting with the one containing the root.
    pub fn branches(&self) -> &[FractalBranch] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn parent(&self, id: BoneId) -> Option<&Bone> {
        self.bone(id)?.parent.and_then(|p| self.bone(p))
    }

    pub fn children(&self, id: BoneId) -> impl Iterator<Item = &Bone> + '_ {
        self.bone(id)
            .into_iter()
            .flat_map(|b| b.children.iter())
            .filter_map(|&c| self.bone(c))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Bone> + '_ {
        self.bones.iter().filter(|b| b.is_leaf())
    }

    /// Bones where a [`BranchKind::BranchPoint`] branch ends, in branch order.
    pub fn branch_points(&self) -> impl Iterator<Item = &Bone> + '_ {
        self.branches
            .iter()
            .filter(|b| b.kind == BranchKind::BranchPoint)
            .filter_map(|b| b.last())
            .filter_map(|id| self.bone(id))
    }

    /// Mass of one bone treated as a solid cylinder of radius
    /// `radius × thickness` and the bone's length.
    pub fn segment_mass(&self, id: BoneId, density: f32, radius: f32) -> Option<f32> {
        let bone = self.bone(id)?;
        let cylinder = Cylinder::new(radius * bone.props.thickness, bone.length());
        Some(cylinder.mass(density))
    }

    /// Sum of [`segment_mass`](Self::segment_mass) over every bone.
    pub fn total_mass(&self, density: f32, radius: f32) -> f32 {
        self.bones
            .iter()
            .filter_map(|b| self.segment_mass(b.id, density, radius))
            .sum()
    }
}

/// Adjusts a freshly created child's props. The child arrives with its
/// structural fields set and the parent's factors copied over.
pub type Falloff = Box<dyn Fn(&BoneProps, &mut BoneProps)>;

/// Scales length and thickness by fixed ratios each time a branch opens.
/// Bones continuing the same branch keep their parent's values.
pub fn branch_falloff(
    length_ratio: f32,
    thickness_ratio: f32,
) -> impl Fn(&BoneProps, &mut BoneProps) + 'static {
    move |parent, child| {
        if child.branch_order > parent.branch_order {
            child.length_factor = parent.length_factor * length_ratio;
            child.thickness = parent.thickness * thickness_ratio;
        }
    }
}

/// Props given to the root bone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkeletonConfig {
    pub root_length_factor: f32,
    pub root_thickness: f32,
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            root_length_factor: 1.0,
            root_thickness: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct SavedFocus {
    focus: Option<BoneId>,
    opens_branch: bool,
}

/// Builds a [`Skeleton`] incrementally from turtle events.
pub struct SkeletonBuilder {
    config: SkeletonConfig,
    falloff: Option<Falloff>,
    bones: Vec<Bone>,
    focus: Option<BoneId>,
    opens_branch: bool,
    stack: Vec<SavedFocus>,
}

impl Default for SkeletonBuilder {
    fn default() -> Self {
        Self::new(SkeletonConfig::default())
    }
}

impl SkeletonBuilder {
    pub fn new(config: SkeletonConfig) -> Self {
        Self {
            config,
            falloff: None,
            bones: Vec::new(),
            focus: None,
            opens_branch: false,
            stack: Vec::new(),
        }
    }

    /// Sets the function that derives child props from parent props.
    /// Without one, children inherit their parent's factors unchanged.
    pub fn with_falloff(mut self, falloff: impl Fn(&BoneProps, &mut BoneProps) + 'static) -> Self {
        self.falloff = Some(Box::new(falloff));
        self
    }

    /// Feeds one event.
    ///
    /// # Errors
    ///
    /// [`FractalError::StackUnderflow`] on a `Pop` with no matching `Push`;
    /// the builder is unchanged.
    pub fn observe(&mut self, event: &TurtleEvent) -> Result<()> {
        match *event {
            TurtleEvent::Move { from, to, rotation } => {
                if self.bones.is_empty() && self.opens_branch {
                    // The walk opened a branch before its first move: pin the
                    // origin with a zero-length root so siblings share it.
                    self.add_bone(from, from, rotation);
                    self.opens_branch = true;
                }
                self.add_bone(from, to, rotation);
            }
            TurtleEvent::Rotate { .. } => {}
            TurtleEvent::Push => {
                self.stack.push(SavedFocus {
                    focus: self.focus,
                    opens_branch: self.opens_branch,
                });
                self.opens_branch = true;
            }
            TurtleEvent::Pop => {
                let saved = self.stack.pop().ok_or(FractalError::StackUnderflow)?;
                self.focus = saved.focus;
                self.opens_branch = saved.opens_branch;
            }
        }
        Ok(())
    }

    pub fn observe_all<'e>(&mut self, events: impl IntoIterator<Item = &'e TurtleEvent>) -> Result<()> {
        for event in events {
            self.observe(event)?;
        }
        Ok(())
    }

    fn add_bone(&mut self, start: Vec3, end: Vec3, rotation: Quat) {
        let id = BoneId(self.bones.len() as u32);

        // Focus is only lost after popping back past the first move, and then
        // bone 0 is the zero-length anchor at the walk origin.
        let parent = self.focus.or_else(|| self.bones.first().map(|b| b.id));

        let props = match parent {
            None => BoneProps {
                depth: 0,
                branch_order: 0,
                length_factor: self.config.root_length_factor,
                thickness: self.config.root_thickness,
            },
            Some(parent_id) => {
                let parent_props = self.bones[parent_id.index()].props;
                let mut props = BoneProps {
                    depth: parent_props.depth + 1,
                    branch_order: parent_props.branch_order + u32::from(self.opens_branch),
                    ..parent_props
                };
                if let Some(falloff) = &self.falloff {
                    falloff(&parent_props, &mut props);
                }
                self.bones[parent_id.index()].children.push(id);
                props
            }
        };

        self.bones.push(Bone {
            id,
            parent,
            children: Vec::new(),
            start,
            end,
            rotation,
            props,
            starts_branch: parent.is_some() && self.opens_branch,
        });
        self.focus = Some(id);
        self.opens_branch = false;
    }

    /// Groups the bones into branches and passes the skeleton to `on_result`.
    ///
    /// Unclosed pushes are tolerated; only over-popping is an error.
    pub fn finish<R>(self, on_result: impl FnOnce(Skeleton) -> R) -> R {
        let branches = classify_branches(&self.bones);
        debug!(
            bones = self.bones.len(),
            branches = branches.len(),
            "skeleton built"
        );
        on_result(Skeleton {
            bones: self.bones,
            branches,
        })
    }
}

fn classify_branches(bones: &[Bone]) -> Vec<FractalBranch> {
    let mut branches = Vec::new();
    if bones.is_empty() {
        return branches;
    }

    let mut starts = vec![BoneId(0)];
    while let Some(start) = starts.pop() {
        let mut nodes = vec![start];
        let mut current = start;
        let kind = loop {
            let children = &bones[current.index()].children;
            match children.as_slice() {
                [] => break BranchKind::Leaf,
                [only] if !bones[only.index()].starts_branch => {
                    current = *only;
                    nodes.push(current);
                }
                _ => {
                    starts.extend(children.iter().rev());
                    break BranchKind::BranchPoint;
                }
            }
        };
        branches.push(FractalBranch { nodes, kind });
    }
    branches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(from: f32, to: f32) -> TurtleEvent {
        TurtleEvent::Move {
            from: Vec3::new(0.0, from, 0.0),
            to: Vec3::new(0.0, to, 0.0),
            rotation: Quat::IDENTITY,
        }
    }

    fn build(events: &[TurtleEvent]) -> Skeleton {
        let mut builder = SkeletonBuilder::default();
        builder.observe_all(events).unwrap();
        builder.finish(|s| s)
    }

    #[test]
    fn empty_walk_gives_empty_skeleton() {
        let skeleton = build(&[]);
        assert!(skeleton.is_empty());
        assert!(skeleton.root().is_none());
        assert!(skeleton.branches().is_empty());
    }

    #[test]
    fn depth_grows_along_a_chain() {
        let skeleton = build(&[mv(0.0, 1.0), mv(1.0, 2.0), mv(2.0, 3.0)]);
        let depths: Vec<u32> = skeleton.bones().iter().map(|b| b.props.depth).collect();
        assert_eq!(depths, vec![0, 1, 2]);
        assert_eq!(skeleton.parent(BoneId(2)).map(|b| b.id), Some(BoneId(1)));
    }

    #[test]
    fn nested_brackets_share_a_branch_order() {
        use TurtleEvent::{Pop, Push};
        // F [ [ F ] F ]
        let skeleton = build(&[mv(0.0, 1.0), Push, Push, mv(1.0, 2.0), Pop, mv(1.0, 3.0), Pop]);
        let orders: Vec<u32> = skeleton
            .bones()
            .iter()
            .map(|b| b.props.branch_order)
            .collect();
        assert_eq!(orders, vec![0, 1, 1]);
        assert_eq!(skeleton.root().unwrap().children, vec![BoneId(1), BoneId(2)]);
    }

    #[test]
    fn falloff_applies_at_branch_openings() {
        use TurtleEvent::{Pop, Push};
        let mut builder = SkeletonBuilder::default().with_falloff(branch_falloff(0.5, 0.25));
        builder
            .observe_all(&[mv(0.0, 1.0), Push, mv(1.0, 2.0), mv(2.0, 3.0), Pop, mv(1.0, 2.0)])
            .unwrap();
        let skeleton = builder.finish(|s| s);

        let props: Vec<(f32, f32)> = skeleton
            .bones()
            .iter()
            .map(|b| (b.props.length_factor, b.props.thickness))
            .collect();
        assert_eq!(props, vec![(1.0, 1.0), (0.5, 0.25), (0.5, 0.25), (1.0, 1.0)]);
    }

    #[test]
    fn pop_without_push_is_underflow() {
        let mut builder = SkeletonBuilder::default();
        builder.observe(&mv(0.0, 1.0)).unwrap();
        assert_eq!(
            builder.observe(&TurtleEvent::Pop),
            Err(FractalError::StackUnderflow)
        );
        let skeleton = builder.finish(|s| s);
        assert_eq!(skeleton.len(), 1);
    }

    #[test]
    fn branch_before_first_move_hangs_off_an_origin_anchor() {
        use TurtleEvent::{Pop, Push};
        let skeleton = build(&[Push, mv(0.0, 1.0), Pop, mv(0.0, 2.0)]);
        assert_eq!(skeleton.len(), 3);

        let anchor = skeleton.root().unwrap();
        assert_eq!(anchor.length(), 0.0);
        assert_eq!(anchor.children, vec![BoneId(1), BoneId(2)]);
        assert!(skeleton.bones()[1].starts_branch);
        assert!(!skeleton.bones()[2].starts_branch);
        assert_eq!(skeleton.bones()[1].props.branch_order, 1);
        assert_eq!(skeleton.bones()[2].props.branch_order, 0);
    }

    #[test]
    fn lone_bracketed_child_still_splits_the_branch() {
        use TurtleEvent::{Pop, Push};
        // F [ F ]
        let skeleton = build(&[mv(0.0, 1.0), Push, mv(1.0, 2.0), Pop]);
        let kinds: Vec<_> = skeleton.branches().iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BranchKind::BranchPoint, BranchKind::Leaf]);
        assert_eq!(skeleton.branches()[1].first(), Some(BoneId(1)));
        assert_eq!(
            skeleton.branch_points().map(|b| b.id).collect::<Vec<_>>(),
            vec![BoneId(0)]
        );
    }

    #[test]
    fn empty_branch_has_no_ends() {
        let branch = FractalBranch {
            nodes: Vec::new(),
            kind: BranchKind::Leaf,
        };
        assert!(branch.is_empty());
        assert_eq!(branch.first(), None);
        assert_eq!(branch.last(), None);
    }

    #[test]
    fn segment_mass_is_cylinder_volume_times_density() {
        let skeleton = build(&[mv(0.0, 2.0)]);
        let mass = skeleton.segment_mass(BoneId(0), 1.0, 0.5).unwrap();
        let expected = std::f32::consts::PI * 0.25 * 2.0;
        assert!((mass - expected).abs() < 1e-4);
        assert!((skeleton.total_mass(1.0, 0.5) - expected).abs() < 1e-4);
    }
}
