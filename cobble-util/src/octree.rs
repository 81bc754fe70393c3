use glam::Vec3;
use smallvec::SmallVec;

use crate::bbox::Aabb;

/// Nodes stop subdividing once their side length reaches this value.
pub const MIN_LEAF_SIDE: u32 = 4;

/// Identifies a leaf node; stable for the lifetime of the tree (preorder
/// position). Lets callers remove an object precisely instead of walking
/// the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafId(u32);

/// The set of leaves an insertion touched. Objects straddling node
/// boundaries are stored in several leaves on purpose.
pub type LeafSet = SmallVec<[LeafId; 8]>;

/// A fixed-depth spatial subdivision over a cube centered at the origin.
/// The structure is decided entirely at construction: a node either has all
/// eight children (and never stores contents) or is a leaf with a contents
/// list. The tree stores handles only; it does not own the indexed objects.
#[derive(Debug)]
pub struct Octree<T> {
    root: Node<T>,
}

#[derive(Debug)]
struct Node<T> {
    bounds: Aabb,
    kind: NodeKind<T>,
}

#[derive(Debug)]
enum NodeKind<T> {
    Branch(Box<[Node<T>; 8]>),
    Leaf { id: LeafId, contents: Vec<T> },
}

impl<T: Copy + Eq> Octree<T> {
    /// Builds a tree spanning a cube of side `span` centered at the origin.
    /// `span` must be a power of two no smaller than `MIN_LEAF_SIDE`.
    pub fn new(span: u32) -> Self {
        assert!(span.is_power_of_two() && span >= MIN_LEAF_SIDE);
        let mut next_leaf = 0;
        Self {
            root: Node::subdivide(Vec3::ZERO, span, &mut next_leaf),
        }
    }

    pub fn bounds(&self) -> &Aabb {
        &self.root.bounds
    }

    /// Appends `handle` to every leaf whose region intersects `aabb` and
    /// returns the touched leaves. Boxes overlapping several leaves are
    /// multiply indexed.
    pub fn insert(&mut self, handle: T, aabb: &Aabb) -> LeafSet {
        let mut placed = LeafSet::new();
        self.root.insert(handle, aabb, &mut placed);
        placed
    }

    /// Removes every copy of `handle` from the whole tree. No-op where the
    /// handle is absent.
    pub fn remove(&mut self, handle: T) {
        self.root.remove(handle);
    }

    /// Removes `handle` only from the given leaves, as returned by
    /// [`Octree::insert`].
    pub fn remove_from(&mut self, handle: T, leaves: &[LeafId]) {
        self.root.remove_from(handle, leaves);
    }

    /// Collects the contents of every leaf intersecting `aabb`. Handles
    /// stored in several leaves appear once per leaf; callers needing an
    /// exact set should dedup (or use [`Octree::query_dedup`]).
    pub fn query(&self, aabb: &Aabb, out: &mut Vec<T>) {
        self.root.query(aabb, out);
    }
}

impl<T: Copy + Ord> Octree<T> {
    pub fn query_dedup(&self, aabb: &Aabb, out: &mut Vec<T>) {
        self.query(aabb, out);
        out.sort_unstable();
        out.dedup();
    }
}

impl<T: Copy + Eq> Node<T> {
    fn subdivide(origin: Vec3, side: u32, next_leaf: &mut u32) -> Self {
        let bounds = Aabb::from_center_size(origin, Vec3::splat(side as f32));
        let kind = if side > MIN_LEAF_SIDE {
            let quarter = (side >> 2) as f32;
            let half = (side >> 1) as f32;
            let children: Vec<Node<T>> = (0..8)
                .map(|octant| {
                    let sub = origin - Vec3::splat(quarter)
                        + Vec3::new(
                            half * (octant & 1) as f32,
                            half * ((octant >> 1) & 1) as f32,
                            half * ((octant >> 2) & 1) as f32,
                        );
                    Node::subdivide(sub, side >> 1, next_leaf)
                })
                .collect();
            let children: Box<[Node<T>; 8]> = children
                .into_boxed_slice()
                .try_into()
                .unwrap_or_else(|_| unreachable!("octant count is fixed at 8"));
            NodeKind::Branch(children)
        } else {
            let id = LeafId(*next_leaf);
            *next_leaf += 1;
            NodeKind::Leaf {
                id,
                contents: Vec::new(),
            }
        };
        Self { bounds, kind }
    }

    fn insert(&mut self, handle: T, aabb: &Aabb, placed: &mut LeafSet) {
        match &mut self.kind {
            NodeKind::Branch(children) => {
                for child in children.iter_mut() {
                    if child.bounds.intersects(aabb) {
                        child.insert(handle, aabb, placed);
                    }
                }
            }
            NodeKind::Leaf { id, contents } => {
                contents.push(handle);
                placed.push(*id);
            }
        }
    }

    fn remove(&mut self, handle: T) {
        match &mut self.kind {
            NodeKind::Branch(children) => {
                for child in children.iter_mut() {
                    child.remove(handle);
                }
            }
            NodeKind::Leaf { contents, .. } => contents.retain(|&h| h != handle),
        }
    }

    fn remove_from(&mut self, handle: T, leaves: &[LeafId]) {
        match &mut self.kind {
            NodeKind::Branch(children) => {
                for child in children.iter_mut() {
                    child.remove_from(handle, leaves);
                }
            }
            NodeKind::Leaf { id, contents } => {
                if leaves.contains(id) {
                    contents.retain(|&h| h != handle);
                }
            }
        }
    }

    fn query(&self, aabb: &Aabb, out: &mut Vec<T>) {
        if !self.bounds.intersects(aabb) {
            return;
        }
        match &self.kind {
            NodeKind::Branch(children) => {
                for child in children.iter() {
                    child.query(aabb, out);
                }
            }
            NodeKind::Leaf { contents, .. } => out.extend_from_slice(contents),
        }
    }
}
