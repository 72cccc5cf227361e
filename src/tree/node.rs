//! Arena node/leaf representation (spec §3 `KDNode`/`KDLeaf`, §9 arena+index design).
use crate::traits::Element;
use crate::types::ChildRef;

/// A contiguous slice `[first_index, first_index + num_elements)` of the permuted data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdLeaf {
    pub first_index: u32,
    pub num_elements: u32,
}

/// An internal split node. `left`/`right` are raw [`ChildRef`] values (see
/// [`crate::types`]): every point in the left subtree satisfies `point[axis] <= split_value`,
/// every point in the right subtree satisfies `point[axis] >= split_value`.
#[derive(Debug, Clone, Copy)]
pub struct KdStem<T: Element> {
    pub split_value: T,
    pub axis: u32,
    pub left: u32,
    pub right: u32,
}

impl<T: Element> KdStem<T> {
    pub fn left_ref(&self) -> ChildRef {
        ChildRef::from_raw(self.left)
    }

    pub fn right_ref(&self) -> ChildRef {
        ChildRef::from_raw(self.right)
    }
}

/// The arena backing a built tree: flat stem/leaf storage addressed by [`ChildRef`], plus the
/// root reference. Kept separate from [`crate::kdtree::KdTree`] so the builder and the search
/// path can share it without exposing arena internals on the public facade.
#[derive(Debug, Clone)]
pub struct TreeArena<T: Element> {
    pub stems: Vec<KdStem<T>>,
    pub leaves: Vec<KdLeaf>,
    pub root: u32,
}

impl<T: Element> TreeArena<T> {
    pub fn root_ref(&self) -> ChildRef {
        ChildRef::from_raw(self.root)
    }
}
