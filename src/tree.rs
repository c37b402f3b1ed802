//! What the evaluator needs from a tree.

/// A cheaply cloneable handle to a node in some tree.
///
/// Only [`tag`](TreeNode::tag) and [`children`](TreeNode::children) are required. A tree whose
/// nodes can find their own parent sets [`KNOWS_PARENT`](TreeNode::KNOWS_PARENT); otherwise the
/// evaluator remembers how it reached each node and only walks upwards along that route. A tree
/// without [`HAS_ATTRIBUTES`](TreeNode::HAS_ATTRIBUTES) makes the attribute axis an error.
pub trait TreeNode: Clone {
    /// Children in container order. Leaves return an iterator that is empty from the start.
    type Children: Iterator<Item = Self>;

    const KNOWS_PARENT: bool = false;
    const HAS_ATTRIBUTES: bool = false;

    /// The name node tests compare against.
    fn tag(&self) -> &str;

    fn children(&self) -> Self::Children;

    fn parent(&self) -> Option<Self> {
        None
    }

    /// The attribute node called `name`, if this node has one.
    fn attribute(&self, _name: &str) -> Option<Self> {
        None
    }

    /// Every attribute this node has, in the order `attribute::*` visits them.
    fn attribute_names(&self) -> &'static [&'static str] {
        &[]
    }
}
