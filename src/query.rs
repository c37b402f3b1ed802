//! Lazy evaluation of a [`Path`] over any [`TreeNode`] tree.
//!
//! The evaluator keeps one explicit stack of work items. An item is a node together with the
//! index of the path step it is being matched against. Items are expanded one at a time: an axis
//! turns its item into candidate items (tagged to be checked against the step's node test), and a
//! candidate that passes moves on to the next step. An item that has passed every step is a
//! result. Multi-child axes hold a live child iterator in the item and push one child per
//! expansion, so results come out in pre-order, depth-first, container order without ever
//! materializing a whole axis.
//!
//! Results are not de-duplicated: `child::*/parent::*` yields the parent once per child.

use std::cell::Cell;
use std::rc::Rc;

use tracing::*;

use crate::error::QueryError;
use crate::path::{AxisName, NameId, NodeTest, Path, Predicate};
use crate::tree::TreeNode;

/// How a work item gets expanded: the public axes, plus the two halves `following` and
/// `preceding` are built from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Mode {
    SelfAxis,
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    /// Every sibling after the node, each with its whole subtree.
    FollowingSubtrees,
    /// Every sibling before the node, each with its whole subtree.
    PrecedingSubtrees,
    Attribute,
    Namespace,
}

impl From<AxisName> for Mode {
    fn from(axis: AxisName) -> Self {
        match axis {
            AxisName::Ancestor => Mode::Ancestor,
            AxisName::AncestorOrSelf => Mode::AncestorOrSelf,
            AxisName::Attribute => Mode::Attribute,
            AxisName::Child => Mode::Child,
            AxisName::Descendant => Mode::Descendant,
            AxisName::DescendantOrSelf => Mode::DescendantOrSelf,
            AxisName::Following => Mode::Following,
            AxisName::FollowingSibling => Mode::FollowingSibling,
            AxisName::Namespace => Mode::Namespace,
            AxisName::Parent => Mode::Parent,
            AxisName::Preceding => Mode::Preceding,
            AxisName::PrecedingSibling => Mode::PrecedingSibling,
            AxisName::SelfAxis => Mode::SelfAxis,
        }
    }
}

/// A node and the route the evaluator took to reach it.
struct Link<N> {
    node: N,
    origin: Option<Origin<N>>,
}

#[derive(Clone)]
struct Origin<N> {
    parent: Rc<Link<N>>,
    /// Position among the parent's children; `None` for attributes, which have no siblings.
    index: Option<usize>,
}

/// A child iterator that is partway through.
struct Cursor<N: TreeNode> {
    children: N::Children,
    /// Position of the next child.
    index: usize,
    /// Children from this position on are not visited.
    stop: Option<usize>,
    /// Mode for the items made from the children.
    emit: Mode,
    /// The node whose children these are.
    parent: Rc<Link<N>>,
}

impl<N: TreeNode> Cursor<N> {
    fn next(&mut self) -> Option<(N, Origin<N>)> {
        if self.stop.is_some_and(|stop| self.index >= stop) {
            return None;
        }
        let child = self.children.next()?;
        let origin = Origin {
            parent: Rc::clone(&self.parent),
            index: Some(self.index),
        };
        self.index += 1;
        Some((child, origin))
    }
}

struct WorkItem<N: TreeNode> {
    node: N,
    /// Index of the path step being matched.
    step: usize,
    /// `None` when the item is a context node for `step`; otherwise the item is partway through
    /// that step's axis.
    alternate: Option<Mode>,
    cursor: Option<Cursor<N>>,
    origin: Option<Origin<N>>,
    /// The node's tag looked up in the path's name table, once computed.
    tag: Option<Option<NameId>>,
    /// Candidates of the current step that passed its node test so far, shared by every item
    /// derived from the same context node.
    tally: Option<Rc<Cell<usize>>>,
}

impl<N: TreeNode> WorkItem<N> {
    fn root(node: N) -> Self {
        WorkItem {
            node,
            step: 0,
            alternate: None,
            cursor: None,
            origin: None,
            tag: None,
            tally: None,
        }
    }

    /// A different node, within the same step.
    fn derive(&self, node: N, origin: Option<Origin<N>>, mode: Mode) -> Self {
        WorkItem {
            node,
            step: self.step,
            alternate: Some(mode),
            cursor: None,
            origin,
            tag: None,
            tally: self.tally.clone(),
        }
    }

    /// The same node, expanded differently.
    fn with_mode(&self, mode: Mode) -> Self {
        WorkItem {
            tag: self.tag,
            ..self.derive(self.node.clone(), self.origin.clone(), mode)
        }
    }

    fn link(&self) -> Rc<Link<N>> {
        Rc::new(Link {
            node: self.node.clone(),
            origin: self.origin.clone(),
        })
    }

    /// The parent along the route taken, or the one the tree reports if it knows.
    fn parent(&self) -> Option<(N, Option<Origin<N>>)> {
        match &self.origin {
            Some(origin) => Some((origin.parent.node.clone(), origin.parent.origin.clone())),
            None if N::KNOWS_PARENT => self.node.parent().map(|parent| (parent, None)),
            None => None,
        }
    }
}

/// The matches of a path, produced on demand.
///
/// An error ends the query: it is yielded once and then the iterator is exhausted.
pub struct Query<'p, N: TreeNode> {
    path: &'p Path,
    stack: Vec<WorkItem<N>>,
    steps_taken: u64,
    step_limit: Option<u64>,
}

impl<'p, N: TreeNode> Query<'p, N> {
    pub fn new(path: &'p Path, root: N) -> Self {
        debug!(%path, "starting query");
        Query {
            path,
            stack: vec![WorkItem::root(root)],
            steps_taken: 0,
            step_limit: None,
        }
    }

    /// Give up with [`QueryError::StepLimitExceeded`] after expanding `limit` work items.
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    fn advance(&mut self) -> Result<Option<N>, QueryError> {
        while let Some(mut item) = self.stack.pop() {
            self.steps_taken += 1;
            if let Some(limit) = self.step_limit {
                if self.steps_taken > limit {
                    return Err(QueryError::StepLimitExceeded(limit));
                }
            }

            let mode = match item.alternate {
                Some(mode) => mode,
                None if item.step == self.path.len() => return Ok(Some(item.node)),
                None => {
                    let axis = &self.path.steps()[item.step];
                    if axis.predicate.is_some() {
                        item.tally = Some(Rc::default());
                    }
                    item.alternate = Some(Mode::from(axis.name));
                    Mode::from(axis.name)
                }
            };

            trace!(step = item.step, ?mode, tag = item.node.tag(), "expanding");
            self.expand(item, mode)?;
        }
        Ok(None)
    }

    fn expand(&mut self, mut item: WorkItem<N>, mode: Mode) -> Result<(), QueryError> {
        match mode {
            Mode::SelfAxis => {
                if self.test(&mut item) {
                    item.step += 1;
                    item.alternate = None;
                    item.tally = None;
                    self.stack.push(item);
                }
            }
            Mode::Child | Mode::Descendant => {
                if item.cursor.is_none() {
                    let emit = if mode == Mode::Child {
                        Mode::SelfAxis
                    } else {
                        Mode::DescendantOrSelf
                    };
                    item.cursor = Some(Cursor {
                        children: item.node.children(),
                        index: 0,
                        stop: None,
                        emit,
                        parent: item.link(),
                    });
                }
                self.resume(item);
            }
            Mode::DescendantOrSelf => {
                self.stack.push(item.with_mode(Mode::Descendant));
                self.stack.push(item.with_mode(Mode::SelfAxis));
            }
            Mode::Parent => {
                if let Some((parent, origin)) = item.parent() {
                    self.stack.push(item.derive(parent, origin, Mode::SelfAxis));
                }
            }
            Mode::Ancestor => {
                if let Some((parent, origin)) = item.parent() {
                    self.stack
                        .push(item.derive(parent, origin, Mode::AncestorOrSelf));
                }
            }
            Mode::AncestorOrSelf => {
                self.stack.push(item.with_mode(Mode::Ancestor));
                self.stack.push(item.with_mode(Mode::SelfAxis));
            }
            Mode::FollowingSibling
            | Mode::PrecedingSibling
            | Mode::FollowingSubtrees
            | Mode::PrecedingSubtrees => {
                if item.cursor.is_none() {
                    // Without a position among its parent's children a node has no siblings.
                    let Some(Origin {
                        parent,
                        index: Some(index),
                    }) = item.origin.clone()
                    else {
                        return Ok(());
                    };
                    let emit = match mode {
                        Mode::FollowingSibling | Mode::PrecedingSibling => Mode::SelfAxis,
                        _ => Mode::DescendantOrSelf,
                    };
                    let mut children = parent.node.children();
                    item.cursor = Some(match mode {
                        Mode::FollowingSibling | Mode::FollowingSubtrees => {
                            children.by_ref().take(index + 1).for_each(drop);
                            Cursor {
                                children,
                                index: index + 1,
                                stop: None,
                                emit,
                                parent,
                            }
                        }
                        _ => Cursor {
                            children,
                            index: 0,
                            stop: Some(index),
                            emit,
                            parent,
                        },
                    });
                }
                self.resume(item);
            }
            Mode::Following => {
                // The siblings after this node come before those after its parent.
                if let Some((parent, origin)) = item.parent() {
                    self.stack.push(item.derive(parent, origin, Mode::Following));
                }
                self.stack.push(item.with_mode(Mode::FollowingSubtrees));
            }
            Mode::Preceding => {
                // The siblings before the parent come before those before this node.
                let parent = item.parent();
                self.stack.push(item.with_mode(Mode::PrecedingSubtrees));
                if let Some((parent, origin)) = parent {
                    self.stack.push(item.derive(parent, origin, Mode::Preceding));
                }
            }
            Mode::Attribute => {
                if !N::HAS_ATTRIBUTES {
                    return Err(QueryError::UnsupportedAxis(AxisName::Attribute));
                }
                let owner = item.link();
                let origin = || {
                    Some(Origin {
                        parent: Rc::clone(&owner),
                        index: None,
                    })
                };
                match self.path.steps()[item.step].test {
                    NodeTest::Name(id) => {
                        let attribute = self
                            .path
                            .names()
                            .resolve(id)
                            .and_then(|name| item.node.attribute(name));
                        if let Some(attribute) = attribute {
                            self.stack
                                .push(item.derive(attribute, origin(), Mode::SelfAxis));
                        }
                    }
                    NodeTest::Wildcard | NodeTest::Node => {
                        for name in item.node.attribute_names().iter().rev() {
                            if let Some(attribute) = item.node.attribute(name) {
                                self.stack
                                    .push(item.derive(attribute, origin(), Mode::SelfAxis));
                            }
                        }
                    }
                }
            }
            Mode::Namespace => return Err(QueryError::UnsupportedAxis(AxisName::Namespace)),
        }
        Ok(())
    }

    /// Emit the next child of a partially expanded item, keeping the item below it.
    fn resume(&mut self, mut item: WorkItem<N>) {
        let Some(cursor) = item.cursor.as_mut() else {
            return;
        };
        let emit = cursor.emit;
        if let Some((child, origin)) = cursor.next() {
            let candidate = item.derive(child, Some(origin), emit);
            self.stack.push(item);
            self.stack.push(candidate);
        }
    }

    /// Check a candidate against its step's node test and positional predicate.
    fn test(&self, item: &mut WorkItem<N>) -> bool {
        let axis = &self.path.steps()[item.step];
        let names = self.path.names();

        let passed = match axis.test {
            NodeTest::Wildcard | NodeTest::Node => true,
            NodeTest::Name(id) => {
                let node = &item.node;
                *item.tag.get_or_insert_with(|| names.lookup(node.tag())) == Some(id)
            }
        };
        if !passed {
            return false;
        }

        match (axis.predicate, &item.tally) {
            (Some(Predicate::Position(n)), Some(tally)) => {
                tally.set(tally.get() + 1);
                tally.get() == n
            }
            _ => true,
        }
    }
}

impl<N: TreeNode> Iterator for Query<'_, N> {
    type Item = Result<N, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => None,
            Err(e) => {
                debug!(steps_taken = self.steps_taken, "query failed: {e}");
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}

/// Evaluate `path` from `root` and collect every match.
pub fn select<N: TreeNode>(path: &Path, root: N) -> Result<Vec<N>, QueryError> {
    Query::new(path, root).collect()
}
