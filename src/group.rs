//! The group tree.
//!
//! A tree is stored as an arena of [`Node`]s addressed by [`NodeId`]. Once
//! built it is frozen into a [`Group`], a cheap to clone shared handle.
//! Fixtures and tests are held behind [`Arc`]s, so clones made for
//! parameterization, combines and includes all point at the same callables.
//!
//! A child edge either points at a node of the same arena or at a node of
//! another finished tree. The latter is how `include` shares a subtree by
//! reference: the included tree is never copied, and including it twice
//! yields two edges to the very same node.

use std::sync::Arc;

use crate::{
    builder::{GroupBuilder, GroupOptions},
    error::BuildError,
    params::Params,
    test::{AssertRegistry, Fixture, TestCase},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An edge from a node to one of its children.
#[derive(Debug, Clone)]
pub enum Child {
    /// A node in the same arena.
    Local(NodeId),

    /// A node owned by another finished tree.
    Shared { tree: Group, id: NodeId },
}

#[derive(Debug, Default, Clone)]
pub struct Node {
    pub(crate) description: Option<String>,
    pub(crate) cascading: Option<bool>,
    pub(crate) params: Params,
    pub(crate) setups: Vec<Arc<Fixture>>,
    pub(crate) teardowns: Vec<Arc<Fixture>>,
    pub(crate) test_setups: Vec<Arc<Fixture>>,
    pub(crate) test_teardowns: Vec<Arc<Fixture>>,
    pub(crate) tests: Vec<Arc<TestCase>>,
    pub(crate) children: Vec<Child>,
}

impl Node {
    pub(crate) fn new(description: Option<String>, cascading: Option<bool>) -> Self {
        Self {
            description,
            cascading,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
pub(crate) struct GroupTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) asserts: AssertRegistry,
}

/// A finished, immutable group tree.
#[derive(Debug, Clone)]
pub struct Group(pub(crate) Arc<GroupTree>);

impl Group {
    /// Build a tree whose root group is `description`.
    pub fn build<F>(description: impl Into<String>, f: F) -> Result<Self, BuildError>
    where
        F: FnOnce(&mut GroupBuilder) -> Result<(), BuildError>,
    {
        Self::build_with(description, GroupOptions::default(), f)
    }

    pub fn build_with<F>(
        description: impl Into<String>,
        options: GroupOptions,
        f: F,
    ) -> Result<Self, BuildError>
    where
        F: FnOnce(&mut GroupBuilder) -> Result<(), BuildError>,
    {
        let mut builder = GroupBuilder::new();
        builder.group_with(description, options, f)?;
        builder.finish()
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: self.0.root,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        (id.0 < self.0.nodes.len()).then_some(NodeRef { tree: self, id })
    }

    /// Whether both handles refer to the same tree.
    pub fn ptr_eq(&self, other: &Group) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn asserts(&self) -> &AssertRegistry {
        &self.0.asserts
    }

    pub(crate) fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

/// A borrowed view of one node, resolving shared children transparently.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'g> {
    tree: &'g Group,
    id: NodeId,
}

impl<'g> NodeRef<'g> {
    pub(crate) fn new(tree: &'g Group, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'g Group {
        self.tree
    }

    fn node(&self) -> &'g Node {
        &self.tree.0.nodes[self.id.0]
    }

    pub fn description(&self) -> Option<&'g str> {
        self.node().description.as_deref()
    }

    /// The explicit cascading-failure override, `None` when inherited.
    pub fn cascading(&self) -> Option<bool> {
        self.node().cascading
    }

    pub fn params(&self) -> &'g Params {
        &self.node().params
    }

    pub fn setups(&self) -> &'g [Arc<Fixture>] {
        &self.node().setups
    }

    pub fn teardowns(&self) -> &'g [Arc<Fixture>] {
        &self.node().teardowns
    }

    pub fn test_setups(&self) -> &'g [Arc<Fixture>] {
        &self.node().test_setups
    }

    pub fn test_teardowns(&self) -> &'g [Arc<Fixture>] {
        &self.node().test_teardowns
    }

    pub fn tests(&self) -> &'g [Arc<TestCase>] {
        &self.node().tests
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = NodeRef<'g>> + use<'g> {
        let tree = self.tree;
        self.node().children.iter().map(move |child| match child {
            Child::Local(id) => NodeRef { tree, id: *id },
            Child::Shared { tree, id } => NodeRef { tree, id: *id },
        })
    }

    /// Number of tests in this node and all of its descendants, counting
    /// shared subtrees once per attachment.
    pub fn test_count(&self) -> usize {
        self.tests().len() + self.children().map(|c| c.test_count()).sum::<usize>()
    }

    /// Identity of this node across trees.
    pub(crate) fn key(&self) -> (usize, NodeId) {
        (self.tree.address(), self.id)
    }

    pub fn ptr_eq(&self, other: &NodeRef<'_>) -> bool {
        self.key() == other.key()
    }
}
