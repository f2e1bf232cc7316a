//! Authoring API for group trees.
//!
//! A [`GroupBuilder`] keeps a stack of open groups. Opening a group returns a
//! [`GroupScope`] guard that derefs to the builder; everything registered
//! through it lands on the innermost open group, and dropping (or
//! [`close`](GroupScope::close)-ing) the guard pops that group again.
//!
//! ```
//! use grovetest::prelude::*;
//!
//! let group = Group::build("Main Group", |g| {
//!     g.setup(|ctx| {
//!         ctx.set("thing", 1_i32);
//!     })?;
//!     g.test_case("thing is 1", |case| {
//!         let thing = *case.require::<i32>("thing")?;
//!         case.assert_eq(thing, 1)?;
//!         Ok::<_, BoxError>(())
//!     })?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(group.root().test_count(), 1);
//! ```

use std::{
    borrow::Cow,
    collections::HashSet,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use tracing::debug;

use crate::{
    context::Context,
    error::BuildError,
    group::{Child, Group, GroupTree, Node, NodeId},
    params::{ParamSets, Params},
    test::{AssertRegistry, Case, Fixture, TestBody, TestCase, TestResult},
};

/// Options for opening a group.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    /// Explicit cascading-failure setting; `None` inherits from the parent.
    pub cascading: Option<bool>,

    /// Replicate the group once per set.
    pub params: Option<ParamSets>,
}

impl GroupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cascading(self, cascading: bool) -> Self {
        Self {
            cascading: Some(cascading),
            ..self
        }
    }

    pub fn params(self, params: ParamSets) -> Self {
        Self {
            params: Some(params),
            ..self
        }
    }
}

#[derive(Debug)]
struct Frame {
    id: NodeId,
    params: Option<ParamSets>,
}

#[derive(Debug, Default)]
pub struct GroupBuilder {
    nodes: Vec<Node>,
    stack: Vec<Frame>,
    root: Option<NodeId>,
    asserts: AssertRegistry,
    error: Option<BuildError>,

    /// Parameterized groups whose clones took their place.
    replaced: HashSet<NodeId>,
}

impl GroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a described group below the active one, or the root group.
    pub fn open_group(
        &mut self,
        description: impl Into<String>,
        options: GroupOptions,
    ) -> Result<GroupScope<'_>, BuildError> {
        let id = self.open(Some(description.into()), options)?;
        Ok(GroupScope {
            builder: self,
            id,
            open: true,
        })
    }

    /// Open a group without a description.
    ///
    /// Anonymous groups print no header and add no indentation, but their
    /// fixtures run like any other group's.
    pub fn open_anonymous(&mut self, options: GroupOptions) -> Result<GroupScope<'_>, BuildError> {
        let id = self.open(None, options)?;
        Ok(GroupScope {
            builder: self,
            id,
            open: true,
        })
    }

    /// Open a group, run `f` inside it and close it again.
    pub fn group<F>(&mut self, description: impl Into<String>, f: F) -> Result<(), BuildError>
    where
        F: FnOnce(&mut GroupBuilder) -> Result<(), BuildError>,
    {
        self.group_with(description, GroupOptions::default(), f)
    }

    pub fn group_with<F>(
        &mut self,
        description: impl Into<String>,
        options: GroupOptions,
        f: F,
    ) -> Result<(), BuildError>
    where
        F: FnOnce(&mut GroupBuilder) -> Result<(), BuildError>,
    {
        let mut scope = self.open_group(description, options)?;
        let result = f(&mut *scope);
        let closed = scope.close();
        result.and(closed)
    }

    pub fn anonymous<F>(&mut self, options: GroupOptions, f: F) -> Result<(), BuildError>
    where
        F: FnOnce(&mut GroupBuilder) -> Result<(), BuildError>,
    {
        let mut scope = self.open_anonymous(options)?;
        let result = f(&mut *scope);
        let closed = scope.close();
        result.and(closed)
    }

    /// The innermost open group.
    pub fn active(&self) -> Option<NodeId> {
        self.stack.last().map(|frame| frame.id)
    }

    fn open(&mut self, description: Option<String>, options: GroupOptions) -> Result<NodeId, BuildError> {
        if let Some(params) = &options.params {
            params.validate()?;
        }

        let id = NodeId(self.nodes.len());
        match self.stack.last() {
            Some(parent) => {
                let parent = parent.id;
                self.nodes.push(Node::new(description, options.cascading));
                self.nodes[parent.0].children.push(Child::Local(id));
            }
            None if self.root.is_some() => {
                return Err(BuildError::configuration(
                    "this builder already holds a root group",
                ));
            }
            None if options.params.is_some() => {
                return Err(BuildError::configuration(
                    "the root group cannot be parameterized",
                ));
            }
            None => {
                self.nodes.push(Node::new(description, options.cascading));
                self.root = Some(id);
            }
        }

        self.stack.push(Frame {
            id,
            params: options.params,
        });
        Ok(id)
    }

    fn close(&mut self, id: NodeId) -> Result<(), BuildError> {
        if self.active() != Some(id) {
            return Err(BuildError::UnbalancedScope);
        }
        let Some(frame) = self.stack.pop() else {
            return Err(BuildError::UnbalancedScope);
        };

        match frame.params {
            Some(params) => self.expand(frame.id, &params),
            None => Ok(()),
        }
    }

    /// Replace the freshly closed group with one clone per parameter set.
    fn expand(&mut self, id: NodeId, sets: &ParamSets) -> Result<(), BuildError> {
        let Some(parent) = self.active() else {
            return Err(BuildError::configuration(
                "the root group cannot be parameterized",
            ));
        };

        let Some(position) = self.nodes[parent.0]
            .children
            .iter()
            .position(|child| matches!(child, Child::Local(c) if *c == id))
        else {
            return Err(BuildError::UnbalancedScope);
        };

        let description = self.nodes[id.0].description.clone();
        let mut clones = Vec::with_capacity(sets.len());
        for (suffix, params) in sets.expand() {
            let clone = self.clone_subtree(id, &mut HashSet::new())?;
            let node = &mut self.nodes[clone.0];
            node.params = params.clone();
            node.description = Some(match &description {
                Some(description) => format!("{description} {suffix}"),
                None => suffix,
            });
            clones.push(Child::Local(clone));
        }

        debug!(
            group = description.as_deref().unwrap_or_default(),
            clones = clones.len(),
            "expanded parameterized group"
        );
        self.nodes[parent.0].children.splice(position..=position, clones);
        self.replaced.insert(id);
        Ok(())
    }

    /// Copy the topology below `id` into fresh arena slots.
    ///
    /// Fixture and test callables stay shared, shared edges into other
    /// trees are kept as they are.
    fn clone_subtree(&mut self, id: NodeId, path: &mut HashSet<NodeId>) -> Result<NodeId, BuildError> {
        if !path.insert(id) {
            return Err(BuildError::CyclicStructure {
                description: self.nodes[id.0].description.clone().unwrap_or_default(),
            });
        }

        let mut node = self.nodes[id.0].clone();
        let mut children = Vec::with_capacity(node.children.len());
        for child in node.children {
            children.push(match child {
                Child::Local(child) => Child::Local(self.clone_subtree(child, path)?),
                shared @ Child::Shared { .. } => shared,
            });
        }
        node.children = children;

        path.remove(&id);
        let clone = NodeId(self.nodes.len());
        self.nodes.push(node);
        Ok(clone)
    }

    /// Description of the first node found on a cycle of local edges.
    ///
    /// Shared edges lead into finished trees, which cannot point back here.
    fn find_cycle(&self, id: NodeId, path: &mut Vec<NodeId>) -> Option<String> {
        if path.contains(&id) {
            return Some(self.nodes[id.0].description.clone().unwrap_or_default());
        }
        path.push(id);
        let cycle = self.nodes[id.0].children.iter().find_map(|child| match child {
            Child::Local(child) => self.find_cycle(*child, path),
            Child::Shared { .. } => None,
        });
        path.pop();
        cycle
    }

    fn active_node(&mut self, what: &'static str) -> Result<&mut Node, BuildError> {
        let Some(frame) = self.stack.last() else {
            return Err(BuildError::NoActiveGroup { what });
        };
        Ok(&mut self.nodes[frame.id.0])
    }

    pub fn add_setup(&mut self, fixture: Fixture) -> Result<(), BuildError> {
        self.active_node("a setup")?.setups.push(Arc::new(fixture));
        Ok(())
    }

    pub fn add_teardown(&mut self, fixture: Fixture) -> Result<(), BuildError> {
        self.active_node("a teardown")?
            .teardowns
            .push(Arc::new(fixture));
        Ok(())
    }

    pub fn add_test_setup(&mut self, fixture: Fixture) -> Result<(), BuildError> {
        self.active_node("a test setup")?
            .test_setups
            .push(Arc::new(fixture));
        Ok(())
    }

    pub fn add_test_teardown(&mut self, fixture: Fixture) -> Result<(), BuildError> {
        self.active_node("a test teardown")?
            .test_teardowns
            .push(Arc::new(fixture));
        Ok(())
    }

    pub fn add_test(&mut self, test: TestCase) -> Result<(), BuildError> {
        self.active_node("a test")?.tests.push(Arc::new(test));
        Ok(())
    }

    /// Run `f` once when entering the active group.
    pub fn setup<F, T>(&mut self, f: F) -> Result<(), BuildError>
    where
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_setup(Fixture::new(f))
    }

    /// Like [`setup`](Self::setup), but `f` also receives the group's parameter set.
    pub fn param_setup<F, T>(&mut self, f: F) -> Result<(), BuildError>
    where
        F: Fn(&mut Context, &Params) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_setup(Fixture::with_params(f))
    }

    /// Run `f` once when leaving the active group.
    pub fn teardown<F, T>(&mut self, f: F) -> Result<(), BuildError>
    where
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_teardown(Fixture::new(f))
    }

    /// Run `f` before every test declared directly on the active group.
    pub fn test_setup<F, T>(&mut self, f: F) -> Result<(), BuildError>
    where
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_test_setup(Fixture::new(f))
    }

    /// Run `f` after every test declared directly on the active group.
    pub fn test_teardown<F, T>(&mut self, f: F) -> Result<(), BuildError>
    where
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_test_teardown(Fixture::new(f))
    }

    pub fn setup_described<F, T>(&mut self, description: impl Into<Cow<'static, str>>, f: F) -> Result<(), BuildError>
    where
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_setup(Fixture::new(f).described(description))
    }

    pub fn teardown_described<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<(), BuildError>
    where
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_teardown(Fixture::new(f).described(description))
    }

    pub fn test_setup_described<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<(), BuildError>
    where
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_test_setup(Fixture::new(f).described(description))
    }

    pub fn test_teardown_described<F, T>(
        &mut self,
        description: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<(), BuildError>
    where
        F: Fn(&mut Context) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_test_teardown(Fixture::new(f).described(description))
    }

    /// Register a test that does not need the group context.
    pub fn test<F, T>(&mut self, description: impl Into<String>, f: F) -> Result<(), BuildError>
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_test(TestCase::new(description.into(), TestBody::plain(f)))
    }

    /// Register a test that receives the [`Case`] of the running unit.
    pub fn test_case<F, T>(&mut self, description: impl Into<String>, f: F) -> Result<(), BuildError>
    where
        F: Fn(&mut Case<'_>) -> T + Send + Sync + 'static,
        T: Into<TestResult>,
    {
        self.add_test(TestCase::new(description.into(), TestBody::with_case(f)))
    }

    /// Attach the root of `group` as a child of the active group, by reference.
    pub fn include(&mut self, group: &Group) -> Result<(), BuildError> {
        self.active_node("an include")?.children.push(Child::Shared {
            tree: group.clone(),
            id: group.0.root,
        });
        self.asserts.merge(group.asserts());
        Ok(())
    }

    pub fn include_all<'g>(&mut self, groups: impl IntoIterator<Item = &'g Group>) -> Result<(), BuildError> {
        groups.into_iter().try_for_each(|group| self.include(group))
    }

    /// Attach a node of the tree under construction a second time.
    ///
    /// The node is shared, not copied. Attaching a group below itself
    /// creates a cycle, which [`finish`](Self::finish) rejects.
    pub fn include_node(&mut self, id: NodeId) -> Result<(), BuildError> {
        if id.0 >= self.nodes.len() {
            return Err(BuildError::configuration(format!(
                "node #{} does not belong to this builder",
                id.0
            )));
        }
        if self.replaced.contains(&id) {
            return Err(BuildError::configuration(format!(
                "node #{} was replaced by its parameterized clones",
                id.0
            )));
        }
        self.active_node("an include")?
            .children
            .push(Child::Local(id));
        Ok(())
    }

    /// Splice the content of `group`'s root into the active group.
    pub fn combine(&mut self, group: &Group) -> Result<(), BuildError> {
        let root = group.root();
        let node = self.active_node("a combine")?;
        node.setups.extend(root.setups().iter().cloned());
        node.test_setups.extend(root.test_setups().iter().cloned());
        node.tests.extend(root.tests().iter().cloned());
        node.test_teardowns
            .extend(root.test_teardowns().iter().cloned());
        node.teardowns.extend(root.teardowns().iter().cloned());
        node.children
            .extend(group.0.nodes[group.0.root.0].children.iter().map(|child| match child {
                Child::Local(id) => Child::Shared {
                    tree: group.clone(),
                    id: *id,
                },
                shared @ Child::Shared { .. } => shared.clone(),
            }));
        self.asserts.merge(group.asserts());
        Ok(())
    }

    pub fn combine_all<'g>(&mut self, groups: impl IntoIterator<Item = &'g Group>) -> Result<(), BuildError> {
        groups.into_iter().try_for_each(|group| self.combine(group))
    }

    /// Make an assertion extension available to every test of this tree.
    pub fn utilize_asserts<T: std::any::Any + Send + Sync>(&mut self, asserts: T) {
        self.asserts.insert(asserts);
    }

    /// Freeze the tree.
    pub fn finish(self) -> Result<Group, BuildError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.stack.is_empty() {
            return Err(BuildError::UnbalancedScope);
        }
        let Some(root) = self.root else {
            return Err(BuildError::configuration("no root group was opened"));
        };
        if let Some(description) = self.find_cycle(root, &mut Vec::new()) {
            return Err(BuildError::CyclicStructure { description });
        }

        Ok(Group(Arc::new(GroupTree {
            nodes: self.nodes,
            root,
            asserts: self.asserts,
        })))
    }
}

/// Guard for an open group; closes the group when dropped.
pub struct GroupScope<'b> {
    builder: &'b mut GroupBuilder,
    id: NodeId,
    open: bool,
}

impl GroupScope<'_> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Close the group, reporting authoring errors instead of deferring them
    /// to [`GroupBuilder::finish`].
    pub fn close(mut self) -> Result<(), BuildError> {
        self.open = false;
        self.builder.close(self.id)
    }
}

impl Deref for GroupScope<'_> {
    type Target = GroupBuilder;

    fn deref(&self) -> &Self::Target {
        self.builder
    }
}

impl DerefMut for GroupScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.builder
    }
}

impl Drop for GroupScope<'_> {
    fn drop(&mut self) {
        if self.open
            && let Err(err) = self.builder.close(self.id)
        {
            self.builder.error.get_or_insert(err);
        }
    }
}
