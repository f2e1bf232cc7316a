//! Compiling group trees into a run plan.
//!
//! The compiler walks every root depth-first, own tests before children,
//! children in declaration order, and produces a [`Plan`]:
//!
//! - one [`Scope`] per place a node is attached. A node included twice gets
//!   two scopes and is set up and torn down twice.
//! - one [`Unit`] per test, in execution order.
//! - the [`PlanEvent`] stream the executor consumes. It is derived by diffing
//!   the scope chains of consecutive units, so it always nests properly.
//!
//! Nodes without tests in their subtree (after filtering) get no scope at
//! all, which means their fixtures never run and they print nothing.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::{
    error::BuildError,
    filter::TestFilter,
    group::{Group, NodeId, NodeRef},
    params::Params,
    test::{AssertRegistry, TestCase},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One attachment point of a node.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    tree: Group,
    node: NodeId,

    /// Descriptions of the described scopes from the root down to this one,
    /// joined with `::`.
    pub name: String,

    /// Number of ancestor scopes.
    pub depth: usize,

    /// Number of described scopes from the root down to this one, inclusive.
    /// This is the indentation level of the scope's tests.
    pub level: usize,

    /// Resolved cascading-failure setting.
    pub cascading: bool,
}

impl Scope {
    pub fn node(&self) -> NodeRef<'_> {
        NodeRef::new(&self.tree, self.node)
    }

    pub fn description(&self) -> Option<&str> {
        self.node().description()
    }

    pub fn params(&self) -> &Params {
        self.node().params()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn asserts(&self) -> &AssertRegistry {
        self.tree.asserts()
    }
}

/// A single test at a single attachment point.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Unit {
    pub id: UnitId,

    /// The scope that declares the test.
    pub scope: ScopeId,

    /// Scopes from the root down to [`scope`](Self::scope).
    pub chain: Vec<ScopeId>,

    /// The scopes of `chain` whose setup failures cascade.
    pub cascading_ancestors: Vec<ScopeId>,

    pub test: Arc<TestCase>,

    /// `::`-joined path used for filtering and failure listings.
    pub name: String,
}

impl Unit {
    pub fn description(&self) -> &str {
        &self.test.description
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanEvent {
    Enter(ScopeId),
    Unit(UnitId),
    Exit(ScopeId),
}

/// Scopes to leave and to enter when moving from one unit to the next.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transitions {
    /// Innermost first.
    pub exited: Vec<ScopeId>,

    /// Outermost first.
    pub entered: Vec<ScopeId>,
}

/// Diff two scope chains.
///
/// Everything below the common prefix of `prev` is exited leaf to root,
/// everything below it in `next` is entered root to leaf.
pub fn chain_transitions(prev: &[ScopeId], next: &[ScopeId]) -> Transitions {
    let common = prev
        .iter()
        .zip(next)
        .take_while(|(a, b)| a == b)
        .count();
    Transitions {
        exited: prev[common..].iter().rev().copied().collect(),
        entered: next[common..].to_vec(),
    }
}

/// A compiled run.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    scopes: Vec<Scope>,
    units: Vec<Unit>,
    events: Vec<PlanEvent>,
    filtered_out: usize,
}

impl Plan {
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.0]
    }

    pub fn events(&self) -> &[PlanEvent] {
        &self.events
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of tests the filter removed.
    pub fn filtered_out(&self) -> usize {
        self.filtered_out
    }

    /// Ancestors of `id` from the root down, including `id` itself.
    pub fn ancestry(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![id];
        let mut current = self.scope(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.scope(parent).parent;
        }
        chain.reverse();
        chain
    }
}

/// Compile `roots` into a single plan, keeping the units `filter` accepts.
pub fn compile<F>(roots: &[Group], filter: &F) -> Result<Plan, BuildError>
where
    F: TestFilter + ?Sized,
{
    let mut compiler = Compiler {
        filter,
        plan: Plan::default(),
    };

    for root in roots {
        compiler.visit(root.root(), None)?;
    }

    let mut plan = compiler.plan;
    plan.events = events(&plan.units);
    debug!(
        scopes = plan.scopes.len(),
        units = plan.units.len(),
        filtered_out = plan.filtered_out,
        "compiled plan"
    );
    Ok(plan)
}

struct Compiler<'f, F: ?Sized> {
    filter: &'f F,
    plan: Plan,
}

impl<F: TestFilter + ?Sized> Compiler<'_, F> {
    fn visit(&mut self, node: NodeRef<'_>, parent: Option<ScopeId>) -> Result<(), BuildError> {
        let id = ScopeId(self.plan.scopes.len());
        let (depth, level, cascading, prefix) = match parent.map(|p| self.plan.scope(p)) {
            Some(parent) => (
                parent.depth + 1,
                parent.level,
                parent.cascading,
                parent.name.as_str(),
            ),
            None => (0, 0, true, ""),
        };
        let name = match node.description() {
            Some(description) => join(prefix, description),
            None => prefix.to_string(),
        };
        let scope = Scope {
            id,
            parent,
            tree: node.tree().clone(),
            node: node.id(),
            name,
            depth,
            level: level + usize::from(node.description().is_some()),
            cascading: node.cascading().unwrap_or(cascading),
        };
        self.plan.scopes.push(scope);

        let units_before = self.plan.units.len();
        let chain = self.plan.ancestry(id);
        let cascading_ancestors: Vec<_> = chain
            .iter()
            .copied()
            .filter(|s| self.plan.scope(*s).cascading)
            .collect();

        for test in node.tests() {
            let name = join(&self.plan.scope(id).name, &test.description);
            if !self.filter.keep(&name) {
                trace!(%name, "filtered out");
                self.plan.filtered_out += 1;
                continue;
            }

            self.plan.units.push(Unit {
                id: UnitId(self.plan.units.len()),
                scope: id,
                chain: chain.clone(),
                cascading_ancestors: cascading_ancestors.clone(),
                test: Arc::clone(test),
                name,
            });
        }

        for child in node.children() {
            self.visit(child, Some(id))?;
        }

        // every scope from `id` on belongs to this subtree
        if self.plan.units.len() == units_before {
            self.plan.scopes.truncate(id.0);
        }

        Ok(())
    }
}

fn join(prefix: &str, name: &str) -> String {
    match prefix.is_empty() {
        true => name.to_string(),
        false => format!("{prefix}::{name}"),
    }
}

fn events(units: &[Unit]) -> Vec<PlanEvent> {
    let mut events = Vec::new();
    let mut prev: &[ScopeId] = &[];
    for unit in units {
        let Transitions { exited, entered } = chain_transitions(prev, &unit.chain);
        events.extend(exited.into_iter().map(PlanEvent::Exit));
        events.extend(entered.into_iter().map(PlanEvent::Enter));
        events.push(PlanEvent::Unit(unit.id));
        prev = &unit.chain;
    }
    events.extend(prev.iter().rev().copied().map(PlanEvent::Exit));
    events
}
