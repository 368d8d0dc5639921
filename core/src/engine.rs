//! The render engine.
//!
//! [`Engine`] owns the host and the fiber arena. A pass starts with
//! [`Engine::render`] or with a state update, runs one fiber at a time through
//! [`Engine::work_loop`], and ends with a synchronous commit that makes the
//! work-in-progress tree current.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::{
    commit::CommitReport,
    element::{Component, Element, ElementType},
    error::{HostError, Phase, RenderError},
    fiber::{Children, Fiber, FiberId, FiberTree},
    hooks::{Hooks, RenderTrigger},
    host::Host,
    props::{Props, sync_props},
    reconcile::reconcile_children,
    scheduler::{Deadline, Unbounded},
};

/// What a call to [`Engine::work_loop`] ended with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// Nothing to do.
    Idle,
    /// The deadline ran out with units of work left.
    Yielded,
    /// A pass finished and was committed.
    Committed(CommitReport),
}

/// Incremental renderer bound to one host.
pub struct Engine<H: Host> {
    pub(crate) host: H,
    pub(crate) tree: FiberTree<H::Node>,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) next_unit: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
    pub(crate) generation: u64,
    trigger: RenderTrigger,
}

impl<H: Host> Engine<H> {
    /// Creates an idle engine rendering into `host`.
    pub fn new(host: H) -> Self {
        Self {
            host,
            tree: FiberTree::new(),
            current_root: None,
            wip_root: None,
            next_unit: None,
            deletions: Vec::new(),
            generation: 0,
            trigger: RenderTrigger::default(),
        }
    }

    /// Schedules rendering `element` as the only child of `container`.
    ///
    /// Discards any pass in flight. The work happens in later calls to
    /// [`Engine::work_loop`] or [`Engine::flush`].
    pub fn render(&mut self, element: Element, container: H::Node) {
        let props = Rc::new(Props::from_children(vec![element]));
        self.begin_pass(container, props);
    }

    /// Runs units of work until none are left or `deadline` asks to yield.
    ///
    /// At least one unit is performed per call when work is pending. When the
    /// last unit of a pass completes, the pass is committed before returning.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a component, a hook check or the
    /// host. A pass failing before its commit is discarded and the current
    /// tree is kept. A commit failing midway clears the container and
    /// schedules the current tree again from scratch, with fresh state.
    pub fn work_loop<D: Deadline + ?Sized>(
        &mut self,
        deadline: &D,
    ) -> Result<SliceOutcome, RenderError> {
        self.accept_update_request();

        let mut performed = 0_usize;
        while let Some(unit) = self.next_unit {
            if let Err(err) = self.perform_unit_of_work(unit) {
                self.abort_pass(&err);
                return Err(err);
            }
            performed += 1;
            self.accept_update_request();
            if self.next_unit.is_some() && deadline.should_yield() {
                trace!(performed, "yielding to host");
                return Ok(SliceOutcome::Yielded);
            }
        }

        if self.wip_root.is_none() {
            return Ok(SliceOutcome::Idle);
        }
        match self.commit_root() {
            Ok(report) => Ok(SliceOutcome::Committed(report)),
            Err(err) => {
                self.abort_commit(&err);
                Err(err)
            }
        }
    }

    /// Runs unbounded slices until no work is pending, including re-renders
    /// requested while rendering. Returns the report of the last commit.
    ///
    /// # Errors
    ///
    /// See [`Engine::work_loop`].
    pub fn flush(&mut self) -> Result<Option<CommitReport>, RenderError> {
        let mut last = None;
        loop {
            match self.work_loop(&Unbounded)? {
                SliceOutcome::Committed(report) => last = Some(report),
                SliceOutcome::Yielded => {}
                SliceOutcome::Idle => return Ok(last),
            }
        }
    }

    /// Whether no pass is in flight and no accepted update is waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.wip_root.is_none()
            && !(self.trigger.is_requested() && self.current_root.is_some())
    }

    /// Root of the last committed tree.
    #[must_use]
    pub const fn current_root(&self) -> Option<FiberId> {
        self.current_root
    }

    /// Root of the pass in flight.
    #[must_use]
    pub const fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// The fiber arena.
    #[must_use]
    pub const fn tree(&self) -> &FiberTree<H::Node> {
        &self.tree
    }

    /// Looks up a live fiber.
    #[must_use]
    pub fn fiber(&self, id: FiberId) -> Option<&Fiber<H::Node>> {
        self.tree.get(id)
    }

    /// Children of a fiber in order.
    pub fn children_of(&self, id: FiberId) -> Children<'_, H::Node> {
        self.tree.children(id)
    }

    /// Fibers of the current tree scheduled for removal by the pass in flight.
    #[must_use]
    pub fn pending_deletions(&self) -> &[FiberId] {
        &self.deletions
    }

    /// The host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably. Mutating nodes the engine manages desynchronizes it.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// The flag state setters raise.
    #[must_use]
    pub const fn trigger(&self) -> &RenderTrigger {
        &self.trigger
    }

    /// Consumes the engine, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }

    fn begin_pass(&mut self, container: H::Node, props: Rc<Props>) {
        if self.wip_root.is_some() {
            let dropped = self.discard_uncommitted();
            debug!(dropped, "discarding pass in flight");
        }
        self.generation += 1;
        let root = self.tree.insert(Fiber::root(
            container,
            props,
            self.current_root,
            self.generation,
        ));
        self.wip_root = Some(root);
        self.next_unit = Some(root);
        self.deletions.clear();
        self.trigger.clear();
        debug!(generation = self.generation, "render pass started");
    }

    /// Restarts from the current root when a setter asked for it. Requests
    /// raised before the first commit stay pending.
    fn accept_update_request(&mut self) {
        if !self.trigger.is_requested() {
            return;
        }
        let Some(current) = self.current_root else {
            return;
        };
        let root = &self.tree[current];
        let Some(container) = root.dom.clone() else {
            return;
        };
        let props = Rc::clone(&root.props);
        debug!("state update requested; restarting from the root");
        self.begin_pass(container, props);
    }

    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<(), RenderError> {
        trace!(
            fiber = ?id,
            ty = self.tree[id].ty().map_or("root", |ty| ty.label()),
            "unit of work"
        );
        match self.tree[id].ty.clone() {
            Some(ElementType::Component(component)) => {
                self.update_function_component(id, &component)?;
            }
            _ => self.update_host_component(id)?,
        }
        self.next_unit = self.tree.next_unit(id);
        Ok(())
    }

    fn update_function_component(
        &mut self,
        id: FiberId,
        component: &Component,
    ) -> Result<(), RenderError> {
        let fiber = &self.tree[id];
        let previous = fiber.alternate.map(|alternate| self.tree[alternate].hooks.clone());
        let props = Rc::clone(&fiber.props);

        let mut hooks = Hooks::new(component.name(), previous, self.trigger.clone());
        let child = component
            .render(&mut hooks, &props)
            .map_err(|source| RenderError::Component {
                component: component.name().to_owned(),
                source,
            })?;
        self.tree[id].hooks = hooks.finish()?;

        reconcile_children(
            &mut self.tree,
            &mut self.deletions,
            id,
            core::slice::from_ref(&child),
            self.generation,
        );
        Ok(())
    }

    fn update_host_component(&mut self, id: FiberId) -> Result<(), RenderError> {
        if self.tree[id].dom.is_none() {
            let node = self.create_dom(id)?;
            self.tree[id].dom = Some(node);
        }
        let props = Rc::clone(&self.tree[id].props);
        reconcile_children(
            &mut self.tree,
            &mut self.deletions,
            id,
            props.children(),
            self.generation,
        );
        Ok(())
    }

    /// Creates the detached host node of a fiber and applies its props.
    fn create_dom(&mut self, id: FiberId) -> Result<H::Node, RenderError> {
        let fiber = &self.tree[id];
        let Some(kind) = fiber.node_kind() else {
            return Err(RenderError::Host {
                phase: Phase::Render,
                source: HostError::Other(String::from("component fibers have no host node")),
            });
        };
        let node = self
            .host
            .create_node(kind)
            .map_err(RenderError::host(Phase::Render))?;
        if let Err(err) = sync_props(&mut self.host, &node, &Props::new(), &fiber.props) {
            self.release(&node);
            return Err(RenderError::host(Phase::Render)(err));
        }
        Ok(node)
    }

    fn abort_pass(&mut self, err: &RenderError) {
        warn!(error = %err, "render pass aborted; keeping the current tree");
        self.wip_root = None;
        self.next_unit = None;
        self.deletions.clear();
        self.discard_uncommitted();
    }

    /// Recovers from a commit that stopped halfway, after which the host
    /// matches neither tree. Every node of both trees is released, which
    /// empties the container, and the element tree of the current root is
    /// rendered again as a first mount.
    fn abort_commit(&mut self, err: &RenderError) {
        warn!(error = %err, "commit failed; remounting the current tree");
        let Some(wip) = self.wip_root else {
            return;
        };
        let container = self.tree[wip].dom.clone();
        let mut stale = self.tree.host_roots(wip);
        stale.extend(self.tree.placed_nodes(self.committed_generation()));
        let remount = self.current_root.map(|root| {
            stale.extend(self.tree.host_roots(root));
            Rc::clone(&self.tree[root].props)
        });
        for node in &stale {
            self.release(node);
        }

        let dropped = self.tree.clear();
        self.current_root = None;
        self.wip_root = None;
        self.next_unit = None;
        self.deletions.clear();
        debug!(dropped, released = stale.len(), "dropped both trees");

        if let (Some(container), Some(props)) = (container, remount) {
            self.begin_pass(container, props);
        }
    }

    /// Releases the nodes of passes that will never commit and drops their
    /// fibers. Returns how many fibers were dropped.
    fn discard_uncommitted(&mut self) -> usize {
        let keep = self.committed_generation();
        for node in self.tree.placed_nodes(keep) {
            self.release(&node);
        }
        self.tree.reclaim(keep)
    }

    fn release(&mut self, node: &H::Node) {
        if let Err(err) = self.host.release_node(node) {
            warn!(error = %err, ?node, "failed to release host node");
        }
    }

    /// Generation of the current tree, `0` before the first commit.
    fn committed_generation(&self) -> u64 {
        self.current_root
            .map_or(0, |root| self.tree[root].generation)
    }
}

impl<H: Host + Default> Default for Engine<H> {
    fn default() -> Self {
        Self::new(H::default())
    }
}

impl<H: Host> core::fmt::Debug for Engine<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("fibers", &self.tree.len())
            .field("current_root", &self.current_root)
            .field("wip_root", &self.wip_root)
            .field("next_unit", &self.next_unit)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
