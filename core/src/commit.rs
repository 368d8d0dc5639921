//! The commit phase: applying a finished pass to the host in one go.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::{
    engine::Engine,
    error::{HostError, Phase, RenderError},
    fiber::{EffectTag, FiberId},
    host::Host,
    props::{Props, sync_props},
};

/// Summary of one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Generation of the committed tree.
    pub generation: u64,
    /// Host nodes inserted.
    pub placements: usize,
    /// Host nodes whose props were synced.
    pub updates: usize,
    /// Synced host nodes that actually changed.
    pub changed_updates: usize,
    /// Subtrees removed.
    pub deletions: usize,
    /// Host nodes detached and released by those removals.
    pub removed_nodes: usize,
    /// Fibers of older generations dropped from the arena.
    pub reclaimed: usize,
}

impl CommitReport {
    /// Whether the commit changed anything on the host.
    #[must_use]
    pub const fn mutated_host(&self) -> bool {
        self.placements > 0 || self.changed_updates > 0 || self.removed_nodes > 0
    }
}

impl<H: Host> Engine<H> {
    /// Applies deletions, then placements and updates in pre-order, then makes
    /// the work-in-progress root current.
    pub(crate) fn commit_root(&mut self) -> Result<CommitReport, RenderError> {
        let mut report = CommitReport {
            generation: self.generation,
            ..CommitReport::default()
        };
        let Some(root) = self.wip_root else {
            return Ok(report);
        };

        for fiber in core::mem::take(&mut self.deletions) {
            self.commit_deletion(fiber, &mut report)?;
            report.deletions += 1;
        }

        let mut cursor = self.tree[root].child;
        while let Some(id) = cursor {
            self.commit_work(id, &mut report)?;
            cursor = self.tree.next_unit(id);
        }

        self.current_root = Some(root);
        self.wip_root = None;
        self.next_unit = None;
        report.reclaimed = self.tree.reclaim(self.generation);
        debug!(
            generation = report.generation,
            placements = report.placements,
            updates = report.updates,
            deletions = report.deletions,
            reclaimed = report.reclaimed,
            "committed"
        );
        Ok(report)
    }

    fn commit_deletion(
        &mut self,
        fiber: FiberId,
        report: &mut CommitReport,
    ) -> Result<(), RenderError> {
        let parent = self.host_parent(fiber)?;
        let mut stack = vec![fiber];
        while let Some(id) = stack.pop() {
            if let Some(dom) = self.tree[id].dom.clone() {
                self.host
                    .remove_child(&parent, &dom)
                    .map_err(RenderError::host(Phase::Commit))?;
                self.host
                    .release_node(&dom)
                    .map_err(RenderError::host(Phase::Commit))?;
                report.removed_nodes += 1;
                continue;
            }
            let before = stack.len();
            stack.extend(self.tree.children(id));
            if stack.len() == before {
                trace!(fiber = ?id, "deleted fiber owns no host nodes");
            }
            stack[before..].reverse();
        }
        Ok(())
    }

    fn commit_work(&mut self, id: FiberId, report: &mut CommitReport) -> Result<(), RenderError> {
        let fiber = &self.tree[id];
        let Some(dom) = fiber.dom.clone() else {
            return Ok(());
        };
        match fiber.effect {
            Some(EffectTag::Placement) => {
                let parent = self.host_parent(id)?;
                match self.host_sibling(id) {
                    Some(before) => self.host.insert_before(&parent, &dom, &before),
                    None => self.host.append_child(&parent, &dom),
                }
                .map_err(RenderError::host(Phase::Commit))?;
                report.placements += 1;
            }
            Some(EffectTag::Update) => {
                let previous = fiber
                    .alternate
                    .map_or_else(|| Rc::new(Props::new()), |alternate| {
                        Rc::clone(&self.tree[alternate].props)
                    });
                let next = Rc::clone(&fiber.props);
                let changed = sync_props(&mut self.host, &dom, &previous, &next)
                    .map_err(RenderError::host(Phase::Commit))?;
                report.updates += 1;
                if changed > 0 {
                    report.changed_updates += 1;
                }
            }
            Some(EffectTag::Deletion) | None => {}
        }
        Ok(())
    }

    fn host_parent(&self, id: FiberId) -> Result<H::Node, RenderError> {
        self.tree
            .host_ancestor(id)
            .and_then(|ancestor| self.tree[ancestor].dom.clone())
            .ok_or(RenderError::Host {
                phase: Phase::Commit,
                source: HostError::Detached,
            })
    }

    /// The host node a placed fiber must be inserted before: the first host
    /// node after `id` in the same host parent that is already attached.
    fn host_sibling(&self, id: FiberId) -> Option<H::Node> {
        let mut fiber = id;
        'siblings: loop {
            loop {
                if let Some(sibling) = self.tree[fiber].sibling {
                    fiber = sibling;
                    break;
                }
                let parent = self.tree[fiber].parent?;
                if self.tree[parent].dom.is_some() {
                    return None;
                }
                fiber = parent;
            }
            loop {
                let candidate = &self.tree[fiber];
                if candidate.effect == Some(EffectTag::Placement) {
                    continue 'siblings;
                }
                if let Some(dom) = &candidate.dom {
                    return Some(dom.clone());
                }
                match candidate.child {
                    Some(child) => fiber = child,
                    None => continue 'siblings,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Component, Props, children, component, element,
        memory::{MemoryHost, Mutation},
        text,
    };

    #[test]
    fn nothing_changed_reports_no_mutation() {
        assert!(!CommitReport::default().mutated_host());
        assert!(
            CommitReport {
                removed_nodes: 1,
                ..CommitReport::default()
            }
            .mutated_host()
        );
    }

    #[test]
    fn removal_of_nested_components_detaches_each_host_root() {
        let pair = Component::new("Pair", |_, _| {
            Ok(element("span", Props::new(), children!["left"]))
        });
        let outer = {
            let pair = pair.clone();
            Component::new("Outer", move |_, _| Ok(component(&pair, Props::new())))
        };
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut engine = Engine::new(host);
        engine.render(
            element(
                "div",
                Props::new(),
                children![component(&outer, Props::new()), text("right")],
            ),
            container,
        );
        engine.flush().unwrap();
        let div = engine.host().children(container)[0];
        let span = engine.host().children(div)[0];
        engine.host_mut().take_journal();

        engine.render(element("div", Props::new(), children![text("right")]), container);
        let report = engine.flush().unwrap().unwrap();

        assert_eq!(report.deletions, 2);
        assert!(
            engine
                .host()
                .journal()
                .contains(&Mutation::Remove { parent: div, child: span })
        );
        assert_eq!(engine.host().markup(container), "<root><div>right</div></root>");
    }

    #[test]
    fn placement_skips_siblings_that_are_also_new() {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut engine = Engine::new(host);
        let row = |tag: &str| element(tag, Props::new(), children![]);
        engine.render(element("ol", Props::new(), children![row("x"), row("y"), row("z")]), container);
        engine.flush().unwrap();

        engine.render(
            element("ol", Props::new(), children![row("b"), row("c"), row("z")]),
            container,
        );
        let report = engine.flush().unwrap().unwrap();

        // `ol` and `z` are synced in place
        assert_eq!(report.placements, 2);
        assert_eq!(report.updates, 2);
        assert_eq!(
            engine.host().markup(container),
            "<root><ol><b></b><c></c><z></z></ol></root>"
        );
    }
}
