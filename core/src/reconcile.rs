//! Positional child reconciliation.

use tracing::trace;

use crate::{
    element::Element,
    fiber::{EffectTag, Fiber, FiberId, FiberTree},
};

/// Builds the child chain of `wip` from `elements`, diffing against the
/// children of its alternate.
///
/// Elements and old fibers are paired by position only. A pair with the same
/// type becomes an [`EffectTag::Update`] fiber reusing the old host node; a new
/// element without a same-type partner becomes an [`EffectTag::Placement`]
/// fiber; an old fiber without a same-type partner is tagged
/// [`EffectTag::Deletion`] and pushed onto `deletions`.
pub(crate) fn reconcile_children<N: Clone>(
    tree: &mut FiberTree<N>,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: &[Element],
    generation: u64,
) {
    let mut old = tree[wip].alternate.and_then(|alternate| tree[alternate].child);
    let mut elements = elements.iter();
    let mut previous: Option<FiberId> = None;
    tree[wip].child = None;

    loop {
        let element = elements.next();
        let (new_fiber, stale) = match (element, old) {
            (None, None) => break,
            (Some(element), Some(old_id)) if tree[old_id].ty.as_ref() == Some(element.ty()) => {
                let dom = tree[old_id].dom.clone();
                let fiber = Fiber::update(element, wip, old_id, dom, generation);
                (Some(tree.insert(fiber)), None)
            }
            (Some(element), old_id) => {
                let fiber = Fiber::placement(element, wip, generation);
                (Some(tree.insert(fiber)), old_id)
            }
            (None, old_id) => (None, old_id),
        };

        if let Some(old_id) = old {
            old = tree[old_id].sibling;
        }

        if let Some(stale) = stale {
            trace!(fiber = ?stale, "marking fiber for deletion");
            tree[stale].effect = Some(EffectTag::Deletion);
            deletions.push(stale);
        }

        if let Some(id) = new_fiber {
            match previous {
                Some(previous) => tree[previous].sibling = Some(id),
                None => tree[wip].child = Some(id),
            }
            previous = Some(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{ElementType, PropValue, Props, children, element, text};

    struct Harness {
        tree: FiberTree<u32>,
        deletions: Vec<FiberId>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                tree: FiberTree::new(),
                deletions: Vec::new(),
            }
        }

        /// Reconciles `elements` under a fresh parent whose alternate is
        /// `previous`, then gives every new child a host node numbered from
        /// `first_node`.
        fn pass(&mut self, previous: Option<FiberId>, elements: &[Element], first_node: u32) -> FiberId {
            let generation = previous.map_or(1, |id| self.tree[id].generation + 1);
            let parent = self
                .tree
                .insert(Fiber::root(0, Rc::new(Props::new()), previous, generation));
            reconcile_children(&mut self.tree, &mut self.deletions, parent, elements, generation);
            let kids: Vec<_> = self.tree.children(parent).collect();
            for (offset, kid) in (0_u32..).zip(kids) {
                if self.tree[kid].dom.is_none() {
                    self.tree[kid].dom = Some(first_node + offset);
                }
            }
            parent
        }

        fn effects(&self, parent: FiberId) -> Vec<Option<EffectTag>> {
            self.tree
                .children(parent)
                .map(|id| self.tree[id].effect)
                .collect()
        }

        fn doms(&self, parent: FiberId) -> Vec<Option<u32>> {
            self.tree
                .children(parent)
                .map(|id| self.tree[id].dom)
                .collect()
        }
    }

    fn tag(name: &str) -> Element {
        element(name, Props::new(), children![])
    }

    #[test]
    fn first_pass_places_everything() {
        let mut harness = Harness::new();
        let parent = harness.pass(None, &[tag("a"), text("b")], 10);

        assert_eq!(
            harness.effects(parent),
            vec![Some(EffectTag::Placement), Some(EffectTag::Placement)]
        );
        assert!(harness.deletions.is_empty());
    }

    #[test]
    fn same_types_update_in_place_reusing_nodes() {
        let mut harness = Harness::new();
        let old = harness.pass(None, &[tag("a"), tag("b"), tag("c")], 10);
        let new = harness.pass(
            Some(old),
            &[
                element("a", Props::new().with("id", 1), children![]),
                tag("b"),
                tag("c"),
            ],
            20,
        );

        assert_eq!(harness.effects(new), vec![Some(EffectTag::Update); 3]);
        assert_eq!(harness.doms(new), vec![Some(10), Some(11), Some(12)]);
        assert!(harness.deletions.is_empty());
        let first = harness.tree[new].child.unwrap();
        assert_eq!(harness.tree[first].props().get("id"), Some(&PropValue::Int(1)));
    }

    #[test]
    fn type_mismatch_replaces_instead_of_updating() {
        let mut harness = Harness::new();
        let old = harness.pass(None, &[tag("x")], 10);
        let old_child = harness.tree[old].child.unwrap();
        let new = harness.pass(Some(old), &[tag("y")], 20);

        assert_eq!(harness.effects(new), vec![Some(EffectTag::Placement)]);
        assert_eq!(harness.doms(new), vec![Some(20)]);
        assert_eq!(harness.deletions, vec![old_child]);
        assert_eq!(harness.tree[old_child].effect, Some(EffectTag::Deletion));
    }

    #[test]
    fn shrinking_deletes_the_tail() {
        let mut harness = Harness::new();
        let old = harness.pass(None, &[tag("a"), tag("b"), tag("c")], 10);
        let old_kids: Vec<_> = harness.tree.children(old).collect();
        let new = harness.pass(Some(old), &[tag("a")], 20);

        assert_eq!(harness.effects(new), vec![Some(EffectTag::Update)]);
        assert_eq!(harness.deletions, old_kids[1..].to_vec());
    }

    #[test]
    fn growing_places_the_tail() {
        let mut harness = Harness::new();
        let old = harness.pass(None, &[tag("a")], 10);
        let new = harness.pass(Some(old), &[tag("a"), tag("b"), text("c")], 20);

        assert_eq!(
            harness.effects(new),
            vec![
                Some(EffectTag::Update),
                Some(EffectTag::Placement),
                Some(EffectTag::Placement)
            ]
        );
        assert_eq!(harness.doms(new), vec![Some(10), Some(21), Some(22)]);
        assert!(harness.deletions.is_empty());
    }

    #[test]
    fn reordering_is_seen_as_updates_by_position() {
        let mut harness = Harness::new();
        let old = harness.pass(None, &[text("one"), text("two")], 10);
        let new = harness.pass(Some(old), &[text("two"), text("one")], 20);

        assert_eq!(harness.effects(new), vec![Some(EffectTag::Update); 2]);
        assert_eq!(harness.doms(new), vec![Some(10), Some(11)]);
        let first = harness.tree[new].child.unwrap();
        assert_eq!(harness.tree[first].ty(), Some(&ElementType::Text));
    }

    #[test]
    fn mismatch_in_the_middle_keeps_chain_order() {
        let mut harness = Harness::new();
        let old = harness.pass(None, &[tag("a"), tag("b"), tag("c")], 10);
        let new = harness.pass(Some(old), &[tag("a"), tag("z"), tag("c")], 20);

        assert_eq!(
            harness.effects(new),
            vec![
                Some(EffectTag::Update),
                Some(EffectTag::Placement),
                Some(EffectTag::Update)
            ]
        );
        assert_eq!(harness.doms(new), vec![Some(10), Some(21), Some(12)]);
        assert_eq!(harness.deletions.len(), 1);
    }
}
