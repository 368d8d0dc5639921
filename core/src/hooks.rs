//! Per-component local state.
//!
//! A function component receives a [`Hooks`] context for the fiber it renders.
//! Each [`Hooks::use_state`] call owns one state cell, identified only by its
//! zero-based call index. The cell is seeded from the previous render of the
//! same fiber, and the updates queued through its [`SetState`] since then are
//! folded into it in order.
//!
//! Because identity is positional, hooks must not be called conditionally or
//! in loops whose length changes between renders. Violations are reported as
//! [`RenderError::HookOrder`] or [`RenderError::HookType`].

use core::{any::Any, cell::Cell, cell::RefCell, fmt};
use std::rc::Rc;

use crate::error::RenderError;

type Update<T> = Box<dyn Fn(&T) -> T>;
type UpdateQueue<T> = RefCell<Vec<Update<T>>>;

/// A type-erased state cell stored on a fiber.
#[derive(Clone)]
pub(crate) struct StateCell {
    value: Rc<dyn Any>,
    queue: Rc<dyn Any>,
}

impl fmt::Debug for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell").finish_non_exhaustive()
    }
}

/// Shared flag a [`SetState`] raises to ask the engine for a new pass.
#[derive(Debug, Clone, Default)]
pub struct RenderTrigger(Rc<Cell<bool>>);

impl RenderTrigger {
    /// Requests a full re-render from the current root.
    pub fn request(&self) {
        self.0.set(true);
    }

    /// Whether a re-render was requested and not yet started.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.get()
    }

    pub(crate) fn clear(&self) {
        self.0.set(false);
    }
}

/// Setter returned by [`Hooks::use_state`].
///
/// Setting state never changes the value seen by the current render. The update
/// is queued and a re-render of the whole tree is requested; the next render of
/// the owning fiber observes the folded value.
pub struct SetState<T> {
    queue: Rc<UpdateQueue<T>>,
    trigger: RenderTrigger,
}

impl<T: 'static> SetState<T> {
    /// Queues an update computed from the latest value.
    pub fn update(&self, update: impl Fn(&T) -> T + 'static) {
        self.queue.borrow_mut().push(Box::new(update));
        self.trigger.request();
    }

    /// Queues replacing the value.
    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        self.update(move |_| value.clone());
    }

    /// Number of updates queued on this cell.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
            trigger: self.trigger.clone(),
        }
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("pending", &self.queue.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Hook context of the function fiber being rendered.
pub struct Hooks {
    component: Rc<str>,
    previous: Option<Vec<StateCell>>,
    cells: Vec<StateCell>,
    trigger: RenderTrigger,
    type_fault: Option<usize>,
}

impl Hooks {
    pub(crate) fn new(
        component: &str,
        previous: Option<Vec<StateCell>>,
        trigger: RenderTrigger,
    ) -> Self {
        Self {
            component: component.into(),
            previous,
            cells: Vec::new(),
            trigger,
            type_fault: None,
        }
    }

    /// Declares a state cell seeded with `initial` on the first render.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, SetState<T>) {
        self.use_state_with(|| initial)
    }

    /// Like [`Hooks::use_state`], computing the initial value only when the
    /// cell is created.
    pub fn use_state_with<T, F>(&mut self, init: F) -> (T, SetState<T>)
    where
        T: Clone + 'static,
        F: FnOnce() -> T,
    {
        let index = self.cells.len();
        let previous = self.previous.as_ref().and_then(|cells| cells.get(index));
        let value = match previous {
            Some(cell) => match cell.value.downcast_ref::<T>() {
                Some(seed) => fold(seed.clone(), cell),
                None => {
                    if self.type_fault.is_none() {
                        self.type_fault = Some(index);
                    }
                    init()
                }
            },
            None => init(),
        };

        let queue: Rc<UpdateQueue<T>> = Rc::default();
        self.cells.push(StateCell {
            value: Rc::new(value.clone()),
            queue: Rc::clone(&queue) as Rc<dyn Any>,
        });
        let setter = SetState {
            queue,
            trigger: self.trigger.clone(),
        };
        (value, setter)
    }

    /// Number of hooks called so far in this render.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no hook has been called yet in this render.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The trigger setters of this engine raise; lets components request a
    /// re-render without state.
    #[must_use]
    pub const fn trigger(&self) -> &RenderTrigger {
        &self.trigger
    }

    /// Validates the call sequence and returns the cells to store on the fiber.
    pub(crate) fn finish(self) -> Result<Vec<StateCell>, RenderError> {
        if let Some(index) = self.type_fault {
            return Err(RenderError::HookType {
                component: self.component.to_string(),
                index,
            });
        }
        if let Some(previous) = &self.previous {
            if previous.len() != self.cells.len() {
                return Err(RenderError::HookOrder {
                    component: self.component.to_string(),
                    expected: previous.len(),
                    found: self.cells.len(),
                });
            }
        }
        Ok(self.cells)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("component", &self.component)
            .field("called", &self.cells.len())
            .finish_non_exhaustive()
    }
}

fn fold<T: 'static>(mut value: T, cell: &StateCell) -> T {
    if let Some(queue) = cell.queue.downcast_ref::<UpdateQueue<T>>() {
        for update in queue.borrow().iter() {
            value = update(&value);
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_once(previous: Option<Vec<StateCell>>, trigger: &RenderTrigger) -> Hooks {
        Hooks::new("Counter", previous, trigger.clone())
    }

    #[test]
    fn first_render_uses_initial_value() {
        let trigger = RenderTrigger::default();
        let mut hooks = render_once(None, &trigger);

        let (count, _) = hooks.use_state(1);
        let (label, _) = hooks.use_state_with(|| String::from("clicks"));

        assert_eq!(count, 1);
        assert_eq!(label, "clicks");
        assert_eq!(hooks.finish().unwrap().len(), 2);
        assert!(!trigger.is_requested());
    }

    #[test]
    fn queued_updates_fold_on_next_render() {
        let trigger = RenderTrigger::default();
        let mut first = render_once(None, &trigger);
        let (_, set_count) = first.use_state(1);
        let (_, _set_other) = first.use_state(10);
        let cells = first.finish().unwrap();

        set_count.update(|c| c + 1);
        set_count.update(|c| c * 3);
        assert!(trigger.is_requested());
        assert_eq!(set_count.pending(), 2);

        let mut second = render_once(Some(cells), &trigger);
        let (count, _) = second.use_state(1);
        let (other, _) = second.use_state(10);
        assert_eq!(count, 6);
        assert_eq!(other, 10);
    }

    #[test]
    fn updates_are_not_drained_by_an_abandoned_render() {
        let trigger = RenderTrigger::default();
        let mut first = render_once(None, &trigger);
        let (_, set_count) = first.use_state(0);
        let cells = first.finish().unwrap();
        set_count.set(5);

        for _ in 0..2 {
            let mut retry = render_once(Some(cells.clone()), &trigger);
            assert_eq!(retry.use_state(0).0, 5);
        }
    }

    #[test]
    fn changing_hook_count_is_reported() {
        let trigger = RenderTrigger::default();
        let mut first = render_once(None, &trigger);
        first.use_state(0);
        let cells = first.finish().unwrap();

        let mut second = render_once(Some(cells), &trigger);
        second.use_state(0);
        second.use_state(0);

        assert!(matches!(
            second.finish(),
            Err(RenderError::HookOrder {
                expected: 1,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn changing_state_type_is_reported() {
        let trigger = RenderTrigger::default();
        let mut first = render_once(None, &trigger);
        first.use_state(0_i32);
        let cells = first.finish().unwrap();

        let mut second = render_once(Some(cells), &trigger);
        let (value, _) = second.use_state("zero");

        assert_eq!(value, "zero");
        assert!(matches!(
            second.finish(),
            Err(RenderError::HookType { index: 0, .. })
        ));
    }
}
