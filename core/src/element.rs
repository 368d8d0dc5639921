//! Immutable element descriptions.
//!
//! An [`Element`] says what should exist at a position of the tree: a host node
//! with a tag, a text node, or a function [`Component`] that renders another
//! element. Elements are cheap to clone; their props are shared.

use core::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    hooks::Hooks,
    props::{NODE_VALUE, PropValue, Props},
};

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

type RenderFn = dyn Fn(&mut Hooks, &Props) -> anyhow::Result<Element>;

/// A function component.
///
/// Components are identified by the value returned from [`Component::new`]:
/// clones compare equal, two separately created components never do, even when
/// built from the same closure. Create each component once and reuse it.
///
/// Hooks must be called unconditionally and in the same order on every render.
#[derive(Clone)]
pub struct Component {
    id: u64,
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl Component {
    /// Creates a component from its render function.
    pub fn new<F>(name: impl Into<Rc<str>>, render: F) -> Self
    where
        F: Fn(&mut Hooks, &Props) -> anyhow::Result<Element> + 'static,
    {
        Self {
            id: NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            render: Rc::new(render),
        }
    }

    /// The name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn render(&self, hooks: &mut Hooks, props: &Props) -> anyhow::Result<Element> {
        (self.render)(hooks, props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// What an element stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    /// A host node with a tag name, such as `div`.
    Host(Rc<str>),
    /// A text node. Its content is the `nodeValue` attribute.
    Text,
    /// A function component.
    Component(Component),
}

impl ElementType {
    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Host(tag) => tag,
            Self::Text => "#text",
            Self::Component(component) => component.name(),
        }
    }
}

/// An immutable description of one tree position.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    /// Creates an element from a type and its props.
    #[must_use]
    pub fn new(ty: ElementType, props: Props) -> Self {
        Self {
            ty,
            props: Rc::new(props),
        }
    }

    /// The element type.
    #[must_use]
    pub const fn ty(&self) -> &ElementType {
        &self.ty
    }

    /// The element props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }
}

/// A child passed to the element builder: either an element or a raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    /// An element, used as is.
    Element(Element),
    /// A raw value, wrapped into a text element.
    Raw(PropValue),
}

impl Child {
    /// Resolves the child into an element.
    #[must_use]
    pub fn into_element(self) -> Element {
        match self {
            Self::Element(element) => element,
            Self::Raw(value) => text(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&Element> for Child {
    fn from(element: &Element) -> Self {
        Self::Element(element.clone())
    }
}

/// Builds a host element.
///
/// Children in `props` are replaced by `children`.
pub fn element(
    tag: impl Into<Rc<str>>,
    props: Props,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    Element::new(ElementType::Host(tag.into()), props.with_children(children))
}

/// Builds a text element holding `value`.
pub fn text(value: impl Into<PropValue>) -> Element {
    Element::new(ElementType::Text, Props::new().with(NODE_VALUE, value))
}

/// Builds an element rendering `component` with `props`.
#[must_use]
pub fn component(component: &Component, props: Props) -> Element {
    Element::new(ElementType::Component(component.clone()), props)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_children_become_text_elements() {
        let heading = element("h1", Props::new(), children!["Count: ", 2, true]);
        let kids = heading.props().children();

        assert_eq!(kids.len(), 3);
        assert!(kids.iter().all(|kid| kid.ty() == &ElementType::Text));
        assert_eq!(kids[1].props().get(NODE_VALUE), Some(&PropValue::Int(2)));
        assert!(kids[0].props().children().is_empty());
    }

    #[test]
    fn element_children_are_kept() {
        let item = element("li", Props::new(), children![]);
        let list = element("ul", Props::new(), children![item.clone(), &item]);

        assert_eq!(list.props().children(), &[item.clone(), item]);
    }

    #[test]
    fn components_compare_by_identity() {
        let render = |_: &mut Hooks, _: &Props| Ok::<_, anyhow::Error>(text("x"));
        let a = Component::new("A", render);
        let b = Component::new("A", render);

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(
            component(&a, Props::new()).ty(),
            &ElementType::Component(a.clone())
        );
    }
}
