//! Nodes: a component plus the action handlers registered for it.
//!
//! A [`Node`] is the atomic diffable unit. Its identity is its component's
//! id; the handlers ride along and never take part in diffing. Nodes are
//! built fresh for every render and never mutated afterwards. A changed item
//! is a new node.

use std::fmt;
use std::sync::Arc;

use horizon_strata_core::ComponentId;

use crate::action::{ActionContext, ActionKind};
use crate::component::{AnyComponent, Component};

/// A registered action handler.
pub type Handler = Arc<dyn Fn(&ActionContext) + Send + Sync>;

/// Handlers of one node, kept in registration order.
#[derive(Clone, Default)]
pub struct HandlerTable {
    entries: Vec<(ActionKind, Handler)>,
}

impl HandlerTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler for `kind`.
    pub fn register(&mut self, kind: ActionKind, handler: Handler) {
        self.entries.push((kind, handler));
    }

    /// Returns the handlers for `kind` in registration order.
    pub fn handlers(&self, kind: &ActionKind) -> Vec<Handler> {
        self.entries
            .iter()
            .filter(|(registered, _)| registered == kind)
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    /// Returns `true` if at least one handler is registered for `kind`.
    pub fn contains(&self, kind: &ActionKind) -> bool {
        self.entries.iter().any(|(registered, _)| registered == kind)
    }

    /// Returns the total number of handlers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(kind, _)| kind))
            .finish()
    }
}

/// One identity-keyed slot of a section tree.
///
/// # Example
///
/// ```
/// use horizon_strata::{ActionKind, Component, Identifiable, Node};
///
/// #[derive(Clone, PartialEq)]
/// struct Row(u32);
///
/// impl Identifiable for Row {
///     type Id = u32;
///     fn id(&self) -> u32 {
///         self.0
///     }
///     fn should_content_update(&self, _next: &Self) -> bool {
///         false
///     }
/// }
///
/// impl Component for Row {
///     type Content = ();
///     fn render_content(&self) {}
///     fn render(&self, _content: &mut ()) {}
/// }
///
/// let node = Node::new(Row(3))
///     .on(ActionKind::Select, |ctx| println!("selected {}", ctx.locator()))
///     .on_typed(ActionKind::DidLoad, |row: &Row, _ctx| println!("loaded {}", row.0));
/// assert_eq!(node.handler_count(), 2);
/// ```
#[derive(Clone)]
pub struct Node {
    component: AnyComponent,
    handlers: Arc<HandlerTable>,
}

impl Node {
    /// Wraps a component with no handlers.
    pub fn new<C: Component>(component: C) -> Self {
        Self::from_any(AnyComponent::new(component))
    }

    /// Wraps an already erased component.
    pub fn from_any(component: AnyComponent) -> Self {
        Self {
            component,
            handlers: Arc::new(HandlerTable::new()),
        }
    }

    /// Registers a handler for `kind`.
    pub fn on<F>(mut self, kind: ActionKind, handler: F) -> Self
    where
        F: Fn(&ActionContext) + Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.handlers).register(kind, Arc::new(handler));
        self
    }

    /// Registers a handler that receives the concrete component.
    ///
    /// The handler is skipped when the component at the routed locator is
    /// not a `C`.
    pub fn on_typed<C, F>(self, kind: ActionKind, handler: F) -> Self
    where
        C: Component,
        F: Fn(&C, &ActionContext) + Send + Sync + 'static,
    {
        self.on(kind, move |context| {
            if let Some(component) = context.component_as::<C>() {
                handler(component, context);
            }
        })
    }

    /// Returns the component's id.
    pub fn id(&self) -> ComponentId {
        self.component.id()
    }

    /// Returns the wrapped component.
    pub fn component(&self) -> &AnyComponent {
        &self.component
    }

    /// Returns the handlers for `kind` in registration order.
    pub fn handlers(&self, kind: &ActionKind) -> Vec<Handler> {
        self.handlers.handlers(kind)
    }

    /// Returns the whole handler table.
    pub fn handler_table(&self) -> &HandlerTable {
        &self.handlers
    }

    /// Returns the total number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Returns a node showing `component` with this node's handlers.
    pub fn with_component(&self, component: AnyComponent) -> Node {
        Node {
            component,
            handlers: Arc::clone(&self.handlers),
        }
    }

    /// Returns `true` if `next` would paint differently than this node.
    pub fn should_content_update(&self, next: &Node) -> bool {
        self.component.should_content_update(&next.component)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("type", &self.component.type_name())
            .field("id", &self.id())
            .field("handlers", &self.handlers)
            .finish()
    }
}

static_assertions::assert_impl_all!(Node: Send, Sync);

/// Conversion into a [`Node`].
pub trait IntoNode {
    /// Performs the conversion.
    fn into_node(self) -> Node;
}

impl IntoNode for Node {
    fn into_node(self) -> Node {
        self
    }
}

impl IntoNode for AnyComponent {
    fn into_node(self) -> Node {
        Node::from_any(self)
    }
}

impl<C: Component> IntoNode for C {
    fn into_node(self) -> Node {
        Node::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_strata_core::Identifiable;
    use parking_lot::Mutex;
    use slotmap::SlotMap;

    use crate::locator::Locator;
    use crate::surface::ElementId;

    #[derive(Clone, PartialEq, Debug)]
    struct Item {
        key: u8,
        label: &'static str,
    }

    impl Identifiable for Item {
        type Id = u8;
        fn id(&self) -> u8 {
            self.key
        }
        fn should_content_update(&self, next: &Self) -> bool {
            self.label != next.label
        }
    }

    impl Component for Item {
        type Content = ();
        fn render_content(&self) {}
        fn render(&self, _content: &mut ()) {}
    }

    fn context(node: &Node, kind: ActionKind) -> ActionContext {
        let mut keys: SlotMap<ElementId, ()> = SlotMap::with_key();
        ActionContext::new(
            keys.insert(()),
            node.component().clone(),
            Locator::cell(0, 0),
            kind,
            None,
        )
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (first, second, other) = (log.clone(), log.clone(), log.clone());
        let node = Node::new(Item { key: 1, label: "x" })
            .on(ActionKind::Select, move |_| first.lock().push("first"))
            .on(ActionKind::DidLoad, move |_| other.lock().push("other"))
            .on(ActionKind::Select, move |_| second.lock().push("second"));

        let ctx = context(&node, ActionKind::Select);
        for handler in node.handlers(&ActionKind::Select) {
            handler(&ctx);
        }
        assert_eq!(*log.lock(), vec!["first", "second"]);
        assert!(node.handler_table().contains(&ActionKind::DidLoad));
        assert!(!node.handler_table().contains(&ActionKind::custom("none")));
    }

    #[test]
    fn test_typed_handler_sees_concrete_component() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let node = Node::new(Item { key: 4, label: "four" }).on_typed(
            ActionKind::Select,
            move |item: &Item, _ctx| {
                *sink.lock() = Some(item.label);
            },
        );

        let ctx = context(&node, ActionKind::Select);
        for handler in node.handlers(&ActionKind::Select) {
            handler(&ctx);
        }
        assert_eq!(*seen.lock(), Some("four"));
    }

    #[test]
    fn test_with_component_keeps_handlers() {
        let node = Node::new(Item { key: 1, label: "a" }).on(ActionKind::Select, |_| {});
        let replaced = node.with_component(AnyComponent::new(Item { key: 1, label: "b" }));
        assert_eq!(replaced.handler_count(), 1);
        assert_eq!(replaced.id(), node.id());
        assert!(node.should_content_update(&replaced));
    }

    #[test]
    fn test_builder_does_not_mutate_clones() {
        let base = Node::new(Item { key: 1, label: "a" });
        let extended = base.clone().on(ActionKind::Select, |_| {});
        assert_eq!(base.handler_count(), 0);
        assert_eq!(extended.handler_count(), 1);
    }
}
