//! Action events and their routing contract.
//!
//! Every element a surface renders holds an [`ActionSender`]: the element's
//! id plus a weak back-reference to the renderer that owns it. Sending an
//! action hands an [`ActionEvent`] straight to that renderer, which resolves
//! the element to a locator and node, offers the component a self-update,
//! and invokes the handlers registered for the action's kind.
//!
//! Routing never fails with an error. An event that cannot be resolved is
//! dropped and reported as [`RouteOutcome::Dropped`].

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::component::{AnyComponent, Component};
use crate::locator::Locator;
use crate::surface::ElementId;

/// Why an interaction happened.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// The element was selected.
    Select,
    /// The element's content finished loading.
    DidLoad,
    /// An application-defined action.
    Custom(Cow<'static, str>),
}

impl ActionKind {
    /// Creates a custom action kind.
    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom(name.into())
    }

    /// Returns the kind's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Select => "select",
            Self::DidLoad => "did_load",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Auxiliary data attached to an action.
#[derive(Clone)]
pub struct Payload(Arc<dyn Any + Send + Sync>);

impl Payload {
    /// Wraps a value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Returns the value if it is a `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(..)")
    }
}

/// A raw interaction raised by a rendered element.
#[derive(Debug, Clone)]
pub struct ActionEvent {
    /// The element that raised the action.
    pub source: ElementId,
    /// The kind of action.
    pub kind: ActionKind,
    /// Optional auxiliary data.
    pub payload: Option<Payload>,
}

impl ActionEvent {
    /// Creates an event without payload.
    pub fn new(source: ElementId, kind: ActionKind) -> Self {
        Self {
            source,
            kind,
            payload: None,
        }
    }

    /// Attaches a payload.
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Payload::new(payload));
        self
    }
}

/// Everything a handler learns about a routed action.
#[derive(Debug, Clone)]
pub struct ActionContext {
    source: ElementId,
    component: AnyComponent,
    locator: Locator,
    kind: ActionKind,
    payload: Option<Payload>,
}

impl ActionContext {
    /// Creates a context.
    pub fn new(
        source: ElementId,
        component: AnyComponent,
        locator: Locator,
        kind: ActionKind,
        payload: Option<Payload>,
    ) -> Self {
        Self {
            source,
            component,
            locator,
            kind,
            payload,
        }
    }

    /// The element that raised the action.
    pub fn source(&self) -> ElementId {
        self.source
    }

    /// The component at the locator when the context was built.
    pub fn component(&self) -> &AnyComponent {
        &self.component
    }

    /// The component, if it is a `C`.
    pub fn component_as<C: Component>(&self) -> Option<&C> {
        self.component.downcast_ref::<C>()
    }

    /// Where the element sits in the tree.
    pub fn locator(&self) -> Locator {
        self.locator
    }

    /// The action kind.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The raw payload.
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// The payload, if it is a `T`.
    pub fn payload_as<T: Any>(&self) -> Option<&T> {
        self.payload.as_ref()?.get::<T>()
    }

    pub(crate) fn with_component(mut self, component: AnyComponent) -> Self {
        self.component = component;
        self
    }
}

/// How a routed action changed the acting component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelfUpdate {
    /// The component offered no replacement.
    None,
    /// The replacement was patched into the tree without a diff.
    Patched,
    /// The replacement changed content and triggered a render.
    Rerendered,
}

/// Why an action was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The element is no longer on the surface.
    Detached,
    /// The element's locator holds no node.
    NoNode,
    /// The renderer has no surface attached.
    NoSurface,
    /// The renderer was mid-apply, or a render pass was still running.
    Busy,
    /// The owning renderer no longer exists.
    NoOwner,
}

/// Result of routing one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The action reached its node.
    Handled {
        /// What the self-update step did.
        self_update: SelfUpdate,
        /// Number of handlers invoked.
        handlers: usize,
    },
    /// The action was dropped without side effects.
    Dropped(DropReason),
}

impl RouteOutcome {
    /// Returns `true` if the action reached its node.
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }

    /// Returns the number of handlers invoked.
    pub fn handler_count(&self) -> usize {
        match self {
            Self::Handled { handlers, .. } => *handlers,
            Self::Dropped(_) => 0,
        }
    }

    /// Returns the drop reason, if dropped.
    pub fn drop_reason(&self) -> Option<DropReason> {
        match self {
            Self::Dropped(reason) => Some(*reason),
            Self::Handled { .. } => None,
        }
    }
}

/// Receives events from the elements of one renderer.
pub trait ActionSink: Send + Sync {
    /// Routes one event.
    fn route(&self, event: ActionEvent) -> RouteOutcome;
}

struct NullSink;

impl ActionSink for NullSink {
    fn route(&self, _event: ActionEvent) -> RouteOutcome {
        RouteOutcome::Dropped(DropReason::NoOwner)
    }
}

/// A sink reference that never upgrades.
pub(crate) fn unowned_sink() -> Weak<dyn ActionSink> {
    Weak::<NullSink>::new()
}

/// An element's handle back to its owning renderer.
#[derive(Clone)]
pub struct ActionSender {
    element: ElementId,
    sink: Weak<dyn ActionSink>,
}

impl ActionSender {
    /// Creates a sender for `element` routing into `sink`.
    pub fn new(element: ElementId, sink: Weak<dyn ActionSink>) -> Self {
        Self { element, sink }
    }

    /// Creates a sender with no owner. Everything it sends is dropped.
    pub fn detached(element: ElementId) -> Self {
        Self::new(element, unowned_sink())
    }

    /// The element this sender speaks for.
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Returns `true` while the owning renderer is alive.
    pub fn is_attached(&self) -> bool {
        self.sink.strong_count() > 0
    }

    /// Sends an action without payload.
    pub fn send(&self, kind: ActionKind) -> RouteOutcome {
        self.dispatch(ActionEvent::new(self.element, kind))
    }

    /// Sends an action with a payload.
    pub fn send_with<T: Any + Send + Sync>(&self, kind: ActionKind, payload: T) -> RouteOutcome {
        self.dispatch(ActionEvent::new(self.element, kind).with_payload(payload))
    }

    /// Sends a prepared event.
    pub fn dispatch(&self, event: ActionEvent) -> RouteOutcome {
        match self.sink.upgrade() {
            Some(sink) => sink.route(event),
            None => {
                tracing::debug!(
                    target: horizon_strata_core::logging::targets::ROUTER,
                    kind = %event.kind,
                    "owner gone, dropping action"
                );
                RouteOutcome::Dropped(DropReason::NoOwner)
            }
        }
    }
}

impl fmt::Debug for ActionSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSender")
            .field("element", &self.element)
            .field("attached", &self.is_attached())
            .finish()
    }
}

static_assertions::assert_impl_all!(ActionSender: Send, Sync);
static_assertions::assert_impl_all!(ActionContext: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use slotmap::SlotMap;

    struct Recorder(Mutex<Vec<ActionKind>>);

    impl ActionSink for Recorder {
        fn route(&self, event: ActionEvent) -> RouteOutcome {
            self.0.lock().push(event.kind);
            RouteOutcome::Handled {
                self_update: SelfUpdate::None,
                handlers: 1,
            }
        }
    }

    fn element() -> ElementId {
        let mut keys: SlotMap<ElementId, ()> = SlotMap::with_key();
        keys.insert(())
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ActionKind::Select.to_string(), "select");
        assert_eq!(ActionKind::custom("swipe").name(), "swipe");
        assert_eq!(ActionKind::custom("swipe"), ActionKind::Custom("swipe".into()));
    }

    #[test]
    fn test_payload_typed_access() {
        let payload = Payload::new(42u32);
        assert_eq!(payload.get::<u32>(), Some(&42));
        assert_eq!(payload.get::<i64>(), None);
    }

    #[test]
    fn test_sender_reaches_live_sink() {
        let sink = Arc::new(Recorder(Mutex::new(Vec::new())));
        let weak: Weak<dyn ActionSink> = Arc::downgrade(&sink) as Weak<dyn ActionSink>;
        let sender = ActionSender::new(element(), weak);

        assert!(sender.is_attached());
        assert_eq!(sender.send(ActionKind::DidLoad).handler_count(), 1);
        assert_eq!(*sink.0.lock(), vec![ActionKind::DidLoad]);
    }

    #[test]
    fn test_sender_drops_after_owner_is_gone() {
        let sink = Arc::new(Recorder(Mutex::new(Vec::new())));
        let weak: Weak<dyn ActionSink> = Arc::downgrade(&sink) as Weak<dyn ActionSink>;
        let sender = ActionSender::new(element(), weak);
        drop(sink);

        assert!(!sender.is_attached());
        assert_eq!(
            sender.send(ActionKind::Select),
            RouteOutcome::Dropped(DropReason::NoOwner)
        );
    }

    #[test]
    fn test_detached_sender() {
        let sender = ActionSender::detached(element());
        assert_eq!(
            sender.send_with(ActionKind::Select, "payload").drop_reason(),
            Some(DropReason::NoOwner)
        );
    }
}
