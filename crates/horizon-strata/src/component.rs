//! Components: immutable descriptions of what one slot renders.
//!
//! A [`Component`] is a value describing one list item. It carries an id and
//! a content comparison (through [`Identifiable`]) plus the two paint hooks
//! the surface drives: [`Component::render_content`] instantiates the visual
//! counterpart once per inserted slot and [`Component::render`] paints it,
//! again on every reload.
//!
//! Sections hold components of many concrete types, so the engine works with
//! the type-erased [`AnyComponent`]. Its content comparison is an explicit
//! method: two components of different concrete types always compare as
//! changed.
//!
//! # Example
//!
//! ```
//! use horizon_strata::{Component, Identifiable, AnyComponent};
//!
//! #[derive(Clone, PartialEq)]
//! struct Label {
//!     key: u32,
//!     text: String,
//! }
//!
//! impl Identifiable for Label {
//!     type Id = u32;
//!     fn id(&self) -> u32 {
//!         self.key
//!     }
//!     fn should_content_update(&self, next: &Self) -> bool {
//!         self.text != next.text
//!     }
//! }
//!
//! impl Component for Label {
//!     type Content = String;
//!
//!     fn render_content(&self) -> String {
//!         String::new()
//!     }
//!
//!     fn render(&self, content: &mut String) {
//!         content.clone_from(&self.text);
//!     }
//! }
//!
//! let erased = AnyComponent::new(Label { key: 1, text: "Hi".into() });
//! let mut content = erased.render_content();
//! assert!(erased.render(&mut *content));
//! assert_eq!(content.downcast_ref::<String>().map(String::as_str), Some("Hi"));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use horizon_strata_core::{ComponentId, Identifiable};

use crate::action::{ActionContext, ActionKind};
use crate::decorator::{Decorated, Decoration};
use crate::node::Node;

/// A renderable, identifiable description of one slot.
pub trait Component: Identifiable + Sized + Send + Sync + 'static {
    /// The visual counterpart this component paints into.
    type Content: Send + 'static;

    /// Instantiates fresh content for a newly inserted slot.
    fn render_content(&self) -> Self::Content;

    /// Paints this component into `content`.
    fn render(&self, content: &mut Self::Content);

    /// Returns `true` if `content`, currently showing `self`, must be
    /// repainted to show `next`.
    fn should_render(&self, next: &Self, _content: &Self::Content) -> bool {
        self.should_content_update(next)
    }

    /// Identifier the surface uses to pool reusable content.
    fn reuse_identifier(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Produces a replacement for this component in response to an action.
    ///
    /// Must be pure: the engine decides how the replacement is applied.
    fn self_update(&self, _context: &ActionContext) -> Option<Self> {
        None
    }

    /// Called when content showing this component becomes visible.
    fn content_will_display(&self, _content: &mut Self::Content) {}

    /// Called when content showing this component leaves the surface.
    fn content_did_end_display(&self, _content: &mut Self::Content) {}
}

/// Object-safe view over a component of any concrete type.
trait ErasedComponent: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn id(&self) -> ComponentId;
    fn content_differs(&self, next: &dyn ErasedComponent) -> bool;
    fn render_differs(&self, next: &dyn ErasedComponent, content: &dyn Any) -> bool;
    fn render_content(&self) -> Box<dyn Any + Send>;
    fn render(&self, content: &mut dyn Any) -> bool;
    fn self_update(&self, context: &ActionContext) -> Option<AnyComponent>;
    fn reuse_identifier(&self) -> &'static str;
    fn type_name(&self) -> &'static str;
    fn content_type(&self) -> TypeId;
    fn will_display(&self, content: &mut dyn Any);
    fn did_end_display(&self, content: &mut dyn Any);
}

impl<C: Component> ErasedComponent for C {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn id(&self) -> ComponentId {
        ComponentId::of(self)
    }

    fn content_differs(&self, next: &dyn ErasedComponent) -> bool {
        match next.as_any().downcast_ref::<C>() {
            Some(next) => self.should_content_update(next),
            None => true,
        }
    }

    fn render_differs(&self, next: &dyn ErasedComponent, content: &dyn Any) -> bool {
        match (
            next.as_any().downcast_ref::<C>(),
            content.downcast_ref::<C::Content>(),
        ) {
            (Some(next), Some(content)) => self.should_render(next, content),
            _ => true,
        }
    }

    fn render_content(&self) -> Box<dyn Any + Send> {
        Box::new(Component::render_content(self))
    }

    fn render(&self, content: &mut dyn Any) -> bool {
        match content.downcast_mut::<C::Content>() {
            Some(content) => {
                Component::render(self, content);
                true
            }
            None => false,
        }
    }

    fn self_update(&self, context: &ActionContext) -> Option<AnyComponent> {
        Component::self_update(self, context).map(AnyComponent::new)
    }

    fn reuse_identifier(&self) -> &'static str {
        Component::reuse_identifier(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    fn content_type(&self) -> TypeId {
        TypeId::of::<C::Content>()
    }

    fn will_display(&self, content: &mut dyn Any) {
        if let Some(content) = content.downcast_mut::<C::Content>() {
            self.content_will_display(content);
        }
    }

    fn did_end_display(&self, content: &mut dyn Any) {
        if let Some(content) = content.downcast_mut::<C::Content>() {
            self.content_did_end_display(content);
        }
    }
}

/// A cheaply cloneable, type-erased component.
#[derive(Clone)]
pub struct AnyComponent(Arc<dyn ErasedComponent>);

impl AnyComponent {
    /// Erases a concrete component.
    pub fn new<C: Component>(component: C) -> Self {
        Self(Arc::new(component))
    }

    /// Returns the component's erased id.
    pub fn id(&self) -> ComponentId {
        self.0.id()
    }

    /// Returns `true` if `next` would paint differently than `self`.
    ///
    /// Components of different concrete types always differ.
    pub fn should_content_update(&self, next: &AnyComponent) -> bool {
        !self.ptr_eq(next) && self.0.content_differs(&*next.0)
    }

    /// Returns `true` if content showing `self` must be repainted for `next`.
    pub fn should_render(&self, next: &AnyComponent, content: &dyn Any) -> bool {
        self.0.render_differs(&*next.0, content)
    }

    /// Instantiates fresh content.
    pub fn render_content(&self) -> Box<dyn Any + Send> {
        self.0.render_content()
    }

    /// Paints into `content`. Returns `false` if `content` is not this
    /// component's content type.
    pub fn render(&self, content: &mut dyn Any) -> bool {
        self.0.render(content)
    }

    /// Asks the component for a replacement of itself.
    pub fn self_update(&self, context: &ActionContext) -> Option<AnyComponent> {
        self.0.self_update(context)
    }

    /// Returns the reuse identifier.
    pub fn reuse_identifier(&self) -> &'static str {
        self.0.reuse_identifier()
    }

    /// Returns the concrete type name.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Returns the concrete component if it is a `C`.
    pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
        self.0.as_any().downcast_ref::<C>()
    }

    /// Returns `true` if the concrete component is a `C`.
    pub fn is<C: Component>(&self) -> bool {
        self.0.as_any().is::<C>()
    }

    /// Returns `true` if both handles share one allocation.
    pub fn ptr_eq(&self, other: &AnyComponent) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn same_type(&self, other: &AnyComponent) -> bool {
        Any::type_id(self.0.as_any()) == Any::type_id(other.0.as_any())
    }

    pub(crate) fn content_type(&self) -> TypeId {
        self.0.content_type()
    }

    pub(crate) fn will_display(&self, content: &mut dyn Any) {
        self.0.will_display(content);
    }

    pub(crate) fn did_end_display(&self, content: &mut dyn Any) {
        self.0.did_end_display(content);
    }
}

impl fmt::Debug for AnyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyComponent")
            .field("type", &self.type_name())
            .field("id", &self.id())
            .finish()
    }
}

impl<C: Component> From<C> for AnyComponent {
    fn from(component: C) -> Self {
        Self::new(component)
    }
}

static_assertions::assert_impl_all!(AnyComponent: Send, Sync);

/// Builder conveniences available on every component.
pub trait ComponentExt: Component {
    /// Erases this component.
    fn into_any(self) -> AnyComponent {
        AnyComponent::new(self)
    }

    /// Wraps this component in a node with one handler for `kind`.
    fn on<F>(self, kind: ActionKind, handler: F) -> Node
    where
        F: Fn(&ActionContext) + Send + Sync + 'static,
    {
        Node::new(self).on(kind, handler)
    }

    /// Wraps this component in a decoration.
    fn decorated<D: Decoration>(self, decoration: D) -> Decorated<Self, D> {
        Decorated::new(self, decoration)
    }
}

impl<C: Component> ComponentExt for C {}

/// Outcome of rendering a component into a [`ComponentSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRender {
    /// Fresh content was instantiated and painted.
    Instantiated,
    /// Existing content was repainted.
    Repainted,
    /// Existing content already showed the component.
    Skipped,
}

/// Rendered content of one visual element plus the component it shows.
///
/// Content is reused across components with the same reuse identifier and
/// content type; anything else instantiates fresh content.
#[derive(Default)]
pub struct ComponentSlot {
    content: Option<Box<dyn Any + Send>>,
    component: Option<AnyComponent>,
}

impl ComponentSlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `component` into this slot.
    pub fn render(&mut self, component: &AnyComponent) -> SlotRender {
        let reusable = match (&self.component, &self.content) {
            (Some(previous), Some(_)) => {
                previous.reuse_identifier() == component.reuse_identifier()
                    && previous.content_type() == component.content_type()
            }
            _ => false,
        };

        if !reusable {
            self.end_display();
            let mut content = component.render_content();
            component.render(&mut *content);
            component.will_display(&mut *content);
            self.content = Some(content);
            self.component = Some(component.clone());
            return SlotRender::Instantiated;
        }

        let (Some(previous), Some(content)) = (&self.component, &mut self.content) else {
            return SlotRender::Skipped;
        };

        let outcome =
            if previous.same_type(component) && !previous.should_render(component, &**content) {
                SlotRender::Skipped
            } else {
                component.render(&mut **content);
                SlotRender::Repainted
            };
        self.component = Some(component.clone());
        outcome
    }

    /// Notifies the shown component that its content left the surface and
    /// drops the content.
    pub fn end_display(&mut self) {
        if let (Some(component), Some(content)) = (&self.component, &mut self.content) {
            component.did_end_display(&mut **content);
        }
        self.content = None;
        self.component = None;
    }

    /// Returns the component last rendered into this slot.
    pub fn component(&self) -> Option<&AnyComponent> {
        self.component.as_ref()
    }

    /// Returns the rendered content if it is a `T`.
    pub fn content<T: 'static>(&self) -> Option<&T> {
        self.content.as_ref()?.downcast_ref::<T>()
    }

    /// Returns `true` if content has been instantiated.
    pub fn is_instantiated(&self) -> bool {
        self.content.is_some()
    }
}

impl fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("component", &self.component)
            .field("instantiated", &self.is_instantiated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    struct Text {
        key: &'static str,
        body: String,
    }

    impl Identifiable for Text {
        type Id = &'static str;
        fn id(&self) -> &'static str {
            self.key
        }
        fn should_content_update(&self, next: &Self) -> bool {
            self.body != next.body
        }
    }

    impl Component for Text {
        type Content = Vec<String>;
        fn render_content(&self) -> Vec<String> {
            Vec::new()
        }
        fn render(&self, content: &mut Vec<String>) {
            content.push(self.body.clone());
        }
    }

    #[derive(Clone, PartialEq, Debug)]
    struct Spacer(u32);

    impl Identifiable for Spacer {
        type Id = &'static str;
        fn id(&self) -> &'static str {
            "a"
        }
        fn should_content_update(&self, next: &Self) -> bool {
            self.0 != next.0
        }
    }

    impl Component for Spacer {
        type Content = u32;
        fn render_content(&self) -> u32 {
            0
        }
        fn render(&self, content: &mut u32) {
            *content = self.0;
        }
    }

    fn text(key: &'static str, body: &str) -> AnyComponent {
        AnyComponent::new(Text {
            key,
            body: body.to_string(),
        })
    }

    #[test]
    fn test_erased_identity_and_content() {
        let a = text("a", "one");
        let b = text("a", "two");
        assert_eq!(a.id(), b.id());
        assert!(a.should_content_update(&b));
        assert!(!a.should_content_update(&a.clone()));
        assert!(!a.should_content_update(&text("a", "one")));
    }

    #[test]
    fn test_different_types_always_differ() {
        let a = text("a", "one");
        let spacer = AnyComponent::new(Spacer(1));
        assert!(a.should_content_update(&spacer));
        // Same underlying id value, different concrete types still equal ids.
        assert_eq!(a.id(), spacer.id());
    }

    #[test]
    fn test_downcast() {
        let a = text("a", "one");
        assert!(a.is::<Text>());
        assert!(!a.is::<Spacer>());
        assert_eq!(a.downcast_ref::<Text>().map(|t| t.body.as_str()), Some("one"));
    }

    #[test]
    fn test_render_rejects_foreign_content() {
        let a = text("a", "one");
        let mut wrong: u32 = 0;
        assert!(!a.render(&mut wrong));
    }

    #[test]
    fn test_slot_state_machine() {
        let mut slot = ComponentSlot::new();
        assert!(!slot.is_instantiated());

        assert_eq!(slot.render(&text("a", "one")), SlotRender::Instantiated);
        assert_eq!(slot.content::<Vec<String>>().map(Vec::len), Some(1));

        // Same content: nothing to paint.
        assert_eq!(slot.render(&text("a", "one")), SlotRender::Skipped);
        assert_eq!(slot.content::<Vec<String>>().map(Vec::len), Some(1));

        assert_eq!(slot.render(&text("a", "two")), SlotRender::Repainted);
        assert_eq!(
            slot.content::<Vec<String>>().and_then(|c| c.last()).map(String::as_str),
            Some("two")
        );

        // Another content type cannot reuse the content.
        assert_eq!(slot.render(&AnyComponent::new(Spacer(9))), SlotRender::Instantiated);
        assert_eq!(slot.content::<u32>(), Some(&9));
    }

    #[test]
    fn test_end_display_clears_slot() {
        let mut slot = ComponentSlot::new();
        slot.render(&text("a", "one"));
        slot.end_display();
        assert!(!slot.is_instantiated());
        assert!(slot.component().is_none());
    }
}
