//! Decorations: value wrappers that adjust how a component is shown.
//!
//! A [`Decorated`] component forwards its identity to the wrapped component
//! and folds its own configuration into the content comparison, so changing
//! only the decoration still reaches the diff as a reload.

use std::any::Any;

use horizon_strata_core::Identifiable;

use crate::action::ActionContext;
use crate::component::Component;

/// Configuration a [`Decorated`] component applies around its inner one.
pub trait Decoration: PartialEq + Clone + Send + Sync + 'static {
    /// Adjusts `content` before the inner component paints it.
    fn prepare(&self, _content: &mut dyn Any) {}
}

/// A component wrapped in a decoration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorated<C, D> {
    inner: C,
    decoration: D,
}

impl<C: Component, D: Decoration> Decorated<C, D> {
    /// Wraps `inner`.
    pub fn new(inner: C, decoration: D) -> Self {
        Self { inner, decoration }
    }

    /// The wrapped component.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// The decoration.
    pub fn decoration(&self) -> &D {
        &self.decoration
    }

    /// Unwraps the inner component.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Component, D: Decoration> Identifiable for Decorated<C, D> {
    type Id = C::Id;

    fn id(&self) -> C::Id {
        self.inner.id()
    }

    fn should_content_update(&self, next: &Self) -> bool {
        self.decoration != next.decoration || self.inner.should_content_update(&next.inner)
    }
}

impl<C: Component, D: Decoration> Component for Decorated<C, D> {
    type Content = C::Content;

    fn render_content(&self) -> C::Content {
        self.inner.render_content()
    }

    fn render(&self, content: &mut C::Content) {
        self.decoration.prepare(content);
        self.inner.render(content);
    }

    fn should_render(&self, next: &Self, content: &C::Content) -> bool {
        self.decoration != next.decoration || self.inner.should_render(&next.inner, content)
    }

    fn reuse_identifier(&self) -> &'static str {
        self.inner.reuse_identifier()
    }

    fn self_update(&self, context: &ActionContext) -> Option<Self> {
        self.inner
            .self_update(context)
            .map(|inner| Self::new(inner, self.decoration.clone()))
    }

    fn content_will_display(&self, content: &mut C::Content) {
        self.inner.content_will_display(content);
    }

    fn content_did_end_display(&self, content: &mut C::Content) {
        self.inner.content_did_end_display(content);
    }
}
