//! The renderer: public entry point for rendering trees and routing actions.
//!
//! A [`Renderer`] owns an [`Adapter`] behind a mutex and hands every element
//! it renders a weak back-reference to itself, so actions flow straight back
//! from the surface without any broadcast.
//!
//! # Routing
//!
//! One routed event moves through
//! `Dispatched -> Resolved -> SelfUpdate -> HandlersInvoked -> Done`:
//!
//! 1. The source element is located on the surface and the node at that
//!    locator is read. If either step fails the event is dropped.
//! 2. The component is offered a self-update. A replacement whose content
//!    differs is rendered through a full diff; one whose content is equal is
//!    patched into the tree directly.
//! 3. The node at the locator is read again, and every handler registered
//!    for the event's kind runs in registration order.
//!
//! # Reentrancy
//!
//! Handlers and signal slots run with the adapter unlocked and may call
//! [`Renderer::render`]. A render issued while another render pass is still
//! in progress further up the call stack is queued and applied as its own
//! fresh diff as soon as that pass commits. Renders are applied in call
//! order and never merged.
//!
//! Actions are only routed between passes. One sent while a pass is in
//! progress, from paint code or from an `applied` slot, is dropped as
//! [`DropReason::Busy`]: its self-update would otherwise be built from a
//! tree that queued renders are about to replace.
//!
//! Component paint code runs while the adapter is locked. It may call
//! `render` (which is deferred) and send actions, but must not call the
//! other renderer methods.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use horizon_strata_core::logging::{span_names, targets};
use horizon_strata_core::{ComponentId, Signal};
use parking_lot::Mutex;

use crate::action::{
    ActionContext, ActionEvent, ActionSender, ActionSink, DropReason, RouteOutcome, SelfUpdate,
};
use crate::adapter::{Adapter, ApplySummary};
use crate::component::AnyComponent;
use crate::config::RendererConfig;
use crate::debug::TreeDebug;
use crate::error::Result;
use crate::locator::Locator;
use crate::node::{IntoNode, Node};
use crate::section::Section;
use crate::surface::{ElementId, ListSurface};

/// Signals emitted by a [`Renderer`].
///
/// Slots run synchronously, with the adapter unlocked.
#[derive(Debug)]
pub struct RendererSignals {
    /// Emitted after every successful apply.
    pub applied: Signal<ApplySummary>,

    /// Emitted after a slot was patched in place without a diff.
    pub slot_updated: Signal<Locator>,

    /// Emitted for every resolved action, before its handlers run.
    pub action_triggered: Signal<ActionContext>,

    /// Emitted for every dropped action.
    pub action_dropped: Signal<DropReason>,
}

impl Default for RendererSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererSignals {
    /// Creates a new set of renderer signals.
    pub fn new() -> Self {
        Self {
            applied: Signal::new(),
            slot_updated: Signal::new(),
            action_triggered: Signal::new(),
            action_dropped: Signal::new(),
        }
    }
}

struct Shared<S> {
    adapter: Mutex<Adapter<S>>,
    signals: RendererSignals,
    config: RendererConfig,
    in_flight: AtomicBool,
    pending: Mutex<VecDeque<Vec<Section>>>,
}

/// Clears the in-flight flag when a pass ends, even by unwinding.
struct PassGuard<'a>(&'a AtomicBool);

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: ListSurface> Shared<S> {
    fn submit(&self, tree: Vec<Section>) -> Result<()> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                target: targets::APPLY,
                sections = tree.len(),
                "render issued during a pass, deferred"
            );
            self.pending.lock().push_back(tree);
            return Ok(());
        }
        let _pass = PassGuard(&self.in_flight);

        let mut outcome = Ok(());
        let mut next = Some(tree);
        while let Some(tree) = next {
            let applied = self.adapter.lock().apply(tree);
            match applied {
                Ok(summary) => self.signals.applied.emit(summary),
                Err(error) => {
                    if outcome.is_ok() {
                        outcome = Err(error);
                    }
                }
            }
            next = self.pending.lock().pop_front();
        }
        outcome
    }

    fn resolve(&self, event: &ActionEvent) -> std::result::Result<(Locator, Node), DropReason> {
        if self.in_flight.load(Ordering::Acquire) {
            return Err(DropReason::Busy);
        }
        let Some(adapter) = self.adapter.try_lock() else {
            return Err(DropReason::Busy);
        };
        let surface = adapter.surface().ok_or(DropReason::NoSurface)?;
        let locator = surface.locate(event.source).ok_or(DropReason::Detached)?;
        let node = adapter.node(locator).cloned().ok_or(DropReason::NoNode)?;
        Ok((locator, node))
    }

    fn offer_self_update(&self, node: &Node, context: &ActionContext) -> SelfUpdate {
        let Some(replacement) = node.component().self_update(context) else {
            return SelfUpdate::None;
        };
        let at = context.locator();

        if node.component().should_content_update(&replacement) {
            let mut tree = self.adapter.lock().sections().to_vec();
            let Some(slot) = tree
                .get_mut(at.section())
                .and_then(|section| section.slot_mut(at.row()))
            else {
                tracing::debug!(target: targets::ROUTER, %at, "self-update target vanished");
                return SelfUpdate::None;
            };
            *slot = slot.with_component(replacement);
            tracing::debug!(target: targets::ROUTER, %at, "self-update changed content, rendering");
            if let Err(error) = self.submit(tree) {
                tracing::warn!(target: targets::ROUTER, %at, %error, "self-update render failed");
            }
            SelfUpdate::Rerendered
        } else {
            let patched = self.adapter.lock().update_component(replacement, at);
            if !patched {
                tracing::debug!(target: targets::ROUTER, %at, "self-update target vanished");
                return SelfUpdate::None;
            }
            self.signals.slot_updated.emit(at);
            tracing::debug!(target: targets::ROUTER, %at, "self-update patched in place");
            SelfUpdate::Patched
        }
    }

    fn drop_event(&self, event: &ActionEvent, reason: DropReason) -> RouteOutcome {
        tracing::debug!(
            target: targets::ROUTER,
            kind = %event.kind,
            ?reason,
            "dropped action"
        );
        self.signals.action_dropped.emit(reason);
        RouteOutcome::Dropped(reason)
    }
}

impl<S: ListSurface> ActionSink for Shared<S> {
    fn route(&self, event: ActionEvent) -> RouteOutcome {
        let span = tracing::debug_span!(target: targets::ROUTER, span_names::ROUTE, kind = %event.kind);
        let _entered = span.enter();

        let (locator, node) = match self.resolve(&event) {
            Ok(resolved) => resolved,
            Err(reason) => return self.drop_event(&event, reason),
        };

        let context = ActionContext::new(
            event.source,
            node.component().clone(),
            locator,
            event.kind,
            event.payload,
        );
        let self_update = self.offer_self_update(&node, &context);

        let current = self.adapter.lock().node(locator).cloned();
        let Some(current) = current else {
            tracing::debug!(target: targets::ROUTER, %locator, "slot vanished after self-update");
            return RouteOutcome::Handled {
                self_update,
                handlers: 0,
            };
        };
        let context = context.with_component(current.component().clone());

        self.signals.action_triggered.emit(context.clone());

        let handlers = current.handlers(context.kind());
        for handler in &handlers {
            handler(&context);
        }
        tracing::trace!(target: targets::ROUTER, %locator, handlers = handlers.len(), "handled action");

        RouteOutcome::Handled {
            self_update,
            handlers: handlers.len(),
        }
    }
}

/// Renders section trees onto a surface and routes actions back.
///
/// `Renderer` is a cheap handle; clones share one adapter.
///
/// # Example
///
/// ```
/// use horizon_strata::prelude::*;
///
/// #[derive(Clone, PartialEq)]
/// struct Row(&'static str);
///
/// impl Identifiable for Row {
///     type Id = &'static str;
///     fn id(&self) -> &'static str {
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
/// let renderer = Renderer::attached(HeadlessSurface::new(), RendererConfig::default());
/// renderer.render_cells([Row("a"), Row("b")]).unwrap();
/// renderer.render_cells([Row("b"), Row("a")]).unwrap();
///
/// assert_eq!(renderer.lookup_id("a"), Some(Locator::cell(0, 1)));
/// assert_eq!(renderer.with_surface(|s| s.row_count(0)), Some(2));
/// ```
pub struct Renderer<S: ListSurface> {
    shared: Arc<Shared<S>>,
}

impl<S: ListSurface> Clone for Renderer<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: ListSurface> Renderer<S> {
    /// Creates a renderer with no surface.
    pub fn new(config: RendererConfig) -> Self {
        let shared = Arc::new_cyclic(|weak: &Weak<Shared<S>>| {
            let sink: Weak<dyn ActionSink> = weak.clone();
            let mut adapter = Adapter::new(config.clone());
            adapter.set_action_sink(sink);
            Shared {
                adapter: Mutex::new(adapter),
                signals: RendererSignals::new(),
                config,
                in_flight: AtomicBool::new(false),
                pending: Mutex::new(VecDeque::new()),
            }
        });
        Self { shared }
    }

    /// Creates a renderer showing its trees on `surface`.
    pub fn attached(surface: S, config: RendererConfig) -> Self {
        let renderer = Self::new(config);
        renderer.set_surface(surface);
        renderer
    }

    /// Attaches a surface, filling it with the committed tree.
    ///
    /// Returns the previously attached surface.
    pub fn set_surface(&self, surface: S) -> Option<S> {
        self.shared.adapter.lock().set_surface(surface)
    }

    /// Detaches and returns the surface.
    pub fn take_surface(&self) -> Option<S> {
        self.shared.adapter.lock().take_surface()
    }

    /// Renders a new tree.
    ///
    /// Returns once the tree, and any render queued while applying it, has
    /// been committed. Inside a running pass the tree is queued instead and
    /// `Ok(())` is returned immediately.
    pub fn render<I>(&self, sections: I) -> Result<()>
    where
        I: IntoIterator<Item = Section>,
    {
        self.shared.submit(sections.into_iter().collect())
    }

    /// Renders the present sections, skipping `None`.
    pub fn render_sections<I>(&self, sections: I) -> Result<()>
    where
        I: IntoIterator<Item = Option<Section>>,
    {
        self.render(sections.into_iter().flatten())
    }

    /// Renders a single anonymous section holding `cells`.
    pub fn render_cells<I>(&self, cells: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: IntoNode,
    {
        self.render([Section::anonymous().with_cells(cells)])
    }

    /// A snapshot of the committed tree.
    pub fn data(&self) -> Vec<Section> {
        self.shared.adapter.lock().sections().to_vec()
    }

    /// Finds the current locator of a component id.
    pub fn lookup(&self, id: &ComponentId) -> Option<Locator> {
        self.shared.adapter.lock().lookup(id)
    }

    /// Finds the current locator of a raw id value.
    pub fn lookup_id<I>(&self, id: I) -> Option<Locator>
    where
        I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        self.shared.adapter.lock().lookup_id(id)
    }

    /// The node at `at`.
    pub fn node(&self, at: Locator) -> Option<Node> {
        self.shared.adapter.lock().node(at).cloned()
    }

    /// The component at `at`.
    pub fn component(&self, at: Locator) -> Option<AnyComponent> {
        self.shared.adapter.lock().component(at).cloned()
    }

    /// Patches the component at `at` in place, keeping its handlers, and
    /// repaints that slot.
    ///
    /// No diff runs. Returns `false` if `at` holds no node.
    pub fn update_component(&self, component: impl Into<AnyComponent>, at: Locator) -> bool {
        let patched = self
            .shared
            .adapter
            .lock()
            .update_component(component.into(), at);
        if patched {
            self.shared.signals.slot_updated.emit(at);
        }
        patched
    }

    /// Replaces the node at `at` in place and repaints that slot.
    pub fn update_node(&self, node: impl IntoNode, at: Locator) -> bool {
        let patched = self.shared.adapter.lock().update_node(node.into_node(), at);
        if patched {
            self.shared.signals.slot_updated.emit(at);
        }
        patched
    }

    /// Inserts one cell and mirrors it onto the surface.
    pub fn insert(&self, node: impl IntoNode, at: Locator) -> Result<bool> {
        self.shared.adapter.lock().insert(node.into_node(), at)
    }

    /// Removes one cell and mirrors it onto the surface.
    pub fn remove(&self, at: Locator) -> Result<Option<Node>> {
        self.shared.adapter.lock().remove(at)
    }

    /// Rebuilds the whole surface from the committed tree.
    pub fn reload(&self) -> Result<()> {
        self.shared.adapter.lock().reload()
    }

    /// Runs `f` with the attached surface.
    ///
    /// `f` runs with the adapter locked and must not call back into the
    /// renderer.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        self.shared.adapter.lock().surface().map(f)
    }

    /// Runs `f` with the attached surface, mutably.
    ///
    /// `f` runs with the adapter locked and must not call back into the
    /// renderer.
    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        self.shared.adapter.lock().surface_mut().map(f)
    }

    /// The renderer's signals.
    pub fn signals(&self) -> &RendererSignals {
        &self.shared.signals
    }

    /// The configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.shared.config
    }

    /// Routes an action as if `event.source` had sent it.
    pub fn route(&self, event: ActionEvent) -> RouteOutcome {
        self.shared.route(event)
    }

    /// A sender routing actions of `element` to this renderer.
    pub fn sender(&self, element: ElementId) -> ActionSender {
        let sink: Weak<dyn ActionSink> = Arc::downgrade(&self.shared) as Weak<dyn ActionSink>;
        ActionSender::new(element, sink)
    }

    /// Returns `true` after an integrity violation halted the renderer.
    pub fn is_poisoned(&self) -> bool {
        self.shared.adapter.lock().is_poisoned()
    }

    /// Returns `true` while a render pass is running.
    pub fn is_rendering(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    /// Formats the committed tree for debugging.
    pub fn dump_tree(&self) -> String {
        TreeDebug::new(self.shared.adapter.lock().sections()).to_string()
    }

    /// A weak handle, for storing in handlers and slots without a cycle.
    pub fn downgrade(&self) -> WeakRenderer<S> {
        WeakRenderer {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl<S: ListSurface> fmt::Debug for Renderer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("config", &self.shared.config)
            .field("rendering", &self.is_rendering())
            .finish_non_exhaustive()
    }
}

/// A non-owning [`Renderer`] handle.
pub struct WeakRenderer<S: ListSurface> {
    shared: Weak<Shared<S>>,
}

impl<S: ListSurface> WeakRenderer<S> {
    /// Returns the renderer if it is still alive.
    pub fn upgrade(&self) -> Option<Renderer<S>> {
        self.shared.upgrade().map(|shared| Renderer { shared })
    }
}

impl<S: ListSurface> Clone for WeakRenderer<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

static_assertions::assert_impl_all!(Renderer<crate::surface::HeadlessSurface>: Send, Sync);
static_assertions::assert_impl_all!(WeakRenderer<crate::surface::HeadlessSurface>: Send, Sync);
