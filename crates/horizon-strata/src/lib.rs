//! Horizon Strata - declarative rendering for sectioned lists.
//!
//! Describe the whole list as a value (sections holding an optional header,
//! an optional footer and an ordered run of cells) and hand it to a
//! [`Renderer`]. The renderer diffs it against the committed tree by
//! identity, applies the smallest set of inserts, deletes, moves and reloads
//! to the attached [`ListSurface`], and routes interactions raised by
//! rendered elements back to the handlers attached to their [`Node`].
//!
//! # Example
//!
//! ```
//! use horizon_strata::prelude::*;
//!
//! #[derive(Clone, PartialEq, horizon_strata::Identifiable)]
//! #[identifiable(crate = "horizon_strata")]
//! struct Contact {
//!     #[id]
//!     user_id: u64,
//!     name: &'static str,
//! }
//!
//! impl Component for Contact {
//!     type Content = String;
//!
//!     fn render_content(&self) -> String {
//!         String::new()
//!     }
//!
//!     fn render(&self, content: &mut String) {
//!         content.clear();
//!         content.push_str(self.name);
//!     }
//! }
//!
//! let renderer = Renderer::attached(HeadlessSurface::new(), RendererConfig::default());
//!
//! renderer
//!     .render([Section::new("contacts").with_cells([
//!         Contact { user_id: 1, name: "Ada" },
//!         Contact { user_id: 2, name: "Grace" },
//!     ])])
//!     .unwrap();
//!
//! // Grace moves to the top, Ada is renamed.
//! renderer
//!     .render([Section::new("contacts").with_cells([
//!         Contact { user_id: 2, name: "Grace" },
//!         Contact { user_id: 1, name: "Ada L." },
//!     ])])
//!     .unwrap();
//!
//! let name = renderer.with_surface(|s| s.content::<String>(Locator::cell(0, 1)).cloned());
//! assert_eq!(name.flatten().as_deref(), Some("Ada L."));
//! ```
//!
//! # Layout
//!
//! - [`diff`]: the reconciler, turning two trees into an [`EditScript`]
//! - [`adapter`]: commits trees and drives a surface in two batched stages
//! - [`renderer`]: the thread-safe entry point and the action router
//! - [`surface`]: the surface contract and the in-memory [`HeadlessSurface`]

pub mod action;
pub mod adapter;
pub mod component;
pub mod config;
pub mod debug;
pub mod decorator;
pub mod diff;
mod error;
pub mod locator;
pub mod node;
pub mod prelude;
pub mod renderer;
pub mod section;
pub mod surface;

pub use horizon_strata_core::logging;
pub use horizon_strata_core::{
    ComponentId, ConnectionId, Identifiable, PerfSpan, Signal, SignalError,
    TreeFormatOptions, TreeStyle,
};
pub use horizon_strata_macros::Identifiable;

pub use action::{
    ActionContext, ActionEvent, ActionKind, ActionSender, ActionSink, DropReason, Payload,
    RouteOutcome, SelfUpdate,
};
pub use adapter::{Adapter, ApplyMode, ApplySummary};
pub use component::{AnyComponent, Component, ComponentExt, ComponentSlot, SlotRender};
pub use config::{RendererConfig, RowAnimation};
pub use debug::TreeDebug;
pub use decorator::{Decorated, Decoration};
pub use diff::{EditScript, Move, RowChanges, SectionChanges, reconcile};
pub use error::{RenderError, Result};
pub use locator::{FOOTER_ROW, HEADER_ROW, Locator, Slot};
pub use node::{Handler, HandlerTable, IntoNode, Node};
pub use renderer::{Renderer, RendererSignals, WeakRenderer};
pub use section::{AnonymousSection, Section};
pub use surface::{
    DataSource, ElementId, HeadlessSurface, ListSurface, PaintCounts, SurfaceEvent, UpdateBatch,
};
