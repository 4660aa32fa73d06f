//! Prelude module for Horizon Strata.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_strata::prelude::*;
//! ```
//!
//! This provides access to:
//! - Identity (`Identifiable`, `ComponentId`)
//! - Components and nodes (`Component`, `Node`, `Section`)
//! - The renderer and its configuration (`Renderer`, `RendererConfig`)
//! - Actions (`ActionKind`, `ActionContext`, `RouteOutcome`)
//! - Surfaces (`ListSurface`, `HeadlessSurface`)

// ============================================================================
// Identity
// ============================================================================

pub use horizon_strata_core::{ComponentId, Identifiable};

// ============================================================================
// Components and Tree Structure
// ============================================================================

pub use crate::component::{AnyComponent, Component, ComponentExt};
pub use crate::decorator::{Decorated, Decoration};
pub use crate::locator::{Locator, Slot};
pub use crate::node::{IntoNode, Node};
pub use crate::section::Section;

// ============================================================================
// Rendering
// ============================================================================

pub use crate::config::{RendererConfig, RowAnimation};
pub use crate::error::RenderError;
pub use crate::renderer::{Renderer, WeakRenderer};

// ============================================================================
// Actions
// ============================================================================

pub use crate::action::{ActionContext, ActionKind, DropReason, RouteOutcome, SelfUpdate};

// ============================================================================
// Surfaces
// ============================================================================

pub use crate::surface::{DataSource, HeadlessSurface, ListSurface};
