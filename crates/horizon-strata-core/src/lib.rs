//! Core contracts for Horizon Strata.
//!
//! This crate provides the foundational pieces the list reconciler is built on:
//!
//! - **Identity & Equality**: the [`Identifiable`] contract and the
//!   type-erased [`ComponentId`] every diff is keyed by
//! - **Signal/Slot System**: synchronous change notifications
//! - **Logging**: tracing targets, span names, and performance spans
//!
//! # Identity Example
//!
//! ```
//! use horizon_strata_core::{ComponentId, Identifiable};
//!
//! #[derive(Clone, PartialEq)]
//! struct Contact {
//!     user_id: u64,
//!     name: String,
//! }
//!
//! impl Identifiable for Contact {
//!     type Id = u64;
//!
//!     fn id(&self) -> u64 {
//!         self.user_id
//!     }
//!
//!     fn should_content_update(&self, next: &Self) -> bool {
//!         self.name != next.name
//!     }
//! }
//!
//! let before = Contact { user_id: 7, name: "Ada".into() };
//! let after = Contact { user_id: 7, name: "Ada L.".into() };
//!
//! // Same logical item, different content.
//! assert_eq!(ComponentId::of(&before), ComponentId::of(&after));
//! assert!(before.should_content_update(&after));
//! ```
//!
//! # Signal Example
//!
//! ```
//! use horizon_strata_core::Signal;
//!
//! let rows_changed = Signal::<(usize, usize)>::new();
//! rows_changed.connect(|(section, count)| {
//!     println!("section {} now has {} rows", section, count);
//! });
//! rows_changed.emit((0, 12));
//! ```

mod error;
pub mod identity;
pub mod logging;
pub mod signal;

pub use error::{Result, SignalError};
pub use identity::{ComponentId, Identifiable};
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionId, Signal};

#[doc(hidden)]
pub use tracing;
