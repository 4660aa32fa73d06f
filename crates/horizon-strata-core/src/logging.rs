//! Logging and debugging facilities for Horizon Strata.
//!
//! This module provides:
//! - Target and span names for the `tracing` integration
//! - Formatting options shared by the tree debug printers
//! - [`PerfSpan`], a guard that times a block under the `perf` target
//!
//! # Tracing Integration
//!
//! Horizon Strata uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_strata::reconcile=debug")
//!     .init();
//! ```
//!
//! Diff summaries are logged at `debug`, individual operations at `trace`,
//! dropped action events at `debug`, duplicate ids at `warn`, and integrity
//! violations at `error`.

/// Span names used throughout Horizon Strata for tracing.
pub mod span_names {
    /// Diff computation span.
    pub const RECONCILE: &str = "horizon_strata::reconcile";
    /// Edit script application span.
    pub const APPLY: &str = "horizon_strata::apply";
    /// Action routing span.
    pub const ROUTE: &str = "horizon_strata::route";
}

/// `tracing` targets, one per subsystem, usable in `RUST_LOG` directives.
pub mod targets {
    /// Signal emission.
    pub const SIGNAL: &str = "horizon_strata_core::signal";
    /// Reconciler (diff engine) target.
    pub const RECONCILE: &str = "horizon_strata::reconcile";
    /// Adapter / applier target.
    pub const APPLY: &str = "horizon_strata::apply";
    /// Action router target.
    pub const ROUTER: &str = "horizon_strata::router";
    /// Display surface target.
    pub const SURFACE: &str = "horizon_strata::surface";
    /// Performance spans target.
    pub const PERF: &str = "horizon_strata::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// `|`, `+--` and `` `-- `` branches.
    Ascii,
    /// Box-drawing branches.
    #[default]
    Unicode,
    /// Dashes only, no vertical rules.
    Compact,
}

impl TreeStyle {
    /// Returns the `(branch, tee, corner)` glyphs for this style.
    pub fn glyphs(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Self::Ascii => ("|", "+--", "`--"),
            Self::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            Self::Compact => ("", "-", "-"),
        }
    }
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// Branch glyphs.
    pub style: TreeStyle,
    /// Whether to show component ids.
    pub show_ids: bool,
    /// Whether to show component type names.
    pub show_types: bool,
    /// Maximum number of sections to print (None for unlimited).
    pub max_sections: Option<usize>,
    /// Columns per nesting level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_types: true,
            max_sections: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Ids but no type names.
    pub fn minimal() -> Self {
        Self {
            show_types: false,
            ..Default::default()
        }
    }

    /// Set the tree style.
    pub fn with_style(mut self, style: TreeStyle) -> Self {
        self.style = style;
        self
    }

    /// Limit the number of sections printed.
    pub fn with_max_sections(mut self, max: usize) -> Self {
        self.max_sections = Some(max);
        self
    }
}

/// Keeps a `perf` span entered until dropped, so subscribers that record
/// span timings see how long the enclosing block took.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enters a span named after `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
