//! The display-surface contract.
//!
//! A [`ListSurface`] is the stateful table or grid a tree is rendered onto.
//! The engine drives it through full reloads and batched updates and reads
//! its section and row counts back for consistency checks. While a surface
//! applies a batch it pulls the nodes it needs from a [`DataSource`] that
//! already reflects the batch's target state.
//!
//! # Batch order
//!
//! An [`UpdateBatch`] is applied as if its operations ran sequentially in
//! this order, so index arithmetic never invalidates a pending edit:
//!
//! 1. section deletes and move sources, removed by descending old index
//! 2. section inserts and move targets, placed by ascending new index
//! 3. per section: row deletes and move sources by descending old index,
//!    then row inserts and move targets by ascending new index
//! 4. row reloads, then header/footer reloads, at their new locators
//!
//! [`HeadlessSurface`] is the in-memory reference implementation.

mod headless;

pub use headless::{HeadlessSurface, PaintCounts, SurfaceEvent};

use crate::action::ActionSender;
use crate::config::RowAnimation;
use crate::diff::{RowChanges, SectionChanges};
use crate::locator::Locator;
use crate::node::Node;

slotmap::new_key_type! {
    /// Identifies one visual element a surface created.
    pub struct ElementId;
}

/// Read access to the tree a surface is being brought in line with.
pub trait DataSource {
    /// Number of sections.
    fn section_count(&self) -> usize;

    /// Number of cells in `section`, or zero if out of range.
    fn row_count(&self, section: usize) -> usize;

    /// The node at `at`, if any.
    fn node(&self, at: Locator) -> Option<&Node>;

    /// A sender routing `element`'s actions to the owning renderer.
    fn action_sender(&self, element: ElementId) -> ActionSender;
}

/// A stateful sectioned list display.
pub trait ListSurface: Send + 'static {
    /// Number of sections currently displayed.
    fn section_count(&self) -> usize;

    /// Number of rows currently displayed in `section`.
    fn row_count(&self, section: usize) -> usize;

    /// Discards all elements and rebuilds them from `source`.
    fn reload_data(&mut self, source: &dyn DataSource);

    /// Applies one batch in the documented order.
    fn perform_batch(&mut self, batch: &UpdateBatch, source: &dyn DataSource);

    /// Resolves an element to its current locator.
    fn locate(&self, element: ElementId) -> Option<Locator>;

    /// Repaints the element at `at` from `source`. Returns `false` if no
    /// element is displayed there.
    fn repaint(&mut self, at: Locator, source: &dyn DataSource) -> bool;
}

/// One batched surface update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    /// Section-level edits.
    pub sections: SectionChanges,
    /// Row edits per section, addressed by new section index.
    pub rows: Vec<RowChanges>,
    /// Header and footer reloads.
    pub slot_reloads: Vec<Locator>,
    /// Whether the surface should animate.
    pub animated: bool,
    /// Row animation hint.
    pub animation: RowAnimation,
}

impl UpdateBatch {
    /// Creates an empty batch.
    pub fn new(animated: bool, animation: RowAnimation) -> Self {
        Self {
            animated,
            animation,
            ..Self::default()
        }
    }

    /// Returns `true` if the batch carries no edits.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
            && self.rows.iter().all(RowChanges::is_empty)
            && self.slot_reloads.is_empty()
    }

    /// Returns the number of edits in the batch.
    pub fn len(&self) -> usize {
        self.sections.len()
            + self.rows.iter().map(RowChanges::len).sum::<usize>()
            + self.slot_reloads.len()
    }
}
