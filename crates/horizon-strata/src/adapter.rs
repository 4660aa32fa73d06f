//! The adapter: owner of the committed tree and driver of the surface.
//!
//! [`Adapter::apply`] reconciles the committed tree against a new one and
//! executes the edit script on the surface in two stages:
//!
//! 1. Section edits. The adapter commits an intermediate tree holding the new
//!    section order, where matched sections still carry their old cells,
//!    header and footer, and inserted sections carry their new content. One
//!    batch with the section edits brings the surface to that state.
//! 2. Row edits. The adapter commits the new tree and sends one batch with
//!    every section's row edits and the header/footer reloads.
//!
//! The surface pulls nodes from the committed tree while it applies a batch,
//! so every intermediate state it sees is consistent. After both stages the
//! surface counts are checked against the tree; a mismatch poisons the
//! adapter.

use std::fmt;
use std::hash::Hash;
use std::sync::Weak;

use horizon_strata_core::logging::{span_names, targets};
use horizon_strata_core::{ComponentId, PerfSpan};

use crate::action::{ActionSender, ActionSink, unowned_sink};
use crate::component::AnyComponent;
use crate::config::RendererConfig;
use crate::diff::{EditScript, RowChanges, reconcile};
use crate::error::{RenderError, Result};
use crate::locator::{Locator, Slot};
use crate::node::Node;
use crate::section::Section;
use crate::surface::{DataSource, ElementId, ListSurface, UpdateBatch};

/// How an apply reached the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyMode {
    /// The trees were equivalent; only the committed nodes were swapped.
    Unchanged,
    /// No surface is attached; only the tree was committed.
    TreeOnly,
    /// The script was sent as batched updates.
    Batched,
    /// The script was too large and the surface was fully reloaded.
    Reloaded,
}

/// Result of one successful apply.
#[derive(Debug, Clone)]
pub struct ApplySummary {
    /// The reconciled edit script.
    pub script: EditScript,
    /// How the script reached the surface.
    pub mode: ApplyMode,
    /// Sections in the committed tree.
    pub sections: usize,
    /// Cells in the committed tree.
    pub rows: usize,
}

/// The tree as seen by a surface mid-batch.
struct TreeSource<'a> {
    sections: &'a [Section],
    sink: &'a Weak<dyn ActionSink>,
}

impl DataSource for TreeSource<'_> {
    fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn row_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, Section::cell_count)
    }

    fn node(&self, at: Locator) -> Option<&Node> {
        self.sections.get(at.section())?.slot(at.row())
    }

    fn action_sender(&self, element: ElementId) -> ActionSender {
        ActionSender::new(element, self.sink.clone())
    }
}

/// Owns the committed tree and, optionally, the surface it is shown on.
pub struct Adapter<S> {
    sections: Vec<Section>,
    surface: Option<S>,
    sink: Weak<dyn ActionSink>,
    config: RendererConfig,
    poisoned: bool,
}

impl<S: ListSurface> Adapter<S> {
    /// Creates an adapter with an empty tree and no surface.
    ///
    /// Elements it renders route actions nowhere until
    /// [`set_action_sink`](Self::set_action_sink) is called.
    pub fn new(config: RendererConfig) -> Self {
        Self {
            sections: Vec::new(),
            surface: None,
            sink: unowned_sink(),
            config,
            poisoned: false,
        }
    }

    /// Sets where elements rendered from now on send their actions.
    pub fn set_action_sink(&mut self, sink: Weak<dyn ActionSink>) {
        self.sink = sink;
    }

    /// The configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Attaches a surface and fills it with the committed tree.
    ///
    /// Returns the previously attached surface.
    pub fn set_surface(&mut self, surface: S) -> Option<S> {
        let previous = self.surface.replace(surface);
        if let Some(surface) = self.surface.as_mut() {
            let source = TreeSource {
                sections: &self.sections,
                sink: &self.sink,
            };
            surface.reload_data(&source);
        }
        previous
    }

    /// Detaches and returns the surface.
    pub fn take_surface(&mut self) -> Option<S> {
        self.surface.take()
    }

    /// The attached surface.
    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    /// The attached surface, mutably.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// Returns `true` after an integrity violation.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// The committed tree.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// The section at `index`.
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// The cells of the section at `index`.
    pub fn cells(&self, section: usize) -> Option<&[Node]> {
        self.sections.get(section).map(Section::cells)
    }

    /// Finds the current locator of a component id.
    ///
    /// Cells are searched first, then headers and footers.
    pub fn lookup(&self, id: &ComponentId) -> Option<Locator> {
        for (index, section) in self.sections.iter().enumerate() {
            if let Some(row) = section.cells().iter().position(|node| node.id() == *id) {
                return Some(Locator::cell(index, row));
            }
        }
        for (index, section) in self.sections.iter().enumerate() {
            if section.header().is_some_and(|node| node.id() == *id) {
                return Some(Locator::header(index));
            }
            if section.footer().is_some_and(|node| node.id() == *id) {
                return Some(Locator::footer(index));
            }
        }
        None
    }

    /// Finds the current locator of a raw id value.
    pub fn lookup_id<I>(&self, id: I) -> Option<Locator>
    where
        I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        self.lookup(&ComponentId::new(id))
    }

    /// The node at `at`.
    pub fn node(&self, at: Locator) -> Option<&Node> {
        self.sections.get(at.section())?.slot(at.row())
    }

    /// The component at `at`.
    pub fn component(&self, at: Locator) -> Option<&AnyComponent> {
        self.node(at).map(Node::component)
    }

    /// Replaces the component at `at`, keeping the slot's handlers, and
    /// repaints that slot.
    ///
    /// No diff runs. The slot's content decides through
    /// [`Component::should_render`](crate::Component::should_render) whether
    /// the repaint actually paints. Returns `false` if `at` holds no node.
    pub fn update_component(&mut self, component: AnyComponent, at: Locator) -> bool {
        let Some(node) = self.node_mut(at) else {
            return false;
        };
        *node = node.with_component(component);
        tracing::trace!(target: targets::APPLY, %at, "patched component");
        self.repaint(at);
        true
    }

    /// Replaces the node at `at` and repaints that slot.
    ///
    /// Returns `false` if `at` holds no node.
    pub fn update_node(&mut self, node: Node, at: Locator) -> bool {
        let Some(slot) = self.node_mut(at) else {
            return false;
        };
        *slot = node;
        tracing::trace!(target: targets::APPLY, %at, "patched node");
        self.repaint(at);
        true
    }

    /// Inserts a cell at `at` and mirrors the insert onto the surface.
    ///
    /// Returns `Ok(false)` if `at` is not a cell locator within one past
    /// the section's last row.
    pub fn insert(&mut self, node: Node, at: Locator) -> Result<bool> {
        self.ensure_healthy()?;
        let Some(row) = at.cell_row() else {
            return Ok(false);
        };
        let Some(section) = self.sections.get_mut(at.section()) else {
            return Ok(false);
        };
        if row > section.cell_count() {
            return Ok(false);
        }
        section.cells_mut().insert(row, node);

        let changes = RowChanges {
            section: at.section(),
            old_section: at.section(),
            inserted: vec![row],
            ..RowChanges::default()
        };
        self.send_rows(vec![changes], Vec::new());
        self.verify()?;
        Ok(true)
    }

    /// Removes the cell at `at` and mirrors the delete onto the surface.
    ///
    /// Returns `Ok(None)` if `at` holds no cell.
    pub fn remove(&mut self, at: Locator) -> Result<Option<Node>> {
        self.ensure_healthy()?;
        let (Some(row), Some(section)) = (at.cell_row(), self.sections.get_mut(at.section()))
        else {
            return Ok(None);
        };
        if row >= section.cell_count() {
            return Ok(None);
        }
        let node = section.cells_mut().remove(row);

        let changes = RowChanges {
            section: at.section(),
            old_section: at.section(),
            deleted: vec![row],
            ..RowChanges::default()
        };
        self.send_rows(vec![changes], Vec::new());
        self.verify()?;
        Ok(Some(node))
    }

    /// Rebuilds every element of the surface from the committed tree.
    pub fn reload(&mut self) -> Result<()> {
        self.ensure_healthy()?;
        if self.surface.is_none() {
            return Err(RenderError::NoSurface);
        }
        self.reload_surface();
        self.verify()
    }

    /// Repaints the slot at `at` on the surface without a diff.
    pub fn repaint(&mut self, at: Locator) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        let source = TreeSource {
            sections: &self.sections,
            sink: &self.sink,
        };
        surface.repaint(at, &source)
    }

    /// Reconciles the committed tree against `tree` and applies the result.
    pub fn apply(&mut self, tree: Vec<Section>) -> Result<ApplySummary> {
        self.ensure_healthy()?;
        let _perf = PerfSpan::new(span_names::APPLY);

        let script = reconcile(&self.sections, &tree);
        let mode = if script.is_empty() {
            self.sections = tree;
            ApplyMode::Unchanged
        } else if self.surface.is_none() {
            self.sections = tree;
            ApplyMode::TreeOnly
        } else if script.change_count() > self.config.animatable_change_count {
            tracing::debug!(
                target: targets::APPLY,
                changes = script.change_count(),
                limit = self.config.animatable_change_count,
                "edit script too large, reloading surface"
            );
            self.sections = tree;
            self.reload_surface();
            ApplyMode::Reloaded
        } else {
            self.perform_staged(&script, tree);
            ApplyMode::Batched
        };

        self.verify()?;

        let summary = ApplySummary {
            mode,
            sections: self.sections.len(),
            rows: self.sections.iter().map(Section::cell_count).sum(),
            script,
        };
        tracing::debug!(
            target: targets::APPLY,
            mode = ?summary.mode,
            sections = summary.sections,
            rows = summary.rows,
            changes = summary.script.change_count(),
            "applied tree"
        );
        Ok(summary)
    }

    fn perform_staged(&mut self, script: &EditScript, tree: Vec<Section>) {
        if !script.sections.is_empty() {
            let staged = tree
                .iter()
                .enumerate()
                .map(|(index, section)| match script.source_section(index) {
                    Some(old) => self.sections[old].clone(),
                    None => section.clone(),
                })
                .collect();
            self.sections = staged;

            let mut batch = self.batch();
            batch.sections = script.sections.clone();
            self.send(&batch);
        }

        self.sections = tree;

        let mut rows = script.rows.clone();
        let mut repaints = Vec::new();
        if self.config.skip_reload_components {
            for changes in &mut rows {
                let section = changes.section;
                repaints.extend(
                    changes
                        .reloaded
                        .drain(..)
                        .map(|row| Locator::cell(section, row)),
                );
            }
            rows.retain(|changes| !changes.is_empty());
        }
        self.send_rows(rows, script.slot_reloads.clone());

        for at in repaints {
            self.repaint(at);
        }
    }

    fn send_rows(&mut self, rows: Vec<RowChanges>, slot_reloads: Vec<Locator>) {
        if rows.is_empty() && slot_reloads.is_empty() {
            return;
        }
        let mut batch = self.batch();
        batch.rows = rows;
        batch.slot_reloads = slot_reloads;
        self.send(&batch);
    }

    fn batch(&self) -> UpdateBatch {
        UpdateBatch::new(self.config.animated, self.config.row_animation)
    }

    fn send(&mut self, batch: &UpdateBatch) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        tracing::trace!(target: targets::SURFACE, edits = batch.len(), "performing batch");
        let source = TreeSource {
            sections: &self.sections,
            sink: &self.sink,
        };
        surface.perform_batch(batch, &source);
    }

    fn reload_surface(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            let source = TreeSource {
                sections: &self.sections,
                sink: &self.sink,
            };
            surface.reload_data(&source);
        }
    }

    fn node_mut(&mut self, at: Locator) -> Option<&mut Node> {
        if matches!(at.slot(), Slot::Invalid) {
            return None;
        }
        self.sections.get_mut(at.section())?.slot_mut(at.row())
    }

    fn ensure_healthy(&self) -> Result<()> {
        if self.poisoned {
            Err(RenderError::Poisoned)
        } else {
            Ok(())
        }
    }

    fn verify(&mut self) -> Result<()> {
        if !self.config.verify_integrity {
            return Ok(());
        }
        let Some(surface) = self.surface.as_ref() else {
            return Ok(());
        };

        let error = if surface.section_count() != self.sections.len() {
            Some(RenderError::SectionCountMismatch {
                expected: self.sections.len(),
                actual: surface.section_count(),
            })
        } else {
            self.sections
                .iter()
                .enumerate()
                .find(|(index, section)| surface.row_count(*index) != section.cell_count())
                .map(|(index, section)| RenderError::RowCountMismatch {
                    section: index,
                    expected: section.cell_count(),
                    actual: surface.row_count(index),
                })
        };

        match error {
            Some(error) => {
                tracing::error!(target: targets::APPLY, %error, "surface integrity violated");
                self.poisoned = true;
                Err(error)
            }
            None => Ok(()),
        }
    }
}

impl<S: ListSurface> DataSource for Adapter<S> {
    fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn row_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, Section::cell_count)
    }

    fn node(&self, at: Locator) -> Option<&Node> {
        Adapter::node(self, at)
    }

    fn action_sender(&self, element: ElementId) -> ActionSender {
        ActionSender::new(element, self.sink.clone())
    }
}

impl<S> fmt::Debug for Adapter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("sections", &self.sections.len())
            .field("surface", &self.surface.is_some())
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
