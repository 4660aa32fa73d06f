//! In-memory reference surface.

use std::collections::HashMap;

use horizon_strata_core::ComponentId;
use horizon_strata_core::logging::targets;
use slotmap::SlotMap;

use super::{DataSource, ElementId, ListSurface, UpdateBatch};
use crate::action::ActionSender;
use crate::component::{AnyComponent, ComponentSlot, SlotRender};
use crate::diff::{RowChanges, SectionChanges};
use crate::locator::{Locator, Slot};
use crate::node::Node;

/// Something a [`HeadlessSurface`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// All elements were rebuilt.
    ReloadData {
        /// Sections after the reload.
        sections: usize,
    },
    /// A batch was applied.
    Batch(UpdateBatch),
    /// One element was repainted outside a batch.
    Repaint(Locator),
}

/// Running totals of slot renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintCounts {
    /// Content instantiated for new or re-typed elements.
    pub instantiated: usize,
    /// Existing content repainted.
    pub repainted: usize,
    /// Renders skipped because nothing changed.
    pub skipped: usize,
}

impl PaintCounts {
    fn record(&mut self, render: SlotRender) {
        match render {
            SlotRender::Instantiated => self.instantiated += 1,
            SlotRender::Repainted => self.repainted += 1,
            SlotRender::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Debug)]
struct Element {
    slot: ComponentSlot,
    sender: ActionSender,
    locator: Locator,
}

#[derive(Debug, Default)]
struct SectionElements {
    header: Option<ElementId>,
    footer: Option<ElementId>,
    rows: Vec<ElementId>,
}

/// A [`ListSurface`] that keeps its elements in memory.
///
/// It behaves like a strict table widget: a batch that addresses a missing
/// index, or leaves counts that disagree with the data source, panics with
/// an "invalid update" message. Every element owns a [`ComponentSlot`] and
/// an [`ActionSender`], so actions can be raised from it exactly as a real
/// cell would.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    elements: SlotMap<ElementId, Element>,
    sections: Vec<SectionElements>,
    events: Vec<SurfaceEvent>,
    counts: PaintCounts,
}

impl HeadlessSurface {
    /// Creates an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// The element displayed at `at`.
    pub fn element_at(&self, at: Locator) -> Option<ElementId> {
        let section = self.sections.get(at.section())?;
        match at.slot() {
            Slot::Header => section.header,
            Slot::Footer => section.footer,
            Slot::Cell(row) => section.rows.get(row).copied(),
            Slot::Invalid => None,
        }
    }

    /// The action sender of `element`.
    pub fn sender(&self, element: ElementId) -> Option<ActionSender> {
        self.elements.get(element).map(|e| e.sender.clone())
    }

    /// The action sender of the element at `at`.
    pub fn sender_at(&self, at: Locator) -> Option<ActionSender> {
        self.sender(self.element_at(at)?)
    }

    /// The component last painted at `at`.
    pub fn component_at(&self, at: Locator) -> Option<&AnyComponent> {
        self.elements.get(self.element_at(at)?)?.slot.component()
    }

    /// The rendered content at `at`, if it is a `T`.
    pub fn content<T: 'static>(&self, at: Locator) -> Option<&T> {
        self.elements.get(self.element_at(at)?)?.slot.content::<T>()
    }

    /// Ids of the components painted in `section`'s rows, in display order.
    pub fn rendered_ids(&self, section: usize) -> Vec<ComponentId> {
        let Some(section) = self.sections.get(section) else {
            return Vec::new();
        };
        section
            .rows
            .iter()
            .filter_map(|&id| self.elements.get(id)?.slot.component().map(AnyComponent::id))
            .collect()
    }

    /// Returns `true` if `section` displays a header.
    pub fn has_header(&self, section: usize) -> bool {
        self.sections.get(section).is_some_and(|s| s.header.is_some())
    }

    /// Returns `true` if `section` displays a footer.
    pub fn has_footer(&self, section: usize) -> bool {
        self.sections.get(section).is_some_and(|s| s.footer.is_some())
    }

    /// Number of live elements, headers and footers included.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Everything the surface did, oldest first.
    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    /// Drains the event log.
    pub fn take_events(&mut self) -> Vec<SurfaceEvent> {
        std::mem::take(&mut self.events)
    }

    /// The batches applied so far.
    pub fn batches(&self) -> impl Iterator<Item = &UpdateBatch> {
        self.events.iter().filter_map(|event| match event {
            SurfaceEvent::Batch(batch) => Some(batch),
            _ => None,
        })
    }

    /// Render totals since creation.
    pub fn paint_counts(&self) -> PaintCounts {
        self.counts
    }

    fn create(&mut self, at: Locator, node: &Node, source: &dyn DataSource) -> ElementId {
        let id = self.elements.insert_with_key(|key| Element {
            slot: ComponentSlot::new(),
            sender: source.action_sender(key),
            locator: at,
        });
        self.paint(id, node.component());
        id
    }

    fn paint(&mut self, id: ElementId, component: &AnyComponent) {
        if let Some(element) = self.elements.get_mut(id) {
            let render = element.slot.render(component);
            tracing::trace!(
                target: targets::SURFACE,
                at = %element.locator,
                ?render,
                "painted element"
            );
            self.counts.record(render);
        }
    }

    fn discard(&mut self, id: ElementId) {
        if let Some(mut element) = self.elements.remove(id) {
            element.slot.end_display();
        }
    }

    fn discard_section(&mut self, section: SectionElements) {
        for id in section
            .header
            .into_iter()
            .chain(section.footer)
            .chain(section.rows)
        {
            self.discard(id);
        }
    }

    fn build_section(&mut self, index: usize, source: &dyn DataSource) -> SectionElements {
        let mut section = SectionElements::default();
        if let Some(node) = source.node(Locator::header(index)) {
            section.header = Some(self.create(Locator::header(index), node, source));
        }
        for row in 0..source.row_count(index) {
            let at = Locator::cell(index, row);
            let node = source
                .node(at)
                .unwrap_or_else(|| panic!("invalid update: data source has no node at {at}"));
            section.rows.push(self.create(at, node, source));
        }
        if let Some(node) = source.node(Locator::footer(index)) {
            section.footer = Some(self.create(Locator::footer(index), node, source));
        }
        section
    }

    fn apply_section_changes(&mut self, changes: &SectionChanges, source: &dyn DataSource) {
        let mut removals: Vec<(usize, bool)> = changes
            .deleted
            .iter()
            .map(|&index| (index, false))
            .chain(changes.moved.iter().map(|m| (m.from, true)))
            .collect();
        removals.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        let mut detached = HashMap::new();
        for (index, keep) in removals {
            assert!(
                index < self.sections.len(),
                "invalid update: section {index} out of range ({} sections)",
                self.sections.len()
            );
            let section = self.sections.remove(index);
            if keep {
                detached.insert(index, section);
            } else {
                self.discard_section(section);
            }
        }

        let mut placements: Vec<(usize, Option<usize>)> = changes
            .inserted
            .iter()
            .map(|&index| (index, None))
            .chain(changes.moved.iter().map(|m| (m.to, Some(m.from))))
            .collect();
        placements.sort_unstable_by_key(|&(to, _)| to);

        for (to, from) in placements {
            assert!(
                to <= self.sections.len(),
                "invalid update: cannot place section at {to} ({} sections)",
                self.sections.len()
            );
            let section = match from {
                Some(from) => match detached.remove(&from) {
                    Some(section) => section,
                    None => panic!("invalid update: section {from} moved twice"),
                },
                None => self.build_section(to, source),
            };
            self.sections.insert(to, section);
        }
    }

    fn apply_row_changes(&mut self, changes: &RowChanges, source: &dyn DataSource) {
        let index = changes.section;
        assert!(
            index < self.sections.len(),
            "invalid update: row changes for missing section {index}"
        );

        let mut removals: Vec<(usize, bool)> = changes
            .deleted
            .iter()
            .map(|&row| (row, false))
            .chain(changes.moved.iter().map(|m| (m.from, true)))
            .collect();
        removals.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        let mut detached = HashMap::new();
        for (row, keep) in removals {
            let rows = &mut self.sections[index].rows;
            assert!(
                row < rows.len(),
                "invalid update: row {row} out of range in section {index} ({} rows)",
                rows.len()
            );
            let id = rows.remove(row);
            if keep {
                detached.insert(row, id);
            } else {
                self.discard(id);
            }
        }

        let mut placements: Vec<(usize, Option<usize>)> = changes
            .inserted
            .iter()
            .map(|&row| (row, None))
            .chain(changes.moved.iter().map(|m| (m.to, Some(m.from))))
            .collect();
        placements.sort_unstable_by_key(|&(to, _)| to);

        for (to, from) in placements {
            let id = match from {
                Some(from) => match detached.remove(&from) {
                    Some(id) => id,
                    None => panic!("invalid update: row {from} in section {index} moved twice"),
                },
                None => {
                    let at = Locator::cell(index, to);
                    let node = source
                        .node(at)
                        .unwrap_or_else(|| panic!("invalid update: data source has no node at {at}"));
                    self.create(at, node, source)
                }
            };
            let rows = &mut self.sections[index].rows;
            assert!(
                to <= rows.len(),
                "invalid update: cannot place row at {to} in section {index} ({} rows)",
                rows.len()
            );
            rows.insert(to, id);
        }
    }

    fn reload_slot(&mut self, at: Locator, source: &dyn DataSource) {
        match at.slot() {
            Slot::Cell(_) => match (self.element_at(at), source.node(at)) {
                (Some(id), Some(node)) => self.paint(id, node.component()),
                _ => panic!("invalid update: cannot reload {at}"),
            },
            Slot::Header | Slot::Footer => {
                assert!(
                    at.section() < self.sections.len(),
                    "invalid update: cannot reload {at}"
                );
                match (self.element_at(at), source.node(at)) {
                    (Some(id), Some(node)) => self.paint(id, node.component()),
                    (None, Some(node)) => {
                        let id = self.create(at, node, source);
                        self.set_slot_element(at, Some(id));
                    }
                    (Some(id), None) => {
                        self.discard(id);
                        self.set_slot_element(at, None);
                    }
                    (None, None) => {}
                }
            }
            Slot::Invalid => panic!("invalid update: cannot reload {at}"),
        }
    }

    fn set_slot_element(&mut self, at: Locator, id: Option<ElementId>) {
        if let Some(section) = self.sections.get_mut(at.section()) {
            if at.is_header() {
                section.header = id;
            } else if at.is_footer() {
                section.footer = id;
            }
        }
    }

    fn reindex(&mut self) {
        for (index, section) in self.sections.iter().enumerate() {
            let slots = section
                .header
                .map(|id| (id, Locator::header(index)))
                .into_iter()
                .chain(section.footer.map(|id| (id, Locator::footer(index))))
                .chain(
                    section
                        .rows
                        .iter()
                        .enumerate()
                        .map(|(row, &id)| (id, Locator::cell(index, row))),
                );
            for (id, locator) in slots {
                if let Some(element) = self.elements.get_mut(id) {
                    element.locator = locator;
                }
            }
        }
    }

    fn assert_consistent(&self, source: &dyn DataSource) {
        assert_eq!(
            self.sections.len(),
            source.section_count(),
            "invalid update: surface has {} sections after batch, data source reports {}",
            self.sections.len(),
            source.section_count()
        );
        for (index, section) in self.sections.iter().enumerate() {
            assert_eq!(
                section.rows.len(),
                source.row_count(index),
                "invalid update: section {index} has {} rows after batch, data source reports {}",
                section.rows.len(),
                source.row_count(index)
            );
        }
    }
}

impl ListSurface for HeadlessSurface {
    fn section_count(&self) -> usize {
        self.sections.len()
    }

    fn row_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, |s| s.rows.len())
    }

    fn reload_data(&mut self, source: &dyn DataSource) {
        for section in std::mem::take(&mut self.sections) {
            self.discard_section(section);
        }
        let sections = (0..source.section_count())
            .map(|index| self.build_section(index, source))
            .collect();
        self.sections = sections;
        self.reindex();
        self.events.push(SurfaceEvent::ReloadData {
            sections: self.sections.len(),
        });
    }

    fn perform_batch(&mut self, batch: &UpdateBatch, source: &dyn DataSource) {
        self.apply_section_changes(&batch.sections, source);
        for rows in &batch.rows {
            self.apply_row_changes(rows, source);
        }
        for rows in &batch.rows {
            for &row in &rows.reloaded {
                self.reload_slot(Locator::cell(rows.section, row), source);
            }
        }
        for &at in &batch.slot_reloads {
            self.reload_slot(at, source);
        }
        self.reindex();
        self.assert_consistent(source);
        self.events.push(SurfaceEvent::Batch(batch.clone()));
    }

    fn locate(&self, element: ElementId) -> Option<Locator> {
        self.elements.get(element).map(|e| e.locator)
    }

    fn repaint(&mut self, at: Locator, source: &dyn DataSource) -> bool {
        match (self.element_at(at), source.node(at)) {
            (Some(id), Some(node)) => {
                self.paint(id, node.component());
                self.events.push(SurfaceEvent::Repaint(at));
                true
            }
            _ => false,
        }
    }
}

static_assertions::assert_impl_all!(HeadlessSurface: Send);
