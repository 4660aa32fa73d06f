//! The reconciler: computes an edit script between two section trees.
//!
//! Diffing runs on two levels. Sections are matched by id; unmatched old
//! sections are deleted and unmatched new ones inserted. Matched sections
//! are then diffed cell by cell, again keyed by id.
//!
//! Within one level the items that stay in place are the longest common
//! subsequence of ids. Ids are unique per level, so that subsequence is the
//! longest increasing run of old positions taken in new order, found in
//! `O(n log n)`. Matched items outside the run are moves. Matched items whose
//! content changed are reloaded at their new index; an item that moved and
//! changed gets both a move and a reload at its destination.
//!
//! Headers and footers are compared as single-slot lists. Any change of
//! presence, id, or content becomes a slot reload at the section's new index;
//! a changed header never turns into a section move.
//!
//! Duplicate ids within one level violate the identity contract. The first
//! occurrence is matched and the rest are treated as unmatched, so the diff
//! still completes.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;

use horizon_strata_core::logging::{span_names, targets};
use horizon_strata_core::{ComponentId, PerfSpan};

use crate::locator::Locator;
use crate::node::Node;
use crate::section::Section;

/// One item moving from an old index to a new index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    /// Index in the old list.
    pub from: usize,
    /// Index in the new list.
    pub to: usize,
}

impl Move {
    /// Creates a move.
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// Section-level edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionChanges {
    /// Old indices of deleted sections, ascending.
    pub deleted: Vec<usize>,
    /// New indices of inserted sections, ascending.
    pub inserted: Vec<usize>,
    /// Matched sections that changed relative order.
    pub moved: Vec<Move>,
}

impl SectionChanges {
    /// Returns `true` if nothing changes at section level.
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.inserted.is_empty() && self.moved.is_empty()
    }

    /// Returns the number of section-level edits.
    pub fn len(&self) -> usize {
        self.deleted.len() + self.inserted.len() + self.moved.len()
    }
}

/// Cell-level edits of one matched section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowChanges {
    /// Section index in the new tree.
    pub section: usize,
    /// Section index in the old tree.
    pub old_section: usize,
    /// Old rows deleted, ascending.
    pub deleted: Vec<usize>,
    /// New rows inserted, ascending.
    pub inserted: Vec<usize>,
    /// Rows that changed relative order.
    pub moved: Vec<Move>,
    /// New rows whose content changed, ascending.
    pub reloaded: Vec<usize>,
}

impl RowChanges {
    /// Returns `true` if the section's cells are untouched.
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
            && self.inserted.is_empty()
            && self.moved.is_empty()
            && self.reloaded.is_empty()
    }

    /// Returns the number of row edits.
    pub fn len(&self) -> usize {
        self.deleted.len() + self.inserted.len() + self.moved.len() + self.reloaded.len()
    }
}

/// The full result of reconciling two trees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    /// Section inserts, deletes and moves.
    pub sections: SectionChanges,
    /// Row edits per matched section, ordered by new section index.
    pub rows: Vec<RowChanges>,
    /// Header and footer reloads, addressed in the new tree.
    pub slot_reloads: Vec<Locator>,
    section_sources: Vec<Option<usize>>,
}

impl EditScript {
    /// Returns `true` if the trees are equivalent.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.rows.is_empty() && self.slot_reloads.is_empty()
    }

    /// Returns the row edits for a section of the new tree.
    pub fn rows_for(&self, section: usize) -> Option<&RowChanges> {
        self.rows.iter().find(|rows| rows.section == section)
    }

    /// Returns the old index of the section now at `section`, if it was
    /// matched.
    pub fn source_section(&self, section: usize) -> Option<usize> {
        self.section_sources.get(section).copied().flatten()
    }

    /// Section and row inserts.
    pub fn insert_count(&self) -> usize {
        self.sections.inserted.len() + self.rows.iter().map(|r| r.inserted.len()).sum::<usize>()
    }

    /// Section and row deletes.
    pub fn delete_count(&self) -> usize {
        self.sections.deleted.len() + self.rows.iter().map(|r| r.deleted.len()).sum::<usize>()
    }

    /// Section and row moves.
    pub fn move_count(&self) -> usize {
        self.sections.moved.len() + self.rows.iter().map(|r| r.moved.len()).sum::<usize>()
    }

    /// Row and slot reloads.
    pub fn reload_count(&self) -> usize {
        self.rows.iter().map(|r| r.reloaded.len()).sum::<usize>() + self.slot_reloads.len()
    }

    /// Every edit in the script.
    pub fn change_count(&self) -> usize {
        self.insert_count() + self.delete_count() + self.move_count() + self.reload_count()
    }
}

/// Matching of one keyed level.
#[derive(Debug, Default)]
struct KeyedDiff {
    deleted: Vec<usize>,
    inserted: Vec<usize>,
    moved: Vec<Move>,
    /// Old index per new index.
    sources: Vec<Option<usize>>,
}

/// Reconciles `old` against `new`.
///
/// The result is deterministic for a given pair of trees.
pub fn reconcile(old: &[Section], new: &[Section]) -> EditScript {
    let _perf = PerfSpan::new(span_names::RECONCILE);

    let old_ids: Vec<ComponentId> = old.iter().map(|s| s.id().clone()).collect();
    let new_ids: Vec<ComponentId> = new.iter().map(|s| s.id().clone()).collect();
    let keyed = diff_keyed(&old_ids, &new_ids, &"sections");

    let mut rows = Vec::new();
    let mut slot_reloads = Vec::new();

    for (new_index, source) in keyed.sources.iter().enumerate() {
        let Some(old_index) = *source else {
            continue;
        };
        let (before, after) = (&old[old_index], &new[new_index]);

        let cells = diff_cells(before, after, old_index, new_index);
        if !cells.is_empty() {
            rows.push(cells);
        }

        if slot_changed(before.header(), after.header()) {
            slot_reloads.push(Locator::header(new_index));
        }
        if slot_changed(before.footer(), after.footer()) {
            slot_reloads.push(Locator::footer(new_index));
        }
    }

    let script = EditScript {
        sections: SectionChanges {
            deleted: keyed.deleted,
            inserted: keyed.inserted,
            moved: keyed.moved,
        },
        rows,
        slot_reloads,
        section_sources: keyed.sources,
    };

    tracing::debug!(
        target: targets::RECONCILE,
        old_sections = old.len(),
        new_sections = new.len(),
        inserts = script.insert_count(),
        deletes = script.delete_count(),
        moves = script.move_count(),
        reloads = script.reload_count(),
        "reconciled tree"
    );

    script
}

fn diff_cells(before: &Section, after: &Section, old_section: usize, section: usize) -> RowChanges {
    let old_ids: Vec<ComponentId> = before.cells().iter().map(Node::id).collect();
    let new_ids: Vec<ComponentId> = after.cells().iter().map(Node::id).collect();
    let keyed = diff_keyed(&old_ids, &new_ids, &format_args!("section {:?}", after.id()));

    let reloaded = keyed
        .sources
        .iter()
        .enumerate()
        .filter_map(|(to, source)| {
            let from = (*source)?;
            before.cells()[from]
                .should_content_update(&after.cells()[to])
                .then_some(to)
        })
        .collect();

    RowChanges {
        section,
        old_section,
        deleted: keyed.deleted,
        inserted: keyed.inserted,
        moved: keyed.moved,
        reloaded,
    }
}

fn slot_changed(before: Option<&Node>, after: Option<&Node>) -> bool {
    match (before, after) {
        (None, None) => false,
        (Some(before), Some(after)) => {
            before.id() != after.id() || before.should_content_update(after)
        }
        _ => true,
    }
}

/// Matches two id lists and classifies every position.
fn diff_keyed(old: &[ComponentId], new: &[ComponentId], scope: &dyn fmt::Display) -> KeyedDiff {
    let mut duplicates = 0usize;

    let mut old_positions: HashMap<&ComponentId, usize> = HashMap::with_capacity(old.len());
    for (index, id) in old.iter().enumerate() {
        match old_positions.entry(id) {
            Entry::Occupied(_) => duplicates += 1,
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
        }
    }

    let mut claimed = vec![false; old.len()];
    let mut seen: HashSet<&ComponentId> = HashSet::with_capacity(new.len());
    let mut sources = Vec::with_capacity(new.len());
    for id in new {
        if !seen.insert(id) {
            duplicates += 1;
        }
        let source = old_positions
            .get(id)
            .copied()
            .filter(|&from| !claimed[from]);
        if let Some(from) = source {
            claimed[from] = true;
        }
        sources.push(source);
    }

    if duplicates > 0 {
        tracing::warn!(
            target: targets::RECONCILE,
            %scope,
            duplicates,
            "duplicate ids, extra occurrences diffed as unmatched"
        );
    }

    let deleted = claimed
        .iter()
        .enumerate()
        .filter(|(_, claimed)| !**claimed)
        .map(|(index, _)| index)
        .collect();

    let inserted = sources
        .iter()
        .enumerate()
        .filter(|(_, source)| source.is_none())
        .map(|(index, _)| index)
        .collect();

    let matched: Vec<Move> = sources
        .iter()
        .enumerate()
        .filter_map(|(to, source)| source.map(|from| Move::new(from, to)))
        .collect();
    let order: Vec<usize> = matched.iter().map(|m| m.from).collect();
    let stays = longest_increasing_run(&order);

    let moved = matched
        .into_iter()
        .zip(stays)
        .filter(|(_, stays)| !stays)
        .map(|(m, _)| m)
        .collect();

    KeyedDiff {
        deleted,
        inserted,
        moved,
        sources,
    }
}

/// Marks the members of a longest strictly increasing subsequence.
///
/// Patience sorting with predecessor links. Among runs of equal length the
/// one ending in the smallest values wins, which keeps the earliest old
/// items in place.
fn longest_increasing_run(values: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (index, &value) in values.iter().enumerate() {
        let position = tails.partition_point(|&tail| values[tail] < value);
        if position > 0 {
            previous[index] = Some(tails[position - 1]);
        }
        if position == tails.len() {
            tails.push(index);
        } else {
            tails[position] = index;
        }
    }

    let mut members = vec![false; values.len()];
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        members[index] = true;
        cursor = previous[index];
    }
    members
}
