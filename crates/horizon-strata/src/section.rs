//! Sections: ordered cells plus optional header and footer.

use std::fmt;
use std::hash::Hash;

use horizon_strata_core::ComponentId;

use crate::locator::{FOOTER_ROW, HEADER_ROW};
use crate::node::{IntoNode, Node};

/// Id shared by every section built with [`Section::anonymous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnonymousSection;

/// One group of a section tree.
///
/// A tree is a `Vec<Section>`; section ids must be unique within it.
///
/// # Example
///
/// ```
/// use horizon_strata::{Component, Identifiable, Section};
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
/// let section = Section::new("inbox")
///     .with_header(Row("title"))
///     .with_cells([Row("a"), Row("b")]);
/// assert_eq!(section.cell_count(), 2);
/// assert!(section.header().is_some());
/// ```
#[derive(Clone)]
pub struct Section {
    id: ComponentId,
    header: Option<Node>,
    footer: Option<Node>,
    cells: Vec<Node>,
}

impl Section {
    /// Creates an empty section.
    pub fn new<I>(id: I) -> Self
    where
        I: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Self::with_id(ComponentId::new(id))
    }

    /// Creates an empty section from an erased id.
    pub fn with_id(id: ComponentId) -> Self {
        Self {
            id,
            header: None,
            footer: None,
            cells: Vec::new(),
        }
    }

    /// Creates an empty section with the shared anonymous id.
    pub fn anonymous() -> Self {
        Self::new(AnonymousSection)
    }

    /// Sets the header.
    pub fn with_header(mut self, header: impl IntoNode) -> Self {
        self.header = Some(header.into_node());
        self
    }

    /// Sets the footer.
    pub fn with_footer(mut self, footer: impl IntoNode) -> Self {
        self.footer = Some(footer.into_node());
        self
    }

    /// Appends one cell.
    pub fn with_cell(mut self, cell: impl IntoNode) -> Self {
        self.cells.push(cell.into_node());
        self
    }

    /// Appends cells.
    pub fn with_cells<I>(mut self, cells: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoNode,
    {
        self.cells.extend(cells.into_iter().map(IntoNode::into_node));
        self
    }

    /// Returns the section id.
    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    /// Returns the header node.
    pub fn header(&self) -> Option<&Node> {
        self.header.as_ref()
    }

    /// Returns the footer node.
    pub fn footer(&self) -> Option<&Node> {
        self.footer.as_ref()
    }

    /// Returns the cells in display order.
    pub fn cells(&self) -> &[Node] {
        &self.cells
    }

    /// Returns the cell at `row`.
    pub fn cell(&self, row: usize) -> Option<&Node> {
        self.cells.get(row)
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the section has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the node at a raw row, including the header/footer sentinels.
    pub fn slot(&self, row: isize) -> Option<&Node> {
        match row {
            HEADER_ROW => self.header.as_ref(),
            FOOTER_ROW => self.footer.as_ref(),
            row => usize::try_from(row).ok().and_then(|row| self.cells.get(row)),
        }
    }

    pub(crate) fn slot_mut(&mut self, row: isize) -> Option<&mut Node> {
        match row {
            HEADER_ROW => self.header.as_mut(),
            FOOTER_ROW => self.footer.as_mut(),
            row => match usize::try_from(row) {
                Ok(row) => self.cells.get_mut(row),
                Err(_) => None,
            },
        }
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<Node> {
        &mut self.cells
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("footer", &self.footer)
            .field("cells", &self.cells)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use horizon_strata_core::Identifiable;

    #[derive(Clone, PartialEq, Debug)]
    struct Row(u32);

    impl Identifiable for Row {
        type Id = u32;
        fn id(&self) -> u32 {
            self.0
        }
        fn should_content_update(&self, _next: &Self) -> bool {
            false
        }
    }

    impl Component for Row {
        type Content = ();
        fn render_content(&self) {}
        fn render(&self, _content: &mut ()) {}
    }

    #[test]
    fn test_slot_addressing() {
        let section = Section::new(1u8)
            .with_header(Row(100))
            .with_footer(Row(200))
            .with_cells([Row(1), Row(2)]);

        assert_eq!(section.slot(HEADER_ROW).map(Node::id), Some(ComponentId::new(100u32)));
        assert_eq!(section.slot(FOOTER_ROW).map(Node::id), Some(ComponentId::new(200u32)));
        assert_eq!(section.slot(1).map(Node::id), Some(ComponentId::new(2u32)));
        assert!(section.slot(2).is_none());
        assert!(section.slot(-5).is_none());
    }

    #[test]
    fn test_anonymous_sections_share_id() {
        assert_eq!(Section::anonymous().id(), Section::anonymous().id());
        assert_ne!(Section::anonymous().id(), Section::new(0u8).id());
    }

    #[test]
    fn test_missing_header_footer() {
        let section = Section::new("s").with_cell(Row(1));
        assert!(section.header().is_none());
        assert!(section.slot(HEADER_ROW).is_none());
        assert_eq!(section.cell_count(), 1);
    }
}
