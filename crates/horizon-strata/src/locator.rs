//! Locators for addressing slots in a rendered section tree.
//!
//! A [`Locator`] is the `(section, row)` address of one slot. Cells use their
//! non-negative row index; a section's header and footer use the reserved
//! sentinel rows [`HEADER_ROW`] and [`FOOTER_ROW`]. Both sentinels are
//! negative, so they can never collide with a real cell row.
//!
//! Locators are positions, not identities: after an apply that inserts,
//! deletes, or moves items, a previously obtained locator may point somewhere
//! else. Resolve ids to locators again when in doubt.

use std::cmp::Ordering;
use std::fmt;

/// Row sentinel addressing a section's header slot.
pub const HEADER_ROW: isize = -1;

/// Row sentinel addressing a section's footer slot.
pub const FOOTER_ROW: isize = -2;

/// The kind of slot a [`Locator`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The section header.
    Header,
    /// The section footer.
    Footer,
    /// The cell at the given row.
    Cell(usize),
    /// A negative row that is not one of the sentinels.
    Invalid,
}

/// The address of one slot in a section tree.
///
/// # Example
///
/// ```
/// use horizon_strata::{Locator, Slot};
///
/// let cell = Locator::cell(0, 3);
/// assert_eq!(cell.slot(), Slot::Cell(3));
///
/// let header = Locator::header(2);
/// assert!(header.is_header());
/// assert_eq!(header.section(), 2);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Locator {
    section: usize,
    row: isize,
}

impl Locator {
    /// Creates a locator from a raw section and row.
    ///
    /// `row` may be a cell index or one of the sentinels.
    #[inline]
    pub const fn new(section: usize, row: isize) -> Self {
        Self { section, row }
    }

    /// Creates a locator for the cell at `row` in `section`.
    #[inline]
    pub const fn cell(section: usize, row: usize) -> Self {
        Self {
            section,
            row: row as isize,
        }
    }

    /// Creates a locator for the header of `section`.
    #[inline]
    pub const fn header(section: usize) -> Self {
        Self {
            section,
            row: HEADER_ROW,
        }
    }

    /// Creates a locator for the footer of `section`.
    #[inline]
    pub const fn footer(section: usize) -> Self {
        Self {
            section,
            row: FOOTER_ROW,
        }
    }

    /// Returns the section index.
    #[inline]
    pub const fn section(&self) -> usize {
        self.section
    }

    /// Returns the raw row, including sentinels.
    #[inline]
    pub const fn row(&self) -> isize {
        self.row
    }

    /// Returns the cell row, or `None` for header/footer locators.
    #[inline]
    pub fn cell_row(&self) -> Option<usize> {
        usize::try_from(self.row).ok()
    }

    /// Classifies the addressed slot.
    pub fn slot(&self) -> Slot {
        match self.row {
            HEADER_ROW => Slot::Header,
            FOOTER_ROW => Slot::Footer,
            row if row >= 0 => Slot::Cell(row as usize),
            _ => Slot::Invalid,
        }
    }

    /// Returns `true` if this addresses a cell.
    #[inline]
    pub fn is_cell(&self) -> bool {
        self.row >= 0
    }

    /// Returns `true` if this addresses a section header.
    #[inline]
    pub fn is_header(&self) -> bool {
        self.row == HEADER_ROW
    }

    /// Returns `true` if this addresses a section footer.
    #[inline]
    pub fn is_footer(&self) -> bool {
        self.row == FOOTER_ROW
    }

    /// Returns a locator for another row in the same section.
    #[inline]
    pub fn sibling(&self, row: usize) -> Self {
        Self::cell(self.section, row)
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot() {
            Slot::Header => write!(f, "Locator({}, header)", self.section),
            Slot::Footer => write!(f, "Locator({}, footer)", self.section),
            Slot::Cell(row) => write!(f, "Locator({}, {})", self.section, row),
            Slot::Invalid => write!(f, "Locator({}, invalid {})", self.section, self.row),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot() {
            Slot::Header => write!(f, "{}.header", self.section),
            Slot::Footer => write!(f, "{}.footer", self.section),
            Slot::Cell(row) => write!(f, "{}.{}", self.section, row),
            Slot::Invalid => write!(f, "{}.?{}", self.section, self.row),
        }
    }
}

impl PartialOrd for Locator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Locator {
    /// Orders by section, then header before cells before footer.
    fn cmp(&self, other: &Self) -> Ordering {
        fn rank(locator: &Locator) -> (u8, isize) {
            match locator.slot() {
                Slot::Header => (0, 0),
                Slot::Cell(row) => (1, row as isize),
                Slot::Footer => (2, 0),
                Slot::Invalid => (3, locator.row),
            }
        }
        self.section
            .cmp(&other.section)
            .then_with(|| rank(self).cmp(&rank(other)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_negative_and_distinct() {
        assert!(HEADER_ROW < 0);
        assert!(FOOTER_ROW < 0);
        assert_ne!(HEADER_ROW, FOOTER_ROW);
    }

    #[test]
    fn test_cell_locator() {
        let locator = Locator::cell(1, 4);
        assert!(locator.is_cell());
        assert!(!locator.is_header());
        assert_eq!(locator.cell_row(), Some(4));
        assert_eq!(locator.slot(), Slot::Cell(4));
    }

    #[test]
    fn test_header_footer_locators() {
        let header = Locator::header(3);
        let footer = Locator::footer(3);
        assert_eq!(header.slot(), Slot::Header);
        assert_eq!(footer.slot(), Slot::Footer);
        assert_eq!(header.cell_row(), None);
        assert_ne!(header, footer);
    }

    #[test]
    fn test_invalid_negative_row() {
        assert_eq!(Locator::new(0, -7).slot(), Slot::Invalid);
    }

    #[test]
    fn test_ordering() {
        let mut locators = vec![
            Locator::footer(0),
            Locator::cell(1, 0),
            Locator::cell(0, 1),
            Locator::header(0),
            Locator::cell(0, 0),
        ];
        locators.sort();
        assert_eq!(
            locators,
            vec![
                Locator::header(0),
                Locator::cell(0, 0),
                Locator::cell(0, 1),
                Locator::footer(0),
                Locator::cell(1, 0),
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Locator::cell(2, 5).to_string(), "2.5");
        assert_eq!(Locator::header(1).to_string(), "1.header");
        assert_eq!(format!("{:?}", Locator::footer(0)), "Locator(0, footer)");
    }
}
