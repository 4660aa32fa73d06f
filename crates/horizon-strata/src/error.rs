//! Error types for rendering and applying section trees.

use thiserror::Error;

/// Errors raised while applying a tree to a display surface.
///
/// The count mismatches are integrity failures: once one is returned the
/// renderer refuses further applies with [`RenderError::Poisoned`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The surface reports a different section count than the tree holds.
    #[error("surface has {actual} sections after apply, tree has {expected}")]
    SectionCountMismatch {
        /// Sections in the committed tree.
        expected: usize,
        /// Sections reported by the surface.
        actual: usize,
    },

    /// The surface reports a different row count for one section.
    #[error("surface has {actual} rows in section {section} after apply, tree has {expected}")]
    RowCountMismatch {
        /// Section index.
        section: usize,
        /// Cells in the committed section.
        expected: usize,
        /// Rows reported by the surface.
        actual: usize,
    },

    /// An earlier integrity violation halted this renderer.
    #[error("renderer halted after an earlier integrity violation")]
    Poisoned,

    /// The operation needs an attached surface.
    #[error("no display surface attached")]
    NoSurface,
}

impl RenderError {
    /// Returns `true` for errors that poison the renderer.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            Self::SectionCountMismatch { .. } | Self::RowCountMismatch { .. }
        )
    }
}

/// A specialized Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = RenderError::RowCountMismatch {
            section: 2,
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "surface has 3 rows in section 2 after apply, tree has 4"
        );
        assert!(err.is_integrity_violation());
        assert!(!RenderError::Poisoned.is_integrity_violation());
    }
}
