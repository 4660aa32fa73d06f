//! Renderer configuration.

/// Row animation hint forwarded to the surface with every batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RowAnimation {
    /// Let the surface choose.
    #[default]
    Automatic,
    /// Cross-fade changed rows.
    Fade,
    /// No row animation.
    None,
}

/// Configuration for a [`Renderer`](crate::Renderer) and its
/// [`Adapter`](crate::Adapter).
///
/// # Example
///
/// ```
/// use horizon_strata::{RendererConfig, RowAnimation};
///
/// let config = RendererConfig::new()
///     .with_animated(false)
///     .with_row_animation(RowAnimation::Fade)
///     .with_animatable_change_count(50);
/// assert_eq!(config.animatable_change_count, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RendererConfig {
    /// Whether batches ask the surface to animate.
    pub animated: bool,
    /// Animation hint for inserted, deleted and reloaded rows.
    pub row_animation: RowAnimation,
    /// Largest edit script applied as batched updates. Larger diffs fall back
    /// to a full `reload_data`.
    pub animatable_change_count: usize,
    /// Check surface counts against the tree after every apply.
    pub verify_integrity: bool,
    /// Repaint content-only changes directly instead of sending reload ops.
    pub skip_reload_components: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            animated: true,
            row_animation: RowAnimation::Automatic,
            animatable_change_count: 300,
            verify_integrity: true,
            skip_reload_components: false,
        }
    }
}

impl RendererConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether batches are animated.
    pub fn with_animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }

    /// Sets the row animation hint.
    pub fn with_row_animation(mut self, animation: RowAnimation) -> Self {
        self.row_animation = animation;
        self
    }

    /// Sets the batched-update threshold.
    pub fn with_animatable_change_count(mut self, count: usize) -> Self {
        self.animatable_change_count = count;
        self
    }

    /// Enables or disables post-apply count checks.
    pub fn with_verify_integrity(mut self, verify: bool) -> Self {
        self.verify_integrity = verify;
        self
    }

    /// Enables or disables direct repaint of content-only changes.
    pub fn with_skip_reload_components(mut self, skip: bool) -> Self {
        self.skip_reload_components = skip;
        self
    }
}
