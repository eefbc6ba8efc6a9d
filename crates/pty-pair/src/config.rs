//! Configuration types for PTY pair allocation.
//!
//! [`PtyConfig`] describes the terminal a freshly allocated pair starts
//! with: its window size and whether the line discipline echoes input.

/// Configuration for opening a new PTY pair.
///
/// # Example
///
/// ```
/// use pty_pair::PtyConfig;
///
/// let config = PtyConfig::builder()
///     .window_size(120, 40)
///     .echo(false)
///     .build();
/// assert_eq!(config.window_size.cols, 120);
/// assert!(!config.echo);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyConfig {
    /// Initial window size.
    pub window_size: WindowSize,

    /// Whether the line discipline echoes bytes written to the master.
    pub echo: bool,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            window_size: WindowSize::default(),
            echo: true,
        }
    }
}

impl PtyConfig {
    /// Create a new builder for `PtyConfig`.
    #[must_use]
    pub fn builder() -> PtyConfigBuilder {
        PtyConfigBuilder::new()
    }

    /// Create a new `PtyConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Builder for [`PtyConfig`].
#[derive(Debug, Clone, Default)]
pub struct PtyConfigBuilder {
    config: PtyConfig,
}

impl PtyConfigBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial window size.
    #[must_use]
    pub const fn window_size(mut self, cols: u16, rows: u16) -> Self {
        self.config.window_size = WindowSize::new(cols, rows);
        self
    }

    /// Set whether input is echoed back by the terminal.
    #[must_use]
    pub const fn echo(mut self, value: bool) -> Self {
        self.config.echo = value;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PtyConfig {
        self.config
    }
}

/// Window size for the PTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Number of columns (characters per line).
    pub cols: u16,
    /// Number of rows (lines).
    pub rows: u16,
    /// Pixel width (optional, often 0).
    pub xpixel: u16,
    /// Pixel height (optional, often 0).
    pub ypixel: u16,
}

impl WindowSize {
    /// Create a new window size with the given dimensions.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            xpixel: 0,
            ypixel: 0,
        }
    }

    /// Whether both dimensions are non-zero.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.cols > 0 && self.rows > 0
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl From<(u16, u16)> for WindowSize {
    fn from((cols, rows): (u16, u16)) -> Self {
        Self::new(cols, rows)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn config_builder() {
        let config = PtyConfig::builder().window_size(120, 40).echo(false).build();

        assert_eq!(config.window_size, WindowSize::new(120, 40));
        assert!(!config.echo);
    }

    #[test]
    fn default_config_echoes() {
        let config = PtyConfig::default();
        assert!(config.echo);
        assert_eq!(config.window_size, WindowSize::new(80, 24));
    }

    #[test]
    fn window_size_validity() {
        assert!(WindowSize::new(1, 1).is_valid());
        assert!(!WindowSize::new(0, 24).is_valid());
        assert!(!WindowSize::from((80, 0)).is_valid());
    }

    proptest! {
        #[test]
        fn builder_keeps_any_window(cols in any::<u16>(), rows in any::<u16>()) {
            let config = PtyConfig::builder().window_size(cols, rows).build();
            prop_assert_eq!(config.window_size, WindowSize::new(cols, rows));
            prop_assert_eq!(config.window_size.is_valid(), cols > 0 && rows > 0);
        }
    }
}
