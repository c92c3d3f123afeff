//! Store configuration.

/// Configuration for loading a store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether a write fsyncs the temp file and its directory before the
    /// save is reported durable (safer but slower).
    pub sync_on_save: bool,

    /// Whether the persisted JSON document is pretty-printed.
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync_on_save: true,
            pretty: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether writes fsync before reporting success.
    #[must_use]
    pub const fn sync_on_save(mut self, value: bool) -> Self {
        self.sync_on_save = value;
        self
    }

    /// Sets whether the persisted document is pretty-printed.
    #[must_use]
    pub const fn pretty(mut self, value: bool) -> Self {
        self.pretty = value;
        self
    }
}
