/// WatchList holds the destination domains selected for traffic inspection.
/// Configured once at process start and read-only for the lifetime of the
/// process; shared across sessions behind an Arc with no synchronization
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    entries: Vec<String>,
}

/// WatchList implementation block
impl WatchList {
    /// new is a constructor for the WatchList type
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// matches reports whether the destination host contains any watch-list
    /// entry as a case-sensitive substring
    pub fn matches(&self, host: &str) -> bool {
        self.entries.iter().any(|entry| host.contains(entry.as_str()))
    }

    /// is_empty reports whether any entries are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
