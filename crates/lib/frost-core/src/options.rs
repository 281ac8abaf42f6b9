use crate::filter::ExclusionPatterns;

/// Startup configuration for the adapter. Immutable once the service is
/// constructed; in particular, write mode is never toggled at runtime.
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Permits the write-gated tools (`write_query`, `create_table`).
    pub allow_write: bool,
    /// Publishes one resource per visible table and retires the
    /// `list_tables` / `describe_table` tools.
    pub prefetch: bool,
    /// Tool names removed from the registry for the process lifetime.
    pub exclude_tools: Vec<String>,
    /// Catalog names hidden from every caller.
    pub exclusions: ExclusionPatterns,
}

impl ServerOptions {
    #[must_use]
    pub fn with_allow_write(mut self, allow_write: bool) -> Self {
        self.allow_write = allow_write;
        self
    }

    #[must_use]
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    #[must_use]
    pub fn with_excluded_tools(mut self, tools: impl IntoIterator<Item = String>) -> Self {
        self.exclude_tools = tools.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionPatterns) -> Self {
        self.exclusions = exclusions;
        self
    }
}
