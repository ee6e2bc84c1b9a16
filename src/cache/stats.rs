use serde::Serialize;

/// Snapshot of cache contents for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
    pub entries: Vec<CacheEntryStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryStats {
    pub key: String,
    pub age_ms: u64,
    pub ttl_ms: u64,
    pub expired: bool,
    /// Length of the entry's JSON encoding
    pub size: usize,
}
