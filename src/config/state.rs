// Application state module
// Shared state handed to every connection task

use std::sync::atomic::AtomicBool;

use super::types::Config;
use crate::logger::LogFormat;
use crate::store::RecordStore;

/// Application state: immutable configuration plus the record store.
pub struct AppState {
    pub config: Config,
    pub store: RecordStore,
    /// Access log format, parsed once at startup
    pub access_log_format: LogFormat,
    /// Cached flag for fast access on the request path
    pub cached_access_log: AtomicBool,
}

impl AppState {
    /// Create `AppState`, opening the record store at the configured path
    pub fn new(config: &Config) -> Self {
        Self {
            store: RecordStore::open(&config.storage.data_file),
            access_log_format: LogFormat::parse(&config.logging.access_log_format),
            cached_access_log: AtomicBool::new(config.logging.access_log),
            config: config.clone(),
        }
    }
}
