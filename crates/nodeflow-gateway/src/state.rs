use std::sync::Arc;

use nodeflow_core::config::AppConfig;
use nodeflow_ops::{OpLibrary, OpRegistry};
use nodeflow_packs::load_nodepacks;

/// Shared gateway state: configuration, the compiled operation library
/// and the registry built from the nodepack tree.
pub struct AppState {
    pub config: AppConfig,
    library: OpLibrary,
    cached: Arc<OpRegistry>,
}

impl AppState {
    pub fn new(config: AppConfig, library: OpLibrary) -> Self {
        let cached = Arc::new(load_nodepacks(&config.nodepacks.dir, &library));
        Self {
            config,
            library,
            cached,
        }
    }

    /// The registry serving the current request. In reload mode the
    /// nodepack tree is rescanned on every call so manifest edits are
    /// picked up without a restart; otherwise the startup build is
    /// shared.
    pub fn registry(&self) -> Arc<OpRegistry> {
        if self.config.nodepacks.reload {
            Arc::new(load_nodepacks(&self.config.nodepacks.dir, &self.library))
        } else {
            self.cached.clone()
        }
    }
}
