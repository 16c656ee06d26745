use std::sync::Arc;

use casetrack_infra::{DocumentStore, InMemoryDocumentStore, Repository};

/// Shared per-process state handed to every handler.
pub struct AppServices {
    pub repo: Repository<Arc<dyn DocumentStore>>,
}

impl AppServices {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDocumentStore::new()))
    }
}
