use crate::auth::{Action, AllowAll, Authorizer};
use librarian_core::lookup::GoogleBooksClient;
use librarian_core::{Catalog, CatalogError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared by every request. Reads of the catalog share the lock, mutations hold it exclusively
/// for the whole operation.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RwLock<Catalog>>,
    pub authorizer: Arc<dyn Authorizer>,
    /// `None` when no HTTP client could be built; lookups then answer 503
    pub lookup: Option<GoogleBooksClient>,
}

impl AppState {
    pub fn new(catalog: Catalog, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            authorizer,
            lookup: None,
        }
    }

    #[must_use]
    pub fn with_lookup(mut self, lookup: GoogleBooksClient) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// # Errors
    /// Whatever the configured authorizer refuses
    pub fn authorize(&self, action: Action, context: &str) -> Result<(), CatalogError> {
        self.authorizer.authorize(action, context)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Catalog::new(), Arc::new(AllowAll))
    }
}
