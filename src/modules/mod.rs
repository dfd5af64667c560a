pub mod authors;
pub mod books;
pub mod openapi;

use std::sync::Arc;

use catalog_kernel::ModuleRegistry;

use crate::store::RepositoryStore;

/// Register the catalog modules backed by `store`
pub fn register_all(registry: &mut ModuleRegistry, store: &RepositoryStore) {
    registry.register(Arc::new(authors::AuthorsModule::new(store.authors())));
    registry.register(Arc::new(books::BooksModule::new(store.books())));
}
