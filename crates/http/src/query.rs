//! Query-string shapes shared by list endpoints.

use catalog_kernel::{CatalogResult, PageRequest};
use serde::Deserialize;

/// `?page=&size=`, both optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl PageQuery {
    pub fn page_request(&self) -> CatalogResult<PageRequest> {
        page_request(self.page, self.size)
    }
}

/// Apply the defaults (`page=0`, `size=10`) and validate.
pub fn page_request(page: Option<i64>, size: Option<i64>) -> CatalogResult<PageRequest> {
    PageRequest::new(
        page.unwrap_or(0),
        size.unwrap_or(i64::from(PageRequest::DEFAULT_SIZE)),
    )
}
