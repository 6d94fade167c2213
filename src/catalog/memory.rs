//! In-memory catalog provider.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{CatalogPage, CatalogProvider, NameEntry};
use crate::error::CatalogError;
use crate::validator::Criteria;

#[derive(Debug, Clone)]
enum PageResponse {
    Entries(Vec<NameEntry>),
    Status(u16),
}

/// Serves fixed listing pages and records which pages were requested.
///
/// Pages that were never configured answer with status 404.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    total: Option<u64>,
    pages: HashMap<u64, PageResponse>,
    requests: Mutex<Vec<u64>>,
}

impl StaticCatalog {
    /// An empty catalog reporting `total` results on every page.
    pub fn new(total: Option<u64>) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// A one-page catalog whose total equals its entry count.
    pub fn single_page(entries: Vec<NameEntry>) -> Self {
        Self::new(Some(entries.len() as u64)).with_page(1, entries)
    }

    pub fn with_page(mut self, page: u64, entries: Vec<NameEntry>) -> Self {
        self.pages.insert(page, PageResponse::Entries(entries));
        self
    }

    /// Make `page` fail with a non-success HTTP status.
    pub fn with_status(mut self, page: u64, status: u16) -> Self {
        self.pages.insert(page, PageResponse::Status(status));
        self
    }

    /// Pages requested so far, in order.
    pub fn requests(&self) -> Vec<u64> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CatalogProvider for StaticCatalog {
    async fn fetch_page(
        &self,
        _criteria: Criteria,
        page: u64,
    ) -> Result<CatalogPage, CatalogError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(page);

        match self.pages.get(&page) {
            Some(PageResponse::Entries(entries)) => Ok(CatalogPage {
                total: self.total,
                entries: entries.clone(),
            }),
            Some(PageResponse::Status(status)) => Err(CatalogError::Status(*status)),
            None => Err(CatalogError::Status(404)),
        }
    }
}
