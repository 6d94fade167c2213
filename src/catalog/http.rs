//! HTTP catalog provider backed by `reqwest`.

use std::time::Duration;
use tracing::{debug, warn};

use super::parser::{parse_entries, parse_total};
use super::{CatalogPage, CatalogProvider};
use crate::error::CatalogError;
use crate::validator::Criteria;

/// Fetches listing pages from a baby-name website.
///
/// Page 1 lives at `{base}/{gender}/starting-with-{letter}/`, later pages
/// at `{base}/{gender}/starting-with-{letter}/page/{n}`.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalog {
    /// Build a provider whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("random-names/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn page_url(&self, criteria: Criteria, page: u64) -> String {
        let listing = format!(
            "{}/{}/starting-with-{}/",
            self.base_url, criteria.gender, criteria.letter
        );
        if page <= 1 {
            listing
        } else {
            format!("{listing}page/{page}")
        }
    }
}

impl CatalogProvider for HttpCatalog {
    async fn fetch_page(&self, criteria: Criteria, page: u64) -> Result<CatalogPage, CatalogError> {
        let url = self.page_url(criteria, page);
        debug!(%url, page, "Fetching catalog page");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(%url, error = %e, "Catalog request failed");
            if e.is_timeout() {
                CatalogError::Timeout
            } else {
                CatalogError::Transport(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Catalog returned an error status");
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                CatalogError::Timeout
            } else {
                CatalogError::Transport(e)
            }
        })?;

        Ok(CatalogPage {
            total: parse_total(&body),
            entries: parse_entries(&body),
        })
    }
}
