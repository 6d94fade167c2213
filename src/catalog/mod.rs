//! Name catalog client.
//!
//! Resolves [`Criteria`] into a random sample of names:
//!
//! 1. Fetch page 1 and read the total result count from it.
//! 2. Derive the page count from the total and the catalog page size.
//! 3. Pick a page uniformly at random, reusing page 1 when it is chosen.
//! 4. Sample distinct entries from that page without replacement.
//!
//! Fetching page 1 first costs one extra round trip but keeps the sample
//! uniform over the whole listing instead of favouring its first page.

pub mod http;
#[cfg(test)]
pub mod memory;
pub mod parser;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use tracing::debug;

use crate::error::CatalogError;
use crate::validator::Criteria;

pub use http::HttpCatalog;
#[cfg(test)]
pub use memory::StaticCatalog;

/// One name as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameEntry {
    pub name: String,
    pub origin: String,
}

/// A single fetched listing page.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    /// Total results across all pages, when the page reports it.
    pub total: Option<u64>,
    pub entries: Vec<NameEntry>,
}

/// A name as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameRecord {
    pub name: String,
    pub origin: String,
}

/// Source of listing pages. Pages are numbered from 1.
pub trait CatalogProvider: Send + Sync {
    fn fetch_page(
        &self,
        criteria: Criteria,
        page: u64,
    ) -> impl Future<Output = Result<CatalogPage, CatalogError>> + Send;
}

/// Pagination-aware random sampler over a [`CatalogProvider`].
#[derive(Debug)]
pub struct NameCatalog<P> {
    provider: P,
    page_size: u64,
    sample_size: usize,
}

impl<P: CatalogProvider> NameCatalog<P> {
    pub fn new(provider: P, page_size: u64, sample_size: usize) -> Self {
        Self {
            provider,
            page_size,
            sample_size,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch `sample_size` random names matching `criteria`.
    pub async fn fetch<R>(
        &self,
        criteria: Criteria,
        rng: &mut R,
    ) -> Result<Vec<NameRecord>, CatalogError>
    where
        R: Rng + Send,
    {
        let first = self.provider.fetch_page(criteria, 1).await?;
        let total = first.total.ok_or_else(|| {
            CatalogError::UnreadableListing("no result count in page title".to_string())
        })?;

        let pages = page_count(total, self.page_size);
        let page = rng.random_range(1..=pages);
        debug!(
            gender = %criteria.gender,
            letter = %criteria.letter,
            total,
            pages,
            page,
            "Selected catalog page"
        );

        let selected = if page == 1 {
            first
        } else {
            self.provider.fetch_page(criteria, page).await?
        };

        sample(selected.entries, self.sample_size, rng)
    }
}

/// Number of listing pages for `total` results.
pub fn page_count(total: u64, page_size: u64) -> u64 {
    if total > page_size {
        total.div_ceil(page_size)
    } else {
        1
    }
}

/// Pick `count` distinct entries and capitalize their names.
///
/// Repeated (name, origin) pairs on a page count once.
pub fn sample<R>(
    entries: Vec<NameEntry>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<NameRecord>, CatalogError>
where
    R: Rng + ?Sized,
{
    let mut seen = HashSet::with_capacity(entries.len());
    let unique: Vec<NameEntry> = entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect();

    if unique.len() < count {
        return Err(CatalogError::NotEnoughEntries {
            found: unique.len(),
            wanted: count,
        });
    }

    Ok(unique
        .choose_multiple(rng, count)
        .map(|entry| NameRecord {
            name: capitalize(&entry.name),
            origin: entry.origin.clone(),
        })
        .collect())
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entries(prefix: &str, count: usize) -> Vec<NameEntry> {
        (0..count)
            .map(|i| NameEntry {
                name: format!("{prefix}name{i}"),
                origin: format!("origin{i}"),
            })
            .collect()
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(250, 100), 3);
        assert_eq!(page_count(200, 100), 2);
        assert_eq!(page_count(101, 100), 2);
        assert_eq!(page_count(100, 100), 1);
        assert_eq!(page_count(50, 100), 1);
        assert_eq!(page_count(0, 100), 1);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("ava"), "Ava");
        assert_eq!(capitalize("mARY-aNN"), "Mary-ann");
        assert_eq!(capitalize("élodie"), "Élodie");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_sample_distinct_and_capitalized() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = sample(entries("a", 40), 10, &mut rng).unwrap();

        assert_eq!(records.len(), 10);
        let unique: HashSet<_> = records.iter().map(|r| (&r.name, &r.origin)).collect();
        assert_eq!(unique.len(), 10);
        assert!(records
            .iter()
            .all(|r| r.name.chars().next().is_some_and(char::is_uppercase)));
    }

    #[test]
    fn test_sample_ignores_duplicate_entries() {
        let mut page = entries("a", 9);
        page.push(page[0].clone());
        page.push(page[1].clone());

        let mut rng = StdRng::seed_from_u64(1);
        match sample(page, 10, &mut rng) {
            Err(CatalogError::NotEnoughEntries { found, wanted }) => {
                assert_eq!(found, 9);
                assert_eq!(wanted, 10);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_sample_exactly_enough() {
        let mut rng = StdRng::seed_from_u64(3);
        let records = sample(entries("b", 10), 10, &mut rng).unwrap();
        let names: HashSet<_> = records.into_iter().map(|r| r.name).collect();
        let expected: HashSet<_> = (0..10).map(|i| format!("Bname{i}")).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_single_page_skips_second_fetch() {
        let provider = StaticCatalog::single_page(entries("a", 50));
        let catalog = NameCatalog::new(provider, 100, 10);
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..5 {
            let records = catalog
                .fetch(validate("girl", "a").unwrap(), &mut rng)
                .await
                .unwrap();
            assert_eq!(records.len(), 10);
        }

        assert_eq!(catalog.provider().requests(), vec![1; 5]);
    }

    #[tokio::test]
    async fn test_random_page_is_within_range() {
        let provider = StaticCatalog::new(Some(250))
            .with_page(1, entries("p1", 100))
            .with_page(2, entries("p2", 100))
            .with_page(3, entries("p3", 50));
        let catalog = NameCatalog::new(provider, 100, 10);
        let mut rng = StdRng::seed_from_u64(9);

        let mut seen_pages = HashSet::new();
        for _ in 0..60 {
            let records = catalog
                .fetch(validate("boy", "c").unwrap(), &mut rng)
                .await
                .unwrap();
            let prefix = &records[0].name[..3];
            assert!(records.iter().all(|r| r.name.starts_with(prefix)));
            seen_pages.insert(prefix.to_string());
        }

        // Every fetch starts at page 1 and at most one other page follows.
        let requested = catalog.provider().requests();
        assert!(requested.iter().all(|&p| (1..=3).contains(&p)));
        assert_eq!(requested.iter().filter(|&&p| p == 1).count(), 60);
        assert_eq!(seen_pages.len(), 3);
    }

    #[tokio::test]
    async fn test_first_page_error() {
        let provider = StaticCatalog::new(Some(40)).with_status(1, 500);
        let catalog = NameCatalog::new(provider, 100, 10);
        let mut rng = StdRng::seed_from_u64(0);

        let err = catalog
            .fetch(validate("girl", "a").unwrap(), &mut rng)
            .await
            .unwrap_err();
        assert_eq!(err.client_message(), "Connection error. Try again.");
    }

    #[tokio::test]
    async fn test_second_page_error() {
        let provider = StaticCatalog::new(Some(1000))
            .with_page(1, entries("a", 100))
            .with_status(2, 502);
        let catalog = NameCatalog::new(provider, 500, 10);
        let mut rng = StdRng::seed_from_u64(0);

        // Two pages; keep trying until page 2 is selected.
        let mut saw_error = false;
        for _ in 0..50 {
            if let Err(e) = catalog.fetch(validate("boy", "d").unwrap(), &mut rng).await {
                assert!(matches!(e, CatalogError::Status(502)));
                saw_error = true;
                break;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_missing_total_is_unreadable() {
        let provider = StaticCatalog::new(None).with_page(1, entries("a", 40));
        let catalog = NameCatalog::new(provider, 100, 10);
        let mut rng = StdRng::seed_from_u64(0);

        let err = catalog
            .fetch(validate("girl", "a").unwrap(), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnreadableListing(_)));
        assert_eq!(
            err.client_message(),
            "Catalog error. The name listing could not be read."
        );
        assert_eq!(catalog.provider().requests(), vec![1]);
    }

    #[tokio::test]
    async fn test_short_page_is_an_error() {
        let provider = StaticCatalog::new(Some(4)).with_page(1, entries("x", 4));
        let catalog = NameCatalog::new(provider, 100, 10);
        let mut rng = StdRng::seed_from_u64(0);

        let err = catalog
            .fetch(validate("boy", "x").unwrap(), &mut rng)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::NotEnoughEntries { found: 4, wanted: 10 }
        ));
    }
}
