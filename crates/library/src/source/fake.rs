//! Scripted [`PageSource`] for tests.

use super::PageSource;
use super::error::{ErrorKind, Result};
use async_trait::async_trait;
use folio_cache::{Author, ItemType, Work};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub(crate) struct FakeSource {
    authors: Vec<Vec<Author>>,
    works: Vec<Vec<Work>>,
    failing: Option<(ItemType, u64)>,
    stalling: Option<(ItemType, u64, Duration)>,
    requests: Mutex<Vec<(ItemType, u64)>>,
}

impl FakeSource {
    /// `authors` pages of two authors each, `works` pages of three works each.
    pub(crate) fn with_pages(authors: u64, works: u64) -> Self {
        let authors = (0..authors)
            .map(|page| {
                (0..2)
                    .map(|n| Author {
                        id: format!("Category:Composer {page}-{n}"),
                        kind: ItemType::Authors,
                        parent: None,
                        permlink: format!("https://imslp.org/wiki/Category:Composer_{page}-{n}"),
                    })
                    .collect()
            })
            .collect();
        let works = (0..works)
            .map(|page| {
                (0..3)
                    .map(|n| Work {
                        id: format!("Sonata No.{n} (Composer {page})"),
                        kind: ItemType::Works,
                        parent: Some(format!("Category:Composer {page}")),
                        permlink: format!("https://imslp.org/wiki/Sonata_No.{n}_(Composer_{page})"),
                        composer: format!("Composer {page}"),
                        work_title: format!("Sonata No.{n}"),
                        icatno: format!("Op.{n}"),
                        page_id: (page * 10 + n) as i64,
                    })
                    .collect()
            })
            .collect();
        Self { authors, works, ..Self::default() }
    }

    /// Fail the request for `page` of `kind` with a network error.
    pub(crate) fn failing_at(mut self, kind: ItemType, page: u64) -> Self {
        self.failing = Some((kind, page));
        self
    }

    /// Hold the response to `page` of `kind` back for `delay`.
    pub(crate) fn stalling_at(mut self, kind: ItemType, page: u64, delay: Duration) -> Self {
        self.stalling = Some((kind, page, delay));
        self
    }

    /// Every page requested so far, in order.
    pub(crate) fn requests(&self) -> Vec<(ItemType, u64)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    async fn respond(&self, kind: ItemType, page: u64) {
        match self.stalling {
            Some((k, p, delay)) if (k, p) == (kind, page) => tokio::time::sleep(delay).await,
            // Yield so that the two streams actually interleave.
            _ => tokio::task::yield_now().await,
        }
    }

    fn page<T: Clone>(&self, kind: ItemType, pages: &[Vec<T>], page: u64) -> Result<Vec<T>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((kind, page));
        }
        if self.failing == Some((kind, page)) {
            exn::bail!(ErrorKind::Network);
        }
        let index = usize::try_from(page).map_err(|_| ErrorKind::InvalidResponse(format!("page {page}")))?;
        pages.get(index).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::InvalidResponse(format!("no page {page}"))))
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn total_pages(&self, kind: ItemType) -> Result<u64> {
        Ok(match kind {
            ItemType::Authors => self.authors.len() as u64,
            ItemType::Works => self.works.len() as u64,
        })
    }

    async fn fetch_authors(&self, page: u64) -> Result<Vec<Author>> {
        self.respond(ItemType::Authors, page).await;
        self.page(ItemType::Authors, &self.authors, page)
    }

    async fn fetch_works(&self, page: u64) -> Result<Vec<Work>> {
        self.respond(ItemType::Works, page).await;
        self.page(ItemType::Works, &self.works, page)
    }
}
