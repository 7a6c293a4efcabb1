//! Scripted in-memory listing source for extractor/orchestrator tests.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::scraper::source::{
    ItemHandle, ListingField, ListingSource, SourceError, SourceResult,
};
use crate::session::SessionRegistry;

#[derive(Debug, Clone, Default)]
pub struct FakeItem {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    pub categories: Vec<String>,
    pub hours: Option<String>,
    pub coordinates: Option<(f64, f64)>,
    /// Fail this many name reads with `Throttled` before succeeding.
    pub throttle_name_reads: u32,
    /// Name read fails fatally, as if the browsing session died here.
    pub crash_on_name: bool,
    /// Every optional lookup errors; the extractor must absorb these.
    pub fail_optional_reads: bool,
}

impl FakeItem {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn nameless() -> Self {
        Self::default()
    }
}

pub struct FakeSource {
    items: Vec<FakeItem>,
    pub fail_open: bool,
    pub fail_search: bool,
    pub fail_list: bool,
    /// Request cancellation through the registry when this item's name is
    /// first read, simulating a user clicking cancel mid-run.
    pub cancel_on_item: Option<(usize, SessionRegistry, Uuid)>,
    name_attempts: HashMap<usize, u32>,
}

impl FakeSource {
    pub fn new(items: Vec<FakeItem>) -> Self {
        Self {
            items,
            fail_open: false,
            fail_search: false,
            fail_list: false,
            cancel_on_item: None,
            name_attempts: HashMap::new(),
        }
    }

    fn item(&self, handle: &ItemHandle) -> &FakeItem {
        &self.items[handle.index]
    }
}

#[async_trait]
impl ListingSource for FakeSource {
    async fn open(&mut self) -> SourceResult<()> {
        if self.fail_open {
            return Err(SourceError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    async fn search(&mut self, _keywords: &str, _location: &str) -> SourceResult<()> {
        if self.fail_search {
            return Err(SourceError::Unavailable("search rejected".to_string()));
        }
        Ok(())
    }

    async fn list_items(&mut self, limit: usize) -> SourceResult<Vec<ItemHandle>> {
        if self.fail_list {
            return Err(SourceError::Crashed("result feed disappeared".to_string()));
        }
        Ok((0..self.items.len().min(limit))
            .map(|index| ItemHandle {
                index,
                url: format!("https://maps.example/place/{}", index),
            })
            .collect())
    }

    async fn read_text(
        &mut self,
        item: &ItemHandle,
        field: ListingField,
    ) -> SourceResult<Option<String>> {
        if field == ListingField::Name {
            if let Some((index, registry, session_id)) = self.cancel_on_item.clone() {
                if item.index == index {
                    registry.request_cancel(&session_id).await;
                }
            }

            let scripted = self.item(item).clone();
            if scripted.crash_on_name {
                return Err(SourceError::Crashed("tab closed unexpectedly".to_string()));
            }
            let attempts = self.name_attempts.entry(item.index).or_insert(0);
            if *attempts < scripted.throttle_name_reads {
                *attempts += 1;
                return Err(SourceError::Throttled("slow down".to_string()));
            }
            return Ok(scripted.name);
        }

        let scripted = self.item(item);
        if scripted.fail_optional_reads {
            return Err(SourceError::Throttled("flaky field read".to_string()));
        }
        Ok(match field {
            ListingField::Name => unreachable!(),
            ListingField::Address => scripted.address.clone(),
            ListingField::Phone => scripted.phone.clone(),
            ListingField::Website => scripted.website.clone(),
            ListingField::Rating => scripted.rating.clone(),
            ListingField::ReviewsCount => scripted.reviews.clone(),
        })
    }

    async fn read_categories(&mut self, item: &ItemHandle) -> SourceResult<Vec<String>> {
        let scripted = self.item(item);
        if scripted.fail_optional_reads {
            return Err(SourceError::Throttled("flaky field read".to_string()));
        }
        Ok(scripted.categories.clone())
    }

    async fn read_hours(&mut self, item: &ItemHandle) -> SourceResult<Option<String>> {
        let scripted = self.item(item);
        if scripted.fail_optional_reads {
            return Err(SourceError::Throttled("flaky field read".to_string()));
        }
        Ok(scripted.hours.clone())
    }

    async fn read_coordinates(&mut self, item: &ItemHandle) -> SourceResult<Option<(f64, f64)>> {
        let scripted = self.item(item);
        if scripted.fail_optional_reads {
            return Err(SourceError::Throttled("flaky field read".to_string()));
        }
        Ok(scripted.coordinates)
    }
}
