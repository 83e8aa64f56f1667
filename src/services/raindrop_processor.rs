//! Raindrop Processor for raindrop-sync.
//!
//! Narrows a fetched collection to favourites that have not been tracked yet
//! and projects them into [`TrackedItem`]s ready for task creation. This is
//! a pure read: the tracking store is only written once a task exists.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::managers::tracking_store::TrackingStoreTrait;
use crate::types::errors::StoreError;
use crate::types::raindrop::Raindrop;
use crate::types::tracked::TrackedItem;

/// Extracts newly favourited raindrops against a tracking store.
pub struct RaindropProcessor<'a, S: TrackingStoreTrait + ?Sized> {
    store: &'a S,
}

impl<'a, S: TrackingStoreTrait + ?Sized> RaindropProcessor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Favourited raindrops in `all` whose id the store has not seen, stamped
    /// with the current time. Order follows `all`.
    pub fn extract_new_favourites(&self, all: &[Raindrop]) -> Result<Vec<TrackedItem>, StoreError> {
        self.extract_new_favourites_at(all, Utc::now())
    }

    /// Same as [`extract_new_favourites`](Self::extract_new_favourites) with
    /// an explicit parse time.
    pub fn extract_new_favourites_at(
        &self,
        all: &[Raindrop],
        parsed_at: DateTime<Utc>,
    ) -> Result<Vec<TrackedItem>, StoreError> {
        let favourites = favourites(all);
        let tracked = self.store.tracked_ids()?;
        info!(tracked = tracked.len(), "Store holds previously tracked favourites");

        let untracked = untracked(&favourites, &tracked);
        info!(count = untracked.len(), "Untracked favourites found");

        let items: Vec<TrackedItem> = untracked
            .into_iter()
            .map(|raindrop| TrackedItem::from_raindrop(raindrop, parsed_at))
            .collect();
        for item in &items {
            debug!(id = item.id, title = %item.title, "New favourite");
        }
        Ok(items)
    }
}

/// Raindrops carrying a truthy favourite marker; absence means not favourited.
pub fn favourites(all: &[Raindrop]) -> Vec<&Raindrop> {
    let favs: Vec<&Raindrop> = all.iter().filter(|r| r.is_favourite()).collect();
    info!(total = all.len(), favourites = favs.len(), "Favourites filtered");
    favs
}

fn untracked<'r>(favourites: &[&'r Raindrop], tracked: &HashSet<i64>) -> Vec<&'r Raindrop> {
    favourites
        .iter()
        .copied()
        .filter(|r| !tracked.contains(&r.id))
        .collect()
}
