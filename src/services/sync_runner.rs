//! Sync Runner for raindrop-sync.
//!
//! One pass: fetch the collection, extract new favourites, then for each one
//! create a task and record it. An item is recorded only after its task
//! exists, so a failure mid-pass leaves every earlier item recorded and the
//! rest eligible for the next run.

use std::path::PathBuf;

use tracing::{error, info};

use crate::managers::tracking_store::TrackingStoreTrait;
use crate::services::raindrop_client::Fetcher;
use crate::services::raindrop_processor::RaindropProcessor;
use crate::types::errors::{SyncError, TaskError};
use crate::types::tracked::TrackedItem;

/// Downstream task tracker. Returns the id of the created task.
pub trait TaskSink {
    fn create_task(&mut self, item: &TrackedItem) -> Result<String, TaskError>;
}

/// What a completed pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub fetched: usize,
    pub new_favourites: usize,
    /// `(raindrop id, task id)` in creation order.
    pub created: Vec<(i64, String)>,
    /// Current snapshot after the pass.
    pub snapshot: Option<PathBuf>,
}

/// Drives a single sync pass over borrowed collaborators.
pub struct SyncRunner<'a, F: Fetcher + ?Sized, S: TrackingStoreTrait + ?Sized> {
    fetcher: &'a F,
    store: &'a S,
}

impl<'a, F: Fetcher + ?Sized, S: TrackingStoreTrait + ?Sized> SyncRunner<'a, F, S> {
    pub fn new(fetcher: &'a F, store: &'a S) -> Self {
        Self { fetcher, store }
    }

    /// Fetches, diffs and hands new favourites to `sink`, appending each to
    /// the store after its task is created. Aborts on the first error.
    pub fn run_once<K: TaskSink + ?Sized>(&self, sink: &mut K) -> Result<SyncReport, SyncError> {
        let all = self.fetcher.fetch_all()?;
        let new_items = RaindropProcessor::new(self.store).extract_new_favourites(&all)?;

        let mut report = SyncReport {
            fetched: all.len(),
            new_favourites: new_items.len(),
            ..SyncReport::default()
        };

        for item in &new_items {
            let task_id = sink.create_task(item).map_err(|source| {
                error!(id = item.id, error = %source, "Task creation failed");
                SyncError::Task {
                    id: item.id,
                    source,
                }
            })?;
            info!(id = item.id, task_id = %task_id, title = %item.title, "Created task");

            let snapshot = self.store.append(std::slice::from_ref(item))?;
            report.created.push((item.id, task_id));
            report.snapshot = Some(snapshot);
        }

        if report.snapshot.is_none() {
            report.snapshot = Some(self.store.current_snapshot_path()?);
        }
        info!(
            fetched = report.fetched,
            created = report.created.len(),
            "Sync pass complete"
        );
        Ok(report)
    }
}
