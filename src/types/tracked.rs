use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::raindrop::Raindrop;

/// Key under which a snapshot stores its tracked items.
pub const SNAPSHOT_KEY: &str = "Processed Raindrops";

/// A raindrop that has been turned into a task and recorded in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedItem {
    pub id: i64,
    pub created_time: String,
    pub parsed_time: String,
    pub title: String,
    pub notes: String,
    pub link: String,
}

impl TrackedItem {
    /// Projects a raindrop into its tracked form, stamping `parsed_at` as
    /// UTC with millisecond precision.
    pub fn from_raindrop(raindrop: &Raindrop, parsed_at: DateTime<Utc>) -> Self {
        Self {
            id: raindrop.id,
            created_time: raindrop.created.clone(),
            parsed_time: parsed_at.to_rfc3339_opts(SecondsFormat::Millis, false),
            title: raindrop.title.clone(),
            notes: raindrop.note.clone(),
            link: raindrop.link.clone(),
        }
    }
}

/// Contents of one snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "Processed Raindrops")]
    pub processed: Vec<TrackedItem>,
}

impl Snapshot {
    /// Identifiers of every tracked item.
    pub fn ids(&self) -> HashSet<i64> {
        self.processed.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
