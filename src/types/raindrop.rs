use serde::{Deserialize, Deserializer, Serialize};

/// A bookmark as served by `GET /raindrops/{collection_id}/`.
///
/// Only the fields the sync pipeline reads are modelled; unknown keys are
/// ignored. The API attaches `important` only to favourited raindrops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raindrop {
    #[serde(rename = "_id")]
    pub id: i64,
    pub created: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub note: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub important: Option<bool>,
}

impl Raindrop {
    /// True when the raindrop carries a truthy favourite marker.
    pub fn is_favourite(&self) -> bool {
        self.important.unwrap_or(false)
    }
}

/// The API sends `"note": null` as readily as it omits the key.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rate-limit status echoed by the API in `x-ratelimit-*` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: String,
    pub limit: String,
}

/// Raw output of a single successful page request.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub body: String,
    pub rate_limit: Option<RateLimit>,
}
