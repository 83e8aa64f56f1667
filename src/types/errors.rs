use std::path::PathBuf;

use thiserror::Error;

// === TransportError ===

/// Failures below the page-validation layer: the request itself did not
/// produce a usable response.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// Connection, TLS, timeout or body-read failure.
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
}

impl TransportError {
    /// Whether another attempt at the same request could reasonably succeed.
    ///
    /// Network failures, 5xx and 429 are transient. Every other status is a
    /// statement from the server that repeating the request will not help.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Network(_) => true,
            TransportError::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }

    /// The HTTP status, if the server got far enough to send one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Network(_) => None,
            TransportError::Status { status, .. } => Some(*status),
        }
    }
}

// === FetchError ===

/// Errors raised while paginating through the bookmark collection.
///
/// Everything except `RetryExhausted`, `Unauthorized`, `Http` and `Token` is a
/// data-integrity failure: the collection changed shape mid-read or the API
/// broke its contract, and the whole fetch is discarded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Page {page} failed after {attempts} attempts: {last}")]
    RetryExhausted {
        page: u32,
        attempts: u32,
        last: TransportError,
    },
    #[error("Access token rejected (HTTP 401)")]
    Unauthorized,
    #[error("Page {page} request failed with HTTP status {status}")]
    Http { page: u32, status: u16 },
    #[error("Page {page} is not valid JSON: {reason}")]
    Decode { page: u32, reason: String },
    #[error("API returned failure result on page {page}")]
    ApiFailure { page: u32 },
    #[error("The 'count' key was not found in the response data")]
    MissingCount,
    #[error("The 'count' key was found in the response data, but its value was null")]
    NullCount,
    #[error("The 'count' key was found in the response data, but its value was negative: {0}")]
    NegativeCount(i64),
    #[error("Collection needs {required} pages, more than the {allowed} allowed")]
    TooManyPages { required: u64, allowed: u32 },
    #[error("Count changed during fetch on page {page}: benchmark {benchmark}, now {current}")]
    CountChanged {
        page: u32,
        benchmark: u64,
        current: serde_json::Value,
    },
    #[error("Invalid raindrop on page {page}: _id is null or missing: {item}")]
    MissingId { page: u32, item: String },
    #[error("Invalid raindrop on page {page}: _id is not an integer: {item}")]
    NonIntegerId { page: u32, item: String },
    #[error("Invalid raindrop on page {page}: {reason}")]
    MalformedItem { page: u32, reason: String },
    #[error("Total raindrops fetched ({actual}) does not match benchmark count ({expected})")]
    TotalMismatch { expected: u64, actual: u64 },
    #[error("Last page length unexpected: expected {expected}, got {actual}")]
    LastPageMismatch { expected: u64, actual: u64 },
    #[error("No usable access token: {0}")]
    Token(#[from] ConfigError),
}

// === StoreError ===

/// Errors from the on-disk tracking store. None of these are auto-repaired.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Pointer file missing while snapshots exist: {0}")]
    PointerMissing(PathBuf),
    #[error("Pointer file unreadable: {path}: {reason}")]
    PointerUnreadable { path: PathBuf, reason: String },
    #[error("Snapshot referenced by pointer does not exist: {0}")]
    SnapshotMissing(PathBuf),
    #[error("Snapshot is corrupt: {path}: {reason}")]
    SnapshotCorrupt { path: PathBuf, reason: String },
    #[error("Refusing to overwrite existing snapshot: {0}")]
    SnapshotExists(PathBuf),
    #[error("Tracking store I/O error: {0}")]
    Io(String),
    #[error("Tracking store serialization error: {0}")]
    Serialization(String),
}

// === ConfigError ===

/// Errors related to loading, validating and editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(String),
    #[error("Config serialization error: {0}")]
    Serialization(String),
    #[error("Invalid config key: {0}")]
    InvalidKey(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Access token not set (expected in {0})")]
    MissingToken(String),
}

// === TaskError ===

/// Errors reported by a task sink when it cannot create a task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task rejected: {0}")]
    Rejected(String),
    #[error("Task service unavailable: {0}")]
    Unavailable(String),
}

// === SyncError ===

/// Any failure that aborts a sync pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Creating task for raindrop {id} failed: {source}")]
    Task {
        id: i64,
        #[source]
        source: TaskError,
    },
}
