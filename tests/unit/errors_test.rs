use std::error::Error;
use std::path::PathBuf;

use raindrop_sync::types::errors::*;

// === TransportError Tests ===

#[test]
fn transport_error_network_is_transient() {
    let err = TransportError::Network("connection reset".to_string());
    assert!(err.is_transient());
    assert_eq!(err.status(), None);
    assert_eq!(err.to_string(), "Network error: connection reset");
}

#[test]
fn transport_error_server_errors_and_throttling_are_transient() {
    for status in [429, 500, 502, 503, 504] {
        let err = TransportError::Status {
            status,
            body: String::new(),
        };
        assert!(err.is_transient(), "status {} should be retried", status);
    }
}

#[test]
fn transport_error_client_errors_are_not_transient() {
    for status in [400, 401, 403, 404, 422] {
        let err = TransportError::Status {
            status,
            body: String::new(),
        };
        assert!(!err.is_transient(), "status {} should not be retried", status);
        assert_eq!(err.status(), Some(status));
    }
}

// === FetchError Tests ===

#[test]
fn fetch_error_count_messages() {
    assert_eq!(
        FetchError::MissingCount.to_string(),
        "The 'count' key was not found in the response data"
    );
    assert_eq!(
        FetchError::NullCount.to_string(),
        "The 'count' key was found in the response data, but its value was null"
    );
    assert_eq!(
        FetchError::NegativeCount(-1).to_string(),
        "The 'count' key was found in the response data, but its value was negative: -1"
    );
}

#[test]
fn fetch_error_api_failure_display() {
    let err = FetchError::ApiFailure { page: 3 };
    assert_eq!(err.to_string(), "API returned failure result on page 3");
}

#[test]
fn fetch_error_count_changed_display() {
    let err = FetchError::CountChanged {
        page: 1,
        benchmark: 26,
        current: serde_json::json!(27),
    };
    assert_eq!(
        err.to_string(),
        "Count changed during fetch on page 1: benchmark 26, now 27"
    );
}

#[test]
fn fetch_error_totals_display() {
    let total = FetchError::TotalMismatch {
        expected: 26,
        actual: 25,
    };
    assert_eq!(
        total.to_string(),
        "Total raindrops fetched (25) does not match benchmark count (26)"
    );

    let last = FetchError::LastPageMismatch {
        expected: 1,
        actual: 2,
    };
    assert_eq!(
        last.to_string(),
        "Last page length unexpected: expected 1, got 2"
    );
}

#[test]
fn fetch_error_too_many_pages_display() {
    let err = FetchError::TooManyPages {
        required: 201,
        allowed: 200,
    };
    assert_eq!(
        err.to_string(),
        "Collection needs 201 pages, more than the 200 allowed"
    );
}

#[test]
fn fetch_error_wraps_missing_token() {
    let err: FetchError = ConfigError::MissingToken("$RAINDROP_ACCESS_TOKEN".to_string()).into();
    assert!(matches!(err, FetchError::Token(_)));
    assert_eq!(
        err.to_string(),
        "No usable access token: Access token not set (expected in $RAINDROP_ACCESS_TOKEN)"
    );
}

// === StoreError Tests ===

#[test]
fn store_error_pointer_missing_display() {
    let err = StoreError::PointerMissing(PathBuf::from("/data/metafile/metafile.txt"));
    assert_eq!(
        err.to_string(),
        "Pointer file missing while snapshots exist: /data/metafile/metafile.txt"
    );
}

#[test]
fn store_error_snapshot_exists_display() {
    let err = StoreError::SnapshotExists(PathBuf::from("002_processed_raindrops_20240101_0000.json"));
    assert_eq!(
        err.to_string(),
        "Refusing to overwrite existing snapshot: 002_processed_raindrops_20240101_0000.json"
    );
}

// === ConfigError Tests ===

#[test]
fn config_error_invalid_key_display() {
    let err = ConfigError::InvalidKey("Key 'api.nope' not found in config".to_string());
    assert_eq!(
        err.to_string(),
        "Invalid config key: Key 'api.nope' not found in config"
    );
}

// === SyncError Tests ===

#[test]
fn sync_error_is_transparent_over_fetch_and_store() {
    let fetch: SyncError = FetchError::Unauthorized.into();
    assert_eq!(fetch.to_string(), "Access token rejected (HTTP 401)");

    let store: SyncError = StoreError::Io("disk full".to_string()).into();
    assert_eq!(store.to_string(), "Tracking store I/O error: disk full");
}

#[test]
fn sync_error_task_keeps_source() {
    let err = SyncError::Task {
        id: 628161680,
        source: TaskError::Unavailable("timeout".to_string()),
    };
    assert_eq!(
        err.to_string(),
        "Creating task for raindrop 628161680 failed: Task service unavailable: timeout"
    );
    let source = err.source().expect("task error should carry its source");
    assert_eq!(source.to_string(), "Task service unavailable: timeout");
}

#[test]
fn errors_implement_error_trait() {
    let err: Box<dyn Error> = Box::new(StoreError::Serialization("bad".to_string()));
    assert!(err.source().is_none());
}
