//! Correlation identifiers.
//!
//! Ids combine a millisecond timestamp, a process-wide sequence number and a
//! short random suffix, so they stay unique within a process even when many
//! are minted in the same millisecond.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::distributions::Alphanumeric;
use rand::Rng;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

const SUFFIX_LEN: usize = 6;

fn suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

fn millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn correlation_id(prefix: &str) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{}-{seq}-{}", millis(), suffix())
}

pub(crate) fn action_id() -> String {
    correlation_id("act")
}

pub(crate) fn screenshot_id() -> String {
    correlation_id("ss")
}

/// Identifies one SDK instance to the gateway.
pub(crate) fn client_id() -> String {
    format!("sdk-{}-{}", millis(), suffix())
}
