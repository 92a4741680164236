//! Reverse-time row keys
//!
//! Keys are `MAX_TICKS - now_ticks` rendered as fixed-width decimal, so a key
//! generated later sorts before every earlier one and an ascending scan returns
//! the newest rows first.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Ticks (100 ns intervals since 0001-01-01T00:00:00Z) of 9999-12-31T23:59:59.9999999Z.
pub const MAX_TICKS: u64 = 3_155_378_975_999_999_999;

/// Ticks between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

const KEY_WIDTH: usize = 19;

static LAST_ISSUED: AtomicU64 = AtomicU64::new(u64::MAX);

/// Ticks of `instant`, clamped to the representable range.
pub fn ticks(instant: DateTime<Utc>) -> u64 {
    let unix_ticks = instant
        .timestamp()
        .saturating_mul(10_000_000)
        .saturating_add(i64::from(instant.timestamp_subsec_nanos() / 100));
    let ticks = unix_ticks.saturating_add(UNIX_EPOCH_TICKS).max(0) as u64;
    ticks.min(MAX_TICKS)
}

fn format_key(value: u64) -> String {
    format!("{:0width$}", value, width = KEY_WIDTH)
}

/// The descending key for a given instant, without the uniqueness guard.
pub fn descending_key_at(instant: DateTime<Utc>) -> String {
    format_key(MAX_TICKS - ticks(instant))
}

/// Generates unique, strictly decreasing row keys from the wall clock.
pub struct RowKeyGenerator;

impl RowKeyGenerator {
    /// Next key for this process.
    ///
    /// Two calls within the same tick (or after the clock stepped back) still get
    /// distinct keys: the result is always below the previously issued one.
    pub fn next_descending_key() -> String {
        let candidate = MAX_TICKS - ticks(Utc::now());
        let mut last = LAST_ISSUED.load(Ordering::SeqCst);
        loop {
            let next = if candidate < last {
                candidate
            } else {
                last.saturating_sub(1)
            };
            match LAST_ISSUED.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return format_key(next),
                Err(current) => last = current,
            }
        }
    }
}
