//! Record identifier generation.

use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Builder;

/// Generates a new globally unique record id.
///
/// Uses 122 random bits from the operating system CSPRNG formatted as a
/// v4 UUID. If the OS entropy source is unavailable, falls back to a
/// pseudo-random base-36 value concatenated with the base-36 millisecond
/// timestamp. Never fails and never blocks.
#[must_use]
pub fn new_id() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => Builder::from_random_bytes(bytes).into_uuid().to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "OS entropy unavailable, using fallback id");
            fallback_id()
        }
    }
}

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Weak id: splitmix64 of clock and counter, then the timestamp.
fn fallback_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let counter = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);

    let seed = (now.as_nanos() as u64) ^ counter.rotate_left(32);
    let random = splitmix64(seed);

    format!(
        "{}{}",
        to_base36(random),
        to_base36(now.as_millis() as u64)
    )
}

fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".into();
    }
    let mut out = Vec::with_capacity(13);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
