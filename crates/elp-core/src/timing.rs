// ── Timing Equalizer ────────────────────────────────────────────────────
// Randomized delay inserted on non-PRIME branches so PRIME and SHADOW
// responses overlap in latency distribution. Uses the thread-local,
// non-deterministic RNG (deliberately distinct from the Shadow
// Generator's seeded RNG) and draws fresh on every call — never memoized.

use std::time::Duration;

use rand::Rng;

/// Draws a uniformly-random delay in `[low_ms, high_ms]`.
pub fn draw_delay(low_ms: u64, high_ms: u64) -> Duration {
    let millis = if low_ms >= high_ms {
        low_ms
    } else {
        rand::thread_rng().gen_range(low_ms..=high_ms)
    };
    Duration::from_millis(millis)
}

/// Blocks the current thread for a freshly-drawn equalization delay.
/// For use by synchronous callers; async callers (e.g. the `elp-axum`
/// adapter) should draw with [`draw_delay`] and await `tokio::time::sleep`
/// instead of blocking the executor.
pub fn equalize_blocking(low_ms: u64, high_ms: u64) {
    std::thread::sleep(draw_delay(low_ms, high_ms));
}

#[cfg(feature = "async-timing")]
pub async fn equalize_async(low_ms: u64, high_ms: u64) {
    tokio::time::sleep(draw_delay(low_ms, high_ms)).await;
}
