//! Max-age policy for quotes.

use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::market::Quote;

/// Drop quotes observed more than `max_age` before `now`.
///
/// `max_age = None` disables the policy. Quotes without a timestamp are kept,
/// as is everything when `now - max_age` falls outside the representable range.
/// Returns the fresh quotes and the number dropped.
pub fn retain_fresh(
    quotes: Vec<Quote>,
    now: OffsetDateTime,
    max_age: Option<Duration>,
) -> (Vec<Quote>, usize) {
    let Some(max_age) = max_age else {
        return (quotes, 0);
    };

    let Some(cutoff) = now.checked_sub(max_age) else {
        debug!(max_age_secs = max_age.whole_seconds(), "Max quote age reaches past the calendar; keeping all quotes");
        return (quotes, 0);
    };
    let before = quotes.len();
    let fresh: Vec<Quote> = quotes
        .into_iter()
        .filter(|q| !q.is_older_than(cutoff))
        .collect();
    let stale = before - fresh.len();

    if stale > 0 {
        debug!(stale, cutoff = %cutoff, "Dropped stale quotes");
    }

    (fresh, stale)
}

/// Convert a max-age setting in seconds into a policy (0 disables it).
pub fn max_age_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::seconds(secs.min(i64::MAX as u64) as i64))
}
