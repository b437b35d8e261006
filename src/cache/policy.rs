//! Expiration policy: how long a method's response may be reused.

use crate::protocol::Params;
use std::sync::atomic::{AtomicI64, Ordering};

pub const MINUTE: i64 = 60;
pub const HOUR: i64 = MINUTE * 60;
pub const DAY: i64 = HOUR * 24;
pub const WEEK: i64 = DAY * 7;

/// Average number of weeks per month used by the upstream client libraries.
pub const MONTH_IN_WEEKS: f64 = 4.34812141;

/// `WEEK × MONTH_IN_WEEKS × 12`, truncated to whole seconds.
pub const YEAR: i64 = 31_556_925;

/// Returned for methods whose responses must not be cached.
pub const NOT_CACHEABLE: i64 = -1;

/// Similarity and top-N listing methods cached for one week.
pub const WEEKLY_METHODS: [&str; 15] = [
    "artist.getSimilar",
    "tag.getSimilar",
    "track.getSimilar",
    "artist.getTopAlbums",
    "artist.getTopTracks",
    "geo.getTopArtists",
    "geo.getTopTracks",
    "tag.getTopAlbums",
    "tag.getTopArtists",
    "tag.getTopTags",
    "tag.getTopTracks",
    "user.getTopAlbums",
    "user.getTopArtists",
    "user.getTopTags",
    "user.getTopTracks",
];

/// Decides cache lifetime from the method name and parameters alone.
///
/// A return value `<= 0` means "do not cache".
pub trait CachePolicy: Send + Sync {
    fn expiration_secs(&self, method: &str, params: &Params) -> i64;

    fn name(&self) -> &'static str {
        "custom"
    }
}

/// The stock policy.
///
/// - Weekly chart methods (`*Weekly*`, but not `*Weekly*List`) with both
///   `from` and `to` are historical and cached for [`YEAR`]; without a range
///   they describe the current week and use the weekly-charts TTL.
/// - [`WEEKLY_METHODS`] are cached for [`WEEK`].
/// - Everything else is not cached.
#[derive(Debug)]
pub struct DefaultCachePolicy {
    weekly_charts_expiration: AtomicI64,
}

impl DefaultCachePolicy {
    pub fn new() -> Self {
        Self {
            weekly_charts_expiration: AtomicI64::new(WEEK),
        }
    }

    pub fn with_weekly_charts_expiration(self, secs: i64) -> Self {
        self.set_weekly_charts_expiration(secs);
        self
    }

    /// TTL for the current week's charts.
    pub fn weekly_charts_expiration(&self) -> i64 {
        self.weekly_charts_expiration.load(Ordering::Relaxed)
    }

    pub fn set_weekly_charts_expiration(&self, secs: i64) {
        self.weekly_charts_expiration.store(secs, Ordering::Relaxed);
    }
}

impl Default for DefaultCachePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl CachePolicy for DefaultCachePolicy {
    fn expiration_secs(&self, method: &str, params: &Params) -> i64 {
        let lower = method.to_ascii_lowercase();
        if lower.contains("weekly") && !lower.contains("list") {
            if params.contains("from") && params.contains("to") {
                return YEAR;
            }
            return self.weekly_charts_expiration();
        }

        if WEEKLY_METHODS.contains(&method) {
            WEEK
        } else {
            NOT_CACHEABLE
        }
    }

    fn name(&self) -> &'static str {
        "default"
    }
}
