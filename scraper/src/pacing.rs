//! Randomized pauses between requests.

use rand::Rng;
use std::time::Duration;

/// Inclusive millisecond range a pause is drawn from uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    /// Bounds given in the wrong order are swapped.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }
}

/// The two pauses of a scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After each page is fetched, before it is parsed.
    pub page_load: DelayRange,
    /// Between consecutive pages. Skipped after the last page.
    pub between_pages: DelayRange,
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            page_load: DelayRange::none(),
            between_pages: DelayRange::none(),
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            page_load: DelayRange::new(1000, 2000),
            between_pages: DelayRange::new(1500, 3000),
        }
    }
}

/// Something that can block the current thread for a while.
pub trait Pause: Send {
    fn pause(&self, duration: Duration);
}

/// Blocks with `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
