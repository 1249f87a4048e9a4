use std::ops::Range;
use std::time::{Duration, Instant};

/// Number of chant cards per catalog page.
pub const PAGE_SIZE: usize = 100;
/// Settle time before a search edit is applied.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// One-based page cursor over a filtered result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    total: usize,
}

impl Pager {
    pub fn new(total: usize) -> Self {
        Self { page: 1, total }
    }

    /// Point the pager at a new result set. Always lands on page 1.
    pub fn reset(&mut self, total: usize) {
        self.page = 1;
        self.total = total;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// At least one page is reported even when nothing matched.
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(PAGE_SIZE).max(1)
    }

    /// Index range of the current page, clamped to the result length.
    pub fn range(&self) -> Range<usize> {
        let start = ((self.page - 1) * PAGE_SIZE).min(self.total);
        let end = (start + PAGE_SIZE).min(self.total);
        start..end
    }

    pub fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub fn can_next(&self) -> bool {
        self.page < self.page_count()
    }

    /// Step back one page. Returns `false` on the first page.
    pub fn prev(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Step forward one page. Returns `false` on the last page.
    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.page += 1;
        true
    }
}

/// Tracks the last keystroke and reports when typing has paused long enough.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    /// Record an edit at `now`, restarting the settle timer.
    pub fn touch(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Drop any pending edit without firing.
    pub fn cancel(&mut self) {
        self.pending_since = None;
    }

    /// Returns `true` once per pause: when an edit is pending and the delay
    /// has elapsed since the most recent one.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_never_drops_below_one() {
        assert_eq!(Pager::new(0).page_count(), 1);
        assert_eq!(Pager::new(1).page_count(), 1);
        assert_eq!(Pager::new(100).page_count(), 1);
        assert_eq!(Pager::new(101).page_count(), 2);
        assert_eq!(Pager::new(250).page_count(), 3);
    }

    #[test]
    fn ranges_stay_inside_the_collection() {
        let mut pager = Pager::new(250);
        assert_eq!(pager.range(), 0..100);
        assert!(pager.next());
        assert_eq!(pager.range(), 100..200);
        assert!(pager.next());
        assert_eq!(pager.range(), 200..250);
        assert_eq!(Pager::new(0).range(), 0..0);
    }

    #[test]
    fn navigation_is_a_no_op_at_the_bounds() {
        let mut pager = Pager::new(150);
        assert!(!pager.can_prev());
        assert!(!pager.prev());
        assert_eq!(pager.page(), 1);
        assert!(pager.next());
        assert!(!pager.can_next());
        assert!(!pager.next());
        assert_eq!(pager.page(), 2);

        let mut empty = Pager::new(0);
        assert!(!empty.can_prev());
        assert!(!empty.can_next());
        assert!(!empty.next());
    }

    #[test]
    fn reset_returns_to_first_page() {
        let mut pager = Pager::new(300);
        pager.next();
        pager.next();
        pager.reset(42);
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.total(), 42);
    }

    #[test]
    fn debouncer_fires_once_after_a_pause() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        assert!(!debouncer.fire(start));

        debouncer.touch(start);
        assert!(!debouncer.fire(start + Duration::from_millis(100)));
        debouncer.touch(start + Duration::from_millis(200));
        assert!(!debouncer.fire(start + Duration::from_millis(400)));
        assert!(debouncer.fire(start + Duration::from_millis(500)));
        assert!(!debouncer.fire(start + Duration::from_millis(900)));
    }

    #[test]
    fn cancelled_debouncer_never_fires() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.touch(start);
        debouncer.cancel();
        assert!(!debouncer.is_pending());
        assert!(!debouncer.fire(start + Duration::from_secs(5)));
    }
}
