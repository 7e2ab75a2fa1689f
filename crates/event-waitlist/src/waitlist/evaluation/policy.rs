//! Capacity formulas shared by every evaluation moment.
//!
//! Arithmetic is unsigned: `capacity - threshold` saturates at zero, which gives the same
//! comparisons as signed arithmetic because counts are never negative.

use super::super::counter::PoolCounts;

/// Limit handed to the generic per-resource cap before a submission is inserted.
pub fn expanded_limit(capacity_limit: u64, threshold: u64, counts: PoolCounts) -> u64 {
    let naive = capacity_limit.saturating_add(threshold);
    let total = counts.total();

    // Manual moves can push the raw total past the naive limit while accepted seats remain.
    if total >= naive && counts.not_waitlisted < naive {
        total.saturating_add(threshold)
    } else {
        naive
    }
}

/// Render-time estimate of whether the next submission will land on the waitlist.
pub fn notice_visible(capacity_limit: u64, threshold: u64, counts: PoolCounts) -> bool {
    counts.waitlisted < threshold
        && counts.not_waitlisted >= capacity_limit.saturating_sub(threshold)
        && counts.total() < capacity_limit
}

/// Whether a freshly inserted submission belongs in the waitlist pool.
///
/// `not_waitlisted` must already include the inserted row.
pub fn commits_to_waitlist(capacity_limit: u64, threshold: u64, not_waitlisted: u64) -> bool {
    not_waitlisted > capacity_limit.saturating_sub(threshold)
}

/// Whether the submit-time confirmation is replaced by the waitlist notice.
pub fn confirmation_overridden(capacity_limit: u64, threshold: u64, counts: PoolCounts) -> bool {
    counts.waitlisted < threshold && counts.not_waitlisted >= capacity_limit
}

/// Whether a resource at its effective limit turns further submissions away.
///
/// An enabled waitlist with zero threshold is a hard cutoff: rows past capacity are still
/// created and land on the waitlist.
pub fn refuses_at_limit(enabled: bool, threshold: u64) -> bool {
    !enabled || threshold > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_adds_threshold_to_capacity() {
        assert_eq!(expanded_limit(10, 3, PoolCounts::new(0, 0)), 13);
        assert_eq!(expanded_limit(10, 3, PoolCounts::new(1, 9)), 13);
        assert_eq!(expanded_limit(10, 0, PoolCounts::new(0, 10)), 10);
    }

    #[test]
    fn expansion_follows_manual_drift() {
        assert_eq!(expanded_limit(10, 3, PoolCounts::new(2, 12)), 17);
        assert_eq!(expanded_limit(10, 3, PoolCounts::new(13, 0)), 16);
    }

    #[test]
    fn expansion_stops_following_once_accepted_pool_reaches_limit() {
        assert_eq!(expanded_limit(10, 3, PoolCounts::new(1, 13)), 13);
    }

    #[test]
    fn expansion_never_drops_below_naive_limit() {
        for waitlisted in 0..20 {
            for not_waitlisted in 0..20 {
                let counts = PoolCounts::new(waitlisted, not_waitlisted);
                assert!(expanded_limit(10, 3, counts) >= 13, "{counts:?}");
            }
        }
    }

    #[test]
    fn notice_shows_inside_the_waitlist_window() {
        assert!(notice_visible(10, 3, PoolCounts::new(1, 8)));
        assert!(notice_visible(10, 3, PoolCounts::new(0, 7)));
    }

    #[test]
    fn notice_hidden_outside_the_window() {
        assert!(!notice_visible(10, 3, PoolCounts::new(0, 6)));
        assert!(!notice_visible(10, 3, PoolCounts::new(3, 7)));
        assert!(!notice_visible(10, 3, PoolCounts::new(2, 8)));
        assert!(!notice_visible(10, 0, PoolCounts::new(0, 10)));
    }

    #[test]
    fn commit_waitlists_above_the_cutoff() {
        assert!(!commits_to_waitlist(10, 3, 7));
        assert!(commits_to_waitlist(10, 3, 8));
        assert!(commits_to_waitlist(10, 3, 11));
        assert!(!commits_to_waitlist(10, 0, 10));
        assert!(commits_to_waitlist(10, 0, 11));
    }

    #[test]
    fn threshold_larger_than_capacity_waitlists_everything() {
        assert!(commits_to_waitlist(2, 5, 1));
        assert!(notice_visible(2, 5, PoolCounts::new(0, 0)));
    }

    #[test]
    fn confirmation_switches_once_capacity_is_reached() {
        assert!(!confirmation_overridden(10, 3, PoolCounts::new(0, 9)));
        assert!(confirmation_overridden(10, 3, PoolCounts::new(0, 10)));
        assert!(!confirmation_overridden(10, 3, PoolCounts::new(3, 10)));
    }

    #[test]
    fn zero_threshold_stores_instead_of_refusing() {
        assert!(!refuses_at_limit(true, 0));
        assert!(refuses_at_limit(true, 3));
        assert!(refuses_at_limit(false, 0));
    }
}
