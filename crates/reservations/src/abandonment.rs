//! Abandonment penalty rules.
//!
//! Every hold that expires without converting into a checkout counts as one
//! failure against its user. At the threshold the user is banned from new
//! holds for a cool-down period and the counter resets in the same update.
//! Monotonic escalation: no partial bans, no decay other than on escalation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use curio_core::UserId;

/// Escalation thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanPolicy {
    /// Failures at which the ban is imposed.
    pub max_failed: i32,
    /// Length of the cool-down.
    pub ban_duration: Duration,
}

impl Default for BanPolicy {
    fn default() -> Self {
        Self {
            max_failed: 3,
            ban_duration: Duration::hours(24),
        }
    }
}

/// Per-user abuse bookkeeping (a slice of the larger user entity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbuseRecord {
    pub user_id: UserId,
    pub failed_reservation_count: i32,
    pub banned_until: Option<DateTime<Utc>>,
}

impl AbuseRecord {
    pub fn clean(user_id: UserId) -> Self {
        Self {
            user_id,
            failed_reservation_count: 0,
            banned_until: None,
        }
    }

    pub fn is_banned(&self, now: DateTime<Utc>) -> bool {
        matches!(self.banned_until, Some(until) if until > now)
    }

    /// Time left on an active ban, if any.
    pub fn ban_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self.banned_until {
            Some(until) if until > now => Some(until - now),
            _ => None,
        }
    }

    /// Record one abandonment. At `max_failed` the ban is imposed and the
    /// counter resets to zero in the same update, so post-ban counting
    /// restarts from scratch.
    pub fn record_failure(&mut self, policy: &BanPolicy, now: DateTime<Utc>) {
        self.failed_reservation_count += 1;
        if self.failed_reservation_count >= policy.max_failed {
            self.banned_until = Some(now + policy.ban_duration);
            self.failed_reservation_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_record() -> AbuseRecord {
        AbuseRecord::clean(UserId::new())
    }

    #[test]
    fn third_failure_imposes_ban_and_resets_counter() {
        let policy = BanPolicy::default();
        let now = Utc::now();
        let mut rec = test_record();

        rec.record_failure(&policy, now);
        rec.record_failure(&policy, now);
        assert_eq!(rec.failed_reservation_count, 2);
        assert!(!rec.is_banned(now));

        rec.record_failure(&policy, now);
        assert_eq!(rec.failed_reservation_count, 0);
        assert_eq!(rec.banned_until, Some(now + Duration::hours(24)));
        assert!(rec.is_banned(now));
    }

    #[test]
    fn post_ban_failures_count_from_one_not_four() {
        let policy = BanPolicy::default();
        let now = Utc::now();
        let mut rec = test_record();
        for _ in 0..3 {
            rec.record_failure(&policy, now);
        }

        // After the ban lapses, the next failure starts a fresh count.
        let later = now + Duration::hours(25);
        assert!(!rec.is_banned(later));
        rec.record_failure(&policy, later);
        assert_eq!(rec.failed_reservation_count, 1);
        assert!(!rec.is_banned(later));
    }

    #[test]
    fn ban_remaining_reports_cool_down() {
        let policy = BanPolicy::default();
        let now = Utc::now();
        let mut rec = test_record();
        for _ in 0..3 {
            rec.record_failure(&policy, now);
        }

        let remaining = rec.ban_remaining(now + Duration::hours(10)).unwrap();
        assert_eq!(remaining, Duration::hours(14));
        assert!(rec.ban_remaining(now + Duration::hours(24)).is_none());
    }
}
