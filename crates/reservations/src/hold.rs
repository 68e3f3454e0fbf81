use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use curio_core::{DomainError, DomainResult, HoldId, ItemId, UserId};

/// Default time-to-live for a soft hold.
pub const DEFAULT_HOLD_TTL: Duration = Duration::minutes(15);

/// A time-bound claim on stock by one user. Not yet a sale.
///
/// An expired hold stays logically active for availability purposes until a
/// sweep observes it (lazy expiry is an accepted staleness window, bounded
/// by the sweep interval).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub id: HoldId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    pub fn new(
        user_id: UserId,
        item_id: ItemId,
        quantity: i64,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        Ok(Self {
            id: HoldId::new(),
            user_id,
            item_id,
            quantity,
            expires_at: now + ttl,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_expires_after_ttl() {
        let now = Utc::now();
        let hold = Hold::new(UserId::new(), ItemId::new(), 1, DEFAULT_HOLD_TTL, now).unwrap();
        assert_eq!(hold.expires_at, now + Duration::minutes(15));
        assert!(!hold.is_expired(now));
        assert!(!hold.is_expired(hold.expires_at));
        assert!(hold.is_expired(hold.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn zero_quantity_hold_is_rejected() {
        let now = Utc::now();
        assert!(Hold::new(UserId::new(), ItemId::new(), 0, DEFAULT_HOLD_TTL, now).is_err());
    }
}
