//! Store-backed abandonment policy.
//!
//! Applies the pure escalation rules from `curio-reservations` to the user's
//! abuse row inside the caller's transaction. The row is created lazily on
//! first failure; a user with no row has a clean history.

use chrono::{DateTime, Utc};

use curio_core::{DomainError, UserId};
use curio_reservations::{AbuseRecord, BanPolicy};

use crate::error::EngineError;
use crate::store::StoreTx;

#[derive(Debug, Clone, Copy, Default)]
pub struct AbandonmentPolicy {
    policy: BanPolicy,
}

impl AbandonmentPolicy {
    pub fn new(policy: BanPolicy) -> Self {
        Self { policy }
    }

    /// Record one abandonment against the user, escalating to a ban at the
    /// threshold. Returns the updated record.
    pub async fn record_failure(
        &self,
        tx: &mut dyn StoreTx,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<AbuseRecord, EngineError> {
        let mut record = tx
            .abuse_record_for_update(user_id)
            .await?
            .unwrap_or_else(|| AbuseRecord::clean(user_id));
        record.record_failure(&self.policy, now);
        tx.upsert_abuse_record(&record).await?;
        Ok(record)
    }

    pub async fn is_banned(
        &self,
        tx: &mut dyn StoreTx,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        Ok(match tx.abuse_record_for_update(user_id).await? {
            Some(record) => record.is_banned(now),
            None => false,
        })
    }

    /// Precondition check for hold creation: `Banned { until }` when the
    /// user is in cool-down.
    pub async fn check_not_banned(
        &self,
        tx: &mut dyn StoreTx,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if let Some(record) = tx.abuse_record_for_update(user_id).await? {
            if record.is_banned(now) {
                let until = record.banned_until.unwrap_or(now);
                return Err(DomainError::banned(until).into());
            }
        }
        Ok(())
    }
}
