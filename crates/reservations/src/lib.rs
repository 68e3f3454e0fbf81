//! Reservations domain module.
//!
//! Pure rules for time-limited soft holds and for the abandonment penalty
//! that escalates repeated lapsed holds into a temporary ban. No IO here;
//! the engine applies these rules inside its transactions.

pub mod abandonment;
pub mod hold;

pub use abandonment::{AbuseRecord, BanPolicy};
pub use hold::{Hold, DEFAULT_HOLD_TTL};
