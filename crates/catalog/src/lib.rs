//! Catalog domain module.
//!
//! This crate contains the business rules for sellable items, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). The
//! stock check-and-decrement rule lives here; the engine is responsible for
//! running it inside a transaction with the item row locked.

pub mod item;

pub use item::{Item, ItemStatus};
