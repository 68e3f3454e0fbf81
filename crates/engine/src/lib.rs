//! `curio-engine` — the transactional reservation and checkout engine.
//!
//! Everything that touches storage lives here. The domain crates hold the
//! pure rules; this crate runs them inside transactions against a [`Store`],
//! which is the only place concurrency is resolved: one transaction per
//! incoming operation, item rows locked for update, every stock mutation
//! funneled through [`StockLedger`].

pub mod abandonment;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod ledger;
pub mod reservation;
pub mod store;
pub mod sweeper;


pub use abandonment::AbandonmentPolicy;
pub use catalog::CatalogService;
pub use checkout::CheckoutCoordinator;
pub use error::EngineError;
pub use ledger::StockLedger;
pub use reservation::{Availability, ReservationManager};
pub use store::{InMemoryStore, PostgresStore, Store, StoreError, StoreTx, SweepScope};
pub use sweeper::{HoldSweeper, SweeperHandle};
