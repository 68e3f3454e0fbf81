//! Orders domain module.
//!
//! Pure rules for committed purchases: the order entity and its status
//! lifecycle, and cart normalization/total computation. Order creation
//! itself is the engine's job (it must happen inside a transaction).

pub mod cart;
pub mod order;

pub use cart::{cart_total, normalize_lines, CartLine};
pub use order::{CustomerDetails, Order, OrderLine, OrderStatus};
