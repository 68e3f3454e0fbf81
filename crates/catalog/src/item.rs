use serde::{Deserialize, Serialize};

use curio_core::{DomainError, DomainResult, ItemId, Money};

/// Operator-facing item label.
///
/// Not itself authoritative for concurrency: derived from stock and holds,
/// but an operator may override it manually. `Sold` is only ever set by an
/// operator action, never by stock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Reserved,
    Sold,
}

/// A sellable unit with an authoritative stock counter.
///
/// `stock` is mutated only through [`Item::try_decrement`] and
/// [`Item::increment`], never by direct assignment. Invariant: `stock >= 0`
/// in every reachable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub stock: i64,
    pub status: ItemStatus,
    /// Live price in cents. Snapshotted onto order lines at commit time.
    pub price: Money,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, stock: i64, price: Money) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if stock < 0 {
            return Err(DomainError::validation("stock cannot be negative"));
        }
        Ok(Self {
            id,
            name,
            stock,
            status: ItemStatus::Available,
            price,
        })
    }

    /// Atomically check `stock >= qty` and decrement.
    ///
    /// When stock reaches zero the status flips to `Reserved` as an
    /// informational signal for operators; `Sold` is never set here.
    /// The caller must hold the item row exclusively for the duration of
    /// its transaction, otherwise this check-then-write races.
    pub fn try_decrement(&mut self, qty: i64) -> DomainResult<()> {
        if qty < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if self.stock < qty {
            return Err(DomainError::insufficient_stock(self.name.clone()));
        }
        self.stock -= qty;
        if self.stock == 0 {
            self.status = ItemStatus::Reserved;
        }
        Ok(())
    }

    /// Atomic add-back, used when an order is cancelled or a commit rolls
    /// back outside the transaction boundary.
    ///
    /// Restores `Available` when stock rises from zero, unless an operator
    /// already marked the item `Sold`.
    pub fn increment(&mut self, qty: i64) -> DomainResult<()> {
        if qty < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        let was_zero = self.stock == 0;
        self.stock = self
            .stock
            .checked_add(qty)
            .ok_or_else(|| DomainError::validation("stock overflow"))?;
        if was_zero && self.status == ItemStatus::Reserved {
            self.status = ItemStatus::Available;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_item(stock: i64) -> Item {
        Item::new(ItemId::new(), "walnut writing desk", stock, Money::from_cents(125_00).unwrap())
            .unwrap()
    }

    #[test]
    fn decrement_requires_sufficient_stock() {
        let mut item = test_item(1);
        assert!(item.try_decrement(2).is_err());
        assert_eq!(item.stock, 1);

        item.try_decrement(1).unwrap();
        assert_eq!(item.stock, 0);

        let err = item.try_decrement(1).unwrap_err();
        assert_eq!(
            err,
            DomainError::insufficient_stock("walnut writing desk")
        );
    }

    #[test]
    fn exhaustion_flips_status_to_reserved_never_sold() {
        let mut item = test_item(2);
        item.try_decrement(1).unwrap();
        assert_eq!(item.status, ItemStatus::Available);
        item.try_decrement(1).unwrap();
        assert_eq!(item.status, ItemStatus::Reserved);
    }

    #[test]
    fn increment_restores_availability() {
        let mut item = test_item(1);
        item.try_decrement(1).unwrap();
        item.increment(1).unwrap();
        assert_eq!(item.stock, 1);
        assert_eq!(item.status, ItemStatus::Available);
    }

    #[test]
    fn increment_leaves_operator_sold_alone() {
        let mut item = test_item(1);
        item.try_decrement(1).unwrap();
        item.status = ItemStatus::Sold; // operator override
        item.increment(1).unwrap();
        assert_eq!(item.status, ItemStatus::Sold);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut item = test_item(1);
        assert!(item.try_decrement(0).is_err());
        assert!(item.increment(0).is_err());
    }

    proptest! {
        /// Stock never goes negative under any sequence of decrements and
        /// increments, whatever succeeds or fails along the way.
        #[test]
        fn stock_never_negative(initial in 0i64..20, ops in proptest::collection::vec((any::<bool>(), 1i64..5), 0..40)) {
            let mut item = test_item(initial);
            for (dec, qty) in ops {
                if dec {
                    let _ = item.try_decrement(qty);
                } else {
                    let _ = item.increment(qty);
                }
                prop_assert!(item.stock >= 0);
            }
        }
    }
}
