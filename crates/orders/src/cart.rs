//! Cart validation and total computation.

use serde::{Deserialize, Serialize};

use curio_core::{DomainError, DomainResult, ItemId, Money};

/// One requested line of a checkout, with the price snapshotted when the
/// item was added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Validate a cart and return its lines sorted ascending by item id.
///
/// The stable ordering bounds lock-ordering deadlocks: two concurrent
/// checkouts touching the same items always lock them in the same order.
/// Duplicate item lines are kept distinct; each decrements on its own.
pub fn normalize_lines(lines: Vec<CartLine>) -> DomainResult<Vec<CartLine>> {
    if lines.is_empty() {
        return Err(DomainError::validation("cart cannot be empty"));
    }
    for line in &lines {
        if line.quantity < 1 {
            return Err(DomainError::validation("line quantity must be at least 1"));
        }
    }
    let mut lines = lines;
    lines.sort_by_key(|l| l.item_id);
    Ok(lines)
}

/// `Σ(unit_price × quantity)` with checked arithmetic.
pub fn cart_total(lines: &[CartLine]) -> DomainResult<Money> {
    let mut total = Money::ZERO;
    for line in lines {
        total = total.checked_add(line.unit_price.checked_mul(line.quantity)?)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_line(quantity: i64, cents: i64) -> CartLine {
        CartLine {
            item_id: ItemId::new(),
            quantity,
            unit_price: Money::from_cents(cents).unwrap(),
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        assert!(normalize_lines(vec![]).is_err());
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        assert!(normalize_lines(vec![test_line(0, 100)]).is_err());
    }

    #[test]
    fn lines_come_back_sorted_by_item_id() {
        let mut lines = vec![test_line(1, 100), test_line(1, 200), test_line(1, 300)];
        lines.reverse();
        let normalized = normalize_lines(lines).unwrap();
        let ids: Vec<_> = normalized.iter().map(|l| l.item_id).collect();
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(normalized.len(), 3);
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let total = cart_total(&[test_line(2, 250), test_line(3, 100)]).unwrap();
        assert_eq!(total, Money::from_cents(800).unwrap());
    }

    #[test]
    fn total_overflow_is_a_validation_error() {
        let line = CartLine {
            item_id: ItemId::new(),
            quantity: i64::MAX,
            unit_price: Money::from_cents(2).unwrap(),
        };
        assert!(cart_total(&[line]).is_err());
    }
}
