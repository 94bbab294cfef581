//! Inventory tests
//!
//! Covers the stock accounting invariants:
//! - stock never goes negative
//! - reservations are conditional on availability and sufficiency
//! - multi-line reservations are all-or-nothing
//! - restocks minus reservations reconcile with the stock level

use proptest::prelude::*;

use shared::models::{Availability, PerUnit, ProductType};

// ============================================================================
// Reservation simulation
// ============================================================================

/// In-memory model of the conditional reservation UPDATE: decrement
/// only when the product is on sale and has enough stock, reporting
/// whether a row matched.
#[derive(Debug, Clone)]
struct StockModel {
    stock: i32,
    status: Availability,
}

impl StockModel {
    fn new(stock: i32) -> Self {
        Self {
            stock,
            status: Availability::On,
        }
    }

    fn try_reserve(&mut self, qty: i32) -> bool {
        if qty < 1 {
            return false;
        }
        if self.status == Availability::On && self.stock >= qty {
            self.stock -= qty;
            true
        } else {
            false
        }
    }

    fn restock(&mut self, qty: i32) {
        assert!(qty > 0);
        self.stock += qty;
    }
}

/// Reserve every line or none: stage against clones, commit only when
/// all succeed. Models the transaction rollback around per-line
/// reservations.
fn reserve_all(products: &mut [StockModel], lines: &[(usize, i32)]) -> bool {
    let mut staged: Vec<StockModel> = products.to_vec();
    for &(index, qty) in lines {
        if index >= staged.len() || !staged[index].try_reserve(qty) {
            return false;
        }
    }
    products.clone_from_slice(&staged);
    true
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_reservation_decrements_stock() {
        let mut product = StockModel::new(10);
        assert!(product.try_reserve(4));
        assert_eq!(product.stock, 6);
    }

    /// Exactly exhausting the stock is allowed; one more unit is not.
    #[test]
    fn test_reservation_boundary() {
        let mut product = StockModel::new(5);
        assert!(product.try_reserve(5));
        assert_eq!(product.stock, 0);
        assert!(!product.try_reserve(1));
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_unavailable_product_rejects_reservation() {
        let mut product = StockModel::new(10);
        product.status = Availability::Off;
        assert!(!product.try_reserve(1));
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn test_nonpositive_quantities_rejected() {
        let mut product = StockModel::new(10);
        assert!(!product.try_reserve(0));
        assert!(!product.try_reserve(-3));
        assert_eq!(product.stock, 10);
    }

    /// Two requests racing for the last units: the conditional check
    /// and the decrement are one step, so exactly one wins.
    #[test]
    fn test_racing_reservations_single_winner() {
        let mut product = StockModel::new(5);
        let first = product.try_reserve(4);
        let second = product.try_reserve(4);
        assert!(first);
        assert!(!second);
        assert_eq!(product.stock, 1);
    }

    /// A failure at the third line leaves the first two untouched.
    #[test]
    fn test_multi_line_reservation_is_atomic() {
        let mut products = vec![StockModel::new(10), StockModel::new(10), StockModel::new(2)];

        let ok = reserve_all(&mut products, &[(0, 5), (1, 5), (2, 5)]);
        assert!(!ok);
        assert_eq!(products[0].stock, 10);
        assert_eq!(products[1].stock, 10);
        assert_eq!(products[2].stock, 2);

        let ok = reserve_all(&mut products, &[(0, 5), (1, 5), (2, 2)]);
        assert!(ok);
        assert_eq!(products[0].stock, 5);
        assert_eq!(products[2].stock, 0);
    }

    #[test]
    fn test_availability_toggle() {
        assert_eq!(Availability::On.toggled(), Availability::Off);
        assert_eq!(Availability::Off.toggled(), Availability::On);
        assert_eq!(Availability::from_str("on"), Some(Availability::On));
        assert_eq!(Availability::from_str("enabled"), None);
    }

    /// The product family tag is a fixed allow-list.
    #[test]
    fn test_product_type_allow_list() {
        assert_eq!(
            ProductType::from_str("gift_box_dealers"),
            Some(ProductType::GiftBoxDealers)
        );
        assert_eq!(ProductType::from_str("crackers"), Some(ProductType::Crackers));
        // Anything else is refused rather than interpreted
        assert_eq!(ProductType::from_str("crackers; DROP TABLE products"), None);
        assert_eq!(ProductType::from_str("Crackers"), None);
    }

    #[test]
    fn test_per_unit_values() {
        for per in [PerUnit::Pieces, PerUnit::Box, PerUnit::Pkt] {
            assert_eq!(PerUnit::from_str(per.as_str()), Some(per));
        }
        assert_eq!(PerUnit::from_str("dozen"), None);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    #[derive(Debug, Clone)]
    enum StockOp {
        Reserve(i32),
        Restock(i32),
        Toggle,
    }

    fn op_strategy() -> impl Strategy<Value = StockOp> {
        prop_oneof![
            (1i32..=30).prop_map(StockOp::Reserve),
            (1i32..=30).prop_map(StockOp::Restock),
            Just(StockOp::Toggle),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Stock never goes negative under any interleaving of
        /// reservations, restocks, and availability flips.
        #[test]
        fn prop_stock_never_negative(
            initial in 0i32..=100,
            ops in prop::collection::vec(op_strategy(), 1..40),
        ) {
            let mut product = StockModel::new(initial);
            for op in ops {
                match op {
                    StockOp::Reserve(qty) => {
                        product.try_reserve(qty);
                    }
                    StockOp::Restock(qty) => product.restock(qty),
                    StockOp::Toggle => product.status = product.status.toggled(),
                }
                prop_assert!(product.stock >= 0);
            }
        }

        /// Accounting identity: stock == initial + restocks − accepted
        /// reservations.
        #[test]
        fn prop_stock_reconciles(
            initial in 0i32..=100,
            ops in prop::collection::vec(op_strategy(), 1..40),
        ) {
            let mut product = StockModel::new(initial);
            let mut restocked = 0i64;
            let mut reserved = 0i64;
            for op in ops {
                match op {
                    StockOp::Reserve(qty) => {
                        if product.try_reserve(qty) {
                            reserved += qty as i64;
                        }
                    }
                    StockOp::Restock(qty) => {
                        product.restock(qty);
                        restocked += qty as i64;
                    }
                    StockOp::Toggle => product.status = product.status.toggled(),
                }
            }
            prop_assert_eq!(
                product.stock as i64,
                initial as i64 + restocked - reserved
            );
        }

        /// All-or-nothing: a failed multi-line reservation changes no
        /// stock at all, a successful one changes every line by its
        /// quantity.
        #[test]
        fn prop_multi_line_atomicity(
            stocks in prop::collection::vec(0i32..=50, 1..6),
            lines in prop::collection::vec((0usize..6, 1i32..=60), 1..6),
        ) {
            let mut products: Vec<StockModel> =
                stocks.iter().map(|&s| StockModel::new(s)).collect();
            let before: Vec<i32> = products.iter().map(|p| p.stock).collect();

            let ok = reserve_all(&mut products, &lines);
            if ok {
                let mut expected = before.clone();
                for &(index, qty) in &lines {
                    expected[index] -= qty;
                }
                let after: Vec<i32> = products.iter().map(|p| p.stock).collect();
                prop_assert_eq!(after, expected);
                prop_assert!(products.iter().all(|p| p.stock >= 0));
            } else {
                let after: Vec<i32> = products.iter().map(|p| p.stock).collect();
                prop_assert_eq!(before, after);
            }
        }
    }
}
