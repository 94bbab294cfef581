//! Booking ledger tests
//!
//! Covers the financial invariants of the order state machine:
//! - amount_paid never exceeds total, payments sum to amount_paid
//! - per-line dispatched counters never exceed ordered quantities
//! - accruals are all-or-nothing

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::ids::{is_url_safe_id, new_order_id};
use shared::models::{
    allocate_dispatch, apply_dispatch, check_payment, items_total, order_total,
    total_dispatched_qty, total_ordered_qty, AccrualError, BookingStatus, ExtraCharges,
    LineDispatch, LineItem, PaymentMethod, ProductType, TransportInfo,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(name: &str, price: &str, discount: &str, quantity: i32) -> LineItem {
    LineItem {
        id: 1,
        product_type: ProductType::Crackers,
        productname: name.to_string(),
        price: dec(price),
        discount: dec(discount),
        quantity,
        dispatched: 0,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Two-line booking: 2 x 100 at 10% + 3 x 50 = 180 + 150 = 330
    #[test]
    fn test_two_line_totals() {
        let items = vec![
            item("Flower Pots", "100", "10", 2),
            item("Sparklers", "50", "0", 3),
        ];

        assert_eq!(items[0].line_total(), dec("180"));
        assert_eq!(items[1].line_total(), dec("150"));
        assert_eq!(items_total(&items), dec("330"));
        assert_eq!(total_ordered_qty(&items), 5);
    }

    #[test]
    fn test_extra_charges_net() {
        let extra = ExtraCharges {
            tax: dec("30"),
            packing_fee: dec("10"),
            deduction: dec("20"),
        };
        let items = vec![item("Flower Pots", "100", "0", 3)];

        assert_eq!(extra.net(), dec("20"));
        assert_eq!(order_total(&items, &extra), dec("320"));
    }

    /// First payment of 200 against a 350 total is accepted; a second
    /// 200 would push past the cap and must be rejected.
    #[test]
    fn test_payment_cap_sequence() {
        let total = dec("350");

        assert!(check_payment(total, dec("0"), dec("200")).is_ok());
        let second = check_payment(total, dec("200"), dec("200"));
        assert_eq!(
            second,
            Err(AccrualError::PaymentExceedsBalance {
                amount: dec("200"),
                remaining: dec("150"),
            })
        );
        // The exact remainder is still payable
        assert!(check_payment(total, dec("200"), dec("150")).is_ok());
    }

    #[test]
    fn test_payment_must_be_positive() {
        assert_eq!(
            check_payment(dec("100"), dec("0"), dec("0")),
            Err(AccrualError::NonPositivePayment)
        );
        assert_eq!(
            check_payment(dec("100"), dec("0"), dec("-5")),
            Err(AccrualError::NonPositivePayment)
        );
    }

    /// Dispatch 4 of 4, then any further dispatch on that line fails.
    #[test]
    fn test_dispatch_exhausts_line() {
        let mut items = vec![item("Flower Pots", "100", "0", 4)];

        let applied = apply_dispatch(&mut items, &[LineDispatch { index: 0, qty: 4 }]).unwrap();
        assert_eq!(applied, 4);
        assert_eq!(items[0].dispatched, 4);
        assert_eq!(items[0].remaining_qty(), 0);

        let overflow = apply_dispatch(&mut items, &[LineDispatch { index: 0, qty: 1 }]);
        assert_eq!(
            overflow,
            Err(AccrualError::DispatchExceedsLine {
                index: 0,
                remaining: 0,
                requested: 1,
            })
        );
        // The failed accrual left nothing behind
        assert_eq!(items[0].dispatched, 4);
    }

    /// A plan touching several lines is all-or-nothing: one bad line
    /// rejects the whole plan.
    #[test]
    fn test_dispatch_plan_is_atomic() {
        let mut items = vec![
            item("Flower Pots", "100", "0", 5),
            item("Sparklers", "50", "0", 2),
        ];

        let result = apply_dispatch(
            &mut items,
            &[
                LineDispatch { index: 0, qty: 3 },
                LineDispatch { index: 1, qty: 3 },
            ],
        );
        assert!(matches!(
            result,
            Err(AccrualError::DispatchExceedsLine { index: 1, .. })
        ));
        assert_eq!(items[0].dispatched, 0);
        assert_eq!(items[1].dispatched, 0);
    }

    #[test]
    fn test_dispatch_rejects_unknown_line() {
        let mut items = vec![item("Flower Pots", "100", "0", 5)];
        let result = apply_dispatch(&mut items, &[LineDispatch { index: 3, qty: 1 }]);
        assert_eq!(result, Err(AccrualError::NoSuchLine { index: 3 }));
    }

    /// Aggregate quantities fill lines front to back.
    #[test]
    fn test_allocate_aggregate_dispatch() {
        let mut items = vec![
            item("Flower Pots", "100", "0", 2),
            item("Sparklers", "50", "0", 3),
        ];

        let plan = allocate_dispatch(&items, 4).unwrap();
        assert_eq!(
            plan,
            vec![
                LineDispatch { index: 0, qty: 2 },
                LineDispatch { index: 1, qty: 2 },
            ]
        );

        apply_dispatch(&mut items, &plan).unwrap();
        assert_eq!(total_dispatched_qty(&items), 4);

        // Only one unit remains across the order
        let overflow = allocate_dispatch(&items, 2);
        assert_eq!(
            overflow,
            Err(AccrualError::DispatchExceedsOrder {
                requested: 2,
                remaining: 1,
            })
        );
        assert!(allocate_dispatch(&items, 1).is_ok());
    }

    #[test]
    fn test_status_accrual_targets() {
        assert!(!BookingStatus::Booked.is_accrual_target());
        assert!(BookingStatus::Paid.is_accrual_target());
        assert!(BookingStatus::Dispatched.is_accrual_target());
        assert!(BookingStatus::Delivered.is_accrual_target());

        assert!(!BookingStatus::Paid.carries_dispatch());
        assert!(BookingStatus::Dispatched.carries_dispatch());
        assert!(BookingStatus::Delivered.carries_dispatch());
    }

    #[test]
    fn test_payment_method_round_trip() {
        assert_eq!(PaymentMethod::from_str("cash"), Some(PaymentMethod::Cash));
        assert_eq!(PaymentMethod::from_str("bank"), Some(PaymentMethod::Bank));
        assert_eq!(PaymentMethod::from_str("upi"), None);
    }

    /// Order-id lookups refuse anything outside the URL-safe alphabet
    /// before touching the ledger; generated and historical ids pass.
    #[test]
    fn test_order_id_lookup_gate() {
        assert!(is_url_safe_id("ORD-1751548161837"));
        assert!(is_url_safe_id("DORD-1751548161837"));
        assert!(is_url_safe_id(&new_order_id()));

        assert!(!is_url_safe_id(""));
        assert!(!is_url_safe_id("ORD/1751548161837"));
        assert!(!is_url_safe_id("../../etc/passwd"));
        assert!(!is_url_safe_id("ORD-1751548161837%00"));
    }

    /// Transport detail fields only survive for real transport
    /// dispatches.
    #[test]
    fn test_transport_normalization() {
        let transport = TransportInfo {
            transport_type: Some("self".to_string()),
            transport_name: Some("KPN".to_string()),
            transport_contact: Some("9876543210".to_string()),
            lr_number: Some("LR-17".to_string()),
        }
        .normalized();
        assert_eq!(transport.transport_name, None);
        assert_eq!(transport.lr_number, None);

        let transport = TransportInfo {
            transport_type: Some("transport".to_string()),
            transport_name: Some("KPN".to_string()),
            transport_contact: None,
            lr_number: Some("LR-17".to_string()),
        }
        .normalized();
        assert_eq!(transport.transport_name.as_deref(), Some("KPN"));
        assert_eq!(transport.lr_number.as_deref(), Some("LR-17"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (1u32..=10_000).prop_map(Decimal::from)
    }

    fn items_strategy() -> impl Strategy<Value = Vec<LineItem>> {
        prop::collection::vec(
            (1u32..=500, 0u32..=100, 1i32..=50).prop_map(|(price, discount, qty)| LineItem {
                id: 1,
                product_type: ProductType::GiftBoxDealers,
                productname: "Gift Box".to_string(),
                price: Decimal::from(price),
                discount: Decimal::from(discount),
                quantity: qty,
                dispatched: 0,
            }),
            1..6,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Accepted payments never push amount_paid past the total.
        #[test]
        fn prop_payment_cap_holds(
            total in amount_strategy(),
            payments in prop::collection::vec(amount_strategy(), 1..10),
        ) {
            let mut paid = Decimal::ZERO;
            for amount in payments {
                if check_payment(total, paid, amount).is_ok() {
                    paid += amount;
                }
                prop_assert!(paid <= total);
                prop_assert!(paid >= Decimal::ZERO);
            }
        }

        /// A rejected payment leaves amount_paid exactly where it was,
        /// and the remaining balance is always payable in full.
        #[test]
        fn prop_remaining_balance_payable(
            total in amount_strategy(),
            first in amount_strategy(),
        ) {
            let mut paid = Decimal::ZERO;
            if check_payment(total, paid, first).is_ok() {
                paid += first;
            }
            let remaining = total - paid;
            if remaining > Decimal::ZERO {
                prop_assert!(check_payment(total, paid, remaining).is_ok());
                prop_assert!(check_payment(total, paid, remaining + Decimal::ONE).is_err());
            }
        }

        /// Per-line dispatched never exceeds ordered, and the aggregate
        /// always equals the sum of lines, across random plans.
        #[test]
        fn prop_dispatch_counters_bounded(
            mut items in items_strategy(),
            requests in prop::collection::vec((0usize..6, 1i32..=60), 1..12),
        ) {
            for (index, qty) in requests {
                let _ = apply_dispatch(&mut items, &[LineDispatch { index, qty }]);
                for item in &items {
                    prop_assert!(item.dispatched >= 0);
                    prop_assert!(item.dispatched <= item.quantity);
                }
            }
            let aggregate: i32 = items.iter().map(|l| l.dispatched).sum();
            prop_assert_eq!(total_dispatched_qty(&items), aggregate);
        }

        /// An allocated aggregate plan always applies cleanly and moves
        /// exactly the requested quantity.
        #[test]
        fn prop_allocation_applies_cleanly(
            mut items in items_strategy(),
            qty in 1i32..=100,
        ) {
            let remaining: i32 = items.iter().map(|l| l.remaining_qty()).sum();
            match allocate_dispatch(&items, qty) {
                Ok(plan) => {
                    prop_assert!(qty <= remaining);
                    let before = total_dispatched_qty(&items);
                    let applied = apply_dispatch(&mut items, &plan).unwrap();
                    prop_assert_eq!(applied, qty);
                    prop_assert_eq!(total_dispatched_qty(&items), before + qty);
                }
                Err(_) => prop_assert!(qty > remaining),
            }
        }

        /// Line totals are non-negative and the order total matches the
        /// sum of its parts.
        #[test]
        fn prop_totals_consistent(items in items_strategy()) {
            for item in &items {
                prop_assert!(item.line_total() >= Decimal::ZERO);
                prop_assert!(item.line_total() <= item.price * Decimal::from(item.quantity));
            }
            let extra = ExtraCharges::default();
            prop_assert_eq!(order_total(&items, &extra), items_total(&items));
        }
    }
}

// ============================================================================
// Concurrency simulation
// ============================================================================

mod concurrency_simulation {
    use super::*;

    /// Model of the guarded UPDATE: the predicate re-reads the current
    /// amount_paid, so it either accrues atomically or matches nothing.
    fn conditional_accrue(amount_paid: &mut Decimal, total: Decimal, amount: Decimal) -> bool {
        if *amount_paid + amount <= total {
            *amount_paid += amount;
            true
        } else {
            false
        }
    }

    /// Two racing payments of 200 against a 350 total: whatever the
    /// interleaving, exactly one wins.
    #[test]
    fn test_concurrent_payments_single_winner() {
        let total = dec("350");
        let mut amount_paid = dec("0");

        let first = conditional_accrue(&mut amount_paid, total, dec("200"));
        let second = conditional_accrue(&mut amount_paid, total, dec("200"));

        assert!(first);
        assert!(!second);
        assert_eq!(amount_paid, dec("200"));
    }

    /// The ledger stays reconciled: accepted payments sum to
    /// amount_paid no matter how many races are lost.
    #[test]
    fn test_ledger_reconciles_after_races() {
        let total = dec("1000");
        let mut amount_paid = dec("0");
        let mut ledger = Vec::new();

        for amount in ["400", "400", "400", "150", "100", "50"].map(dec) {
            if conditional_accrue(&mut amount_paid, total, amount) {
                ledger.push(amount);
            }
        }

        let ledger_sum: Decimal = ledger.iter().copied().sum();
        assert_eq!(ledger_sum, amount_paid);
        assert!(amount_paid <= total);
    }
}
