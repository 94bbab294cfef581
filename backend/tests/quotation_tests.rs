//! Quotation ledger tests
//!
//! Covers quotation lifecycle terminality, the promotion id contract,
//! and server-side total recomputation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::ids::{derive_order_id, is_url_safe_id, new_est_id, new_order_id};
use shared::models::{order_total, ExtraCharges, LineItem, ProductType, QuotationStatus};
use shared::validation::validate_extra_charges;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(price: &str, discount: &str, quantity: i32) -> LineItem {
    LineItem {
        id: 7,
        product_type: ProductType::GiftBoxDealers,
        productname: "Deluxe Gift Box".to_string(),
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

    /// Only pending quotations may change; booked and canceled are
    /// terminal.
    #[test]
    fn test_status_terminality() {
        assert!(!QuotationStatus::Pending.is_terminal());
        assert!(QuotationStatus::Booked.is_terminal());
        assert!(QuotationStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            QuotationStatus::Pending,
            QuotationStatus::Booked,
            QuotationStatus::Canceled,
        ] {
            assert_eq!(QuotationStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(QuotationStatus::from_str("accepted"), None);
    }

    /// Promotion keeps the numeric suffix so the booking and quotation
    /// stay correlated.
    #[test]
    fn test_promotion_id_contract() {
        assert_eq!(
            derive_order_id("EST-1751548161837").as_deref(),
            Some("ORD-1751548161837")
        );
        // Non-quotation ids are refused
        assert_eq!(derive_order_id("ORD-1751548161837"), None);
        assert_eq!(derive_order_id("EST"), None);
        assert_eq!(derive_order_id("EST-"), None);
    }

    #[test]
    fn test_generated_ids_are_url_safe() {
        assert!(is_url_safe_id(&new_est_id()));
        assert!(is_url_safe_id(&new_order_id()));
        assert!(!is_url_safe_id("EST/17"));
        assert!(!is_url_safe_id(""));
    }

    /// The server-computed quotation total comes from the lines and
    /// charges; a client-declared figure plays no part.
    #[test]
    fn test_total_recomputation() {
        let items = vec![item("100", "10", 2), item("50", "0", 3)];
        let extra = ExtraCharges {
            tax: dec("33"),
            packing_fee: dec("7"),
            deduction: dec("20"),
        };

        // 180 + 150 + (33 + 7 - 20)
        assert_eq!(order_total(&items, &extra), dec("350"));
    }

    /// Negative charge fields never reach the ledger.
    #[test]
    fn test_negative_charges_rejected() {
        for extra in [
            ExtraCharges {
                tax: dec("-1"),
                ..ExtraCharges::default()
            },
            ExtraCharges {
                packing_fee: dec("-0.5"),
                ..ExtraCharges::default()
            },
            ExtraCharges {
                deduction: dec("-20"),
                ..ExtraCharges::default()
            },
        ] {
            assert!(validate_extra_charges(&extra).is_err());
        }
        assert!(validate_extra_charges(&ExtraCharges::default()).is_ok());
    }

    /// A deduction larger than the rest of the order drives the
    /// recomputed total negative. The charges themselves pass field
    /// validation, so the ledger has to refuse on the total's sign.
    #[test]
    fn test_deduction_exceeding_order_value() {
        let items = vec![item("100", "0", 1)];
        let extra = ExtraCharges {
            tax: dec("0"),
            packing_fee: dec("0"),
            deduction: dec("500"),
        };

        assert!(validate_extra_charges(&extra).is_ok());
        assert_eq!(order_total(&items, &extra), dec("-400"));
        assert!(order_total(&items, &extra) < Decimal::ZERO);
    }

    /// A stale promote: by the time the second caller arrives the
    /// quotation is already booked, so the guard refuses it.
    #[test]
    fn test_stale_promote_refused() {
        let mut status = QuotationStatus::Pending;

        // First promotion wins
        assert!(!status.is_terminal());
        status = QuotationStatus::Booked;

        // Second promotion sees the terminal status
        assert!(status.is_terminal());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn items_strategy() -> impl Strategy<Value = Vec<LineItem>> {
        prop::collection::vec(
            (1u32..=1000, 0u32..=100, 1i32..=99).prop_map(|(price, discount, qty)| {
                LineItem {
                    id: 1,
                    product_type: ProductType::Crackers,
                    productname: "Atom Bomb".to_string(),
                    price: Decimal::from(price),
                    discount: Decimal::from(discount),
                    quantity: qty,
                    dispatched: 0,
                }
            }),
            1..8,
        )
    }

    fn charges_strategy() -> impl Strategy<Value = ExtraCharges> {
        (0u32..=500, 0u32..=500, 0u32..=500).prop_map(|(tax, packing, deduction)| ExtraCharges {
            tax: Decimal::from(tax),
            packing_fee: Decimal::from(packing),
            deduction: Decimal::from(deduction),
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Recomputing the same lines always lands on the same total.
        #[test]
        fn prop_total_deterministic(
            items in items_strategy(),
            extra in charges_strategy(),
        ) {
            prop_assert_eq!(order_total(&items, &extra), order_total(&items, &extra));
        }

        /// Charges shift the total by exactly their net amount.
        #[test]
        fn prop_charges_shift_total(
            items in items_strategy(),
            extra in charges_strategy(),
        ) {
            let bare = order_total(&items, &ExtraCharges::default());
            prop_assert_eq!(order_total(&items, &extra), bare + extra.net());
        }

        /// Prefix substitution commutes with the epoch suffix: every
        /// derivable est id maps to an order id sharing its suffix.
        #[test]
        fn prop_promotion_preserves_suffix(suffix in 1u64..=u64::MAX / 2) {
            let est_id = format!("EST-{}", suffix);
            let order_id = derive_order_id(&est_id).unwrap();
            prop_assert_eq!(order_id, format!("ORD-{}", suffix));
        }
    }
}
