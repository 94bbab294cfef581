//! Booking ledger models and the pure accrual arithmetic
//!
//! The booking is the financial record of an order: its `total` is fixed
//! at creation, `amount_paid` and `dispatched_qty` only ever grow, and
//! every accepted accrual leaves an immutable ledger row behind
//! (payment transaction or dispatch log).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::product::ProductType;

/// Lifecycle states of a booking.
///
/// `booked -> paid -> dispatched -> delivered` is the usual path. The
/// target state of an accrual is taken from the caller within the
/// allowed set; strict sequencing is deliberately not enforced (a
/// walk-in order can go straight to delivered).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Paid,
    Dispatched,
    Delivered,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Paid => "paid",
            BookingStatus::Dispatched => "dispatched",
            BookingStatus::Delivered => "delivered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(BookingStatus::Booked),
            "paid" => Some(BookingStatus::Paid),
            "dispatched" => Some(BookingStatus::Dispatched),
            "delivered" => Some(BookingStatus::Delivered),
            _ => None,
        }
    }

    /// States a caller may move a booking to via status accrual.
    pub fn is_accrual_target(&self) -> bool {
        !matches!(self, BookingStatus::Booked)
    }

    /// Whether this target carries dispatch quantities.
    pub fn carries_dispatch(&self) -> bool {
        matches!(self, BookingStatus::Dispatched | BookingStatus::Delivered)
    }
}

/// How a payment was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Bank => "bank",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMethod::Cash),
            "bank" => Some(PaymentMethod::Bank),
            _ => None,
        }
    }
}

/// One ordered product line inside a booking or quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i32,
    pub product_type: ProductType,
    pub productname: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    pub quantity: i32,
    /// Units shipped so far for this line; never exceeds `quantity`.
    #[serde(default)]
    pub dispatched: i32,
}

impl LineItem {
    /// Discounted price for the full line.
    pub fn line_total(&self) -> Decimal {
        let unit = self.price - self.price * self.discount / Decimal::from(100);
        unit * Decimal::from(self.quantity)
    }

    pub fn remaining_qty(&self) -> i32 {
        self.quantity - self.dispatched
    }
}

/// Charges applied on top of the item total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraCharges {
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub packing_fee: Decimal,
    #[serde(default)]
    pub deduction: Decimal,
}

impl ExtraCharges {
    /// Net adjustment these charges add to a total.
    pub fn net(&self) -> Decimal {
        self.tax + self.packing_fee - self.deduction
    }
}

/// Transport details captured when a booking enters a dispatch-capable
/// state. Detail fields are only meaningful for `transport_type ==
/// "transport"`; otherwise they are cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportInfo {
    pub transport_type: Option<String>,
    pub transport_name: Option<String>,
    pub transport_contact: Option<String>,
    pub lr_number: Option<String>,
}

impl TransportInfo {
    /// Keep detail fields only for real transport dispatches.
    pub fn normalized(mut self) -> Self {
        if self.transport_type.as_deref() != Some("transport") {
            self.transport_name = None;
            self.transport_contact = None;
            self.lr_number = None;
        }
        self
    }
}

/// A booking (order) with its financial accumulators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i32,
    pub order_id: String,
    pub customer_id: Option<i32>,
    pub customer_name: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    pub customer_type: String,
    pub products: Vec<LineItem>,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub dispatched_qty: i32,
    pub status: BookingStatus,
    #[serde(flatten)]
    pub transport: TransportInfo,
    pub extra_charges: ExtraCharges,
    pub pdf: Option<String>,
    pub receipt_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Immutable payment ledger row. The sum of a booking's rows equals its
/// `amount_paid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: i32,
    pub booking_id: i32,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub admin_id: i32,
    pub created_at: DateTime<Utc>,
}

/// Immutable dispatch ledger row, one per affected line per event,
/// snapshotting the booking's finances at event time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchLogEntry {
    pub id: i32,
    pub order_id: String,
    pub booking_id: i32,
    pub product_index: i32,
    pub productname: String,
    pub ordered_qty: i32,
    pub dispatched_qty: i32,
    pub transport: TransportInfo,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One line of a dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDispatch {
    pub index: usize,
    pub qty: i32,
}

/// Why an accrual was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualError {
    #[error("payment of {amount} exceeds remaining balance {remaining}")]
    PaymentExceedsBalance { amount: Decimal, remaining: Decimal },
    #[error("payment amount must be positive")]
    NonPositivePayment,
    #[error("dispatch quantity must be positive")]
    NonPositiveDispatch,
    #[error("line {index} does not exist")]
    NoSuchLine { index: usize },
    #[error("line {index} has {remaining} units left, cannot dispatch {requested}")]
    DispatchExceedsLine {
        index: usize,
        remaining: i32,
        requested: i32,
    },
    #[error("{requested} units requested but only {remaining} remain undispatched")]
    DispatchExceedsOrder { requested: i32, remaining: i32 },
}

/// Sum of discounted line totals.
pub fn items_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::line_total).sum()
}

/// Authoritative order total: discounted items plus extra charges.
pub fn order_total(items: &[LineItem], extra: &ExtraCharges) -> Decimal {
    items_total(items) + extra.net()
}

/// Total units ordered across all lines.
pub fn total_ordered_qty(items: &[LineItem]) -> i32 {
    items.iter().map(|l| l.quantity).sum()
}

/// Total units dispatched across all lines.
pub fn total_dispatched_qty(items: &[LineItem]) -> i32 {
    items.iter().map(|l| l.dispatched).sum()
}

/// Check a payment against the cap invariant `amount_paid + amount <= total`.
pub fn check_payment(
    total: Decimal,
    amount_paid: Decimal,
    amount: Decimal,
) -> Result<(), AccrualError> {
    if amount <= Decimal::ZERO {
        return Err(AccrualError::NonPositivePayment);
    }
    let remaining = total - amount_paid;
    if amount > remaining {
        return Err(AccrualError::PaymentExceedsBalance { amount, remaining });
    }
    Ok(())
}

/// Apply an explicit per-line dispatch plan, bumping `dispatched`
/// counters in place. Rejects the whole plan (leaving `items` untouched)
/// if any line would exceed its ordered quantity.
pub fn apply_dispatch(items: &mut [LineItem], plan: &[LineDispatch]) -> Result<i32, AccrualError> {
    let mut staged: Vec<i32> = items.iter().map(|l| l.dispatched).collect();
    let mut applied = 0;
    for line in plan {
        if line.qty <= 0 {
            return Err(AccrualError::NonPositiveDispatch);
        }
        let ordered = items
            .get(line.index)
            .ok_or(AccrualError::NoSuchLine { index: line.index })?
            .quantity;
        let next = staged[line.index] + line.qty;
        if next > ordered {
            return Err(AccrualError::DispatchExceedsLine {
                index: line.index,
                remaining: ordered - staged[line.index],
                requested: line.qty,
            });
        }
        staged[line.index] = next;
        applied += line.qty;
    }
    if applied == 0 {
        return Err(AccrualError::NonPositiveDispatch);
    }
    for (item, next) in items.iter_mut().zip(staged) {
        item.dispatched = next;
    }
    Ok(applied)
}

/// Turn an aggregate dispatch quantity into a per-line plan, filling
/// lines front to back from whatever each still has undispatched.
pub fn allocate_dispatch(items: &[LineItem], qty: i32) -> Result<Vec<LineDispatch>, AccrualError> {
    if qty <= 0 {
        return Err(AccrualError::NonPositiveDispatch);
    }
    let remaining: i32 = items.iter().map(LineItem::remaining_qty).sum();
    if qty > remaining {
        return Err(AccrualError::DispatchExceedsOrder {
            requested: qty,
            remaining,
        });
    }
    let mut plan = Vec::new();
    let mut left = qty;
    for (index, item) in items.iter().enumerate() {
        if left == 0 {
            break;
        }
        let take = left.min(item.remaining_qty());
        if take > 0 {
            plan.push(LineDispatch { index, qty: take });
            left -= take;
        }
    }
    Ok(plan)
}
