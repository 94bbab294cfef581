//! Quotation ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::booking::{ExtraCharges, LineItem};

/// Lifecycle of a quotation.
///
/// Only `pending -> booked` and `pending -> canceled` are legal; a
/// non-pending quotation is immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Pending,
    Booked,
    Canceled,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Pending => "pending",
            QuotationStatus::Booked => "booked",
            QuotationStatus::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(QuotationStatus::Pending),
            "booked" => Some(QuotationStatus::Booked),
            "canceled" => Some(QuotationStatus::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, QuotationStatus::Pending)
    }
}

/// A pre-booking estimate. Its total is always recomputed server-side
/// from the line items and extra charges; the client-declared figure is
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    pub id: i32,
    pub est_id: String,
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
    pub extra_charges: ExtraCharges,
    pub status: QuotationStatus,
    pub pdf: Option<String>,
    pub created_at: DateTime<Utc>,
}
