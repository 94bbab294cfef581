//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product families carried by the dealer.
///
/// The catalog is a single table tagged by this enum; the tag is always
/// bound as a query parameter, never spliced into an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    GiftBoxDealers,
    Crackers,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::GiftBoxDealers => "gift_box_dealers",
            ProductType::Crackers => "crackers",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gift_box_dealers" => Some(ProductType::GiftBoxDealers),
            "crackers" => Some(ProductType::Crackers),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a product is offered for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    On,
    Off,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::On => "on",
            Availability::Off => "off",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "on" => Some(Availability::On),
            "off" => Some(Availability::Off),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Availability::On => Availability::Off,
            Availability::Off => Availability::On,
        }
    }
}

/// Unit a product is priced per.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerUnit {
    Pieces,
    Box,
    Pkt,
}

impl PerUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerUnit::Pieces => "pieces",
            PerUnit::Box => "box",
            PerUnit::Pkt => "pkt",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pieces" => Some(PerUnit::Pieces),
            "box" => Some(PerUnit::Box),
            "pkt" => Some(PerUnit::Pkt),
            _ => None,
        }
    }
}

/// A catalog product.
///
/// `stock` never goes negative: it is decremented only through the
/// reservation path, which checks availability and sufficiency in the
/// same statement that performs the decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub product_type: ProductType,
    pub serial_number: String,
    pub productname: String,
    pub price: Decimal,
    pub per: PerUnit,
    pub discount: Decimal,
    pub stock: i32,
    pub status: Availability,
    pub fast_running: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only restock audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAuditEntry {
    pub id: i32,
    pub product_id: i32,
    pub quantity_added: i32,
    pub created_at: DateTime<Utc>,
}
