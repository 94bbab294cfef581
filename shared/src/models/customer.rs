//! Customer directory models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of directory entry.
///
/// An `Agent` is a standalone entry; a `CustomerOfAgent` keeps its own
/// contact fields but carries a weak back-reference to the agent it
/// buys through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerType {
    User,
    Agent,
    #[serde(rename = "Customer of Selected Agent")]
    CustomerOfAgent,
}

impl CustomerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerType::User => "User",
            CustomerType::Agent => "Agent",
            CustomerType::CustomerOfAgent => "Customer of Selected Agent",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "User" => Some(CustomerType::User),
            "Agent" => Some(CustomerType::Agent),
            "Customer of Selected Agent" => Some(CustomerType::CustomerOfAgent),
            _ => None,
        }
    }
}

impl Default for CustomerType {
    fn default() -> Self {
        CustomerType::User
    }
}

/// A stored customer directory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i32,
    pub customer_name: String,
    pub address: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    pub customer_type: CustomerType,
    pub agent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Canonical shipping/billing profile a booking or quotation snapshots.
///
/// Resolved either from a stored customer id (stored values win) or from
/// inline request fields (all required, type forced to `User`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_name: String,
    pub address: String,
    pub district: String,
    pub state: String,
    pub mobile_number: String,
    pub email: String,
}
