//! Dealer portal account and back-office admin models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered dealer account. The password hash never leaves the
/// backend; this is the public shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub companyname: String,
    pub licencenumber: Option<String>,
    pub address: String,
    pub district: String,
    pub state: String,
    pub mobile_number: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A back-office admin who records payments. Payment transactions carry
/// the recording admin's id for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: i32,
    pub username: String,
}
