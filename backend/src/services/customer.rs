//! Customer directory service
//!
//! Bookings and quotations snapshot a full `CustomerProfile` at
//! creation. The profile resolves either from a stored directory entry
//! (stored values win) or from inline walk-in fields, in which case
//! every field is required and the type is forced to `User`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};

use shared::models::{Customer, CustomerProfile, CustomerType};
use shared::validation::validate_profile;

use crate::error::{AppError, AppResult};

/// Customer directory service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

#[derive(Debug, Clone, FromRow)]
pub struct CustomerRow {
    pub id: i32,
    pub customer_name: String,
    pub address: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
    pub customer_type: String,
    pub agent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self) -> AppResult<Customer> {
        let customer_type = CustomerType::from_str(&self.customer_type).ok_or_else(|| {
            AppError::Internal(format!("bad customer_type {}", self.customer_type))
        })?;
        Ok(Customer {
            id: self.id,
            customer_name: self.customer_name,
            address: self.address,
            district: self.district,
            state: self.state,
            mobile_number: self.mobile_number,
            email: self.email,
            customer_type,
            agent_id: self.agent_id,
            created_at: self.created_at,
        })
    }
}

/// Customer reference carried by booking/quotation requests: either a
/// stored directory id or a full inline profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerRef {
    pub customer_id: Option<i32>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// A profile resolved for a booking or quotation, with the id and type
/// the ledgers record alongside the snapshot.
#[derive(Debug, Clone)]
pub struct ResolvedCustomer {
    pub customer_id: Option<i32>,
    pub customer_type: CustomerType,
    pub profile: CustomerProfile,
}

/// Input for adding a directory entry
#[derive(Debug, Deserialize)]
pub struct AddCustomerInput {
    pub customer_name: String,
    #[serde(default)]
    pub customer_type: CustomerType,
    pub agent_id: Option<i32>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub mobile_number: Option<String>,
    pub email: Option<String>,
}

const SELECT_CUSTOMER: &str = "SELECT id, customer_name, address, district, state, \
     mobile_number, email, customer_type, agent_id, created_at FROM customers";

impl CustomerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Resolve the canonical profile a booking or quotation snapshots.
    ///
    /// With a `customer_id`, stored values win over any inline fields.
    /// Without one, every inline field is required and the resolved
    /// type is `User`.
    pub async fn resolve(&self, reference: &CustomerRef) -> AppResult<ResolvedCustomer> {
        if let Some(customer_id) = reference.customer_id {
            let stored = self.get_customer(customer_id).await?;
            let profile = CustomerProfile {
                customer_name: stored.customer_name.clone(),
                address: stored
                    .address
                    .clone()
                    .or_else(|| reference.address.clone())
                    .unwrap_or_default(),
                district: stored
                    .district
                    .clone()
                    .or_else(|| reference.district.clone())
                    .unwrap_or_default(),
                state: stored
                    .state
                    .clone()
                    .or_else(|| reference.state.clone())
                    .unwrap_or_default(),
                mobile_number: stored
                    .mobile_number
                    .clone()
                    .or_else(|| reference.mobile_number.clone())
                    .unwrap_or_default(),
                email: stored
                    .email
                    .clone()
                    .or_else(|| reference.email.clone())
                    .unwrap_or_default(),
            };
            validate_profile(&profile).map_err(|e| AppError::ValidationError(e.to_string()))?;
            return Ok(ResolvedCustomer {
                customer_id: Some(stored.id),
                customer_type: stored.customer_type,
                profile,
            });
        }

        // Walk-in path: everything must be supplied inline.
        let profile = CustomerProfile {
            customer_name: reference.customer_name.clone().unwrap_or_default(),
            address: reference.address.clone().unwrap_or_default(),
            district: reference.district.clone().unwrap_or_default(),
            state: reference.state.clone().unwrap_or_default(),
            mobile_number: reference.mobile_number.clone().unwrap_or_default(),
            email: reference.email.clone().unwrap_or_default(),
        };
        validate_profile(&profile).map_err(|e| AppError::ValidationError(e.to_string()))?;

        Ok(ResolvedCustomer {
            customer_id: None,
            customer_type: CustomerType::User,
            profile,
        })
    }

    /// Add a directory entry. Agents stand alone; dependent customers
    /// must name an existing agent and keep their own contact fields.
    pub async fn add_customer(&self, input: AddCustomerInput) -> AppResult<Customer> {
        if input.customer_name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "customer_name".to_string(),
                message: "Customer name is required".to_string(),
            });
        }

        let agent_id = match input.customer_type {
            CustomerType::CustomerOfAgent => {
                let agent_id = input.agent_id.ok_or_else(|| AppError::Validation {
                    field: "agent_id".to_string(),
                    message: "Dependent customers must name their agent".to_string(),
                })?;
                let agent = self.get_customer(agent_id).await?;
                if agent.customer_type != CustomerType::Agent {
                    return Err(AppError::Validation {
                        field: "agent_id".to_string(),
                        message: format!("Customer {} is not an agent", agent_id),
                    });
                }
                Some(agent_id)
            }
            _ => None,
        };

        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            INSERT INTO customers
                (customer_name, address, district, state, mobile_number,
                 email, customer_type, agent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, customer_name, address, district, state,
                      mobile_number, email, customer_type, agent_id, created_at
            "#,
        )
        .bind(input.customer_name.trim())
        .bind(&input.address)
        .bind(&input.district)
        .bind(&input.state)
        .bind(&input.mobile_number)
        .bind(&input.email)
        .bind(input.customer_type.as_str())
        .bind(agent_id)
        .fetch_one(&self.db)
        .await?;

        row.into_customer()
    }

    pub async fn get_customer(&self, customer_id: i32) -> AppResult<Customer> {
        let row =
            sqlx::query_as::<_, CustomerRow>(&format!("{} WHERE id = $1", SELECT_CUSTOMER))
                .bind(customer_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;
        row.into_customer()
    }

    pub async fn list_agents(&self) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "{} WHERE customer_type = 'Agent' ORDER BY customer_name",
            SELECT_CUSTOMER
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(CustomerRow::into_customer).collect()
    }

    pub async fn list_customers(&self) -> AppResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "{} ORDER BY created_at DESC",
            SELECT_CUSTOMER
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(CustomerRow::into_customer).collect()
    }
}
