//! Quotation ledger service
//!
//! Quotations are pre-booking estimates. They never touch stock;
//! availability is only re-checked (and reserved) when a quotation is
//! promoted into a booking. Unlike bookings, a quotation's total is
//! always recomputed server-side from its line items and extra charges.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{types::Json, FromRow, PgPool};

use shared::ids::{derive_order_id, new_est_id};
use shared::models::{
    order_total, Booking, CustomerProfile, ExtraCharges, LineItem, Quotation, QuotationStatus,
};
use shared::validation::{validate_extra_charges, validate_line_items};

use crate::error::{AppError, AppResult};
use crate::services::booking::{insert_booking, NewBooking};
use crate::services::customer::{CustomerRef, CustomerService, ResolvedCustomer};
use crate::services::document::{DocumentKind, DocumentService, OrderDocument};
use crate::services::inventory;

/// Quotation ledger service
#[derive(Clone)]
pub struct QuotationService {
    db: PgPool,
    documents: DocumentService,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuotationRow {
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
    pub products: Json<Vec<LineItem>>,
    pub total: Decimal,
    pub extra_charges: Json<ExtraCharges>,
    pub status: String,
    pub pdf: Option<String>,
    pub created_at: DateTime<Utc>,
}

const SELECT_QUOTATION: &str = "SELECT id, est_id, customer_id, customer_name, address, district, \
     state, mobile_number, email, customer_type, products, total, \
     extra_charges, status, pdf, created_at FROM quotations";

impl QuotationRow {
    pub fn into_quotation(self) -> AppResult<Quotation> {
        let status = QuotationStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("bad quotation status {}", self.status)))?;
        Ok(Quotation {
            id: self.id,
            est_id: self.est_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            address: self.address,
            district: self.district,
            state: self.state,
            mobile_number: self.mobile_number,
            email: self.email,
            customer_type: self.customer_type,
            products: self.products.0,
            total: self.total,
            extra_charges: self.extra_charges.0,
            status,
            pdf: self.pdf,
            created_at: self.created_at,
        })
    }

    fn profile(&self) -> CustomerProfile {
        CustomerProfile {
            customer_name: self.customer_name.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            district: self.district.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            mobile_number: self.mobile_number.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
        }
    }

    fn status_enum(&self) -> AppResult<QuotationStatus> {
        QuotationStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("bad quotation status {}", self.status)))
    }
}

/// Input for creating or editing a quotation
#[derive(Debug, Deserialize)]
pub struct QuotationInput {
    #[serde(flatten)]
    pub customer: CustomerRef,
    pub products: Vec<LineItem>,
    #[serde(default)]
    pub extra_charges: ExtraCharges,
}

impl QuotationService {
    pub fn new(db: PgPool, documents: DocumentService) -> Self {
        Self { db, documents }
    }

    /// Create a pending quotation. Line items are validated against
    /// the catalog but no stock is reserved; the total is recomputed
    /// from prices, discounts, and extra charges regardless of what the
    /// client declared.
    pub async fn create(&self, input: QuotationInput) -> AppResult<Quotation> {
        validate_line_items(&input.products)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        validate_extra_charges(&input.extra_charges)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let customer = CustomerService::new(self.db.clone())
            .resolve(&input.customer)
            .await?;
        self.check_products_available(&input.products).await?;

        let mut products = input.products;
        for item in &mut products {
            item.dispatched = 0;
        }
        let total = order_total(&products, &input.extra_charges);
        if total < Decimal::ZERO {
            return Err(AppError::ValidationError(format!(
                "Deduction leaves a negative total ({})",
                total
            )));
        }
        let est_id = new_est_id();

        let row = sqlx::query_as::<_, QuotationRow>(
            r#"
            INSERT INTO quotations
                (est_id, customer_id, customer_name, address, district, state,
                 mobile_number, email, customer_type, products, total,
                 extra_charges, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending')
            RETURNING id, est_id, customer_id, customer_name, address, district,
                      state, mobile_number, email, customer_type, products,
                      total, extra_charges, status, pdf, created_at
            "#,
        )
        .bind(&est_id)
        .bind(customer.customer_id)
        .bind(&customer.profile.customer_name)
        .bind(&customer.profile.address)
        .bind(&customer.profile.district)
        .bind(&customer.profile.state)
        .bind(&customer.profile.mobile_number)
        .bind(&customer.profile.email)
        .bind(customer.customer_type.as_str())
        .bind(Json(&products))
        .bind(total)
        .bind(Json(&input.extra_charges))
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Created quotation {} (total {})", est_id, total);

        let row = self.render_document(row).await?;
        row.into_quotation()
    }

    /// Replace a pending quotation's lines and charges, recomputing the
    /// total. Non-pending quotations are immutable.
    pub async fn edit(&self, est_id: &str, input: QuotationInput) -> AppResult<Quotation> {
        validate_line_items(&input.products)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        validate_extra_charges(&input.extra_charges)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        self.check_products_available(&input.products).await?;

        let mut products = input.products;
        for item in &mut products {
            item.dispatched = 0;
        }
        let total = order_total(&products, &input.extra_charges);
        if total < Decimal::ZERO {
            return Err(AppError::ValidationError(format!(
                "Deduction leaves a negative total ({})",
                total
            )));
        }

        let row = sqlx::query_as::<_, QuotationRow>(
            r#"
            UPDATE quotations SET products = $2, extra_charges = $3, total = $4
            WHERE est_id = $1 AND status = 'pending'
            RETURNING id, est_id, customer_id, customer_name, address, district,
                      state, mobile_number, email, customer_type, products,
                      total, extra_charges, status, pdf, created_at
            "#,
        )
        .bind(est_id)
        .bind(Json(&products))
        .bind(Json(&input.extra_charges))
        .bind(total)
        .fetch_optional(&self.db)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Err(self.terminal_or_missing(est_id).await?),
        };

        let row = self.render_document(row).await?;
        row.into_quotation()
    }

    /// Promote a pending quotation into a booking. Stock is reserved,
    /// the booking inserted, and the quotation flipped to `booked`
    /// inside one transaction, so a failure at any line leaves both
    /// ledgers untouched. The order id keeps the quotation's numeric
    /// suffix. An override lets the caller swap in different customer
    /// details at booking time; the quotation keeps its own.
    pub async fn promote(
        &self,
        est_id: &str,
        override_customer: Option<CustomerRef>,
    ) -> AppResult<Booking> {
        let override_resolved = match &override_customer {
            Some(reference) => Some(
                CustomerService::new(self.db.clone())
                    .resolve(reference)
                    .await?,
            ),
            None => None,
        };

        let mut tx = self.db.begin().await?;

        // Lock the quotation so two concurrent promotions serialize;
        // the loser sees a non-pending status.
        let row = sqlx::query_as::<_, QuotationRow>(&format!(
            "{} WHERE est_id = $1 FOR UPDATE",
            SELECT_QUOTATION
        ))
        .bind(est_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quotation {}", est_id)))?;

        let status = row.status_enum()?;
        if status.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Quotation {} is already {}",
                est_id,
                status.as_str()
            )));
        }

        let order_id = derive_order_id(&row.est_id)
            .ok_or_else(|| AppError::Internal(format!("malformed est_id {}", row.est_id)))?;

        if row.total <= Decimal::ZERO {
            return Err(AppError::ValidationError(format!(
                "Quotation {} totals {} and cannot become a booking",
                est_id, row.total
            )));
        }

        let mut products = row.products.0.clone();
        for item in &mut products {
            item.dispatched = 0;
        }
        for item in &products {
            inventory::check_and_reserve(&mut tx, item.id, item.product_type, item.quantity)
                .await?;
        }

        let customer = match override_resolved {
            Some(resolved) => resolved,
            None => ResolvedCustomer {
                customer_id: row.customer_id,
                customer_type: shared::models::CustomerType::from_str(&row.customer_type)
                    .unwrap_or_default(),
                profile: row.profile(),
            },
        };
        let new = NewBooking {
            order_id,
            customer,
            products,
            total: row.total,
            extra_charges: row.extra_charges.0.clone(),
        };
        let booking_row = insert_booking(&mut tx, &new).await?;

        sqlx::query("UPDATE quotations SET status = 'booked' WHERE id = $1")
            .bind(row.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Promoted quotation {} to booking {}",
            est_id,
            booking_row.order_id
        );

        booking_row.into_booking()
    }

    /// Cancel a pending quotation. Terminal quotations stay as they are.
    pub async fn cancel(&self, est_id: &str) -> AppResult<Quotation> {
        let row = sqlx::query_as::<_, QuotationRow>(
            r#"
            UPDATE quotations SET status = 'canceled'
            WHERE est_id = $1 AND status = 'pending'
            RETURNING id, est_id, customer_id, customer_name, address, district,
                      state, mobile_number, email, customer_type, products,
                      total, extra_charges, status, pdf, created_at
            "#,
        )
        .bind(est_id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(row) => row.into_quotation(),
            None => Err(self.terminal_or_missing(est_id).await?),
        }
    }

    pub async fn get(&self, est_id: &str) -> AppResult<Quotation> {
        self.find(est_id).await?.into_quotation()
    }

    pub async fn list(&self) -> AppResult<Vec<Quotation>> {
        let rows = sqlx::query_as::<_, QuotationRow>(&format!(
            "{} ORDER BY created_at DESC",
            SELECT_QUOTATION
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(QuotationRow::into_quotation).collect()
    }

    /// Return the quotation PDF, regenerating it when the stored
    /// artifact is missing.
    pub async fn get_document(&self, est_id: &str) -> AppResult<(String, Vec<u8>)> {
        let row = self.find(est_id).await?;

        if let Some(filename) = &row.pdf {
            if self.documents.exists(filename).await {
                let bytes = self.documents.load(filename).await?;
                return Ok((filename.clone(), bytes));
            }
        }

        let stored = self
            .documents
            .render_and_store(DocumentKind::Quotation, &row_document(&row))
            .await?;
        sqlx::query("UPDATE quotations SET pdf = $2 WHERE id = $1")
            .bind(row.id)
            .bind(&stored.filename)
            .execute(&self.db)
            .await?;

        Ok((stored.filename, stored.bytes))
    }

    async fn find(&self, est_id: &str) -> AppResult<QuotationRow> {
        sqlx::query_as::<_, QuotationRow>(&format!("{} WHERE est_id = $1", SELECT_QUOTATION))
            .bind(est_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quotation {}", est_id)))
    }

    /// Distinguish "no such quotation" from "not pending any more" for
    /// guarded updates that matched zero rows.
    async fn terminal_or_missing(&self, est_id: &str) -> AppResult<AppError> {
        let row = self.find(est_id).await;
        match row {
            Err(e) => Ok(e),
            Ok(row) => {
                let status = row.status_enum()?;
                Ok(AppError::InvalidState(format!(
                    "Quotation {} is already {}",
                    est_id,
                    status.as_str()
                )))
            }
        }
    }

    /// Every line must name an available catalog product of its
    /// declared family. Quotations do not reserve stock; sufficiency is
    /// only checked at promotion, where the reservation happens.
    async fn check_products_available(&self, items: &[LineItem]) -> AppResult<()> {
        for item in items {
            let status = sqlx::query_scalar::<_, String>(
                "SELECT status FROM products \
                 WHERE id = $1 AND product_type = $2 AND deleted_at IS NULL",
            )
            .bind(item.id)
            .bind(item.product_type.as_str())
            .fetch_optional(&self.db)
            .await?;
            match status.as_deref() {
                None => return Err(AppError::NotFound(format!("Product {}", item.id))),
                Some("on") => {}
                Some(_) => {
                    return Err(AppError::Conflict {
                        resource: "product".to_string(),
                        message: format!("{} is not available for sale", item.productname),
                    })
                }
            }
        }
        Ok(())
    }

    /// Render the quotation artifact and record its reference. Render
    /// failures are logged, not fatal; the next `get_document` call
    /// retries.
    async fn render_document(&self, row: QuotationRow) -> AppResult<QuotationRow> {
        match self
            .documents
            .render_and_store(DocumentKind::Quotation, &row_document(&row))
            .await
        {
            Ok(stored) => {
                sqlx::query("UPDATE quotations SET pdf = $2 WHERE id = $1")
                    .bind(row.id)
                    .bind(&stored.filename)
                    .execute(&self.db)
                    .await?;
                Ok(QuotationRow {
                    pdf: Some(stored.filename),
                    ..row
                })
            }
            Err(e) => {
                tracing::warn!("Quotation render for {} failed: {}", row.est_id, e);
                Ok(row)
            }
        }
    }
}

fn row_document(row: &QuotationRow) -> OrderDocument {
    OrderDocument {
        doc_no: row.est_id.clone(),
        customer: row.profile(),
        items: row.products.0.clone(),
        extra_charges: row.extra_charges.0.clone(),
        total: row.total,
        amount_paid: None,
        created_at: row.created_at,
    }
}
