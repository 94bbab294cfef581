//! Booking ledger service: the order state machine
//!
//! A booking's `total` is fixed at creation. `amount_paid` and the
//! per-line `dispatched` counters only ever grow, each accrual guarded
//! inside a transaction (conditional update for payments, row lock for
//! dispatches) so concurrent requests cannot push either past its cap.
//! Every accepted accrual leaves an immutable ledger row behind.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};

use shared::ids::{is_url_safe_id, new_order_id, new_receipt_id, strip_prefix_segment};
use shared::models::{
    allocate_dispatch, apply_dispatch, check_payment, total_dispatched_qty, AccrualError, Admin,
    Booking, BookingStatus, CustomerProfile, DispatchLogEntry, ExtraCharges, LineDispatch,
    LineItem, PaymentMethod, PaymentTransaction, TransportInfo,
};
use shared::validation::{validate_extra_charges, validate_line_items};

use crate::error::{AppError, AppResult};
use crate::external::whatsapp::{WhatsAppClient, INVOICE_TEMPLATE};
use crate::services::customer::{CustomerRef, CustomerService, ResolvedCustomer};
use crate::services::document::{DocumentKind, DocumentService, OrderDocument};
use crate::services::inventory;

/// Booking ledger service
#[derive(Clone)]
pub struct BookingService {
    db: PgPool,
    documents: DocumentService,
    whatsapp: Option<WhatsAppClient>,
}

/// Booking row as stored. Line items and extra charges live in JSONB
/// columns; enum-tagged columns come back as text.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
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
    pub products: Json<Vec<LineItem>>,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub dispatched_qty: i32,
    pub status: String,
    pub transport_type: Option<String>,
    pub transport_name: Option<String>,
    pub transport_contact: Option<String>,
    pub lr_number: Option<String>,
    pub extra_charges: Json<ExtraCharges>,
    pub pdf: Option<String>,
    pub receipt_id: Option<String>,
    pub receipt_pdf: Option<String>,
    pub created_at: DateTime<Utc>,
}

const SELECT_BOOKING: &str = "SELECT id, order_id, customer_id, customer_name, address, \
     district, state, mobile_number, email, customer_type, products, total, \
     amount_paid, dispatched_qty, status, transport_type, transport_name, \
     transport_contact, lr_number, extra_charges, pdf, receipt_id, receipt_pdf, \
     created_at FROM bookings";

impl BookingRow {
    pub fn into_booking(self) -> AppResult<Booking> {
        let status = BookingStatus::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("bad booking status {}", self.status)))?;
        Ok(Booking {
            id: self.id,
            order_id: self.order_id,
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
            amount_paid: self.amount_paid,
            dispatched_qty: self.dispatched_qty,
            status,
            transport: TransportInfo {
                transport_type: self.transport_type,
                transport_name: self.transport_name,
                transport_contact: self.transport_contact,
                lr_number: self.lr_number,
            },
            extra_charges: self.extra_charges.0,
            pdf: self.pdf,
            receipt_id: self.receipt_id,
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
}

/// Payment details recorded alongside a booking at creation time.
#[derive(Debug, Clone, Deserialize)]
pub struct InitialPayment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub admin_id: i32,
}

/// Input for creating a booking
#[derive(Debug, Deserialize)]
pub struct CreateBookingInput {
    #[serde(flatten)]
    pub customer: CustomerRef,
    pub products: Vec<LineItem>,
    /// Declared order total; recorded as-is (see quotation ledger for
    /// the recomputing path).
    pub total: Decimal,
    #[serde(default)]
    pub extra_charges: ExtraCharges,
    pub payment: Option<InitialPayment>,
}

/// Input for a status accrual
#[derive(Debug, Deserialize)]
pub struct AccrueStatusInput {
    pub status: BookingStatus,
    // Payment fields (target `paid`)
    pub amount: Option<Decimal>,
    pub method: Option<PaymentMethod>,
    pub admin_id: Option<i32>,
    // Dispatch fields (targets `dispatched` / `delivered`)
    pub dispatch: Option<Vec<LineDispatch>>,
    pub dispatch_qty: Option<i32>,
    #[serde(flatten)]
    pub transport: TransportInfo,
}

/// Fields shared by the direct-create and quotation-promotion insert
/// paths.
pub(crate) struct NewBooking {
    pub order_id: String,
    pub customer: ResolvedCustomer,
    pub products: Vec<LineItem>,
    pub total: Decimal,
    pub extra_charges: ExtraCharges,
}

/// Insert a booking row inside the caller's transaction. Stock must
/// already be reserved in the same transaction.
pub(crate) async fn insert_booking(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewBooking,
) -> AppResult<BookingRow> {
    let row = sqlx::query_as::<_, BookingRow>(
        r#"
        INSERT INTO bookings
            (order_id, customer_id, customer_name, address, district, state,
             mobile_number, email, customer_type, products, total,
             amount_paid, dispatched_qty, status, extra_charges)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0, 0, 'booked', $12)
        RETURNING id, order_id, customer_id, customer_name, address, district,
                  state, mobile_number, email, customer_type, products, total,
                  amount_paid, dispatched_qty, status, transport_type,
                  transport_name, transport_contact, lr_number, extra_charges,
                  pdf, receipt_id, receipt_pdf, created_at
        "#,
    )
    .bind(&new.order_id)
    .bind(new.customer.customer_id)
    .bind(&new.customer.profile.customer_name)
    .bind(&new.customer.profile.address)
    .bind(&new.customer.profile.district)
    .bind(&new.customer.profile.state)
    .bind(&new.customer.profile.mobile_number)
    .bind(&new.customer.profile.email)
    .bind(new.customer.customer_type.as_str())
    .bind(Json(&new.products))
    .bind(new.total)
    .bind(Json(&new.extra_charges))
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

impl BookingService {
    pub fn new(db: PgPool, documents: DocumentService, whatsapp: Option<WhatsAppClient>) -> Self {
        Self {
            db,
            documents,
            whatsapp,
        }
    }

    /// Create a booking: reserve stock for every line, insert the
    /// ledger row, and record an optional first payment, all in one
    /// transaction. Invoice rendering and WhatsApp delivery run after
    /// commit in a background task; their failure never fails the
    /// booking.
    pub async fn create(&self, input: CreateBookingInput) -> AppResult<Booking> {
        validate_line_items(&input.products)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        validate_extra_charges(&input.extra_charges)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        if input.total <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "total".to_string(),
                message: "Total must be positive".to_string(),
            });
        }
        if let Some(payment) = &input.payment {
            check_payment(input.total, Decimal::ZERO, payment.amount)
                .map_err(accrual_to_app_error)?;
        }

        let customer = CustomerService::new(self.db.clone())
            .resolve(&input.customer)
            .await?;

        let mut products = input.products;
        for item in &mut products {
            item.dispatched = 0;
        }

        let mut tx = self.db.begin().await?;

        // Any line failing here rolls back every earlier reservation.
        for item in &products {
            inventory::check_and_reserve(&mut tx, item.id, item.product_type, item.quantity)
                .await?;
        }

        let new = NewBooking {
            order_id: new_order_id(),
            customer,
            products,
            total: input.total,
            extra_charges: input.extra_charges,
        };
        let mut row = insert_booking(&mut tx, &new).await?;

        if let Some(payment) = &input.payment {
            sqlx::query("UPDATE bookings SET amount_paid = $2 WHERE id = $1")
                .bind(row.id)
                .bind(payment.amount)
                .execute(&mut *tx)
                .await?;
            insert_payment_row(&mut tx, row.id, payment.amount, payment.method, payment.admin_id)
                .await?;
            row.amount_paid = payment.amount;
        }

        tx.commit().await?;

        tracing::info!("Created booking {} (total {})", row.order_id, row.total);

        self.spawn_invoice_delivery(row.clone());

        row.into_booking()
    }

    /// Render the invoice and hand it to the messaging channel, off the
    /// request path. Failures are logged; the next `get_invoice` call
    /// regenerates whatever is missing.
    fn spawn_invoice_delivery(&self, row: BookingRow) {
        let db = self.db.clone();
        let documents = self.documents.clone();
        let whatsapp = self.whatsapp.clone();

        tokio::spawn(async move {
            let doc = OrderDocument {
                doc_no: row.order_id.clone(),
                customer: row.profile(),
                items: row.products.0.clone(),
                extra_charges: row.extra_charges.0.clone(),
                total: row.total,
                amount_paid: Some(row.amount_paid),
                created_at: row.created_at,
            };

            let stored = match documents.render_and_store(DocumentKind::Invoice, &doc).await {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!("Invoice render for {} failed: {}", row.order_id, e);
                    return;
                }
            };

            if let Err(e) = sqlx::query("UPDATE bookings SET pdf = $2 WHERE id = $1")
                .bind(row.id)
                .bind(&stored.filename)
                .execute(&db)
                .await
            {
                tracing::warn!("Recording invoice ref for {} failed: {}", row.order_id, e);
            }

            if let Some(client) = whatsapp {
                if let Some(mobile) = row.mobile_number.as_deref() {
                    match client
                        .deliver_document(
                            mobile,
                            INVOICE_TEMPLATE,
                            &stored.filename,
                            stored.bytes,
                            &doc.customer.customer_name,
                        )
                        .await
                    {
                        Ok(message_id) => tracing::info!(
                            "Sent invoice for {} via WhatsApp ({})",
                            row.order_id,
                            message_id
                        ),
                        Err(e) => tracing::warn!(
                            "WhatsApp delivery for {} failed: {}",
                            row.order_id,
                            e
                        ),
                    }
                }
            }
        });
    }

    /// Move a booking along its lifecycle, accruing the payment or
    /// dispatch the target carries.
    pub async fn accrue_status(&self, order_id: &str, input: AccrueStatusInput) -> AppResult<Booking> {
        if !input.status.is_accrual_target() {
            return Err(AppError::ValidationError(format!(
                "Cannot move a booking to status '{}'",
                input.status.as_str()
            )));
        }

        if input.status.carries_dispatch() {
            self.accrue_dispatch(order_id, input).await
        } else {
            self.accrue_payment(order_id, input).await
        }
    }

    /// Record a payment. The cap `amount_paid + amount <= total` is
    /// enforced by the UPDATE's own predicate, so two concurrent
    /// payments racing for the remaining balance cannot both win.
    async fn accrue_payment(&self, order_id: &str, input: AccrueStatusInput) -> AppResult<Booking> {
        let amount = input.amount.ok_or_else(|| AppError::Validation {
            field: "amount".to_string(),
            message: "Payment amount is required".to_string(),
        })?;
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Payment amount must be positive".to_string(),
            });
        }
        let method = input.method.ok_or_else(|| AppError::Validation {
            field: "method".to_string(),
            message: "Payment method is required".to_string(),
        })?;
        let admin_id = input.admin_id.ok_or_else(|| AppError::Validation {
            field: "admin_id".to_string(),
            message: "Recording admin is required".to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings SET amount_paid = amount_paid + $2, status = 'paid'
            WHERE order_id = $1 AND amount_paid + $2 <= total
            RETURNING id, order_id, customer_id, customer_name, address, district,
                      state, mobile_number, email, customer_type, products, total,
                      amount_paid, dispatched_qty, status, transport_type,
                      transport_name, transport_contact, lr_number, extra_charges,
                      pdf, receipt_id, receipt_pdf, created_at
            "#,
        )
        .bind(order_id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            Some(row) => row,
            None => {
                // The guarded update missed; read the row to say why.
                let existing = sqlx::query_as::<_, BookingRow>(&format!(
                    "{} WHERE order_id = $1",
                    SELECT_BOOKING
                ))
                .bind(order_id)
                .fetch_optional(&mut *tx)
                .await?;
                return match existing {
                    None => Err(AppError::NotFound(format!("Booking {}", order_id))),
                    Some(b) => Err(accrual_to_app_error(AccrualError::PaymentExceedsBalance {
                        amount,
                        remaining: b.total - b.amount_paid,
                    })),
                };
            }
        };

        insert_payment_row(&mut tx, row.id, amount, method, admin_id).await?;

        tx.commit().await?;

        tracing::info!(
            "Payment of {} recorded for {} (paid {}/{})",
            amount,
            row.order_id,
            row.amount_paid,
            row.total
        );

        row.into_booking()
    }

    /// Record a dispatch. The booking row is locked for the duration so
    /// the per-line counters are read, checked, and rewritten without a
    /// concurrent accrual interleaving.
    async fn accrue_dispatch(&self, order_id: &str, input: AccrueStatusInput) -> AppResult<Booking> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "{} WHERE order_id = $1 FOR UPDATE",
            SELECT_BOOKING
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {}", order_id)))?;

        let mut items = row.products.0.clone();
        let plan = match &input.dispatch {
            Some(plan) => plan.clone(),
            None => {
                let qty = input.dispatch_qty.ok_or_else(|| AppError::Validation {
                    field: "dispatch".to_string(),
                    message: "Dispatch quantities are required".to_string(),
                })?;
                allocate_dispatch(&items, qty).map_err(accrual_to_app_error)?
            }
        };
        let applied = apply_dispatch(&mut items, &plan).map_err(accrual_to_app_error)?;

        let transport = input.transport.clone().normalized();
        let new_dispatched = total_dispatched_qty(&items);

        let updated = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings SET
                products = $2, dispatched_qty = $3, status = $4,
                transport_type = $5, transport_name = $6,
                transport_contact = $7, lr_number = $8
            WHERE id = $1
            RETURNING id, order_id, customer_id, customer_name, address, district,
                      state, mobile_number, email, customer_type, products, total,
                      amount_paid, dispatched_qty, status, transport_type,
                      transport_name, transport_contact, lr_number, extra_charges,
                      pdf, receipt_id, receipt_pdf, created_at
            "#,
        )
        .bind(row.id)
        .bind(Json(&items))
        .bind(new_dispatched)
        .bind(input.status.as_str())
        .bind(&transport.transport_type)
        .bind(&transport.transport_name)
        .bind(&transport.transport_contact)
        .bind(&transport.lr_number)
        .fetch_one(&mut *tx)
        .await?;

        // One ledger row per affected line, snapshotting the booking's
        // finances at event time.
        for line in &plan {
            let item = &items[line.index];
            sqlx::query(
                r#"
                INSERT INTO dispatch_logs
                    (order_id, booking_id, product_index, productname,
                     ordered_qty, dispatched_qty, transport_type, transport_name,
                     transport_contact, lr_number, total, amount_paid)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(&row.order_id)
            .bind(row.id)
            .bind(line.index as i32)
            .bind(&item.productname)
            .bind(item.quantity)
            .bind(line.qty)
            .bind(&transport.transport_type)
            .bind(&transport.transport_name)
            .bind(&transport.transport_contact)
            .bind(&transport.lr_number)
            .bind(row.total)
            .bind(row.amount_paid)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Dispatched {} units for {} (now {}/{})",
            applied,
            row.order_id,
            new_dispatched,
            shared::models::total_ordered_qty(&items)
        );

        updated.into_booking()
    }

    /// Look a booking up by order id, falling back to a suffix match
    /// for ids recorded before the prefix format settled down. Ids
    /// outside the URL-safe alphabet are refused before any query runs.
    async fn find_by_order_id(&self, order_id: &str) -> AppResult<BookingRow> {
        if !is_url_safe_id(order_id) {
            return Err(AppError::ValidationError(format!(
                "Invalid order id format: {}",
                order_id
            )));
        }

        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "{} WHERE order_id = $1",
            SELECT_BOOKING
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;
        if let Some(row) = row {
            return Ok(row);
        }

        if let Some(suffix) = strip_prefix_segment(order_id) {
            let row = sqlx::query_as::<_, BookingRow>(&format!(
                "{} WHERE split_part(order_id, '-', 2) = $1",
                SELECT_BOOKING
            ))
            .bind(&suffix)
            .fetch_optional(&self.db)
            .await?;
            if let Some(row) = row {
                return Ok(row);
            }
        }

        Err(AppError::NotFound(format!("Booking {}", order_id)))
    }

    pub async fn get_booking(&self, order_id: &str) -> AppResult<Booking> {
        self.find_by_order_id(order_id).await?.into_booking()
    }

    /// Return the invoice PDF, regenerating it when the stored artifact
    /// is missing.
    pub async fn get_invoice(&self, order_id: &str) -> AppResult<(String, Vec<u8>)> {
        let row = self.find_by_order_id(order_id).await?;

        if let Some(filename) = &row.pdf {
            if self.documents.exists(filename).await {
                let bytes = self.documents.load(filename).await?;
                return Ok((filename.clone(), bytes));
            }
        }

        let doc = OrderDocument {
            doc_no: row.order_id.clone(),
            customer: row.profile(),
            items: row.products.0.clone(),
            extra_charges: row.extra_charges.0.clone(),
            total: row.total,
            amount_paid: Some(row.amount_paid),
            created_at: row.created_at,
        };
        let stored = self
            .documents
            .render_and_store(DocumentKind::Invoice, &doc)
            .await?;

        sqlx::query("UPDATE bookings SET pdf = $2 WHERE id = $1")
            .bind(row.id)
            .bind(&stored.filename)
            .execute(&self.db)
            .await?;

        Ok((stored.filename, stored.bytes))
    }

    /// Return the receipt PDF, minting the receipt id on first call.
    pub async fn get_receipt(&self, order_id: &str) -> AppResult<(String, Vec<u8>)> {
        let row = self.find_by_order_id(order_id).await?;

        let receipt_id = match &row.receipt_id {
            Some(id) => id.clone(),
            None => {
                // Guarded so two concurrent first calls agree on one id.
                let minted = new_receipt_id();
                let stored = sqlx::query_scalar::<_, String>(
                    "UPDATE bookings SET receipt_id = COALESCE(receipt_id, $2) \
                     WHERE id = $1 RETURNING receipt_id",
                )
                .bind(row.id)
                .bind(&minted)
                .fetch_one(&self.db)
                .await?;
                stored
            }
        };

        let doc = OrderDocument {
            doc_no: receipt_id.clone(),
            customer: row.profile(),
            items: row.products.0.clone(),
            extra_charges: row.extra_charges.0.clone(),
            total: row.total,
            amount_paid: Some(row.amount_paid),
            created_at: row.created_at,
        };
        let stored = self
            .documents
            .render_and_store(DocumentKind::Receipt, &doc)
            .await?;

        sqlx::query("UPDATE bookings SET receipt_pdf = $2 WHERE id = $1")
            .bind(row.id)
            .bind(&stored.filename)
            .execute(&self.db)
            .await?;

        Ok((stored.filename, stored.bytes))
    }

    pub async fn list_bookings(&self) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{} ORDER BY created_at DESC",
            SELECT_BOOKING
        ))
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    /// Payment ledger for one booking, oldest first.
    pub async fn get_transactions(&self, order_id: &str) -> AppResult<Vec<PaymentTransaction>> {
        let row = self.find_by_order_id(order_id).await?;
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, booking_id, amount, method, admin_id, created_at \
             FROM payment_transactions WHERE booking_id = $1 ORDER BY created_at",
        )
        .bind(row.id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(PaymentRow::into_transaction).collect()
    }

    /// Dispatch ledger for one booking, oldest first.
    pub async fn get_dispatch_logs(&self, order_id: &str) -> AppResult<Vec<DispatchLogEntry>> {
        let row = self.find_by_order_id(order_id).await?;

        #[derive(FromRow)]
        struct LogRow {
            id: i32,
            order_id: String,
            booking_id: i32,
            product_index: i32,
            productname: String,
            ordered_qty: i32,
            dispatched_qty: i32,
            transport_type: Option<String>,
            transport_name: Option<String>,
            transport_contact: Option<String>,
            lr_number: Option<String>,
            total: Decimal,
            amount_paid: Decimal,
            created_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, order_id, booking_id, product_index, productname,
                   ordered_qty, dispatched_qty, transport_type, transport_name,
                   transport_contact, lr_number, total, amount_paid, created_at
            FROM dispatch_logs WHERE booking_id = $1 ORDER BY created_at, id
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DispatchLogEntry {
                id: r.id,
                order_id: r.order_id,
                booking_id: r.booking_id,
                product_index: r.product_index,
                productname: r.productname,
                ordered_qty: r.ordered_qty,
                dispatched_qty: r.dispatched_qty,
                transport: TransportInfo {
                    transport_type: r.transport_type,
                    transport_name: r.transport_name,
                    transport_contact: r.transport_contact,
                    lr_number: r.lr_number,
                },
                total: r.total,
                amount_paid: r.amount_paid,
                created_at: r.created_at,
            })
            .collect())
    }

    pub async fn list_admins(&self) -> AppResult<Vec<Admin>> {
        #[derive(FromRow)]
        struct AdminRow {
            id: i32,
            username: String,
        }

        let rows =
            sqlx::query_as::<_, AdminRow>("SELECT id, username FROM admins ORDER BY username")
                .fetch_all(&self.db)
                .await?;
        Ok(rows
            .into_iter()
            .map(|r| Admin {
                id: r.id,
                username: r.username,
            })
            .collect())
    }

    /// Payments recorded by one admin, newest first.
    pub async fn admin_transactions(&self, admin_id: i32) -> AppResult<Vec<PaymentTransaction>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, booking_id, amount, method, admin_id, created_at \
             FROM payment_transactions WHERE admin_id = $1 ORDER BY created_at DESC",
        )
        .bind(admin_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(PaymentRow::into_transaction).collect()
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: i32,
    booking_id: i32,
    amount: Decimal,
    method: String,
    admin_id: i32,
    created_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_transaction(self) -> AppResult<PaymentTransaction> {
        let method = PaymentMethod::from_str(&self.method)
            .ok_or_else(|| AppError::Internal(format!("bad payment method {}", self.method)))?;
        Ok(PaymentTransaction {
            id: self.id,
            booking_id: self.booking_id,
            amount: self.amount,
            method,
            admin_id: self.admin_id,
            created_at: self.created_at,
        })
    }
}

async fn insert_payment_row(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: i32,
    amount: Decimal,
    method: PaymentMethod,
    admin_id: i32,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO payment_transactions (booking_id, amount, method, admin_id) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(booking_id)
    .bind(amount)
    .bind(method.as_str())
    .bind(admin_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn accrual_to_app_error(err: AccrualError) -> AppError {
    match err {
        AccrualError::NonPositivePayment | AccrualError::NonPositiveDispatch => {
            AppError::ValidationError(err.to_string())
        }
        AccrualError::NoSuchLine { .. } => AppError::ValidationError(err.to_string()),
        AccrualError::PaymentExceedsBalance { .. }
        | AccrualError::DispatchExceedsLine { .. }
        | AccrualError::DispatchExceedsOrder { .. } => AppError::Conflict {
            resource: "booking".to_string(),
            message: err.to_string(),
        },
    }
}
