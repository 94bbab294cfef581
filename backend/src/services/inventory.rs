//! Inventory service: product catalog and race-safe stock movements
//!
//! Stock only ever decreases through `check_and_reserve`, a conditional
//! UPDATE that checks availability and sufficiency in the same
//! statement that performs the decrement. Two requests racing for the
//! last units serialize on the row; the loser's statement matches zero
//! rows and the request fails before anything else is written.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use shared::models::{Availability, PerUnit, Product, ProductType, StockAuditEntry};

use crate::error::{AppError, AppResult};

/// Inventory service for catalog and stock management
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Product row as stored; enum-tagged columns come back as text.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: i32,
    pub product_type: String,
    pub serial_number: String,
    pub productname: String,
    pub price: Decimal,
    pub per: String,
    pub discount: Decimal,
    pub stock: i32,
    pub status: String,
    pub fast_running: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductRow {
    pub fn into_product(self) -> AppResult<Product> {
        let product_type = ProductType::from_str(&self.product_type)
            .ok_or_else(|| AppError::Internal(format!("bad product_type {}", self.product_type)))?;
        let per = PerUnit::from_str(&self.per)
            .ok_or_else(|| AppError::Internal(format!("bad per unit {}", self.per)))?;
        let status = Availability::from_str(&self.status)
            .ok_or_else(|| AppError::Internal(format!("bad status {}", self.status)))?;
        Ok(Product {
            id: self.id,
            product_type,
            serial_number: self.serial_number,
            productname: self.productname,
            price: self.price,
            per,
            discount: self.discount,
            stock: self.stock,
            status,
            fast_running: self.fast_running,
            image: self.image,
            created_at: self.created_at,
        })
    }
}

/// Input for adding a catalog product
#[derive(Debug, Deserialize)]
pub struct AddProductInput {
    pub product_type: ProductType,
    pub serial_number: String,
    pub productname: String,
    pub price: Decimal,
    pub per: PerUnit,
    #[serde(default)]
    pub discount: Decimal,
    pub stock: i32,
    pub image: Option<String>,
}

/// Input for updating a catalog product; absent fields are unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub productname: Option<String>,
    pub price: Option<Decimal>,
    pub per: Option<PerUnit>,
    pub discount: Option<Decimal>,
    pub image: Option<String>,
}

/// Result of a restock
#[derive(Debug, Serialize)]
pub struct RestockResult {
    pub product_id: i32,
    pub quantity_added: i32,
    pub new_stock: i32,
}

impl InventoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Add a product to the catalog. New products start with
    /// availability off so stock can be staged before sale.
    pub async fn add_product(&self, input: AddProductInput) -> AppResult<Product> {
        if input.productname.trim().is_empty() {
            return Err(AppError::Validation {
                field: "productname".to_string(),
                message: "Product name is required".to_string(),
            });
        }
        if input.serial_number.trim().is_empty() {
            return Err(AppError::Validation {
                field: "serial_number".to_string(),
                message: "Serial number is required".to_string(),
            });
        }
        if input.stock < 0 {
            return Err(AppError::Validation {
                field: "stock".to_string(),
                message: "Stock cannot be negative".to_string(),
            });
        }
        if input.price.is_sign_negative() {
            return Err(AppError::Validation {
                field: "price".to_string(),
                message: "Price cannot be negative".to_string(),
            });
        }
        if input.discount.is_sign_negative() || input.discount > Decimal::from(100) {
            return Err(AppError::Validation {
                field: "discount".to_string(),
                message: "Discount must be between 0 and 100".to_string(),
            });
        }

        let duplicate = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM products
            WHERE product_type = $1 AND deleted_at IS NULL
              AND (serial_number = $2 OR lower(productname) = lower($3))
            "#,
        )
        .bind(input.product_type.as_str())
        .bind(input.serial_number.trim())
        .bind(input.productname.trim())
        .fetch_one(&self.db)
        .await?;
        if duplicate > 0 {
            return Err(AppError::DuplicateEntry("product".to_string()));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products
                (product_type, serial_number, productname, price, per,
                 discount, stock, status, fast_running, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'off', false, $8)
            RETURNING id, product_type, serial_number, productname, price, per,
                      discount, stock, status, fast_running, image, created_at
            "#,
        )
        .bind(input.product_type.as_str())
        .bind(input.serial_number.trim())
        .bind(input.productname.trim())
        .bind(input.price)
        .bind(input.per.as_str())
        .bind(input.discount)
        .bind(input.stock)
        .bind(&input.image)
        .fetch_one(&self.db)
        .await?;

        row.into_product()
    }

    /// Update catalog fields of a product.
    pub async fn update_product(
        &self,
        product_id: i32,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        if let Some(price) = input.price {
            if price.is_sign_negative() {
                return Err(AppError::Validation {
                    field: "price".to_string(),
                    message: "Price cannot be negative".to_string(),
                });
            }
        }
        if let Some(discount) = input.discount {
            if discount.is_sign_negative() || discount > Decimal::from(100) {
                return Err(AppError::Validation {
                    field: "discount".to_string(),
                    message: "Discount must be between 0 and 100".to_string(),
                });
            }
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products SET
                productname = COALESCE($2, productname),
                price = COALESCE($3, price),
                per = COALESCE($4, per),
                discount = COALESCE($5, discount),
                image = COALESCE($6, image)
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, product_type, serial_number, productname, price, per,
                      discount, stock, status, fast_running, image, created_at
            "#,
        )
        .bind(product_id)
        .bind(input.productname.as_deref().map(str::trim))
        .bind(input.price)
        .bind(input.per.map(|p| p.as_str()))
        .bind(input.discount)
        .bind(&input.image)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        row.into_product()
    }

    /// Soft-remove a product. Historical bookings keep referencing its
    /// id, so rows are never hard-deleted.
    pub async fn remove_product(&self, product_id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = NOW(), status = 'off' \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(product_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    /// Full catalog for a product family, most recent first.
    pub async fn list_products(&self, product_type: ProductType) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, product_type, serial_number, productname, price, per,
                   discount, stock, status, fast_running, image, created_at
            FROM products
            WHERE product_type = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(product_type.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Products currently offered for sale: available and in stock.
    pub async fn list_available(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, product_type, serial_number, productname, price, per,
                   discount, stock, status, fast_running, image, created_at
            FROM products
            WHERE status = 'on' AND stock > 0 AND deleted_at IS NULL
            ORDER BY product_type, productname
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    pub async fn get_product(&self, product_id: i32) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, product_type, serial_number, productname, price, per,
                   discount, stock, status, fast_running, image, created_at
            FROM products
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        row.into_product()
    }

    /// Add stock and leave an audit row, in one transaction.
    pub async fn restock(&self, product_id: i32, quantity: i32) -> AppResult<RestockResult> {
        if quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Restock quantity must be positive".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let new_stock = sqlx::query_scalar::<_, i32>(
            "UPDATE products SET stock = stock + $2 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING stock",
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        sqlx::query("INSERT INTO stock_audit (product_id, quantity_added) VALUES ($1, $2)")
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Restocked product {} by {} (now {})",
            product_id,
            quantity,
            new_stock
        );

        Ok(RestockResult {
            product_id,
            quantity_added: quantity,
            new_stock,
        })
    }

    /// Restock history for a product, newest first.
    pub async fn stock_history(&self, product_id: i32) -> AppResult<Vec<StockAuditEntry>> {
        #[derive(FromRow)]
        struct AuditRow {
            id: i32,
            product_id: i32,
            quantity_added: i32,
            created_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as::<_, AuditRow>(
            "SELECT id, product_id, quantity_added, created_at \
             FROM stock_audit WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StockAuditEntry {
                id: r.id,
                product_id: r.product_id,
                quantity_added: r.quantity_added,
                created_at: r.created_at,
            })
            .collect())
    }

    /// Set whether a product is offered for sale. Idempotent.
    pub async fn set_availability(&self, product_id: i32, status: Availability) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE products SET status = $2 WHERE id = $1 AND deleted_at IS NULL")
                .bind(product_id)
                .bind(status.as_str())
                .execute(&self.db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    /// Flag or unflag a product as fast running. Idempotent.
    pub async fn set_fast_running(&self, product_id: i32, fast_running: bool) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE products SET fast_running = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(product_id)
        .bind(fast_running)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }
}

/// Reserve stock for one order line inside the caller's transaction.
///
/// The decrement, the availability check, and the sufficiency check are
/// one statement; `rows_affected == 0` means the reservation failed and
/// a follow-up read decides which error to report. The caller's
/// rollback undoes every reservation made before the failing line.
pub(crate) async fn check_and_reserve(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i32,
    product_type: ProductType,
    quantity: i32,
) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::Validation {
            field: "quantity".to_string(),
            message: "Each product must have a positive quantity".to_string(),
        });
    }

    let result = sqlx::query(
        r#"
        UPDATE products SET stock = stock - $3
        WHERE id = $1 AND product_type = $2
          AND status = 'on' AND deleted_at IS NULL AND stock >= $3
        "#,
    )
    .bind(product_id)
    .bind(product_type.as_str())
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    // The conditional update missed; read the row to say why.
    #[derive(FromRow)]
    struct StockStatus {
        productname: String,
        stock: i32,
        status: String,
    }

    let row = sqlx::query_as::<_, StockStatus>(
        "SELECT productname, stock, status FROM products \
         WHERE id = $1 AND product_type = $2 AND deleted_at IS NULL",
    )
    .bind(product_id)
    .bind(product_type.as_str())
    .fetch_optional(&mut **tx)
    .await?;

    match row {
        None => Err(AppError::NotFound(format!("Product {}", product_id))),
        Some(r) if r.status != "on" => Err(AppError::Conflict {
            resource: "product".to_string(),
            message: format!("{} is not available for sale", r.productname),
        }),
        Some(r) => Err(AppError::InsufficientStock(format!(
            "{} has {} in stock, {} requested",
            r.productname, r.stock, quantity
        ))),
    }
}
