//! HTTP handlers for inventory endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use shared::models::{Availability, Product, ProductType, StockAuditEntry};

use crate::error::{AppError, AppResult};
use crate::services::inventory::{
    AddProductInput, InventoryService, RestockResult, UpdateProductInput,
};
use crate::AppState;

fn parse_product_type(raw: &str) -> AppResult<ProductType> {
    ProductType::from_str(raw)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown product type '{}'", raw)))
}

/// List products currently offered for sale
pub async fn list_available(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let service = InventoryService::new(state.db);
    let products = service.list_available().await?;
    Ok(Json(products))
}

/// List a product family's full catalog
pub async fn list_products(
    State(state): State<AppState>,
    Path(product_type): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    let product_type = parse_product_type(&product_type)?;
    let service = InventoryService::new(state.db);
    let products = service.list_products(product_type).await?;
    Ok(Json(products))
}

/// Add a product to the catalog
pub async fn add_product(
    State(state): State<AppState>,
    Json(body): Json<AddProductInput>,
) -> AppResult<Json<Product>> {
    let service = InventoryService::new(state.db);
    let product = service.add_product(body).await?;
    Ok(Json(product))
}

/// Get one product
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> AppResult<Json<Product>> {
    let service = InventoryService::new(state.db);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}

/// Update catalog fields of a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(body): Json<UpdateProductInput>,
) -> AppResult<Json<Product>> {
    let service = InventoryService::new(state.db);
    let product = service.update_product(product_id, body).await?;
    Ok(Json(product))
}

/// Soft-remove a product from the catalog
pub async fn remove_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let service = InventoryService::new(state.db);
    service.remove_product(product_id).await?;
    Ok(Json(serde_json::json!({ "removed": product_id })))
}

#[derive(Deserialize)]
pub struct RestockRequest {
    pub quantity: i32,
}

/// Add stock to a product
pub async fn restock(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(body): Json<RestockRequest>,
) -> AppResult<Json<RestockResult>> {
    let service = InventoryService::new(state.db);
    let result = service.restock(product_id, body.quantity).await?;
    Ok(Json(result))
}

/// Restock history for a product
pub async fn stock_history(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> AppResult<Json<Vec<StockAuditEntry>>> {
    let service = InventoryService::new(state.db);
    let history = service.stock_history(product_id).await?;
    Ok(Json(history))
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub status: Availability,
}

/// Set whether a product is offered for sale
pub async fn set_availability(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(body): Json<AvailabilityRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let service = InventoryService::new(state.db);
    service.set_availability(product_id, body.status).await?;
    Ok(Json(serde_json::json!({
        "id": product_id,
        "status": body.status,
    })))
}

#[derive(Deserialize)]
pub struct FastRunningRequest {
    pub fast_running: bool,
}

/// Flag or unflag a product as fast running
pub async fn set_fast_running(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(body): Json<FastRunningRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let service = InventoryService::new(state.db);
    service.set_fast_running(product_id, body.fast_running).await?;
    Ok(Json(serde_json::json!({
        "id": product_id,
        "fast_running": body.fast_running,
    })))
}
