//! HTTP handlers for the booking ledger

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

use shared::models::{Admin, Booking, DispatchLogEntry, PaymentTransaction};

use crate::error::AppResult;
use crate::handlers::pdf_response;
use crate::services::booking::{AccrueStatusInput, BookingService, CreateBookingInput};
use crate::AppState;

fn service(state: AppState) -> BookingService {
    BookingService::new(state.db, state.documents, state.whatsapp)
}

/// Create a booking
pub async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingInput>,
) -> AppResult<Json<Booking>> {
    let booking = service(state).create(body).await?;
    Ok(Json(booking))
}

/// List all bookings
pub async fn list_bookings(State(state): State<AppState>) -> AppResult<Json<Vec<Booking>>> {
    let bookings = service(state).list_bookings().await?;
    Ok(Json(bookings))
}

/// Get one booking
pub async fn get_booking(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<Booking>> {
    let booking = service(state).get_booking(&order_id).await?;
    Ok(Json(booking))
}

/// Accrue a payment or dispatch against a booking
pub async fn accrue_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(body): Json<AccrueStatusInput>,
) -> AppResult<Json<Booking>> {
    let booking = service(state).accrue_status(&order_id, body).await?;
    Ok(Json(booking))
}

/// Download the invoice PDF
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Response> {
    let (filename, bytes) = service(state).get_invoice(&order_id).await?;
    Ok(pdf_response(&filename, bytes))
}

/// Download the receipt PDF, minting a receipt id on first call
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Response> {
    let (filename, bytes) = service(state).get_receipt(&order_id).await?;
    Ok(pdf_response(&filename, bytes))
}

/// Payment ledger for one booking
pub async fn get_transactions(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<Vec<PaymentTransaction>>> {
    let transactions = service(state).get_transactions(&order_id).await?;
    Ok(Json(transactions))
}

/// Dispatch ledger for one booking
pub async fn get_dispatch_logs(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<Vec<DispatchLogEntry>>> {
    let logs = service(state).get_dispatch_logs(&order_id).await?;
    Ok(Json(logs))
}

/// List back-office admins
pub async fn list_admins(State(state): State<AppState>) -> AppResult<Json<Vec<Admin>>> {
    let admins = service(state).list_admins().await?;
    Ok(Json(admins))
}

/// Payments recorded by one admin
pub async fn admin_transactions(
    State(state): State<AppState>,
    Path(admin_id): Path<i32>,
) -> AppResult<Json<Vec<PaymentTransaction>>> {
    let transactions = service(state).admin_transactions(admin_id).await?;
    Ok(Json(transactions))
}
