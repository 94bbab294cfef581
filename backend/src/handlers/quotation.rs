//! HTTP handlers for the quotation ledger

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

use shared::models::{Booking, Quotation};

use crate::error::AppResult;
use crate::handlers::pdf_response;
use crate::services::customer::CustomerRef;
use crate::services::quotation::{QuotationInput, QuotationService};
use crate::AppState;

fn service(state: AppState) -> QuotationService {
    QuotationService::new(state.db, state.documents)
}

/// Create a pending quotation
pub async fn create_quotation(
    State(state): State<AppState>,
    Json(body): Json<QuotationInput>,
) -> AppResult<Json<Quotation>> {
    let quotation = service(state).create(body).await?;
    Ok(Json(quotation))
}

/// List all quotations
pub async fn list_quotations(State(state): State<AppState>) -> AppResult<Json<Vec<Quotation>>> {
    let quotations = service(state).list().await?;
    Ok(Json(quotations))
}

/// Get one quotation
pub async fn get_quotation(
    State(state): State<AppState>,
    Path(est_id): Path<String>,
) -> AppResult<Json<Quotation>> {
    let quotation = service(state).get(&est_id).await?;
    Ok(Json(quotation))
}

/// Edit a pending quotation
pub async fn edit_quotation(
    State(state): State<AppState>,
    Path(est_id): Path<String>,
    Json(body): Json<QuotationInput>,
) -> AppResult<Json<Quotation>> {
    let quotation = service(state).edit(&est_id, body).await?;
    Ok(Json(quotation))
}

/// Promote a pending quotation into a booking. The body may carry
/// replacement customer details for the booking.
pub async fn promote_quotation(
    State(state): State<AppState>,
    Path(est_id): Path<String>,
    body: Option<Json<CustomerRef>>,
) -> AppResult<Json<Booking>> {
    let booking = service(state)
        .promote(&est_id, body.map(|Json(c)| c))
        .await?;
    Ok(Json(booking))
}

/// Cancel a pending quotation
pub async fn cancel_quotation(
    State(state): State<AppState>,
    Path(est_id): Path<String>,
) -> AppResult<Json<Quotation>> {
    let quotation = service(state).cancel(&est_id).await?;
    Ok(Json(quotation))
}

/// Download the quotation PDF
pub async fn get_quotation_document(
    State(state): State<AppState>,
    Path(est_id): Path<String>,
) -> AppResult<Response> {
    let (filename, bytes) = service(state).get_document(&est_id).await?;
    Ok(pdf_response(&filename, bytes))
}
