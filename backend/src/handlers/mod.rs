//! HTTP request handlers

use axum::{
    http::{header, StatusCode},
    response::Response,
};

pub mod auth;
pub mod booking;
pub mod customer;
pub mod health;
pub mod inventory;
pub mod quotation;

pub use auth::*;
pub use booking::*;
pub use customer::*;
pub use health::*;
pub use inventory::*;
pub use quotation::*;

/// Wrap rendered PDF bytes in a download response.
pub(crate) fn pdf_response(filename: &str, bytes: Vec<u8>) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(bytes.into())
        .unwrap_or_else(|_| Response::new(Vec::new().into()))
}
