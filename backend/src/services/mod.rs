//! Business logic services

pub mod auth;
pub mod booking;
pub mod customer;
pub mod document;
pub mod inventory;
pub mod quotation;

pub use auth::AuthService;
pub use booking::BookingService;
pub use customer::CustomerService;
pub use document::DocumentService;
pub use inventory::InventoryService;
pub use quotation::QuotationService;
