//! Domain models for the Fireworks Order Management Platform

mod booking;
mod customer;
mod product;
mod quotation;
mod user;

pub use booking::*;
pub use customer::*;
pub use product::*;
pub use quotation::*;
pub use user::*;
