//! External API integrations

pub mod whatsapp;

pub use whatsapp::WhatsAppClient;
