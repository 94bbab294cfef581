//! Domain models re-exported from the shared crate
//!
//! The backend keeps its row structs next to the services that load
//! them; the wire/domain shapes live in `shared` so the integration
//! tests can exercise the same arithmetic the services run.

pub use shared::models::*;
