//! Route definitions for the Fireworks Order Management Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Dealer portal accounts
        .nest("/auth", auth_routes())
        // Product catalog and stock
        .nest("/inventory", inventory_routes())
        // Customer directory
        .nest("/customers", customer_routes())
        // Quotation ledger
        .nest("/quotations", quotation_routes())
        // Booking ledger
        .nest("/bookings", booking_routes())
}

/// Account routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route(
            "/users/:user_id",
            get(handlers::get_user).put(handlers::update_user),
        )
}

/// Inventory routes
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_available).post(handlers::add_product),
        )
        .route("/catalog/:product_type", get(handlers::list_products))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::remove_product),
        )
        .route("/:product_id/restock", post(handlers::restock))
        .route("/:product_id/stock-history", get(handlers::stock_history))
        .route("/:product_id/availability", put(handlers::set_availability))
        .route("/:product_id/fast-running", put(handlers::set_fast_running))
}

/// Customer directory routes
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::add_customer),
        )
        .route("/agents", get(handlers::list_agents))
        .route("/:customer_id", get(handlers::get_customer))
}

/// Quotation ledger routes
fn quotation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_quotations).post(handlers::create_quotation),
        )
        .route(
            "/:est_id",
            get(handlers::get_quotation)
                .put(handlers::edit_quotation)
                .delete(handlers::cancel_quotation),
        )
        .route("/:est_id/book", post(handlers::promote_quotation))
        .route("/:est_id/document", get(handlers::get_quotation_document))
}

/// Booking ledger routes
fn booking_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_bookings).post(handlers::create_booking),
        )
        .route("/admins", get(handlers::list_admins))
        .route(
            "/admins/:admin_id/transactions",
            get(handlers::admin_transactions),
        )
        .route("/:order_id", get(handlers::get_booking))
        .route("/:order_id/status", put(handlers::accrue_status))
        .route("/:order_id/invoice", get(handlers::get_invoice))
        .route("/:order_id/receipt", get(handlers::get_receipt))
        .route("/:order_id/transactions", get(handlers::get_transactions))
        .route("/:order_id/dispatch-logs", get(handlers::get_dispatch_logs))
}
