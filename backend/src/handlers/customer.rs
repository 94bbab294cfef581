//! HTTP handlers for the customer directory

use axum::{
    extract::{Path, State},
    Json,
};

use shared::models::Customer;

use crate::error::AppResult;
use crate::services::customer::{AddCustomerInput, CustomerService};
use crate::AppState;

/// Add a directory entry (agent, dependent customer, or plain user)
pub async fn add_customer(
    State(state): State<AppState>,
    Json(body): Json<AddCustomerInput>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.db);
    let customer = service.add_customer(body).await?;
    Ok(Json(customer))
}

/// Get one directory entry
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
) -> AppResult<Json<Customer>> {
    let service = CustomerService::new(state.db);
    let customer = service.get_customer(customer_id).await?;
    Ok(Json(customer))
}

/// List all agents
pub async fn list_agents(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    let service = CustomerService::new(state.db);
    let agents = service.list_agents().await?;
    Ok(Json(agents))
}

/// List the whole directory
pub async fn list_customers(State(state): State<AppState>) -> AppResult<Json<Vec<Customer>>> {
    let service = CustomerService::new(state.db);
    let customers = service.list_customers().await?;
    Ok(Json(customers))
}
