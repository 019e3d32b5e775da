use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod health;
pub mod ingredients;
pub mod items;
pub mod orders;
pub mod params;
pub mod reports;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/items", items::router())
        .nest("/ingredients", ingredients::router())
        .nest("/orders", orders::router())
        .route("/order-items/{order_id}", get(orders::list_order_items))
        .nest("/reports", reports::router())
}
