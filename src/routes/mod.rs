use axum::{Router, routing::get};

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod items;
pub mod orders;
pub mod params;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/items", items::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/users", users::router())
        .route("/me", get(users::me))
}
