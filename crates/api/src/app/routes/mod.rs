use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod auth;
pub mod orders;
pub mod products;
pub mod requests;
pub mod settings;
pub mod system;
pub mod warehouses;

/// Endpoints reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
}

/// Router for all authenticated (company-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/protected", get(system::protected))
        .route("/settings", get(settings::get_settings).put(settings::update_settings))
        .route("/settings/password", put(settings::change_password))
        .route("/user", delete(settings::delete_account))
        .route("/purchase-products", get(products::list_purchase_products))
        .route("/sales", get(orders::list_sales))
        .route("/costs", get(orders::cost_summary))
        .nest("/products", products::router())
        .nest("/warehouses", warehouses::router())
        .nest("/requests", requests::router())
        .nest("/orders", orders::router())
}
