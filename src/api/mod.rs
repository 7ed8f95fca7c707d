// ============================================================================
// HTTP API - thin actix-web adapter over the order and catalog services
// ============================================================================
//
// Handlers resolve the caller identity from request headers, call one
// service operation and map its error kind to a status code. No business
// rule lives here.
//
// ============================================================================

mod catalog;
mod error;
mod identity;
mod orders;

pub use error::{ApiError, ErrorBody};
pub use identity::{identity_from_headers, RESTAURANT_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
pub use orders::SimulateResponse;

use actix_web::web;

use crate::domain::catalog::CatalogService;
use crate::domain::order::OrderService;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
    pub catalog: CatalogService,
}

/// Register every route plus the extractor error handlers. Fixed segments
/// are registered ahead of `/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::invalid_request(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::invalid_request(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::invalid_request(err.to_string()).into()),
    )
    .service(
        web::scope("/orders")
            .route("", web::post().to(orders::create_order))
            .route("", web::get().to(orders::list_orders))
            .route("/simulate", web::post().to(orders::simulate_total))
            .route("/mine", web::get().to(orders::my_orders))
            .route("/received", web::get().to(orders::received_orders))
            .route("/customer/{id}", web::get().to(orders::customer_orders))
            .route("/restaurant/{id}", web::get().to(orders::restaurant_orders))
            .route("/{id}", web::get().to(orders::get_order))
            .route("/{id}", web::delete().to(orders::cancel_order))
            .route("/{id}/status", web::patch().to(orders::set_status)),
    )
    .route(
        "/products/{id}/availability",
        web::patch().to(catalog::set_product_availability),
    )
    .route(
        "/restaurants/{id}/active",
        web::patch().to(catalog::set_restaurant_active),
    );
}
