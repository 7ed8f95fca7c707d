//! Order creation and lifecycle engine for a food-delivery backend.
//!
//! Orders are priced against the live catalog, then moved through
//! `PENDING → CONFIRMED → OUT_FOR_DELIVERY → DELIVERED` (or `CANCELLED`)
//! by callers the ownership guard lets through.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod store;
pub mod utils;

pub use auth::{CallerIdentity, Role};
pub use domain::catalog::CatalogService;
pub use domain::order::{Order, OrderError, OrderService, OrderStatus};
pub use error::ErrorKind;
