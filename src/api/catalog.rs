use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;
use crate::auth::CallerIdentity;

#[derive(Debug, Deserialize)]
pub struct AvailabilityUpdate {
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct ActiveUpdate {
    pub active: bool,
}

pub async fn set_product_availability(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
    body: web::Json<AvailabilityUpdate>,
) -> Result<HttpResponse, ApiError> {
    let product = state
        .catalog
        .set_product_availability(&caller, path.into_inner(), body.available)
        .await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn set_restaurant_active(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
    body: web::Json<ActiveUpdate>,
) -> Result<HttpResponse, ApiError> {
    let restaurant = state
        .catalog
        .set_restaurant_active(&caller, path.into_inner(), body.active)
        .await?;
    Ok(HttpResponse::Ok().json(restaurant))
}
