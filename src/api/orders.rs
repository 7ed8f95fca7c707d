use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use super::AppState;
use crate::auth::{CallerIdentity, Role};
use crate::domain::order::{OrderLineItem, OrderStatus, PlaceOrder};
use crate::store::{OrderFilter, PageRequest};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    fn to_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub status: Option<OrderStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct CancelQuery {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub restaurant_id: Uuid,
    pub items: Vec<OrderLineItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub restaurant_id: Uuid,
    pub total: Decimal,
}

pub async fn create_order(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    body: web::Json<PlaceOrder>,
) -> Result<HttpResponse, ApiError> {
    let view = state.orders.create_order(&caller, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

pub async fn get_order(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let view = state.orders.get_order(&caller, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn set_status(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let view = state
        .orders
        .set_status(&caller, path.into_inner(), body.status)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn cancel_order(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
    query: web::Query<CancelQuery>,
) -> Result<HttpResponse, ApiError> {
    state
        .orders
        .cancel(&caller, path.into_inner(), query.into_inner().reason)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn simulate_total(
    state: web::Data<AppState>,
    _caller: CallerIdentity,
    body: web::Json<SimulateRequest>,
) -> Result<HttpResponse, ApiError> {
    let total = state
        .orders
        .simulate_total(&body.items, body.restaurant_id)
        .await?;
    Ok(HttpResponse::Ok().json(SimulateResponse {
        restaurant_id: body.restaurant_id,
        total,
    }))
}

/// Orders of the calling customer.
pub async fn my_orders(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    if caller.role != Role::Customer {
        return Err(ApiError::forbidden());
    }
    let page = state
        .orders
        .list_for_customer(&caller, caller.user_id, query.to_request())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Orders received by the calling restaurant user's restaurant.
pub async fn received_orders(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let restaurant_id = match (caller.role, caller.restaurant_id) {
        (Role::Restaurant, Some(id)) => id,
        _ => return Err(ApiError::forbidden()),
    };
    let page = state
        .orders
        .list_for_restaurant(&caller, restaurant_id, query.to_request())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn customer_orders(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = state
        .orders
        .list_for_customer(&caller, path.into_inner(), query.to_request())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn restaurant_orders(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = state
        .orders
        .list_for_restaurant(&caller, path.into_inner(), query.to_request())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn list_orders(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    query: web::Query<AdminListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let filter = OrderFilter {
        status: query.status,
        created_from: query.from,
        created_to: query.to,
    };
    let page = PageRequest::new(
        query.page.unwrap_or(0),
        query.size.unwrap_or(PageRequest::DEFAULT_SIZE),
    );

    let page = state.orders.list_all(&caller, filter, page).await?;
    Ok(HttpResponse::Ok().json(page))
}
