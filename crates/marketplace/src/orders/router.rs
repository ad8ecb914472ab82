use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{OrderId, OrderRequest, OrderStatus};
use super::repository::OrderRepository;
use super::service::OrderService;
use crate::access::Caller;
use crate::catalog::repository::ProductRepository;
use crate::error::ServiceError;
use crate::http::{created, ok};

/// Router builder exposing order placement and fulfilment.
pub fn order_router<S>(service: Arc<OrderService<S>>) -> Router
where
    S: OrderRepository + ProductRepository + 'static,
{
    Router::new()
        .route("/api/v1/orders", post(place_handler::<S>))
        .route("/api/v1/orders/mine", get(mine_handler::<S>))
        .route("/api/v1/orders/vendor", get(vendor_handler::<S>))
        .route("/api/v1/orders/:order_id", get(get_handler::<S>))
        .route("/api/v1/orders/:order_id/status", post(advance_handler::<S>))
        .route("/api/v1/orders/:order_id/cancel", post(cancel_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusRequest {
    pub(crate) status: OrderStatus,
}

pub(crate) async fn place_handler<S>(
    State(service): State<Arc<OrderService<S>>>,
    caller: Caller,
    Json(request): Json<OrderRequest>,
) -> Result<Response, ServiceError>
where
    S: OrderRepository + ProductRepository + 'static,
{
    let order = service.place_order(&caller, request)?;
    Ok(created("order placed", order))
}

pub(crate) async fn mine_handler<S>(
    State(service): State<Arc<OrderService<S>>>,
    caller: Caller,
) -> Result<Response, ServiceError>
where
    S: OrderRepository + ProductRepository + 'static,
{
    let orders = service.mine(&caller)?;
    Ok(ok("your orders", orders))
}

pub(crate) async fn vendor_handler<S>(
    State(service): State<Arc<OrderService<S>>>,
    caller: Caller,
) -> Result<Response, ServiceError>
where
    S: OrderRepository + ProductRepository + 'static,
{
    let orders = service.for_vendor(&caller)?;
    Ok(ok("vendor orders", orders))
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<OrderService<S>>>,
    caller: Caller,
    Path(order_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: OrderRepository + ProductRepository + 'static,
{
    let order = service.get(&caller, &OrderId(order_id))?;
    Ok(ok("order", order))
}

pub(crate) async fn advance_handler<S>(
    State(service): State<Arc<OrderService<S>>>,
    caller: Caller,
    Path(order_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Response, ServiceError>
where
    S: OrderRepository + ProductRepository + 'static,
{
    let order = service.advance(&caller, &OrderId(order_id), request.status)?;
    Ok(ok("order status updated", order))
}

pub(crate) async fn cancel_handler<S>(
    State(service): State<Arc<OrderService<S>>>,
    caller: Caller,
    Path(order_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: OrderRepository + ProductRepository + 'static,
{
    let order = service.cancel(&caller, &OrderId(order_id))?;
    Ok(ok("order cancelled", order))
}
