use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Router,
};

use super::repository::WishlistRepository;
use super::service::WishlistService;
use crate::access::Caller;
use crate::catalog::domain::ProductId;
use crate::catalog::repository::ProductRepository;
use crate::error::ServiceError;
use crate::http::ok;

pub fn wishlist_router<S>(service: Arc<WishlistService<S>>) -> Router
where
    S: WishlistRepository + ProductRepository + 'static,
{
    Router::new()
        .route("/api/v1/wishlist", get(view_handler::<S>))
        .route(
            "/api/v1/wishlist/:product_id",
            post(add_handler::<S>).delete(remove_handler::<S>),
        )
        .with_state(service)
}

pub(crate) async fn view_handler<S>(
    State(service): State<Arc<WishlistService<S>>>,
    caller: Caller,
) -> Result<Response, ServiceError>
where
    S: WishlistRepository + ProductRepository + 'static,
{
    Ok(ok("wishlist", service.view(&caller)?))
}

pub(crate) async fn add_handler<S>(
    State(service): State<Arc<WishlistService<S>>>,
    caller: Caller,
    Path(product_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: WishlistRepository + ProductRepository + 'static,
{
    let products = service.add(&caller, &ProductId(product_id))?;
    Ok(ok("added to wishlist", products))
}

pub(crate) async fn remove_handler<S>(
    State(service): State<Arc<WishlistService<S>>>,
    caller: Caller,
    Path(product_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: WishlistRepository + ProductRepository + 'static,
{
    let products = service.remove(&caller, &ProductId(product_id))?;
    Ok(ok("removed from wishlist", products))
}
