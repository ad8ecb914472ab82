use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get},
    Json, Router,
};

use super::domain::{ProductDraft, ProductFilter, ProductId, ProductPatch, ReviewId, ReviewSubmission};
use super::repository::{ProductRepository, ReviewRepository};
use super::service::CatalogService;
use crate::access::Caller;
use crate::error::ServiceError;
use crate::http::{created, ok};
use crate::orders::repository::OrderRepository;

/// Router builder exposing product listings and reviews.
pub fn catalog_router<S>(service: Arc<CatalogService<S>>) -> Router
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/products",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/v1/products/:product_id",
            get(get_handler::<S>)
                .patch(update_handler::<S>)
                .delete(delete_handler::<S>),
        )
        .route(
            "/api/v1/products/:product_id/reviews",
            get(list_reviews_handler::<S>).post(submit_review_handler::<S>),
        )
        .route("/api/v1/reviews/:review_id", delete(delete_review_handler::<S>))
        .with_state(service)
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    Query(filter): Query<ProductFilter>,
) -> Result<Response, ServiceError>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    let products = service.list_products(&filter)?;
    Ok(ok("products", products))
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    caller: Caller,
    Json(draft): Json<ProductDraft>,
) -> Result<Response, ServiceError>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    let product = service.create_product(&caller, draft)?;
    Ok(created("product created", product))
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    Path(product_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    let product = service.get_product(&ProductId(product_id))?;
    Ok(ok("product", product))
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    caller: Caller,
    Path(product_id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Response, ServiceError>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    let product = service.update_product(&caller, &ProductId(product_id), patch)?;
    Ok(ok("product updated", product))
}

pub(crate) async fn delete_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    caller: Caller,
    Path(product_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    let id = ProductId(product_id);
    service.delete_product(&caller, &id)?;
    Ok(ok("product deleted", id))
}

pub(crate) async fn list_reviews_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    Path(product_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    let reviews = service.list_reviews(&ProductId(product_id))?;
    Ok(ok("reviews", reviews))
}

pub(crate) async fn submit_review_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    caller: Caller,
    Path(product_id): Path<String>,
    Json(submission): Json<ReviewSubmission>,
) -> Result<Response, ServiceError>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    let review = service.submit_review(&caller, &ProductId(product_id), submission)?;
    Ok(created("review submitted", review))
}

pub(crate) async fn delete_review_handler<S>(
    State(service): State<Arc<CatalogService<S>>>,
    caller: Caller,
    Path(review_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    let id = ReviewId(review_id);
    service.delete_review(&caller, &id)?;
    Ok(ok("review deleted", id))
}
