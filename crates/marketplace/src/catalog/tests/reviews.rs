use std::sync::Arc;
use std::thread;

use super::common::*;
use crate::catalog::domain::{ProductDraft, ProductId, ReviewSubmission};
use crate::catalog::repository::{ProductRepository, ReviewRepository};
use crate::catalog::CatalogService;
use crate::error::ServiceError;
use crate::identity::domain::Role;
use crate::orders::domain::{OrderId, OrderStatus};
use crate::store::MemoryStore;

fn review(order_id: &OrderId, rating: u8) -> ReviewSubmission {
    ReviewSubmission {
        order_id: order_id.clone(),
        rating,
        comment: "solid".to_string(),
    }
}

#[test]
fn verified_purchase_review_updates_the_cache() {
    let (service, store) = build_service();
    let vendor = caller(Role::Vendor);
    let product = service.create_product(&vendor, draft("Mug")).expect("created");

    let first = caller(Role::Consumer);
    let second = caller(Role::Consumer);
    let first_order = delivered_order(store.as_ref(), &first, &product);
    let second_order = delivered_order(store.as_ref(), &second, &product);

    service
        .submit_review(&first, &product.id, review(&first_order, 5))
        .expect("first review");
    assert_eq!(product_state(&store, &product.id), (5.0, 1));

    service
        .submit_review(&second, &product.id, review(&second_order, 2))
        .expect("second review");
    assert_eq!(product_state(&store, &product.id), (3.5, 2));
}

#[test]
fn ratings_outside_the_scale_are_rejected() {
    let (service, store) = build_service();
    let product = service
        .create_product(&caller(Role::Vendor), draft("Mug"))
        .expect("created");
    let buyer = caller(Role::Consumer);
    let order = delivered_order(store.as_ref(), &buyer, &product);

    for rating in [0, 6] {
        assert!(matches!(
            service.submit_review(&buyer, &product.id, review(&order, rating)),
            Err(ServiceError::Validation(_))
        ));
    }
    assert_eq!(product_state(&store, &product.id), (0.0, 0));
}

#[test]
fn every_ineligible_purchase_gets_the_same_answer() {
    let (service, store) = build_service();
    let vendor = caller(Role::Vendor);
    let product = service.create_product(&vendor, draft("Mug")).expect("mug");
    let other_product = service.create_product(&vendor, draft("Bowl")).expect("bowl");
    let buyer = caller(Role::Consumer);

    let shipped = order_with_status(store.as_ref(), &buyer, &product, OrderStatus::Shipped);
    let someone_elses = delivered_order(store.as_ref(), &caller(Role::Consumer), &product);
    let wrong_product = delivered_order(store.as_ref(), &buyer, &other_product);
    let unknown = OrderId("ord-unknown".to_string());

    for order in [shipped, someone_elses, wrong_product, unknown] {
        match service.submit_review(&buyer, &product.id, review(&order, 4)) {
            Err(ServiceError::Forbidden(message)) => {
                assert_eq!(message, "not eligible to review this product")
            }
            other => panic!("expected eligibility failure, got {other:?}"),
        }
    }
    assert_eq!(product_state(&store, &product.id), (0.0, 0));
}

#[test]
fn one_review_per_purchase() {
    let (service, store) = build_service();
    let product = service
        .create_product(&caller(Role::Vendor), draft("Mug"))
        .expect("created");
    let buyer = caller(Role::Consumer);
    let order = delivered_order(store.as_ref(), &buyer, &product);

    service
        .submit_review(&buyer, &product.id, review(&order, 5))
        .expect("first");
    assert!(matches!(
        service.submit_review(&buyer, &product.id, review(&order, 1)),
        Err(ServiceError::Conflict(_))
    ));
    assert_eq!(product_state(&store, &product.id), (5.0, 1));

    // A second delivered purchase of the same product may be reviewed.
    let reorder = delivered_order(store.as_ref(), &buyer, &product);
    service
        .submit_review(&buyer, &product.id, review(&reorder, 1))
        .expect("second purchase");
    assert_eq!(product_state(&store, &product.id), (3.0, 2));
}

#[test]
fn failed_cache_write_removes_the_review() {
    let store = Arc::new(BrokenRatings(MemoryStore::new()));
    let service = CatalogService::new(store.clone(), media());
    let product = service
        .create_product(&caller(Role::Vendor), draft("Mug"))
        .expect("created");
    let buyer = caller(Role::Consumer);
    let order = delivered_order(store.as_ref(), &buyer, &product);

    assert!(matches!(
        service.submit_review(&buyer, &product.id, review(&order, 4)),
        Err(ServiceError::Internal(_))
    ));
    assert!(store
        .reviews_for_product(&product.id)
        .expect("reviews")
        .is_empty());
    let stored = store
        .fetch_product(&product.id)
        .expect("fetch")
        .expect("product");
    assert_eq!((stored.rating, stored.review_count), (0.0, 0));
}

#[test]
fn concurrent_reviews_converge_on_the_full_mean() {
    let (service, store) = build_service();
    let product = service
        .create_product(
            &caller(Role::Vendor),
            ProductDraft {
                stock: 16,
                ..draft("Mug")
            },
        )
        .expect("created");
    let service = Arc::new(service);

    let ratings: Vec<u8> = (0..16).map(|i| (i % 5) as u8 + 1).collect();
    let submissions: Vec<_> = ratings
        .iter()
        .map(|rating| {
            let buyer = caller(Role::Consumer);
            let order = delivered_order(store.as_ref(), &buyer, &product);
            (buyer, order, *rating)
        })
        .collect();

    thread::scope(|scope| {
        for (buyer, order, rating) in &submissions {
            let service = Arc::clone(&service);
            let product_id = product.id.clone();
            scope.spawn(move || {
                service
                    .submit_review(buyer, &product_id, review(order, *rating))
                    .expect("concurrent review");
            });
        }
    });

    let expected = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
    let (average, count) = product_state(&store, &product.id);
    assert_eq!(count, 16);
    assert!((average - expected).abs() < 1e-9);
}

#[test]
fn deleting_a_review_recomputes_the_cache() {
    let (service, store) = build_service();
    let product = service
        .create_product(&caller(Role::Vendor), draft("Mug"))
        .expect("created");
    let happy = caller(Role::Consumer);
    let grumpy = caller(Role::Consumer);
    let happy_order = delivered_order(store.as_ref(), &happy, &product);
    let grumpy_order = delivered_order(store.as_ref(), &grumpy, &product);

    service
        .submit_review(&happy, &product.id, review(&happy_order, 5))
        .expect("happy");
    let harsh = service
        .submit_review(&grumpy, &product.id, review(&grumpy_order, 1))
        .expect("grumpy");
    assert_eq!(product_state(&store, &product.id), (3.0, 2));

    assert!(matches!(
        service.delete_review(&happy, &harsh.id),
        Err(ServiceError::Forbidden(_))
    ));

    service
        .delete_review(&caller(Role::Admin), &harsh.id)
        .expect("admin removal");
    assert_eq!(product_state(&store, &product.id), (5.0, 1));
    assert!(matches!(
        service.delete_review(&grumpy, &harsh.id),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn reviews_list_newest_first() {
    let (service, store) = build_service();
    let product = service
        .create_product(&caller(Role::Vendor), draft("Mug"))
        .expect("created");
    for rating in [3, 4, 5] {
        let buyer = caller(Role::Consumer);
        let order = delivered_order(store.as_ref(), &buyer, &product);
        service
            .submit_review(&buyer, &product.id, review(&order, rating))
            .expect("review");
    }

    let listed = service.list_reviews(&product.id).expect("list");
    assert_eq!(listed.len(), 3);
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));

    assert!(matches!(
        service.list_reviews(&ProductId("prod-missing".to_string())),
        Err(ServiceError::NotFound(_))
    ));
}
