use crate::infra::Marketplace;
use clap::Args;
use marketplace::access::{Authenticator, Caller};
use marketplace::catalog::{ProductDraft, ReviewSubmission};
use marketplace::config::{AdminBootstrap, AuthConfig, MediaConfig};
use marketplace::error::{AppError, ServiceError};
use marketplace::identity::{Credentials, Registration, UserRepository};
use marketplace::orders::{OrderRequest, OrderRequestItem, OrderStatus};
use marketplace::vendors::{
    ApplicationSubmission, BankingDetails, BusinessProfile, ContactDetails, InitialProduct,
};

const DEMO_PASSWORD: &str = "demo-password";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of customers who buy and review the demo product
    #[arg(long, default_value_t = 3)]
    pub(crate) buyers: usize,
    /// Skip the duplicate-review attempt at the end of the walkthrough
    #[arg(long)]
    pub(crate) skip_duplicate: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let marketplace = Marketplace::new(
        &AuthConfig {
            jwt_secret: "marketplace-demo".to_string(),
            token_ttl_minutes: 60,
            bcrypt_cost: 4,
        },
        &MediaConfig {
            public_base_url: "http://localhost:3000/media".to_string(),
        },
    );
    marketplace.bootstrap_admin(Some(&AdminBootstrap {
        name: "Demo Admin".to_string(),
        email: "admin@marketplace.test".to_string(),
        password: DEMO_PASSWORD.to_string(),
    }))?;

    println!("Marketplace demo");
    let admin = login(&marketplace, "admin@marketplace.test")?;

    println!("\nVendor onboarding");
    let applicant_session = marketplace.identity.register(Registration {
        name: "Mara Okafor".to_string(),
        email: "mara@lumen.test".to_string(),
        password: DEMO_PASSWORD.to_string(),
    })?;
    let applicant = marketplace.identity.authenticate(&applicant_session.token)?;
    println!(
        "- registered {} as {}",
        applicant_session.user.email,
        applicant.role.label()
    );

    let application = marketplace
        .vendors
        .submit(&applicant, demo_submission())?;
    println!(
        "- application {} submitted ({})",
        application.id.0,
        application.status.label()
    );

    let decided = marketplace.vendors.approve(&admin, &application.id)?;
    let stored_role = marketplace
        .store
        .fetch_user(&applicant.user_id)
        .map_err(ServiceError::from)?
        .map(|user| user.role.label())
        .unwrap_or("missing");
    println!(
        "- application {} by admin, stored role is now {}",
        decided.status.label(),
        stored_role
    );

    // Same token as before approval; the stored role is what the gate sees.
    let vendor = marketplace.identity.authenticate(&applicant_session.token)?;
    let product = marketplace.catalog.create_product(
        &vendor,
        ProductDraft {
            name: "Speckled Mug".to_string(),
            description: "Wheel-thrown stoneware, 350ml".to_string(),
            category: "kitchen".to_string(),
            price: 28.0,
            stock: 50,
            images: Vec::new(),
        },
    )?;
    println!("- listed {} at {:.2}", product.name, product.price);

    println!("\nVerified-purchase reviews");
    let mut last_review = None;
    for index in 0..args.buyers {
        let session = marketplace.identity.register(Registration {
            name: format!("Buyer {}", index + 1),
            email: format!("buyer{}@marketplace.test", index + 1),
            password: DEMO_PASSWORD.to_string(),
        })?;
        let buyer = marketplace.identity.authenticate(&session.token)?;

        let order = marketplace.orders.place_order(
            &buyer,
            OrderRequest {
                items: vec![OrderRequestItem {
                    product_id: product.id.clone(),
                    quantity: 1,
                }],
            },
        )?;
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            marketplace.orders.advance(&vendor, &order.id, status)?;
        }

        let rating = 5 - (index % 3) as u8;
        marketplace.catalog.submit_review(
            &buyer,
            &product.id,
            ReviewSubmission {
                order_id: order.id.clone(),
                rating,
                comment: format!("Rated {rating} by {}", session.user.name),
            },
        )?;
        let refreshed = marketplace.catalog.get_product(&product.id)?;
        println!(
            "- {} rated {} -> average {:.2} over {} review(s)",
            session.user.name, rating, refreshed.rating, refreshed.review_count
        );
        last_review = Some((buyer, order.id));
    }

    if !args.skip_duplicate {
        if let Some((buyer, order_id)) = last_review {
            let outcome = marketplace.catalog.submit_review(
                &buyer,
                &product.id,
                ReviewSubmission {
                    order_id,
                    rating: 1,
                    comment: "second attempt".to_string(),
                },
            );
            match outcome {
                Err(err) => println!("- duplicate review refused: {} ({})", err, err.kind()),
                Ok(_) => println!("- duplicate review unexpectedly accepted"),
            }
        }
    }

    let product = marketplace.catalog.get_product(&product.id)?;
    println!(
        "\nFinal: {} | rating {:.2} | {} review(s) | {} in stock",
        product.name, product.rating, product.review_count, product.stock
    );
    Ok(())
}

fn login(marketplace: &Marketplace, email: &str) -> Result<Caller, ServiceError> {
    let session = marketplace.identity.login(Credentials {
        email: email.to_string(),
        password: DEMO_PASSWORD.to_string(),
    })?;
    marketplace.identity.authenticate(&session.token)
}

fn demo_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        business: BusinessProfile {
            business_name: "Lumen Ceramics".to_string(),
            business_type: Some("sole_proprietor".to_string()),
            tax_id: "TX-88123".to_string(),
            contact: ContactDetails {
                email: "studio@lumen.test".to_string(),
                phone: "+1-555-0100".to_string(),
                address: "12 Kiln Row, Portland".to_string(),
            },
            banking: BankingDetails {
                account_holder: "Lumen Ceramics LLC".to_string(),
                bank_name: "First Clay Bank".to_string(),
                account_number: "004412".to_string(),
                routing_code: None,
            },
        },
        initial_products: vec![InitialProduct {
            name: "Speckled Mug".to_string(),
            description: "Wheel-thrown stoneware".to_string(),
            price: 28.0,
            category: "kitchen".to_string(),
        }],
    }
}
