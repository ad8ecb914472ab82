use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::{Extension, Router};
use marketplace::access::Authenticator;
use marketplace::catalog::{catalog_router, CatalogService};
use marketplace::config::{AdminBootstrap, AuthConfig, MediaConfig};
use marketplace::error::AppError;
use marketplace::identity::{identity_router, BcryptHasher, IdentityService, JwtTokenService};
use marketplace::media::{media_router, InMemoryMediaStore, MediaService};
use marketplace::orders::{order_router, OrderService};
use marketplace::store::MemoryStore;
use marketplace::vendors::{vendor_router, VendorApplicationService};
use marketplace::wishlist::{wishlist_router, WishlistService};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Every component service wired to one shared in-memory store.
pub(crate) struct Marketplace {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) identity: Arc<IdentityService<MemoryStore>>,
    pub(crate) vendors: Arc<VendorApplicationService<MemoryStore>>,
    pub(crate) catalog: Arc<CatalogService<MemoryStore>>,
    pub(crate) orders: Arc<OrderService<MemoryStore>>,
    pub(crate) wishlist: Arc<WishlistService<MemoryStore>>,
    pub(crate) media: Arc<MediaService>,
}

impl Marketplace {
    pub(crate) fn new(auth: &AuthConfig, media: &MediaConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(MediaService::new(Arc::new(InMemoryMediaStore::new(
            media.public_base_url.clone(),
        ))));

        let identity = Arc::new(IdentityService::new(
            store.clone(),
            Arc::new(BcryptHasher::new(auth.bcrypt_cost)),
            Arc::new(JwtTokenService::new(&auth.jwt_secret, auth.token_ttl_minutes)),
        ));

        Self {
            identity,
            vendors: Arc::new(VendorApplicationService::new(store.clone())),
            catalog: Arc::new(CatalogService::new(store.clone(), media.clone())),
            orders: Arc::new(OrderService::new(store.clone())),
            wishlist: Arc::new(WishlistService::new(store.clone())),
            media,
            store,
        }
    }

    pub(crate) fn bootstrap_admin(&self, admin: Option<&AdminBootstrap>) -> Result<(), AppError> {
        match admin {
            Some(admin) => {
                let profile =
                    self.identity
                        .bootstrap_admin(&admin.name, &admin.email, &admin.password)?;
                info!(user_id = %profile.id.0, "administrator account available");
            }
            None => info!("no administrator configured; set APP_ADMIN_EMAIL and APP_ADMIN_PASSWORD"),
        }
        Ok(())
    }

    /// All component routers merged, with bearer-token resolution installed.
    pub(crate) fn router(&self) -> Router {
        let authenticator: Arc<dyn Authenticator> = self.identity.clone();

        identity_router(self.identity.clone())
            .merge(vendor_router(self.vendors.clone()))
            .merge(catalog_router(self.catalog.clone()))
            .merge(order_router(self.orders.clone()))
            .merge(wishlist_router(self.wishlist.clone()))
            .merge(media_router(self.media.clone()))
            .layer(Extension(authenticator))
    }
}
