use sqlx::PgPool;
use std::sync::Arc;

use crate::config;
use crate::db::Store;
use crate::payments::{CheckoutClient, Reconciler};
use crate::services::{AvailabilityService, GiftCardService};

#[derive(Clone)]
pub struct AppState {
    /// Kept alongside the store for the health probe's raw `SELECT 1`.
    pub db: PgPool,
    pub store: Arc<dyn Store>,
    pub checkout: Arc<CheckoutClient>,
    pub availability: Arc<AvailabilityService>,
    pub gift_cards: Arc<GiftCardService>,
    pub reconciler: Arc<Reconciler>,
    pub env: config::Config,
}

impl AppState {
    pub fn new(
        db: PgPool,
        store: Arc<dyn Store>,
        checkout: Arc<CheckoutClient>,
        env: config::Config,
    ) -> Self {
        Self {
            db,
            availability: Arc::new(AvailabilityService::new(store.clone())),
            gift_cards: Arc::new(GiftCardService::new(store.clone())),
            reconciler: Arc::new(Reconciler::new(store.clone())),
            store,
            checkout,
            env,
        }
    }
}
