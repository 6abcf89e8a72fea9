//! Application services, one per storefront concern
pub mod orders;
pub mod products;
pub mod ratings;
pub mod settings;

use std::sync::Arc;

use crate::config::Config;
use crate::messaging::EventPublisher;
use crate::store::Store;

pub use orders::{OrderService, PlaceOrder};
pub use products::{CreateProduct, ProductService, UpdateProduct};
pub use ratings::{ProductReview, RatingService, Reviews, SubmitRating, SubmitReview};
pub use settings::{SettingsService, ShippingSettings};

/// Versioned writes are retried this many times before reporting a conflict.
pub(crate) const MAX_WRITE_ATTEMPTS: usize = 5;

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct Services {
    pub orders: OrderService,
    pub products: ProductService,
    pub ratings: RatingService,
    pub settings: SettingsService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher, config: &Config) -> Self {
        Self {
            orders: OrderService::new(store.clone(), events.clone()),
            products: ProductService::new(store.clone(), events.clone()),
            ratings: RatingService::new(store.clone(), events),
            settings: SettingsService::new(store, config.default_shipping_fee, config.currency.clone()),
        }
    }
}
