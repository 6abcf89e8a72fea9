//! Domain events
use serde::Serialize;

use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "aggregate", content = "event")]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProductEvent {
    Created { product_id: String, name: String },
    Updated { product_id: String },
    RatingUpdated { product_id: String, avg_rating: f64, rating_count: i32 },
    Removed { product_id: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OrderEvent {
    Placed { order_id: String, user_id: String, amount: i64 },
    StatusChanged { order_id: String, status: OrderStatus },
    Rated { order_id: String, product_id: String, user_id: String, rating: u8 },
    Reviewed { order_id: String, product_id: String, user_id: String },
}

impl DomainEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Product(ProductEvent::Created { .. }) => "storefront.product.created",
            Self::Product(ProductEvent::Updated { .. }) => "storefront.product.updated",
            Self::Product(ProductEvent::RatingUpdated { .. }) => "storefront.product.rating_updated",
            Self::Product(ProductEvent::Removed { .. }) => "storefront.product.removed",
            Self::Order(OrderEvent::Placed { .. }) => "storefront.order.placed",
            Self::Order(OrderEvent::StatusChanged { .. }) => "storefront.order.status_changed",
            Self::Order(OrderEvent::Rated { .. }) => "storefront.order.rated",
            Self::Order(OrderEvent::Reviewed { .. }) => "storefront.order.reviewed",
        }
    }
}
