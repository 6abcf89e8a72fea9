//! Order placement and administration
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::domain::aggregates::{Order, OrderItem, OrderStatus};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::messaging::EventPublisher;
use crate::services::non_blank;
use crate::store::Store;
use crate::{EcommerceError, Result};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub user_id: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[validate(range(min = 0, message = "Invalid order amount"))]
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub address: serde_json::Value,
}

#[derive(Clone)]
pub struct OrderService { store: Arc<dyn Store>, events: EventPublisher }

impl OrderService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    /// Places a cash-on-delivery order. The email is copied from the account when it exists.
    #[tracing::instrument(skip(self, req), fields(user_id = req.user_id.as_deref()))]
    pub async fn place_order(&self, req: PlaceOrder) -> Result<Order> {
        req.validate()?;
        let user_id = non_blank(&req.user_id).ok_or_else(|| EcommerceError::validation("userId required"))?.to_string();
        let email = self.store.find_user(&user_id).await?.map(|u| u.email).unwrap_or_default();

        let mut order = Order::place(user_id, email, req.items, req.amount, req.address)?;
        self.store.insert_order(&order).await?;
        tracing::info!(order_id = order.id(), amount = order.amount(), "order placed");
        self.events.publish(order.take_events()).await;
        Ok(order)
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        self.store.list_orders().await
    }

    pub async fn user_orders(&self, user_id: &str) -> Result<Vec<Order>> {
        self.store.orders_for_user(user_id).await
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order> {
        self.store.find_order(order_id).await?.ok_or(EcommerceError::OrderNotFound)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, order_id: &str, status: &str) -> Result<OrderStatus> {
        let status: OrderStatus = status.parse()?;
        if !self.store.update_order_status(order_id, status).await? {
            return Err(EcommerceError::OrderNotFound);
        }
        tracing::info!(%status, "order status updated");
        self.events.publish(vec![DomainEvent::Order(OrderEvent::StatusChanged { order_id: order_id.to_string(), status })]).await;
        Ok(status)
    }
}
