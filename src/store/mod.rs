//! Persistence seam
//!
//! Orders embed their rating entries; products carry the rating aggregate.
//! Writes that must not interleave with a concurrent writer are conditional on
//! the `version` the caller loaded and fail with [`crate::EcommerceError::Conflict`]
//! when the stored record has moved on.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::aggregates::{Order, OrderStatus, Product, User};
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_order(&self, id: &str) -> Result<Option<Order>>;
    async fn insert_order(&self, order: &Order) -> Result<()>;
    async fn list_orders(&self) -> Result<Vec<Order>>;
    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>>;
    /// Orders holding at least one rating entry for the product, in scan order.
    async fn orders_rated_for_product(&self, product_id: &str) -> Result<Vec<Order>>;
    /// Returns `false` when no such order exists.
    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<bool>;
    /// Persists the order's ratings if its version is unchanged.
    async fn save_order_ratings(&self, order: &Order) -> Result<()>;

    async fn find_product(&self, id: &str) -> Result<Option<Product>>;
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    /// Writes catalog fields only, leaving the rating aggregate and version
    /// to `record_rating`. Returns `false` when no such product exists.
    async fn update_product(&self, product: &Product) -> Result<bool>;
    /// Returns `false` when no such product exists. Rating entries on orders
    /// are order history and stay in place.
    async fn delete_product(&self, id: &str) -> Result<bool>;

    /// Writes the product aggregate and the order's ratings together; either
    /// both land or neither does.
    async fn record_rating(&self, product: &Product, order: &Order) -> Result<()>;

    async fn find_user(&self, id: &str) -> Result<Option<User>>;
    /// Display names keyed by user id; unknown ids are absent from the map.
    async fn user_names(&self, ids: &[String]) -> Result<HashMap<String, String>>;

    async fn load_setting(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn save_setting(&self, key: &str, value: serde_json::Value) -> Result<()>;
}
