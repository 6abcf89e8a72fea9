//! In-process store for tests and database-less runs
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::aggregates::{Order, OrderStatus, Product, User};
use crate::store::Store;
use crate::{EcommerceError, Result};

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

/// Orders and products keep insertion order so scans are stable.
#[derive(Default)]
struct Tables {
    orders: Vec<Order>,
    products: Vec<Product>,
    users: HashMap<String, User>,
    settings: HashMap<String, serde_json::Value>,
}

impl Tables {
    fn order_mut(&mut self, id: &str) -> Option<&mut Order> { self.orders.iter_mut().find(|o| o.id == id) }
    fn product_mut(&mut self, id: &str) -> Option<&mut Product> { self.products.iter_mut().find(|p| p.id == id) }
}

/// Stored copies never carry pending events.
fn stored<T: Clone>(value: &T, strip: impl FnOnce(&mut T)) -> T {
    let mut copy = value.clone();
    strip(&mut copy);
    copy
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Accounts are owned by the auth service; this seeds them locally.
    pub async fn insert_user(&self, user: User) {
        self.tables.write().await.users.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_order(&self, id: &str) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut t = self.tables.write().await;
        if t.orders.iter().any(|o| o.id == order.id) { return Err(EcommerceError::StorageError(format!("duplicate order id {}", order.id))); }
        t.orders.push(stored(order, |o| o.events.clear()));
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Ok(self.tables.read().await.orders.clone())
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        Ok(self.tables.read().await.orders.iter().filter(|o| o.user_id == user_id).cloned().collect())
    }

    async fn orders_rated_for_product(&self, product_id: &str) -> Result<Vec<Order>> {
        let t = self.tables.read().await;
        Ok(t.orders.iter().filter(|o| o.ratings.iter().any(|r| r.product_id == product_id)).cloned().collect())
    }

    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<bool> {
        let mut t = self.tables.write().await;
        Ok(t.order_mut(id).map(|o| o.status = status).is_some())
    }

    async fn save_order_ratings(&self, order: &Order) -> Result<()> {
        let mut t = self.tables.write().await;
        let current = t.order_mut(&order.id).ok_or(EcommerceError::OrderNotFound)?;
        if current.version != order.version { return Err(EcommerceError::Conflict); }
        current.ratings = order.ratings.clone();
        current.version += 1;
        Ok(())
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        let mut t = self.tables.write().await;
        if t.products.iter().any(|p| p.id == product.id) { return Err(EcommerceError::StorageError(format!("duplicate product id {}", product.id))); }
        t.products.push(stored(product, |p| p.events.clear()));
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.tables.read().await.products.clone())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let mut t = self.tables.write().await;
        let Some(p) = t.product_mut(&product.id) else { return Ok(false) };
        p.name = product.name.clone();
        p.description = product.description.clone();
        p.price = product.price;
        p.category = product.category.clone();
        p.sub_category = product.sub_category.clone();
        p.sizes = product.sizes.clone();
        p.bestseller = product.bestseller;
        p.images = product.images.clone();
        Ok(true)
    }

    async fn delete_product(&self, id: &str) -> Result<bool> {
        let mut t = self.tables.write().await;
        let before = t.products.len();
        t.products.retain(|p| p.id != id);
        Ok(t.products.len() < before)
    }

    async fn record_rating(&self, product: &Product, order: &Order) -> Result<()> {
        let mut t = self.tables.write().await;
        // Check both versions before touching either record.
        match (t.products.iter().find(|p| p.id == product.id), t.orders.iter().find(|o| o.id == order.id)) {
            (None, _) => return Err(EcommerceError::ProductNotFound),
            (_, None) => return Err(EcommerceError::OrderNotFound),
            (Some(p), Some(o)) if p.version != product.version || o.version != order.version => return Err(EcommerceError::Conflict),
            _ => {}
        }
        if let Some(p) = t.product_mut(&product.id) {
            p.avg_rating = product.avg_rating;
            p.rating_count = product.rating_count;
            p.version += 1;
        }
        if let Some(o) = t.order_mut(&order.id) {
            o.ratings = order.ratings.clone();
            o.version += 1;
        }
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(id).cloned())
    }

    async fn user_names(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        let t = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| t.users.get(id).map(|u| (id.clone(), u.name.clone()))).collect())
    }

    async fn load_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.tables.read().await.settings.get(key).cloned())
    }

    async fn save_setting(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.tables.write().await.settings.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{NewProduct, OrderItem};
    use crate::domain::value_objects::Score;

    fn order() -> Order {
        let item = OrderItem { product_id: "P1".into(), name: "Shirt".into(), price: 10, size: None, quantity: 1 };
        Order::place("U1", "", vec![item], 10, serde_json::Value::Null).unwrap()
    }

    #[tokio::test]
    async fn test_stale_order_version_conflicts() {
        let store = MemoryStore::new();
        let o = order();
        store.insert_order(&o).await.unwrap();

        let mut first = store.find_order(o.id()).await.unwrap().unwrap();
        let mut second = first.clone();
        first.add_rating("P1", "U1", Score::new(4).unwrap()).unwrap();
        store.save_order_ratings(&first).await.unwrap();
        second.add_rating("P1", "U1", Score::new(5).unwrap()).unwrap();
        assert!(matches!(store.save_order_ratings(&second).await, Err(EcommerceError::Conflict)));

        let saved = store.find_order(o.id()).await.unwrap().unwrap();
        assert_eq!(saved.ratings().len(), 1);
        assert_eq!(saved.version, 1);
    }

    #[tokio::test]
    async fn test_record_rating_is_all_or_nothing() {
        let store = MemoryStore::new();
        let o = order();
        let p = Product::create(NewProduct { name: "Shirt".into(), ..Default::default() });
        store.insert_order(&o).await.unwrap();
        store.insert_product(&p).await.unwrap();

        let mut stale_product = store.find_product(p.id()).await.unwrap().unwrap();
        let mut bumped = stale_product.clone();
        bumped.apply_rating(Score::new(1).unwrap());
        let mut fresh_order = store.find_order(o.id()).await.unwrap().unwrap();
        fresh_order.add_rating("P9", "U9", Score::new(1).unwrap()).unwrap();
        store.record_rating(&bumped, &fresh_order).await.unwrap();

        let mut order_now = store.find_order(o.id()).await.unwrap().unwrap();
        order_now.add_rating("P1", "U1", Score::new(5).unwrap()).unwrap();
        stale_product.apply_rating(Score::new(5).unwrap());
        assert!(matches!(store.record_rating(&stale_product, &order_now).await, Err(EcommerceError::Conflict)));

        let saved = store.find_order(o.id()).await.unwrap().unwrap();
        assert!(saved.find_rating("P1", "U1").is_none());
        assert_eq!(store.find_product(p.id()).await.unwrap().unwrap().rating_count, 1);
    }

    #[tokio::test]
    async fn test_update_product_leaves_aggregate_and_version() {
        let store = MemoryStore::new();
        let p = Product::create(NewProduct { name: "Shirt".into(), price: 10, ..Default::default() });
        let o = order();
        store.insert_product(&p).await.unwrap();
        store.insert_order(&o).await.unwrap();

        let mut rated = store.find_product(p.id()).await.unwrap().unwrap();
        rated.apply_rating(Score::new(4).unwrap());
        store.record_rating(&rated, &o).await.unwrap();

        let mut edited = p.clone();
        edited.price = 12;
        assert!(store.update_product(&edited).await.unwrap());
        let saved = store.find_product(p.id()).await.unwrap().unwrap();
        assert_eq!(saved.price(), 12);
        assert_eq!(saved.rating_count, 1);
        assert_eq!(saved.version, 1);

        assert!(store.delete_product(p.id()).await.unwrap());
        assert!(!store.delete_product(p.id()).await.unwrap());
        assert!(!store.update_product(&edited).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_names_skips_unknown() {
        let store = MemoryStore::new();
        store.insert_user(User::new("U1", "Asha", "asha@example.com")).await;
        let names = store.user_names(&["U1".to_string(), "U2".to_string()]).await.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names["U1"], "Asha");
    }
}
