//! PostgreSQL store. Embedded documents (items, address, ratings) live in JSONB columns.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::collections::HashMap;

use crate::domain::aggregates::{Order, OrderItem, OrderStatus, Product, RatingEntry, User};
use crate::store::Store;
use crate::{EcommerceError, Result};

#[derive(Clone)]
pub struct PgStore { pool: PgPool }

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self { Self { pool } }

    pub async fn migrate(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

const ORDER_COLUMNS: &str = "id, user_id, email, items, amount, address, status, payment_method, payment, created_at, ratings, version";
const PRODUCT_COLUMNS: &str = "id, name, description, price, category, sub_category, sizes, bestseller, images, avg_rating, rating_count, created_at, version";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String, user_id: String, email: String, items: Json<Vec<OrderItem>>, amount: i64, address: serde_json::Value,
    status: String, payment_method: String, payment: bool, created_at: DateTime<Utc>, ratings: Json<Vec<RatingEntry>>, version: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = EcommerceError;
    fn try_from(r: OrderRow) -> Result<Self> {
        let status = r.status.parse::<OrderStatus>().map_err(|_| EcommerceError::StorageError(format!("order {} has unknown status {:?}", r.id, r.status)))?;
        Ok(Order {
            id: r.id, user_id: r.user_id, email: r.email, items: r.items.0, amount: r.amount, address: r.address, status,
            payment_method: r.payment_method, payment: r.payment, date: r.created_at, ratings: r.ratings.0, version: r.version, events: vec![],
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String, name: String, description: String, price: i64, category: String, sub_category: String, sizes: Vec<String>,
    bestseller: bool, images: Vec<String>, avg_rating: f64, rating_count: i32, created_at: DateTime<Utc>, version: i64,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: r.id, name: r.name, description: r.description, price: r.price, category: r.category, sub_category: r.sub_category,
            sizes: r.sizes, bestseller: r.bestseller, images: r.images, avg_rating: r.avg_rating, rating_count: r.rating_count,
            date: r.created_at, version: r.version, events: vec![],
        }
    }
}

fn orders(rows: Vec<OrderRow>) -> Result<Vec<Order>> { rows.into_iter().map(Order::try_from).collect() }

#[async_trait]
impl Store for PgStore {
    async fn find_order(&self, id: &str) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1")).bind(id).fetch_optional(&self.pool).await?;
        row.map(Order::try_from).transpose()
    }

    async fn insert_order(&self, o: &Order) -> Result<()> {
        sqlx::query("INSERT INTO orders (id, user_id, email, items, amount, address, status, payment_method, payment, created_at, ratings, version) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(&o.id).bind(&o.user_id).bind(&o.email).bind(Json(&o.items)).bind(o.amount).bind(&o.address).bind(o.status.as_str())
            .bind(&o.payment_method).bind(o.payment).bind(o.date).bind(Json(&o.ratings)).bind(o.version)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        orders(sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at")).fetch_all(&self.pool).await?)
    }

    async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        orders(sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at")).bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn orders_rated_for_product(&self, product_id: &str) -> Result<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE ratings @> jsonb_build_array(jsonb_build_object('productId', $1::text))");
        orders(sqlx::query_as::<_, OrderRow>(&sql).bind(product_id).fetch_all(&self.pool).await?)
    }

    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<bool> {
        let done = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1").bind(id).bind(status.as_str()).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn save_order_ratings(&self, o: &Order) -> Result<()> {
        let done = sqlx::query("UPDATE orders SET ratings = $2, version = version + 1 WHERE id = $1 AND version = $3")
            .bind(&o.id).bind(Json(&o.ratings)).bind(o.version).execute(&self.pool).await?;
        if done.rows_affected() == 0 { return Err(EcommerceError::Conflict); }
        Ok(())
    }

    async fn find_product(&self, id: &str) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1")).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Product::from))
    }

    async fn insert_product(&self, p: &Product) -> Result<()> {
        sqlx::query("INSERT INTO products (id, name, description, price, category, sub_category, sizes, bestseller, images, avg_rating, rating_count, created_at, version) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)")
            .bind(&p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(&p.category).bind(&p.sub_category).bind(&p.sizes)
            .bind(p.bestseller).bind(&p.images).bind(p.avg_rating).bind(p.rating_count).bind(p.date).bind(p.version)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC")).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn update_product(&self, p: &Product) -> Result<bool> {
        let done = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, category = $5, sub_category = $6, sizes = $7, bestseller = $8, images = $9 WHERE id = $1")
            .bind(&p.id).bind(&p.name).bind(&p.description).bind(p.price).bind(&p.category).bind(&p.sub_category).bind(&p.sizes)
            .bind(p.bestseller).bind(&p.images).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_product(&self, id: &str) -> Result<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn record_rating(&self, p: &Product, o: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let product = sqlx::query("UPDATE products SET avg_rating = $2, rating_count = $3, version = version + 1 WHERE id = $1 AND version = $4")
            .bind(&p.id).bind(p.avg_rating).bind(p.rating_count).bind(p.version).execute(&mut *tx).await?;
        if product.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(EcommerceError::Conflict);
        }
        let order = sqlx::query("UPDATE orders SET ratings = $2, version = version + 1 WHERE id = $1 AND version = $3")
            .bind(&o.id).bind(Json(&o.ratings)).bind(o.version).execute(&mut *tx).await?;
        if order.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(EcommerceError::Conflict);
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = $1").bind(id).fetch_optional(&self.pool).await?)
    }

    async fn user_names(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, name FROM users WHERE id = ANY($1)").bind(ids.to_vec()).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    async fn load_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as("SELECT value FROM settings WHERE key = $1").bind(key).fetch_optional(&self.pool).await?;
        Ok(row.map(|(v,)| v))
    }

    async fn save_setting(&self, key: &str, value: serde_json::Value) -> Result<()> {
        sqlx::query("INSERT INTO settings (key, value, updated_at) VALUES ($1, $2, NOW()) ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()")
            .bind(key).bind(value).execute(&self.pool).await?;
        Ok(())
    }
}
