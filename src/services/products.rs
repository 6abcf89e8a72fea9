//! Catalog reads and admin product maintenance
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::domain::aggregates::{NewProduct, Product, ProductChanges};
use crate::messaging::EventPublisher;
use crate::store::Store;
use crate::{EcommerceError, Result};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProduct {
    #[validate(length(min = 1, message = "Product name required"))]
    pub name: String,
    pub description: String,
    #[validate(range(min = 0, message = "Invalid price"))]
    pub price: i64,
    pub category: String,
    pub sub_category: String,
    pub sizes: Vec<String>,
    pub bestseller: bool,
    /// Already-hosted image URLs.
    pub images: Vec<String>,
}

/// Partial edit; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(length(min = 1, message = "Product name required"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Invalid price"))]
    pub price: Option<i64>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub bestseller: Option<bool>,
    pub images: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct ProductService { store: Arc<dyn Store>, events: EventPublisher }

impl ProductService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    #[tracing::instrument(skip(self, req), fields(name = %req.name))]
    pub async fn create_product(&self, req: CreateProduct) -> Result<Product> {
        req.validate()?;
        let mut product = Product::create(NewProduct {
            name: req.name.trim().to_string(), description: req.description, price: req.price, category: req.category,
            sub_category: req.sub_category, sizes: req.sizes, bestseller: req.bestseller, images: req.images,
        });
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = product.id(), "product added");
        self.events.publish(product.take_events()).await;
        Ok(product)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.store.list_products().await
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product> {
        self.store.find_product(product_id).await?.ok_or(EcommerceError::ProductNotFound)
    }

    #[tracing::instrument(skip(self, req))]
    pub async fn update_product(&self, product_id: &str, req: UpdateProduct) -> Result<Product> {
        let name = req.name.map(|n| n.trim().to_string());
        let req = UpdateProduct { name, ..req };
        req.validate()?;
        let mut product = self.get_product(product_id).await?;
        product.apply_changes(ProductChanges {
            name: req.name, description: req.description, price: req.price, category: req.category,
            sub_category: req.sub_category, sizes: req.sizes, bestseller: req.bestseller, images: req.images,
        });
        if !self.store.update_product(&product).await? {
            return Err(EcommerceError::ProductNotFound);
        }
        tracing::info!("product updated");
        self.events.publish(product.take_events()).await;
        self.get_product(product_id).await
    }

    /// Ratings already left for the product stay on their orders and remain
    /// listable; new ratings for it fail with "Product not found".
    #[tracing::instrument(skip(self))]
    pub async fn remove_product(&self, product_id: &str) -> Result<()> {
        let mut product = self.get_product(product_id).await?;
        if !self.store.delete_product(product_id).await? {
            return Err(EcommerceError::ProductNotFound);
        }
        tracing::info!("product removed");
        product.mark_removed();
        self.events.publish(product.take_events()).await;
        Ok(())
    }
}
