//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::Score;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) price: i64,
    pub(crate) category: String,
    pub(crate) sub_category: String,
    pub(crate) sizes: Vec<String>,
    pub(crate) bestseller: bool,
    pub(crate) images: Vec<String>,
    pub(crate) avg_rating: f64,
    pub(crate) rating_count: i32,
    pub(crate) date: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) version: i64,
    #[serde(skip)]
    pub(crate) events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, Default)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub category: String,
    pub sub_category: String,
    pub sizes: Vec<String>,
    pub bestseller: bool,
    pub images: Vec<String>,
}

/// Catalog fields an admin may edit; `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub bestseller: Option<bool>,
    pub images: Option<Vec<String>>,
}

/// Running mean of every score a product has received.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub avg_rating: f64,
    pub rating_count: i32,
}

impl RatingSummary {
    /// Folds one more score into the mean without rescanning history.
    pub fn with_score(self, score: Score) -> Self {
        let rating_count = self.rating_count + 1;
        let total = self.avg_rating * f64::from(self.rating_count) + f64::from(score.value());
        Self { avg_rating: total / f64::from(rating_count), rating_count }
    }
}

impl Product {
    pub fn create(new: NewProduct) -> Self {
        let id = Uuid::new_v4().to_string();
        let mut product = Self {
            id: id.clone(), name: new.name, description: new.description, price: new.price,
            category: new.category, sub_category: new.sub_category, sizes: new.sizes, bestseller: new.bestseller,
            images: new.images, avg_rating: 0.0, rating_count: 0, date: Utc::now(), version: 0, events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id, name: product.name.clone() }));
        product
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn price(&self) -> i64 { self.price }
    pub fn category(&self) -> &str { &self.category }
    pub fn sizes(&self) -> &[String] { &self.sizes }
    pub fn is_bestseller(&self) -> bool { self.bestseller }

    pub fn rating_summary(&self) -> RatingSummary {
        RatingSummary { avg_rating: self.avg_rating, rating_count: self.rating_count }
    }

    pub fn apply_rating(&mut self, score: Score) -> RatingSummary {
        let summary = self.rating_summary().with_score(score);
        self.avg_rating = summary.avg_rating;
        self.rating_count = summary.rating_count;
        self.raise_event(DomainEvent::Product(ProductEvent::RatingUpdated {
            product_id: self.id.clone(), avg_rating: summary.avg_rating, rating_count: summary.rating_count,
        }));
        summary
    }

    /// Edits catalog fields only; the rating aggregate is never touched here.
    pub fn apply_changes(&mut self, changes: ProductChanges) {
        let ProductChanges { name, description, price, category, sub_category, sizes, bestseller, images } = changes;
        if let Some(v) = name { self.name = v; }
        if let Some(v) = description { self.description = v; }
        if let Some(v) = price { self.price = v; }
        if let Some(v) = category { self.category = v; }
        if let Some(v) = sub_category { self.sub_category = v; }
        if let Some(v) = sizes { self.sizes = v; }
        if let Some(v) = bestseller { self.bestseller = v; }
        if let Some(v) = images { self.images = v; }
        self.raise_event(DomainEvent::Product(ProductEvent::Updated { product_id: self.id.clone() }));
    }

    pub fn mark_removed(&mut self) {
        self.raise_event(DomainEvent::Product(ProductEvent::Removed { product_id: self.id.clone() }));
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(v: u8) -> Score { Score::new(v).unwrap() }

    #[test]
    fn test_product_create() {
        let mut p = Product::create(NewProduct { name: "Linen Shirt".into(), price: 499, ..Default::default() });
        assert_eq!(p.name(), "Linen Shirt");
        assert_eq!(p.rating_summary(), RatingSummary { avg_rating: 0.0, rating_count: 0 });
        assert_eq!(p.take_events().len(), 1);
    }

    #[test]
    fn test_incremental_mean() {
        let mut p = Product::create(NewProduct { name: "P".into(), ..Default::default() });
        assert_eq!(p.apply_rating(score(4)), RatingSummary { avg_rating: 4.0, rating_count: 1 });
        assert_eq!(p.apply_rating(score(2)), RatingSummary { avg_rating: 3.0, rating_count: 2 });
    }

    #[test]
    fn test_apply_changes_keeps_rating_aggregate() {
        let mut p = Product::create(NewProduct { name: "Kurta".into(), price: 900, category: "Men".into(), ..Default::default() });
        p.apply_rating(score(5));
        p.take_events();
        p.apply_changes(ProductChanges { price: Some(750), bestseller: Some(true), ..Default::default() });
        assert_eq!(p.price(), 750);
        assert!(p.is_bestseller());
        assert_eq!(p.name(), "Kurta");
        assert_eq!(p.category(), "Men");
        assert_eq!(p.rating_summary(), RatingSummary { avg_rating: 5.0, rating_count: 1 });
        assert!(matches!(p.take_events().as_slice(), [DomainEvent::Product(ProductEvent::Updated { .. })]));
    }

    #[test]
    fn test_mean_matches_batch_mean() {
        let scores = [5u8, 3, 4, 1, 2, 5, 5, 4];
        let summary = scores.iter().fold(RatingSummary::default(), |s, v| s.with_score(score(*v)));
        let expected = scores.iter().map(|v| f64::from(*v)).sum::<f64>() / scores.len() as f64;
        assert_eq!(summary.rating_count, scores.len() as i32);
        assert!((summary.avg_rating - expected).abs() < 1e-9);
    }
}
