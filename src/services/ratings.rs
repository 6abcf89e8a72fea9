//! Product ratings and reviews
//!
//! Ratings live on the order they were given for, one per product and user.
//! Each accepted rating is folded into the product's running mean in the same
//! write as the order update. Reviews attach text to an existing rating and
//! leave the aggregate alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::domain::aggregates::RatingSummary;
use crate::domain::value_objects::{ReviewText, Score};
use crate::messaging::EventPublisher;
use crate::services::{non_blank, MAX_WRITE_ATTEMPTS};
use crate::store::Store;
use crate::{EcommerceError, Result};

/// Display name used when a reviewer's account cannot be resolved.
pub const UNKNOWN_USER_NAME: &str = "User";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRating {
    pub order_id: Option<String>,
    pub product_id: Option<String>,
    pub user_id: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReview {
    pub order_id: Option<String>,
    pub product_id: Option<String>,
    pub user_id: Option<String>,
    pub review: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReview {
    pub review: String,
    pub rating: u8,
    pub user_id: String,
    pub order_id: String,
    pub date: DateTime<Utc>,
    pub user_name: String,
}

struct PendingReview { review: String, rating: u8, user_id: String, order_id: String, date: DateTime<Utc> }

/// Single-pass sequence of reviews; names are attached as items are pulled.
pub struct Reviews {
    pending: std::vec::IntoIter<PendingReview>,
    names: HashMap<String, String>,
}

impl Iterator for Reviews {
    type Item = ProductReview;

    fn next(&mut self) -> Option<ProductReview> {
        let p = self.pending.next()?;
        let user_name = self.names.get(&p.user_id).cloned().unwrap_or_else(|| UNKNOWN_USER_NAME.to_string());
        Some(ProductReview { review: p.review, rating: p.rating, user_id: p.user_id, order_id: p.order_id, date: p.date, user_name })
    }

    fn size_hint(&self) -> (usize, Option<usize>) { self.pending.size_hint() }
}

impl ExactSizeIterator for Reviews {}

#[derive(Clone)]
pub struct RatingService { store: Arc<dyn Store>, events: EventPublisher }

impl RatingService {
    pub fn new(store: Arc<dyn Store>, events: EventPublisher) -> Self { Self { store, events } }

    #[tracing::instrument(skip(self, req), fields(order_id = req.order_id.as_deref(), product_id = req.product_id.as_deref()))]
    pub async fn submit_rating(&self, req: SubmitRating) -> Result<RatingSummary> {
        let (Some(order_id), Some(user_id)) = (non_blank(&req.order_id), non_blank(&req.user_id)) else {
            return Err(EcommerceError::validation("OrderId and userId required"));
        };
        let product_id = req.product_id.as_deref().unwrap_or_default();
        let score = Score::from_input(req.rating)?;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut order = self.store.find_order(order_id).await?.ok_or(EcommerceError::OrderNotFound)?;
            order.add_rating(product_id, user_id, score)?;
            let mut product = self.store.find_product(product_id).await?.ok_or(EcommerceError::ProductNotFound)?;
            let summary = product.apply_rating(score);

            match self.store.record_rating(&product, &order).await {
                Ok(()) => {
                    tracing::info!(avg_rating = summary.avg_rating, rating_count = summary.rating_count, "rating recorded");
                    let mut events = order.take_events();
                    events.extend(product.take_events());
                    self.events.publish(events).await;
                    return Ok(summary);
                }
                Err(EcommerceError::Conflict) => tracing::debug!(attempt, "rating write raced another writer, retrying"),
                Err(e) => return Err(e),
            }
        }
        tracing::warn!("rating write kept conflicting, giving up");
        Err(EcommerceError::Conflict)
    }

    #[tracing::instrument(skip(self, req), fields(order_id = req.order_id.as_deref(), product_id = req.product_id.as_deref()))]
    pub async fn submit_review(&self, req: SubmitReview) -> Result<()> {
        let (Some(order_id), Some(user_id), Some(review)) =
            (non_blank(&req.order_id), non_blank(&req.user_id), req.review.and_then(ReviewText::new))
        else {
            return Err(EcommerceError::validation("OrderId, userId, and review required"));
        };
        let product_id = req.product_id.as_deref().unwrap_or_default();

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let mut order = self.store.find_order(order_id).await?.ok_or(EcommerceError::OrderNotFound)?;
            order.attach_review(product_id, user_id, review.clone())?;
            match self.store.save_order_ratings(&order).await {
                Ok(()) => {
                    tracing::info!("review saved");
                    self.events.publish(order.take_events()).await;
                    return Ok(());
                }
                Err(EcommerceError::Conflict) => tracing::debug!(attempt, "review write raced another writer, retrying"),
                Err(e) => return Err(e),
            }
        }
        Err(EcommerceError::Conflict)
    }

    /// Every non-blank review left for the product, across all orders, in
    /// storage scan order. Reviewer names are resolved in one batch lookup.
    #[tracing::instrument(skip(self))]
    pub async fn list_reviews(&self, product_id: Option<&str>) -> Result<Reviews> {
        let product_id = product_id.map(str::trim).filter(|p| !p.is_empty()).ok_or_else(|| EcommerceError::validation("productId required"))?;
        let orders = self.store.orders_rated_for_product(product_id).await?;

        let pending: Vec<PendingReview> = orders
            .iter()
            .flat_map(|o| o.reviews_for(product_id).map(move |r| PendingReview {
                review: r.review.clone().unwrap_or_default(),
                rating: r.score.value(),
                user_id: r.user_id.clone(),
                order_id: o.id().to_string(),
                date: o.date(),
            }))
            .collect();

        let ids: Vec<String> = pending.iter().map(|p| p.user_id.clone()).filter(|id| !id.is_empty()).collect::<BTreeSet<_>>().into_iter().collect();
        let names = if ids.is_empty() { HashMap::new() } else { self.store.user_names(&ids).await? };
        tracing::debug!(reviews = pending.len(), reviewers = ids.len(), "reviews collected");

        Ok(Reviews { pending: pending.into_iter(), names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{NewProduct, Order, OrderItem, Product, User};
    use crate::store::MemoryStore;

    struct Fixture { store: Arc<MemoryStore>, service: RatingService }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let service = RatingService::new(store.clone(), EventPublisher::disabled());
            Self { store, service }
        }

        async fn order(&self, user_id: &str) -> String {
            let item = OrderItem { product_id: "any".into(), name: "Shirt".into(), price: 10, size: None, quantity: 1 };
            let o = Order::place(user_id, "", vec![item], 10, serde_json::Value::Null).unwrap();
            self.store.insert_order(&o).await.unwrap();
            o.id().to_string()
        }

        async fn product(&self) -> String {
            let p = Product::create(NewProduct { name: "Shirt".into(), price: 10, ..Default::default() });
            self.store.insert_product(&p).await.unwrap();
            p.id().to_string()
        }

        async fn rate(&self, order: &str, product: &str, user: &str, rating: f64) -> Result<RatingSummary> {
            self.service.submit_rating(SubmitRating { order_id: Some(order.into()), product_id: Some(product.into()), user_id: Some(user.into()), rating: Some(rating) }).await
        }

        async fn review(&self, order: &str, product: &str, user: &str, text: &str) -> Result<()> {
            self.service.submit_review(SubmitReview { order_id: Some(order.into()), product_id: Some(product.into()), user_id: Some(user.into()), review: Some(text.into()) }).await
        }
    }

    #[tokio::test]
    async fn test_rating_scenario() {
        let f = Fixture::new();
        f.store.insert_user(User::new("U1", "Asha", "asha@example.com")).await;
        let (o1, p1) = (f.order("U1").await, f.product().await);

        let s = f.rate(&o1, &p1, "U1", 4.0).await.unwrap();
        assert_eq!(s, RatingSummary { avg_rating: 4.0, rating_count: 1 });

        assert!(matches!(f.rate(&o1, &p1, "U1", 5.0).await, Err(EcommerceError::AlreadyRated)));
        f.review(&o1, &p1, "U1", "Great fit").await.unwrap();
        assert!(matches!(f.review(&o1, &p1, "U1", "Actually okay").await, Err(EcommerceError::AlreadyReviewed)));

        let o2 = f.order("U2").await;
        let s = f.rate(&o2, &p1, "U2", 2.0).await.unwrap();
        assert_eq!(s, RatingSummary { avg_rating: 3.0, rating_count: 2 });

        let reviews: Vec<_> = f.service.list_reviews(Some(p1.as_str())).await.unwrap().collect();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review, "Great fit");
        assert_eq!(reviews[0].rating, 4);
        assert_eq!(reviews[0].order_id, o1);
        assert_eq!(reviews[0].user_name, "Asha");
    }

    #[tokio::test]
    async fn test_duplicate_rating_leaves_state_unchanged() {
        let f = Fixture::new();
        let (o, p) = (f.order("U1").await, f.product().await);
        f.rate(&o, &p, "U1", 4.0).await.unwrap();
        let _ = f.rate(&o, &p, "U1", 1.0).await.unwrap_err();

        let order = f.store.find_order(&o).await.unwrap().unwrap();
        assert_eq!(order.ratings().len(), 1);
        let product = f.store.find_product(&p).await.unwrap().unwrap();
        assert_eq!(product.rating_summary(), RatingSummary { avg_rating: 4.0, rating_count: 1 });
    }

    #[tokio::test]
    async fn test_mean_over_many_orders() {
        let f = Fixture::new();
        let p = f.product().await;
        let scores = [5.0, 4.0, 4.0, 2.0, 1.0, 3.0];
        for (i, s) in scores.iter().enumerate() {
            let user = format!("U{i}");
            let o = f.order(&user).await;
            f.rate(&o, &p, &user, *s).await.unwrap();
        }
        let summary = f.store.find_product(&p).await.unwrap().unwrap().rating_summary();
        assert_eq!(summary.rating_count, 6);
        assert!((summary.avg_rating - scores.iter().sum::<f64>() / 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rating_validation_and_lookups() {
        let f = Fixture::new();
        let err = f.service.submit_rating(SubmitRating { product_id: Some("P".into()), rating: Some(3.0), ..Default::default() }).await.unwrap_err();
        assert_eq!(err.to_string(), "OrderId and userId required");
        let o = f.order("U1").await;
        assert!(matches!(f.rate("missing", "P", "U1", 3.0).await, Err(EcommerceError::OrderNotFound)));
        assert!(matches!(f.rate(&o, "missing", "U1", 3.0).await, Err(EcommerceError::ProductNotFound)));
        assert!(matches!(f.rate(&o, "P", "U1", 6.0).await, Err(EcommerceError::Validation(_))));
        assert!(f.store.find_order(&o).await.unwrap().unwrap().ratings().is_empty());
    }

    #[tokio::test]
    async fn test_review_requires_prior_rating() {
        let f = Fixture::new();
        let (o, p) = (f.order("U1").await, f.product().await);
        assert!(matches!(f.review(&o, &p, "U1", "Nice").await, Err(EcommerceError::NotYetRated)));
        assert!(matches!(f.review(&o, &p, "U1", "   ").await, Err(EcommerceError::Validation(_))));
        assert!(matches!(f.review("missing", &p, "U1", "Nice").await, Err(EcommerceError::OrderNotFound)));
    }

    #[tokio::test]
    async fn test_review_does_not_touch_aggregate() {
        let f = Fixture::new();
        let (o, p) = (f.order("U1").await, f.product().await);
        f.rate(&o, &p, "U1", 5.0).await.unwrap();
        f.review(&o, &p, "U1", "Lovely").await.unwrap();
        let summary = f.store.find_product(&p).await.unwrap().unwrap().rating_summary();
        assert_eq!(summary, RatingSummary { avg_rating: 5.0, rating_count: 1 });
    }

    #[tokio::test]
    async fn test_list_reviews_falls_back_to_placeholder_name() {
        let f = Fixture::new();
        let (o, p) = (f.order("ghost").await, f.product().await);
        f.rate(&o, &p, "ghost", 3.0).await.unwrap();
        f.review(&o, &p, "ghost", "Fine").await.unwrap();
        let reviews: Vec<_> = f.service.list_reviews(Some(p.as_str())).await.unwrap().collect();
        assert_eq!(reviews[0].user_name, UNKNOWN_USER_NAME);
        assert!(matches!(f.service.list_reviews(None).await, Err(EcommerceError::Validation(_))));
        assert!(matches!(f.service.list_reviews(Some(" ")).await, Err(EcommerceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_reviews_only_matching_product() {
        let f = Fixture::new();
        let (o, p1, p2) = (f.order("U1").await, f.product().await, f.product().await);
        f.rate(&o, &p1, "U1", 3.0).await.unwrap();
        f.rate(&o, &p2, "U1", 4.0).await.unwrap();
        f.review(&o, &p2, "U1", "Other product").await.unwrap();
        assert_eq!(f.service.list_reviews(Some(p1.as_str())).await.unwrap().count(), 0);
        assert_eq!(f.service.list_reviews(Some(p2.as_str())).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reviews_outlive_removed_product() {
        let f = Fixture::new();
        let (o1, o2, p) = (f.order("U1").await, f.order("U2").await, f.product().await);
        f.rate(&o1, &p, "U1", 5.0).await.unwrap();
        f.review(&o1, &p, "U1", "Lovely drape").await.unwrap();
        assert!(f.store.delete_product(&p).await.unwrap());

        let reviews: Vec<_> = f.service.list_reviews(Some(p.as_str())).await.unwrap().collect();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].review, "Lovely drape");
        assert!(matches!(f.rate(&o2, &p, "U2", 3.0).await, Err(EcommerceError::ProductNotFound)));
        assert!(f.store.find_order(&o2).await.unwrap().unwrap().ratings().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_ratings_count_once() {
        let f = Fixture::new();
        let (o, p) = (f.order("U1").await, f.product().await);
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = f.service.clone();
                let req = SubmitRating { order_id: Some(o.clone()), product_id: Some(p.clone()), user_id: Some("U1".into()), rating: Some(5.0) };
                tokio::spawn(async move { service.submit_rating(req).await })
            })
            .collect();

        let mut ok = 0;
        for t in tasks {
            match t.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert!(matches!(e, EcommerceError::AlreadyRated | EcommerceError::Conflict), "unexpected {e}"),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(f.store.find_product(&p).await.unwrap().unwrap().rating_summary().rating_count, 1);
        assert_eq!(f.store.find_order(&o).await.unwrap().unwrap().ratings().len(), 1);
    }
}
