//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{ReviewText, Score};
use crate::{EcommerceError, Result};

pub const PAYMENT_METHOD_COD: &str = "COD";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) email: String,
    pub(crate) items: Vec<OrderItem>,
    pub(crate) amount: i64,
    pub(crate) address: serde_json::Value,
    pub(crate) status: OrderStatus,
    pub(crate) payment_method: String,
    pub(crate) payment: bool,
    pub(crate) date: DateTime<Utc>,
    pub(crate) ratings: Vec<RatingEntry>,
    #[serde(skip)]
    pub(crate) version: i64,
    #[serde(skip)]
    pub(crate) events: Vec<DomainEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
}

/// One user's score, and later their review, for one product of an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    pub product_id: String,
    pub user_id: String,
    #[serde(rename = "rating")]
    pub score: Score,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
}

impl RatingEntry {
    pub fn has_review(&self) -> bool {
        self.review.as_deref().is_some_and(|r| !r.trim().is_empty())
    }
    fn matches(&self, product_id: &str, user_id: &str) -> bool {
        self.product_id == product_id && self.user_id == user_id
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "Order Placed")]
    OrderPlaced,
    Packing,
    Shipped,
    #[serde(rename = "Out for delivery")]
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::OrderPlaced, Self::Packing, Self::Shipped, Self::OutForDelivery, Self::Delivered];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderPlaced => "Order Placed",
            Self::Packing => "Packing",
            Self::Shipped => "Shipped",
            Self::OutForDelivery => "Out for delivery",
            Self::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = EcommerceError;
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or_else(|| EcommerceError::validation(format!("Unknown order status: {}", s)))
    }
}

impl Order {
    /// Cash-on-delivery order as placed from the storefront checkout.
    pub fn place(user_id: impl Into<String>, email: impl Into<String>, items: Vec<OrderItem>, amount: i64, address: serde_json::Value) -> Result<Self> {
        if items.is_empty() { return Err(EcommerceError::EmptyCart); }
        let mut order = Self {
            id: Uuid::new_v4().to_string(), user_id: user_id.into(), email: email.into(), items, amount, address,
            status: OrderStatus::OrderPlaced, payment_method: PAYMENT_METHOD_COD.to_string(), payment: false,
            date: Utc::now(), ratings: vec![], version: 0, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: order.id.clone(), user_id: order.user_id.clone(), amount }));
        Ok(order)
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn user_id(&self) -> &str { &self.user_id }
    pub fn email(&self) -> &str { &self.email }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn amount(&self) -> i64 { self.amount }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_method(&self) -> &str { &self.payment_method }
    pub fn is_paid(&self) -> bool { self.payment }
    pub fn date(&self) -> DateTime<Utc> { self.date }
    pub fn ratings(&self) -> &[RatingEntry] { &self.ratings }

    pub fn find_rating(&self, product_id: &str, user_id: &str) -> Option<&RatingEntry> {
        self.ratings.iter().find(|r| r.matches(product_id, user_id))
    }

    /// Appends a rating entry; a (product, user) pair may rate once per order.
    pub fn add_rating(&mut self, product_id: &str, user_id: &str, score: Score) -> Result<()> {
        if self.find_rating(product_id, user_id).is_some() { return Err(EcommerceError::AlreadyRated); }
        self.ratings.push(RatingEntry { product_id: product_id.to_string(), user_id: user_id.to_string(), score, review: None });
        self.raise_event(DomainEvent::Order(OrderEvent::Rated {
            order_id: self.id.clone(), product_id: product_id.to_string(), user_id: user_id.to_string(), rating: score.value(),
        }));
        Ok(())
    }

    /// Sets the review on an existing rating entry. Reviews are write-once.
    pub fn attach_review(&mut self, product_id: &str, user_id: &str, review: ReviewText) -> Result<()> {
        let entry = self.ratings.iter_mut().find(|r| r.matches(product_id, user_id)).ok_or(EcommerceError::NotYetRated)?;
        if entry.has_review() { return Err(EcommerceError::AlreadyReviewed); }
        entry.review = Some(review.into_inner());
        self.raise_event(DomainEvent::Order(OrderEvent::Reviewed {
            order_id: self.id.clone(), product_id: product_id.to_string(), user_id: user_id.to_string(),
        }));
        Ok(())
    }

    /// Entries for `product_id` that carry a non-blank review, in submission order.
    pub fn reviews_for<'a>(&'a self, product_id: &'a str) -> impl Iterator<Item = &'a RatingEntry> + 'a {
        self.ratings.iter().filter(move |r| r.product_id == product_id && r.has_review())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        let item = OrderItem { product_id: "P1".into(), name: "Linen Shirt".into(), price: 499, size: Some("M".into()), quantity: 1 };
        Order::place("U1", "u1@example.com", vec![item], 509, serde_json::json!({"city": "Pune"})).unwrap()
    }

    #[test]
    fn test_place_order() {
        let mut o = order();
        assert_eq!(o.status(), OrderStatus::OrderPlaced);
        assert_eq!(o.payment_method(), "COD");
        assert!(!o.is_paid());
        assert!(o.ratings().is_empty());
        assert_eq!(o.take_events().len(), 1);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = Order::place("U1", "", vec![], 0, serde_json::Value::Null).unwrap_err();
        assert!(matches!(err, EcommerceError::EmptyCart));
    }

    #[test]
    fn test_rating_once_per_product_and_user() {
        let mut o = order();
        o.add_rating("P1", "U1", Score::new(4).unwrap()).unwrap();
        assert!(matches!(o.add_rating("P1", "U1", Score::new(5).unwrap()), Err(EcommerceError::AlreadyRated)));
        o.add_rating("P2", "U1", Score::new(2).unwrap()).unwrap();
        assert_eq!(o.ratings().len(), 2);
        assert_eq!(o.find_rating("P1", "U1").unwrap().score.value(), 4);
    }

    #[test]
    fn test_review_requires_rating_and_is_write_once() {
        let mut o = order();
        let review = || ReviewText::new("Great fit").unwrap();
        assert!(matches!(o.attach_review("P1", "U1", review()), Err(EcommerceError::NotYetRated)));
        o.add_rating("P1", "U1", Score::new(4).unwrap()).unwrap();
        o.attach_review("P1", "U1", review()).unwrap();
        let again = o.attach_review("P1", "U1", ReviewText::new("Actually okay").unwrap());
        assert!(matches!(again, Err(EcommerceError::AlreadyReviewed)));
        assert_eq!(o.find_rating("P1", "U1").unwrap().review.as_deref(), Some("Great fit"));
    }

    #[test]
    fn test_reviews_for_skips_unreviewed() {
        let mut o = order();
        o.add_rating("P1", "U1", Score::new(4).unwrap()).unwrap();
        o.add_rating("P1", "U2", Score::new(3).unwrap()).unwrap();
        o.attach_review("P1", "U2", ReviewText::new("ok").unwrap()).unwrap();
        let reviewed: Vec<_> = o.reviews_for("P1").map(|r| r.user_id.as_str()).collect();
        assert_eq!(reviewed, vec!["U2"]);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(OrderStatus::OutForDelivery).unwrap(), "Out for delivery");
        assert_eq!("Order Placed".parse::<OrderStatus>().unwrap(), OrderStatus::OrderPlaced);
        assert!("Lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_rating_entry_wire_shape() {
        let entry = RatingEntry { product_id: "P1".into(), user_id: "U1".into(), score: Score::new(4).unwrap(), review: None };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v, serde_json::json!({"productId": "P1", "userId": "U1", "rating": 4}));
    }
}
