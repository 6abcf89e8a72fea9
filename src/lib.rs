//! Storefront API
//!
//! Backend for a clothing storefront and its admin panel.
//!
//! ## Features
//! - Product catalog
//! - Cash-on-delivery order placement and order administration
//! - Per-order product ratings and reviews
//! - Running product rating aggregates
//! - Persisted shipping fee setting

pub mod api;
pub mod config;
pub mod domain;
pub mod messaging;
pub mod services;
pub mod store;

use thiserror::Error;

pub use config::Config;
pub use domain::aggregates::{Order, OrderItem, OrderStatus, Product, RatingEntry, RatingSummary, User};
pub use domain::value_objects::{ReviewText, Score};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum EcommerceError {
    #[error("{0}")]
    Validation(String),

    #[error("Product not found")]
    ProductNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("You have already rated this product for this order.")]
    AlreadyRated,

    #[error("You have already reviewed this product for this order.")]
    AlreadyReviewed,

    #[error("You must rate before reviewing.")]
    NotYetRated,

    #[error("Concurrent update, please retry")]
    Conflict,

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Coarse classification used when mapping errors onto a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Duplicate,
    Precondition,
    Conflict,
    Internal,
}

impl EcommerceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::EmptyCart => ErrorKind::Validation,
            Self::ProductNotFound | Self::OrderNotFound => ErrorKind::NotFound,
            Self::AlreadyRated | Self::AlreadyReviewed => ErrorKind::Duplicate,
            Self::NotYetRated => ErrorKind::Precondition,
            Self::Conflict => ErrorKind::Conflict,
            Self::StorageError(_) => ErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for EcommerceError {
    fn from(e: sqlx::Error) -> Self {
        Self::StorageError(e.to_string())
    }
}

impl From<serde_json::Error> for EcommerceError {
    fn from(e: serde_json::Error) -> Self {
        Self::StorageError(e.to_string())
    }
}

impl From<validator::ValidationErrors> for EcommerceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(name, _)| *name);
        let message = fields
            .into_iter()
            .flat_map(|(name, errs)| errs.iter().map(move |e| (name, e)))
            .next()
            .map(|(name, e)| match &e.message {
                Some(m) => m.to_string(),
                None => format!("Invalid {}", name),
            })
            .unwrap_or_else(|| "Invalid request".to_string());
        Self::Validation(message)
    }
}

pub type Result<T> = std::result::Result<T, EcommerceError>;
