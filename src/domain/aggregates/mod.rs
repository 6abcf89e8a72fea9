//! Aggregates module
pub mod order;
pub mod product;
pub mod user;

pub use order::{Order, OrderItem, OrderStatus, RatingEntry};
pub use product::{NewProduct, Product, ProductChanges, RatingSummary};
pub use user::User;
