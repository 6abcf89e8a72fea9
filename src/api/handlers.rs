use axum::{extract::{Path, State}, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiError, ApiJson, ApiQuery, ApiResponse, ApiResult, AppState, SERVICE_NAME};
use crate::domain::aggregates::{Order, Product, RatingSummary};
use crate::services::{non_blank, CreateProduct, PlaceOrder, ProductReview, ShippingSettings, SubmitRating, SubmitReview, UpdateProduct};

#[derive(Serialize)] pub struct Message { message: &'static str }
#[derive(Serialize)] pub struct ProductList { products: Vec<Product> }
#[derive(Serialize)] pub struct ProductBody { product: Product }
#[derive(Serialize)] pub struct ProductSaved { message: &'static str, product: Product }
#[derive(Serialize)] pub struct OrderList { orders: Vec<Order> }
#[derive(Serialize)] pub struct OrderBody { order: Order }
#[derive(Serialize)] pub struct PlacedOrder { message: &'static str, order: Order }
#[derive(Serialize)] pub struct ReviewList { reviews: Vec<ProductReview> }
#[derive(Serialize)] pub struct ShippingFee { fee: i64, currency: String }

#[derive(Debug, Deserialize)] #[serde(rename_all = "camelCase")] pub struct ReviewParams { pub product_id: Option<String> }
#[derive(Debug, Deserialize)] #[serde(rename_all = "camelCase")] pub struct OrderParams { pub user_id: Option<String> }
#[derive(Debug, Deserialize)] pub struct StatusRequest { pub status: String }
#[derive(Debug, Deserialize)] pub struct ShippingFeeRequest { pub fee: Option<i64> }

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy", "service": SERVICE_NAME}))
}

pub async fn list_products(State(s): State<AppState>) -> ApiResult<ProductList> {
    Ok(ApiResponse::ok(ProductList { products: s.services.products.list_products().await? }))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<ProductBody> {
    Ok(ApiResponse::ok(ProductBody { product: s.services.products.get_product(&id).await? }))
}

pub async fn create_product(State(s): State<AppState>, ApiJson(r): ApiJson<CreateProduct>) -> Result<(StatusCode, Json<ApiResponse<ProductSaved>>), ApiError> {
    let product = s.services.products.create_product(r).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(ProductSaved { message: "Product Added", product })))
}

pub async fn update_product(State(s): State<AppState>, Path(id): Path<String>, ApiJson(r): ApiJson<UpdateProduct>) -> ApiResult<ProductSaved> {
    let product = s.services.products.update_product(&id, r).await?;
    Ok(ApiResponse::ok(ProductSaved { message: "Product Updated", product }))
}

pub async fn remove_product(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<Message> {
    s.services.products.remove_product(&id).await?;
    Ok(ApiResponse::ok(Message { message: "Product Removed" }))
}

pub async fn rate_product(State(s): State<AppState>, ApiJson(r): ApiJson<SubmitRating>) -> ApiResult<RatingSummary> {
    Ok(ApiResponse::ok(s.services.ratings.submit_rating(r).await?))
}

pub async fn review_product(State(s): State<AppState>, ApiJson(r): ApiJson<SubmitReview>) -> ApiResult<Message> {
    s.services.ratings.submit_review(r).await?;
    Ok(ApiResponse::ok(Message { message: "Review saved" }))
}

pub async fn list_reviews(State(s): State<AppState>, ApiQuery(p): ApiQuery<ReviewParams>) -> ApiResult<ReviewList> {
    let reviews = s.services.ratings.list_reviews(p.product_id.as_deref()).await?;
    Ok(ApiResponse::ok(ReviewList { reviews: reviews.collect() }))
}

pub async fn list_orders(State(s): State<AppState>, ApiQuery(p): ApiQuery<OrderParams>) -> ApiResult<OrderList> {
    let orders = match non_blank(&p.user_id) {
        Some(user_id) => s.services.orders.user_orders(user_id).await?,
        None => s.services.orders.all_orders().await?,
    };
    Ok(ApiResponse::ok(OrderList { orders }))
}

pub async fn get_order(State(s): State<AppState>, Path(id): Path<String>) -> ApiResult<OrderBody> {
    Ok(ApiResponse::ok(OrderBody { order: s.services.orders.get_order(&id).await? }))
}

pub async fn place_order(State(s): State<AppState>, ApiJson(r): ApiJson<PlaceOrder>) -> Result<(StatusCode, Json<ApiResponse<PlacedOrder>>), ApiError> {
    let order = s.services.orders.place_order(r).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(PlacedOrder { message: "Order Placed", order })))
}

pub async fn update_status(State(s): State<AppState>, Path(id): Path<String>, ApiJson(r): ApiJson<StatusRequest>) -> ApiResult<Message> {
    s.services.orders.update_status(&id, &r.status).await?;
    Ok(ApiResponse::ok(Message { message: "Status Updated" }))
}

pub async fn get_shipping_fee(State(s): State<AppState>) -> ApiResult<ShippingFee> {
    let ShippingSettings { fee, .. } = s.services.settings.shipping().await?;
    Ok(ApiResponse::ok(ShippingFee { fee, currency: s.services.settings.currency().to_string() }))
}

pub async fn set_shipping_fee(State(s): State<AppState>, ApiJson(r): ApiJson<ShippingFeeRequest>) -> ApiResult<ShippingFee> {
    let ShippingSettings { fee, .. } = s.services.settings.set_shipping_fee(r.fee).await?;
    Ok(ApiResponse::ok(ShippingFee { fee, currency: s.services.settings.currency().to_string() }))
}
