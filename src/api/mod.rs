//! HTTP surface
//!
//! Every response body carries a `success` flag; failures add a `message`.

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, FromRequest, FromRequestParts},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::Services;
use crate::{EcommerceError, ErrorKind};

mod handlers;

pub const SERVICE_NAME: &str = "storefront-api";

#[derive(Clone)]
pub struct AppState { pub services: Services }

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/products", get(handlers::list_products).post(handlers::create_product))
        .route("/api/v1/products/:id", get(handlers::get_product).put(handlers::update_product).delete(handlers::remove_product))
        .route("/api/v1/ratings", post(handlers::rate_product))
        .route("/api/v1/reviews", get(handlers::list_reviews).post(handlers::review_product))
        .route("/api/v1/orders", get(handlers::list_orders).post(handlers::place_order))
        .route("/api/v1/orders/:id", get(handlers::get_order))
        .route("/api/v1/orders/:id/status", put(handlers::update_status))
        .route("/api/v1/shipping-fee", get(handlers::get_shipping_fee).put(handlers::set_shipping_fee))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Success envelope: `{"success": true, ...payload}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> { Json(Self { success: true, data }) }
}

#[derive(Debug)]
pub struct ApiError(pub EcommerceError);

impl From<EcommerceError> for ApiError {
    fn from(e: EcommerceError) -> Self { Self(e) }
}

impl From<JsonRejection> for ApiError {
    fn from(r: JsonRejection) -> Self { Self(EcommerceError::validation(r.body_text())) }
}

impl From<QueryRejection> for ApiError {
    fn from(r: QueryRejection) -> Self { Self(EcommerceError::validation(r.body_text())) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Duplicate | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Precondition => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::warn!(error = %self.0, "request rejected");
        }
        (status, Json(serde_json::json!({ "success": false, "message": self.0.to_string() }))).into_response()
    }
}

/// `Json` extractor whose rejection uses the API error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejection uses the API error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
