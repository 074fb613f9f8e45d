use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::order::{
    Order, OrderDetail, OrderDetailsProduct, OrderDetailsView, OrderStatus, OrderSummary,
    ProductImage,
};
use crate::domain::paging::{PageParams, Paged, DEFAULT_PAGE_SIZE};
use crate::domain::response::ServiceResponse;
use crate::errors::AppError;
use crate::handlers::auth::{AdminUser, AuthenticatedUser};
use crate::SharedOrderService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailResponse {
    pub id: Uuid,
    pub order_id: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: String,
    /// Decimal line total as a string, e.g. "19.98"
    pub total_price: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub order_date: String,
    pub total_price: String,
    pub payment_mode: String,
    pub status: OrderStatus,
    pub details: Vec<OrderDetailResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderSummaryResponse {
    pub id: String,
    pub order_date: String,
    pub total_price: String,
    pub product: String,
    pub product_image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderSummaryPageResponse {
    pub items: Vec<OrderSummaryResponse>,
    pub current_page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductImageResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_path: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailsProductResponse {
    pub product_id: Uuid,
    pub product_size: String,
    /// `null` when the product has no images.
    pub product_images: Option<Vec<ProductImageResponse>>,
    pub quantity: i32,
    pub title: String,
    pub total_price: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailsResponse {
    pub order_date: String,
    pub total_price: String,
    pub products: Vec<OrderDetailsProductResponse>,
}

/// Result envelope for the client order view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailsEnvelope {
    pub data: Option<OrderDetailsResponse>,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteOrderResponse {
    /// Rows removed: the order plus its details, `0` if it did not exist.
    pub affected: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Text matched against order ids and user ids, case-insensitive.
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page_number: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

// ── Mapping ──────────────────────────────────────────────────────────────────

impl From<OrderDetail> for OrderDetailResponse {
    fn from(d: OrderDetail) -> Self {
        Self {
            id: d.id,
            order_id: d.order_id,
            product_id: d.product_id,
            quantity: d.quantity,
            size: d.size,
            total_price: d.total_price.to_string(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            address_id: o.address_id,
            order_date: o.order_date.to_rfc3339(),
            total_price: o.total_price.to_string(),
            payment_mode: o.payment_mode,
            status: o.status,
            details: o.details.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<OrderSummary> for OrderSummaryResponse {
    fn from(s: OrderSummary) -> Self {
        Self {
            id: s.id,
            order_date: s.order_date.to_rfc3339(),
            total_price: s.total_price.to_string(),
            product: s.product,
            product_image_url: s.product_image_url,
        }
    }
}

impl From<Paged<OrderSummary>> for OrderSummaryPageResponse {
    fn from(page: Paged<OrderSummary>) -> Self {
        let has_previous = page.has_previous();
        let has_next = page.has_next();
        let page = page.map(OrderSummaryResponse::from);
        Self {
            items: page.items,
            current_page: page.current_page,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages: page.total_pages,
            has_previous,
            has_next,
        }
    }
}

impl From<ProductImage> for ProductImageResponse {
    fn from(i: ProductImage) -> Self {
        Self {
            id: i.id,
            product_id: i.product_id,
            image_path: i.image_path,
        }
    }
}

impl From<OrderDetailsProduct> for OrderDetailsProductResponse {
    fn from(p: OrderDetailsProduct) -> Self {
        Self {
            product_id: p.product_id,
            product_size: p.product_size,
            product_images: p
                .product_images
                .map(|images| images.into_iter().map(Into::into).collect()),
            quantity: p.quantity,
            title: p.title,
            total_price: p.total_price.to_string(),
        }
    }
}

impl From<OrderDetailsView> for OrderDetailsResponse {
    fn from(v: OrderDetailsView) -> Self {
        Self {
            order_date: v.order_date.to_rfc3339(),
            total_price: v.total_price.to_string(),
            products: v.products.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ServiceResponse<OrderDetailsView>> for OrderDetailsEnvelope {
    fn from(r: ServiceResponse<OrderDetailsView>) -> Self {
        let r = r.map(OrderDetailsResponse::from);
        Self {
            data: r.data,
            success: r.success,
            message: r.message,
        }
    }
}

// ── Client handlers ──────────────────────────────────────────────────────────

/// GET /orders
///
/// The caller's orders, newest first, one summary line per order.
#[utoipa::path(
    get,
    path = "/orders",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of order summaries", body = OrderSummaryPageResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn list_my_orders(
    svc: web::Data<SharedOrderService>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let params = PageParams::new(query.page_number, query.page_size);
    let user_id = user.0.user_id;

    let page = web::block(move || svc.get_orders(params, user_id)).await??;

    Ok(HttpResponse::Ok().json(OrderSummaryPageResponse::from(page)))
}

/// GET /orders/{id}
///
/// Full breakdown of one order. An unknown id answers 404 with a failure
/// envelope rather than a bare error.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(("id" = String, Path, description = "Order code")),
    responses(
        (status = 200, description = "Order found", body = OrderDetailsEnvelope),
        (status = 404, description = "Order not found", body = OrderDetailsEnvelope),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn get_my_order(
    svc: web::Data<SharedOrderService>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let result = web::block(move || svc.get_order_details_for_client(&order_id)).await??;

    let envelope = OrderDetailsEnvelope::from(result);
    if envelope.success {
        Ok(HttpResponse::Ok().json(envelope))
    } else {
        Ok(HttpResponse::NotFound().json(envelope))
    }
}

// ── Admin handlers ───────────────────────────────────────────────────────────

/// GET /admin/orders
#[utoipa::path(
    get,
    path = "/admin/orders",
    responses(
        (status = 200, description = "Every order with its details", body = Vec<OrderResponse>),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn list_all_orders(
    svc: web::Data<SharedOrderService>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || svc.get_all_orders()).await??;

    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /admin/orders/search?q=
#[utoipa::path(
    get,
    path = "/admin/orders/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching orders, without details", body = Vec<OrderResponse>),
        (status = 400, description = "Search text rejected"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn search_orders(
    svc: web::Data<SharedOrderService>,
    _admin: AdminUser,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let text = query.into_inner().q;

    let orders = web::block(move || svc.search_order(&text)).await??;

    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /admin/orders/{id}/details
#[utoipa::path(
    get,
    path = "/admin/orders/{id}/details",
    params(("id" = String, Path, description = "Order code")),
    responses(
        (status = 200, description = "Details of the order, empty if unknown", body = Vec<OrderDetailResponse>),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn get_order_details(
    svc: web::Data<SharedOrderService>,
    _admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let details = web::block(move || svc.get_order_details(&order_id)).await??;

    let body: Vec<OrderDetailResponse> = details.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// DELETE /admin/orders/{id}
///
/// Removes the order and all of its details in one transaction.
#[utoipa::path(
    delete,
    path = "/admin/orders/{id}",
    params(("id" = String, Path, description = "Order code")),
    responses(
        (status = 200, description = "Rows removed", body = DeleteOrderResponse),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn delete_order(
    svc: web::Data<SharedOrderService>,
    _admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let affected = web::block(move || svc.delete_order(&order_id)).await??;

    Ok(HttpResponse::Ok().json(DeleteOrderResponse { affected }))
}

/// PUT /admin/orders/{id}/status
///
/// Moves the order to a new status and notifies its owner.
#[utoipa::path(
    put,
    path = "/admin/orders/{id}/status",
    params(("id" = String, Path, description = "Order code")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn update_order_status(
    svc: web::Data<SharedOrderService>,
    _admin: AdminUser,
    path: web::Path<String>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;

    let order = web::block(move || svc.update_order_status(&order_id, status)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
