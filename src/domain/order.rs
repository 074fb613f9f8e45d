use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::DomainError;

pub const MAX_SEARCH_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipping,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Shipping => "SHIPPING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "SHIPPING" => Ok(OrderStatus::Shipping),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::InvalidInput(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub id: Uuid,
    pub order_id: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: String,
    pub total_price: BigDecimal,
}

/// An order header. `details` is empty for the lighter projections
/// (search results, paged summaries).
#[derive(Debug, Clone)]
pub struct Order {
    pub id: String,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub payment_mode: String,
    pub status: OrderStatus,
    pub details: Vec<OrderDetail>,
}

#[derive(Debug, Clone)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_path: String,
}

/// One order detail joined with its product title and images.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub detail: OrderDetail,
    pub title: String,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: String,
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub product: String,
    pub product_image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderDetailsProduct {
    pub product_id: Uuid,
    pub product_size: String,
    /// `None` when the product has no images at all.
    pub product_images: Option<Vec<ProductImage>>,
    pub quantity: i32,
    pub title: String,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderDetailsView {
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub products: Vec<OrderDetailsProduct>,
}

/// Label shown in order lists: the first product's title, plus
/// `" and N more..."` when the order has more than one line.
pub fn product_label(lines: &[OrderLine]) -> String {
    match lines {
        [] => String::new(),
        [only] => only.title.clone(),
        [first, rest @ ..] => format!("{} and {} more...", first.title, rest.len()),
    }
}

impl OrderWithLines {
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.order.id.clone(),
            order_date: self.order.order_date,
            total_price: self.order.total_price.clone(),
            product: product_label(&self.lines),
            product_image_url: self
                .lines
                .first()
                .and_then(|line| line.images.first())
                .map(|image| image.image_path.clone()),
        }
    }

    pub fn into_details_view(self) -> OrderDetailsView {
        OrderDetailsView {
            order_date: self.order.order_date,
            total_price: self.order.total_price,
            products: self
                .lines
                .into_iter()
                .map(|line| OrderDetailsProduct {
                    product_id: line.detail.product_id,
                    product_size: line.detail.size,
                    product_images: (!line.images.is_empty()).then_some(line.images),
                    quantity: line.detail.quantity,
                    title: line.title,
                    total_price: line.detail.total_price,
                })
                .collect(),
        }
    }
}

/// Validate free-text order search input and turn it into an ILIKE pattern
/// that matches the text as a literal substring. Surrounding whitespace is
/// trimmed first, so `" 1"` searches for `"1"` and blank text matches every
/// order.
pub fn search_pattern(search_text: &str) -> Result<String, DomainError> {
    let text = search_text.trim();
    if text.chars().count() > MAX_SEARCH_LEN {
        return Err(DomainError::InvalidInput(format!(
            "search text must be at most {MAX_SEARCH_LEN} characters"
        )));
    }
    if text.chars().any(char::is_control) {
        return Err(DomainError::InvalidInput(
            "search text must not contain control characters".to_string(),
        ));
    }

    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Ok(pattern)
}
