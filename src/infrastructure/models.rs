use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::notification::{Notification, NotificationScope};
use crate::domain::order::{Order, OrderDetail, ProductImage};
use crate::schema::{
    notification_reads, notifications, order_details, orders, product_images, products,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: String,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub payment_mode: String,
    pub status: String,
}

impl OrderRow {
    pub fn into_domain(self, details: Vec<OrderDetail>) -> Result<Order, DomainError> {
        Ok(Order {
            status: self.status.parse()?,
            id: self.id,
            user_id: self.user_id,
            address_id: self.address_id,
            order_date: self.order_date,
            total_price: self.total_price,
            payment_mode: self.payment_mode,
            details,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: String,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub order_date: DateTime<Utc>,
    pub total_price: BigDecimal,
    pub payment_mode: String,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_details)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderDetailRow {
    pub id: Uuid,
    pub order_id: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: String,
    pub total_price: BigDecimal,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        OrderDetail {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            size: row.size,
            total_price: row.total_price,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_details)]
pub struct NewOrderDetailRow {
    pub id: Uuid,
    pub order_id: String,
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: String,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = product_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductImageRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_path: String,
}

impl From<ProductImageRow> for ProductImage {
    fn from(row: ProductImageRow) -> Self {
        ProductImage {
            id: row.id,
            product_id: row.product_id,
            image_path: row.image_path,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_images)]
pub struct NewProductImageRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_path: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: Uuid,
    pub scope: String,
    pub target_user_id: Option<Uuid>,
    pub message: String,
    pub related_entity: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = DomainError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            scope: NotificationScope::from_parts(&row.scope, row.target_user_id)?,
            id: row.id,
            message: row.message,
            related_entity: row.related_entity,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub scope: &'a str,
    pub target_user_id: Option<Uuid>,
    pub message: &'a str,
    pub related_entity: Option<&'a str>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notification_reads)]
pub struct NewNotificationReadRow {
    pub notification_id: Uuid,
    pub user_id: Uuid,
}
