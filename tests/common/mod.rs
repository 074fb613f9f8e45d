//! In-memory implementations of the repository ports for HTTP tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use storefront_service::domain::errors::DomainError;
use storefront_service::domain::notification::{
    NewNotification, Notification, NotificationView, Principal, Role,
};
use storefront_service::domain::order::{
    Order, OrderDetail, OrderLine, OrderStatus, OrderWithLines, ProductImage,
};
use storefront_service::domain::paging::PageParams;
use storefront_service::domain::ports::{NotificationRepository, OrderRepository};
use storefront_service::infrastructure::hub::InMemoryHub;
use storefront_service::infrastructure::token::HmacTokenVerifier;
use storefront_service::AppState;

pub const SECRET: &str = "api-test-secret";

#[derive(Default)]
pub struct MemoryOrderRepo {
    orders: Mutex<Vec<Order>>,
    lines: Mutex<HashMap<String, Vec<OrderLine>>>,
}

impl MemoryOrderRepo {
    /// Add an order owned by `user_id` with one line per `(title, images)`.
    pub fn add(&self, id: &str, user_id: Uuid, age_days: i64, lines: &[(&str, &[&str])]) {
        let order = Order {
            id: id.to_string(),
            user_id,
            address_id: Uuid::new_v4(),
            order_date: Utc::now() - Duration::days(age_days),
            total_price: BigDecimal::from(10 * lines.len() as i64),
            payment_mode: "CARD".to_string(),
            status: OrderStatus::Pending,
            details: vec![],
        };
        let lines = lines
            .iter()
            .map(|(title, images)| {
                let product_id = Uuid::new_v4();
                OrderLine {
                    detail: OrderDetail {
                        id: Uuid::new_v4(),
                        order_id: id.to_string(),
                        product_id,
                        quantity: 1,
                        size: "M".to_string(),
                        total_price: BigDecimal::from(10),
                    },
                    title: title.to_string(),
                    images: images
                        .iter()
                        .map(|path| ProductImage {
                            id: Uuid::new_v4(),
                            product_id,
                            image_path: path.to_string(),
                        })
                        .collect(),
                }
            })
            .collect();
        self.lines.lock().unwrap().insert(id.to_string(), lines);
        self.orders.lock().unwrap().push(order);
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    fn details_of(&self, order_id: &str) -> Vec<OrderDetail> {
        self.lines
            .lock()
            .unwrap()
            .get(order_id)
            .map(|lines| lines.iter().map(|l| l.detail.clone()).collect())
            .unwrap_or_default()
    }

    fn with_lines(&self, order: Order) -> OrderWithLines {
        let lines = self
            .lines
            .lock()
            .unwrap()
            .get(&order.id)
            .cloned()
            .unwrap_or_default();
        OrderWithLines { order, lines }
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
}

impl OrderRepository for MemoryOrderRepo {
    fn list_all_with_details(&self) -> Result<Vec<Order>, DomainError> {
        let mut orders = self.orders.lock().unwrap().clone();
        newest_first(&mut orders);
        Ok(orders
            .into_iter()
            .map(|mut o| {
                o.details = self.details_of(&o.id);
                o
            })
            .collect())
    }

    fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, DomainError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == order_id)
            .cloned())
    }

    fn find_details(&self, order_id: &str) -> Result<Vec<OrderDetail>, DomainError> {
        Ok(self.details_of(order_id))
    }

    fn search(&self, pattern: &str) -> Result<Vec<Order>, DomainError> {
        let needle = pattern.trim_matches('%').replace('\\', "").to_lowercase();
        let mut found: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| {
                o.id.to_lowercase().contains(&needle) || o.user_id.to_string().contains(&needle)
            })
            .cloned()
            .collect();
        newest_first(&mut found);
        Ok(found)
    }

    fn delete_with_details(&self, order_id: &str) -> Result<usize, DomainError> {
        let details = self
            .lines
            .lock()
            .unwrap()
            .remove(order_id)
            .map(|l| l.len())
            .unwrap_or(0);
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|o| o.id != order_id);
        Ok(details + (before - orders.len()))
    }

    fn list_for_user(
        &self,
        user_id: Uuid,
        page: PageParams,
    ) -> Result<(Vec<OrderWithLines>, i64), DomainError> {
        let mut owned: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut owned);
        let total = owned.len() as i64;
        let items = owned
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.page_size as usize)
            .map(|o| self.with_lines(o))
            .collect();
        Ok((items, total))
    }

    fn find_with_lines(&self, order_id: &str) -> Result<Option<OrderWithLines>, DomainError> {
        Ok(self.find_by_id(order_id)?.map(|o| self.with_lines(o)))
    }

    fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        let mut orders = self.orders.lock().unwrap();
        Ok(orders.iter_mut().find(|o| o.id == order_id).map(|o| {
            o.status = status;
            o.clone()
        }))
    }
}

#[derive(Default)]
pub struct MemoryNotificationRepo {
    stored: Mutex<Vec<Notification>>,
    reads: Mutex<HashSet<(Uuid, Uuid)>>,
}

impl MemoryNotificationRepo {
    fn visible(&self, principal: &Principal) -> Vec<Notification> {
        let mut visible: Vec<Notification> = self
            .stored
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.scope.includes(principal))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visible
    }
}

impl NotificationRepository for MemoryNotificationRepo {
    fn insert(&self, notification: &NewNotification) -> Result<Notification, DomainError> {
        let mut stored = self.stored.lock().unwrap();
        // Strictly increasing timestamps keep newest-first ordering stable.
        let created_at: DateTime<Utc> = stored
            .last()
            .map(|n| n.created_at + Duration::milliseconds(1))
            .unwrap_or_else(Utc::now);
        let row = Notification {
            id: notification.id,
            scope: notification.scope,
            message: notification.message.clone(),
            related_entity: notification.related_entity.clone(),
            created_at,
        };
        stored.push(row.clone());
        Ok(row)
    }

    fn list_for(&self, principal: &Principal) -> Result<Vec<NotificationView>, DomainError> {
        let reads = self.reads.lock().unwrap();
        Ok(self
            .visible(principal)
            .into_iter()
            .map(|n| {
                let is_read = reads.contains(&(n.id, principal.user_id));
                NotificationView::new(n, is_read)
            })
            .collect())
    }

    fn find_visible(
        &self,
        id: Uuid,
        principal: &Principal,
    ) -> Result<Option<Notification>, DomainError> {
        Ok(self.visible(principal).into_iter().find(|n| n.id == id))
    }

    fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.reads.lock().unwrap().insert((id, user_id)))
    }

    fn mark_all_read(&self, principal: &Principal) -> Result<usize, DomainError> {
        let visible = self.visible(principal);
        let mut reads = self.reads.lock().unwrap();
        Ok(visible
            .iter()
            .filter(|n| reads.insert((n.id, principal.user_id)))
            .count())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub orders: Arc<MemoryOrderRepo>,
    pub notifications: Arc<MemoryNotificationRepo>,
    pub hub: Arc<InMemoryHub>,
    pub tokens: Arc<HmacTokenVerifier>,
}

impl TestApp {
    pub fn new() -> Self {
        let orders = Arc::new(MemoryOrderRepo::default());
        let notifications = Arc::new(MemoryNotificationRepo::default());
        let hub = Arc::new(InMemoryHub::new(8));
        let tokens = Arc::new(HmacTokenVerifier::new(SECRET));
        let state = AppState::new(
            orders.clone(),
            notifications.clone(),
            hub.clone(),
            tokens.clone(),
        );
        Self {
            state,
            orders,
            notifications,
            hub,
            tokens,
        }
    }

    pub fn bearer(&self, principal: &Principal) -> (&'static str, String) {
        let token = self.tokens.issue(principal, Duration::minutes(5));
        ("Authorization", format!("Bearer {token}"))
    }
}

pub fn user() -> Principal {
    Principal::new(Uuid::new_v4(), Role::User)
}

pub fn admin() -> Principal {
    Principal::new(Uuid::new_v4(), Role::Admin)
}
