use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use super::errors::DomainError;
use super::notification::{
    ConnectionId, HubEvent, NewNotification, Notification, NotificationView, Principal, Role,
};
use super::order::{Order, OrderDetail, OrderStatus, OrderWithLines};
use super::paging::PageParams;

pub trait OrderRepository: Send + Sync + 'static {
    /// Every order with its own details, newest first.
    fn list_all_with_details(&self) -> Result<Vec<Order>, DomainError>;
    fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, DomainError>;
    fn find_details(&self, order_id: &str) -> Result<Vec<OrderDetail>, DomainError>;
    /// `pattern` is an ILIKE pattern matched against the order id and the
    /// textual user id.
    fn search(&self, pattern: &str) -> Result<Vec<Order>, DomainError>;
    /// Removes the order and its details in one transaction and returns the
    /// number of deleted rows.
    fn delete_with_details(&self, order_id: &str) -> Result<usize, DomainError>;
    fn list_for_user(
        &self,
        user_id: Uuid,
        page: PageParams,
    ) -> Result<(Vec<OrderWithLines>, i64), DomainError>;
    fn find_with_lines(&self, order_id: &str) -> Result<Option<OrderWithLines>, DomainError>;
    fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, DomainError>;
}

pub trait NotificationRepository: Send + Sync + 'static {
    fn insert(&self, notification: &NewNotification) -> Result<Notification, DomainError>;
    /// Notifications addressed to `principal`, newest first, with its read flag.
    fn list_for(&self, principal: &Principal) -> Result<Vec<NotificationView>, DomainError>;
    fn find_visible(
        &self,
        id: Uuid,
        principal: &Principal,
    ) -> Result<Option<Notification>, DomainError>;
    /// Returns `true` when the read mark was newly recorded.
    fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError>;
    /// Marks everything addressed to `principal`; returns how many were newly marked.
    fn mark_all_read(&self, principal: &Principal) -> Result<usize, DomainError>;
}

/// A live hub connection handed to the transport layer.
pub struct Subscription {
    pub id: ConnectionId,
    pub events: mpsc::Receiver<HubEvent>,
}

/// Best-effort push to connected clients. Every send returns the number of
/// connections the event was queued on.
pub trait NotificationPublisher: Send + Sync + 'static {
    fn connect(&self, principal: Principal) -> Subscription;
    fn disconnect(&self, id: ConnectionId);
    fn send_to_group(&self, role: Role, event: &HubEvent) -> usize;
    fn send_to_user(&self, user_id: Uuid, event: &HubEvent) -> usize;
    fn is_connected(&self, user_id: Uuid) -> bool;
}

pub trait TokenVerifier: Send + Sync + 'static {
    fn verify(&self, token: &str) -> Result<Principal, DomainError>;
}

/// Notifies an order's owner about changes to that order.
pub trait OrderNotifier: Send + Sync + 'static {
    fn notify_order_owner(&self, order: &Order, message: String) -> Result<(), DomainError>;
}

impl<T: OrderRepository + ?Sized> OrderRepository for Arc<T> {
    fn list_all_with_details(&self) -> Result<Vec<Order>, DomainError> {
        (**self).list_all_with_details()
    }

    fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, DomainError> {
        (**self).find_by_id(order_id)
    }

    fn find_details(&self, order_id: &str) -> Result<Vec<OrderDetail>, DomainError> {
        (**self).find_details(order_id)
    }

    fn search(&self, pattern: &str) -> Result<Vec<Order>, DomainError> {
        (**self).search(pattern)
    }

    fn delete_with_details(&self, order_id: &str) -> Result<usize, DomainError> {
        (**self).delete_with_details(order_id)
    }

    fn list_for_user(
        &self,
        user_id: Uuid,
        page: PageParams,
    ) -> Result<(Vec<OrderWithLines>, i64), DomainError> {
        (**self).list_for_user(user_id, page)
    }

    fn find_with_lines(&self, order_id: &str) -> Result<Option<OrderWithLines>, DomainError> {
        (**self).find_with_lines(order_id)
    }

    fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        (**self).update_status(order_id, status)
    }
}

impl<T: NotificationRepository + ?Sized> NotificationRepository for Arc<T> {
    fn insert(&self, notification: &NewNotification) -> Result<Notification, DomainError> {
        (**self).insert(notification)
    }

    fn list_for(&self, principal: &Principal) -> Result<Vec<NotificationView>, DomainError> {
        (**self).list_for(principal)
    }

    fn find_visible(
        &self,
        id: Uuid,
        principal: &Principal,
    ) -> Result<Option<Notification>, DomainError> {
        (**self).find_visible(id, principal)
    }

    fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        (**self).mark_read(id, user_id)
    }

    fn mark_all_read(&self, principal: &Principal) -> Result<usize, DomainError> {
        (**self).mark_all_read(principal)
    }
}

impl<T: NotificationPublisher + ?Sized> NotificationPublisher for Arc<T> {
    fn connect(&self, principal: Principal) -> Subscription {
        (**self).connect(principal)
    }

    fn disconnect(&self, id: ConnectionId) {
        (**self).disconnect(id)
    }

    fn send_to_group(&self, role: Role, event: &HubEvent) -> usize {
        (**self).send_to_group(role, event)
    }

    fn send_to_user(&self, user_id: Uuid, event: &HubEvent) -> usize {
        (**self).send_to_user(user_id, event)
    }

    fn is_connected(&self, user_id: Uuid) -> bool {
        (**self).is_connected(user_id)
    }
}
