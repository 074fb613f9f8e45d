use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    search_pattern, Order, OrderDetail, OrderDetailsView, OrderStatus, OrderSummary,
};
use crate::domain::paging::{PageParams, Paged};
use crate::domain::ports::{OrderNotifier, OrderRepository};
use crate::domain::response::ServiceResponse;

pub const ORDER_NOT_FOUND: &str = "Order not found.";
const MAX_ORDER_ID_LEN: usize = 64;

pub struct OrderService<R> {
    repo: R,
    notifier: Arc<dyn OrderNotifier>,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self { repo, notifier }
    }

    pub fn get_all_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.repo.list_all_with_details()
    }

    /// Details of one order; empty when the order has none or does not exist.
    pub fn get_order_details(&self, order_id: &str) -> Result<Vec<OrderDetail>, DomainError> {
        self.repo.find_details(validate_order_id(order_id)?)
    }

    pub fn search_order(&self, search_text: &str) -> Result<Vec<Order>, DomainError> {
        let pattern = search_pattern(search_text)?;
        self.repo.search(&pattern)
    }

    /// Deletes an order together with its details. Returns the number of
    /// removed rows, `0` when the order does not exist.
    pub fn delete_order(&self, order_id: &str) -> Result<usize, DomainError> {
        let Some(order) = self.repo.find_by_id(validate_order_id(order_id)?)? else {
            log::debug!("Delete requested for unknown order {}", order_id);
            return Ok(0);
        };

        let affected = self.repo.delete_with_details(&order.id)?;
        log::info!("Deleted order {} ({} rows)", order.id, affected);
        Ok(affected)
    }

    pub fn get_orders(
        &self,
        page: PageParams,
        user_id: Uuid,
    ) -> Result<Paged<OrderSummary>, DomainError> {
        let (orders, total) = self.repo.list_for_user(user_id, page)?;
        let summaries = orders.iter().map(|o| o.summary()).collect();
        Ok(Paged::new(summaries, page, total))
    }

    pub fn get_order_details_for_client(
        &self,
        order_id: &str,
    ) -> Result<ServiceResponse<OrderDetailsView>, DomainError> {
        let order = self.repo.find_with_lines(validate_order_id(order_id)?)?;
        Ok(match order {
            Some(order) => ServiceResponse::ok(order.into_details_view()),
            None => ServiceResponse::fail(ORDER_NOT_FOUND),
        })
    }

    /// Moves an order to `status` and tells its owner. A failed notification
    /// does not undo the status change.
    pub fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        let order = self
            .repo
            .update_status(validate_order_id(order_id)?, status)?
            .ok_or(DomainError::NotFound)?;

        let message = format!("Your order {} is now {}", order.id, status);
        if let Err(e) = self.notifier.notify_order_owner(&order, message) {
            log::warn!("Failed to notify owner of order {}: {}", order.id, e);
        }
        Ok(order)
    }
}

fn validate_order_id(order_id: &str) -> Result<&str, DomainError> {
    let id = order_id.trim();
    if id.is_empty() || id.len() > MAX_ORDER_ID_LEN {
        return Err(DomainError::InvalidInput(format!(
            "order id must be 1 to {MAX_ORDER_ID_LEN} characters"
        )));
    }
    Ok(id)
}
