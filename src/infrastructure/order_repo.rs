use std::collections::HashMap;

use diesel::dsl::sql;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderDetail, OrderLine, OrderStatus, OrderWithLines};
use crate::domain::paging::PageParams;
use crate::domain::ports::OrderRepository;
use crate::schema::{order_details, orders, product_images, products};

use super::models::{OrderDetailRow, OrderRow, ProductImageRow, ProductRow};

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Join each order with its details, product titles and product images.
fn load_lines(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<OrderWithLines>, DomainError> {
    let order_ids: Vec<&str> = rows.iter().map(|o| o.id.as_str()).collect();
    let detail_rows: Vec<(OrderDetailRow, ProductRow)> = order_details::table
        .inner_join(products::table)
        .filter(order_details::order_id.eq_any(order_ids))
        .order((order_details::created_at.asc(), order_details::id.asc()))
        .select((OrderDetailRow::as_select(), ProductRow::as_select()))
        .load(conn)?;

    let product_ids: Vec<Uuid> = detail_rows.iter().map(|(_, p)| p.id).collect();
    let mut images: HashMap<Uuid, Vec<ProductImageRow>> = HashMap::new();
    for image in product_images::table
        .filter(product_images::product_id.eq_any(product_ids))
        .order((product_images::created_at.asc(), product_images::id.asc()))
        .select(ProductImageRow::as_select())
        .load(conn)?
    {
        images.entry(image.product_id).or_default().push(image);
    }

    let mut lines: HashMap<String, Vec<OrderLine>> = HashMap::new();
    for (detail, product) in detail_rows {
        let product_images = images
            .get(&product.id)
            .map(|rows| rows.iter().cloned().map(Into::into).collect())
            .unwrap_or_default();
        lines
            .entry(detail.order_id.clone())
            .or_default()
            .push(OrderLine {
                detail: detail.into(),
                title: product.title,
                images: product_images,
            });
    }

    rows.into_iter()
        .map(|row| {
            let lines = lines.remove(&row.id).unwrap_or_default();
            Ok(OrderWithLines {
                order: row.into_domain(vec![])?,
                lines,
            })
        })
        .collect()
}

impl OrderRepository for DieselOrderRepository {
    fn list_all_with_details(&self) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .select(OrderRow::as_select())
            .order(orders::order_date.desc())
            .load(&mut conn)?;

        let details = OrderDetailRow::belonging_to(&rows)
            .select(OrderDetailRow::as_select())
            .order((order_details::created_at.asc(), order_details::id.asc()))
            .load(&mut conn)?;

        let grouped = details.grouped_by(&rows);
        rows.into_iter()
            .zip(grouped)
            .map(|(row, details)| row.into_domain(details.into_iter().map(Into::into).collect()))
            .collect()
    }

    fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::id.eq(order_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        row.map(|r| r.into_domain(vec![])).transpose()
    }

    fn find_details(&self, order_id: &str) -> Result<Vec<OrderDetail>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = order_details::table
            .inner_join(orders::table)
            .filter(order_details::order_id.eq(order_id))
            .order((order_details::created_at.asc(), order_details::id.asc()))
            .select(OrderDetailRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn search(&self, pattern: &str) -> Result<Vec<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(
                orders::id
                    .ilike(pattern)
                    .or(sql::<Text>("orders.user_id::text").ilike(pattern)),
            )
            .order(orders::order_date.desc())
            .select(OrderRow::as_select())
            .load(&mut conn)?;

        rows.into_iter().map(|r| r.into_domain(vec![])).collect()
    }

    fn delete_with_details(&self, order_id: &str) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let details = diesel::delete(
                order_details::table.filter(order_details::order_id.eq(order_id)),
            )
            .execute(conn)?;
            let order_rows = diesel::delete(orders::table.filter(orders::id.eq(order_id)))
                .execute(conn)?;
            Ok(details + order_rows)
        })
    }

    fn list_for_user(
        &self,
        user_id: Uuid,
        page: PageParams,
    ) -> Result<(Vec<OrderWithLines>, i64), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table
                .filter(orders::user_id.eq(user_id))
                .count()
                .get_result(conn)?;

            let rows = orders::table
                .filter(orders::user_id.eq(user_id))
                .select(OrderRow::as_select())
                .order(orders::order_date.desc())
                .limit(page.page_size)
                .offset(page.offset())
                .load(conn)?;

            Ok((load_lines(conn, rows)?, total))
        })
    }

    fn find_with_lines(&self, order_id: &str) -> Result<Option<OrderWithLines>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = orders::table
            .filter(orders::id.eq(order_id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(load_lines(&mut conn, vec![row])?.pop())
    }

    fn update_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::update(orders::table.filter(orders::id.eq(order_id)))
            .set(orders::status.eq(status.as_str()))
            .returning(OrderRow::as_returning())
            .get_result(&mut conn)
            .optional()?;

        row.map(|r| r.into_domain(vec![])).transpose()
    }
}
