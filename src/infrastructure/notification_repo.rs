use std::collections::HashSet;

use diesel::pg::Pg;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::notification::{
    NewNotification, Notification, NotificationScope, NotificationView, Principal,
};
use crate::domain::ports::NotificationRepository;
use crate::schema::{notification_reads, notifications};

use super::models::{NewNotificationReadRow, NewNotificationRow, NotificationRow};

pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Notifications addressed to `principal`: its role group plus its own.
fn visible_to(principal: &Principal) -> notifications::BoxedQuery<'static, Pg> {
    let group = NotificationScope::group_of(principal.role).as_str();
    notifications::table
        .filter(
            notifications::scope
                .eq(group)
                .or(notifications::target_user_id.is_not_distinct_from(principal.user_id)),
        )
        .into_boxed()
}

impl NotificationRepository for DieselNotificationRepository {
    fn insert(&self, notification: &NewNotification) -> Result<Notification, DomainError> {
        let mut conn = self.pool.get()?;

        let row = diesel::insert_into(notifications::table)
            .values(&NewNotificationRow {
                id: notification.id,
                scope: notification.scope.as_str(),
                target_user_id: notification.scope.target_user_id(),
                message: &notification.message,
                related_entity: notification.related_entity.as_deref(),
            })
            .returning(NotificationRow::as_returning())
            .get_result(&mut conn)?;

        row.try_into()
    }

    fn list_for(&self, principal: &Principal) -> Result<Vec<NotificationView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows: Vec<NotificationRow> = visible_to(principal)
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .load(&mut conn)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let read: HashSet<Uuid> = notification_reads::table
            .filter(notification_reads::user_id.eq(principal.user_id))
            .filter(notification_reads::notification_id.eq_any(ids))
            .select(notification_reads::notification_id)
            .load::<Uuid>(&mut conn)?
            .into_iter()
            .collect();

        rows.into_iter()
            .map(|row| {
                let is_read = read.contains(&row.id);
                Ok(NotificationView::new(row.try_into()?, is_read))
            })
            .collect()
    }

    fn find_visible(
        &self,
        id: Uuid,
        principal: &Principal,
    ) -> Result<Option<Notification>, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<NotificationRow> = visible_to(principal)
            .filter(notifications::id.eq(id))
            .first(&mut conn)
            .optional()?;

        row.map(TryInto::try_into).transpose()
    }

    fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;

        let inserted = diesel::insert_into(notification_reads::table)
            .values(&NewNotificationReadRow {
                notification_id: id,
                user_id,
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)?;

        Ok(inserted == 1)
    }

    fn mark_all_read(&self, principal: &Principal) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        // INSERT .. SELECT keeps the statement size independent of how many
        // notifications the caller can see. Same audience as `visible_to`.
        let group = NotificationScope::group_of(principal.role).as_str();
        let visible = notifications::table
            .filter(
                notifications::scope
                    .eq(group)
                    .or(notifications::target_user_id.is_not_distinct_from(principal.user_id)),
            )
            .select((
                notifications::id,
                principal.user_id.into_sql::<diesel::sql_types::Uuid>(),
            ));

        Ok(diesel::insert_into(notification_reads::table)
            .values(visible)
            .into_columns((notification_reads::notification_id, notification_reads::user_id))
            .on_conflict_do_nothing()
            .execute(&mut conn)?)
    }
}

#[cfg(test)]
mod tests {
    use diesel::prelude::*;
    use uuid::Uuid;

    use super::DieselNotificationRepository;
    use crate::domain::notification::{
        NewNotification, NotificationDraft, NotificationScope, Principal, Role,
    };
    use crate::domain::ports::NotificationRepository;
    use crate::infrastructure::models::NewNotificationRow;
    use crate::infrastructure::test_db::setup_db;
    use crate::schema::notifications;

    fn new_notification(message: &str, scope: NotificationScope) -> NewNotification {
        NewNotification::from_draft(
            NotificationDraft {
                message: message.to_string(),
                related_entity: Some("ORD-1".to_string()),
                user_id: None,
            },
            scope,
        )
        .expect("valid draft")
    }

    #[tokio::test]
    async fn insert_round_trips_scope_and_payload() {
        let (_container, pool) = setup_db().await;
        let repo = DieselNotificationRepository::new(pool);
        let user = Uuid::new_v4();

        let stored = repo
            .insert(&new_notification("Shipped", NotificationScope::User(user)))
            .expect("insert failed");

        assert_eq!(stored.scope, NotificationScope::User(user));
        assert_eq!(stored.message, "Shipped");
        assert_eq!(stored.related_entity.as_deref(), Some("ORD-1"));
    }

    #[tokio::test]
    async fn list_for_respects_audience() {
        let (_container, pool) = setup_db().await;
        let repo = DieselNotificationRepository::new(pool);
        let alice = Principal::new(Uuid::new_v4(), Role::User);
        let bob = Principal::new(Uuid::new_v4(), Role::User);
        let admin = Principal::new(Uuid::new_v4(), Role::Admin);

        repo.insert(&new_notification("everyone", NotificationScope::AllUsers))
            .expect("insert");
        repo.insert(&new_notification("admins", NotificationScope::AllAdmins))
            .expect("insert");
        repo.insert(&new_notification("alice", NotificationScope::User(alice.user_id)))
            .expect("insert");

        let for_alice = repo.list_for(&alice).expect("list");
        let messages: Vec<&str> = for_alice.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["alice", "everyone"]);

        assert_eq!(repo.list_for(&bob).expect("list").len(), 1);

        let for_admin = repo.list_for(&admin).expect("list");
        assert_eq!(for_admin.len(), 1);
        assert_eq!(for_admin[0].message, "admins");
    }

    #[tokio::test]
    async fn find_visible_hides_other_users_notifications() {
        let (_container, pool) = setup_db().await;
        let repo = DieselNotificationRepository::new(pool);
        let alice = Principal::new(Uuid::new_v4(), Role::User);
        let bob = Principal::new(Uuid::new_v4(), Role::User);

        let stored = repo
            .insert(&new_notification("alice", NotificationScope::User(alice.user_id)))
            .expect("insert");

        assert!(repo.find_visible(stored.id, &alice).expect("find").is_some());
        assert!(repo.find_visible(stored.id, &bob).expect("find").is_none());
        assert!(repo
            .find_visible(Uuid::new_v4(), &alice)
            .expect("find")
            .is_none());
    }

    #[tokio::test]
    async fn mark_read_is_per_user_and_idempotent() {
        let (_container, pool) = setup_db().await;
        let repo = DieselNotificationRepository::new(pool);
        let alice = Principal::new(Uuid::new_v4(), Role::User);
        let bob = Principal::new(Uuid::new_v4(), Role::User);

        let stored = repo
            .insert(&new_notification("sale", NotificationScope::AllUsers))
            .expect("insert");

        assert!(repo.mark_read(stored.id, alice.user_id).expect("mark"));
        assert!(!repo.mark_read(stored.id, alice.user_id).expect("mark"));

        assert!(repo.list_for(&alice).expect("list")[0].is_read);
        assert!(!repo.list_for(&bob).expect("list")[0].is_read);
    }

    #[tokio::test]
    async fn mark_all_read_twice_equals_once() {
        let (_container, pool) = setup_db().await;
        let repo = DieselNotificationRepository::new(pool);
        let alice = Principal::new(Uuid::new_v4(), Role::User);

        repo.insert(&new_notification("one", NotificationScope::AllUsers))
            .expect("insert");
        let own = repo
            .insert(&new_notification("two", NotificationScope::User(alice.user_id)))
            .expect("insert");
        repo.insert(&new_notification("admins", NotificationScope::AllAdmins))
            .expect("insert");
        repo.mark_read(own.id, alice.user_id).expect("mark");

        assert_eq!(repo.mark_all_read(&alice).expect("mark all"), 1);
        let once = repo.list_for(&alice).expect("list");
        assert_eq!(repo.mark_all_read(&alice).expect("mark all"), 0);
        let twice = repo.list_for(&alice).expect("list");

        assert_eq!(once, twice);
        assert!(twice.iter().all(|n| n.is_read));
    }

    #[tokio::test]
    async fn mark_all_read_handles_more_rows_than_fit_in_one_statement() {
        let (_container, pool) = setup_db().await;
        let repo = DieselNotificationRepository::new(pool.clone());
        let alice = Principal::new(Uuid::new_v4(), Role::User);

        // Two bind parameters per row would exceed the 65 535 limit.
        const COUNT: usize = 33_000;
        let ids: Vec<Uuid> = (0..COUNT).map(|_| Uuid::new_v4()).collect();
        let mut conn = pool.get().expect("connection");
        for chunk in ids.chunks(5_000) {
            let rows: Vec<NewNotificationRow> = chunk
                .iter()
                .map(|id| NewNotificationRow {
                    id: *id,
                    scope: "all_users",
                    target_user_id: None,
                    message: "sale",
                    related_entity: None,
                })
                .collect();
            diesel::insert_into(notifications::table)
                .values(&rows)
                .execute(&mut conn)
                .expect("bulk insert");
        }

        assert_eq!(repo.mark_all_read(&alice).expect("mark all"), COUNT);
        assert_eq!(repo.mark_all_read(&alice).expect("mark all"), 0);
    }

    #[tokio::test]
    async fn mark_all_read_with_nothing_addressed_is_zero() {
        let (_container, pool) = setup_db().await;
        let repo = DieselNotificationRepository::new(pool);
        let admin = Principal::new(Uuid::new_v4(), Role::Admin);
        assert_eq!(repo.mark_all_read(&admin).expect("mark all"), 0);
    }
}
