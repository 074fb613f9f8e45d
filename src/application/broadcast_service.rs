use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::notification::{
    ChatMessage, HubEvent, NewNotification, Notification, NotificationDraft, NotificationScope,
    NotificationView, Principal, Role, MAX_MESSAGE_LEN,
};
use crate::domain::order::Order;
use crate::domain::ports::{NotificationPublisher, NotificationRepository, OrderNotifier};

/// Persists notifications and fans them out over the hub.
///
/// Pushes are best-effort: a recipient that is offline, or whose buffer is
/// full, picks the notification up on its next [`get_notifications`] call.
///
/// [`get_notifications`]: BroadcastService::get_notifications
pub struct BroadcastService<R, P> {
    repo: R,
    hub: P,
}

impl<R: NotificationRepository, P: NotificationPublisher> BroadcastService<R, P> {
    pub fn new(repo: R, hub: P) -> Self {
        Self { repo, hub }
    }

    pub fn send_notify_all(&self, draft: NotificationDraft) -> Result<Notification, DomainError> {
        self.persist_and_push(draft, NotificationScope::AllUsers)
    }

    pub fn send_notify_all_admin(
        &self,
        draft: NotificationDraft,
    ) -> Result<Notification, DomainError> {
        self.persist_and_push(draft, NotificationScope::AllAdmins)
    }

    pub fn send_notify_user_id(
        &self,
        draft: NotificationDraft,
    ) -> Result<Notification, DomainError> {
        let user_id = draft.user_id.ok_or_else(|| {
            DomainError::InvalidInput("a user notification needs a target user id".to_string())
        })?;
        self.persist_and_push(draft, NotificationScope::User(user_id))
    }

    /// Pushes a chat message without storing a notification.
    pub fn broadcast_notify_user(&self, chat: ChatMessage) -> Result<usize, DomainError> {
        let content = chat.content.trim();
        if content.is_empty() || content.chars().count() > MAX_MESSAGE_LEN {
            return Err(DomainError::InvalidInput(format!(
                "chat content must be 1 to {MAX_MESSAGE_LEN} characters"
            )));
        }

        let receiver = chat.receiver_id;
        let event = HubEvent::Chat(chat);
        let delivered = match receiver {
            Some(user_id) => self.hub.send_to_user(user_id, &event),
            None => self.hub.send_to_group(Role::Admin, &event),
        };
        log::debug!("Chat event pushed to {} connection(s)", delivered);
        Ok(delivered)
    }

    /// Signals one user that a new message is waiting.
    pub fn broadcast_message_user(&self, user_id: Uuid) -> usize {
        self.hub
            .send_to_user(user_id, &HubEvent::Message { user_id })
    }

    /// Marks one notification read for `principal`. Returns `false` when it
    /// does not exist or is not addressed to the caller.
    pub fn read_noti(&self, id: Uuid, principal: &Principal) -> Result<bool, DomainError> {
        if self.repo.find_visible(id, principal)?.is_none() {
            log::debug!(
                "Notification {} not found for user {}",
                id,
                principal.user_id
            );
            return Ok(false);
        }
        self.repo.mark_read(id, principal.user_id)?;
        Ok(true)
    }

    /// Marks everything addressed to `principal` as read. Idempotent; the
    /// return value counts only newly marked notifications.
    pub fn read_all_noti(&self, principal: &Principal) -> Result<usize, DomainError> {
        self.repo.mark_all_read(principal)
    }

    pub fn get_notifications(
        &self,
        principal: &Principal,
    ) -> Result<Vec<NotificationView>, DomainError> {
        self.repo.list_for(principal)
    }

    fn persist_and_push(
        &self,
        draft: NotificationDraft,
        scope: NotificationScope,
    ) -> Result<Notification, DomainError> {
        let new = NewNotification::from_draft(draft, scope)?;
        let stored = self.repo.insert(&new)?;

        let event = HubEvent::Notification(NotificationView::new(stored.clone(), false));
        let delivered = match stored.scope {
            NotificationScope::AllUsers => self.hub.send_to_group(Role::User, &event),
            NotificationScope::AllAdmins => self.hub.send_to_group(Role::Admin, &event),
            NotificationScope::User(user_id) => self.hub.send_to_user(user_id, &event),
        };
        log::debug!(
            "Notification {} ({}) pushed to {} connection(s)",
            stored.id,
            stored.scope.as_str(),
            delivered
        );
        Ok(stored)
    }
}

impl<R: NotificationRepository, P: NotificationPublisher> OrderNotifier for BroadcastService<R, P> {
    fn notify_order_owner(&self, order: &Order, message: String) -> Result<(), DomainError> {
        self.send_notify_user_id(NotificationDraft {
            message,
            related_entity: Some(order.id.clone()),
            user_id: Some(order.user_id),
        })
        .map(|_| ())
    }
}
