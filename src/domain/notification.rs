use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

pub const MAX_MESSAGE_LEN: usize = 1000;
pub const MAX_RELATED_ENTITY_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::InvalidInput(format!("unknown role '{other}'"))),
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum NotificationScope {
    AllUsers,
    AllAdmins,
    User(Uuid),
}

impl NotificationScope {
    /// The broadcast scope whose members share `role`.
    pub fn group_of(role: Role) -> Self {
        match role {
            Role::User => NotificationScope::AllUsers,
            Role::Admin => NotificationScope::AllAdmins,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationScope::AllUsers => "all_users",
            NotificationScope::AllAdmins => "all_admins",
            NotificationScope::User(_) => "user",
        }
    }

    pub fn target_user_id(&self) -> Option<Uuid> {
        match self {
            NotificationScope::User(id) => Some(*id),
            _ => None,
        }
    }

    /// Rebuild a scope from its stored columns.
    pub fn from_parts(scope: &str, target_user_id: Option<Uuid>) -> Result<Self, DomainError> {
        match (scope, target_user_id) {
            ("all_users", None) => Ok(NotificationScope::AllUsers),
            ("all_admins", None) => Ok(NotificationScope::AllAdmins),
            ("user", Some(id)) => Ok(NotificationScope::User(id)),
            (scope, target) => Err(DomainError::Internal(format!(
                "inconsistent notification scope '{scope}' with target {target:?}"
            ))),
        }
    }

    pub fn includes(&self, principal: &Principal) -> bool {
        match self {
            NotificationScope::User(id) => *id == principal.user_id,
            group => *group == NotificationScope::group_of(principal.role),
        }
    }
}

/// What a sender supplies. `user_id` is only consulted for user-scoped sends.
#[derive(Debug, Clone, Default)]
pub struct NotificationDraft {
    pub message: String,
    pub related_entity: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub id: Uuid,
    pub scope: NotificationScope,
    pub message: String,
    pub related_entity: Option<String>,
}

impl NewNotification {
    pub fn from_draft(draft: NotificationDraft, scope: NotificationScope) -> Result<Self, DomainError> {
        let message = draft.message.trim().to_string();
        if message.is_empty() {
            return Err(DomainError::InvalidInput(
                "notification message must not be empty".to_string(),
            ));
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(DomainError::InvalidInput(format!(
                "notification message must be at most {MAX_MESSAGE_LEN} characters"
            )));
        }
        let related_entity = draft.related_entity.filter(|r| !r.trim().is_empty());
        if related_entity
            .as_ref()
            .is_some_and(|r| r.chars().count() > MAX_RELATED_ENTITY_LEN)
        {
            return Err(DomainError::InvalidInput(format!(
                "related entity must be at most {MAX_RELATED_ENTITY_LEN} characters"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            scope,
            message,
            related_entity,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub scope: NotificationScope,
    pub message: String,
    pub related_entity: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A notification as one recipient sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub scope: NotificationScope,
    pub message: String,
    pub related_entity: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl NotificationView {
    pub fn new(notification: Notification, is_read: bool) -> Self {
        Self {
            id: notification.id,
            scope: notification.scope,
            message: notification.message,
            related_entity: notification.related_entity,
            created_at: notification.created_at,
            is_read,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_id: Uuid,
    /// `None` when a customer writes to support; the message then goes to
    /// every connected admin.
    pub receiver_id: Option<Uuid>,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Payload of one push over the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HubEvent {
    Notification(NotificationView),
    Chat(ChatMessage),
    Message { user_id: Uuid },
}

impl HubEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HubEvent::Notification(_) => "notification",
            HubEvent::Chat(_) => "chat",
            HubEvent::Message { .. } => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
