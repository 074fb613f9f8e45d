use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::notification::{ChatMessage, Notification, NotificationDraft, NotificationView};
use crate::errors::AppError;
use crate::handlers::auth::{AdminUser, AuthenticatedUser};
use crate::SharedBroadcastService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationRequest {
    pub message: String,
    /// Optional reference to what the notification is about, e.g. an order id.
    #[serde(default)]
    pub related_entity: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    /// `all_users`, `all_admins` or `user`
    pub scope: String,
    pub target_user_id: Option<Uuid>,
    pub message: String,
    pub related_entity: Option<String>,
    pub created_at: String,
    pub is_read: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadResponse {
    /// `false` when the notification does not exist or is not addressed to the caller.
    pub updated: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadAllResponse {
    /// Notifications newly marked as read.
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// Omit to write to support; the message then reaches every connected admin.
    #[serde(default)]
    pub receiver_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryResponse {
    /// Connections the push was queued on.
    pub delivered: usize,
}

impl From<NotificationView> for NotificationResponse {
    fn from(n: NotificationView) -> Self {
        Self {
            id: n.id,
            scope: n.scope.as_str().to_string(),
            target_user_id: n.scope.target_user_id(),
            message: n.message,
            related_entity: n.related_entity,
            created_at: n.created_at.to_rfc3339(),
            is_read: n.is_read,
        }
    }
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        NotificationView::new(n, false).into()
    }
}

impl NotificationRequest {
    fn into_draft(self, user_id: Option<Uuid>) -> NotificationDraft {
        NotificationDraft {
            message: self.message,
            related_entity: self.related_entity,
            user_id,
        }
    }
}

// ── Recipient handlers ───────────────────────────────────────────────────────

/// GET /notifications
///
/// Everything addressed to the caller, newest first, with the caller's read flag.
#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Notifications for the caller", body = Vec<NotificationResponse>),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    svc: web::Data<SharedBroadcastService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let principal = user.0;

    let items = web::block(move || svc.get_notifications(&principal)).await??;

    let body: Vec<NotificationResponse> = items.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// PUT /notifications/{id}/read
#[utoipa::path(
    put,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification UUID")),
    responses(
        (status = 200, description = "Read state recorded", body = ReadResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn read_notification(
    svc: web::Data<SharedBroadcastService>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let principal = user.0;

    let updated = web::block(move || svc.read_noti(id, &principal)).await??;

    Ok(HttpResponse::Ok().json(ReadResponse { updated }))
}

/// PUT /notifications/read-all
#[utoipa::path(
    put,
    path = "/notifications/read-all",
    responses(
        (status = 200, description = "Notifications newly marked as read", body = ReadAllResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn read_all_notifications(
    svc: web::Data<SharedBroadcastService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let principal = user.0;

    let count = web::block(move || svc.read_all_noti(&principal)).await??;

    Ok(HttpResponse::Ok().json(ReadAllResponse { count }))
}

// ── Sender handlers ──────────────────────────────────────────────────────────

/// POST /notifications/all
#[utoipa::path(
    post,
    path = "/notifications/all",
    request_body = NotificationRequest,
    responses(
        (status = 201, description = "Stored and pushed to every connected user", body = NotificationResponse),
        (status = 400, description = "Invalid message"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn notify_all_users(
    svc: web::Data<SharedBroadcastService>,
    _admin: AdminUser,
    body: web::Json<NotificationRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner().into_draft(None);

    let stored = web::block(move || svc.send_notify_all(draft)).await??;

    Ok(HttpResponse::Created().json(NotificationResponse::from(stored)))
}

/// POST /notifications/admins
#[utoipa::path(
    post,
    path = "/notifications/admins",
    request_body = NotificationRequest,
    responses(
        (status = 201, description = "Stored and pushed to every connected admin", body = NotificationResponse),
        (status = 400, description = "Invalid message"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn notify_all_admins(
    svc: web::Data<SharedBroadcastService>,
    _admin: AdminUser,
    body: web::Json<NotificationRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner().into_draft(None);

    let stored = web::block(move || svc.send_notify_all_admin(draft)).await??;

    Ok(HttpResponse::Created().json(NotificationResponse::from(stored)))
}

/// POST /notifications/users/{user_id}
///
/// Stored for the user and pushed if they are connected; otherwise picked up
/// on their next fetch.
#[utoipa::path(
    post,
    path = "/notifications/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "Recipient user UUID")),
    request_body = NotificationRequest,
    responses(
        (status = 201, description = "Stored for the user", body = NotificationResponse),
        (status = 400, description = "Invalid message"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
pub async fn notify_user(
    svc: web::Data<SharedBroadcastService>,
    _admin: AdminUser,
    path: web::Path<Uuid>,
    body: web::Json<NotificationRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner().into_draft(Some(path.into_inner()));

    let stored = web::block(move || svc.send_notify_user_id(draft)).await??;

    Ok(HttpResponse::Created().json(NotificationResponse::from(stored)))
}

// ── Chat ─────────────────────────────────────────────────────────────────────

/// POST /chat
///
/// Pushes a chat message over the hub without storing it.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Push queued", body = DeliveryResponse),
        (status = 400, description = "Invalid content"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn send_chat(
    svc: web::Data<SharedBroadcastService>,
    user: AuthenticatedUser,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let chat = ChatMessage {
        sender_id: user.0.user_id,
        receiver_id: body.receiver_id,
        content: body.content,
        sent_at: Utc::now(),
    };

    let delivered = svc.broadcast_notify_user(chat)?;

    Ok(HttpResponse::Ok().json(DeliveryResponse { delivered }))
}

/// POST /chat/signal/{user_id}
///
/// Tells one user that a new message is waiting.
#[utoipa::path(
    post,
    path = "/chat/signal/{user_id}",
    params(("user_id" = Uuid, Path, description = "User to signal")),
    responses(
        (status = 200, description = "Push queued", body = DeliveryResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn signal_user(
    svc: web::Data<SharedBroadcastService>,
    _user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let delivered = svc.broadcast_message_user(path.into_inner());

    Ok(HttpResponse::Ok().json(DeliveryResponse { delivered }))
}
