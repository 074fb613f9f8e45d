use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use actix_web::web::Bytes;
use actix_web::{web, HttpResponse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};

use crate::domain::notification::{ConnectionId, HubEvent};
use crate::domain::ports::NotificationPublisher;
use crate::handlers::auth::AuthenticatedUser;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Render one event as a Server-Sent Events frame.
pub fn encode_frame(event: &HubEvent) -> Result<Bytes, serde_json::Error> {
    let data = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("event: {}\ndata: {}\n\n", event.name(), data)))
}

/// The SSE body of one hub connection. Dropping it unregisters the
/// connection.
struct HubStream {
    id: ConnectionId,
    events: mpsc::Receiver<HubEvent>,
    hub: Arc<dyn NotificationPublisher>,
    keep_alive: Interval,
    greeted: bool,
}

impl Stream for HubStream {
    type Item = Result<Bytes, serde_json::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if !this.greeted {
            this.greeted = true;
            return Poll::Ready(Some(Ok(Bytes::from_static(b": connected\n\n"))));
        }

        match this.events.poll_recv(cx) {
            Poll::Ready(Some(event)) => return Poll::Ready(Some(encode_frame(&event))),
            Poll::Ready(None) => return Poll::Ready(None),
            Poll::Pending => {}
        }

        match this.keep_alive.poll_tick(cx) {
            Poll::Ready(_) => Poll::Ready(Some(Ok(Bytes::from_static(b": keep-alive\n\n")))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for HubStream {
    fn drop(&mut self) {
        self.hub.disconnect(self.id);
    }
}

/// GET /hub
///
/// Opens the caller's push channel as a `text/event-stream`. Events are
/// named `notification`, `chat` or `message`; the data line carries the
/// JSON-encoded event.
#[utoipa::path(
    get,
    path = "/hub",
    params(("access_token" = Option<String>, Query, description = "Bearer token for clients that cannot send headers")),
    responses(
        (status = 200, description = "text/event-stream of hub events"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "hub"
)]
pub async fn connect(
    hub: web::Data<dyn NotificationPublisher>,
    user: AuthenticatedUser,
) -> HttpResponse {
    let hub = hub.into_inner();
    let subscription = hub.connect(user.0);

    let stream = HubStream {
        id: subscription.id,
        events: subscription.events,
        hub,
        keep_alive: interval_at(Instant::now() + KEEP_ALIVE, KEEP_ALIVE),
        greeted: false,
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}
