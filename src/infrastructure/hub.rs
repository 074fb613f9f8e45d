use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::domain::notification::{ConnectionId, HubEvent, Principal, Role};
use crate::domain::ports::{NotificationPublisher, Subscription};

struct Connection {
    principal: Principal,
    sender: mpsc::Sender<HubEvent>,
}

/// In-process registry of live push connections.
///
/// Each connection owns a bounded channel; sends never block. A full buffer
/// drops the event for that connection only, a closed one is pruned.
pub struct InMemoryHub {
    capacity: usize,
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl InMemoryHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, Connection>> {
        self.connections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, Connection>> {
        self.connections.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, event: &HubEvent, matches: impl Fn(&Principal) -> bool) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, conn) in self.read().iter().filter(|(_, c)| matches(&c.principal)) {
            match conn.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    log::warn!(
                        "Dropping {} event for {}: buffer full",
                        event.name(),
                        id
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        if !closed.is_empty() {
            let mut connections = self.write();
            for id in closed {
                connections.remove(&id);
                log::info!("Pruned closed hub connection {}", id);
            }
        }
        delivered
    }
}

impl NotificationPublisher for InMemoryHub {
    fn connect(&self, principal: Principal) -> Subscription {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, events) = mpsc::channel(self.capacity);
        self.write().insert(id, Connection { principal, sender });
        log::info!(
            "Hub connection {} opened for {} {}",
            id,
            principal.role,
            principal.user_id
        );
        Subscription { id, events }
    }

    fn disconnect(&self, id: ConnectionId) {
        if self.write().remove(&id).is_some() {
            log::info!("Hub connection {} closed", id);
        }
    }

    fn send_to_group(&self, role: Role, event: &HubEvent) -> usize {
        self.deliver(event, |p| p.role == role)
    }

    fn send_to_user(&self, user_id: Uuid, event: &HubEvent) -> usize {
        self.deliver(event, |p| p.user_id == user_id)
    }

    fn is_connected(&self, user_id: Uuid) -> bool {
        self.read()
            .values()
            .any(|c| c.principal.user_id == user_id && !c.sender.is_closed())
    }
}
