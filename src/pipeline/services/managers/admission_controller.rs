use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::trace;
use uuid::Uuid;

/// Per-client admission state.
#[derive(Debug, Default)]
struct ClientSlot {
    last_admitted: Option<Instant>,
}

/// Per-client minimum-interval gate.
///
/// A client is admitted when it has never been admitted before or when at
/// least `min_interval` has elapsed since its last admission. Rejections do
/// not touch the stored timestamp.
///
/// Each client owns its own slot behind a mutex, so checks for one client
/// serialize while different clients only share a read lock on the directory.
#[derive(Debug)]
pub struct AdmissionController {
    min_interval: Duration,
    clients: RwLock<HashMap<Uuid, Arc<Mutex<ClientSlot>>>>,
}

impl AdmissionController {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn admit(&self, client_id: Uuid, now: Instant) -> bool {
        let slot = self.slot(client_id);
        let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
        let admitted = match slot.last_admitted {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        };
        if admitted {
            slot.last_admitted = Some(now);
        }
        trace!("Admission for {:?}: {}", client_id, admitted);
        admitted
    }

    /// Last admission instant, `None` when the client was never admitted.
    pub fn last_admitted(&self, client_id: &Uuid) -> Option<Instant> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.get(client_id).and_then(|slot| {
            slot.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .last_admitted
        })
    }

    /// Drop a client's state (when the client disconnects).
    pub fn forget(&self, client_id: &Uuid) {
        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(client_id);
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn slot(&self, client_id: Uuid) -> Arc<Mutex<ClientSlot>> {
        if let Some(slot) = self
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&client_id)
        {
            return Arc::clone(slot);
        }
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(clients.entry(client_id).or_default())
    }
}
