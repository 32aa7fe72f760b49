use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Bookkeeping for one connected session.
pub struct SessionEntry {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
    pub cancel: CancellationToken,
}

pub enum ClientSupervisorCommand {
    Register {
        entry: SessionEntry,
        responder: oneshot::Sender<Uuid>,
    },
    Unregister {
        id: Uuid,
        responder: oneshot::Sender<bool>,
    },
    ListClients {
        responder: oneshot::Sender<Vec<Uuid>>,
    },
    /// Cancels every session; used on shutdown.
    DisconnectAll {
        responder: oneshot::Sender<usize>,
    },
}

#[derive(Default)]
pub struct ClientSupervisor {
    clients: Vec<SessionEntry>,
}

impl ClientSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_clients(&self) -> Vec<Uuid> {
        self.clients.iter().map(|entry| entry.id).collect()
    }

    pub fn handle_command(&mut self, command: ClientSupervisorCommand) {
        match command {
            ClientSupervisorCommand::Register { entry, responder } => {
                let id = entry.id;
                info!("Client {} connected", id);
                self.clients.push(entry);
                let _ = responder.send(id);
            }
            ClientSupervisorCommand::Unregister { id, responder } => {
                let before = self.clients.len();
                self.clients.retain(|entry| {
                    if entry.id == id {
                        let seconds = (Utc::now() - entry.connected_at).num_seconds();
                        info!("Client {} disconnected after {}s", id, seconds);
                        false
                    } else {
                        true
                    }
                });
                let _ = responder.send(self.clients.len() < before);
            }
            ClientSupervisorCommand::ListClients { responder } => {
                let _ = responder.send(self.list_clients());
            }
            ClientSupervisorCommand::DisconnectAll { responder } => {
                for entry in &self.clients {
                    debug!("Cancelling session {}", entry.id);
                    entry.cancel.cancel();
                }
                let _ = responder.send(self.clients.len());
            }
        }
    }
}
