use crate::error::AppError;
use crate::intake::client::supervisor::{ClientSupervisor, ClientSupervisorCommand, SessionEntry};
use chrono::Utc;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

const COMMAND_BUFFER: usize = 100;

fn supervisor_gone<E>(_: E) -> AppError {
    AppError::Client("client supervisor is not running".to_string())
}

/// Cheap handle to the session supervisor task.
#[derive(Clone)]
pub struct ClientManagerHandle {
    command_tx: mpsc::Sender<ClientSupervisorCommand>,
}

impl ClientManagerHandle {
    /// Registers a new connection and returns its id together with the token
    /// that cancels the session's in-flight work.
    pub async fn connect(&self) -> Result<(Uuid, CancellationToken), AppError> {
        let cancel = CancellationToken::new();
        let entry = SessionEntry {
            id: Uuid::new_v4(),
            connected_at: Utc::now(),
            cancel: cancel.clone(),
        };

        let (responder, response_rx) = oneshot::channel();
        self.command_tx
            .send(ClientSupervisorCommand::Register { entry, responder })
            .await
            .map_err(supervisor_gone)?;
        let client_id = response_rx.await.map_err(supervisor_gone)?;
        debug!("Session {:?} registered", client_id);
        Ok((client_id, cancel))
    }

    pub async fn disconnect(&self, client_id: Uuid) -> Result<bool, AppError> {
        let (responder, response_rx) = oneshot::channel();
        self.command_tx
            .send(ClientSupervisorCommand::Unregister {
                id: client_id,
                responder,
            })
            .await
            .map_err(supervisor_gone)?;
        response_rx.await.map_err(supervisor_gone)
    }

    pub async fn list_clients(&self) -> Result<Vec<Uuid>, AppError> {
        let (responder, response_rx) = oneshot::channel();
        self.command_tx
            .send(ClientSupervisorCommand::ListClients { responder })
            .await
            .map_err(supervisor_gone)?;
        response_rx.await.map_err(supervisor_gone)
    }

    pub async fn disconnect_all(&self) -> Result<usize, AppError> {
        let (responder, response_rx) = oneshot::channel();
        self.command_tx
            .send(ClientSupervisorCommand::DisconnectAll { responder })
            .await
            .map_err(supervisor_gone)?;
        response_rx.await.map_err(supervisor_gone)
    }
}

pub struct ClientManager {
    client_handler: JoinHandle<()>,
}

impl ClientManager {
    pub fn new() -> (Self, ClientManagerHandle) {
        let (command_tx, mut command_rx) = mpsc::channel::<ClientSupervisorCommand>(COMMAND_BUFFER);
        let client_handler = tokio::spawn(async move {
            let mut supervisor = ClientSupervisor::new();
            while let Some(command) = command_rx.recv().await {
                supervisor.handle_command(command);
            }
            debug!("All client handles dropped, supervisor stopping");
        });
        (Self { client_handler }, ClientManagerHandle { command_tx })
    }

    pub fn stop(&self) {
        debug!("Stopping client supervisor");
        self.client_handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_tracked_until_disconnect() {
        let (_manager, handle) = ClientManager::new();
        let (first, _) = handle.connect().await.unwrap();
        let (second, _) = handle.connect().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(handle.list_clients().await.unwrap().len(), 2);

        assert!(handle.disconnect(first).await.unwrap());
        assert_eq!(handle.list_clients().await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn disconnect_all_cancels_every_session() {
        let (_manager, handle) = ClientManager::new();
        let (_, cancel) = handle.connect().await.unwrap();
        assert_eq!(handle.disconnect_all().await.unwrap(), 1);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn stopped_supervisor_surfaces_an_error() {
        let (manager, handle) = ClientManager::new();
        manager.stop();
        tokio::task::yield_now().await;
        assert!(matches!(handle.list_clients().await, Err(AppError::Client(_))));
    }
}
