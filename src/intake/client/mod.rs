pub mod manager;
pub mod session;
pub mod supervisor;

pub use manager::{ClientManager, ClientManagerHandle};
pub use session::ClientSession;
pub use supervisor::ClientSupervisor;
