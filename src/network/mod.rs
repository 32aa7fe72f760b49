pub mod handlers;
pub mod message;
pub mod server;

pub use message::{InboundMessage, OutboundMessage};
pub use server::{AppState, Server};
