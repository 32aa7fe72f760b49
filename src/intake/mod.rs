pub mod client;
pub mod payload;
