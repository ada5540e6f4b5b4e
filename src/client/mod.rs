pub mod auth;
pub mod builder;
pub mod connection;
pub mod security;

pub use auth::{ClientAuth, Password, VncAuth};
pub use builder::{VncConnector, VncState};
pub use connection::VncClient;
