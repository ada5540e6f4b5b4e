pub mod security;
pub mod version;

pub use security::{SecurityResult, SecurityType, SecurityTypes};
pub use version::{ProtocolVersion, VncVersion};
