pub mod des;
pub mod types;

pub use types::{SecurityResult, SecurityType, SecurityTypes};
