//! # VNC-Handshake
//!
//! ## Description
//! + An async implementation of the client side of the VNC (RFB) handshake
//! + Negotiates the protocol version (3.3, 3.7 or 3.8), the security type
//!   and runs the authentication, then hands the stream back
//!
//! ## Simple example
//!
//! ```no_run
//! use tokio::net::TcpStream;
//! use vnc_handshake::{ClientAuth, VncAuth, VncConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to VNC server
//!     let tcp = TcpStream::connect("127.0.0.1:5900").await?;
//!
//!     // Run the handshake, allowing password or no authentication
//!     let vnc = VncConnector::new(tcp)
//!         .add_auth(VncAuth::new("password").into())
//!         .add_auth(ClientAuth::None)
//!         .build()?
//!         .try_start()
//!         .await?
//!         .finish()?;
//!
//!     println!(
//!         "Negotiated {:?} with {:?}",
//!         vnc.version(),
//!         vnc.security_type()
//!     );
//!
//!     // The stream now continues with ClientInit
//!     let _tcp = vnc.into_inner();
//!     Ok(())
//! }
//! ```
//!
//! ## License
//!
//! Licensed under either of
//!
//!  * Apache License, Version 2.0
//!    ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//!  * MIT license
//!    ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.
//!
//! ## Contribution
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{ClientAuth, Password, VncAuth, VncClient, VncConnector, VncState};
pub use error::VncError;
pub use protocol::{ProtocolVersion, SecurityResult, SecurityType, VncVersion};
