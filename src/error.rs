use thiserror::Error;

pub(crate) const UNSUPPORTED_VERSION: &str = "unsupported protocol version";
pub(crate) const UNSUPPORTED_SECURITY_TYPE: &str = "unsupported security type";
pub(crate) const AUTHENTICATION_FAILED: &str = "authentication failed";

#[derive(Debug, Error)]
pub enum VncError {
    /// Any failure of the handshake itself.
    ///
    /// Protocol violations and rejections by the server are not told apart
    /// at the type level, only by the message.
    #[error("{0}")]
    Handshake(String),
    #[error("Connect error before the handshake finished")]
    ConnectError,
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl VncError {
    pub(crate) fn handshake(msg: impl Into<String>) -> Self {
        VncError::Handshake(msg.into())
    }
}
