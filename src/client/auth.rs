use crate::protocol::security::{des, SecurityType};
use crate::VncError;
use std::fmt;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// An authentication mechanism the client is willing to run
///
/// The set is closed: every variant knows its security type and how to run
/// its part of the security handshake.
#[derive(Debug, Clone)]
pub enum ClientAuth {
    None,
    VncAuth(VncAuth),
}

impl ClientAuth {
    pub fn security_type(&self) -> SecurityType {
        match self {
            ClientAuth::None => SecurityType::None,
            ClientAuth::VncAuth(_) => SecurityType::VncAuth,
        }
    }

    /// Run the mechanism specific exchange
    ///
    /// Whether the server accepted it is only known once the security
    /// result has been read.
    pub async fn handshake<S>(&self, stream: &mut S) -> Result<(), VncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self {
            ClientAuth::None => Ok(()),
            ClientAuth::VncAuth(auth) => auth.handshake(stream).await,
        }
    }
}

impl From<VncAuth> for ClientAuth {
    fn from(auth: VncAuth) -> Self {
        ClientAuth::VncAuth(auth)
    }
}

/// Password for VNC authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Read the password from a file, dropping one trailing line ending
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VncError> {
        let path = path.as_ref();
        let mut password = std::fs::read_to_string(path).map_err(|e| {
            VncError::Handshake(format!("failed to read password from {}: {e}", path.display()))
        })?;
        if password.ends_with('\n') {
            password.pop();
            if password.ends_with('\r') {
                password.pop();
            }
        }
        Ok(Self(password))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}

/// VNC authentication, a DES challenge-response over the password
#[derive(Debug, Clone)]
pub struct VncAuth {
    password: Password,
}

impl VncAuth {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: Password::new(password),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VncError> {
        Ok(Self {
            password: Password::from_file(path)?,
        })
    }

    /// The answer to `challenge` for this password
    pub fn response(&self, challenge: &[u8; des::CHALLENGE_LEN]) -> [u8; des::CHALLENGE_LEN] {
        des::encrypt(challenge, &des::key_from_password(self.password.as_bytes()))
    }

    async fn handshake<S>(&self, stream: &mut S) -> Result<(), VncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut challenge = [0; des::CHALLENGE_LEN];
        stream.read_exact(&mut challenge).await?;
        debug!("Received vnc auth challenge");

        stream.write_all(&self.response(&challenge)).await?;
        stream.flush().await?;
        Ok(())
    }
}
