use crate::error::UNSUPPORTED_VERSION;
use crate::VncError;
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Length of a `ProtocolVersion` message in either direction
pub const VERSION_MSG_LEN: usize = 12;

/// The version a server announces, as written on the wire
///
/// No range check is done beyond what three ASCII digits can hold, so vendor
/// versions such as `003.889` parse fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolVersion {
    pub major: u16,
    pub minor: u16,
}

impl ProtocolVersion {
    /// Parse a `"RFB ddd.ddd\n"` message
    pub fn parse(msg: &[u8]) -> Result<Self, VncError> {
        let msg: &[u8; VERSION_MSG_LEN] = msg
            .try_into()
            .map_err(|_| VncError::handshake(UNSUPPORTED_VERSION))?;
        if &msg[0..4] != b"RFB " || msg[7] != b'.' || msg[11] != b'\n' {
            return Err(VncError::handshake(UNSUPPORTED_VERSION));
        }

        Ok(Self {
            major: parse_digits(&msg[4..7])?,
            minor: parse_digits(&msg[8..11])?,
        })
    }
}

fn parse_digits(field: &[u8]) -> Result<u16, VncError> {
    field.iter().try_fold(0u16, |acc, &c| {
        if c.is_ascii_digit() {
            Ok(acc * 10 + u16::from(c - b'0'))
        } else {
            Err(VncError::handshake(UNSUPPORTED_VERSION))
        }
    })
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// All supported vnc versions
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord)]
#[repr(u8)]
pub enum VncVersion {
    RFB33,
    RFB37,
    RFB38,
}

impl TryFrom<ProtocolVersion> for VncVersion {
    type Error = VncError;

    fn try_from(version: ProtocolVersion) -> Result<Self, Self::Error> {
        match (version.major, version.minor) {
            (major, minor) if major < 3 || (major == 3 && minor < 3) => Err(
                VncError::handshake(format!("{UNSUPPORTED_VERSION} {version}")),
            ),
            // 3.4 to 3.6 do not implement the 3.7 security handshake
            (3, minor) if minor < 7 => Ok(VncVersion::RFB33),
            (3, 7) => Ok(VncVersion::RFB37),
            _ => Ok(VncVersion::RFB38),
        }
    }
}

impl From<VncVersion> for &[u8; VERSION_MSG_LEN] {
    fn from(version: VncVersion) -> Self {
        match version {
            VncVersion::RFB33 => b"RFB 003.003\n",
            VncVersion::RFB37 => b"RFB 003.007\n",
            VncVersion::RFB38 => b"RFB 003.008\n",
        }
    }
}

impl VncVersion {
    pub(crate) async fn read<S>(reader: &mut S) -> Result<ProtocolVersion, VncError>
    where
        S: AsyncRead + Unpin,
    {
        let mut buffer = [0_u8; VERSION_MSG_LEN];
        reader.read_exact(&mut buffer).await?;
        ProtocolVersion::parse(&buffer)
    }

    pub(crate) async fn write<S>(self, writer: &mut S) -> Result<(), VncError>
    where
        S: AsyncWrite + Unpin,
    {
        writer
            .write_all(&<VncVersion as Into<&[u8; VERSION_MSG_LEN]>>::into(self)[..])
            .await?;
        writer.flush().await?;
        Ok(())
    }

    /// Read the server version and answer with the version we commit to
    ///
    /// The answer is the server version clamped to 3.3/3.7/3.8, capped at
    /// `max`. Nothing is written when the server version is unsupported.
    pub async fn negotiate<S>(stream: &mut S, max: VncVersion) -> Result<Self, VncError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let server = Self::read(stream).await?;
        trace!("Our version {:?}, server version {}", max, server);

        let version = VncVersion::try_from(server)?.min(max);
        trace!("Negotiated rfb version: {:?}", version);

        version.write(stream).await?;
        Ok(version)
    }
}
