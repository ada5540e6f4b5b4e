use crate::error::AUTHENTICATION_FAILED;
use crate::{VncError, VncVersion};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Security types this client knows how to run
///
/// Every other identifier a server may offer is treated as unusable,
/// including ones a future server might define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SecurityType {
    Invalid = 0,
    None = 1,
    VncAuth = 2,
}

impl TryFrom<u32> for SecurityType {
    type Error = u32;
    fn try_from(num: u32) -> Result<Self, Self::Error> {
        match num {
            0 => Ok(SecurityType::Invalid),
            1 => Ok(SecurityType::None),
            2 => Ok(SecurityType::VncAuth),
            unknown => Err(unknown),
        }
    }
}

impl From<SecurityType> for u8 {
    fn from(e: SecurityType) -> Self {
        e as u8
    }
}

/// What the server sent during the security-type stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityTypes {
    /// RFB 3.3: the server picked the type, the client does not answer
    Dictated(u32),
    /// RFB 3.7+: the types the server offers, in its order
    Offered(Vec<u8>),
}

impl SecurityTypes {
    pub async fn read<S>(reader: &mut S, version: VncVersion) -> Result<Self, VncError>
    where
        S: AsyncRead + Unpin,
    {
        match version {
            VncVersion::RFB33 => {
                let security_type = reader.read_u32().await?;
                if security_type == u32::from(u8::from(SecurityType::Invalid)) {
                    return Err(read_failure(reader, version).await?);
                }
                trace!("Server dictated security type: {}", security_type);
                Ok(SecurityTypes::Dictated(security_type))
            }
            _ => {
                // +--------------------------+-------------+--------------------------+
                // | No. of bytes             | Type        | Description              |
                // |                          | [Value]     |                          |
                // +--------------------------+-------------+--------------------------+
                // | 1                        | U8          | number-of-security-types |
                // | number-of-security-types | U8 array    | security-types           |
                // +--------------------------+-------------+--------------------------+
                let num = reader.read_u8().await?;
                if num == 0 {
                    return Err(read_failure(reader, version).await?);
                }
                let mut sec_types = vec![0; num as usize];
                reader.read_exact(&mut sec_types).await?;
                trace!("Server supported security type: {:?}", sec_types);
                Ok(SecurityTypes::Offered(sec_types))
            }
        }
    }
}

impl SecurityType {
    /// Send the chosen type back, RFB 3.7+ only
    pub async fn write<S>(&self, writer: &mut S) -> Result<(), VncError>
    where
        S: AsyncWrite + Unpin,
    {
        writer.write_all(&[(*self).into()]).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Read a u32 length followed by that many bytes of UTF-8
///
/// The buffer grows with what actually arrives, the length is not trusted
/// for allocation.
pub(crate) async fn read_reason<S>(reader: &mut S) -> Result<String, VncError>
where
    S: AsyncRead + Unpin,
{
    let len = reader.read_u32().await?;
    let mut buf = Vec::new();
    (&mut *reader).take(u64::from(len)).read_to_end(&mut buf).await?;
    if buf.len() != len as usize {
        return Err(std::io::Error::from(ErrorKind::UnexpectedEof).into());
    }
    String::from_utf8(buf).map_err(|_| VncError::handshake("malformed reason string"))
}

/// Build the error for a server that refused the connection during the
/// security-type stage.
///
/// Servers older than 3.8 may just close the socket instead of sending a
/// reason, which is reported with a generic message.
async fn read_failure<S>(reader: &mut S, version: VncVersion) -> Result<VncError, VncError>
where
    S: AsyncRead + Unpin,
{
    const GENERIC: &str = "connection failed";
    match read_reason(reader).await {
        Ok(reason) if reason.is_empty() => Ok(VncError::handshake(GENERIC)),
        Ok(reason) => Ok(VncError::Handshake(reason)),
        Err(VncError::IoError(e))
            if e.kind() == ErrorKind::UnexpectedEof && version < VncVersion::RFB38 =>
        {
            Ok(VncError::handshake(GENERIC))
        }
        Err(e) => Err(e),
    }
}

/// The verdict sent by the server once authentication is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityResult {
    Ok,
    /// `reason` is only ever present on RFB 3.8 and later
    Failed { reason: Option<String> },
}

impl SecurityResult {
    pub async fn read<S>(reader: &mut S, version: VncVersion) -> Result<Self, VncError>
    where
        S: AsyncRead + Unpin,
    {
        let code = reader.read_u32().await?;
        if code == 0 {
            return Ok(SecurityResult::Ok);
        }
        trace!("Security result code: {}", code);
        let reason = if version >= VncVersion::RFB38 {
            Some(read_reason(reader).await?)
        } else {
            None
        };
        Ok(SecurityResult::Failed { reason })
    }

    pub fn into_result(self) -> Result<(), VncError> {
        match self {
            SecurityResult::Ok => Ok(()),
            SecurityResult::Failed { reason } => Err(VncError::Handshake(
                reason
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| AUTHENTICATION_FAILED.to_owned()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn server_bytes(bytes: &[u8]) -> tokio::io::DuplexStream {
        let (ours, mut theirs) = tokio::io::duplex(1024);
        theirs.write_all(bytes).await.unwrap();
        drop(theirs);
        ours
    }

    fn with_reason(prefix: &[u8], reason: &str) -> Vec<u8> {
        let mut bytes = prefix.to_vec();
        bytes.extend_from_slice(&(reason.len() as u32).to_be_bytes());
        bytes.extend_from_slice(reason.as_bytes());
        bytes
    }

    #[tokio::test]
    async fn dictated_type_on_33() {
        let mut stream = server_bytes(&2u32.to_be_bytes()).await;
        let types = SecurityTypes::read(&mut stream, VncVersion::RFB33)
            .await
            .unwrap();
        assert_eq!(types, SecurityTypes::Dictated(2));
    }

    #[tokio::test]
    async fn invalid_type_on_33_carries_reason() {
        let mut stream = server_bytes(&with_reason(&0u32.to_be_bytes(), "some reason")).await;
        let err = SecurityTypes::read(&mut stream, VncVersion::RFB33)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "some reason");
    }

    #[tokio::test]
    async fn invalid_type_on_33_without_reason() {
        let mut stream = server_bytes(&0u32.to_be_bytes()).await;
        let err = SecurityTypes::read(&mut stream, VncVersion::RFB33)
            .await
            .unwrap_err();
        assert!(matches!(err, VncError::Handshake(_)));
    }

    #[tokio::test]
    async fn offered_list_keeps_server_order() {
        let mut stream = server_bytes(&[3, 255, 2, 1]).await;
        let types = SecurityTypes::read(&mut stream, VncVersion::RFB38)
            .await
            .unwrap();
        assert_eq!(types, SecurityTypes::Offered(vec![255, 2, 1]));
    }

    #[tokio::test]
    async fn empty_offer_carries_reason() {
        let mut stream = server_bytes(&with_reason(&[0], "some reason")).await;
        let err = SecurityTypes::read(&mut stream, VncVersion::RFB38)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "some reason");
    }

    #[tokio::test]
    async fn truncated_offer_is_io_error() {
        let mut stream = server_bytes(&[3, 2]).await;
        let err = SecurityTypes::read(&mut stream, VncVersion::RFB37)
            .await
            .unwrap_err();
        assert!(matches!(err, VncError::IoError(_)));
    }

    #[tokio::test]
    async fn truncated_reason_is_io_error() {
        let mut bytes = vec![0];
        bytes.extend_from_slice(&100u32.to_be_bytes());
        bytes.extend_from_slice(b"short");
        let mut stream = server_bytes(&bytes).await;
        let err = SecurityTypes::read(&mut stream, VncVersion::RFB38)
            .await
            .unwrap_err();
        assert!(matches!(err, VncError::IoError(_)));
    }

    #[tokio::test]
    async fn non_utf8_reason_is_rejected() {
        let mut bytes = vec![0];
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let mut stream = server_bytes(&bytes).await;
        let err = SecurityTypes::read(&mut stream, VncVersion::RFB38)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "malformed reason string");
    }

    #[tokio::test]
    async fn result_ok() {
        let mut stream = server_bytes(&0u32.to_be_bytes()).await;
        let result = SecurityResult::read(&mut stream, VncVersion::RFB38)
            .await
            .unwrap();
        assert_eq!(result, SecurityResult::Ok);
        assert!(result.into_result().is_ok());
    }

    #[tokio::test]
    async fn result_failed_with_reason_on_38() {
        let bytes = with_reason(&1u32.to_be_bytes(), "SecurityResult error");
        let mut stream = server_bytes(&bytes).await;
        let err = SecurityResult::read(&mut stream, VncVersion::RFB38)
            .await
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(err.to_string(), "SecurityResult error");
    }

    #[tokio::test]
    async fn result_failed_on_37_reads_no_reason() {
        let bytes = with_reason(&1u32.to_be_bytes(), "never read");
        let mut stream = server_bytes(&bytes).await;
        let result = SecurityResult::read(&mut stream, VncVersion::RFB37)
            .await
            .unwrap();
        assert_eq!(result, SecurityResult::Failed { reason: None });
        assert_eq!(
            result.into_result().unwrap_err().to_string(),
            AUTHENTICATION_FAILED
        );

        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest.len(), 4 + "never read".len());
    }

    #[tokio::test]
    async fn any_nonzero_code_fails() {
        let mut stream = server_bytes(&2u32.to_be_bytes()).await;
        let result = SecurityResult::read(&mut stream, VncVersion::RFB33)
            .await
            .unwrap();
        assert!(result.into_result().is_err());
    }
}
