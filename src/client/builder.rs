use super::{auth::ClientAuth, connection::VncClient, security};
use crate::protocol::security::{SecurityResult, SecurityType};
use crate::{VncError, VncVersion};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, trace};

/// The client side handshake, one state per stage
///
/// Any stage may fail, which ends the handshake. Nothing is resumable: to
/// retry, open a new stream and start over.
pub enum VncState<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    Handshake(VncConnector<S>),
    SecurityNegotiation(VncConnector<S>),
    Authenticate(VncConnector<S>, ClientAuth),
    SecurityResult(VncConnector<S>, SecurityType),
    Connected(VncClient<S>),
}

impl<S> VncState<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Drive the handshake until connected or failed
    pub async fn try_start(mut self) -> Result<Self, VncError> {
        loop {
            self = match self {
                VncState::Connected(_) => return Ok(self),
                VncState::Handshake(mut connector) => {
                    // Record the negotiated rfbversion
                    connector.rfb_version =
                        VncVersion::negotiate(&mut connector.stream, connector.rfb_version).await?;
                    VncState::SecurityNegotiation(connector)
                }
                VncState::SecurityNegotiation(mut connector) => {
                    let auth = security::negotiate(
                        &mut connector.stream,
                        connector.rfb_version,
                        &connector.auths,
                    )
                    .await?
                    .clone();
                    VncState::Authenticate(connector, auth)
                }
                VncState::Authenticate(mut connector, auth) => {
                    auth.handshake(&mut connector.stream).await?;
                    let security_type = auth.security_type();
                    trace!("Security handshake done for {:?}", security_type);

                    // 3.3 and 3.7 servers send no SecurityResult for None
                    if security_type == SecurityType::None
                        && connector.rfb_version < VncVersion::RFB38
                    {
                        info!("No auth needed in {:?}", connector.rfb_version);
                        VncState::Connected(connector.into_client(security_type))
                    } else {
                        VncState::SecurityResult(connector, security_type)
                    }
                }
                VncState::SecurityResult(mut connector, security_type) => {
                    SecurityResult::read(&mut connector.stream, connector.rfb_version)
                        .await?
                        .into_result()?;
                    info!("Auth done, client connected");
                    VncState::Connected(connector.into_client(security_type))
                }
            };
        }
    }

    pub fn finish(self) -> Result<VncClient<S>, VncError> {
        if let VncState::Connected(client) = self {
            Ok(client)
        } else {
            Err(VncError::ConnectError)
        }
    }
}

/// Connection Builder to setup the handshake
pub struct VncConnector<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream: S,
    auths: Vec<ClientAuth>,
    rfb_version: VncVersion,
}

impl<S> VncConnector<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// To new a handshake configuration with stream `S`
    ///
    /// `S` should implement async I/O methods
    ///
    /// ```no_run
    /// use vnc_handshake::{ClientAuth, VncAuth, VncConnector, VncError};
    /// use tokio::{self, net::TcpStream};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), VncError> {
    ///     let tcp = TcpStream::connect("127.0.0.1:5900").await?;
    ///     let vnc = VncConnector::new(tcp)
    ///         .add_auth(VncAuth::new("password").into())
    ///         .add_auth(ClientAuth::None)
    ///         .build()?
    ///         .try_start()
    ///         .await?
    ///         .finish()?;
    ///     println!("Connected with {:?}", vnc.version());
    ///     Ok(())
    /// }
    /// ```
    ///
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            auths: Vec::new(),
            rfb_version: VncVersion::RFB38,
        }
    }

    /// Authentication the client is willing to do
    ///
    /// The order they are added in is kept, but the server's order decides
    /// which one gets used when several match.
    ///
    pub fn add_auth(mut self, auth: ClientAuth) -> Self {
        self.auths.push(auth);
        self
    }

    /// The max vnc version that we supported
    ///
    /// Version should be one of the [VncVersion]
    ///
    pub fn set_version(mut self, version: VncVersion) -> Self {
        self.rfb_version = version;
        self
    }

    /// Complete the client configuration
    ///
    pub fn build(self) -> Result<VncState<S>, VncError> {
        if self.auths.is_empty() {
            return Err(VncError::handshake("no security type configured"));
        }
        Ok(VncState::Handshake(self))
    }

    fn into_client(self, security_type: SecurityType) -> VncClient<S> {
        VncClient::new(self.stream, self.rfb_version, security_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::auth::VncAuth;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    #[test]
    fn build_needs_an_auth() {
        let (ours, _theirs) = tokio::io::duplex(64);
        assert!(VncConnector::new(ours).build().is_err());
    }

    #[test]
    fn finish_before_start() {
        let (ours, _theirs) = tokio::io::duplex(64);
        let state = VncConnector::new(ours)
            .add_auth(ClientAuth::None)
            .build()
            .unwrap();
        assert!(matches!(state.finish(), Err(VncError::ConnectError)));
    }

    async fn start(
        connector: VncConnector<DuplexStream>,
    ) -> Result<VncClient<DuplexStream>, VncError> {
        connector.build()?.try_start().await?.finish()
    }

    async fn connect(
        server: &[u8],
        auths: Vec<ClientAuth>,
    ) -> (Result<VncClient<DuplexStream>, VncError>, DuplexStream) {
        let (ours, mut theirs) = tokio::io::duplex(1024);
        theirs.write_all(server).await.unwrap();
        let connector = auths
            .into_iter()
            .fold(VncConnector::new(ours), VncConnector::add_auth);
        (start(connector).await, theirs)
    }

    #[tokio::test]
    async fn none_on_37_skips_result() {
        let mut server = b"RFB 003.007\n".to_vec();
        server.extend_from_slice(&[1, 1]);
        let (client, mut theirs) = connect(&server, vec![ClientAuth::None]).await;
        let client = client.unwrap();
        assert_eq!(client.version(), VncVersion::RFB37);
        assert_eq!(client.security_type(), SecurityType::None);

        let mut sent = [0u8; 13];
        theirs.read_exact(&mut sent).await.unwrap();
        assert_eq!(&sent, b"RFB 003.007\n\x01");
    }

    #[tokio::test]
    async fn none_on_38_reads_result() {
        let mut server = b"RFB 003.008\n".to_vec();
        server.extend_from_slice(&[1, 1]);
        server.extend_from_slice(&0u32.to_be_bytes());
        server.extend_from_slice(b"after");
        let (client, _theirs) = connect(&server, vec![ClientAuth::None]).await;

        let mut rest = [0u8; 5];
        client
            .unwrap()
            .into_inner()
            .read_exact(&mut rest)
            .await
            .unwrap();
        assert_eq!(&rest, b"after");
    }

    #[tokio::test]
    async fn vnc_auth_rejected_on_33() {
        let mut server = b"RFB 003.003\n".to_vec();
        server.extend_from_slice(&2u32.to_be_bytes());
        server.extend_from_slice(&[0; 16]);
        server.extend_from_slice(&1u32.to_be_bytes());
        let (client, _theirs) = connect(&server, vec![VncAuth::new("wrong").into()]).await;
        assert_eq!(client.unwrap_err().to_string(), "authentication failed");
    }
}
