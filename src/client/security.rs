use super::auth::ClientAuth;
use crate::error::UNSUPPORTED_SECURITY_TYPE;
use crate::protocol::security::{SecurityType, SecurityTypes};
use crate::{VncError, VncVersion};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Find the configured mechanism for a security type sent by the server
///
/// Identifiers unknown to the client never match.
fn lookup(auths: &[ClientAuth], security_type: u32) -> Option<&ClientAuth> {
    let security_type = SecurityType::try_from(security_type).ok()?;
    auths.iter().find(|auth| auth.security_type() == security_type)
}

/// Agree on the security type with the server
///
/// On 3.3 the server dictates the type. On 3.7 and later the first type in
/// the server's list that the client has configured is taken, so server order
/// wins over the order of `auths`, and the choice is sent back.
pub async fn negotiate<'a, S>(
    stream: &mut S,
    version: VncVersion,
    auths: &'a [ClientAuth],
) -> Result<&'a ClientAuth, VncError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let auth = match SecurityTypes::read(stream, version).await? {
        SecurityTypes::Dictated(security_type) => lookup(auths, security_type),
        SecurityTypes::Offered(offered) => {
            let auth = offered
                .iter()
                .find_map(|&security_type| lookup(auths, u32::from(security_type)));
            if let Some(auth) = auth {
                auth.security_type().write(stream).await?;
            }
            auth
        }
    };

    let Some(auth) = auth else {
        debug!(
            "No match for configured types {:?}",
            auths.iter().map(ClientAuth::security_type).collect::<Vec<_>>()
        );
        return Err(VncError::handshake(UNSUPPORTED_SECURITY_TYPE));
    };
    info!("Selected security type {:?}", auth.security_type());
    Ok(auth)
}
