use crate::{SecurityType, VncVersion};

/// A connection whose handshake has completed
///
/// The stream is positioned right after the handshake, ready for the
/// initialisation messages.
#[derive(Debug)]
pub struct VncClient<S> {
    stream: S,
    version: VncVersion,
    security_type: SecurityType,
}

impl<S> VncClient<S> {
    pub(super) fn new(stream: S, version: VncVersion, security_type: SecurityType) -> Self {
        Self {
            stream,
            version,
            security_type,
        }
    }

    /// The rfb version both sides agreed on
    pub fn version(&self) -> VncVersion {
        self.version
    }

    pub fn security_type(&self) -> SecurityType {
        self.security_type
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Hand the stream over to whatever speaks the rest of the protocol
    pub fn into_inner(self) -> S {
        self.stream
    }
}
