use super::error::WireError;

pub const NONCE_BYTES: usize = 4;

/// Structural wire envelope: a per-connection nonce followed by the opaque
/// event bytes. Framing and encryption happen outside of this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WirePayload {
    pub nonce: u32,
    pub event: Box<[u8]>,
}

impl WirePayload {
    pub fn new(nonce: u32, event: impl Into<Box<[u8]>>) -> Self {
        Self {
            nonce,
            event: event.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(NONCE_BYTES + self.event.len());
        bytes.extend_from_slice(&self.nonce.to_be_bytes());
        bytes.extend_from_slice(&self.event);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let Some((nonce, event)) = bytes.split_first_chunk::<NONCE_BYTES>() else {
            return Err(WireError::PayloadTooShort {
                length: bytes.len(),
                required: NONCE_BYTES,
            });
        };
        Ok(Self {
            nonce: u32::from_be_bytes(*nonce),
            event: event.into(),
        })
    }
}

/// Turns events into bytes and back. The byte format is up to the
/// application.
pub trait EventCodec<M>: Send {
    fn encode(&self, event: &M) -> Result<Vec<u8>, WireError>;

    fn decode(&self, bytes: &[u8]) -> Result<M, WireError>;
}
