use thiserror::Error;

use tessera_shared::ConnectionKey;

mod channel;
pub use channel::{IoEndpoint, PacketChannel};

/// Errors raised by the packet queues between the tick loop and the network
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The queue towards the network is full, the packet was dropped
    #[error("Outgoing queue is full, dropped packet for {connection}")]
    QueueFull { connection: ConnectionKey },

    /// The other end of the queue has been dropped
    #[error("Packet queue is disconnected")]
    Disconnected,
}

/// Hands encoded payloads to the network side. Implementations must not block.
pub trait PacketSender: Send + Sync {
    fn send(&self, connection: &ConnectionKey, payload: &[u8]) -> Result<(), TransportError>;
}

/// Pulls payloads that the network side has received
pub trait PacketReceiver: Send {
    /// Returns `Ok(None)` once the queue is drained
    fn receive(&mut self) -> Result<Option<(ConnectionKey, Box<[u8]>)>, TransportError>;
}
