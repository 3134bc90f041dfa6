use super::error::ConnectionError;

/// Lifecycle of one remote peer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Errored. Must be reset to Disconnected before the connection is reused.
    Failed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connecting, Failed)
                | (Connected, Disconnected)
                | (Connected, Failed)
                | (Failed, Disconnected)
        )
    }

    pub fn transition(self, next: ConnectionState) -> Result<ConnectionState, ConnectionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ConnectionError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Only Connected peers can be routed to
    pub fn is_routable(self) -> bool {
        self == ConnectionState::Connected
    }
}
