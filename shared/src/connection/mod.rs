pub mod connection_key;
pub mod connection_state;
pub mod error;
pub mod wire;
