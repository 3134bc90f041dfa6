pub mod error;
pub mod indexer;
pub mod position;
pub mod resolver;
pub mod segment_state;
