pub mod envelope;
pub mod stage;
