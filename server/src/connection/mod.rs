pub mod connection;
pub mod routing_table;
