pub mod clients;
pub mod memory;
pub mod persistence;
pub mod replication;
