pub mod address;
pub mod config;
pub mod error;
pub mod observability;
pub mod rpc;
pub mod types;
