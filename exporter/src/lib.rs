pub mod chain;
pub mod client;
pub mod config;
pub mod direct;
pub mod errors;
pub mod job;
pub mod metrics_defs;
pub mod poller;
pub mod transport;
