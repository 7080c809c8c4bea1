//! Reverse-proxy forwarding path.

pub mod forwarder;

pub use forwarder::Forwarder;
