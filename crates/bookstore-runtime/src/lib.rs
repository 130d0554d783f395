//! Bookstore Runtime — what every bookstore binary does before and after it
//! serves requests.
//!
//! Telemetry setup, the shutdown signal, environment configuration, backend
//! selection (in-memory or external) and the registered HTTP node that ties
//! a listener to its registry entry.

pub mod backends;
pub mod config;
pub mod error;
pub mod node;
pub mod shutdown;
pub mod telemetry;

pub use error::RuntimeError;
pub use node::Node;
