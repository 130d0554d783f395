//! Bookstore RPC — synchronous read and validation calls between the gateway
//! and the backend services.
//!
//! Calls are JSON over HTTP: `POST /rpc/<Service>/<Method>` with the request
//! message as the body. Success is a 200 carrying the response message;
//! failure is a non-2xx carrying a [`Status`].

pub mod client;
pub mod protocol;
pub mod status;

pub use client::{RpcClient, RpcError};
pub use protocol::RpcMethod;
pub use status::{Code, RpcJson, Status};
