//! Registry-resolving RPC client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument};

use bookstore_core::error::DomainError;
use bookstore_discovery::{Registry, RegistryError};

use crate::protocol::RpcMethod;
use crate::status::{Code, Status};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure of a single RPC.
#[derive(Debug, Error)]
pub enum RpcError {
    /// No healthy instance of the service is registered.
    #[error("no healthy instance of service {0}")]
    Unavailable(String),

    /// The resolved instance could not be dialed.
    #[error("failed to reach {address}: {message}")]
    Connection {
        /// Address that was dialed.
        address: String,
        /// Transport error.
        message: String,
    },

    /// The call did not complete within the per-call timeout.
    #[error("call to {address} timed out")]
    Timeout {
        /// Address that was dialed.
        address: String,
    },

    /// The service answered with an error status.
    #[error("remote error {0}")]
    Status(Status),

    /// The registry lookup itself failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The response body was not the expected message.
    #[error("undecodable response from {address}: {message}")]
    Decode {
        /// Address that answered.
        address: String,
        /// Decoder error.
        message: String,
    },
}

impl From<RpcError> for DomainError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Unavailable(_) | RpcError::Registry(_) => {
                Self::ServiceUnavailable(err.to_string())
            }
            RpcError::Connection { .. } | RpcError::Timeout { .. } => {
                Self::Connection(err.to_string())
            }
            RpcError::Status(status) => status.into(),
            RpcError::Decode { .. } => Self::Infrastructure(err.to_string()),
        }
    }
}

/// Resolves the target service through the registry and issues one call per
/// request. Connections are not kept idle between calls.
#[derive(Clone)]
pub struct RpcClient {
    registry: Arc<dyn Registry>,
    http: Client,
}

impl RpcClient {
    /// Builds a client with the given per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Connection` if the HTTP client cannot be built.
    pub fn new(registry: Arc<dyn Registry>, timeout: Duration) -> Result<Self, RpcError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| RpcError::Connection {
                address: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { registry, http })
    }

    /// Issues `request` to the first healthy instance of its service.
    ///
    /// # Errors
    ///
    /// See [`RpcError`] for the failure classes.
    #[instrument(skip(self, request), fields(method = M::METHOD))]
    pub async fn call<M: RpcMethod>(&self, request: &M) -> Result<M::Response, RpcError> {
        let address = self
            .registry
            .discover(M::SERVICE)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RpcError::Unavailable(M::SERVICE.to_owned()))?;

        debug!(address = %address, "dispatching rpc");
        let response = self
            .http
            .post(format!("http://{address}{}", M::path()))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&address, &e))?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout { address: address.clone() }
                } else {
                    RpcError::Decode {
                        address: address.clone(),
                        message: e.to_string(),
                    }
                }
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&address, &e))?;
        let remote = serde_json::from_slice::<Status>(&body).unwrap_or_else(|_| {
            Status::new(Code::Internal, format!("unexpected status {status} from {address}"))
        });
        Err(RpcError::Status(remote))
    }
}

fn transport_error(address: &str, err: &reqwest::Error) -> RpcError {
    if err.is_timeout() {
        RpcError::Timeout {
            address: address.to_owned(),
        }
    } else {
        RpcError::Connection {
            address: address.to_owned(),
            message: err.to_string(),
        }
    }
}
