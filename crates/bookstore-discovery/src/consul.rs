//! Consul agent backend.
//!
//! Uses the agent HTTP API: services are registered with a TTL check that
//! the heartbeat keeps passing, and discovery asks the health endpoint for
//! passing instances only.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Registry, RegistryError, ServiceInstance};

/// TTL of the health check attached to every registration.
const CHECK_TTL: &str = "5s";

/// Consul reaps instances whose check stays critical this long.
const DEREGISTER_CRITICAL_AFTER: &str = "1m";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RegisterPayload<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    name: &'a str,
    address: &'a str,
    port: u16,
    check: CheckPayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CheckPayload<'a> {
    #[serde(rename = "CheckID")]
    check_id: String,
    #[serde(rename = "TTL")]
    ttl: &'a str,
    status: &'a str,
    deregister_critical_service_after: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: HealthNode,
    service: HealthService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthNode {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthService {
    #[serde(default)]
    address: String,
    port: u16,
}

fn check_id(instance_id: &str) -> String {
    format!("service:{instance_id}")
}

fn backend(err: &reqwest::Error) -> RegistryError {
    RegistryError::Backend(err.to_string())
}

/// Registry backed by a local Consul agent.
#[derive(Debug, Clone)]
pub struct ConsulRegistry {
    client: Client,
    base_url: String,
}

impl ConsulRegistry {
    /// Creates a client for the agent at `base_url` (e.g.
    /// `http://localhost:8500`).
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Backend` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| backend(&e))?;
        let base_url = if base_url.contains("://") {
            base_url.trim_end_matches('/').to_owned()
        } else {
            format!("http://{}", base_url.trim_end_matches('/'))
        };
        info!(agent = %redacted(&base_url), "using Consul registry");
        Ok(Self { client, base_url })
    }

    async fn put(&self, path: &str) -> Result<(), RegistryError> {
        self.client
            .put(format!("{}{path}", self.base_url))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| backend(&e))?;
        Ok(())
    }
}

#[async_trait]
impl Registry for ConsulRegistry {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        let payload = RegisterPayload {
            id: &instance.instance_id,
            name: &instance.service_name,
            address: instance.address.host(),
            port: instance.address.port(),
            check: CheckPayload {
                check_id: check_id(&instance.instance_id),
                ttl: CHECK_TTL,
                status: "passing",
                deregister_critical_service_after: DEREGISTER_CRITICAL_AFTER,
            },
        };

        self.client
            .put(format!("{}/v1/agent/service/register", self.base_url))
            .json(&payload)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| backend(&e))?;

        debug!(instance_id = %instance.instance_id, "registered with Consul");
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), RegistryError> {
        self.put(&format!("/v1/agent/service/deregister/{instance_id}"))
            .await
    }

    async fn health_check(&self, instance_id: &str) -> Result<(), RegistryError> {
        self.put(&format!("/v1/agent/check/pass/{}", check_id(instance_id)))
            .await
    }

    async fn discover(&self, service_name: &str) -> Result<Vec<String>, RegistryError> {
        let entries: Vec<HealthEntry> = self
            .client
            .get(format!("{}/v1/health/service/{service_name}", self.base_url))
            .query(&[("passing", "true")])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| backend(&e))?
            .json()
            .await
            .map_err(|e| backend(&e))?;

        Ok(entries
            .into_iter()
            .map(|entry| {
                let host = if entry.service.address.is_empty() {
                    entry.node.address
                } else {
                    entry.service.address
                };
                format!("{host}:{}", entry.service.port)
            })
            .collect())
    }
}

/// `url` with any userinfo removed, for logging.
fn redacted(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut parsed) => {
            // Both setters only fail for URLs that cannot carry credentials.
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        Err(_) => "<unparseable url>".to_owned(),
    }
}
