// Consul health-check client.
//
// Thin wrapper over `GET /v1/health/checks/{service}` (default port
// 8500). Single request, no pagination.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{self, TransportConfig};

/// Default Consul HTTP API port.
pub const DEFAULT_PORT: u16 = 8500;

/// One health check registered for a service, as reported by a node's
/// agent. Wire field names are PascalCase.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    pub node: String,
    #[serde(rename = "CheckID")]
    pub check_id: String,
    pub name: String,
    /// One of: `passing`, `warning`, `critical`.
    pub status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub output: String,
    #[serde(rename = "ServiceID", default)]
    pub service_id: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub create_index: i64,
    #[serde(default)]
    pub modify_index: i64,
}

/// Async client for the Consul health API.
pub struct ConsulClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ConsulClient {
    /// Build a client for `host` (hostname or IP, no scheme) on the
    /// default port.
    pub fn new(host: &str, config: &TransportConfig) -> Result<Self, Error> {
        Self::with_port(host, DEFAULT_PORT, config)
    }

    /// Build a client for `host` on an explicit port.
    pub fn with_port(host: &str, port: u16, config: &TransportConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        let base_url = transport::service_root(host, port)?.join("v1/")?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` against an explicit root URL
    /// (e.g. a mock server). The `/v1/` prefix is appended.
    pub fn from_reqwest(root: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(root)?.join("v1/")?;
        Ok(Self { http, base_url })
    }

    /// The health checks registered for `service` across the cluster.
    ///
    /// Consul answers an unknown service with an empty list; that is
    /// surfaced as [`Error::NoHealthChecks`] rather than silence.
    pub async fn health_checks(&self, service: &str) -> Result<Vec<HealthCheck>, Error> {
        let url = self.base_url.join(&format!("health/checks/{service}"))?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?.error_for_status()?;
        let checks: Vec<HealthCheck> = transport::decode_json(resp.text().await?)?;

        if checks.is_empty() {
            return Err(Error::NoHealthChecks {
                service: service.to_owned(),
            });
        }

        Ok(checks)
    }
}
