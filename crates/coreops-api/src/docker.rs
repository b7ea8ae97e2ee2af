// Docker engine API client.
//
// Thin wrapper over the container and image endpoints of the engine's
// remote API (default port 2375). The engine reports failures as a JSON
// `{"message": ...}` body or plain text depending on version; both fold
// into [`Error::Docker`] with the HTTP status.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{self, TransportConfig};

/// Default Docker engine API port.
pub const DEFAULT_PORT: u16 = 2375;

// ── Wire types ───────────────────────────────────────────────────────

/// One published port of a container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortMapping {
    #[serde(rename = "IP", default)]
    pub ip: String,
    #[serde(default)]
    pub private_port: u16,
    #[serde(default)]
    pub public_port: u16,
    #[serde(rename = "Type", default)]
    pub kind: String,
}

/// Host-side configuration summary of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    #[serde(default)]
    pub network_mode: String,
}

/// A container's attachment to one network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointSettings {
    #[serde(rename = "NetworkID", default)]
    pub network_id: String,
    #[serde(rename = "EndpointID", default)]
    pub endpoint_id: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
    #[serde(rename = "IPPrefixLen", default)]
    pub ip_prefix_len: i32,
    #[serde(default)]
    pub mac_address: String,
}

/// Network attachments of a container, keyed by network name
/// (`bridge`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSettings {
    #[serde(default)]
    pub networks: HashMap<String, EndpointSettings>,
}

/// Container summary — from `GET /containers/json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "ImageID", default)]
    pub image_id: String,
    #[serde(default)]
    pub command: String,
    /// Creation time, epoch seconds.
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
    #[serde(default)]
    pub host_config: HostConfig,
    #[serde(default)]
    pub network_settings: NetworkSettings,
}

/// Image summary — from `GET /images/json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Image {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(default)]
    pub repo_tags: Vec<String>,
    #[serde(default)]
    pub repo_digests: Vec<String>,
    /// Creation time, epoch seconds.
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub virtual_size: i64,
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
}

/// Source selection for [`DockerClient::create_image`]: pull from a
/// registry (`from_image`) or import (`from_src`), with optional repo
/// and tag. Fields left `None` are omitted from the query string.
#[derive(Debug, Clone, Default)]
pub struct CreateImageOptions {
    pub from_image: Option<String>,
    pub from_src: Option<String>,
    pub repo: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EngineError {
    #[serde(default)]
    message: String,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for a Docker engine's remote API.
pub struct DockerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DockerClient {
    /// Build a client for `host` (hostname or IP, no scheme) on the
    /// default port.
    pub fn new(host: &str, config: &TransportConfig) -> Result<Self, Error> {
        Self::with_port(host, DEFAULT_PORT, config)
    }

    /// Build a client for `host` on an explicit port.
    pub fn with_port(host: &str, port: u16, config: &TransportConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        let base_url = transport::service_root(host, port)?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` against an explicit root URL
    /// (e.g. a mock server).
    pub fn from_reqwest(root: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(root)?;
        Ok(Self { http, base_url })
    }

    // ── Containers ───────────────────────────────────────────────────

    /// Containers on the host; `all` includes stopped ones.
    pub async fn list_containers(&self, all: bool) -> Result<Vec<Container>, Error> {
        let mut url = self.base_url.join("containers/json")?;
        url.query_pairs_mut().append_pair("all", bool_str(all));
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::decode_success(resp).await
    }

    /// Remove a container by name or ID.
    pub async fn remove_container(
        &self,
        name_or_id: &str,
        delete_volumes: bool,
        force: bool,
    ) -> Result<(), Error> {
        let mut url = self.base_url.join(&format!("containers/{name_or_id}"))?;
        url.query_pairs_mut()
            .append_pair("v", bool_str(delete_volumes))
            .append_pair("force", bool_str(force));
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::expect_success(resp).await
    }

    // ── Images ───────────────────────────────────────────────────────

    /// Images on the host; `all` includes intermediate layers.
    pub async fn list_images(&self, all: bool) -> Result<Vec<Image>, Error> {
        let mut url = self.base_url.join("images/json")?;
        url.query_pairs_mut().append_pair("all", bool_str(all));
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::decode_success(resp).await
    }

    /// Create an image by pulling or importing, per `opts`.
    pub async fn create_image(&self, opts: &CreateImageOptions) -> Result<(), Error> {
        let mut url = self.base_url.join("images/create")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in [
                ("fromImage", opts.from_image.as_deref()),
                ("fromSrc", opts.from_src.as_deref()),
                ("repo", opts.repo.as_deref()),
                ("tag", opts.tag.as_deref()),
            ] {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        debug!("POST {url}");

        let resp = self.http.post(url).send().await?;
        Self::expect_success(resp).await
    }

    /// Remove an image from the host's filesystem.
    pub async fn remove_image(
        &self,
        image: &str,
        force: bool,
        no_prune: bool,
    ) -> Result<(), Error> {
        let mut url = self.base_url.join(&format!("images/{image}"))?;
        url.query_pairs_mut()
            .append_pair("force", bool_str(force))
            .append_pair("noprune", bool_str(no_prune));
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::expect_success(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn decode_success<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            transport::decode_json(resp.text().await?)
        } else {
            Err(Self::engine_error(status, resp).await)
        }
    }

    async fn expect_success(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::engine_error(status, resp).await)
        }
    }

    async fn engine_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<EngineError>(&raw)
            .ok()
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or(raw);

        Error::Docker {
            status: status.as_u16(),
            message,
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
