// etcd v2 key-space client.
//
// Thin wrapper over `/v2/keys/` (default port 2379): get, recursive
// list, set, delete. Failures decode etcd's flat
// `{errorCode, message, cause, index}` body into [`Error::Etcd`].

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{self, TransportConfig};

/// Default etcd client port.
pub const DEFAULT_PORT: u16 = 2379;

/// A node in the etcd key space. Directories carry child nodes and no
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub dir: bool,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub modified_index: i64,
    #[serde(default)]
    pub created_index: i64,
}

#[derive(Debug, Deserialize)]
struct KeyResponse {
    node: Node,
    #[serde(rename = "prevNode", default)]
    prev_node: Option<Node>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "errorCode", default)]
    error_code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    cause: String,
}

/// Async client for the etcd v2 key API.
pub struct EtcdClient {
    http: reqwest::Client,
    base_url: Url,
}

impl EtcdClient {
    /// Build a client for `host` (hostname or IP, no scheme) on the
    /// default port.
    pub fn new(host: &str, config: &TransportConfig) -> Result<Self, Error> {
        Self::with_port(host, DEFAULT_PORT, config)
    }

    /// Build a client for `host` on an explicit port.
    pub fn with_port(host: &str, port: u16, config: &TransportConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        let base_url = transport::service_root(host, port)?.join("v2/keys/")?;
        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` against an explicit root URL
    /// (e.g. a mock server). The `/v2/keys/` prefix is appended.
    pub fn from_reqwest(root: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(root)?.join("v2/keys/")?;
        Ok(Self { http, base_url })
    }

    fn key_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// The node at `path`. A missing key surfaces etcd's error body
    /// (code 100) as [`Error::Etcd`]; see [`Error::is_not_found`].
    pub async fn get_key(&self, path: &str) -> Result<Node, Error> {
        let url = self.key_url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let body: KeyResponse = Self::handle(resp, &[200]).await?;
        Ok(body.node)
    }

    /// Recursive listing of the directory at `path`.
    pub async fn recurse_keys(&self, path: &str) -> Result<Node, Error> {
        let mut url = self.key_url(path)?;
        url.query_pairs_mut().append_pair("recursive", "true");
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let body: KeyResponse = Self::handle(resp, &[200]).await?;
        Ok(body.node)
    }

    /// Set or update the value at `path`. Returns the previous node when
    /// the key already existed (update), `None` on first create.
    pub async fn set_key(&self, path: &str, value: &str) -> Result<Option<Node>, Error> {
        let url = self.key_url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).form(&[("value", value)]).send().await?;
        let body: KeyResponse = Self::handle(resp, &[200, 201]).await?;
        Ok(body.prev_node)
    }

    /// Delete the key at `path`.
    pub async fn delete_key(&self, path: &str) -> Result<(), Error> {
        let url = self.key_url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        let _: KeyResponse = Self::handle(resp, &[200]).await?;
        Ok(())
    }

    async fn handle<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
        success: &[u16],
    ) -> Result<T, Error> {
        let status = resp.status().as_u16();
        let raw = resp.text().await?;

        if success.contains(&status) {
            return transport::decode_json(raw);
        }

        match serde_json::from_str::<ErrorBody>(&raw) {
            Ok(err) => Err(Error::Etcd {
                code: err.error_code,
                message: err.message,
                cause: err.cause,
            }),
            Err(_) => Err(Error::Etcd {
                code: i64::from(status),
                message: raw,
                cause: String::new(),
            }),
        }
    }
}
