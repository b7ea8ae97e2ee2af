// Fleet API HTTP client.
//
// Wraps `reqwest::Client` with Fleet-specific URL construction, the
// `{error: {code, message}}` envelope, and token-based pagination. Every
// follow-up page request is derived from the base URL through the `url`
// query-pair API, so a filtered URL such as `state?machineID=M` paginates
// with a single well-formed query string.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::correlate;
use super::types::{
    ClusterSnapshot, ErrorEnvelope, Machine, MachinesPage, TokenPage, Unit, UnitOption, UnitState,
    UnitStatesPage, UnitStatus, UnitsPage,
};
use crate::error::Error;
use crate::transport::{self, TransportConfig};

/// Default Fleet API port.
pub const DEFAULT_PORT: u16 = 49153;

const DEFAULT_API_VERSION: &str = "v1";
const DEFAULT_MAX_PAGES: usize = 1024;

/// Configuration for a [`FleetClient`].
///
/// Every client instance carries its own host, port, and API version, so
/// differently configured clients coexist in one process.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Hostname or IP of the Fleet API endpoint, without a scheme.
    pub host: String,
    pub port: u16,
    pub api_version: String,
    pub transport: TransportConfig,
    /// Upper bound on pages per logical fetch. Guards against a server
    /// that never returns an empty `nextPageToken`.
    pub max_pages: usize,
}

impl FleetConfig {
    /// Config for `host` with the default port, API version, transport,
    /// and page cap.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            api_version: DEFAULT_API_VERSION.to_owned(),
            transport: TransportConfig::default(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Fleet cluster API.
///
/// Stateless between calls: each operation is self-contained and safe to
/// invoke from multiple concurrent callers. No operation retries.
pub struct FleetClient {
    http: reqwest::Client,
    base_url: Url,
    max_pages: usize,
}

impl FleetClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a [`FleetConfig`].
    pub fn new(config: &FleetConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;
        let root = transport::service_root(&config.host, config.port)?;
        let base_url = root.join(&format!("fleet/{}/", config.api_version))?;

        Ok(Self {
            http,
            base_url,
            max_pages: config.max_pages,
        })
    }

    /// Wrap an existing `reqwest::Client` against an explicit root URL
    /// (e.g. a mock server). The `/fleet/v1/` prefix is appended.
    pub fn from_reqwest(root: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(root)?.join("fleet/v1/")?;
        Ok(Self {
            http,
            base_url,
            max_pages: DEFAULT_MAX_PAGES,
        })
    }

    /// Override the pagination cap.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"units"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_success() {
            transport::decode_json(resp.text().await?)
        } else {
            Err(remote_error(status, resp).await)
        }
    }

    async fn expect_status(
        resp: reqwest::Response,
        expected: reqwest::StatusCode,
    ) -> Result<(), Error> {
        let status = resp.status();
        if status == expected {
            Ok(())
        } else {
            Err(remote_error(status, resp).await)
        }
    }

    // ── Pagination ───────────────────────────────────────────────────

    /// Fetch every page of a token-paginated collection, preserving
    /// server enumeration order.
    ///
    /// Each follow-up request clones the base URL and appends the
    /// current `nextPageToken` pair, so existing query parameters are
    /// kept and no token pair accumulates across pages. Terminates on an
    /// empty token or fails once `max_pages` requests have been issued.
    async fn collect_pages<P>(&self, base: Url) -> Result<Vec<P::Item>, Error>
    where
        P: TokenPage + DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut token = String::new();
        let mut pages = 0usize;

        loop {
            if pages == self.max_pages {
                return Err(Error::PaginationLimitExceeded { pages });
            }

            let url = if token.is_empty() {
                base.clone()
            } else {
                with_page_token(&base, &token)
            };

            let page: P = self.get_json(url).await?;
            pages += 1;

            token = page.next_page_token().to_owned();
            items.extend(page.into_items());

            if token.is_empty() {
                return Ok(items);
            }
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Units ────────────────────────────────────────────────────────

    /// All units in the cluster, across every page.
    pub async fn list_units(&self) -> Result<Vec<Unit>, Error> {
        self.collect_pages::<UnitsPage>(self.url("units")?).await
    }

    /// The single named unit.
    ///
    /// A missing unit surfaces the server's 404 envelope as
    /// [`Error::Fleet`]; see [`Error::is_not_found`].
    pub async fn get_unit(&self, name: &str) -> Result<Unit, Error> {
        self.get_json(self.url(&format!("units/{name}"))?).await
    }

    /// The template definition and concrete instances for `base`, from a
    /// full unit fetch.
    pub async fn list_units_by_name(
        &self,
        base: &str,
    ) -> Result<(Option<Unit>, Vec<Unit>), Error> {
        let units = self.list_units().await?;
        Ok(correlate::correlate(units, base))
    }

    /// Create the named unit; the server assigns its current state.
    ///
    /// 201 is the only success. 400 (bad parameters), 409 (name
    /// conflict), and every other status surface the decoded envelope.
    /// [`UnitStatus::Unknown`] is rejected before any request is sent.
    pub async fn create_unit(
        &self,
        name: &str,
        desired_state: UnitStatus,
        options: &[UnitOption],
    ) -> Result<(), Error> {
        if desired_state == UnitStatus::Unknown {
            return Err(Error::InvalidDesiredState);
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            desired_state: UnitStatus,
            options: &'a [UnitOption],
        }

        let url = self.url(&format!("units/{name}"))?;
        debug!("PUT {url}");

        let resp = self
            .http
            .put(url)
            .json(&Body {
                desired_state,
                options,
            })
            .send()
            .await?;
        Self::expect_status(resp, reqwest::StatusCode::CREATED).await
    }

    /// Ask the cluster to converge the named unit to `desired_state`.
    ///
    /// 204 is the only success; the server converges `currentState`
    /// eventually, not within this call. [`UnitStatus::Unknown`] is
    /// rejected before any request is sent.
    pub async fn set_desired_state(
        &self,
        name: &str,
        desired_state: UnitStatus,
    ) -> Result<(), Error> {
        if desired_state == UnitStatus::Unknown {
            return Err(Error::InvalidDesiredState);
        }

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            desired_state: UnitStatus,
        }

        let url = self.url(&format!("units/{name}"))?;
        debug!("PUT {url}");

        let resp = self
            .http
            .put(url)
            .json(&Body { desired_state })
            .send()
            .await?;
        Self::expect_status(resp, reqwest::StatusCode::NO_CONTENT).await
    }

    /// Remove the named unit from the cluster. 204 is the only success.
    pub async fn destroy_unit(&self, name: &str) -> Result<(), Error> {
        let url = self.url(&format!("units/{name}"))?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::expect_status(resp, reqwest::StatusCode::NO_CONTENT).await
    }

    // ── Unit states ──────────────────────────────────────────────────

    /// All unit states in the cluster, across every page.
    pub async fn list_unit_states(&self) -> Result<Vec<UnitState>, Error> {
        self.collect_pages::<UnitStatesPage>(self.url("state")?)
            .await
    }

    /// Unit states whose name belongs to `base` (prefix `"<base>@"`).
    pub async fn list_unit_states_by_name(&self, base: &str) -> Result<Vec<UnitState>, Error> {
        let states = self.list_unit_states().await?;
        Ok(correlate::filter_by_base(states, base))
    }

    /// Unit states reported for one machine, filtered server-side.
    pub async fn unit_states_by_machine(&self, machine_id: &str) -> Result<Vec<UnitState>, Error> {
        let mut url = self.url("state")?;
        url.query_pairs_mut().append_pair("machineID", machine_id);
        self.collect_pages::<UnitStatesPage>(url).await
    }

    /// Unit states for one exact unit name, filtered server-side.
    pub async fn unit_states_by_unit(&self, unit_name: &str) -> Result<Vec<UnitState>, Error> {
        let mut url = self.url("state")?;
        url.query_pairs_mut().append_pair("unitName", unit_name);
        self.collect_pages::<UnitStatesPage>(url).await
    }

    // ── Machines ─────────────────────────────────────────────────────

    /// All machines in the cluster, across every page.
    pub async fn list_machines(&self) -> Result<Vec<Machine>, Error> {
        self.collect_pages::<MachinesPage>(self.url("machines")?)
            .await
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// Units, unit states, and machines from three independent fetches.
    ///
    /// The fetches run concurrently and fail fast: the first error
    /// aborts the whole call and no partial snapshot is returned. The
    /// three collections are not transactionally consistent with each
    /// other.
    pub async fn get_cluster_snapshot(&self) -> Result<ClusterSnapshot, Error> {
        let (units, states, machines) = tokio::try_join!(
            self.list_units(),
            self.list_unit_states(),
            self.list_machines(),
        )?;

        Ok(ClusterSnapshot {
            units,
            states,
            machines,
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Return `base` with the `nextPageToken` pair appended. Callers always
/// pass the original base URL, never a previous page URL, so the token
/// pair does not accumulate.
fn with_page_token(base: &Url, token: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("nextPageToken", token);
    url
}

/// Decode the Fleet error envelope; fall back to a generic error carrying
/// the HTTP status and raw body when the envelope itself does not parse.
async fn remote_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorEnvelope>(&raw) {
        Ok(envelope) => Error::Fleet {
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => Error::Fleet {
            code: i64::from(status.as_u16()),
            message: if raw.is_empty() {
                status.to_string()
            } else {
                raw
            },
        },
    }
}
