//! Fleet API wire types.
//!
//! All types match the JSON bodies of `/fleet/v1/` endpoints. Field names
//! use camelCase via `#[serde(rename_all = "camelCase")]`, with explicit
//! renames where the wire name capitalizes an acronym (`machineID`,
//! `primaryIP`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Units ────────────────────────────────────────────────────────────

/// Scheduling state of a unit, as reported by or requested from the
/// cluster. The server may report an empty or unrecognized value for a
/// unit it has not converged yet; those decode as `Unknown`.
///
/// `Unknown` is decode-only: it is outside the domain the server
/// accepts for `desiredState`, and the mutation operations reject it
/// without issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Launched,
    Loaded,
    Inactive,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single `[Section] Name=Value` line of a unit-file definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOption {
    pub name: String,
    pub section: String,
    pub value: String,
}

/// A schedulable unit — from `GET /fleet/v1/units/{name}` and the units
/// list. The client never owns a unit's lifecycle; records reflect server
/// state at fetch time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub name: String,
    #[serde(default)]
    pub current_state: UnitStatus,
    #[serde(default)]
    pub desired_state: UnitStatus,
    #[serde(default)]
    pub options: Vec<UnitOption>,
}

/// A (unit, machine) execution-state fact — from `GET /fleet/v1/state`.
///
/// Several records may share a `name` (one per machine the unit runs on)
/// or a `machine_id` (one per unit on that machine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitState {
    pub name: String,
    #[serde(default)]
    pub hash: String,
    #[serde(rename = "machineID", default)]
    pub machine_id: String,
    #[serde(default)]
    pub systemd_active_state: String,
    #[serde(default)]
    pub systemd_load_state: String,
    #[serde(default)]
    pub systemd_sub_state: String,
}

// ── Machines ─────────────────────────────────────────────────────────

/// A cluster host — from `GET /fleet/v1/machines`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: String,
    #[serde(rename = "primaryIP", default)]
    pub primary_ip: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

// ── Pagination ───────────────────────────────────────────────────────

/// One page of a token-paginated collection.
///
/// The continuation token is opaque; an empty token means no further
/// pages. Implemented by the three list-endpoint wrappers so one
/// paginator serves them all.
pub trait TokenPage {
    type Item;

    fn next_page_token(&self) -> &str;
    fn into_items(self) -> Vec<Self::Item>;
}

/// Page wrapper for `GET /fleet/v1/units`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitsPage {
    #[serde(default)]
    pub next_page_token: String,
    #[serde(default)]
    pub units: Vec<Unit>,
}

impl TokenPage for UnitsPage {
    type Item = Unit;

    fn next_page_token(&self) -> &str {
        &self.next_page_token
    }

    fn into_items(self) -> Vec<Unit> {
        self.units
    }
}

/// Page wrapper for `GET /fleet/v1/state`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatesPage {
    #[serde(default)]
    pub next_page_token: String,
    #[serde(default)]
    pub states: Vec<UnitState>,
}

impl TokenPage for UnitStatesPage {
    type Item = UnitState;

    fn next_page_token(&self) -> &str {
        &self.next_page_token
    }

    fn into_items(self) -> Vec<UnitState> {
        self.states
    }
}

/// Page wrapper for `GET /fleet/v1/machines`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachinesPage {
    #[serde(default)]
    pub next_page_token: String,
    #[serde(default)]
    pub machines: Vec<Machine>,
}

impl TokenPage for MachinesPage {
    type Item = Machine;

    fn next_page_token(&self) -> &str {
        &self.next_page_token
    }

    fn into_items(self) -> Vec<Machine> {
        self.machines
    }
}

// ── Error envelope ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: RemoteError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoteError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// Point-in-time view of a whole cluster, assembled from three
/// independent fetches.
///
/// The three collections are not transactionally consistent with each
/// other: each comes from its own sequence of requests at its own
/// instant. Nothing ties their contents together across resource types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterSnapshot {
    pub units: Vec<Unit>,
    pub states: Vec<UnitState>,
    pub machines: Vec<Machine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_status_decodes_known_values() {
        let unit: Unit = serde_json::from_str(
            r#"{"name":"web@1.service","currentState":"launched","desiredState":"loaded"}"#,
        )
        .unwrap();
        assert_eq!(unit.current_state, UnitStatus::Launched);
        assert_eq!(unit.desired_state, UnitStatus::Loaded);
        assert!(unit.options.is_empty());
    }

    #[test]
    fn unit_status_empty_or_unrecognized_decodes_as_unknown() {
        let unit: Unit =
            serde_json::from_str(r#"{"name":"web@1.service","currentState":""}"#).unwrap();
        assert_eq!(unit.current_state, UnitStatus::Unknown);
        // Absent field falls back to the default.
        assert_eq!(unit.desired_state, UnitStatus::Unknown);
    }

    #[test]
    fn unit_state_maps_acronym_field_names() {
        let state: UnitState = serde_json::from_str(
            r#"{"name":"web@1.service","machineID":"abc123","hash":"deadbeef",
                "systemdActiveState":"active","systemdLoadState":"loaded",
                "systemdSubState":"running"}"#,
        )
        .unwrap();
        assert_eq!(state.machine_id, "abc123");
        assert_eq!(state.systemd_sub_state, "running");
    }

    #[test]
    fn machine_maps_primary_ip() {
        let machine: Machine = serde_json::from_str(
            r#"{"id":"m1","primaryIP":"10.0.0.5","metadata":{"region":"us-east"}}"#,
        )
        .unwrap();
        assert_eq!(machine.primary_ip, "10.0.0.5");
        assert_eq!(machine.metadata.get("region").map(String::as_str), Some("us-east"));
    }

    #[test]
    fn missing_page_token_means_last_page() {
        let page: UnitsPage = serde_json::from_str(r#"{"units":[]}"#).unwrap();
        assert!(page.next_page_token().is_empty());
    }
}
