// Fleet cluster API client.
//
// Hand-crafted async HTTP client for the Fleet API v1 (default port 49153).
// Covers unit CRUD, unit states, machines, token-based pagination, and
// whole-cluster snapshot assembly.

pub mod client;
pub mod correlate;
pub mod types;

pub use client::{FleetClient, FleetConfig};
pub use types::{ClusterSnapshot, Machine, Unit, UnitOption, UnitState, UnitStatus};
