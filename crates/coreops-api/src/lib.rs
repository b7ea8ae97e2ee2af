// coreops-api: Async Rust clients for CoreOS cluster services
// (Fleet, etcd, Consul, Docker engine)

pub mod consul;
pub mod docker;
pub mod error;
pub mod etcd;
pub mod fleet;
pub mod transport;

pub use error::Error;
pub use transport::TransportConfig;
