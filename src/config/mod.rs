pub mod paths;
mod types;

pub use paths::LocalPaths;
pub use types::{daemon_host, ClusterConfig, NodeConfig, RemoteConfig, Transport};
