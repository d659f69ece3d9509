use serde::{Deserialize, Serialize};

use crate::machine::MachineSize;

/// Static API credentials. Supplied at construction, never persisted or logged.
#[derive(Clone)]
pub struct AccessCredential {
    pub access_key_id: String,
    pub secret_key: String,
}

/// Caller-supplied description of the cluster to provision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Security-group names derive from this, so repeated runs reuse the group.
    pub prefix: String,
    pub cluster_name: String,
    pub node_count: u32,
    pub node_size: MachineSize,
    pub key_name: String,
    pub admin_username: String,
    pub admin_password: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowsVersion {
    Server2012R2,
    Server2016,
}

/// Outcome of one node launch. `success` tracks the launch call itself;
/// callers inspect each entry, there is no aggregate cluster flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeResult {
    pub name: String,
    pub instance_id: Option<String>,
    pub private_ip: Option<String>,
    pub success: bool,
}

impl NodeResult {
    pub fn failed(name: &str) -> Self {
        Self {
            name: name.to_string(),
            instance_id: None,
            private_ip: None,
            success: false,
        }
    }
}
