pub mod cluster;
pub mod error;
pub mod machine;

pub use cluster::{AccessCredential, ClusterConfig, NodeResult, WindowsVersion};
pub use error::{ProviderError, ProvisionError, SettingsError};
pub use machine::{InstanceSpec, MachineSize};
