use std::sync::Arc;

use cloudforge_common::{MachineSize, NodeResult, ProviderError, ProvisionError, WindowsVersion};
use cloudforge_providers::types::LaunchRequest;
use cloudforge_providers::Ec2Api;
use tracing::warn;

use crate::firewall;
use crate::image;
use crate::node;
use crate::script;

/// Produces the PowerShell command lines a server runs on first boot.
/// Implementations are application-specific (IIS setup, service install, ...).
pub trait BootCommands {
    fn commands(&self) -> Vec<String>;
}

/// Single-node Windows provisioning: security group, latest matching image,
/// one launch with a caller-supplied boot script.
pub struct WindowsServer {
    api: Arc<dyn Ec2Api>,
}

impl WindowsServer {
    #[cfg(feature = "provider-aws")]
    pub fn new(credential: &cloudforge_common::AccessCredential, region: &str) -> Self {
        Self {
            api: Arc::new(cloudforge_providers::aws::AwsEc2Client::new(
                credential, region,
            )),
        }
    }

    /// Any `Ec2Api` implementation, mainly for tests.
    pub fn with_api(api: Arc<dyn Ec2Api>) -> Self {
        Self { api }
    }

    /// RDP is always open; extra ports are for whatever the boot script
    /// installs.
    pub async fn ensure_security_group(
        &self,
        name: &str,
        extra_ports: &[i32],
    ) -> Result<String, ProviderError> {
        firewall::ensure_security_group(
            self.api.as_ref(),
            name,
            firewall::GROUP_DESCRIPTION,
            &firewall::windows_rules(extra_ports),
        )
        .await
    }

    pub async fn resolve_image(
        &self,
        version: WindowsVersion,
    ) -> Result<Option<String>, ProviderError> {
        image::resolve_latest_image(self.api.as_ref(), version).await
    }

    /// An empty image catalog yields a failed result without a launch
    /// attempt; provider errors propagate.
    pub async fn install(
        &self,
        size: MachineSize,
        name: &str,
        security_group_id: &str,
        key_name: &str,
        boot: &dyn BootCommands,
        version: WindowsVersion,
    ) -> Result<NodeResult, ProvisionError> {
        let Some(image_id) = self.resolve_image(version).await? else {
            warn!(server = name, ?version, "no matching image, skipping launch");
            return Ok(NodeResult::failed(name));
        };

        let spec = size.spec();
        let request = LaunchRequest {
            image_id,
            instance_type: spec.instance_type.to_string(),
            key_name: key_name.to_string(),
            security_group_id: security_group_id.to_string(),
            user_data: script::windows_user_data(&boot.commands()),
            disks: node::windows_disks(&spec),
        };
        Ok(node::launch_node(self.api.as_ref(), name, &request).await)
    }
}
