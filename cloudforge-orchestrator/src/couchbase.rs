use std::sync::Arc;

use cloudforge_common::{ClusterConfig, InstanceSpec, NodeResult, ProvisionError};
use cloudforge_providers::types::LaunchRequest;
use cloudforge_providers::Ec2Api;
use tracing::{info, warn};

use crate::firewall;
use crate::node;
use crate::script::{self, CouchbaseScriptParams};

/// Image the cluster nodes boot from (CentOS 7).
const NODE_IMAGE_ID: &str = "ami-7abd0209";
/// Web console / REST port, also used for the management URL.
pub const WEB_CONSOLE_PORT: u16 = 8091;

/// Provisions an N-node Couchbase cluster: security group, then the seed
/// node, then each follower with the seed's private address baked into its
/// boot script. Strictly sequential; cluster join and rebalance happen on
/// the instances themselves.
pub struct CouchbaseCluster {
    api: Arc<dyn Ec2Api>,
}

impl CouchbaseCluster {
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

    /// One result per attempted node, in launch order. A failed seed aborts
    /// the remaining launches; a failed follower is recorded and the loop
    /// continues. Callers inspect each entry's `success` flag.
    pub async fn install_cluster(
        &self,
        config: &ClusterConfig,
    ) -> Result<Vec<NodeResult>, ProvisionError> {
        let group_name = format!("{}.couchbase", config.prefix);
        let group_id = firewall::ensure_security_group(
            self.api.as_ref(),
            &group_name,
            firewall::GROUP_DESCRIPTION,
            &firewall::couchbase_rules(),
        )
        .await
        .map_err(|source| ProvisionError::SecurityGroup {
            name: group_name.clone(),
            source,
        })?;

        let spec = config.node_size.spec();
        let mut results = Vec::with_capacity(config.node_count as usize);

        let seed = self.install_node(config, &spec, &group_id, 0, None).await;
        let seed_ip = seed.private_ip.clone().filter(|_| seed.success);
        results.push(seed);

        let Some(seed_ip) = seed_ip else {
            warn!(
                cluster = %config.cluster_name,
                "seed node failed, skipping remaining launches"
            );
            return Ok(results);
        };

        for index in 1..config.node_count {
            let result = self
                .install_node(config, &spec, &group_id, index, Some(&seed_ip))
                .await;
            results.push(result);
        }

        info!(
            cluster = %config.cluster_name,
            nodes = results.len(),
            healthy = results.iter().filter(|r| r.success).count(),
            "cluster install finished"
        );
        Ok(results)
    }

    async fn install_node(
        &self,
        config: &ClusterConfig,
        spec: &InstanceSpec,
        group_id: &str,
        index: u32,
        peer: Option<&str>,
    ) -> NodeResult {
        let name = format!("{}.node{}", config.cluster_name, index);
        let params = CouchbaseScriptParams::for_node(
            spec,
            &config.admin_username,
            &config.admin_password,
            peer,
        );
        let request = LaunchRequest {
            image_id: NODE_IMAGE_ID.to_string(),
            instance_type: spec.instance_type.to_string(),
            key_name: config.key_name.clone(),
            security_group_id: group_id.to_string(),
            user_data: script::linux_user_data(&params.render()),
            disks: node::couchbase_disks(spec),
        };
        node::launch_node(self.api.as_ref(), &name, &request).await
    }

    /// Web console address of the seed node.
    pub async fn management_url(&self, results: &[NodeResult]) -> Result<String, ProvisionError> {
        let seed = results.first().ok_or(ProvisionError::NoInstances)?;
        let instance_id = seed
            .instance_id
            .as_deref()
            .ok_or(ProvisionError::NoInstances)?;
        let dns = self
            .api
            .public_dns_name(instance_id)
            .await?
            .ok_or(ProvisionError::NoPublicAddress)?;
        Ok(format!("http://{dns}:{WEB_CONSOLE_PORT}/"))
    }
}
