use cloudforge_common::ProviderError;
use cloudforge_providers::types::{IngressRule, RuleSource};
use cloudforge_providers::Ec2Api;
use tracing::{debug, info};

pub const GROUP_DESCRIPTION: &str = "Managed by cloudforge";

fn world() -> RuleSource {
    RuleSource::Cidr("0.0.0.0/0".to_string())
}

/// Ports from the Couchbase network reference: console, REST, bucket data,
/// Erlang distribution, and SSH. Intra-cluster ports stay on the group itself.
pub fn couchbase_rules() -> Vec<IngressRule> {
    vec![
        // Web console
        IngressRule::tcp(8091, 8091, vec![world(), RuleSource::OwnGroup]),
        // Views / CAPI
        IngressRule::tcp(8092, 8092, vec![world(), RuleSource::OwnGroup]),
        // Bucket data over SSL
        IngressRule::tcp(11207, 11207, vec![world()]),
        // Internal bucket traffic
        IngressRule::tcp(11209, 11209, vec![RuleSource::OwnGroup]),
        // Bucket data
        IngressRule::tcp(11210, 11210, vec![world(), RuleSource::OwnGroup]),
        // Legacy client interface
        IngressRule::tcp(11211, 11211, vec![world()]),
        // SSL proxy, inbound and outbound
        IngressRule::tcp(11214, 11214, vec![world()]),
        IngressRule::tcp(11215, 11215, vec![world()]),
        // REST / CAPI over SSL
        IngressRule::tcp(18091, 18091, vec![world()]),
        IngressRule::tcp(18092, 18092, vec![world()]),
        // Erlang port mapper
        IngressRule::tcp(4369, 4369, vec![RuleSource::OwnGroup]),
        // Node data exchange range
        IngressRule::tcp(21100, 21299, vec![RuleSource::OwnGroup]),
        IngressRule::tcp(22, 22, vec![world()]),
    ]
}

/// RDP plus whatever the caller's boot script serves, all world-open.
pub fn windows_rules(extra_ports: &[i32]) -> Vec<IngressRule> {
    let mut rules = vec![IngressRule::tcp(3389, 3389, vec![world()])];
    for &port in extra_ports {
        rules.push(IngressRule::tcp(port, port, vec![world()]));
    }
    rules
}

/// Get-or-create by name. An existing group is trusted as-is; rules are only
/// authorized on the create path. A group left behind by a failed
/// authorization is not rolled back.
pub async fn ensure_security_group(
    api: &dyn Ec2Api,
    name: &str,
    description: &str,
    rules: &[IngressRule],
) -> Result<String, ProviderError> {
    match api.describe_security_group(name).await {
        Ok(group_id) => {
            debug!(group = name, id = %group_id, "security group already present");
            return Ok(group_id);
        }
        Err(ProviderError::GroupNotFound) => {}
        Err(err) => return Err(err),
    }

    let group_id = api.create_security_group(name, description).await?;
    api.authorize_ingress(&group_id, rules).await?;
    info!(group = name, id = %group_id, rules = rules.len(), "security group created");
    Ok(group_id)
}
