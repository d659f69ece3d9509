use async_trait::async_trait;
use cloudforge_common::ProviderError;

/// The slice of the EC2 control plane the orchestrators consume. Exactly one
/// region/account per client instance; implementations are `Send + Sync` but
/// the orchestrators drive them strictly sequentially.
#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Resolve an existing security group by exact name.
    /// `Err(ProviderError::GroupNotFound)` is the ordinary miss condition.
    async fn describe_security_group(&self, name: &str) -> Result<String, ProviderError>;

    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, ProviderError>;

    /// Submit the full rule set in one ingress-authorization call.
    /// `RuleSource::OwnGroup` entries resolve to `group_id` itself.
    async fn authorize_ingress(
        &self,
        group_id: &str,
        rules: &[types::IngressRule],
    ) -> Result<(), ProviderError>;

    async fn describe_images(
        &self,
        query: &types::ImageQuery,
    ) -> Result<Vec<types::ImageDescriptor>, ProviderError>;

    /// Launch exactly one instance.
    async fn run_instance(
        &self,
        request: &types::LaunchRequest,
    ) -> Result<types::LaunchedInstance, ProviderError>;

    async fn tag_instance(
        &self,
        instance_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError>;

    async fn public_dns_name(&self, instance_id: &str) -> Result<Option<String>, ProviderError>;
}

pub mod types {
    /// Where an ingress rule accepts traffic from.
    #[derive(Clone, Debug, PartialEq)]
    pub enum RuleSource {
        Cidr(String),
        /// The group the rule set is being authorized on; resolved at submit time.
        OwnGroup,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct IngressRule {
        pub protocol: &'static str,
        pub from_port: i32,
        pub to_port: i32,
        pub sources: Vec<RuleSource>,
    }

    impl IngressRule {
        pub fn tcp(from_port: i32, to_port: i32, sources: Vec<RuleSource>) -> Self {
            Self {
                protocol: "tcp",
                from_port,
                to_port,
                sources,
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum DiskKind {
        GeneralPurpose,
        ProvisionedIops { iops: i32 },
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct DiskSpec {
        pub device_name: &'static str,
        pub size_gb: i32,
        pub kind: DiskKind,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct LaunchRequest {
        pub image_id: String,
        pub instance_type: String,
        pub key_name: String,
        pub security_group_id: String,
        /// Base64 payload the instance executes on first boot.
        pub user_data: String,
        pub disks: Vec<DiskSpec>,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct LaunchedInstance {
        pub instance_id: String,
        pub private_ip: Option<String>,
    }

    /// Catalog filter: owner, platform and a trailing-wildcard name pattern.
    #[derive(Clone, Debug, PartialEq)]
    pub struct ImageQuery {
        pub owner_id: &'static str,
        pub platform: &'static str,
        pub name_pattern: &'static str,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct ImageDescriptor {
        pub image_id: String,
        pub name: String,
        pub creation_date: String,
    }
}

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "aws")]
pub mod aws;
