use async_trait::async_trait;
use aws_sdk_ec2::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{
    BlockDeviceMapping, EbsBlockDevice, Filter, InstanceType, IpPermission, IpRange, Tag,
    UserIdGroupPair, VolumeType,
};
use aws_sdk_ec2::Client;
use cloudforge_common::{AccessCredential, ProviderError};
use tracing::debug;

use crate::types::{
    DiskKind, ImageDescriptor, ImageQuery, IngressRule, LaunchRequest, LaunchedInstance,
    RuleSource,
};
use crate::Ec2Api;

/// Real control-plane client. One region and one set of static credentials
/// per instance, owned exclusively by its orchestrator.
pub struct AwsEc2Client {
    client: Client,
}

impl AwsEc2Client {
    pub fn new(credential: &AccessCredential, region: &str) -> Self {
        let credentials = Credentials::new(
            credential.access_key_id.clone(),
            credential.secret_key.clone(),
            None,
            None,
            "cloudforge",
        );
        let config = aws_sdk_ec2::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .build();
        Self {
            client: Client::from_conf(config),
        }
    }
}

/// The only place wire-level error codes are inspected. Everything above the
/// trait sees `ProviderError` variants.
fn provider_error<E, R>(err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
    R: std::fmt::Debug,
{
    let code = err.code().unwrap_or("unknown").to_string();
    if code == "InvalidGroup.NotFound" {
        return ProviderError::GroupNotFound;
    }
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{err:?}"));
    ProviderError::Api { code, message }
}

#[async_trait]
impl Ec2Api for AwsEc2Client {
    async fn describe_security_group(&self, name: &str) -> Result<String, ProviderError> {
        debug!(group = name, "describe security group");
        let out = self
            .client
            .describe_security_groups()
            .group_names(name)
            .send()
            .await
            .map_err(provider_error)?;
        out.security_groups()
            .first()
            .and_then(|group| group.group_id())
            .map(str::to_string)
            .ok_or(ProviderError::MissingField("security group id"))
    }

    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, ProviderError> {
        debug!(group = name, "create security group");
        let out = self
            .client
            .create_security_group()
            .group_name(name)
            .description(description)
            .send()
            .await
            .map_err(provider_error)?;
        out.group_id()
            .map(str::to_string)
            .ok_or(ProviderError::MissingField("security group id"))
    }

    async fn authorize_ingress(
        &self,
        group_id: &str,
        rules: &[IngressRule],
    ) -> Result<(), ProviderError> {
        debug!(group = group_id, rules = rules.len(), "authorize ingress");
        let mut permissions = Vec::with_capacity(rules.len());
        for rule in rules {
            let mut permission = IpPermission::builder()
                .ip_protocol(rule.protocol)
                .from_port(rule.from_port)
                .to_port(rule.to_port);
            for source in &rule.sources {
                permission = match source {
                    RuleSource::Cidr(cidr) => {
                        permission.ip_ranges(IpRange::builder().cidr_ip(cidr).build())
                    }
                    RuleSource::OwnGroup => permission.user_id_group_pairs(
                        UserIdGroupPair::builder().group_id(group_id).build(),
                    ),
                };
            }
            permissions.push(permission.build());
        }
        self.client
            .authorize_security_group_ingress()
            .group_id(group_id)
            .set_ip_permissions(Some(permissions))
            .send()
            .await
            .map_err(provider_error)?;
        Ok(())
    }

    async fn describe_images(
        &self,
        query: &ImageQuery,
    ) -> Result<Vec<ImageDescriptor>, ProviderError> {
        debug!(pattern = query.name_pattern, "describe images");
        let out = self
            .client
            .describe_images()
            .filters(Filter::builder().name("owner-id").values(query.owner_id).build())
            .filters(Filter::builder().name("platform").values(query.platform).build())
            .filters(Filter::builder().name("name").values(query.name_pattern).build())
            .send()
            .await
            .map_err(provider_error)?;
        Ok(out
            .images()
            .iter()
            .filter_map(|image| {
                let image_id = image.image_id()?.to_string();
                Some(ImageDescriptor {
                    image_id,
                    name: image.name().unwrap_or_default().to_string(),
                    creation_date: image.creation_date().unwrap_or_default().to_string(),
                })
            })
            .collect())
    }

    async fn run_instance(
        &self,
        request: &LaunchRequest,
    ) -> Result<LaunchedInstance, ProviderError> {
        debug!(
            image = %request.image_id,
            instance_type = %request.instance_type,
            "run instance"
        );
        let mut launch = self
            .client
            .run_instances()
            .image_id(&request.image_id)
            .instance_type(InstanceType::from(request.instance_type.as_str()))
            .min_count(1)
            .max_count(1)
            .key_name(&request.key_name)
            .security_group_ids(&request.security_group_id)
            .user_data(&request.user_data)
            .client_token(uuid::Uuid::new_v4().to_string());
        for disk in &request.disks {
            let mut ebs = EbsBlockDevice::builder()
                .delete_on_termination(true)
                .volume_size(disk.size_gb);
            ebs = match disk.kind {
                DiskKind::GeneralPurpose => ebs.volume_type(VolumeType::Gp2),
                DiskKind::ProvisionedIops { iops } => ebs.volume_type(VolumeType::Io1).iops(iops),
            };
            launch = launch.block_device_mappings(
                BlockDeviceMapping::builder()
                    .device_name(disk.device_name)
                    .ebs(ebs.build())
                    .build(),
            );
        }
        let out = launch.send().await.map_err(provider_error)?;
        let instance = out
            .instances()
            .first()
            .ok_or(ProviderError::MissingField("instance"))?;
        let instance_id = instance
            .instance_id()
            .ok_or(ProviderError::MissingField("instance id"))?
            .to_string();
        let private_ip = instance.private_ip_address().map(str::to_string);
        debug!(instance_id = %instance_id, "instance launched");
        Ok(LaunchedInstance {
            instance_id,
            private_ip,
        })
    }

    async fn tag_instance(
        &self,
        instance_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError> {
        let mut call = self.client.create_tags().resources(instance_id);
        for (key, value) in tags {
            call = call.tags(Tag::builder().key(key).value(value).build());
        }
        call.send().await.map_err(provider_error)?;
        Ok(())
    }

    async fn public_dns_name(&self, instance_id: &str) -> Result<Option<String>, ProviderError> {
        let out = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(provider_error)?;
        Ok(out
            .reservations()
            .first()
            .and_then(|reservation| reservation.instances().first())
            .and_then(|instance| instance.public_dns_name())
            .filter(|dns| !dns.is_empty())
            .map(str::to_string))
    }
}
