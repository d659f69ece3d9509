use cloudforge_common::{InstanceSpec, NodeResult};
use cloudforge_providers::types::{DiskKind, DiskSpec, LaunchRequest};
use cloudforge_providers::Ec2Api;
use tracing::{info, warn};

pub const SYSTEM_DEVICE: &str = "/dev/sda1";
pub const DATA_DEVICE: &str = "/dev/sdb";
const DATA_DISK_IOPS: i32 = 100;

/// System + data volumes for an EBS-only machine; the data volume scales
/// with memory so the node can persist its bucket quota. Instance-store
/// sizes boot with their own disks and get none.
pub fn couchbase_disks(spec: &InstanceSpec) -> Vec<DiskSpec> {
    if spec.local_storage {
        return Vec::new();
    }
    vec![
        DiskSpec {
            device_name: SYSTEM_DEVICE,
            size_gb: 12,
            kind: DiskKind::GeneralPurpose,
        },
        DiskSpec {
            device_name: DATA_DEVICE,
            size_gb: (spec.memory_gb * 2.0).ceil() as i32,
            kind: DiskKind::ProvisionedIops {
                iops: DATA_DISK_IOPS,
            },
        },
    ]
}

pub fn windows_disks(spec: &InstanceSpec) -> Vec<DiskSpec> {
    if spec.local_storage {
        return Vec::new();
    }
    vec![DiskSpec {
        device_name: SYSTEM_DEVICE,
        size_gb: 30,
        kind: DiskKind::GeneralPurpose,
    }]
}

/// Launch one instance and tag it with its name. Tagging is best-effort;
/// the result tracks only the launch call itself.
pub async fn launch_node(api: &dyn Ec2Api, name: &str, request: &LaunchRequest) -> NodeResult {
    match api.run_instance(request).await {
        Ok(instance) => {
            if let Err(err) = api
                .tag_instance(
                    &instance.instance_id,
                    &[("Name".to_string(), name.to_string())],
                )
                .await
            {
                warn!(node = name, error = %err, "tagging failed");
            }
            info!(node = name, instance_id = %instance.instance_id, "node launched");
            NodeResult {
                name: name.to_string(),
                instance_id: Some(instance.instance_id),
                private_ip: instance.private_ip,
                success: true,
            }
        }
        Err(err) => {
            warn!(node = name, error = %err, "launch failed");
            NodeResult::failed(name)
        }
    }
}
