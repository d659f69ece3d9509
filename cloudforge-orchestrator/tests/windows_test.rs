// Windows single-node provisioning against the recording mock provider.

mod common;

use std::sync::Arc;

use cloudforge_common::{MachineSize, WindowsVersion};
use cloudforge_orchestrator::windows::{BootCommands, WindowsServer};
use cloudforge_providers::mock::{MockEc2, RecordedCall};
use cloudforge_providers::types::{DiskKind, ImageDescriptor};

use common::{decode_user_data, init_tracing};

struct WebRole;

impl BootCommands for WebRole {
    fn commands(&self) -> Vec<String> {
        vec![
            "Install-WindowsFeature Web-Server".to_string(),
            "New-Item -ItemType Directory -Path C:\\inetpub\\app".to_string(),
        ]
    }
}

fn catalog_image(image_id: &str, name: &str, creation_date: &str) -> ImageDescriptor {
    ImageDescriptor {
        image_id: image_id.to_string(),
        name: name.to_string(),
        creation_date: creation_date.to_string(),
    }
}

fn seeded_mock() -> Arc<MockEc2> {
    let mock = Arc::new(MockEc2::new());
    mock.state.lock().unwrap().images = vec![
        catalog_image(
            "ami-2016-old",
            "Windows_Server-2016-English-Full-Base-2016.12.24",
            "2016-12-24T10:00:00.000Z",
        ),
        catalog_image(
            "ami-2016-new",
            "Windows_Server-2016-English-Full-Base-2017.01.04",
            "2017-01-04T10:00:00.000Z",
        ),
        catalog_image(
            "ami-2012",
            "Windows_Server-2012-R2_RTM-English-64Bit-Base-2017.01.04",
            "2017-01-04T10:00:00.000Z",
        ),
    ];
    mock
}

#[tokio::test]
async fn latest_image_wins_by_creation_date() {
    init_tracing();
    let mock = seeded_mock();
    let server = WindowsServer::with_api(mock.clone());

    let image = server.resolve_image(WindowsVersion::Server2016).await.unwrap();
    assert_eq!(image.as_deref(), Some("ami-2016-new"));

    let image = server
        .resolve_image(WindowsVersion::Server2012R2)
        .await
        .unwrap();
    assert_eq!(image.as_deref(), Some("ami-2012"));
}

#[tokio::test]
async fn empty_catalog_resolves_to_none_and_skips_the_launch() {
    init_tracing();
    let mock = Arc::new(MockEc2::new());
    let server = WindowsServer::with_api(mock.clone());

    let group_id = server.ensure_security_group("staging.web", &[]).await.unwrap();
    let result = server
        .install(
            MachineSize::M4Large,
            "web0",
            &group_id,
            "ops-key",
            &WebRole,
            WindowsVersion::Server2016,
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.instance_id.is_none());
    assert!(mock.launch_requests().is_empty());
}

#[tokio::test]
async fn security_group_opens_rdp_plus_extra_ports() {
    init_tracing();
    let mock = Arc::new(MockEc2::new());
    let server = WindowsServer::with_api(mock.clone());

    server
        .ensure_security_group("staging.web", &[80, 443])
        .await
        .unwrap();

    let authorized: Vec<_> = mock
        .calls()
        .iter()
        .filter_map(|call| match call {
            RecordedCall::AuthorizeIngress { rules, .. } => Some(rules.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(authorized.len(), 1);
    let ports: Vec<i32> = authorized[0].iter().map(|rule| rule.from_port).collect();
    assert_eq!(ports, vec![3389, 80, 443]);
}

#[tokio::test]
async fn install_launches_a_tagged_server() {
    init_tracing();
    let mock = seeded_mock();
    let server = WindowsServer::with_api(mock.clone());

    let group_id = server
        .ensure_security_group("staging.web", &[80])
        .await
        .unwrap();
    let result = server
        .install(
            MachineSize::M4Large,
            "web0",
            &group_id,
            "ops-key",
            &WebRole,
            WindowsVersion::Server2016,
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.name, "web0");
    assert!(result.instance_id.is_some());

    let launches = mock.launch_requests();
    assert_eq!(launches.len(), 1);
    let launch = &launches[0];
    assert_eq!(launch.image_id, "ami-2016-new");
    assert_eq!(launch.instance_type, "m4.large");
    assert_eq!(launch.key_name, "ops-key");
    assert_eq!(launch.security_group_id, group_id);
    assert_eq!(launch.disks.len(), 1);
    assert_eq!(launch.disks[0].size_gb, 30);
    assert_eq!(launch.disks[0].kind, DiskKind::GeneralPurpose);

    let script = decode_user_data(&launch.user_data);
    assert_eq!(
        script,
        "<powershell>\nInstall-WindowsFeature Web-Server\nNew-Item -ItemType Directory -Path C:\\inetpub\\app\n</powershell>"
    );

    let tagged = mock.calls().iter().any(|call| {
        matches!(
            call,
            RecordedCall::TagInstance { tags, .. }
                if tags == &vec![("Name".to_string(), "web0".to_string())]
        )
    });
    assert!(tagged);
}
