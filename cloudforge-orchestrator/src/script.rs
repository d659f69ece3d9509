//! Boot-script templates. Rendering is pure string assembly so identical
//! parameters always produce the identical command list; the provider only
//! ever sees the encoded payload.

use base64::{engine::general_purpose, Engine as _};
use cloudforge_common::InstanceSpec;

const COUCHBASE_PACKAGE: &str = "couchbase-server-enterprise-4.5.0-centos7.x86_64.rpm";
const COUCHBASE_PACKAGE_URL: &str =
    "http://packages.couchbase.com/releases/4.5.0/couchbase-server-enterprise-4.5.0-centos7.x86_64.rpm";
const CLI: &str = "/opt/couchbase/bin/couchbase-cli";

/// Shell commands as the base64 user-data payload cloud-init executes.
pub fn linux_user_data(commands: &[String]) -> String {
    let mut body = String::from("#!/bin/bash\n");
    body.push_str(&commands.join("\n"));
    general_purpose::STANDARD.encode(body.as_bytes())
}

/// PowerShell user-data; EC2Launch runs the tag-wrapped block on first boot.
pub fn windows_user_data(commands: &[String]) -> String {
    let mut body = String::from("<powershell>\n");
    body.push_str(&commands.join("\n"));
    body.push_str("\n</powershell>");
    general_purpose::STANDARD.encode(body.as_bytes())
}

/// Format and mount the data volume attached by the launch request.
pub fn prepare_data_disk() -> Vec<String> {
    vec![
        "mkfs -t ext4 /dev/xvdb".to_string(),
        "mkdir /data".to_string(),
        "mount /dev/xvdb /data".to_string(),
        "echo \"/dev/xvdb /data ext4 defaults,nofail 0 2\" >> /etc/fstab".to_string(),
    ]
}

/// Data/index RAM quotas in MB. Small machines stay at the 256 MB floor.
pub fn cluster_ram_sizes(memory_gb: f64) -> (u32, u32) {
    if memory_gb > 6.0 {
        ((memory_gb as u32 - 4) * 1000, 2000)
    } else {
        (256, 256)
    }
}

/// Everything that varies between one node's boot script and another's.
#[derive(Clone, Debug)]
pub struct CouchbaseScriptParams {
    pub admin_username: String,
    pub admin_password: String,
    /// Private address of the seed node; `None` renders the seed itself.
    pub peer_address: Option<String>,
    pub data_ram_mb: u32,
    pub index_ram_mb: u32,
    /// EBS-only sizes ship a dedicated data volume that needs formatting first.
    pub prepare_data_disk: bool,
}

impl CouchbaseScriptParams {
    pub fn for_node(
        spec: &InstanceSpec,
        admin_username: &str,
        admin_password: &str,
        peer_address: Option<&str>,
    ) -> Self {
        let (data_ram_mb, index_ram_mb) = cluster_ram_sizes(spec.memory_gb);
        Self {
            admin_username: admin_username.to_string(),
            admin_password: admin_password.to_string(),
            peer_address: peer_address.map(str::to_string),
            data_ram_mb,
            index_ram_mb,
            prepare_data_disk: !spec.local_storage,
        }
    }

    /// The ordered command list for one node. The seed initializes a
    /// standalone cluster; every other node waits for the seed's console,
    /// adds itself and rebalances.
    pub fn render(&self) -> Vec<String> {
        let mut commands = Vec::new();
        if self.prepare_data_disk {
            commands.extend(prepare_data_disk());
        }

        // Couchbase refuses swap and transparent huge pages.
        commands.push("sysctl vm.swappiness=1".to_string());
        commands.push("echo \"vm.swappiness = 1\" >> /etc/sysctl.conf".to_string());
        for knob in ["enabled", "defrag"] {
            commands.push(format!(
                "echo never > /sys/kernel/mm/transparent_hugepage/{knob}"
            ));
            commands.push(format!(
                "echo \"if test -f /sys/kernel/mm/transparent_hugepage/{knob}; then\" >> /etc/rc.local"
            ));
            commands.push(format!(
                "echo \"  echo never > /sys/kernel/mm/transparent_hugepage/{knob}\" >> /etc/rc.local"
            ));
            commands.push("echo \"fi\" >> /etc/rc.local".to_string());
        }

        commands.push(format!("curl -O -s {COUCHBASE_PACKAGE_URL}"));
        commands.push(format!("rpm -i {COUCHBASE_PACKAGE}"));
        commands.push("mkdir /data/couchbase".to_string());
        commands.push("chown couchbase:couchbase /data/couchbase -R".to_string());
        commands.push("yum install -y openssl098e".to_string());
        commands.push("service couchbase-server start".to_string());
        commands.extend(wait_for_console("localhost"));

        // The server ships with default credentials until cluster-init runs.
        commands.push(format!(
            "{CLI} node-init -c localhost:8091 -u Administrator -p password --node-init-data-path=/data/couchbase"
        ));

        match &self.peer_address {
            None => {
                commands.push(format!(
                    "{CLI} cluster-init -c localhost --cluster-username={} --cluster-password={} --cluster-ramsize={} --cluster-index-ramsize={} --services=data,index",
                    self.admin_username, self.admin_password, self.data_ram_mb, self.index_ram_mb
                ));
            }
            Some(peer) => {
                commands.extend(wait_for_console(peer));
                commands.push(
                    "serverip=`/sbin/ifconfig eth0 | grep \"inet\" | awk '{print $2}' | awk 'NR==1' | cut -d':' -f2`"
                        .to_string(),
                );
                commands.push(format!(
                    "{CLI} server-add -c {peer} -u {} -p {} --server-add=$serverip --server-add-username=Administrator --server-add-password=password --services=data,index",
                    self.admin_username, self.admin_password
                ));
                commands.push(format!(
                    "{CLI} rebalance -c {peer} -u {} -p {}",
                    self.admin_username, self.admin_password
                ));
            }
        }

        commands
    }
}

/// 5s-interval wait until the web console answers. Runs on the instance
/// itself; the orchestrator never blocks on node health.
fn wait_for_console(host: &str) -> Vec<String> {
    vec![
        format!("until $(curl --output /dev/null --silent --head --fail http://{host}:8091); do"),
        "  printf '.'".to_string(),
        "  sleep 5".to_string(),
        "done".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(peer: Option<&str>) -> CouchbaseScriptParams {
        CouchbaseScriptParams {
            admin_username: "admin".to_string(),
            admin_password: "secret".to_string(),
            peer_address: peer.map(str::to_string),
            data_ram_mb: 6000,
            index_ram_mb: 2000,
            prepare_data_disk: true,
        }
    }

    #[test]
    fn ram_sizes_floor_at_256() {
        assert_eq!(cluster_ram_sizes(4.0), (256, 256));
        assert_eq!(cluster_ram_sizes(6.0), (256, 256));
    }

    #[test]
    fn ram_sizes_scale_above_six_gigabytes() {
        assert_eq!(cluster_ram_sizes(10.0), (6000, 2000));
        assert_eq!(cluster_ram_sizes(7.5), (3000, 2000));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(params(None).render(), params(None).render());
        assert_eq!(
            params(Some("10.0.0.10")).render(),
            params(Some("10.0.0.10")).render()
        );
    }

    #[test]
    fn seed_script_initializes_a_standalone_cluster() {
        let commands = params(None).render();
        let joined = commands.join("\n");
        assert!(joined.contains("cluster-init"));
        assert!(joined.contains("--cluster-ramsize=6000"));
        assert!(joined.contains("--cluster-index-ramsize=2000"));
        assert!(!joined.contains("server-add"));
        assert!(!joined.contains("rebalance"));
    }

    #[test]
    fn follower_script_joins_the_seed() {
        let commands = params(Some("10.0.0.10")).render();
        let joined = commands.join("\n");
        assert!(joined.contains("http://10.0.0.10:8091"));
        assert!(!joined.contains("cluster-init"));
        let server_adds = commands.iter().filter(|c| c.contains("server-add -c")).count();
        let rebalances = commands.iter().filter(|c| c.contains("rebalance -c")).count();
        assert_eq!(server_adds, 1);
        assert_eq!(rebalances, 1);
    }

    #[test]
    fn swap_and_huge_pages_are_disabled_unconditionally() {
        for peer in [None, Some("10.0.0.10")] {
            let joined = params(peer).render().join("\n");
            assert!(joined.contains("sysctl vm.swappiness=1"));
            assert!(joined.contains("echo never > /sys/kernel/mm/transparent_hugepage/enabled"));
            assert!(joined.contains("echo never > /sys/kernel/mm/transparent_hugepage/defrag"));
            assert!(joined.contains("/etc/rc.local"));
        }
    }

    #[test]
    fn data_disk_preparation_is_skipped_for_local_storage() {
        let mut p = params(None);
        p.prepare_data_disk = false;
        let joined = p.render().join("\n");
        assert!(!joined.contains("mkfs"));
        assert!(joined.contains("mkdir /data/couchbase"));
    }

    #[test]
    fn linux_user_data_wraps_commands_in_a_shell_script() {
        let payload = linux_user_data(&["echo one".to_string(), "echo two".to_string()]);
        let decoded = general_purpose::STANDARD.decode(payload).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "#!/bin/bash\necho one\necho two"
        );
    }

    #[test]
    fn windows_user_data_wraps_commands_in_powershell_tags() {
        let payload = windows_user_data(&["Install-WindowsFeature Web-Server".to_string()]);
        let decoded = general_purpose::STANDARD.decode(payload).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            "<powershell>\nInstall-WindowsFeature Web-Server\n</powershell>"
        );
    }
}
