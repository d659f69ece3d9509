use serde::{Deserialize, Serialize};

/// EC2 machine sizes this crate knows how to launch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineSize {
    T2Micro,
    T2Small,
    T2Medium,
    T2Large,
    M4Large,
    M4Xlarge,
    M42xlarge,
    C4Large,
    C4Xlarge,
    R3Large,
    R3Xlarge,
    I2Xlarge,
    D2Xlarge,
}

/// Provider metadata for one machine size.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceSpec {
    pub instance_type: &'static str,
    pub memory_gb: f64,
    /// Instance-store sizes boot with local disks; EBS-only sizes need explicit volumes.
    pub local_storage: bool,
}

impl MachineSize {
    pub fn spec(self) -> InstanceSpec {
        match self {
            MachineSize::T2Micro => spec("t2.micro", 1.0, false),
            MachineSize::T2Small => spec("t2.small", 2.0, false),
            MachineSize::T2Medium => spec("t2.medium", 4.0, false),
            MachineSize::T2Large => spec("t2.large", 8.0, false),
            MachineSize::M4Large => spec("m4.large", 8.0, false),
            MachineSize::M4Xlarge => spec("m4.xlarge", 16.0, false),
            MachineSize::M42xlarge => spec("m4.2xlarge", 32.0, false),
            MachineSize::C4Large => spec("c4.large", 3.75, false),
            MachineSize::C4Xlarge => spec("c4.xlarge", 7.5, false),
            MachineSize::R3Large => spec("r3.large", 15.25, true),
            MachineSize::R3Xlarge => spec("r3.xlarge", 30.5, true),
            MachineSize::I2Xlarge => spec("i2.xlarge", 30.5, true),
            MachineSize::D2Xlarge => spec("d2.xlarge", 30.5, true),
        }
    }
}

fn spec(instance_type: &'static str, memory_gb: f64, local_storage: bool) -> InstanceSpec {
    InstanceSpec {
        instance_type,
        memory_gb,
        local_storage,
    }
}
