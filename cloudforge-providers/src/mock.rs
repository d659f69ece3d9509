use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cloudforge_common::ProviderError;

use crate::types::{
    ImageDescriptor, ImageQuery, IngressRule, LaunchRequest, LaunchedInstance,
};
use crate::Ec2Api;

/// Everything the mock saw, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCall {
    DescribeSecurityGroup { name: String },
    CreateSecurityGroup { name: String, description: String },
    AuthorizeIngress { group_id: String, rules: Vec<IngressRule> },
    DescribeImages { query: ImageQuery },
    RunInstance { request: LaunchRequest },
    TagInstance { instance_id: String, tags: Vec<(String, String)> },
    PublicDnsName { instance_id: String },
}

#[derive(Default)]
pub struct MockState {
    /// Pre-existing groups by name; `create_security_group` adds to this.
    pub groups: HashMap<String, String>,
    /// Catalog fixtures; `describe_images` filters them by name pattern.
    pub images: Vec<ImageDescriptor>,
    pub dns_names: HashMap<String, String>,
    pub fail_describe_groups: bool,
    pub fail_launches: bool,
    pub fail_tags: bool,
    pub calls: Vec<RecordedCall>,
    created_groups: u32,
    launched: u32,
}

/// In-memory stand-in for the control plane. Launched instances get
/// sequential ids and private addresses so tests can follow the seed
/// address through follower boot scripts.
#[derive(Default)]
pub struct MockEc2 {
    pub state: Mutex<MockState>,
}

impl MockEc2 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn launch_requests(&self) -> Vec<LaunchRequest> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::RunInstance { request } => Some(request.clone()),
                _ => None,
            })
            .collect()
    }
}

fn api_error(code: &str) -> ProviderError {
    ProviderError::Api {
        code: code.to_string(),
        message: format!("mock failure: {code}"),
    }
}

#[async_trait]
impl Ec2Api for MockEc2 {
    async fn describe_security_group(&self, name: &str) -> Result<String, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::DescribeSecurityGroup {
            name: name.to_string(),
        });
        if state.fail_describe_groups {
            return Err(api_error("AuthFailure"));
        }
        state
            .groups
            .get(name)
            .cloned()
            .ok_or(ProviderError::GroupNotFound)
    }

    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::CreateSecurityGroup {
            name: name.to_string(),
            description: description.to_string(),
        });
        state.created_groups += 1;
        let group_id = format!("sg-mock{:04}", state.created_groups);
        state.groups.insert(name.to_string(), group_id.clone());
        Ok(group_id)
    }

    async fn authorize_ingress(
        &self,
        group_id: &str,
        rules: &[IngressRule],
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::AuthorizeIngress {
            group_id: group_id.to_string(),
            rules: rules.to_vec(),
        });
        Ok(())
    }

    async fn describe_images(
        &self,
        query: &ImageQuery,
    ) -> Result<Vec<ImageDescriptor>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::DescribeImages {
            query: query.clone(),
        });
        let prefix = query.name_pattern.trim_end_matches('*');
        Ok(state
            .images
            .iter()
            .filter(|image| image.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn run_instance(
        &self,
        request: &LaunchRequest,
    ) -> Result<LaunchedInstance, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::RunInstance {
            request: request.clone(),
        });
        if state.fail_launches {
            return Err(api_error("InsufficientInstanceCapacity"));
        }
        state.launched += 1;
        Ok(LaunchedInstance {
            instance_id: format!("i-mock{:08}", state.launched),
            private_ip: Some(format!("10.0.0.{}", 9 + state.launched)),
        })
    }

    async fn tag_instance(
        &self,
        instance_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::TagInstance {
            instance_id: instance_id.to_string(),
            tags: tags.to_vec(),
        });
        if state.fail_tags {
            return Err(api_error("TagLimitExceeded"));
        }
        Ok(())
    }

    async fn public_dns_name(&self, instance_id: &str) -> Result<Option<String>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RecordedCall::PublicDnsName {
            instance_id: instance_id.to_string(),
        });
        Ok(state.dns_names.get(instance_id).cloned())
    }
}
