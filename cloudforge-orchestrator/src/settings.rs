use std::env;
use std::fs;

use cloudforge_common::{AccessCredential, SettingsError};
use cloudforge_providers::aws::AwsEc2Client;

pub const DEFAULT_REGION: &str = "eu-west-1";

/// Build the real client from the environment (`.env` honoured). The secret
/// can come from an `AWS_SECRET_ACCESS_KEY_FILE` mount, matching container
/// secret conventions.
pub fn client_from_env() -> Result<AwsEc2Client, SettingsError> {
    dotenv::dotenv().ok();
    let access_key_id = require_var("AWS_ACCESS_KEY_ID")?;
    let secret_key = var_or_file("AWS_SECRET_ACCESS_KEY")?;
    let region = env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string());
    let credential = AccessCredential {
        access_key_id,
        secret_key,
    };
    Ok(AwsEc2Client::new(&credential, &region))
}

fn require_var(name: &'static str) -> Result<String, SettingsError> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(SettingsError::MissingVar(name))
}

fn var_or_file(name: &'static str) -> Result<String, SettingsError> {
    if let Ok(path) = env::var(format!("{name}_FILE")) {
        if let Ok(contents) = fs::read_to_string(path.trim()) {
            let contents = contents.trim().to_string();
            if !contents.is_empty() {
                return Ok(contents);
            }
        }
    }
    require_var(name)
}
