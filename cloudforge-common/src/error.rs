use thiserror::Error;

/// Closed set of control-plane failure conditions. Provider implementations
/// translate their wire-level error codes into these variants so callers
/// branch on types, never on code strings.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Lookup by name hit the provider's "no such group" condition.
    #[error("security group not found")]
    GroupNotFound,
    #[error("provider call failed: {code}: {message}")]
    Api { code: String, message: String },
    #[error("provider response missing {0}")]
    MissingField(&'static str),
}

/// Orchestration-level failures surfaced by the public entry points.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("security group provisioning failed for {name}")]
    SecurityGroup {
        name: String,
        #[source]
        source: ProviderError,
    },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("no launched instance to inspect")]
    NoInstances,
    #[error("instance has no public address")]
    NoPublicAddress,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),
}
