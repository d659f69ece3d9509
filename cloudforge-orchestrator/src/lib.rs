pub mod couchbase;
pub mod firewall;
pub mod image;
pub mod node;
pub mod script;
pub mod windows;

#[cfg(feature = "provider-aws")]
pub mod settings;

pub use couchbase::CouchbaseCluster;
pub use windows::WindowsServer;
