//! Key/value configuration read from the cluster's etcd, which is itself
//! found through SRV discovery.

mod etcd;

use std::future::Future;
use discovery::DiscoveryError;

pub use etcd::{EtcdSettings, EtcdV2Config};

/// Service and port name etcd is registered under
pub const ETCD_SERVICE: &str = "etcd";
pub const ETCD_PORT_NAME: &str = "client";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("while discovering etcd endpoints")]
    Discovery(#[from] DiscoveryError),

    #[error("no etcd endpoints to connect to")]
    NoEndpoints,

    #[error("while instantiating etcd client")]
    Client(#[source] reqwest::Error),

    #[error("during etcd GET on '{key}'")]
    Transport {
        key: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("during etcd GET on '{key}': {message} (code {code})")]
    Etcd {
        key: String,
        code: u64,
        message: String,
    },

    #[error("during etcd GET on '{key}': unexpected status {status}")]
    Status {
        key: String,
        status: reqwest::StatusCode,
    },

    #[error("during etcd GET on '{key}': malformed response")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Returned by [`KeyValueConfig::watch`]. Cancelling stops the watch.
#[derive(Debug, Default)]
pub struct CancelHandle {
    _private: (),
}

impl CancelHandle {
    pub fn cancel(self) {}
}

pub trait KeyValueConfig: Send + Sync {
    /// Value stored under `key`
    fn get(&self, key: &str) -> impl Future<Output = Result<String, ConfigError>> + Send;

    /// Stores the value of `key` in `dest`. When the read fails `dest` gets
    /// `default` and the error is still returned.
    fn string(
        &self,
        key: &str,
        dest: &mut String,
        default: &str,
    ) -> impl Future<Output = Result<(), ConfigError>> + Send {
        async move {
            match self.get(key).await {
                Ok(value) => {
                    *dest = value;
                    Ok(())
                }
                Err(e) => {
                    *dest = default.to_string();
                    Err(e)
                }
            }
        }
    }

    /// Calls `callback` with every change below `prefix`.
    fn watch<F>(&self, prefix: &str, callback: F) -> Result<CancelHandle, ConfigError>
    where
        F: Fn(&str, &[u8]) -> Result<(), ConfigError> + Send + 'static;
}
