use std::time::Duration;
use serde::Deserialize;
use discovery::format::HTTP_URL_TEMPLATE;
use discovery::{Discovery, Network};
use crate::{CancelHandle, ConfigError, KeyValueConfig, ETCD_PORT_NAME, ETCD_SERVICE};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EtcdSettings {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    5000
}

impl Default for EtcdSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Client for the etcd v2 keys API.
#[derive(Debug, Clone)]
pub struct EtcdV2Config {
    client: reqwest::Client,
    endpoints: Vec<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct KeysResponse {
    node: Node,
}

#[derive(Deserialize)]
struct Node {
    /// Absent for directories
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct EtcdErrorBody {
    #[serde(rename = "errorCode")]
    error_code: u64,
    message: String,
}

impl EtcdV2Config {
    /// Finds etcd's client endpoints through `discovery` and connects to them.
    pub async fn discover(discovery: &Discovery, settings: EtcdSettings) -> Result<Self, ConfigError> {
        let endpoints = discovery
            .discover_formatted(ETCD_SERVICE, ETCD_PORT_NAME, Network::Tcp, HTTP_URL_TEMPLATE)
            .await?;

        tracing::info!("Discovered etcd endpoints: {}", endpoints.join(", "));
        Self::with_endpoints(endpoints, settings)
    }

    /// Endpoints are base URLs such as `http://10.0.0.5:2379`, tried in order.
    pub fn with_endpoints(endpoints: Vec<String>, settings: EtcdSettings) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let client = reqwest::Client::builder()
            .build()
            .map_err(ConfigError::Client)?;

        Ok(Self {
            client,
            endpoints,
            timeout: Duration::from_millis(settings.request_timeout_ms),
        })
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn read_node(&self, key: &str, response: reqwest::Response) -> Result<String, ConfigError> {
        let status = response.status();
        let body = response.bytes().await.map_err(|source| ConfigError::Transport {
            key: key.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<EtcdErrorBody>(&body) {
                Ok(error) => ConfigError::Etcd {
                    key: key.to_string(),
                    code: error.error_code,
                    message: error.message,
                },
                Err(_) => ConfigError::Status {
                    key: key.to_string(),
                    status,
                },
            });
        }

        let response: KeysResponse = serde_json::from_slice(&body).map_err(|source| ConfigError::Decode {
            key: key.to_string(),
            source,
        })?;
        Ok(response.node.value.unwrap_or_default())
    }
}

fn keys_url(endpoint: &str, key: &str) -> String {
    format!(
        "{}/v2/keys/{}",
        endpoint.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

impl KeyValueConfig for EtcdV2Config {
    async fn get(&self, key: &str) -> Result<String, ConfigError> {
        let mut last_error = None;

        // Endpoints that can't be reached are skipped, the first answer wins
        for endpoint in &self.endpoints {
            let url = keys_url(endpoint, key);
            match self.client.get(&url).timeout(self.timeout).send().await {
                Ok(response) => return self.read_node(key, response).await,
                Err(e) => {
                    tracing::warn!("etcd endpoint {} failed: {}", endpoint, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(source) => Err(ConfigError::Transport {
                key: key.to_string(),
                source,
            }),
            None => Err(ConfigError::NoEndpoints),
        }
    }

    fn watch<F>(&self, prefix: &str, _callback: F) -> Result<CancelHandle, ConfigError>
    where
        F: Fn(&str, &[u8]) -> Result<(), ConfigError> + Send + 'static,
    {
        // TODO: long-poll `?wait=true&recursive=true` on the prefix and feed the callback
        tracing::debug!("watch on '{}' is not implemented", prefix);
        Ok(CancelHandle::default())
    }
}
