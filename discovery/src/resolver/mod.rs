//! SRV lookup strategies.
//!
//! Both strategies answer the same question (which endpoints serve a named
//! port of a cluster service) and differ only in which resolver they trust.

pub mod direct;
pub mod native;
pub(crate) mod hickory;

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use serde::Deserialize;
use shared::protocol::{srv_name, DEFAULT_PORT_NAME};
use shared::types::{Endpoint, Network};
use crate::config::DiscoveryConfig;
use crate::error::Result;

pub use direct::DirectLookup;
pub use native::NativeLookup;

/// Which resolver answers SRV queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// The host's configured resolver
    Native,
    /// A raw query sent straight to the cluster DNS service
    Direct,
}

impl Strategy {
    /// The SRV path of the host resolver on macOS skips `/etc/resolver/*`,
    /// which is where local clusters install their DNS override.
    pub fn for_platform() -> Self {
        if cfg!(target_os = "macos") {
            Strategy::Direct
        } else {
            Strategy::Native
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Native => f.write_str("native"),
            Strategy::Direct => f.write_str("direct"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(Strategy::Native),
            "direct" => Ok(Strategy::Direct),
            _ => Err(format!("unknown strategy '{}', expected 'native' or 'direct'", s)),
        }
    }
}

/// One SRV question, carrying the parameters every answer is stamped with.
#[derive(Debug, Clone)]
pub struct SrvQuery {
    service: String,
    port_name: String,
    network: Network,
    name: String,
}

impl SrvQuery {
    /// An empty `port_name` means [`DEFAULT_PORT_NAME`].
    pub fn new(service: &str, port_name: &str, network: Network, config: &DiscoveryConfig) -> Self {
        let port_name = if port_name.is_empty() { DEFAULT_PORT_NAME } else { port_name };
        let name = srv_name(port_name, network.as_str(), &config.service_fqdn(service));
        Self {
            service: service.to_string(),
            port_name: port_name.to_string(),
            network,
            name,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// The full query name, e.g. `_client._tcp.etcd.default.svc.cluster.local.`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Turns raw `(target, port)` answers into endpoints, in answer order.
    pub(crate) fn endpoints<I>(&self, answers: I) -> Vec<Endpoint>
    where
        I: IntoIterator<Item = (String, u16)>,
    {
        answers
            .into_iter()
            .filter_map(|(target, port)| {
                if port == 0 {
                    tracing::warn!(query = %self.name, %target, "skipping SRV answer with port 0");
                    return None;
                }
                Some(Endpoint::new(
                    self.service.as_str(),
                    self.port_name.as_str(),
                    self.network,
                    &target,
                    port,
                ))
            })
            .collect()
    }
}

/// A way of answering SRV queries.
pub trait SrvLookup: Send + Sync {
    fn lookup_srv(&self, query: &SrvQuery) -> impl Future<Output = Result<Vec<Endpoint>>> + Send;
}
