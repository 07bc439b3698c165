use std::net::SocketAddr;
use std::time::Duration;
use hickory_proto::op::ResponseCode;
use tokio::net::lookup_host;
use shared::types::Endpoint;
use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, Result};
use crate::resolver::{hickory, SrvLookup, SrvQuery};

/// Queries the cluster DNS service directly, bypassing the host resolver.
///
/// The DNS service's own address is found through ordinary host resolution
/// first. Only the first address is queried, once.
#[derive(Debug, Clone)]
pub struct DirectLookup {
    bootstrap_host: String,
    port: u16,
    timeout: Duration,
}

impl DirectLookup {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            bootstrap_host: config.dns.bootstrap_host(&config.cluster_domain),
            port: config.dns.port,
            timeout: config.dns.timeout(),
        }
    }

    async fn bootstrap(&self) -> Result<SocketAddr> {
        let mut addrs = lookup_host((self.bootstrap_host.as_str(), self.port))
            .await
            .map_err(|source| DiscoveryError::Bootstrap {
                host: self.bootstrap_host.clone(),
                source,
            })?;

        addrs.next().ok_or_else(|| DiscoveryError::NoBootstrapAddress {
            host: self.bootstrap_host.clone(),
        })
    }
}

impl SrvLookup for DirectLookup {
    async fn lookup_srv(&self, query: &SrvQuery) -> Result<Vec<Endpoint>> {
        let server = self.bootstrap().await?;

        let query_error = |source| DiscoveryError::Query {
            name: query.name().to_string(),
            server,
            source,
        };
        let timed_out = || DiscoveryError::Timeout {
            name: query.name().to_string(),
            server,
            timeout: self.timeout,
        };

        let resolver = hickory::build(Some(hickory::single_server(server)), Some(self.timeout))
            .map_err(query_error)?;

        tracing::debug!(query = %query.name(), %server, "direct SRV query");

        let lookup = match tokio::time::timeout(self.timeout, resolver.srv_lookup(query.name())).await {
            Err(_) => return Err(timed_out()),
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => {
                return match hickory::negative_response(&e) {
                    Some(ResponseCode::NoError) => {
                        tracing::debug!(query = %query.name(), "no SRV records");
                        Ok(Vec::new())
                    }
                    Some(code) => Err(DiscoveryError::UnknownService {
                        name: query.name().to_string(),
                        code,
                    }),
                    None if hickory::is_timeout(&e) => Err(timed_out()),
                    None => Err(query_error(e)),
                };
            }
        };

        // Only SRV records of the answer section become endpoints, anything
        // else the server sent along is dropped by the lookup
        Ok(query.endpoints(
            lookup
                .iter()
                .map(|srv| (srv.target().to_utf8(), srv.port())),
        ))
    }
}
