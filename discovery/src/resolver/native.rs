use hickory_proto::op::ResponseCode;
use hickory_resolver::config::ResolverConfig;
use shared::types::Endpoint;
use crate::error::{DiscoveryError, Result};
use crate::resolver::{hickory, SrvLookup, SrvQuery};

/// Looks up SRV records through the host's resolver configuration
/// (`/etc/resolv.conf` on unix, the registry on windows).
#[derive(Debug, Clone, Default)]
pub struct NativeLookup {
    resolver_config: Option<ResolverConfig>,
}

impl NativeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `config` in place of the host configuration.
    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            resolver_config: Some(config),
        }
    }
}

impl SrvLookup for NativeLookup {
    async fn lookup_srv(&self, query: &SrvQuery) -> Result<Vec<Endpoint>> {
        let lookup_error = |source| DiscoveryError::Lookup {
            name: query.name().to_string(),
            source,
        };

        // Built per call and without a cache, so every lookup goes to the network.
        let resolver = hickory::build(self.resolver_config.clone(), None).map_err(lookup_error)?;

        tracing::debug!(query = %query.name(), "native SRV lookup");

        let lookup = match resolver.srv_lookup(query.name()).await {
            Ok(lookup) => lookup,
            Err(e) if hickory::negative_response(&e) == Some(ResponseCode::NoError) => {
                tracing::debug!(query = %query.name(), "no SRV records");
                return Ok(Vec::new());
            }
            Err(e) => return Err(lookup_error(e)),
        };

        Ok(query.endpoints(
            lookup
                .iter()
                .map(|srv| (srv.target().to_utf8(), srv.port())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::testing::FakeDns;
    use shared::types::Network;

    fn lookup_at(dns: &FakeDns) -> NativeLookup {
        NativeLookup::with_config(hickory::single_server(dns.addr()))
    }

    fn etcd_query() -> SrvQuery {
        SrvQuery::new("etcd", "client", Network::Tcp, &DiscoveryConfig::default())
    }

    #[tokio::test]
    async fn test_srv_answers() {
        let dns = FakeDns::builder()
            .srv("etcd-0.etcd.default.svc.cluster.local.", 2379)
            .srv("etcd-1.etcd.default.svc.cluster.local.", 2379)
            .start()
            .await
            .unwrap();

        let endpoints = lookup_at(&dns).lookup_srv(&etcd_query()).await.unwrap();

        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].target(), "etcd-0.etcd.default.svc.cluster.local");
        for endpoint in &endpoints {
            assert_eq!(endpoint.service(), "etcd");
            assert_eq!(endpoint.port_name(), "client");
            assert_eq!(endpoint.network(), Network::Tcp);
            assert_eq!(endpoint.port(), 2379);
        }
        assert_eq!(dns.queries()[0], "_client._tcp.etcd.default.svc.cluster.local.");
    }

    #[tokio::test]
    async fn test_no_records_is_empty() {
        let dns = FakeDns::builder().start().await.unwrap();
        let endpoints = lookup_at(&dns).lookup_srv(&etcd_query()).await.unwrap();
        assert!(endpoints.is_empty());
    }

    #[tokio::test]
    async fn test_nxdomain_is_lookup_error() {
        let dns = FakeDns::builder()
            .response_code(ResponseCode::NXDomain)
            .start()
            .await
            .unwrap();

        let err = lookup_at(&dns).lookup_srv(&etcd_query()).await.unwrap_err();

        match &err {
            DiscoveryError::Lookup { name, .. } => {
                assert_eq!(name, "_client._tcp.etcd.default.svc.cluster.local.")
            }
            other => panic!("expected lookup error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_servfail_is_lookup_error() {
        let dns = FakeDns::builder()
            .response_code(ResponseCode::ServFail)
            .start()
            .await
            .unwrap();

        let err = lookup_at(&dns).lookup_srv(&etcd_query()).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Lookup { .. }));
    }
}
