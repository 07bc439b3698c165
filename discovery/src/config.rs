use std::time::Duration;
use serde::Deserialize;
use shared::protocol::{
    fqdn, DEFAULT_CLUSTER_DOMAIN, DEFAULT_NAMESPACE, DNS_NAMESPACE, DNS_PORT,
    DNS_QUERY_TIMEOUT_MS, DNS_SERVICE,
};
use crate::resolver::Strategy;

/// Naming scheme and resolver settings for discovery.
///
/// Every field has a default matching a stock Kubernetes cluster, so an empty
/// `[discovery]` table (or `DiscoveryConfig::default()`) just works.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscoveryConfig {
    /// Forces a lookup strategy. Unset means `Strategy::for_platform()`.
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_cluster_domain")]
    pub cluster_domain: String,
    #[serde(default)]
    pub dns: DnsConfig,
}

/// Where the direct lookup finds the cluster DNS service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsConfig {
    #[serde(default = "default_dns_service")]
    pub service: String,
    #[serde(default = "default_dns_namespace")]
    pub namespace: String,
    /// Host to resolve instead of the DNS service's cluster name
    #[serde(default)]
    pub bootstrap_host: Option<String>,
    #[serde(default = "default_dns_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_cluster_domain() -> String {
    DEFAULT_CLUSTER_DOMAIN.to_string()
}

fn default_dns_service() -> String {
    DNS_SERVICE.to_string()
}

fn default_dns_namespace() -> String {
    DNS_NAMESPACE.to_string()
}

fn default_dns_port() -> u16 {
    DNS_PORT
}

fn default_timeout_ms() -> u64 {
    DNS_QUERY_TIMEOUT_MS
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            strategy: None,
            namespace: default_namespace(),
            cluster_domain: default_cluster_domain(),
            dns: DnsConfig::default(),
        }
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            service: default_dns_service(),
            namespace: default_dns_namespace(),
            bootstrap_host: None,
            port: default_dns_port(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl DiscoveryConfig {
    /// Fully qualified name of a target service
    pub fn service_fqdn(&self, service: &str) -> String {
        fqdn(service, &self.namespace, &self.cluster_domain)
    }
}

impl DnsConfig {
    /// Host resolved to find the DNS server, e.g. `kube-dns.kube-system.svc.cluster.local.`
    pub fn bootstrap_host(&self, cluster_domain: &str) -> String {
        match &self.bootstrap_host {
            Some(host) => host.clone(),
            None => fqdn(&self.service, &self.namespace, cluster_domain),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.strategy, None);
        assert_eq!(config.service_fqdn("etcd"), "etcd.default.svc.cluster.local.");
        assert_eq!(
            config.dns.bootstrap_host(&config.cluster_domain),
            "kube-dns.kube-system.svc.cluster.local."
        );
        assert_eq!(config.dns.port, 53);
        assert_eq!(config.dns.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: DiscoveryConfig = toml::from_str("").unwrap();
        assert_eq!(config, DiscoveryConfig::default());
    }

    #[test]
    fn test_toml_overrides() {
        let config: DiscoveryConfig = toml::from_str(
            r#"
            strategy = "direct"
            namespace = "prod"
            cluster_domain = "cluster.example"

            [dns]
            bootstrap_host = "10.96.0.10"
            timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy, Some(Strategy::Direct));
        assert_eq!(config.service_fqdn("etcd"), "etcd.prod.cluster.example.");
        assert_eq!(config.dns.bootstrap_host(&config.cluster_domain), "10.96.0.10");
        assert_eq!(config.dns.service, "kube-dns");
        assert_eq!(config.dns.timeout(), Duration::from_millis(250));
    }
}
