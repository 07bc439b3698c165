/// Port name looked up when the caller doesn't name one
pub const DEFAULT_PORT_NAME: &str = "client";

/// Namespace that target services are registered in
pub const DEFAULT_NAMESPACE: &str = "default";

/// Suffix appended to `<service>.<namespace>` by the cluster DNS
pub const DEFAULT_CLUSTER_DOMAIN: &str = "svc.cluster.local";

/// The cluster DNS service queried directly by the direct lookup
pub const DNS_SERVICE: &str = "kube-dns";
pub const DNS_NAMESPACE: &str = "kube-system";
pub const DNS_PORT: u16 = 53;

/// Timeout of a direct SRV query, in milliseconds
pub const DNS_QUERY_TIMEOUT_MS: u64 = 3000;

/// Fully qualify a service name in the cluster naming scheme,
/// e.g. `etcd.default.svc.cluster.local.`
pub fn fqdn(service: &str, namespace: &str, cluster_domain: &str) -> String {
    format!(
        "{}.{}.{}.",
        service,
        namespace,
        cluster_domain.trim_matches('.')
    )
}

/// RFC 2782 query name for a named port, e.g. `_client._tcp.etcd.default.svc.cluster.local.`
pub fn srv_name(port_name: &str, network: &str, fqdn: &str) -> String {
    format!("_{}._{}.{}", port_name, network, fqdn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fqdn_defaults() {
        assert_eq!(
            fqdn("kube-dns", DNS_NAMESPACE, DEFAULT_CLUSTER_DOMAIN),
            "kube-dns.kube-system.svc.cluster.local."
        );
    }

    #[test]
    fn test_fqdn_tolerates_dotted_domain() {
        assert_eq!(fqdn("etcd", "prod", ".cluster.example."), "etcd.prod.cluster.example.");
    }

    #[test]
    fn test_srv_name() {
        let name = srv_name("client", "tcp", &fqdn("etcd", DEFAULT_NAMESPACE, DEFAULT_CLUSTER_DOMAIN));
        assert_eq!(name, "_client._tcp.etcd.default.svc.cluster.local.");
    }
}
