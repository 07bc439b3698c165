use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

/// Transport protocol of a named service port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Tcp,
    Udp,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Udp => "udp",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNetwork(pub String);

impl fmt::Display for UnknownNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown network '{}', expected 'tcp' or 'udp'", self.0)
    }
}

impl std::error::Error for UnknownNetwork {}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Network::Tcp),
            "udp" => Ok(Network::Udp),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

/// One resolved endpoint of a discovered service.
/// This is the canonical data model produced by the resolvers and consumed by the formatter.
///
/// Fields are private so an endpoint can't be changed once a resolver built it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Logical service name that was queried, e.g. "etcd"
    service: String,

    /// Named port within the service, e.g. "client"
    port_name: String,

    network: Network,

    /// Resolved hostname or address, never ending in '.'
    target: String,

    port: u16,
}

impl Endpoint {
    /// Builds an endpoint from a raw SRV answer. The trailing root separator of
    /// the target is stripped.
    pub fn new(
        service: impl Into<String>,
        port_name: impl Into<String>,
        network: Network,
        target: &str,
        port: u16,
    ) -> Self {
        Self {
            service: service.into(),
            port_name: port_name.into(),
            network,
            target: target.trim_end_matches('.').to_string(),
            port,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_trailing_dot_stripped() {
        let endpoint = Endpoint::new("etcd", "client", Network::Tcp, "etcd-0.etcd.default.svc.cluster.local.", 2379);
        assert_eq!(endpoint.target(), "etcd-0.etcd.default.svc.cluster.local");
        assert_eq!(endpoint.to_string(), "etcd-0.etcd.default.svc.cluster.local:2379");
    }

    #[test]
    fn test_target_without_dot_untouched() {
        let endpoint = Endpoint::new("etcd", "client", Network::Udp, "10.0.0.5", 53);
        assert_eq!(endpoint.target(), "10.0.0.5");
        assert_eq!(endpoint.network(), Network::Udp);
    }

    #[test]
    fn test_network_parse() {
        assert_eq!("tcp".parse::<Network>().unwrap(), Network::Tcp);
        assert_eq!("UDP".parse::<Network>().unwrap(), Network::Udp);
        assert!("sctp".parse::<Network>().is_err());
        assert_eq!(Network::Udp.to_string(), "udp");
    }

    #[test]
    fn test_endpoint_serializes_lowercase_network() {
        let endpoint = Endpoint::new("etcd", "client", Network::Tcp, "10.0.0.5", 2379);
        let json = serde_json::to_value(&endpoint).unwrap();
        assert_eq!(json["network"], "tcp");
        assert_eq!(json["port_name"], "client");
    }
}
