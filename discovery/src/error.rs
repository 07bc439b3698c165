use std::net::SocketAddr;
use std::time::Duration;
use hickory_proto::op::ResponseCode;
use hickory_resolver::ResolveError;
use crate::format::TemplateError;

pub type Result<T, E = DiscoveryError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("service name must not be empty")]
    EmptyService,

    #[error("while resolving DNS service address '{host}'")]
    Bootstrap {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no address found for DNS service '{host}'")]
    NoBootstrapAddress { host: String },

    #[error("while querying {server} for SRV records of '{name}'")]
    Query {
        name: String,
        server: SocketAddr,
        #[source]
        source: ResolveError,
    },

    #[error("SRV query for '{name}' to {server} timed out after {timeout:?}")]
    Timeout {
        name: String,
        server: SocketAddr,
        timeout: Duration,
    },

    #[error("unknown service '{name}': DNS server answered {code}")]
    UnknownService { name: String, code: ResponseCode },

    #[error("while looking up SRV records for '{name}'")]
    Lookup {
        name: String,
        #[source]
        source: ResolveError,
    },

    #[error("no endpoints found for service '{service}'")]
    NoEndpoints { service: String },

    #[error("while formatting discovered endpoints")]
    Template(#[from] TemplateError),
}
