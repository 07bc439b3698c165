//! Resolver construction and error classification shared by both strategies.

use std::net::SocketAddr;
use std::time::Duration;
use hickory_proto::op::ResponseCode;
use hickory_proto::ProtoErrorKind;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{ResolveError, ResolveErrorKind, TokioResolver};

/// Asks only `server`: UDP first, TCP when the UDP answer is truncated.
pub(crate) fn single_server(server: SocketAddr) -> ResolverConfig {
    ResolverConfig::from_parts(
        None,
        Vec::new(),
        NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true),
    )
}

/// Builds a resolver without a cache. `None` reads the host configuration.
///
/// With a `timeout` every query is sent once and bounded by it.
pub(crate) fn build(
    config: Option<ResolverConfig>,
    timeout: Option<Duration>,
) -> Result<TokioResolver, ResolveError> {
    let mut builder = match config {
        Some(config) => TokioResolver::builder_with_config(config, TokioConnectionProvider::default()),
        None => TokioResolver::builder_tokio()?,
    };

    let opts = builder.options_mut();
    opts.cache_size = 0;
    if let Some(timeout) = timeout {
        opts.timeout = timeout;
        opts.attempts = 0;
        opts.num_concurrent_reqs = 1;
    }
    Ok(builder.build())
}

/// Response code of a negative answer, `None` for any other failure.
/// NOERROR here means the name exists but holds no SRV records.
pub(crate) fn negative_response(error: &ResolveError) -> Option<ResponseCode> {
    match error.kind() {
        ResolveErrorKind::Proto(proto) => match proto.kind() {
            ProtoErrorKind::NoRecordsFound { response_code, .. } => Some(*response_code),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn is_timeout(error: &ResolveError) -> bool {
    match error.kind() {
        ResolveErrorKind::Proto(proto) => matches!(proto.kind(), ProtoErrorKind::Timeout),
        _ => false,
    }
}
