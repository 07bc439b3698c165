//! Discover the endpoints of a cluster service through DNS SRV records.
//!
//! ```no_run
//! # async fn run() -> Result<(), discovery::DiscoveryError> {
//! use discovery::{Discovery, Network};
//!
//! // "etcd" is the service name and "client" the port name it was registered with
//! let endpoints = Discovery::default()
//!     .discover_formatted("etcd", "client", Network::Tcp, "http://{{.Target}}:{{.Port}}")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod resolver;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use config::{DiscoveryConfig, DnsConfig};
pub use error::{DiscoveryError, Result};
pub use format::{format, Template, TemplateError};
pub use resolver::{DirectLookup, NativeLookup, SrvLookup, SrvQuery, Strategy};
pub use shared::types::{Endpoint, Network};

/// Entry point for lookups. Holds configuration only; every call resolves
/// from scratch.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    config: DiscoveryConfig,
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// The strategy every lookup of this instance goes through
    pub fn strategy(&self) -> Strategy {
        self.config.strategy.unwrap_or_else(Strategy::for_platform)
    }

    /// All endpoints of a named port, in the order the resolver returned them.
    /// A service without records yields an empty list.
    pub async fn discover(
        &self,
        service: &str,
        port_name: &str,
        network: Network,
    ) -> Result<Vec<Endpoint>> {
        if service.is_empty() {
            return Err(DiscoveryError::EmptyService);
        }

        let query = SrvQuery::new(service, port_name, network, &self.config);
        let endpoints = match self.strategy() {
            Strategy::Native => NativeLookup::new().lookup_srv(&query).await?,
            Strategy::Direct => DirectLookup::new(&self.config).lookup_srv(&query).await?,
        };

        tracing::debug!(
            query = %query.name(),
            strategy = %self.strategy(),
            count = endpoints.len(),
            "discovered endpoints"
        );
        Ok(endpoints)
    }

    /// The first discovered endpoint
    pub async fn discover_one(
        &self,
        service: &str,
        port_name: &str,
        network: Network,
    ) -> Result<Endpoint> {
        self.discover(service, port_name, network)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DiscoveryError::NoEndpoints {
                service: service.to_string(),
            })
    }

    /// Every discovered endpoint rendered through `template`.
    /// The template is compiled before anything is resolved.
    pub async fn discover_formatted(
        &self,
        service: &str,
        port_name: &str,
        network: Network,
        template: &str,
    ) -> Result<Vec<String>> {
        let template = Template::parse(template)?;
        let endpoints = self.discover(service, port_name, network).await?;
        Ok(template.render_all(&endpoints))
    }

    /// The first discovered endpoint rendered through `template`
    pub async fn discover_one_formatted(
        &self,
        service: &str,
        port_name: &str,
        network: Network,
        template: &str,
    ) -> Result<String> {
        let template = Template::parse(template)?;
        let endpoint = self.discover_one(service, port_name, network).await?;
        Ok(template.render(&endpoint))
    }
}

/// `Discovery::default().discover(..)`
pub async fn discover(service: &str, port_name: &str, network: Network) -> Result<Vec<Endpoint>> {
    Discovery::default().discover(service, port_name, network).await
}
