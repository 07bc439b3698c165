mod config;

use std::io::Write;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::Parser;
use discovery::{Discovery, Network, Strategy};
use shared::protocol::DEFAULT_PORT_NAME;
use crate::config::Config;

/// Look up the endpoints of a cluster service through DNS SRV records
#[derive(Debug, Parser)]
#[command(name = "discovery", version)]
struct Args {
    /// The name of the service to lookup
    service: String,

    /// The name of the port to lookup
    #[arg(default_value = DEFAULT_PORT_NAME)]
    port: String,

    /// The name of the network to lookup (tcp or udp)
    #[arg(default_value = "tcp")]
    net: Network,

    /// Template each endpoint is printed with, e.g. "http://{{.Target}}:{{.Port}}"
    #[arg(long, short)]
    format: Option<String>,

    /// TOML file with [discovery] and [output] tables
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Resolver to use instead of the platform default (native or direct)
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Namespace the service is registered in
    #[arg(long)]
    namespace: Option<String>,
}

impl Args {
    /// Config file (if any) with command line overrides applied
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(strategy) = self.strategy {
            config.discovery.strategy = Some(strategy);
        }
        if let Some(namespace) = &self.namespace {
            config.discovery.namespace = namespace.clone();
        }
        if let Some(format) = &self.format {
            config.output.format = format.clone();
        }
        Ok(config)
    }
}

async fn run(args: &Args, config: Config) -> Result<Vec<String>> {
    let discovery = Discovery::new(config.discovery);
    tracing::debug!("Looking up {} via {} lookup", args.service, discovery.strategy());

    discovery
        .discover_formatted(&args.service, &args.port, args.net, &config.output.format)
        .await
        .with_context(|| {
            format!(
                "Failed to discover port '{}' ({}) of service '{}'",
                args.port, args.net, args.service
            )
        })
}

fn print_results(out: &mut impl Write, results: &[String]) -> std::io::Result<()> {
    writeln!(out, "# Results")?;
    for row in results {
        writeln!(out, "{}", row)?;
    }
    out.flush()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout is reserved for results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("discovery=warn,discovery_cli=warn"))
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.resolve_config()?;

    let results = run(&args, config).await?;

    print_results(&mut std::io::stdout().lock(), &results)
        .context("Failed to write results")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery::testing::FakeDns;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["discovery", "etcd"]).unwrap();
        assert_eq!(args.service, "etcd");
        assert_eq!(args.port, "client");
        assert_eq!(args.net, Network::Tcp);
        assert!(args.format.is_none());
    }

    #[test]
    fn test_args_positional() {
        let args = Args::try_parse_from(["discovery", "kube-dns", "dns", "udp"]).unwrap();
        assert_eq!(args.port, "dns");
        assert_eq!(args.net, Network::Udp);
    }

    #[test]
    fn test_args_reject_unknown_network() {
        assert!(Args::try_parse_from(["discovery", "etcd", "client", "sctp"]).is_err());
        assert!(Args::try_parse_from(["discovery"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "discovery", "etcd", "--strategy", "direct", "--namespace", "infra", "-f", "{{.Target}}",
        ])
        .unwrap();

        let config = args.resolve_config().unwrap();

        assert_eq!(config.discovery.strategy, Some(Strategy::Direct));
        assert_eq!(config.discovery.namespace, "infra");
        assert_eq!(config.output.format, "{{.Target}}");
    }

    #[test]
    fn test_print_results() {
        let mut out = Vec::new();
        print_results(&mut out, &["Target: 10.0.0.5 Port: 2379".to_string()]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "# Results\nTarget: 10.0.0.5 Port: 2379\n");
    }

    #[tokio::test]
    async fn test_run_direct() {
        let dns = FakeDns::builder()
            .srv("etcd-0.etcd.default.svc.cluster.local.", 2379)
            .srv("etcd-1.etcd.default.svc.cluster.local.", 2379)
            .start()
            .await
            .unwrap();
        let args = Args::try_parse_from(["discovery", "etcd", "--strategy", "direct"]).unwrap();
        let mut config = args.resolve_config().unwrap();
        config.discovery.dns.bootstrap_host = Some("127.0.0.1".to_string());
        config.discovery.dns.port = dns.addr().port();

        let results = run(&args, config).await.unwrap();

        assert_eq!(
            results,
            vec![
                "Target: etcd-0.etcd.default.svc.cluster.local Port: 2379",
                "Target: etcd-1.etcd.default.svc.cluster.local Port: 2379",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_error_has_context() {
        let args = Args::try_parse_from(["discovery", "etcd", "--format", "{{.Nope}}"]).unwrap();
        let config = args.resolve_config().unwrap();

        let err = run(&args, config).await.unwrap_err();

        assert!(err.to_string().contains("service 'etcd'"));
        assert!(format!("{:#}", err).contains("unknown field '.Nope'"));
    }
}
