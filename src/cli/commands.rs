use crate::cli::{Commands, OutputFormat};
use crate::config::DiscoveryConfig;
use crate::k8s::{pod_namespace, K8sClient, PeerDirectory, PeerDirectoryClient, PodLister};
use crate::metrics::{DiscoveryMetrics, PrometheusExporter};
use crate::{PeerpingError, Result};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub async fn handle_command(config: DiscoveryConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Peers { output } => handle_peers(config, output).await,
        Commands::Watch { interval } => handle_watch(config, interval).await,
        Commands::Namespace => handle_namespace(),
        Commands::Metrics => handle_metrics(config).await,
    }
}

async fn directory_client(
    config: &DiscoveryConfig,
    metrics: DiscoveryMetrics,
) -> Result<PeerDirectoryClient<K8sClient>> {
    let client = Arc::new(K8sClient::try_default().await?);
    let directory = PeerDirectoryClient::new(client, config, metrics);
    info!(
        "Discovering peers with selector {} in namespace {:?}",
        directory.label_selector(),
        directory.namespace()
    );
    Ok(directory)
}

async fn handle_peers(config: DiscoveryConfig, output: OutputFormat) -> Result<()> {
    let directory = directory_client(&config, DiscoveryMetrics::new()?).await?;
    let peers = directory.list_peers().await;
    println!("{}", render_peers(&peers, output)?);
    Ok(())
}

async fn handle_watch(config: DiscoveryConfig, interval_secs: u64) -> Result<()> {
    if interval_secs == 0 {
        return Err(PeerpingError::ConfigError(
            "watch interval must be at least one second".to_string(),
        ));
    }

    let directory = directory_client(&config, DiscoveryMetrics::new()?).await?;
    run_watch(&directory, Duration::from_secs(interval_secs), ctrl_c()).await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Polls for peers every `interval` until `shutdown` completes. A listing in
/// flight is abandoned on shutdown.
pub async fn run_watch<L, S>(
    directory: &PeerDirectoryClient<L>,
    interval: Duration,
    shutdown: S,
) -> Result<()>
where
    L: PodLister,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(interval);
    let mut known: BTreeSet<String> = BTreeSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let peers = tokio::select! {
                    peers = directory.list_peers() => peers,
                    _ = &mut shutdown => break,
                };
                if peers.is_empty() && !known.is_empty() {
                    warn!("Discovery returned no peers, previously tracking {}", known.len());
                }
                known = report_changes(&known, &peers);
            }
            _ = &mut shutdown => break,
        }
    }

    info!("Stopping peer watch");
    Ok(())
}

fn handle_namespace() -> Result<()> {
    let namespace = pod_namespace();
    if namespace.is_empty() {
        println!("<unknown>");
    } else {
        println!("{}", namespace);
    }
    Ok(())
}

async fn handle_metrics(config: DiscoveryConfig) -> Result<()> {
    let metrics = DiscoveryMetrics::new()?;
    let exporter = PrometheusExporter::new(&metrics)?;

    let directory = directory_client(&config, metrics).await?;
    directory.list_peers().await;

    print!("{}", exporter.format_current_metrics()?);
    Ok(())
}

/// Logs peers that joined or left since the previous poll and returns the
/// new set of identities.
fn report_changes(known: &BTreeSet<String>, peers: &PeerDirectory) -> BTreeSet<String> {
    let current: BTreeSet<String> = peers.identities().map(str::to_string).collect();

    for added in current.difference(known) {
        if let Some(record) = peers.get(added) {
            info!(
                peer = %record.identity,
                pod_ip = %record.data_address,
                host_ip = %record.host_address,
                "Peer joined"
            );
        }
    }
    for removed in known.difference(&current) {
        info!(peer = %removed, "Peer left");
    }

    current
}

pub fn render_peers(peers: &PeerDirectory, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(peers)
            .map_err(|e| PeerpingError::SerializationError(e.to_string())),
        OutputFormat::Yaml => {
            serde_yaml::to_string(peers).map_err(|e| PeerpingError::SerializationError(e.to_string()))
        }
        OutputFormat::Table => {
            let mut out = format!("{:<40} {:<16} {:<16}", "NAME", "POD IP", "HOST IP");
            for record in peers.sorted() {
                out.push_str(&format!(
                    "\n{:<40} {:<16} {:<16}",
                    record.identity, record.data_address, record.host_address
                ));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::k8s::PeerRecord;
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::Pod;
    use kube::api::ListParams;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Lister whose calls never complete, like an API server that stopped
    /// responding.
    struct HangingLister {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PodLister for HangingLister {
        async fn list_pods(&self, _namespace: &str, _params: &ListParams) -> Result<Vec<Pod>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    struct EmptyLister {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PodLister for EmptyLister {
        async fn list_pods(&self, _namespace: &str, _params: &ListParams) -> Result<Vec<Pod>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn watch_client<L: PodLister>(lister: Arc<L>) -> PeerDirectoryClient<L> {
        PeerDirectoryClient::with_namespace(
            lister,
            &DiscoveryConfig::default(),
            "team-a".to_string(),
            DiscoveryMetrics::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_watch_stops_during_hung_listing() {
        let lister = Arc::new(HangingLister {
            calls: AtomicUsize::new(0),
        });
        let directory = watch_client(lister.clone());

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            run_watch(
                &directory,
                Duration::from_secs(60),
                tokio::time::sleep(Duration::from_millis(50)),
            ),
        )
        .await;

        assert!(matches!(stopped, Ok(Ok(()))));
        assert_eq!(lister.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_watch_shutdown_between_polls_is_not_lost() {
        let lister = Arc::new(EmptyLister {
            calls: AtomicUsize::new(0),
        });
        let directory = watch_client(lister.clone());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        // Fires while the loop is between ticks, after several polls.
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(35)).await;
            let _ = tx.send(());
        });

        let stopped = tokio::time::timeout(
            Duration::from_secs(5),
            run_watch(&directory, Duration::from_millis(10), async {
                let _ = rx.await;
            }),
        )
        .await;

        assert!(matches!(stopped, Ok(Ok(()))));
        assert!(lister.calls.load(Ordering::SeqCst) >= 2);
    }

    fn peers(names: &[&str]) -> PeerDirectory {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| PeerRecord {
                identity: name.to_string(),
                data_address: format!("10.0.0.{}", i + 1),
                host_address: "192.168.1.1".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_render_table_sorted() {
        let table = render_peers(&peers(&["p2", "p1"]), OutputFormat::Table).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME"));
        assert!(lines[1].starts_with("p1"));
        assert!(lines[2].starts_with("p2"));
    }

    #[test]
    fn test_render_json() {
        let json = render_peers(&peers(&["p1"]), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["p1"]["data_address"], "10.0.0.1");
    }

    #[test]
    fn test_report_changes() {
        let known: BTreeSet<String> = ["p1", "p2"].iter().map(|s| s.to_string()).collect();
        let current = report_changes(&known, &peers(&["p2", "p3"]));

        let names: Vec<&str> = current.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["p2", "p3"]);
    }
}
