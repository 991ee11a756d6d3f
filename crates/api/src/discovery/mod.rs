//! Service registration and the config-center watcher.
//!
//! Two backends are supported:
//!
//! - `etcd`: the instance address is written under
//!   `<rootDirectory>/<serviceName>/<ip:port>` with a lease that a background
//!   task keeps alive; shutdown revokes the lease.
//! - `kubernetes`: the platform routes traffic through the Service object, so
//!   registration only records the in-cluster DNS name.

pub mod etcd;
pub mod kubernetes;
pub mod watcher;

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::DiscoveryConfig;
use etcd::EtcdClient;
use kubernetes::KubernetesRegistry;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Discovery configuration error: {0}")]
    Config(String),

    #[error("etcd request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("etcd response could not be decoded: {0}")]
    Json(#[from] serde_json::Error),

    #[error("etcd error: {0}")]
    Etcd(String),
}

/// The configured registration backend.
pub enum ServiceRegistry {
    Etcd(EtcdRegistry),
    Kubernetes(KubernetesRegistry),
}

impl ServiceRegistry {
    /// Build the backend named by `discovery.enable`.
    pub async fn from_config(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        match config.enable.trim().to_lowercase().as_str() {
            "etcd" => Ok(Self::Etcd(EtcdRegistry::connect(config).await?)),
            "kubernetes" | "k8s" => Ok(Self::Kubernetes(KubernetesRegistry::new(config))),
            other => Err(DiscoveryError::Config(format!(
                "unknown discovery backend '{other}', expected etcd or kubernetes"
            ))),
        }
    }

    /// Advertise `addr` (`ip:port`) for this instance.
    pub async fn register(&self, addr: &str) -> Result<(), DiscoveryError> {
        match self {
            Self::Etcd(registry) => registry.register(addr).await,
            Self::Kubernetes(registry) => {
                registry.register(addr);
                Ok(())
            }
        }
    }

    /// Withdraw the registration. Safe to call when nothing was registered.
    pub async fn deregister(&self) -> Result<(), DiscoveryError> {
        match self {
            Self::Etcd(registry) => registry.deregister().await,
            Self::Kubernetes(_) => Ok(()),
        }
    }

    /// The etcd client, when etcd is the backend.
    pub fn etcd_client(&self) -> Option<&EtcdClient> {
        match self {
            Self::Etcd(registry) => Some(&registry.client),
            Self::Kubernetes(_) => None,
        }
    }
}

/// etcd registration with a kept-alive lease.
pub struct EtcdRegistry {
    client: EtcdClient,
    root_directory: String,
    service_name: String,
    lease_ttl_secs: i64,
    lease: Mutex<Option<Lease>>,
}

struct Lease {
    id: String,
    cancel: CancellationToken,
    keep_alive: JoinHandle<()>,
}

impl EtcdRegistry {
    pub async fn connect(config: &DiscoveryConfig) -> Result<Self, DiscoveryError> {
        if config.etcd.lease_ttl_secs <= 0 {
            return Err(DiscoveryError::Config(
                "etcd.leaseTtlSecs must be positive".into(),
            ));
        }
        Ok(Self {
            client: EtcdClient::connect(&config.etcd).await?,
            root_directory: config.etcd.root_directory.clone(),
            service_name: config.service_name.clone(),
            lease_ttl_secs: config.etcd.lease_ttl_secs,
            lease: Mutex::new(None),
        })
    }

    /// Key this instance registers under.
    pub fn instance_key(&self, addr: &str) -> String {
        instance_key(&self.root_directory, &self.service_name, addr)
    }

    async fn register(&self, addr: &str) -> Result<(), DiscoveryError> {
        let lease_id = self.client.lease_grant(self.lease_ttl_secs).await?;
        let key = self.instance_key(addr);
        self.client.put(&key, addr, Some(&lease_id)).await?;

        let cancel = CancellationToken::new();
        let keep_alive = tokio::spawn(keep_alive_loop(
            self.client.clone(),
            lease_id.clone(),
            keep_alive_interval(self.lease_ttl_secs),
            cancel.clone(),
        ));

        tracing::info!(key = %key, lease_id = %lease_id, "Registered with etcd");
        *self.lease.lock().await = Some(Lease {
            id: lease_id,
            cancel,
            keep_alive,
        });
        Ok(())
    }

    async fn deregister(&self) -> Result<(), DiscoveryError> {
        let Some(lease) = self.lease.lock().await.take() else {
            return Ok(());
        };
        lease.cancel.cancel();
        let _ = lease.keep_alive.await;

        self.client.lease_revoke(&lease.id).await?;
        tracing::info!(lease_id = %lease.id, "Revoked etcd registration lease");
        Ok(())
    }
}

/// `<root>/<service>/<addr>`; a trailing slash on `root` is dropped.
pub fn instance_key(root_directory: &str, service_name: &str, addr: &str) -> String {
    let root = root_directory.trim_end_matches('/');
    format!("{root}/{service_name}/{addr}")
}

/// Refresh three times per lease lifetime.
fn keep_alive_interval(ttl_secs: i64) -> Duration {
    let secs = u64::try_from(ttl_secs / 3).unwrap_or(0).max(1);
    Duration::from_secs(secs)
}

async fn keep_alive_loop(
    client: EtcdClient,
    lease_id: String,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = client.lease_keep_alive(&lease_id).await {
                    tracing::warn!(lease_id = %lease_id, error = %e, "etcd lease keep-alive failed");
                }
            }
        }
    }
    tracing::debug!(lease_id = %lease_id, "etcd keep-alive stopped");
}
