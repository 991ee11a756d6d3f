use crate::config::DiscoveryConfig;

/// Kubernetes-native discovery: the Service object fronts every pod, so
/// there is nothing to write. Registration logs the address clients use.
#[derive(Debug, Clone)]
pub struct KubernetesRegistry {
    service_name: String,
    namespace: String,
}

impl KubernetesRegistry {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            service_name: config.service_name.clone(),
            namespace: config.kubernetes.namespace.clone(),
        }
    }

    /// In-cluster DNS name for `port`.
    pub fn service_address(&self, port: &str) -> String {
        format!(
            "{}.{}.svc.cluster.local:{port}",
            self.service_name, self.namespace
        )
    }

    pub fn register(&self, addr: &str) {
        let port = addr.rsplit(':').next().unwrap_or(addr);
        tracing::info!(
            instance = %addr,
            service = %self.service_address(port),
            "Using Kubernetes service discovery"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KubernetesConfig;

    #[test]
    fn service_address_uses_cluster_dns() {
        let registry = KubernetesRegistry::new(&DiscoveryConfig {
            enable: "kubernetes".into(),
            service_name: "discover-api".into(),
            kubernetes: KubernetesConfig {
                namespace: "chat".into(),
            },
            ..DiscoveryConfig::default()
        });
        assert_eq!(
            registry.service_address("10001"),
            "discover-api.chat.svc.cluster.local:10001"
        );
    }
}
