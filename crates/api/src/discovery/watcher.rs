//! Config-center watcher.
//!
//! When configuration is managed in etcd, an operator publishes a new config
//! file or touches the restart key; the running instance reacts by draining
//! and exiting so its supervisor restarts it with the new settings.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::etcd::EtcdClient;
use crate::config::{API_FILE, DISCOVERY_FILE, LOG_FILE, SHARE_FILE};

/// etcd prefix holding centrally managed config files.
pub const CONFIG_KEY_PREFIX: &str = "/discover/config/";

/// Key whose change alone requests a restart.
pub const RESTART_KEY: &str = "restart";

/// Files whose change requires a restart of this service.
pub const WATCHED_FILES: [&str; 4] = [API_FILE, DISCOVERY_FILE, SHARE_FILE, LOG_FILE];

/// Delay before reopening a failed watch.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Whether a change to `key` should restart the service.
pub fn is_watched(key: &str) -> bool {
    key.strip_prefix(CONFIG_KEY_PREFIX)
        .is_some_and(|name| name == RESTART_KEY || WATCHED_FILES.contains(&name))
}

/// Watch the config prefix until a watched key changes or `stop` fires.
///
/// A relevant change cancels `shutdown`, which starts the normal drain.
/// Watch failures are logged and the watch is reopened.
pub async fn watch_config(client: EtcdClient, shutdown: CancellationToken, stop: CancellationToken) {
    tracing::info!(prefix = CONFIG_KEY_PREFIX, "Watching config center");

    loop {
        tokio::select! {
            () = stop.cancelled() => break,
            outcome = wait_for_change(&client) => match outcome {
                Ok(key) => {
                    tracing::info!(key = %key, "Config changed, restarting service");
                    shutdown.cancel();
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Config watch failed, retrying");
                    tokio::select! {
                        () = stop.cancelled() => break,
                        () = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }
    }

    tracing::debug!("Config watcher stopped");
}

/// Block until a watched key changes, returning that key.
async fn wait_for_change(client: &EtcdClient) -> Result<String, super::DiscoveryError> {
    let mut stream = client.watch_prefix(CONFIG_KEY_PREFIX).await?;
    while let Some(keys) = stream.next_keys().await? {
        if let Some(key) = keys.into_iter().find(|k| is_watched(k)) {
            return Ok(key);
        }
    }
    Err(super::DiscoveryError::Etcd("watch stream closed".into()))
}

#[cfg(test)]
mod tests {
    use axum::routing::post;
    use axum::Router;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tokio::net::TcpListener;

    use super::*;
    use crate::config::EtcdConfig;

    const CREATED: &str = r#"{"result":{"header":{"revision":"7"},"created":true}}"#;

    fn event_line(key: &str) -> String {
        format!(
            r#"{{"result":{{"header":{{"revision":"8"}},"events":[{{"kv":{{"key":"{}"}}}}]}}}}"#,
            STANDARD.encode(key)
        )
    }

    /// Local stand-in for the etcd gateway whose `/v3/watch` answers with
    /// `lines` and then closes.
    async fn etcd_stub(lines: Vec<String>) -> EtcdClient {
        let body = lines.join("\n") + "\n";
        let app = Router::new().route(
            "/v3/watch",
            post(move || {
                let body = body.clone();
                async move { body }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = EtcdConfig {
            address: vec![addr.to_string()],
            ..EtcdConfig::default()
        };
        EtcdClient::connect(&config).await.unwrap()
    }

    #[tokio::test]
    async fn restart_key_change_cancels_shutdown() {
        let client = etcd_stub(vec![CREATED.into(), event_line("/discover/config/restart")]).await;
        let shutdown = CancellationToken::new();
        let stop = CancellationToken::new();

        let task = tokio::spawn(watch_config(client, shutdown.clone(), stop.clone()));

        tokio::time::timeout(Duration::from_secs(5), shutdown.cancelled())
            .await
            .expect("restart key should request shutdown");
        assert!(shutdown.is_cancelled());
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("watcher exits after requesting shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn unrelated_key_change_keeps_running() {
        let client = etcd_stub(vec![CREATED.into(), event_line("/discover/config/redis.yml")]).await;
        let shutdown = CancellationToken::new();
        let stop = CancellationToken::new();

        let task = tokio::spawn(watch_config(client, shutdown.clone(), stop.clone()));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!shutdown.is_cancelled());

        stop.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("watcher honours stop while waiting to retry")
            .unwrap();
        assert!(!shutdown.is_cancelled());
    }

    #[test]
    fn restart_and_service_files_are_watched() {
        assert!(is_watched("/discover/config/restart"));
        assert!(is_watched("/discover/config/discover-api.yml"));
        assert!(is_watched("/discover/config/share.yml"));
        assert!(is_watched("/discover/config/log.yml"));
        assert!(is_watched("/discover/config/discovery.yml"));
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        assert!(!is_watched("/discover/config/redis.yml"));
        assert!(!is_watched("/other/config/restart"));
        assert!(!is_watched("restart"));
    }
}
