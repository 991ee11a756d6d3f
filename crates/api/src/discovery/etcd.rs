//! Minimal etcd v3 client over the JSON gRPC gateway.
//!
//! Only the calls the service needs are implemented: authenticate, lease
//! grant/keep-alive/revoke, key put, and a streaming prefix watch. Keys and
//! values travel base64-encoded, and 64-bit ids travel as strings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::{json, Value};

use super::DiscoveryError;
use crate::config::EtcdConfig;

/// HTTP client bound to one etcd endpoint.
#[derive(Debug, Clone)]
pub struct EtcdClient {
    http: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct LeaseGrantResponse {
    #[serde(rename = "ID")]
    id: String,
}

impl EtcdClient {
    /// Connect to the first configured endpoint, authenticating when a
    /// username is configured.
    pub async fn connect(config: &EtcdConfig) -> Result<Self, DiscoveryError> {
        let address = config
            .address
            .first()
            .ok_or_else(|| DiscoveryError::Config("etcd address is not configured".into()))?;
        let endpoint = if address.starts_with("http://") || address.starts_with("https://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        };

        let mut client = Self {
            http: reqwest::Client::new(),
            endpoint,
            auth_token: None,
        };

        if !config.username.is_empty() {
            let resp: AuthResponse = client
                .call(
                    "/v3/auth/authenticate",
                    json!({ "name": config.username, "password": config.password }),
                )
                .await?;
            client.auth_token = Some(resp.token);
        }

        tracing::info!(endpoint = %client.endpoint, "Connected to etcd");
        Ok(client)
    }

    /// Grant a lease of `ttl_secs`, returning its id.
    pub async fn lease_grant(&self, ttl_secs: i64) -> Result<String, DiscoveryError> {
        let resp: LeaseGrantResponse = self
            .call("/v3/lease/grant", json!({ "TTL": ttl_secs }))
            .await?;
        Ok(resp.id)
    }

    /// Refresh a lease once.
    pub async fn lease_keep_alive(&self, lease_id: &str) -> Result<(), DiscoveryError> {
        let _: Value = self
            .call("/v3/lease/keepalive", json!({ "ID": lease_id }))
            .await?;
        Ok(())
    }

    /// Revoke a lease, deleting every key attached to it.
    pub async fn lease_revoke(&self, lease_id: &str) -> Result<(), DiscoveryError> {
        let _: Value = self
            .call("/v3/lease/revoke", json!({ "ID": lease_id }))
            .await?;
        Ok(())
    }

    /// Put `key = value`, optionally attached to a lease.
    pub async fn put(
        &self,
        key: &str,
        value: &str,
        lease_id: Option<&str>,
    ) -> Result<(), DiscoveryError> {
        let mut body = json!({
            "key": STANDARD.encode(key),
            "value": STANDARD.encode(value),
        });
        if let Some(lease) = lease_id {
            body["lease"] = json!(lease);
        }
        let _: Value = self.call("/v3/kv/put", body).await?;
        Ok(())
    }

    /// Open a watch on every key under `prefix`.
    ///
    /// The gateway answers with a long-lived response carrying one JSON
    /// document per line; read it with [`WatchStream::next_keys`].
    pub async fn watch_prefix(&self, prefix: &str) -> Result<WatchStream, DiscoveryError> {
        let body = json!({
            "create_request": {
                "key": STANDARD.encode(prefix),
                "range_end": STANDARD.encode(prefix_range_end(prefix)),
            }
        });
        let response = self.request("/v3/watch", body).send().await?.error_for_status()?;
        Ok(WatchStream {
            response,
            buffer: Vec::new(),
        })
    }

    fn request(&self, path: &str, body: Value) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(format!("{}{path}", self.endpoint)).json(&body);
        if let Some(token) = &self.auth_token {
            builder = builder.header(AUTHORIZATION, token);
        }
        builder
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, DiscoveryError> {
        let response = self.request(path, body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Etcd(format!("{path} returned {status}: {detail}")));
        }
        Ok(response.json().await?)
    }
}

/// Streaming body of an open watch.
pub struct WatchStream {
    response: reqwest::Response,
    buffer: Vec<u8>,
}

impl WatchStream {
    /// Wait for the next batch of changed keys. `None` means the stream
    /// closed.
    pub async fn next_keys(&mut self) -> Result<Option<Vec<String>>, DiscoveryError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=pos).collect();
                let keys = parse_watch_line(&line)?;
                if !keys.is_empty() {
                    return Ok(Some(keys));
                }
                continue;
            }

            match self.response.chunk().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk),
                None => return Ok(None),
            }
        }
    }
}

/// Decode the keys touched by one watch response line.
///
/// Lines without events (the creation acknowledgement, progress notices) yield
/// no keys.
pub fn parse_watch_line(line: &[u8]) -> Result<Vec<String>, DiscoveryError> {
    let text = std::str::from_utf8(line)
        .map_err(|e| DiscoveryError::Etcd(format!("watch response is not UTF-8: {e}")))?
        .trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let doc: Value = serde_json::from_str(text)?;
    if let Some(error) = doc.get("error") {
        return Err(DiscoveryError::Etcd(format!("watch failed: {error}")));
    }

    let events = doc
        .pointer("/result/events")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    events
        .iter()
        .filter_map(|event| event.pointer("/kv/key").and_then(Value::as_str))
        .map(|encoded| {
            let raw = STANDARD.decode(encoded).map_err(|e| {
                DiscoveryError::Etcd(format!("watch key is not base64: {e}"))
            })?;
            Ok(String::from_utf8_lossy(&raw).into_owned())
        })
        .collect()
}

/// The smallest key greater than every key starting with `prefix`.
pub fn prefix_range_end(prefix: &str) -> Vec<u8> {
    let mut end = prefix.as_bytes().to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return end;
        }
    }
    // Every byte was 0xff: watch to the end of the keyspace.
    vec![0]
}
