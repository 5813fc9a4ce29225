//! Supervisor API client: lists snapshots and removes them.

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::debug;

use crate::snapshot::{Snapshot, SnapshotSource, SourceError, SourceFuture};

const TOKEN_HEADER: &str = "X-Supervisor-Token";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct SnapshotList {
    snapshots: Vec<Snapshot>,
}

/// HTTP client for the supervisor's snapshot endpoints.
pub struct SupervisorClient {
    http: reqwest::Client,
    base_url: String,
}

impl SupervisorClient {
    /// Creates a client for `base_url` authenticating with `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(token) {
            headers.insert(TOKEN_HEADER, value);
        }
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_snapshots(&self) -> Result<Vec<Snapshot>, SourceError> {
        let resp = self
            .http
            .get(format!("{}/snapshots", self.base_url))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope<SnapshotList> = serde_json::from_slice(&resp.bytes().await?)?;
        let mut snapshots = envelope.data.snapshots;
        // Newest first: back up the most recent snapshot before older ones.
        snapshots.sort_by(|a, b| b.created.cmp(&a.created));
        debug!(count = snapshots.len(), "listed snapshots");
        Ok(snapshots)
    }

    async fn post_remove(&self, slug: &str) -> Result<(), SourceError> {
        let resp = self
            .http
            .post(format!("{}/snapshots/{slug}/remove", self.base_url))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl SnapshotSource for SupervisorClient {
    fn list<'a>(&'a self) -> SourceFuture<'a, Vec<Snapshot>> {
        Box::pin(self.get_snapshots())
    }

    fn remove<'a>(&'a self, slug: &'a str) -> SourceFuture<'a, ()> {
        Box::pin(self.post_remove(slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_snapshot_list() {
        let body = r#"{
            "result": "ok",
            "data": {
                "snapshots": [
                    {"slug": "aaa", "name": "old", "date": "2026-08-01T03:00:00Z"},
                    {"slug": "bbb", "name": "new", "date": "2026-08-29T03:00:00Z"}
                ]
            }
        }"#;
        let envelope: Envelope<SnapshotList> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.snapshots.len(), 2);
        assert_eq!(envelope.data.snapshots[0].slug, "aaa");
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = SupervisorClient::new("http://supervisor/", "tok").unwrap();
        assert_eq!(client.base_url, "http://supervisor");
    }
}
