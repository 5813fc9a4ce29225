use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use snapvault_remote::{RemoteMetadata, RemoteStore, StoreError, StoreFuture};

const API_BASE: &str = "https://api.dropboxapi.com/2";
const CONTENT_BASE: &str = "https://content.dropboxapi.com/2";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Commit arguments shared by `files/upload` and `upload_session/finish`.
#[derive(Debug, Serialize)]
struct CommitArg<'a> {
    path: &'a str,
    mode: &'a str,
    autorename: bool,
    mute: bool,
}

impl<'a> CommitArg<'a> {
    fn add(path: &'a str) -> Self {
        Self {
            path,
            mode: "add",
            autorename: false,
            mute: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionStartArg {
    close: bool,
}

#[derive(Debug, Deserialize)]
struct SessionStartResponse {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct SessionCursorArg<'a> {
    session_id: &'a str,
    offset: u64,
}

#[derive(Debug, Serialize)]
struct SessionAppendArg<'a> {
    cursor: SessionCursorArg<'a>,
    close: bool,
}

#[derive(Debug, Serialize)]
struct SessionFinishArg<'a> {
    cursor: SessionCursorArg<'a>,
    commit: CommitArg<'a>,
}

#[derive(Debug, Serialize)]
struct PathArg<'a> {
    path: &'a str,
}

#[derive(Debug, Deserialize)]
struct MetadataResponse {
    #[serde(default)]
    content_hash: String,
    #[serde(default)]
    size: u64,
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

fn network_error(e: reqwest::Error) -> StoreError {
    // Connection, DNS, and timeout failures are all worth a fresh attempt.
    StoreError::Transient(format!("network error: {e}"))
}

fn classify_status(status: StatusCode, body: &str) -> StoreError {
    match status.as_u16() {
        401 | 403 => StoreError::Fatal(format!("auth rejected ({status}): {body}")),
        429 => StoreError::Transient("rate limited".into()),
        s if s >= 500 => StoreError::Transient(format!("server error {status}")),
        _ => StoreError::Fatal(format!("API error {status}: {body}")),
    }
}

/// Extracts the store's expected offset from an `incorrect_offset` 409 body.
fn parse_correct_offset(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/lookup_failed/correct_offset")
        .or_else(|| value.pointer("/error/correct_offset"))
        .and_then(serde_json::Value::as_u64)
}

/// Classification for session calls, which can additionally desync.
fn classify_session_status(status: StatusCode, body: &str, sent_offset: u64) -> StoreError {
    if status.as_u16() == 409 && body.contains("incorrect_offset") {
        return StoreError::OffsetMismatch {
            expected: parse_correct_offset(body).unwrap_or(0),
            got: sent_offset,
        };
    }
    classify_status(status, body)
}

// ---------------------------------------------------------------------------
// DropboxStore
// ---------------------------------------------------------------------------

/// Dropbox implementation of [`RemoteStore`].
///
/// Request timeouts belong here, not in the engine: the default reqwest
/// client applies no overall timeout, matching Dropbox's guidance for large
/// chunk uploads.
pub struct DropboxStore {
    http: reqwest::Client,
    api_base: String,
    content_base: String,
}

impl DropboxStore {
    /// Creates a store client authenticating with `access_token`.
    pub fn new(access_token: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}"))
                .map_err(|_| StoreError::Fatal("invalid access token".into()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Fatal(format!("client build failed: {e}")))?;

        Ok(Self {
            http,
            api_base: API_BASE.to_string(),
            content_base: CONTENT_BASE.to_string(),
        })
    }

    /// Overrides endpoint hosts (for tests).
    #[cfg(test)]
    pub(crate) fn with_bases(mut self, api: String, content: String) -> Self {
        self.api_base = api;
        self.content_base = content;
        self
    }

    /// Checks the access token against `users/get_current_account`.
    ///
    /// An invalid token surfaces as `Fatal` here, before any upload starts.
    pub async fn verify_token(&self) -> Result<(), StoreError> {
        let resp = self
            .http
            .post(format!("{}/users/get_current_account", self.api_base))
            .send()
            .await
            .map_err(network_error)?;
        let status = resp.status();
        if status.is_success() {
            debug!("dropbox access token verified");
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(classify_status(status, &body))
        }
    }

    /// POST to a `content.dropboxapi.com` endpoint with a `Dropbox-API-Arg`
    /// header and a raw byte body. Returns the response body on success.
    async fn content_request<T: Serialize>(
        &self,
        endpoint: &str,
        arg: &T,
        data: &[u8],
        sent_offset: Option<u64>,
    ) -> Result<Vec<u8>, StoreError> {
        let arg_json = serde_json::to_string(arg)
            .map_err(|e| StoreError::Fatal(format!("arg serialization failed: {e}")))?;

        let resp = self
            .http
            .post(format!("{}{}", self.content_base, endpoint))
            .header("Dropbox-API-Arg", arg_json)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec())
            .send()
            .await
            .map_err(network_error)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.bytes().await.map_err(network_error)?.to_vec());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(match sent_offset {
            Some(offset) => classify_session_status(status, &body, offset),
            None => classify_status(status, &body),
        })
    }

    /// POST to an `api.dropboxapi.com` RPC endpoint with a JSON body.
    async fn rpc_request<T: Serialize>(
        &self,
        endpoint: &str,
        arg: &T,
    ) -> Result<(StatusCode, String), StoreError> {
        let resp = self
            .http
            .post(format!("{}{}", self.api_base, endpoint))
            .json(arg)
            .send()
            .await
            .map_err(network_error)?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Ok((status, body))
    }
}

impl RemoteStore for DropboxStore {
    fn put_small<'a>(&'a self, dest: &'a str, data: &'a [u8]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.content_request("/files/upload", &CommitArg::add(dest), data, None)
                .await?;
            Ok(())
        })
    }

    fn session_start<'a>(&'a self, first_chunk: &'a [u8]) -> StoreFuture<'a, String> {
        Box::pin(async move {
            let body = self
                .content_request(
                    "/files/upload_session/start",
                    &SessionStartArg { close: false },
                    first_chunk,
                    None,
                )
                .await?;
            let resp: SessionStartResponse = serde_json::from_slice(&body)
                .map_err(|e| StoreError::Fatal(format!("malformed start response: {e}")))?;
            Ok(resp.session_id)
        })
    }

    fn session_append<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        chunk: &'a [u8],
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let arg = SessionAppendArg {
                cursor: SessionCursorArg { session_id, offset },
                close: false,
            };
            self.content_request("/files/upload_session/append_v2", &arg, chunk, Some(offset))
                .await?;
            Ok(())
        })
    }

    fn session_finish<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        last_chunk: &'a [u8],
        dest: &'a str,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let arg = SessionFinishArg {
                cursor: SessionCursorArg { session_id, offset },
                commit: CommitArg::add(dest),
            };
            self.content_request("/files/upload_session/finish", &arg, last_chunk, Some(offset))
                .await?;
            Ok(())
        })
    }

    fn get_metadata<'a>(&'a self, dest: &'a str) -> StoreFuture<'a, Option<RemoteMetadata>> {
        Box::pin(async move {
            let (status, body) = self
                .rpc_request("/files/get_metadata", &PathArg { path: dest })
                .await?;

            if status.is_success() {
                let meta: MetadataResponse = serde_json::from_slice(body.as_bytes())
                    .map_err(|e| StoreError::Fatal(format!("malformed metadata: {e}")))?;
                return Ok(Some(RemoteMetadata {
                    content_hash: meta.content_hash,
                    size: meta.size,
                }));
            }
            if status.as_u16() == 409 && body.contains("not_found") {
                return Ok(None);
            }
            Err(classify_status(status, &body))
        })
    }

    fn delete<'a>(&'a self, dest: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let (status, body) = self
                .rpc_request("/files/delete_v2", &PathArg { path: dest })
                .await?;
            if status.is_success() {
                Ok(())
            } else {
                Err(classify_status(status, &body))
            }
        })
    }
}
