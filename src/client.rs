//! HTTP client for the extraction service.
//!
//! The workflow controller only sees the [`Extractor`] trait: an opaque
//! asynchronous function from a staged PDF to an [`ExtractionResult`] or an
//! [`ExtractError`]. [`HttpExtractionClient`] is the real implementation:
//!
//! ```text
//! POST {base_url}/extract   multipart/form-data, one part named "file"
//!   2xx  → ExtractionResult JSON
//!   else → ExtractError::Service { status, detail }   (detail from {"detail": "..."})
//!   none → ExtractError::Network
//!   >60s → ExtractError::Timeout                     (request abandoned)
//! ```
//!
//! The timeout wraps the whole exchange, body read included, with
//! `tokio::time::timeout`. When it fires the request future is dropped, so a
//! slow response can never complete later and overwrite newer state.

use crate::config::ClientConfig;
use crate::error::ExtractError;
use crate::model::{ExtractionResult, StagedFile, PDF_MEDIA_TYPE};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Multipart field name the service reads the upload from.
pub const FILE_FIELD: &str = "file";

/// Future returned by [`Extractor::submit`].
pub type ExtractFuture = BoxFuture<'static, Result<ExtractionResult, ExtractError>>;

/// Anything that can turn a staged PDF into an extraction result.
///
/// The returned future owns everything it needs (`'static`) so the caller
/// can spawn it and abort it independently of the extractor.
pub trait Extractor: Send + Sync {
    fn submit(&self, file: StagedFile) -> ExtractFuture;
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// reqwest-backed [`Extractor`].
#[derive(Debug, Clone)]
pub struct HttpExtractionClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl HttpExtractionClient {
    pub fn new(config: ClientConfig) -> Result<Self, ExtractError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ExtractError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload one PDF and wait (at most `timeout_secs`) for the result.
    pub async fn extract(&self, file: StagedFile) -> Result<ExtractionResult, ExtractError> {
        let url = self.config.extract_url();
        info!(name = file.name(), size = file.size(), %url, "uploading PDF for extraction");
        let start = Instant::now();

        let result = with_deadline(
            self.config.timeout_secs,
            post_extract(self.http.clone(), url, file),
        )
        .await;

        match &result {
            Ok(r) => info!(
                method = r.processing_method.as_str(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "extraction complete"
            ),
            Err(e) => warn!(elapsed_ms = start.elapsed().as_millis() as u64, "extraction failed: {e}"),
        }
        result
    }

    /// Probe `GET {base_url}/health`.
    pub async fn health(&self) -> Result<HealthStatus, ExtractError> {
        let url = self.config.health_url();
        debug!(%url, "health check");
        let http = self.http.clone();
        with_deadline(self.config.timeout_secs, async move {
            let response = http.get(&url).send().await.map_err(transport_error)?;
            let status = response.status();
            let body = response.bytes().await.map_err(transport_error)?;
            if !status.is_success() {
                return Err(ExtractError::Service {
                    status: status.as_u16(),
                    detail: parse_detail(&body),
                });
            }
            serde_json::from_slice(&body).map_err(|e| ExtractError::Decode {
                reason: e.to_string(),
            })
        })
        .await
    }
}

impl Extractor for HttpExtractionClient {
    fn submit(&self, file: StagedFile) -> ExtractFuture {
        let client = self.clone();
        async move { client.extract(file).await }.boxed()
    }
}

/// Run `fut` with a hard budget of `secs` seconds from now.
///
/// On expiry `fut` is dropped and [`ExtractError::Timeout`] returned.
pub async fn with_deadline<F, T>(secs: u64, fut: F) -> Result<T, ExtractError>
where
    F: Future<Output = Result<T, ExtractError>>,
{
    match tokio::time::timeout(Duration::from_secs(secs), fut).await {
        Ok(result) => result,
        Err(_) => Err(ExtractError::Timeout { secs }),
    }
}

async fn post_extract(
    http: reqwest::Client,
    url: String,
    file: StagedFile,
) -> Result<ExtractionResult, ExtractError> {
    let part = Part::bytes(file.content().to_vec())
        .file_name(file.name().to_string())
        .mime_str(PDF_MEDIA_TYPE)
        .map_err(|e| ExtractError::InvalidConfig(e.to_string()))?;
    let form = Form::new().part(FILE_FIELD, part);

    let response = http
        .post(&url)
        .multipart(form)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    debug!(status = status.as_u16(), bytes = body.len(), "extraction response");

    if !status.is_success() {
        return Err(ExtractError::Service {
            status: status.as_u16(),
            detail: parse_detail(&body),
        });
    }

    serde_json::from_slice(&body).map_err(|e| ExtractError::Decode {
        reason: e.to_string(),
    })
}

fn transport_error(e: reqwest::Error) -> ExtractError {
    ExtractError::Network {
        reason: e.to_string(),
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Pull a displayable `detail` out of an error body.
///
/// A string is taken verbatim. FastAPI validation errors send a list of
/// `{"msg": ...}` objects instead; their messages are joined.
fn parse_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}
