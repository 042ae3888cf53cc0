//! Relay of the finished export file to the caller
//!
//! Export files can be tens of megabytes, so by default the body is handed on
//! as a stream of chunks and never held in memory as a whole. The optional
//! integrity mode trades that for SHA-256 and MD5 digests of the full body.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::config::RelayConfig;
use crate::error::{Error, Result};

/// Content type used when the file host does not send one
pub const DEFAULT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Body of a relayed export file
pub enum ExportBody {
    /// Chunks as they arrive from the file host
    Stream(BoxStream<'static, std::result::Result<Bytes, reqwest::Error>>),
    /// Whole file, read into memory for digesting
    Buffered(Bytes),
}

impl ExportBody {
    /// Read the remaining body into memory
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            ExportBody::Buffered(bytes) => Ok(bytes),
            ExportBody::Stream(stream) => {
                let chunks: Vec<Bytes> = stream.try_collect().await?;
                Ok(Bytes::from(chunks.concat()))
            }
        }
    }
}

impl fmt::Debug for ExportBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportBody::Stream(_) => f.write_str("ExportBody::Stream(..)"),
            ExportBody::Buffered(bytes) => write!(f, "ExportBody::Buffered({} bytes)", bytes.len()),
        }
    }
}

/// Hex digests of a buffered export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digests {
    /// SHA-256, lower-case hex
    pub sha256: String,
    /// MD5, lower-case hex
    pub md5: String,
}

impl Digests {
    /// Digest `data`
    pub fn of(data: &[u8]) -> Self {
        Self {
            sha256: format!("{:x}", Sha256::digest(data)),
            md5: format!("{:x}", md5::compute(data)),
        }
    }
}

/// A fetched export file ready to be sent on
#[derive(Debug)]
pub struct ExportFile {
    /// Content type to advertise
    pub content_type: String,
    /// Length in bytes, when the file host reported it
    pub content_length: Option<u64>,
    /// File contents
    pub body: ExportBody,
    /// Digests, only in integrity mode
    pub digests: Option<Digests>,
}

/// Fetches result files from the URLs the platform hands out
#[derive(Debug, Clone)]
pub struct Relay {
    http: reqwest::Client,
    config: RelayConfig,
}

impl Relay {
    /// Create a relay with its own connection pool
    pub fn new(config: RelayConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Settings this relay was built with
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// GET `url` and prepare its body for relaying
    ///
    /// # Errors
    ///
    /// [`Error::Download`] when the request fails or the file host answers
    /// with a non-success status.
    pub async fn fetch(&self, url: &str) -> Result<ExportFile> {
        let response = self
            .http
            .get(url)
            .timeout(self.config.download_timeout)
            .send()
            .await
            .map_err(|e| Error::Download {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download {
                status: Some(status.as_u16()),
                message: format!("file host returned {status}"),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        if self.config.integrity_digest {
            let bytes = response.bytes().await.map_err(|e| Error::Download {
                status: None,
                message: format!("reading file body failed: {e}"),
            })?;
            let digests = Digests::of(&bytes);
            tracing::debug!(size = bytes.len(), sha256 = %digests.sha256, "buffered export file");

            return Ok(ExportFile {
                content_type,
                content_length: Some(bytes.len() as u64),
                body: ExportBody::Buffered(bytes),
                digests: Some(digests),
            });
        }

        let stream = response
            .bytes_stream()
            .inspect_err(|e| tracing::warn!(error = %e, "export file stream interrupted"))
            .boxed();

        Ok(ExportFile {
            content_type,
            content_length,
            body: ExportBody::Stream(stream),
            digests: None,
        })
    }
}
