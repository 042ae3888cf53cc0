//! Top-level export service tying resolution and relay together

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::relay::{ExportFile, Relay};
use crate::resolver::{Resolution, Resolver};
use crate::types::Credentials;
use crate::upstream::{ExportPlatform, PlatformClient};

/// Resolves the daily journey export and fetches its file
///
/// One instance serves every request; it holds no per-request state, only the
/// configuration and the HTTP connection pools.
pub struct JourneyExporter {
    resolver: Resolver,
    relay: Relay,
    config: Arc<Config>,
}

impl JourneyExporter {
    /// Build an exporter talking to the configured platform
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let platform = PlatformClient::new(config.upstream.clone())?;
        Self::with_platform(config, Arc::new(platform))
    }

    /// Build an exporter over a custom platform implementation
    pub fn with_platform(config: Arc<Config>, platform: Arc<dyn ExportPlatform>) -> Result<Self> {
        let resolver = Resolver::new(platform, &config);
        let relay = Relay::new(config.relay.clone())?;
        Ok(Self {
            resolver,
            relay,
            config,
        })
    }

    /// The configuration this exporter runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The resolution engine
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve yesterday's export and open its file for relaying
    ///
    /// Nothing of the file is returned unless resolution and the file request
    /// both succeed.
    pub async fn export(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<(Resolution, ExportFile)> {
        let resolution = self.resolver.resolve(credentials, cancel).await?;
        tracing::info!(
            job_id = %resolution.job.id,
            path = ?resolution.path,
            poll_checks = resolution.poll_checks,
            "journey export resolved"
        );

        let file = self.relay.fetch(&resolution.result_url).await?;
        Ok((resolution, file))
    }
}
