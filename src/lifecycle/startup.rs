//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the extractor registry
//! - Resolve the watched resource type (discovery when given by kind)
//! - Look up the extractor before any event is consumed
//! - Start the metrics endpoint, open the watch, run the consumer
//!
//! # Design Decisions
//! - Fail fast: registry and lookup errors are fatal, and are reported
//!   before the metrics port is bound
//! - A shutdown requested at any point of startup is honoured
//! - The consumer runs on the calling task; the metrics server is spawned
//! - Whichever of the two stops first shuts the other down

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::CollectorConfig;
use crate::extractors::{Extractor, ExtractorRegistry, RegistryError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics::{install_recorder, serve_metrics};
use crate::recorder::{MetricSink, PhaseRecorder, PrometheusSink};
use crate::resource::GroupVersionResource;
use crate::watch::{run_consumer, ClusterClient, ConsumerSummary, WatchError};

/// Errors that stop the collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("installing metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("binding metrics listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Wires configuration, registry, cluster client and recorder together.
pub struct Collector {
    config: CollectorConfig,
    registry: ExtractorRegistry,
}

/// Everything resolved before the metrics endpoint and the watch start.
struct WatchTarget {
    client: ClusterClient,
    resource: GroupVersionResource,
    extractor: Arc<dyn Extractor>,
}

impl Collector {
    /// Collector with the built-in extractors.
    pub fn new(config: CollectorConfig) -> Result<Self, CollectorError> {
        Ok(Self::with_registry(config, ExtractorRegistry::with_builtin()?))
    }

    pub fn with_registry(config: CollectorConfig, registry: ExtractorRegistry) -> Self {
        Self { config, registry }
    }

    /// Run until the watch feed closes or `shutdown` fires, exporting
    /// durations through Prometheus.
    pub async fn run(self, shutdown: Shutdown) -> Result<ConsumerSummary, CollectorError> {
        let mut receiver = shutdown.subscribe();
        let Some(target) = self.prepare(&shutdown, &mut receiver).await? else {
            return Ok(stopped());
        };

        let metrics_task = self.start_metrics(&shutdown).await?;

        let result = self
            .consume(target, Arc::new(PrometheusSink), receiver)
            .await;

        shutdown.trigger();
        if let Some(task) = metrics_task {
            let _ = task.await;
        }
        result
    }

    /// Resolve, look up and consume, writing durations to `sink`.
    pub async fn run_with_sink(
        &self,
        sink: Arc<dyn MetricSink>,
        shutdown: &Shutdown,
    ) -> Result<ConsumerSummary, CollectorError> {
        let mut receiver = shutdown.subscribe();
        match self.prepare(shutdown, &mut receiver).await? {
            Some(target) => self.consume(target, sink, receiver).await,
            None => Ok(stopped()),
        }
    }

    /// The configured resource, or the one discovery maps the kind to.
    pub async fn resolve_resource(&self, client: &ClusterClient) -> Result<GroupVersionResource, CollectorError> {
        let watch = &self.config.watch;
        if let Some(resource) = watch.resource_type() {
            return Ok(resource);
        }

        let resource = client.resolve_kind(&watch.group, &watch.version, &watch.kind).await?;
        tracing::info!(kind = %watch.kind, resource = %resource, "Resolved kind");
        Ok(resource)
    }

    /// Build the client, resolve the type and look up its extractor.
    ///
    /// `receiver` must be subscribed before the call; `None` means shutdown
    /// was requested first.
    async fn prepare(
        &self,
        shutdown: &Shutdown,
        receiver: &mut broadcast::Receiver<()>,
    ) -> Result<Option<WatchTarget>, CollectorError> {
        if shutdown.is_triggered() {
            tracing::info!("Shutdown requested before startup completed");
            return Ok(None);
        }

        let client = ClusterClient::from_config(&self.config.cluster)?;
        let resource = tokio::select! {
            resource = self.resolve_resource(&client) => resource?,
            _ = receiver.recv() => {
                tracing::info!("Shutdown requested during discovery");
                return Ok(None);
            }
        };

        let extractor = self.registry.lookup(&resource).inspect_err(|_| {
            let known: Vec<String> = self.registry.resources().iter().map(ToString::to_string).collect();
            tracing::error!(resource = %resource, registered = %known.join(", "), "No extractor for resource");
        })?;

        Ok(Some(WatchTarget {
            client,
            resource,
            extractor,
        }))
    }

    async fn consume(
        &self,
        target: WatchTarget,
        sink: Arc<dyn MetricSink>,
        mut receiver: broadcast::Receiver<()>,
    ) -> Result<ConsumerSummary, CollectorError> {
        let WatchTarget {
            client,
            resource,
            extractor,
        } = target;
        let mut recorder = PhaseRecorder::new(resource.clone(), extractor, &self.config.final_phase, sink);

        let scope = self.config.watch.scope();
        let watch = tokio::select! {
            watch = client.watch(&resource, &scope) => watch?,
            _ = receiver.recv() => {
                tracing::info!("Shutdown requested while opening watch");
                return Ok(stopped());
            }
        };
        if scope.namespace.is_empty() {
            tracing::info!(
                server = %client.server(),
                resource = %resource,
                final_phase = %recorder.final_phase(),
                "Watching"
            );
        } else {
            tracing::info!(
                server = %client.server(),
                resource = %resource,
                namespace = %scope.namespace,
                final_phase = %recorder.final_phase(),
                "Watching"
            );
        }

        Ok(run_consumer(watch.into_stream(), &mut recorder, receiver).await?)
    }

    async fn start_metrics(&self, shutdown: &Shutdown) -> Result<Option<JoinHandle<()>>, CollectorError> {
        let observability = &self.config.observability;
        if !observability.metrics_enabled {
            tracing::info!("Metrics endpoint disabled");
            return Ok(None);
        }

        let handle = install_recorder()?;
        let listener = TcpListener::bind(&observability.metrics_address)
            .await
            .map_err(|source| CollectorError::Bind {
                address: observability.metrics_address.clone(),
                source,
            })?;

        let server_shutdown = shutdown.clone();
        let receiver = shutdown.subscribe();
        Ok(Some(tokio::spawn(async move {
            if let Err(e) = serve_metrics(listener, handle, receiver).await {
                tracing::error!(error = %e, "Metrics server failed, stopping watch");
                server_shutdown.trigger();
            }
        })))
    }
}

fn stopped() -> ConsumerSummary {
    ConsumerSummary {
        shutdown: true,
        ..ConsumerSummary::default()
    }
}
