//! Main application state and service coordination
//!
//! This module contains the production AppState that builds the queue
//! registry from configuration, registers preset queues, and runs the HTTP
//! server plus background tasks until shutdown.

use crate::config::AppConfig;
use crate::events::{BroadcastEventPublisher, EventPublisher, LogEventPublisher};
use crate::metrics::MetricsCollector;
use crate::queue::{GameSessionAssembler, QueueRegistry, RandomTokenGenerator};
use crate::service::http::{HttpServer, HttpServerConfig};
use crate::service::lobby::QueueService;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Interval between refreshes of the uptime and queue gauges
const METRICS_REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state
pub struct AppState {
    /// Service configuration
    config: AppConfig,

    /// Queue service shared with the HTTP handlers
    service: QueueService,

    /// Broadcast channel every queue event goes through
    events: Arc<BroadcastEventPublisher>,

    /// HTTP server for the queue API and monitoring
    http_server: HttpServer,

    /// HTTP server task
    http_task: Option<JoinHandle<()>>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with all dependencies
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} queue service", config.service.name);
        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        let registry = QueueRegistry::new(GameSessionAssembler)
            .with_token_generator(Arc::new(RandomTokenGenerator::with_length(
                config.queues.token_length,
            )))
            .with_max_capacity(config.queues.max_capacity);

        let events = Arc::new(BroadcastEventPublisher::new(config.queues.event_buffer));
        let service = QueueService::with_metrics(registry, events.clone(), metrics)
            .with_auto_start(config.queues.auto_start_when_full);

        Self::create_preset_queues(&config, &service).await?;

        let http_server = HttpServer::new(
            HttpServerConfig {
                port: config.service.http_port,
                host: config.service.http_host.clone(),
                service_name: config.service.name.clone(),
            },
            service.clone(),
        );

        Ok(Self {
            config,
            service,
            events,
            http_server,
            http_task: None,
            background_tasks: Vec::new(),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Start the HTTP server and background tasks
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting {} queue service", self.config.service.name);

        let listener = self
            .http_server
            .bind()
            .await
            .map_err(|e| ServiceError::Initialization {
                message: e.to_string(),
            })?;

        *self.is_running.write().await = true;

        self.start_event_logger();
        self.start_metrics_refresh();

        let serving = self.http_server.serve(listener);
        self.http_task = Some(tokio::spawn(async move {
            if let Err(e) = serving.await {
                error!("HTTP server error: {}", e);
            }
        }));

        info!("✅ Queue service started on {}", self.config.http_addr());
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of queue service");

        *self.is_running.write().await = false;

        self.http_server.stop();
        if let Some(task) = self.http_task.take() {
            match tokio::time::timeout(self.config.shutdown_timeout(), task).await {
                Ok(Ok(())) => info!("✅ HTTP server stopped"),
                Ok(Err(e)) => warn!("HTTP server task failed: {}", e),
                Err(_) => warn!("⚠️  HTTP server did not stop within the shutdown timeout"),
            }
        }

        self.stop_background_tasks();

        let final_stats = self
            .service
            .stats()
            .await
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Failed to get final stats: {}", e),
            })?;

        info!("Final service statistics: {:?}", final_stats);
        info!("✅ Queue service shutdown completed");

        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the queue service
    pub fn service(&self) -> &QueueService {
        &self.service
    }

    /// Get the broadcast event publisher, e.g. to subscribe to queue events
    pub fn events(&self) -> Arc<BroadcastEventPublisher> {
        self.events.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    async fn create_preset_queues(
        config: &AppConfig,
        service: &QueueService,
    ) -> Result<(), ServiceError> {
        for preset in &config.queues.presets {
            service
                .create_queue(&preset.name, preset.capacity)
                .await
                .map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create preset queue {}: {}", preset.name, e),
                })?;
        }

        if !config.queues.presets.is_empty() {
            info!("Registered {} preset queues", config.queues.presets.len());
        }
        Ok(())
    }

    /// Forward every broadcast event to the structured log
    fn start_event_logger(&mut self) {
        let mut stream = self.events.subscribe();
        let handle = tokio::spawn(async move {
            let logger = LogEventPublisher;
            while let Some(item) = stream.next().await {
                match item {
                    Ok(event) => {
                        if let Err(e) = logger.publish(event).await {
                            warn!("Failed to log queue event: {}", e);
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!("Event logger lagged, skipped {} events", skipped);
                    }
                }
            }
            debug!("Event logger stopped");
        });
        self.background_tasks.push(handle);
    }

    /// Periodically refresh uptime and registry gauges
    fn start_metrics_refresh(&mut self) {
        let service = self.service.clone();
        let is_running = self.is_running.clone();
        let started_at = self.started_at;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(METRICS_REFRESH_INTERVAL);

            loop {
                interval.tick().await;
                if !*is_running.read().await {
                    break;
                }

                service.metrics().update_uptime(started_at.elapsed());
                match service.stats().await {
                    Ok(stats) => debug!(
                        "Queue stats: {} queues, {} waiting, {} matches started",
                        stats.active_queues, stats.players_waiting, stats.matches_started
                    ),
                    Err(e) => warn!("Failed to refresh queue stats: {}", e),
                }
            }
        });
        self.background_tasks.push(handle);
    }

    fn stop_background_tasks(&mut self) {
        for task in self.background_tasks.drain(..) {
            task.abort();
        }
        debug!("Background tasks stopped");
    }
}
