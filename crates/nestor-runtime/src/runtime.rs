//! Nestor runtime.
//!
//! [`NestorRuntime`] wires configuration to a [`Robot`]: it picks debug or
//! relay delivery, applies the robot-wide HTTP options, loads scripts, and
//! feeds inbound messages to the receive pipeline one at a time.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use nestor_core::{Message, ReceiveOutcome, Robot};
use nestor_transport::RelayClient;

use crate::config::{ConfigLoader, NestorConfig, validate_config};
use crate::error::RuntimeResult;
use crate::script::ScriptRegistry;

/// A configured robot plus the scripts available to it.
#[derive(Debug)]
pub struct NestorRuntime {
    config: NestorConfig,
    robot: Robot,
    scripts: ScriptRegistry,
}

impl NestorRuntime {
    /// Builds a runtime from a validated configuration.
    ///
    /// In production mode this creates the relay client, so a missing auth
    /// token fails here rather than on the first send.
    pub fn from_config(config: NestorConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;

        let mut builder = Robot::builder(&config.robot.team_id, &config.robot.bot_id)
            .debug_mode(config.robot.debug_mode)
            .global_http_options(config.http.clone());

        if config.robot.debug_mode {
            info!("Debug mode enabled, responses are buffered in memory");
        } else {
            let relay = RelayClient::new(config.relay.clone())?;
            builder = builder.relay(Arc::new(relay));
        }

        let robot = builder.build();
        info!(
            team_id = %robot.team_id(),
            bot_id = %robot.bot_id(),
            debug_mode = robot.debug_mode(),
            "Robot created"
        );

        Ok(Self {
            config,
            robot,
            scripts: ScriptRegistry::builtin(),
        })
    }

    /// Loads configuration with `loader` and builds a runtime from it.
    pub fn from_loader(loader: ConfigLoader) -> RuntimeResult<Self> {
        Self::from_config(loader.load()?)
    }

    /// The configuration this runtime was built from.
    pub fn config(&self) -> &NestorConfig {
        &self.config
    }

    /// The robot.
    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// The script registry, for adding scripts before loading.
    pub fn scripts_mut(&mut self) -> &mut ScriptRegistry {
        &mut self.scripts
    }

    /// Loads scripts from `robot.scripts_dir`, if configured.
    ///
    /// Returns the number of scripts loaded.
    pub fn load_scripts(&self) -> RuntimeResult<usize> {
        match &self.config.robot.scripts_dir {
            Some(dir) => self.load_scripts_from(dir),
            None => {
                debug!("No scripts directory configured");
                Ok(0)
            }
        }
    }

    /// Loads scripts from `dir`.
    pub fn load_scripts_from(&self, dir: &Path) -> RuntimeResult<usize> {
        Ok(self.scripts.load_dir(&self.robot, dir)?)
    }

    /// Runs one receive cycle.
    pub async fn receive(&self, message: impl Into<Arc<Message>>) -> ReceiveOutcome {
        self.robot.receive(message).await
    }

    /// Receives messages from `inbound` until it closes or a shutdown signal
    /// (Ctrl+C or SIGTERM) arrives.
    pub async fn run(&self, inbound: mpsc::Receiver<Message>) -> RuntimeResult<()> {
        info!(
            listeners = self.robot.listener_count(),
            "Nestor runtime is now running. Press Ctrl+C to stop."
        );
        self.run_until(inbound, wait_for_shutdown()).await
    }

    /// Receives messages from `inbound` until it closes or `shutdown`
    /// resolves.
    ///
    /// Messages are processed serially: the next one is taken only after the
    /// current receive cycle completes. A cycle still pending when `shutdown`
    /// resolves is abandoned.
    pub async fn run_until<F>(
        &self,
        mut inbound: mpsc::Receiver<Message>,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let message = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                message = inbound.recv() => message,
            };

            let Some(message) = message else {
                info!("Inbound channel closed");
                break;
            };

            tokio::select! {
                outcome = self.robot.receive(message) => {
                    debug!(?outcome, "Receive cycle finished");
                }
                _ = &mut shutdown => {
                    warn!("Shutdown requested while a receive cycle was pending, abandoning it");
                    break;
                }
            }
        }

        info!("Nestor runtime stopped");
        Ok(())
    }
}

/// Waits for Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C, waiting indefinitely");
            std::future::pending::<()>().await;
        }
    }
}
