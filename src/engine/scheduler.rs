//! SchedulerActor - drives the check pipeline for every registered service
//!
//! The scheduler owns its cancellation handle and an injected store; there
//! is no ambient global state. It runs in an infinite loop, firing a check
//! round at the configured interval and reacting to control commands.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → list services → spawn pipeline per service → [store, signals]
//!     ↑
//!     └─── Commands (TickNow, UpdateInterval, Shutdown)
//! ```
//!
//! ## Tick policy
//!
//! The ticker is fixed-period with `MissedTickBehavior::Delay` (best-effort
//! fixed delay). Every service's pipeline runs as its own task, so one slow
//! endpoint cannot delay the rest of the round; a round that overruns the
//! interval leaves its in-flight probes running and the next round starts on
//! schedule. A pipeline failure is logged at the tick boundary and never
//! aborts the loop or the sibling checks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, instrument, trace, warn};

use crate::config::{IncidentConfig, SchedulerConfig};
use crate::notify::Notifier;
use crate::store::MonitorStore;
use crate::{HealthState, Service};

use super::evaluator;
use super::incident::IncidentManager;
use super::messages::{HealthSignal, SchedulerCommand};
use super::probe::Prober;
use super::recorder::MetricRecorder;

/// Shared handles threaded through every pipeline invocation
#[derive(Clone)]
struct PipelineContext {
    store: Arc<dyn MonitorStore>,
    prober: Arc<Prober>,
    recorder: Arc<MetricRecorder>,
    incidents: Arc<IncidentManager>,
    notifier: Arc<Notifier>,
}

/// One service's full check: probe -> record -> evaluate -> incident.
///
/// Steps are strictly sequential; the probe outcome feeds the recorder,
/// whose updated counters feed the evaluator, whose derived state gates the
/// incident manager.
async fn run_pipeline(ctx: PipelineContext, mut service: Service) -> Result<()> {
    let outcome = ctx.prober.probe(&service.url).await;

    let metric = ctx.recorder.record(&mut service, &outcome).await?;

    for alert in evaluator::evaluate(&service, &outcome, metric.cost) {
        let alert = ctx
            .store
            .append_alert(alert)
            .await
            .with_context(|| format!("failed to append alert for {}", service.name))?;
        debug!("{}: alert triggered: {}", service.name, alert.message);
        ctx.notifier.alert_triggered(&service, &alert).await;
    }

    if service.status == HealthState::Down
        && let Some(incident) = ctx
            .incidents
            .observe_down(&service)
            .await
            .with_context(|| format!("failed to track incident for {}", service.name))?
    {
        let down_alert = ctx
            .store
            .append_alert(evaluator::service_down_alert(&service))
            .await
            .with_context(|| format!("failed to append down alert for {}", service.name))?;
        ctx.notifier.alert_triggered(&service, &down_alert).await;
        ctx.notifier.incident_opened(&service, &incident).await;
    }

    Ok(())
}

/// Actor that periodically checks all registered services
pub struct SchedulerActor {
    /// Pipeline dependencies, cloned into every spawned check
    ctx: PipelineContext,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<SchedulerCommand>,

    /// Current tick interval
    interval_duration: Duration,
}

impl SchedulerActor {
    fn new(
        ctx: PipelineContext,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            ctx,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop
    ///
    /// This is the entry point for the actor. It runs until:
    /// - A Shutdown command is received
    /// - The command channel is closed
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting scheduler actor");

        // Strictly periodic: the first round fires one interval after
        // startup; an immediate round is requested explicitly via TickNow.
        let mut ticker = interval_at(
            Instant::now() + self.interval_duration,
            self.interval_duration,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Timer tick - check all services
                _ = ticker.tick() => {
                    if let Err(e) = self.run_tick(false).await {
                        error!("check round failed: {:#}", e);
                    }
                }

                // Handle commands
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::TickNow { respond_to } => {
                            debug!("received TickNow command");
                            let result = self.run_tick(true).await;
                            let _ = respond_to.send(result);
                        }

                        SchedulerCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            ticker = interval_at(
                                Instant::now() + self.interval_duration,
                                self.interval_duration,
                            );
                            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        }

                        SchedulerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                // Command channel closed - exit
                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("scheduler actor stopped");
    }

    /// Run one check round.
    ///
    /// Spawns an independent pipeline task per service. With `wait` the call
    /// returns once every pipeline has finished (used by `TickNow`);
    /// otherwise tasks are detached and the next tick is scheduled
    /// regardless of their completion.
    async fn run_tick(&self, wait: bool) -> Result<()> {
        let services = self
            .ctx
            .store
            .list_services()
            .await
            .context("failed to list services")?;

        trace!("tick: checking {} services", services.len());

        let mut tasks = Vec::new();
        for service in services {
            let ctx = self.ctx.clone();
            let name = service.name.clone();

            let handle = tokio::spawn(async move {
                if let Err(e) = run_pipeline(ctx, service).await {
                    error!("{name}: check pipeline failed: {e:#}");
                }
            });

            if wait {
                tasks.push(handle);
            }
        }

        if wait {
            for result in futures::future::join_all(tasks).await {
                if let Err(e) = result {
                    error!("check pipeline panicked: {e}");
                }
            }
        }

        Ok(())
    }
}

/// Handle for controlling a SchedulerActor
#[derive(Clone)]
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Spawn a new scheduler actor.
    ///
    /// # Arguments
    /// - `store`: service registry + metric/alert/incident persistence
    /// - `scheduler_config`: tick interval and per-probe timeout
    /// - `incident_config`: SLA tuning for opened incidents
    /// - `notifier`: webhook channel for alert/incident events
    /// - `signal_tx`: broadcast sender for per-check health signals
    pub fn spawn(
        store: Arc<dyn MonitorStore>,
        scheduler_config: SchedulerConfig,
        incident_config: IncidentConfig,
        notifier: Notifier,
        signal_tx: broadcast::Sender<HealthSignal>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let ctx = PipelineContext {
            prober: Arc::new(Prober::new(Duration::from_secs(scheduler_config.timeout))),
            recorder: Arc::new(MetricRecorder::new(store.clone(), signal_tx)),
            incidents: Arc::new(IncidentManager::new(
                store.clone(),
                incident_config.sla_hours,
            )),
            notifier: Arc::new(notifier),
            store,
        };

        let actor = SchedulerActor::new(
            ctx,
            cmd_rx,
            Duration::from_secs(scheduler_config.interval),
        );

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run a check round immediately, waiting for every pipeline.
    pub async fn tick_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::TickNow { respond_to: tx })
            .await?;

        rx.await??;
        Ok(())
    }

    /// Update the tick interval
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(SchedulerCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    /// Shut down the scheduler
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SchedulerCommand::Shutdown).await;
    }
}
