//! Update scheduler
//!
//! The UpdateScheduler is responsible for:
//! - Refreshing every record in the working set, one after another
//! - Swallowing per-record failures so siblings and later passes still run
//! - Sleeping for the configured interval between passes
//! - Stopping promptly on a shutdown signal
//!
//! ## State Machine
//!
//! ```text
//!            run()
//!   Idle ───────────▶ RunningPass ──(all records attempted)──▶ Sleeping
//!                          ▲                                      │
//!                          └──────────(interval elapsed)──────────┘
//! ```
//!
//! There is no terminal state. The loop ends only when a shutdown signal
//! arrives, either between two records or during the sleep.
//!
//! Startup (listing retrieval) happens before a scheduler exists; its
//! failures never reach this module.

use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::record::RecordSet;
use crate::traits::HttpClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Events emitted by the UpdateScheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// Scheduler started
    Started { records_count: usize },

    /// A pass over the working set began
    PassStarted { pass: u64 },

    /// A record's update URL answered with an address
    RecordRefreshed {
        hostname: String,
        previous_ip: String,
        ip: String,
    },

    /// A record's refresh failed and was swallowed
    RecordFailed { hostname: String, error: String },

    /// Every record in the pass was attempted
    PassCompleted {
        pass: u64,
        succeeded: usize,
        failed: usize,
    },

    /// Scheduler stopped
    Stopped { reason: String },
}

/// Where the scheduler is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, loop not started
    Idle,
    /// Iterating records
    RunningPass,
    /// Waiting out the interval
    Sleeping,
}

/// Tally of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl PassSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// How a pass or sleep ended
enum Flow {
    Continue,
    Shutdown,
}

/// Drives the polling loop over the working record set
///
/// ## Threading
///
/// Records are refreshed strictly one at a time; the scheduler holds the
/// only mutable handle to the set, so a record never has two refreshes in
/// flight.
pub struct UpdateScheduler {
    /// Transport used for every refresh
    http: Arc<dyn HttpClient>,

    /// Working set, owned for the scheduler's lifetime
    records: RecordSet,

    /// Sleep between passes
    interval: Duration,

    /// Bound for each refresh request
    request_timeout: Duration,

    /// Current position in the loop
    state: SchedulerState,

    /// Completed passes
    passes: u64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SchedulerEvent>,
}

impl UpdateScheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields scheduler events
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the configuration is invalid or the record set
    /// is empty (there would be nothing to update).
    pub fn new(
        http: Arc<dyn HttpClient>,
        records: RecordSet,
        config: &AgentConfig,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        config.validate()?;

        if records.is_empty() {
            return Err(Error::config("No records to update"));
        }

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let scheduler = Self {
            http,
            records,
            interval: config.interval(),
            request_timeout: config.request_timeout(),
            state: SchedulerState::Idle,
            passes: 0,
            event_tx: tx,
        };

        Ok((scheduler, rx))
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// The working set, as last refreshed
    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    /// Number of passes completed so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run the loop until SIGINT/SIGTERM
    pub async fn run(&mut self) -> Result<()> {
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            match wait_for_signal().await {
                Ok(signal) => {
                    info!("Received {}", signal);
                    let _ = tx.send(());
                }
                Err(e) => {
                    // Keep the sender alive; the process then stops only by default signal handling
                    warn!("Failed to listen for shutdown signals: {}", e);
                    let _tx = tx;
                    std::future::pending::<()>().await;
                }
            }
        });

        self.run_with_shutdown(rx).await
    }

    /// Run the loop until `shutdown_rx` fires (or its sender is dropped)
    ///
    /// The signal is honoured between records and during the sleep; a
    /// refresh already in flight is allowed to finish.
    pub async fn run_with_shutdown(
        &mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<()> {
        info!(
            "Updating {} record(s) every {:?}",
            self.records.len(),
            self.interval
        );
        emit(
            &self.event_tx,
            SchedulerEvent::Started {
                records_count: self.records.len(),
            },
        );

        loop {
            if let (Flow::Shutdown, _) = self.pass(&mut shutdown_rx).await {
                break;
            }

            self.state = SchedulerState::Sleeping;
            debug!("Sleeping for {:?}", self.interval);

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    debug!("Interval elapsed");
                }
                _ = &mut shutdown_rx => {
                    break;
                }
            }
        }

        info!(
            "Shutdown signal received, scheduler stopped after {} pass(es)",
            self.passes
        );
        self.state = SchedulerState::Idle;
        emit(
            &self.event_tx,
            SchedulerEvent::Stopped {
                reason: "Shutdown signal".to_string(),
            },
        );

        Ok(())
    }

    /// Perform exactly one pass over the working set
    pub async fn run_pass(&mut self) -> PassSummary {
        let (_tx, mut rx) = oneshot::channel::<()>();
        let (_, summary) = self.pass(&mut rx).await;
        summary
    }

    async fn pass(&mut self, shutdown_rx: &mut oneshot::Receiver<()>) -> (Flow, PassSummary) {
        self.state = SchedulerState::RunningPass;
        let pass = self.passes + 1;
        let mut summary = PassSummary::default();
        emit(&self.event_tx, SchedulerEvent::PassStarted { pass });

        let http = self.http.as_ref();
        for record in self.records.iter_mut() {
            if shutdown_requested(shutdown_rx) {
                debug!(
                    "Shutdown requested mid-pass, {} record(s) attempted",
                    summary.attempted()
                );
                return (Flow::Shutdown, summary);
            }

            match record.refresh(http, self.request_timeout).await {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    if outcome.changed() {
                        info!(
                            "Updated {} -> {} (previous: {})",
                            record.hostname(),
                            outcome.ip,
                            outcome.previous_ip
                        );
                    } else {
                        info!(
                            "Updated {} -> {} (unchanged)",
                            record.hostname(),
                            outcome.ip
                        );
                    }
                    emit(
                        &self.event_tx,
                        SchedulerEvent::RecordRefreshed {
                            hostname: record.hostname().to_string(),
                            previous_ip: outcome.previous_ip,
                            ip: outcome.ip,
                        },
                    );
                }
                Err(e) => {
                    // Swallowed: the next pass retries unconditionally
                    summary.failed += 1;
                    warn!("Failed to update {}: {}", record.hostname(), e);
                    emit(
                        &self.event_tx,
                        SchedulerEvent::RecordFailed {
                            hostname: record.hostname().to_string(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }

        self.passes = pass;
        info!(
            "Pass {} complete: {} updated, {} failed",
            pass, summary.succeeded, summary.failed
        );
        emit(
            &self.event_tx,
            SchedulerEvent::PassCompleted {
                pass,
                succeeded: summary.succeeded,
                failed: summary.failed,
            },
        );

        (Flow::Continue, summary)
    }
}

/// Emit a scheduler event without blocking the loop
fn emit(event_tx: &mpsc::Sender<SchedulerEvent>, event: SchedulerEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!("Event channel full, dropping event: {:?}", event);
        }
        Err(TrySendError::Closed(_)) => {
            // No listener
            debug!("Event channel closed, dropping event");
        }
    }
}

/// True once the shutdown sender has fired or gone away
fn shutdown_requested(shutdown_rx: &mut oneshot::Receiver<()>) -> bool {
    !matches!(
        shutdown_rx.try_recv(),
        Err(oneshot::error::TryRecvError::Empty)
    )
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("SIGINT")
}
