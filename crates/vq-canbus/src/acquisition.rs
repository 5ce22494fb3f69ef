//! VIN acquisition loop.
//!
//! Drives an [`ActiveQuerySession`] and a [`PassiveListener`] side by side
//! against a bounded number of polling steps. Each step pulls one batch of
//! frames, feeds every frame to both, then lets the active session decide
//! whether to put another query on the bus, even in the step the broadcast
//! completed. Whichever path completes first ends the loop.
//!
//! The loop never fails: transport errors are logged and treated as an empty
//! batch or a dropped burst, and the unknown VIN is returned when the budget
//! runs out.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::active::ActiveQuerySession;
use crate::interface::{FrameSink, FrameSource};
use crate::passive::PassiveListener;
use crate::types::Vin;

/// Default wall-clock budget for one acquisition.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(1);

/// Default length of one polling step.
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(10);

/// Parameters for one acquisition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Bus the active query is sent and answered on.
    pub bus: u8,
    /// Total time budget.
    pub budget: Duration,
    /// Longest a single poll waits for frames.
    pub step_interval: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            bus: 0,
            budget: DEFAULT_BUDGET,
            step_interval: DEFAULT_STEP_INTERVAL,
        }
    }
}

impl AcquisitionConfig {
    pub fn new(bus: u8) -> Self {
        Self {
            bus,
            ..Self::default()
        }
    }

    /// Set the budget in seconds. Negative or non-finite values give an
    /// empty budget.
    pub fn with_budget_secs(mut self, secs: f64) -> Self {
        self.budget = Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO);
        self
    }

    pub fn with_step_interval(mut self, step_interval: Duration) -> Self {
        self.step_interval = step_interval;
        self
    }

    /// Number of polling steps the budget allows.
    pub fn steps(&self) -> u32 {
        if self.step_interval.is_zero() {
            return 0;
        }
        let steps = self.budget.as_nanos() / self.step_interval.as_nanos();
        u32::try_from(steps).unwrap_or(u32::MAX)
    }
}

/// Which path produced the VIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VinSource {
    /// Mode 09 PID 02 query answered over ISO-TP.
    Active,
    /// Component-protection broadcast.
    Passive,
    /// Nothing usable within the budget.
    Unknown,
}

/// Result of one acquisition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionReport {
    pub vin: Vin,
    pub source: VinSource,
    pub bus: u8,
    /// Polling steps actually run.
    pub steps: u32,
    /// Query bursts the sink accepted.
    pub bursts_sent: u32,
}

/// Owns both recovery paths for the lifetime of one acquisition.
#[derive(Debug)]
pub struct AcquisitionLoop {
    config: AcquisitionConfig,
    active: ActiveQuerySession,
    passive: PassiveListener,
}

impl AcquisitionLoop {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self {
            config,
            active: ActiveQuerySession::new(config.bus),
            passive: PassiveListener::new(),
        }
    }

    fn is_complete(&self) -> bool {
        self.active.is_complete() || self.passive.is_complete()
    }

    /// Run until a VIN is recovered or the step budget is spent.
    pub async fn run(
        mut self,
        source: &dyn FrameSource,
        sink: &dyn FrameSink,
    ) -> AcquisitionReport {
        let budget = self.config.steps();
        let mut steps = 0u32;
        let mut bursts_sent = 0u32;

        debug!(
            bus = self.config.bus,
            steps = budget,
            step_ms = self.config.step_interval.as_millis() as u64,
            "VIN acquisition started"
        );

        while steps < budget && !self.is_complete() {
            let batch = match source.poll(self.config.step_interval).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(error = %e, "frame source failed, treating as empty batch");
                    Vec::new()
                }
            };

            for frame in &batch {
                let active_done = self.active.on_frame(frame);
                let passive_done = self.passive.on_frame(frame);
                if active_done || passive_done {
                    break;
                }
            }

            if let Some(burst) = self.active.decide_resend() {
                match sink.send(&burst).await {
                    Ok(()) => bursts_sent += 1,
                    Err(e) => warn!(error = %e, "VIN query not sent"),
                }
            }

            steps += 1;
        }

        let (vin, path) = if self.active.is_complete() {
            (self.active.resolve_vin(), VinSource::Active)
        } else if let Some(vin) = self.passive.vin() {
            (vin.clone(), VinSource::Passive)
        } else {
            (Vin::unknown(), VinSource::Unknown)
        };
        let source = if vin.is_unknown() {
            VinSource::Unknown
        } else {
            path
        };

        debug!(
            bus = self.config.bus,
            %vin,
            ?source,
            steps,
            bursts_sent,
            "VIN acquisition finished"
        );

        AcquisitionReport {
            vin,
            source,
            bus: self.config.bus,
            steps,
            bursts_sent,
        }
    }
}

/// Identify the vehicle on `bus` within `budget_secs` seconds.
///
/// Always returns a VIN; [`Vin::unknown`] when neither path succeeded.
pub async fn acquire_vin(
    source: &dyn FrameSource,
    sink: &dyn FrameSink,
    bus: u8,
    budget_secs: f64,
) -> Vin {
    let config = AcquisitionConfig::new(bus).with_budget_secs(budget_secs);
    AcquisitionLoop::new(config).run(source, sink).await.vin
}
