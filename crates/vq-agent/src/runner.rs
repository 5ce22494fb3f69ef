//! One-shot vehicle identification: runs the acquisition loop for the
//! configured bus and logs the outcome.

use vq_canbus::{AcquisitionLoop, AcquisitionReport, FrameSink, FrameSource, VinSource};

use crate::config::AgentConfig;

/// Identify the vehicle using `source` and `sink` as the CAN transport.
pub async fn identify(
    config: &AgentConfig,
    source: &dyn FrameSource,
    sink: &dyn FrameSink,
) -> AcquisitionReport {
    let interface = config
        .interfaces
        .get(usize::from(config.bus))
        .map(String::as_str)
        .unwrap_or("unknown");

    tracing::info!(
        interface,
        bus = config.bus,
        budget_secs = config.budget_secs,
        "identifying vehicle"
    );

    let report = AcquisitionLoop::new(config.acquisition())
        .run(source, sink)
        .await;

    match report.source {
        VinSource::Unknown => tracing::warn!(
            interface,
            steps = report.steps,
            bursts_sent = report.bursts_sent,
            "no VIN recovered within budget"
        ),
        source => tracing::info!(
            interface,
            vin = %report.vin,
            ?source,
            steps = report.steps,
            "vehicle identified"
        ),
    }

    report
}

/// Single-line JSON rendering of a report, as printed by the binary.
pub fn render(report: &AcquisitionReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string(report)?)
}
