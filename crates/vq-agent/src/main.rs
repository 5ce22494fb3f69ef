//! VIN agent — identifies the connected vehicle over SocketCAN.
//!
//! Loads the agent config, opens one raw CAN socket per configured interface,
//! runs a single VIN acquisition and prints the report as one JSON line on
//! stdout. Logs go to stderr.

use tracing_subscriber::EnvFilter;

use vq_agent::config::AgentConfig;
use vq_agent::runner;
use vq_canbus::AcquisitionReport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vq-agent starting");

    // ── Load config ─────────────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/vinquery/agent.toml".to_string());

    let config = AgentConfig::from_file(&config_path)?;
    tracing::info!(
        interfaces = ?config.interfaces,
        bus = config.bus,
        "config loaded"
    );

    let report = acquire(&config).await?;
    println!("{}", runner::render(&report)?);

    tracing::info!("vq-agent stopped");
    Ok(())
}

#[cfg(target_os = "linux")]
async fn acquire(config: &AgentConfig) -> anyhow::Result<AcquisitionReport> {
    let can = vq_canbus::SocketCanInterface::open(&config.interfaces)?;
    tracing::info!(buses = can.bus_count(), "CAN interfaces open");
    Ok(runner::identify(config, &can, &can).await)
}

#[cfg(not(target_os = "linux"))]
async fn acquire(_config: &AgentConfig) -> anyhow::Result<AcquisitionReport> {
    anyhow::bail!("SocketCAN is only available on Linux")
}
