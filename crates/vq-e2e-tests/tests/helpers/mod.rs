//! Shared test harness for E2E tests.
//!
//! Wires the agent runner to a scripted `MockCanInterface` and builds the
//! frame sequences a real vehicle puts on the bus.

#![allow(dead_code)]

use vq_agent::config::AgentConfig;
use vq_agent::runner;
use vq_canbus::{AcquisitionReport, CanFrame, MockCanInterface};

pub const TOYOTA_VIN: &str = "JTDKB20U793512345";
pub const HONDA_VIN: &str = "1HGCM82633A004352";

/// Agent + mock bus.
pub struct TestHarness {
    pub config: AgentConfig,
    pub bus: MockCanInterface,
}

impl TestHarness {
    /// Harness for `interfaces`, querying `bus`, with a `budget_secs` budget.
    pub fn new(interfaces: &[&str], bus: u8, budget_secs: f64) -> Self {
        let toml = format!(
            "interfaces = {:?}\nbus = {bus}\nbudget_secs = {budget_secs:?}\n",
            interfaces
        );
        Self {
            config: AgentConfig::from_toml(&toml).expect("valid test config"),
            bus: MockCanInterface::new(),
        }
    }

    /// Single-bus harness with the default one second budget.
    pub fn single_bus() -> Self {
        Self::new(&["vcan0"], 0, 1.0)
    }

    /// Run one identification against the mock bus.
    pub async fn identify(&self) -> AcquisitionReport {
        runner::identify(&self.config, &self.bus, &self.bus).await
    }

    /// Run and render the report as the binary would print it.
    pub async fn identify_json(&self) -> serde_json::Value {
        let report = self.identify().await;
        let line = runner::render(&report).expect("report renders");
        serde_json::from_str(&line).expect("report is JSON")
    }
}

/// ISO-TP First Frame + two Consecutive Frames answering Mode 09 PID 02.
pub fn vin_response(bus: u8, id: u32, vin: &str) -> [CanFrame; 3] {
    let mut payload = vec![0x49, 0x02, 0x01];
    payload.extend_from_slice(vin.as_bytes());
    assert_eq!(payload.len(), 20, "test VINs are 17 characters");

    let mut ff = vec![0x10, 0x14];
    ff.extend_from_slice(&payload[..6]);
    let mut cf1 = vec![0x21];
    cf1.extend_from_slice(&payload[6..13]);
    let mut cf2 = vec![0x22];
    cf2.extend_from_slice(&payload[13..20]);

    [
        CanFrame::new(bus, id, ff),
        CanFrame::new(bus, id, cf1),
        CanFrame::new(bus, id, cf2),
    ]
}

/// Component-protection mux frames carrying `vin` (3 + 7 + 7 characters).
pub fn vin_broadcast(bus: u8, id: u32, vin: &str) -> [CanFrame; 3] {
    let bytes = vin.as_bytes();
    assert_eq!(bytes.len(), 17, "test VINs are 17 characters");

    let mut mux0 = vec![0x00, 0xA5, 0x5A, 0x01, 0x02];
    mux0.extend_from_slice(&bytes[..3]);
    let mut mux1 = vec![0x01];
    mux1.extend_from_slice(&bytes[3..10]);
    let mut mux2 = vec![0x02];
    mux2.extend_from_slice(&bytes[10..17]);

    [
        CanFrame::new(bus, id, mux0),
        CanFrame::new(bus, id, mux1),
        CanFrame::new(bus, id, mux2),
    ]
}

/// Unrelated powertrain traffic.
pub fn noise(bus: u8) -> Vec<CanFrame> {
    vec![
        CanFrame::new(bus, 0x0AA, vec![0x00, 0x00, 0x1B, 0x58, 0x00, 0x00, 0x00, 0x00]),
        CanFrame::new(bus, 0x3B7, vec![0x10, 0x14, 0, 0, 0, 0, 0, 0]),
        CanFrame::new(bus, 0x7E9, vec![0x10, 0x14, 0x49, 0x02, 0x01, 0x41, 0x42, 0x43]),
    ]
}
