//! Simulated machine stream
//!
//! Each machine runs as a tokio task that commits one sample per stream
//! every sample interval and reports a live reading in between.

use gs_data::Sample;
use std::f64::consts::TAU;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::settings::{MachineSettings, StreamSettings};

/// One reading from a machine
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// A sample that becomes part of the series
    Commit { machine_id: String, stream_id: String, sample: Sample },
    /// The newest, not yet committed reading
    Current { machine_id: String, stream_id: String, sample: Sample },
}

/// Value of `stream` at `timestamp_ms`
pub fn wave(stream: &StreamSettings, timestamp_ms: i64) -> f64 {
    let period_ms = (stream.period_s * 1_000.0).max(1.0);
    let phase = (timestamp_ms as f64 % period_ms) / period_ms;
    let ripple = (phase * TAU * 7.0).sin() * 0.15;
    stream.base + stream.amplitude * ((phase * TAU).sin() + ripple) / 1.15
}

/// Start one task per machine on `runtime`
pub fn spawn_machines(
    runtime: &Handle,
    machines: &[MachineSettings],
    sample_interval_ms: u64,
    current_interval_ms: u64,
    sender: UnboundedSender<Reading>,
) {
    for machine in machines.iter().cloned() {
        let sender = sender.clone();
        runtime.spawn(run_machine(machine, sample_interval_ms, current_interval_ms, sender));
    }
}

async fn run_machine(
    machine: MachineSettings,
    sample_interval_ms: u64,
    current_interval_ms: u64,
    sender: UnboundedSender<Reading>,
) {
    tracing::info!("Machine {} streaming {} signals", machine.id, machine.streams.len());
    let mut ticker = tokio::time::interval(Duration::from_millis(current_interval_ms.max(1)));
    let mut last_commit: Option<i64> = None;

    loop {
        ticker.tick().await;
        let now = wall_clock_ms();
        let commit = last_commit.map_or(true, |t| now - t >= sample_interval_ms as i64);
        if commit {
            last_commit = Some(now);
        }

        for stream in &machine.streams {
            let sample = Sample::new(now, wave(stream, now));
            let machine_id = machine.id.clone();
            let stream_id = stream.id.clone();
            let reading = if commit {
                Reading::Commit { machine_id, stream_id, sample }
            } else {
                Reading::Current { machine_id, stream_id, sample }
            };
            if sender.send(reading).is_err() {
                tracing::debug!("Machine {} stopped: receiver closed", machine.id);
                return;
            }
        }
    }
}

fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
