// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Network interfaces and rate derivation

use serde::Serialize;
use std::time::Instant;

/// Raw counters for one interface as reported by a statistics poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceStats {
    pub name: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
    pub running: bool,
}

/// A router interface with counters and last-sample bookkeeping
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkInterface {
    /// RouterOS `.id`
    pub id: String,
    pub name: String,
    pub interface_type: String,
    pub mac_address: String,
    pub mtu: u32,
    pub running: bool,
    pub disabled: bool,
    pub comment: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
    /// Receive rate, bits per second
    pub rx_bps: f64,
    /// Transmit rate, bits per second
    pub tx_bps: f64,
    pub last_rx_bytes: u64,
    pub last_tx_bytes: u64,
    #[serde(skip)]
    pub last_update: Option<Instant>,
}

/// Bit rate between two byte counter readings
///
/// A counter that went backwards (reset or wrap) or a non-positive interval
/// yields 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bit_rate(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    current.saturating_sub(previous) as f64 * 8.0 / elapsed_secs
}

impl NetworkInterface {
    /// Records a new counter sample and recomputes rates
    ///
    /// The first sample only establishes the baseline and reports 0 bps.
    pub fn record_sample(&mut self, sample: &InterfaceStats, now: Instant) {
        match self.last_update {
            Some(previous) => {
                let elapsed = now.saturating_duration_since(previous).as_secs_f64();
                self.rx_bps = bit_rate(sample.rx_bytes, self.last_rx_bytes, elapsed);
                self.tx_bps = bit_rate(sample.tx_bytes, self.last_tx_bytes, elapsed);
            }
            None => {
                self.rx_bps = 0.0;
                self.tx_bps = 0.0;
            }
        }

        self.rx_bytes = sample.rx_bytes;
        self.tx_bytes = sample.tx_bytes;
        self.rx_packets = sample.rx_packets;
        self.tx_packets = sample.tx_packets;
        self.rx_errors = sample.rx_errors;
        self.tx_errors = sample.tx_errors;
        self.running = sample.running;

        self.last_rx_bytes = sample.rx_bytes;
        self.last_tx_bytes = sample.tx_bytes;
        self.last_update = Some(now);
    }

    /// Forgets the baseline so the next sample starts fresh
    pub fn reset_rates(&mut self) {
        self.rx_bps = 0.0;
        self.tx_bps = 0.0;
        self.last_update = None;
    }

    pub(crate) fn carry_rates_from(&mut self, old: &NetworkInterface) {
        self.rx_bps = old.rx_bps;
        self.tx_bps = old.tx_bps;
        self.last_rx_bytes = old.last_rx_bytes;
        self.last_tx_bytes = old.last_tx_bytes;
        self.last_update = old.last_update;
    }
}

impl From<&InterfaceStats> for NetworkInterface {
    fn from(stats: &InterfaceStats) -> Self {
        Self {
            name: stats.name.clone(),
            running: stats.running,
            ..Self::default()
        }
    }
}
