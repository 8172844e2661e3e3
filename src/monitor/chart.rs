// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Fixed-size time series backing the dashboard charts

use serde::Serialize;
use std::collections::VecDeque;

/// One chart sample, timestamped in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: u64,
    pub value: f64,
}

/// Bounded series; pushing beyond capacity evicts the oldest point
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    #[serde(skip)]
    capacity: usize,
    points: VecDeque<ChartPoint>,
}

impl ChartSeries {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, timestamp: u64, value: f64) {
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(ChartPoint { timestamp, value });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Points in insertion order, oldest first
    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    #[must_use]
    pub fn latest(&self) -> Option<ChartPoint> {
        self.points.back().copied()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// The four dashboard series of the selected router
#[derive(Debug, Clone, Serialize)]
pub struct Charts {
    /// CPU load, percent
    pub cpu: ChartSeries,
    /// Memory usage, percent
    pub memory: ChartSeries,
    /// Summed receive rate, bits per second
    pub rx_rate: ChartSeries,
    /// Summed transmit rate, bits per second
    pub tx_rate: ChartSeries,
}

impl Default for Charts {
    fn default() -> Self {
        Self::new(crate::config::defaults::CHART_CAPACITY)
    }
}

impl Charts {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cpu: ChartSeries::new(capacity),
            memory: ChartSeries::new(capacity),
            rx_rate: ChartSeries::new(capacity),
            tx_rate: ChartSeries::new(capacity),
        }
    }

    pub fn update_cpu_data(&mut self, timestamp: u64, cpu_percent: f64) {
        self.cpu.push(timestamp, cpu_percent);
    }

    pub fn update_memory_data(&mut self, timestamp: u64, memory_percent: f64) {
        self.memory.push(timestamp, memory_percent);
    }

    pub fn update_network_data(&mut self, timestamp: u64, rx_bps: f64, tx_bps: f64) {
        self.rx_rate.push(timestamp, rx_bps);
        self.tx_rate.push(timestamp, tx_bps);
    }

    pub fn clear(&mut self) {
        self.cpu.clear();
        self.memory.clear();
        self.rx_rate.clear();
        self.tx_rate.clear();
    }
}
