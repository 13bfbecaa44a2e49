//! Apply latency distribution, exported as a Prometheus histogram.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Upper bounds in milliseconds, sized for chat API round trips.
pub const LATENCY_BOUNDS_MS: [u64; 12] = [
    10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 20_000, 30_000,
];

/// Per-bucket counts; the last slot holds observations above every bound.
/// Cumulative totals are computed on export.
#[derive(Default)]
pub struct LatencyHistogram {
    slots: [AtomicU64; LATENCY_BOUNDS_MS.len() + 1],
    sum_ms: AtomicU64,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, latency_ms: u64) {
        let slot = LATENCY_BOUNDS_MS.partition_point(|&bound| bound < latency_ms);
        self.slots[slot].fetch_add(1, Ordering::Relaxed);
        self.sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.slots.iter().map(|s| s.load(Ordering::Relaxed)).sum()
    }

    pub fn sum_ms(&self) -> u64 {
        self.sum_ms.load(Ordering::Relaxed)
    }

    /// Mean latency, 0 before the first observation.
    pub fn mean_ms(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            n => self.sum_ms() as f64 / n as f64,
        }
    }

    /// `(le, cumulative count)` per bound, in ascending order.
    pub fn cumulative(&self) -> Vec<(u64, u64)> {
        LATENCY_BOUNDS_MS
            .iter()
            .zip(&self.slots)
            .scan(0u64, |total, (&bound, slot)| {
                *total += slot.load(Ordering::Relaxed);
                Some((bound, *total))
            })
            .collect()
    }

    pub fn write_prometheus(&self, out: &mut String, name: &str, help: &str) {
        let _ = writeln!(out, "# HELP {} {}", name, help);
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for (bound, count) in self.cumulative() {
            let _ = writeln!(out, "{}_bucket{{le=\"{}\"}} {}", name, bound, count);
        }
        let count = self.count();
        let _ = writeln!(out, "{}_bucket{{le=\"+Inf\"}} {}", name, count);
        let _ = writeln!(out, "{}_sum {}", name, self.sum_ms());
        let _ = writeln!(out, "{}_count {}", name, count);
    }
}
