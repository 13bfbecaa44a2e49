//! Dispatch metrics: per-route counters, per-kind breakdowns and apply
//! latency.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

use dashmap::DashMap;

use super::LatencyHistogram;

/// Counters for the media dispatch pipeline.
#[derive(Default)]
pub struct DispatchMetrics {
    pub start_time: OnceLock<Instant>,
    /// Sequence numbers handed out by the counter
    pub sequences_issued_total: AtomicU64,
    /// Messages routed to the transformer
    pub transformed_total: AtomicU64,
    /// Messages whose caption was cleared
    pub cleared_total: AtomicU64,
    /// Messages left untouched
    pub skipped_total: AtomicU64,
    /// Captions applied by editing in place
    pub edits_total: AtomicU64,
    /// Captions applied by resending the media
    pub resends_total: AtomicU64,
    /// Messages where both edit and resend failed
    pub apply_failures_total: AtomicU64,
    /// Counter failures (persist, lock, overflow)
    pub sequence_errors_total: AtomicU64,
    /// Messages seen per media kind label
    pub messages_by_kind: DashMap<&'static str, u64>,
    /// Time from first edit attempt to final outcome, in milliseconds
    pub apply_latency_ms: LatencyHistogram,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        let m = Self::default();
        let _ = m.start_time.set(Instant::now());
        m
    }

    pub fn uptime_secs(&self) -> f64 {
        self.start_time
            .get()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    #[inline]
    pub fn record_message(&self, kind: &'static str) {
        self.messages_by_kind
            .entry(kind)
            .and_modify(|v| *v += 1)
            .or_insert(1);
    }

    #[inline]
    pub fn record_sequence_issued(&self) {
        self.sequences_issued_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_sequence_error(&self) {
        self.sequence_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_transformed(&self) {
        self.transformed_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cleared(&self) {
        self.cleared_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_skipped(&self) {
        self.skipped_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_edit(&self, latency_ms: u64) {
        self.edits_total.fetch_add(1, Ordering::Relaxed);
        self.apply_latency_ms.observe(latency_ms);
    }

    #[inline]
    pub fn record_resend(&self, latency_ms: u64) {
        self.resends_total.fetch_add(1, Ordering::Relaxed);
        self.apply_latency_ms.observe(latency_ms);
    }

    #[inline]
    pub fn record_apply_failure(&self, latency_ms: u64) {
        self.apply_failures_total.fetch_add(1, Ordering::Relaxed);
        self.apply_latency_ms.observe(latency_ms);
    }

    /// Snapshot of per-kind counts, sorted by label.
    pub fn messages_by_kind(&self) -> Vec<(&'static str, u64)> {
        let mut kinds: Vec<_> = self
            .messages_by_kind
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        kinds.sort_unstable();
        kinds
    }

    /// Formats all dispatch metrics in Prometheus exposition format.
    pub fn format_prometheus(&self) -> String {
        let mut output = String::with_capacity(4096);

        let _ = writeln!(
            output,
            "# HELP captioner_uptime_secs Server uptime in seconds"
        );
        let _ = writeln!(output, "# TYPE captioner_uptime_secs gauge");
        let _ = writeln!(output, "captioner_uptime_secs {:.3}", self.uptime_secs());
        output.push('\n');

        let counters = [
            (
                "captioner_sequences_issued_total",
                "Sequence numbers issued",
                &self.sequences_issued_total,
            ),
            (
                "captioner_transformed_total",
                "Messages routed to the caption transformer",
                &self.transformed_total,
            ),
            (
                "captioner_cleared_total",
                "Messages whose caption was cleared",
                &self.cleared_total,
            ),
            (
                "captioner_skipped_total",
                "Messages left untouched",
                &self.skipped_total,
            ),
            (
                "captioner_edits_total",
                "Captions applied by editing in place",
                &self.edits_total,
            ),
            (
                "captioner_resends_total",
                "Captions applied by resending the media",
                &self.resends_total,
            ),
            (
                "captioner_apply_failures_total",
                "Messages where edit and resend both failed",
                &self.apply_failures_total,
            ),
            (
                "captioner_sequence_errors_total",
                "Sequence counter failures",
                &self.sequence_errors_total,
            ),
        ];
        for (name, help, value) in counters {
            let _ = writeln!(output, "# HELP {} {}", name, help);
            let _ = writeln!(output, "# TYPE {} counter", name);
            let _ = writeln!(output, "{} {}", name, value.load(Ordering::Relaxed));
            output.push('\n');
        }

        let _ = writeln!(
            output,
            "# HELP captioner_messages_total Messages seen per media kind"
        );
        let _ = writeln!(output, "# TYPE captioner_messages_total counter");
        for (kind, count) in self.messages_by_kind() {
            let _ = writeln!(
                output,
                "captioner_messages_total{{kind=\"{}\"}} {}",
                kind, count
            );
        }
        output.push('\n');

        self.apply_latency_ms.write_prometheus(
            &mut output,
            "captioner_apply_latency_ms",
            "Caption apply latency in milliseconds",
        );
        output.push('\n');

        output
    }
}
