//! Per-session prediction statistics.

use crate::models::registry::ModelKind;
use crate::types::prediction::RiskLabel;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept before the oldest half is dropped
const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector for one form session
pub struct SessionMetrics {
    /// Successful predictions
    pub predictions: AtomicU64,
    /// Attempts aborted by an error
    pub failures: AtomicU64,
    /// Predictions by model
    by_model: RwLock<HashMap<ModelKind, u64>>,
    /// Predictions by label
    by_label: RwLock<HashMap<RiskLabel, u64>>,
    /// Pipeline times (in microseconds)
    latencies: RwLock<Vec<u64>>,
    started: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            by_model: RwLock::new(HashMap::new()),
            by_label: RwLock::new(HashMap::new()),
            latencies: RwLock::new(Vec::new()),
            started: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, model: ModelKind, label: RiskLabel, elapsed: Duration) {
        self.predictions.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_model) = self.by_model.write() {
            *by_model.entry(model).or_insert(0) += 1;
        }
        if let Ok(mut by_label) = self.by_label.write() {
            *by_label.entry(label).or_insert(0) += 1;
        }
        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(elapsed.as_micros() as u64);
            if latencies.len() > MAX_LATENCY_SAMPLES {
                latencies.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }
    }

    /// Record an aborted attempt
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_for_model(&self, model: ModelKind) -> u64 {
        self.by_model
            .read()
            .map(|m| m.get(&model).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn count_for_label(&self, label: RiskLabel) -> u64 {
        self.by_label
            .read()
            .map(|m| m.get(&label).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Pipeline latency statistics
    pub fn latency_stats(&self) -> LatencyStats {
        let Ok(times) = self.latencies.read() else {
            return LatencyStats::default();
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = times.clone();
        sorted.sort_unstable();

        let count = sorted.len();
        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: sorted[count / 2],
            max_us: sorted[count - 1],
        }
    }

    /// Snapshot of the session counters
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            predictions: self.predictions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            high_risk: self.count_for_label(RiskLabel::HighRisk),
            low_risk: self.count_for_label(RiskLabel::LowRisk),
            by_model: ModelKind::ALL.map(|kind| (kind, self.count_for_model(kind))),
            latency: self.latency_stats(),
            session_secs: self.started.elapsed().as_secs(),
        }
    }

    /// Print the session summary to stdout and log it.
    ///
    /// Printed directly so it shows up under the default `warn` filter.
    pub fn print_summary(&self) {
        let summary = self.summary();
        println!("{}", summary);

        info!(
            predictions = summary.predictions,
            failures = summary.failures,
            high_risk = summary.high_risk,
            low_risk = summary.low_risk,
            mean_us = summary.latency.mean_us,
            session_secs = summary.session_secs,
            "Session summary"
        );
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline time statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub max_us: u64,
}

/// Counters for one form session
#[derive(Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub predictions: u64,
    pub failures: u64,
    pub high_risk: u64,
    pub low_risk: u64,
    pub by_model: [(ModelKind, u64); 3],
    pub latency: LatencyStats,
    pub session_secs: u64,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resumen de la sesión")?;
        writeln!(
            f,
            "  Predicciones: {} ({} alto riesgo, {} bajo riesgo), errores: {}",
            self.predictions, self.high_risk, self.low_risk, self.failures
        )?;
        let usage: Vec<String> = self
            .by_model
            .iter()
            .map(|(kind, count)| format!("{}={}", kind, count))
            .collect();
        writeln!(f, "  Modelos: {}", usage.join(", "))?;
        write!(
            f,
            "  Latencia: media {}us, p50 {}us, max {}us",
            self.latency.mean_us, self.latency.p50_us, self.latency.max_us
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = SessionMetrics::new();

        metrics.record_prediction(ModelKind::Knn, RiskLabel::HighRisk, Duration::from_micros(100));
        metrics.record_prediction(ModelKind::Knn, RiskLabel::LowRisk, Duration::from_micros(300));
        metrics.record_prediction(ModelKind::Nn, RiskLabel::LowRisk, Duration::from_micros(200));
        metrics.record_failure();

        assert_eq!(metrics.predictions.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.count_for_model(ModelKind::Knn), 2);
        assert_eq!(metrics.count_for_model(ModelKind::Dt), 0);
        assert_eq!(metrics.count_for_label(RiskLabel::LowRisk), 2);

        assert_eq!(
            metrics.latency_stats(),
            LatencyStats {
                count: 3,
                mean_us: 200,
                p50_us: 200,
                max_us: 300,
            }
        );
    }

    #[test]
    fn test_empty_latency() {
        assert_eq!(SessionMetrics::new().latency_stats(), LatencyStats::default());
    }

    #[test]
    fn test_latency_samples_are_capped() {
        let metrics = SessionMetrics::new();

        for i in 0..=MAX_LATENCY_SAMPLES as u64 {
            metrics.record_prediction(ModelKind::Dt, RiskLabel::LowRisk, Duration::from_micros(i));
        }

        let stats = metrics.latency_stats();
        assert_eq!(stats.count, (MAX_LATENCY_SAMPLES / 2 + 1) as u64);
        assert_eq!(stats.max_us, MAX_LATENCY_SAMPLES as u64);
        assert_eq!(
            metrics.predictions.load(Ordering::Relaxed),
            MAX_LATENCY_SAMPLES as u64 + 1
        );
    }

    #[test]
    fn test_summary_text() {
        let metrics = SessionMetrics::new();
        metrics.record_prediction(ModelKind::Nn, RiskLabel::HighRisk, Duration::from_micros(40));
        metrics.record_failure();

        let summary = metrics.summary();
        assert_eq!(summary.predictions, 1);
        assert_eq!(summary.high_risk, 1);
        assert_eq!(
            summary.by_model,
            [(ModelKind::Nn, 1), (ModelKind::Knn, 0), (ModelKind::Dt, 0)]
        );

        let text = summary.to_string();
        assert!(text.contains("Predicciones: 1 (1 alto riesgo, 0 bajo riesgo), errores: 1"));
        assert!(text.contains("Nn=1, Knn=0, Dt=0"));
        assert!(text.contains("media 40us"));
    }
}
