use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for what the monitor loop is doing.
///
/// Everything reported here goes to diagnostics, never to the signal
/// stream on stdout.
pub trait MonitorLogger: Send {
    /// One classified sample.
    fn sample(&mut self, has_face: bool);

    /// Wall time a named stage took for one sample.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything. Used where diagnostics are irrelevant.
pub struct NullMonitorLogger;

impl MonitorLogger for NullMonitorLogger {
    fn sample(&mut self, _has_face: bool) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Default)]
struct StageStats {
    count: usize,
    total_ms: f64,
    max_ms: f64,
}

impl StageStats {
    fn record(&mut self, duration_ms: f64) {
        self.count += 1;
        self.total_ms += duration_ms;
        self.max_ms = self.max_ms.max(duration_ms);
    }

    fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Routes monitor diagnostics through the `log` crate.
///
/// Sample counts are logged at debug level every `throttle_samples`
/// samples. Stage timings are aggregated and reported by [`summary`].
///
/// [`summary`]: MonitorLogger::summary
pub struct LogMonitorLogger {
    throttle_samples: usize,
    stages: BTreeMap<String, StageStats>,
    started_at: Instant,
    samples: usize,
    positive_samples: usize,
}

impl LogMonitorLogger {
    pub fn new(throttle_samples: usize) -> Self {
        Self {
            throttle_samples: throttle_samples.max(1),
            stages: BTreeMap::new(),
            started_at: Instant::now(),
            samples: 0,
            positive_samples: 0,
        }
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn positive_samples(&self) -> usize {
        self.positive_samples
    }

    /// Average duration for `stage`, if it was ever recorded.
    pub fn average_ms(&self, stage: &str) -> Option<f64> {
        self.stages.get(stage).map(StageStats::avg_ms)
    }

    /// Formatted run report, or `None` before the first sample.
    pub fn summary_string(&self) -> Option<String> {
        if self.samples == 0 {
            return None;
        }

        let elapsed_s = self.started_at.elapsed().as_secs_f64();
        let face_pct = self.positive_samples as f64 / self.samples as f64 * 100.0;
        let mut lines = vec![format!(
            "Monitor summary ({} samples over {elapsed_s:.1}s, face in {face_pct:.1}%):",
            self.samples
        )];

        for (stage, stats) in &self.stages {
            lines.push(format!(
                "  {stage:8}: avg {:6.1}ms  max {:6.1}ms",
                stats.avg_ms(),
                stats.max_ms
            ));
        }

        if elapsed_s > 0.0 {
            lines.push(format!(
                "  Sample rate: {:.1}/s",
                self.samples as f64 / elapsed_s
            ));
        }

        Some(lines.join("\n"))
    }
}

impl Default for LogMonitorLogger {
    fn default() -> Self {
        Self::new(50)
    }
}

impl MonitorLogger for LogMonitorLogger {
    fn sample(&mut self, has_face: bool) {
        self.samples += 1;
        if has_face {
            self.positive_samples += 1;
        }
        if self.samples % self.throttle_samples == 0 {
            log::debug!(
                "{} samples, {} with a face",
                self.samples,
                self.positive_samples
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
