use crate::diagnostics::DiagnosticsSink;
use std::time::{Duration, Instant};

/// Times named steps of an evaluation and reports them through the sink.
///
/// A disabled profiler runs the closures and records nothing.
pub struct StepProfiler<'a> {
    enabled: bool,
    sink: &'a dyn DiagnosticsSink,
    timings: Vec<(String, Duration)>,
}

impl<'a> StepProfiler<'a> {
    pub fn new(enabled: bool, sink: &'a dyn DiagnosticsSink) -> Self {
        Self {
            enabled,
            sink,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        self.sink.info(&format!(
            "{} Execution Time: {}ms",
            step_name,
            elapsed.as_millis()
        ));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn report_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        let mut summary = String::from("Performance Summary:");
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            summary.push_str(&format!(
                "\n   {:.<35} {}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            ));
        }
        summary.push_str(&format!("\n   Total: {}ms", total.as_millis()));
        self.sink.debug(&summary);
    }
}
