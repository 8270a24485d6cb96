//! Opt-in wall-clock timing of named operations.
//!
//! Samples are kept per thread and drained by [`collect_report`]. Recording
//! is off unless [`set_timing_enabled`] turned it on (the CLI does so for
//! `--timing` or `SPI_TIMING`).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Totals per operation name, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TimingReport {
    pub operations: Vec<OpTiming>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpTiming {
    pub name: String,
    pub count: usize,
    #[serde(rename = "total_us", serialize_with = "as_micros")]
    pub total: Duration,
    #[serde(rename = "max_us", serialize_with = "as_micros")]
    pub max: Duration,
}

impl OpTiming {
    /// Mean duration, zero when there are no samples.
    #[must_use]
    pub fn mean(&self) -> Duration {
        u32::try_from(self.count)
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| self.total / n)
    }
}

fn as_micros<S: serde::Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(d.as_micros())
}

thread_local! {
    static SAMPLES: RefCell<Vec<(String, Duration)>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// True when `SPI_TIMING` holds a truthy value.
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("SPI_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(&value))
}

pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

/// Drop this thread's samples.
pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Run `f`, recording its duration under `name` when timing is enabled.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }
    let started = Instant::now();
    let result = f();
    record_sample(name, started.elapsed());
    result
}

/// Drain this thread's samples into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));

    let mut grouped: BTreeMap<String, OpTiming> = BTreeMap::new();
    for (name, elapsed) in samples {
        let op = grouped.entry(name.clone()).or_insert_with(|| OpTiming {
            name,
            count: 0,
            total: Duration::ZERO,
            max: Duration::ZERO,
        });
        op.count += 1;
        op.total += elapsed;
        op.max = op.max.max(elapsed);
    }

    TimingReport {
        operations: grouped.into_values().collect(),
    }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Plain-text table for stderr.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.operations.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let mut out = String::new();
        out.push_str("operation                    count    total     mean      max\n");
        out.push_str("--------------------------------------------------------------\n");
        for op in &self.operations {
            let _ = writeln!(
                out,
                "{:<28} {:>5} {:>8} {:>8} {:>8}",
                op.name,
                op.count,
                format_duration(op.total),
                format_duration(op.mean()),
                format_duration(op.max),
            );
        }
        out
    }
}

fn record_sample(name: &str, elapsed: Duration) {
    SAMPLES.with(|samples| samples.borrow_mut().push((name.to_string(), elapsed)));
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= 1_000_000 {
        format!("{}.{:03}s", micros / 1_000_000, (micros % 1_000_000) / 1_000)
    } else if micros >= 1_000 {
        format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
    } else {
        format!("{micros}µs")
    }
}

/// `1`, `true`, `yes` or `on`, any case.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|t| value.trim().eq_ignore_ascii_case(t))
}

/// `0`, `false`, `no` or `off`, any case.
#[must_use]
pub fn is_falsy(value: &str) -> bool {
    ["0", "false", "no", "off"]
        .iter()
        .any(|f| value.trim().eq_ignore_ascii_case(f))
}
