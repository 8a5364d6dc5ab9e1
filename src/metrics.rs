//! Metrics collection and reporting for iteration runs.
//!
//! The metrics module provides an extensible API for tracking what an
//! iteration did: how many supersteps ran, how many envelopes of each subtype
//! were shipped, how many messages were delivered, how many vertices changed.
//! Users can register custom metrics alongside the built-in ones and print or
//! save the collected values after the run.
//!
//! Attach a collector with
//! [`VertexCentricIteration::set_metrics`](crate::VertexCentricIteration::set_metrics);
//! keep a clone to read the snapshot afterwards (the collector is cheaply
//! cloneable and all clones share state).
//!
//! # Example
//!
//! ```no_run
//! use vertexflow::metrics::MetricsCollector;
//!
//! # fn main() -> anyhow::Result<()> {
//! let collector = MetricsCollector::new();
//! // ... hand a clone to the iteration builder, run the job ...
//! collector.print();
//! collector.save_to_file("iteration_metrics.json")?;
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use serde_json::{Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Counter maintained by the driver: supersteps executed.
pub const SUPERSTEPS: &str = "supersteps";
/// Counter maintained by the driver: explicit-list envelopes shipped.
pub const EXPLICIT_ENVELOPES: &str = "explicit_envelopes";
/// Counter maintained by the driver: broadcast envelopes shipped.
pub const BROADCAST_ENVELOPES: &str = "broadcast_envelopes";
/// Counter maintained by the driver: unpacked `(recipient, payload)` pairs.
pub const MESSAGES_DELIVERED: &str = "messages_delivered";
/// Counter maintained by the driver: states emitted into the work set.
pub const VERTICES_UPDATED: &str = "vertices_updated";
/// Gauge maintained by the driver: the configured iteration name.
pub const ITERATION_NAME: &str = "iteration_name";

/// Trait for custom metrics.
pub trait Metric: Send + Sync + Any {
    /// The name of this metric (e.g. `messages_delivered`).
    fn name(&self) -> &str;

    /// The current value of this metric as a JSON value.
    fn value(&self) -> Value;

    /// Optional description of what this metric measures.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Cast to `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A monotonically increasing counter.
pub struct CounterMetric {
    name: String,
    value: AtomicU64,
}

impl CounterMetric {
    /// Create a counter starting at zero.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    /// Create a counter with an initial value.
    pub fn with_value(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value: AtomicU64::new(value),
        }
    }

    /// Increase the counter by `by`.
    pub fn add(&self, by: u64) {
        self.value.fetch_add(by, Ordering::Relaxed);
    }

    /// The current count.
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.get())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A metric holding an arbitrary last-written JSON value.
pub struct GaugeMetric {
    name: String,
    value: Mutex<Value>,
}

impl GaugeMetric {
    /// Create a gauge with an initial value.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Mutex::new(value),
        }
    }

    /// Replace the gauge's value.
    pub fn set(&self, value: Value) {
        *self.value.lock().unwrap() = value;
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        self.value.lock().unwrap().clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Thread-safe container for collecting iteration metrics.
///
/// Cheaply cloneable; all clones share the same underlying state.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

struct MetricsCollectorInner {
    metrics: Vec<Box<dyn Metric>>,
    started: Option<Instant>,
    elapsed: Option<Duration>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsCollectorInner {
                metrics: Vec::new(),
                started: None,
                elapsed: None,
            })),
        }
    }

    /// Register a metric. A metric registered under an existing name shadows
    /// the older one in the snapshot.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.inner.lock().unwrap().metrics.push(metric);
    }

    /// Increase the named counter by `by`, creating it at zero if absent.
    ///
    /// Non-counter metrics under the same name are left untouched.
    pub fn add_to_counter(&self, name: &str, by: u64) {
        let mut inner = self.inner.lock().unwrap();
        for metric in &inner.metrics {
            if metric.name() == name {
                if let Some(counter) = metric.as_any().downcast_ref::<CounterMetric>() {
                    counter.add(by);
                    return;
                }
            }
        }
        inner
            .metrics
            .push(Box::new(CounterMetric::with_value(name, by)));
    }

    /// Set the named gauge, creating it if absent.
    pub fn set_gauge(&self, name: &str, value: Value) {
        let mut inner = self.inner.lock().unwrap();
        for metric in &inner.metrics {
            if metric.name() == name {
                if let Some(gauge) = metric.as_any().downcast_ref::<GaugeMetric>() {
                    gauge.set(value);
                    return;
                }
            }
        }
        inner.metrics.push(Box::new(GaugeMetric::new(name, value)));
    }

    /// The current value of the named counter, if one exists.
    pub fn counter(&self, name: &str) -> Option<u64> {
        let inner = self.inner.lock().unwrap();
        inner.metrics.iter().find_map(|metric| {
            (metric.name() == name)
                .then(|| metric.as_any().downcast_ref::<CounterMetric>())
                .flatten()
                .map(CounterMetric::get)
        })
    }

    /// Mark the start of the measured run.
    pub fn record_start(&self) {
        self.inner.lock().unwrap().started = Some(Instant::now());
    }

    /// Mark the end of the measured run.
    pub fn record_end(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.elapsed = inner.started.map(|s| s.elapsed());
    }

    /// The measured wall-clock duration, if both marks were recorded.
    pub fn elapsed(&self) -> Option<Duration> {
        self.inner.lock().unwrap().elapsed
    }

    /// All metric values by name. Later registrations win on name collision.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        let inner = self.inner.lock().unwrap();
        let mut out = HashMap::new();
        for metric in &inner.metrics {
            out.insert(metric.name().to_string(), metric.value());
        }
        if let Some(elapsed) = inner.elapsed {
            out.insert("elapsed_ms".to_string(), json!(elapsed.as_millis() as u64));
        }
        out
    }

    /// Print all metrics to stdout.
    pub fn print(&self) {
        let snapshot = self.snapshot();
        let mut names: Vec<&String> = snapshot.keys().collect();
        names.sort();
        println!("=== Iteration Metrics ===");
        for name in names {
            println!("{name}: {}", snapshot[name]);
        }
    }

    /// Write all metrics to a file as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created or written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
