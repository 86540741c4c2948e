//! Distance metrics
//!
//! All metrics operate on `f64` slices; stored and query vectors are coerced
//! with `Embedding::to_f64_vec` before scoring. Lower distance means more
//! similar.
//!
//! Built-ins:
//! - `euclidean`: L2 distance, computed on max-abs scaled differences so
//!   large magnitudes cannot overflow while squaring
//! - `cosine`: `1 - cos(a, b)`, always inside `[0, 2]`
//!
//! A metric that yields NaN is reported as `DegenerateVector`; NaN never
//! reaches the top-k selector.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use embedstore_core::{EmbedError, EmbedResult};

/// Signature of a registered metric
pub type MetricFn = fn(&[f64], &[f64]) -> EmbedResult<f64>;

/// Name of the built-in Euclidean metric
pub const EUCLIDEAN: &str = "euclidean";

/// Name of the built-in cosine metric
pub const COSINE: &str = "cosine";

static DEFAULT_METRICS: Lazy<MetricRegistry> = Lazy::new(MetricRegistry::default);

/// A resolved metric, ready to score vectors
#[derive(Clone, Copy)]
pub struct Metric<'a> {
    name: &'a str,
    func: MetricFn,
}

impl std::fmt::Debug for Metric<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metric").field("name", &self.name).finish()
    }
}

impl<'a> Metric<'a> {
    /// Registered name
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Distance between `a` and `b`
    ///
    /// Fails with `DimensionMismatch` on unequal lengths and with
    /// `DegenerateVector` if the metric produces NaN.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> EmbedResult<f64> {
        if a.len() != b.len() {
            return Err(EmbedError::DimensionMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        let d = (self.func)(a, b)?;
        if d.is_nan() {
            return Err(EmbedError::degenerate(self.name, "distance is NaN"));
        }
        Ok(d)
    }
}

/// Name → metric function table
#[derive(Clone)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, MetricFn>,
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("metrics", &self.metrics.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        let mut registry = MetricRegistry::empty();
        registry.register(EUCLIDEAN, euclidean);
        registry.register(COSINE, cosine);
        registry
    }
}

impl MetricRegistry {
    /// Registry with no metrics
    pub fn empty() -> Self {
        MetricRegistry {
            metrics: BTreeMap::new(),
        }
    }

    /// Add or replace a metric; names are case-insensitive
    pub fn register(&mut self, name: &str, func: MetricFn) {
        self.metrics.insert(name.to_ascii_lowercase(), func);
    }

    /// Look up a metric by name
    pub fn get(&self, name: &str) -> EmbedResult<Metric<'_>> {
        self.metrics
            .get_key_value(name.to_ascii_lowercase().as_str())
            .map(|(name, func)| Metric {
                name: name.as_str(),
                func: *func,
            })
            .ok_or_else(|| EmbedError::UnsupportedMetric {
                name: name.to_string(),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.metrics.keys().cloned().collect()
    }

    /// Distance between `a` and `b` under `metric`
    pub fn distance(&self, a: &[f64], b: &[f64], metric: &str) -> EmbedResult<f64> {
        self.get(metric)?.distance(a, b)
    }
}

/// Process-wide registry holding the built-in metrics
pub fn default_metrics() -> &'static MetricRegistry {
    &DEFAULT_METRICS
}

/// Distance under a built-in metric
pub fn distance(a: &[f64], b: &[f64], metric: &str) -> EmbedResult<f64> {
    DEFAULT_METRICS.distance(a, b, metric)
}

/// Names of the built-in metrics, sorted
pub fn list_supported_metrics() -> Vec<String> {
    DEFAULT_METRICS.names()
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0f64, |m, x| m.max(x.abs()))
}

fn has_nan(v: &[f64]) -> bool {
    v.iter().any(|x| x.is_nan())
}

/// Euclidean (L2) distance
///
/// Any infinite element-wise difference yields `+inf`.
pub fn euclidean(a: &[f64], b: &[f64]) -> EmbedResult<f64> {
    if has_nan(a) || has_nan(b) {
        return Err(EmbedError::degenerate(EUCLIDEAN, "vector contains NaN"));
    }

    let mut scale = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let d = x - y;
        if d.is_nan() {
            // inf - inf
            return Err(EmbedError::degenerate(
                EUCLIDEAN,
                "difference of equal infinities is undefined",
            ));
        }
        if d.is_infinite() {
            return Ok(f64::INFINITY);
        }
        scale = scale.max(d.abs());
    }
    if scale == 0.0 {
        return Ok(0.0);
    }

    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let s = (x - y) / scale;
            s * s
        })
        .sum();
    Ok(scale * sum.sqrt())
}

/// Cosine distance, `1 - dot(a, b) / (|a| |b|)`
///
/// Zero-norm and non-finite vectors are `DegenerateVector`.
pub fn cosine(a: &[f64], b: &[f64]) -> EmbedResult<f64> {
    if has_nan(a) || has_nan(b) {
        return Err(EmbedError::degenerate(COSINE, "vector contains NaN"));
    }
    let sa = max_abs(a);
    let sb = max_abs(b);
    if sa.is_infinite() || sb.is_infinite() {
        return Err(EmbedError::degenerate(COSINE, "norm is not finite"));
    }
    if sa == 0.0 || sb == 0.0 {
        return Err(EmbedError::degenerate(COSINE, "zero-norm vector"));
    }

    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let x = x / sa;
        let y = y / sb;
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let cos = (dot / (na.sqrt() * nb.sqrt())).clamp(-1.0, 1.0);
    Ok(1.0 - cos)
}
