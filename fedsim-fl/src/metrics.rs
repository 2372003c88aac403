//! Tagged per-client metrics and round-level reduction.
//!
//! A metric entry is either a number or an explicit failure marker;
//! reduction pattern-matches on the tag rather than type-checking loose
//! values at runtime.

use std::collections::BTreeMap;
use std::fmt;

use fedsim_common::ClientId;
use serde::{Deserialize, Serialize};

/// The fixed key set reduced into round summaries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricKey {
    /// Mean loss.
    Loss,
    /// Word error rate.
    Wer,
    /// BLEU score.
    Bleu,
}

impl MetricKey {
    /// All keys, in reduction order.
    pub const ALL: [MetricKey; 3] = [MetricKey::Loss, MetricKey::Wer, MetricKey::Bleu];
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKey::Loss => write!(f, "loss"),
            MetricKey::Wer => write!(f, "wer"),
            MetricKey::Bleu => write!(f, "bleu"),
        }
    }
}

/// One metric entry: a numeric result or an explicit failure marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    /// The metric was computed.
    Number(f64),
    /// The metric could not be computed; carries the reason.
    Failed(String),
}

impl MetricValue {
    /// Returns the numeric value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(v) => Some(*v),
            MetricValue::Failed(_) => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Number(v) => write!(f, "{v}"),
            MetricValue::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Ordered per-client metrics record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    entries: BTreeMap<MetricKey, MetricValue>,
}

impl MetricsRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record where every key carries the same failure marker.
    ///
    /// Used when a client produced no usable signal at all; no numeric
    /// values survive for reduction.
    pub fn all_failed(reason: &str) -> Self {
        let mut record = Self::new();
        for key in MetricKey::ALL {
            record.record_failure(key, reason.to_string());
        }
        record
    }

    /// Records a numeric value for `key`.
    pub fn record_number(&mut self, key: MetricKey, value: f64) {
        self.entries.insert(key, MetricValue::Number(value));
    }

    /// Records a failure marker for `key`.
    pub fn record_failure(&mut self, key: MetricKey, reason: String) {
        self.entries.insert(key, MetricValue::Failed(reason));
    }

    /// Returns the numeric value for `key`, if one was recorded.
    pub fn numeric(&self, key: MetricKey) -> Option<f64> {
        self.entries.get(&key).and_then(MetricValue::as_number)
    }

    /// Returns the raw entry for `key`.
    pub fn get(&self, key: MetricKey) -> Option<&MetricValue> {
        self.entries.get(&key)
    }

    /// Returns true if no entries were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&MetricKey, &MetricValue)> {
        self.entries.iter()
    }
}

impl fmt::Display for MetricsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            match value {
                MetricValue::Number(v) => write!(f, "{key}={v:.4}")?,
                MetricValue::Failed(_) => write!(f, "{key}=failed")?,
            }
        }
        Ok(())
    }
}

/// Reduces per-client records into round-level means.
///
/// For each key in [`MetricKey::ALL`], the arithmetic mean over clients
/// that produced a numeric value; clients whose record carries a failure
/// marker for the key are excluded from the denominator, and a key with no
/// numeric contributor at all is omitted from the result.
pub fn reduce_metrics(per_client: &[(ClientId, MetricsRecord)]) -> BTreeMap<MetricKey, f64> {
    let mut averaged = BTreeMap::new();
    for key in MetricKey::ALL {
        let values: Vec<f64> = per_client
            .iter()
            .filter_map(|(_, record)| record.numeric(key))
            .collect();
        if !values.is_empty() {
            averaged.insert(key, values.iter().sum::<f64>() / values.len() as f64);
        }
    }
    averaged
}
