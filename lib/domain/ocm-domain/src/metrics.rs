use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Gauge,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
        }
    }
}

/// Name, type and help text of one metric family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyDescriptor {
    pub name: String,
    pub metric_type: MetricType,
    pub help: String,
}

impl FamilyDescriptor {
    pub fn gauge(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metric_type: MetricType::Gauge,
            help: help.into(),
        }
    }
}

/// A single labeled sample.
///
/// Labels are only ever added as key/value pairs, so the key and value
/// sequences always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    label_keys: Vec<String>,
    label_values: Vec<String>,
    value: f64,
}

impl Metric {
    pub fn new(value: f64) -> Self {
        Self {
            label_keys: Vec::new(),
            label_values: Vec::new(),
            value,
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.label_keys.push(key.into());
        self.label_values.push(value.into());
        self
    }

    /// Zips `keys` with `values`; extra entries on either side are dropped.
    pub fn with_labels<K, V>(
        mut self,
        keys: impl IntoIterator<Item = K>,
        values: impl IntoIterator<Item = V>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in keys.into_iter().zip(values) {
            self = self.with_label(key, value);
        }
        self
    }

    /// Inserts a label ahead of all existing ones.
    pub fn prepend_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.label_keys.insert(0, key.into());
        self.label_values.insert(0, value.into());
    }

    pub fn label_keys(&self) -> &[String] {
        &self.label_keys
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.label_keys
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, value)| value)
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub metric_type: MetricType,
    pub help: String,
    pub metrics: Vec<Metric>,
}

impl MetricFamily {
    pub fn empty(descriptor: &FamilyDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            metric_type: descriptor.metric_type,
            help: descriptor.help.clone(),
            metrics: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
