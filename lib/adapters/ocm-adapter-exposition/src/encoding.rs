//! Prometheus text rendering of generated families.

use anyhow::{Context, Result};
use prometheus::proto;
use prometheus::{Encoder, TextEncoder};

use ocm_domain::{MetricFamily, MetricType};

pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

fn to_proto(family: &MetricFamily) -> proto::MetricFamily {
    let mut encoded = proto::MetricFamily::default();
    encoded.set_name(family.name.clone());
    encoded.set_help(family.help.clone());
    encoded.set_field_type(match family.metric_type {
        MetricType::Gauge => proto::MetricType::GAUGE,
    });

    for metric in &family.metrics {
        let mut sample = proto::Metric::default();
        for (key, value) in metric.labels() {
            let mut pair = proto::LabelPair::default();
            pair.set_name(key.to_string());
            pair.set_value(value.to_string());
            sample.mut_label().push(pair);
        }
        let mut gauge = proto::Gauge::default();
        gauge.set_value(metric.value());
        sample.set_gauge(gauge);
        encoded.mut_metric().push(sample);
    }
    encoded
}

/// Renders families in order, keeping each sample's label order. Families
/// without samples are left out.
pub fn encode_text(families: &[MetricFamily]) -> Result<String> {
    let encoded: Vec<_> = families
        .iter()
        .filter(|family| !family.is_empty())
        .map(to_proto)
        .collect();

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&encoded, &mut buffer)
        .context("failed to encode metric families")?;
    String::from_utf8(buffer).context("metrics output is not valid UTF-8")
}
