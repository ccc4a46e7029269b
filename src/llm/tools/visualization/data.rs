//! Chart data model and normalization of model-supplied arguments.
//!
//! Models send chart data in many shapes: JSON objects, arrays of records, pairs,
//! or a JSON document encoded as a string, with numbers such as `"$45,000"` or
//! `"35%"`. Everything here turns that into typed series or a `DataError`.

use super::capability::ChartCapability;
use crate::error::{Result, VizAgentError};
use serde_json::Value;
use std::borrow::Cow;

const LABEL_KEYS: [&str; 5] = ["label", "category", "name", "x", "key"];
const VALUE_KEYS: [&str; 5] = ["value", "y", "count", "amount", "total"];

/// Upper bound on histogram buckets a caller may request.
pub const MAX_BINS: usize = 1000;

/// A chart ready to be persisted by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub capability: ChartCapability,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub data: ChartData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    /// Labelled values: bar, line and pie charts.
    Categorical(Vec<(String, f64)>),
    /// Paired observations: scatter plots.
    Points(Vec<(f64, f64)>),
    /// Raw values with their binned counts: histograms.
    Distribution { values: Vec<f64>, bins: Histogram },
    /// Several named series over shared x labels; gaps are `None`.
    MultiSeries { x_labels: Vec<String>, series: Vec<Series> },
}

impl ChartData {
    pub fn data_points(&self) -> usize {
        match self {
            ChartData::Categorical(pairs) => pairs.len(),
            ChartData::Points(points) => points.len(),
            ChartData::Distribution { values, .. } => values.len(),
            ChartData::MultiSeries { series, .. } => {
                series.iter().map(|s| s.values.iter().flatten().count()).sum()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Equal-width bins; `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

fn data_error(msg: impl Into<String>) -> VizAgentError {
    VizAgentError::DataError(msg.into())
}

/// Decode a value that may be a JSON document wrapped in a string.
pub(crate) fn decode(value: &Value) -> Result<Cow<'_, Value>> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                serde_json::from_str(trimmed)
                    .map(Cow::Owned)
                    .map_err(|e| data_error(format!("data is not valid JSON: {}", e)))
            } else {
                Err(data_error(format!("expected structured data, got text '{}'", s)))
            }
        }
        other => Ok(Cow::Borrowed(other)),
    }
}

/// Parse a number, tolerating currency symbols, grouping separators, percent signs
/// and k/M/B magnitude suffixes.
pub fn parse_number(value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| data_error(format!("{} is not finite", n))),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(*c, '$' | '€' | '£' | ',' | '_' | '%' | ' '))
                .collect();
            let (digits, scale) = match cleaned.chars().last() {
                Some('k' | 'K') => (&cleaned[..cleaned.len() - 1], 1e3),
                Some('m' | 'M') => (&cleaned[..cleaned.len() - 1], 1e6),
                Some('b' | 'B') => (&cleaned[..cleaned.len() - 1], 1e9),
                _ => (cleaned.as_str(), 1.0),
            };
            digits
                .parse::<f64>()
                .ok()
                .map(|n| n * scale)
                .filter(|n| n.is_finite())
                .ok_or_else(|| data_error(format!("'{}' is not a number", s)))
        }
        other => Err(data_error(format!("{} is not a number", other))),
    }
}

fn label_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn record_pair(record: &serde_json::Map<String, Value>) -> Result<(String, f64)> {
    if record.len() == 1 {
        if let Some((label, value)) = record.iter().next() {
            return Ok((label.clone(), parse_number(value)?));
        }
    }

    let label = LABEL_KEYS.iter().find_map(|k| record.get(*k));
    let value = VALUE_KEYS.iter().find_map(|k| record.get(*k));
    match (label, value) {
        (Some(label), Some(value)) => Ok((label_of(label), parse_number(value)?)),
        _ => Err(data_error(format!(
            "record {} needs a label ({}) and a value ({})",
            Value::Object(record.clone()),
            LABEL_KEYS.join("/"),
            VALUE_KEYS.join("/")
        ))),
    }
}

/// Normalize labelled data for bar, line and pie charts, preserving input order.
pub fn categorical(value: &Value) -> Result<Vec<(String, f64)>> {
    let value = decode(value)?;
    let pairs = match value.as_ref() {
        Value::Object(map) => map
            .iter()
            .map(|(label, v)| Ok((label.clone(), parse_number(v)?)))
            .collect::<Result<Vec<_>>>()?,
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(record) => record_pair(record),
                Value::Array(pair) if pair.len() == 2 => {
                    Ok((label_of(&pair[0]), parse_number(&pair[1])?))
                }
                other => Err(data_error(format!("cannot read a label and value from {}", other))),
            })
            .collect::<Result<Vec<_>>>()?,
        other => return Err(data_error(format!("expected an object or array, got {}", other))),
    };

    if pairs.is_empty() {
        return Err(data_error("no data points provided"));
    }
    Ok(pairs)
}

/// Normalize a flat list of numbers.
pub fn numeric_series(value: &Value) -> Result<Vec<f64>> {
    let value = decode(value)?;
    let values = match value.as_ref() {
        Value::Array(items) => items.iter().map(parse_number).collect::<Result<Vec<_>>>()?,
        other => return Err(data_error(format!("expected an array of numbers, got {}", other))),
    };

    if values.is_empty() {
        return Err(data_error("no data points provided"));
    }
    Ok(values)
}

/// Pair up x and y series for a scatter plot.
pub fn points(x: &Value, y: &Value) -> Result<Vec<(f64, f64)>> {
    let xs = numeric_series(x)?;
    let ys = numeric_series(y)?;
    if xs.len() != ys.len() {
        return Err(data_error(format!(
            "x_data has {} values but y_data has {}",
            xs.len(),
            ys.len()
        )));
    }
    Ok(xs.into_iter().zip(ys).collect())
}

/// Normalize `{series: {label: value}}` or `{series: [values]}` into aligned series.
pub fn multi_series(value: &Value, x_labels: Option<&Value>) -> Result<(Vec<String>, Vec<Series>)> {
    let value = decode(value)?;
    let map = match value.as_ref() {
        Value::Object(map) if !map.is_empty() => map,
        other => {
            return Err(data_error(format!(
                "expected an object mapping series names to data, got {}",
                other
            )))
        }
    };

    let all_lists = map.values().all(|v| v.is_array() && numeric_series(v).is_ok());
    if all_lists {
        let series = map
            .iter()
            .map(|(name, v)| {
                Ok(Series {
                    name: name.clone(),
                    values: numeric_series(v)?.into_iter().map(Some).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let len = series[0].values.len();
        if let Some(odd) = series.iter().find(|s| s.values.len() != len) {
            return Err(data_error(format!(
                "series '{}' has {} values, expected {}",
                odd.name,
                odd.values.len(),
                len
            )));
        }

        let labels = match x_labels {
            Some(labels) => {
                let labels = match decode(labels)?.as_ref() {
                    Value::Array(items) => items.iter().map(label_of).collect::<Vec<_>>(),
                    other => return Err(data_error(format!("x_labels must be an array, got {}", other))),
                };
                if labels.len() != len {
                    return Err(data_error(format!(
                        "{} x_labels given for {} points",
                        labels.len(),
                        len
                    )));
                }
                labels
            }
            None => (1..=len).map(|i| i.to_string()).collect(),
        };
        return Ok((labels, series));
    }

    let named = map
        .iter()
        .map(|(name, v)| Ok((name.clone(), categorical(v)?)))
        .collect::<Result<Vec<_>>>()?;

    let mut labels: Vec<String> = Vec::new();
    for (_, pairs) in &named {
        for (label, _) in pairs {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
    }

    let series = named
        .into_iter()
        .map(|(name, pairs)| Series {
            name,
            values: labels
                .iter()
                .map(|label| pairs.iter().find(|(l, _)| l == label).map(|(_, v)| *v))
                .collect(),
        })
        .collect();

    Ok((labels, series))
}

/// Bin values into `bins` equal-width buckets over `[min, max]`; the last bucket is closed.
pub fn histogram(values: &[f64], bins: usize) -> Result<Histogram> {
    if bins == 0 {
        return Err(data_error("bins must be at least 1"));
    }
    if bins > MAX_BINS {
        return Err(data_error(format!("bins must be at most {}, got {}", MAX_BINS, bins)));
    }
    if values.is_empty() {
        return Err(data_error("no data points provided"));
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bins as f64;

    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Ok(Histogram { edges, counts })
}
