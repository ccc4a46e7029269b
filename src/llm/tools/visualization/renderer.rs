//! Persisting charts to the output directory.
//!
//! Rendering to pixels is left to whatever consumes the artifacts. The default
//! [`VegaLiteRenderer`] writes a self-contained Vega-Lite v5 document per chart,
//! which any Vega-Lite viewer or editor can draw.

use super::capability::ChartCapability;
use super::data::{ChartData, ChartSpec};
use crate::error::Result;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Writes a chart under an output directory and returns the artifact path.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, spec: &ChartSpec, output_dir: &Path) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VegaLiteRenderer;

impl VegaLiteRenderer {
    /// Build the Vega-Lite document for a chart.
    pub fn document(&self, spec: &ChartSpec) -> Value {
        let mut doc = json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": spec.title,
            "width": 640,
            "height": 400,
            "usermeta": {
                "generator": env!("CARGO_PKG_NAME"),
                "chart_type": spec.capability.kind(),
                "created_at": chrono::Utc::now().to_rfc3339(),
            },
        });

        let body = match (&spec.data, spec.capability) {
            (ChartData::Categorical(pairs), ChartCapability::PieChart) => json!({
                "data": { "values": label_values(pairs) },
                "mark": { "type": "arc", "tooltip": true },
                "encoding": {
                    "theta": { "field": "value", "type": "quantitative", "stack": true },
                    "color": { "field": "label", "type": "nominal", "sort": null, "title": spec.x_label },
                },
                "view": { "stroke": null },
            }),
            (ChartData::Categorical(pairs), ChartCapability::LineChart) => json!({
                "data": { "values": label_values(pairs) },
                "mark": { "type": "line", "point": true, "tooltip": true },
                "encoding": {
                    "x": { "field": "label", "type": "ordinal", "sort": null, "title": spec.x_label },
                    "y": { "field": "value", "type": "quantitative", "title": spec.y_label },
                },
            }),
            (ChartData::Categorical(pairs), _) => json!({
                "data": { "values": label_values(pairs) },
                "mark": { "type": "bar", "tooltip": true },
                "encoding": {
                    "x": { "field": "label", "type": "nominal", "sort": null, "title": spec.x_label },
                    "y": { "field": "value", "type": "quantitative", "title": spec.y_label },
                },
            }),
            (ChartData::Points(points), _) => json!({
                "data": {
                    "values": points.iter().map(|(x, y)| json!({ "x": x, "y": y })).collect::<Vec<_>>()
                },
                "mark": { "type": "point", "filled": true, "tooltip": true },
                "encoding": {
                    "x": { "field": "x", "type": "quantitative", "scale": { "zero": false }, "title": spec.x_label },
                    "y": { "field": "y", "type": "quantitative", "scale": { "zero": false }, "title": spec.y_label },
                },
            }),
            (ChartData::Distribution { bins, .. }, _) => json!({
                "data": {
                    "values": bins
                        .counts
                        .iter()
                        .zip(bins.edges.windows(2))
                        .map(|(count, edge)| json!({ "bin_start": edge[0], "bin_end": edge[1], "count": count }))
                        .collect::<Vec<_>>()
                },
                "mark": { "type": "bar", "tooltip": true },
                "encoding": {
                    "x": { "field": "bin_start", "type": "quantitative", "bin": { "binned": true }, "title": spec.x_label },
                    "x2": { "field": "bin_end" },
                    "y": { "field": "count", "type": "quantitative", "title": spec.y_label },
                },
            }),
            (ChartData::MultiSeries { x_labels, series }, _) => {
                let values: Vec<Value> = series
                    .iter()
                    .flat_map(|s| {
                        x_labels.iter().zip(&s.values).filter_map(move |(x, v)| {
                            v.map(|v| json!({ "x": x, "series": s.name, "value": v }))
                        })
                    })
                    .collect();
                json!({
                    "data": { "values": values },
                    "mark": { "type": "line", "point": true, "tooltip": true },
                    "encoding": {
                        "x": { "field": "x", "type": "ordinal", "sort": x_labels, "title": spec.x_label },
                        "y": { "field": "value", "type": "quantitative", "title": spec.y_label },
                        "color": { "field": "series", "type": "nominal", "sort": null, "title": "Series" },
                    },
                })
            }
        };

        if let (Value::Object(doc_map), Value::Object(body_map)) = (&mut doc, body) {
            doc_map.extend(body_map);
        }
        doc
    }
}

fn label_values(pairs: &[(String, f64)]) -> Vec<Value> {
    pairs.iter().map(|(label, value)| json!({ "label": label, "value": value })).collect()
}

impl ChartRenderer for VegaLiteRenderer {
    fn render(&self, spec: &ChartSpec, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let id = uuid::Uuid::new_v4().simple().to_string();
        let path = output_dir.join(format!("{}_{}.vl.json", spec.capability.kind(), &id[..8]));

        let document = serde_json::to_string_pretty(&self.document(spec))?;
        std::fs::write(&path, document)?;

        debug!(path = %path.display(), "Wrote chart specification");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::tools::visualization::data::{histogram, Series};
    use regex::Regex;
    use tempfile::TempDir;

    fn spec(capability: ChartCapability, data: ChartData) -> ChartSpec {
        ChartSpec {
            capability,
            title: "Q4 Sales Performance".to_string(),
            x_label: "Month".to_string(),
            y_label: "Sales ($)".to_string(),
            data,
        }
    }

    fn sales() -> ChartData {
        ChartData::Categorical(vec![
            ("December".to_string(), 45000.0),
            ("November".to_string(), 38000.0),
        ])
    }

    #[test]
    fn test_bar_document() {
        let doc = VegaLiteRenderer.document(&spec(ChartCapability::BarChart, sales()));

        assert_eq!(doc["$schema"], VEGA_LITE_SCHEMA);
        assert_eq!(doc["title"], "Q4 Sales Performance");
        assert_eq!(doc["mark"]["type"], "bar");
        assert_eq!(doc["encoding"]["x"]["title"], "Month");
        assert_eq!(doc["data"]["values"][0]["label"], "December");
        assert_eq!(doc["data"]["values"][1]["value"], 38000.0);
        assert_eq!(doc["usermeta"]["chart_type"], "bar_chart");
    }

    #[test]
    fn test_pie_and_line_marks() {
        let pie = VegaLiteRenderer.document(&spec(ChartCapability::PieChart, sales()));
        assert_eq!(pie["mark"]["type"], "arc");
        assert_eq!(pie["encoding"]["theta"]["field"], "value");

        let line = VegaLiteRenderer.document(&spec(ChartCapability::LineChart, sales()));
        assert_eq!(line["mark"]["type"], "line");
        assert_eq!(line["encoding"]["x"]["type"], "ordinal");
    }

    #[test]
    fn test_histogram_document_is_prebinned() {
        let values = vec![1.0, 2.0, 2.5, 4.0];
        let bins = histogram(&values, 3).unwrap();
        let doc = VegaLiteRenderer
            .document(&spec(ChartCapability::Histogram, ChartData::Distribution { values, bins }));

        let rows = doc["data"]["values"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["bin_start"], 1.0);
        assert_eq!(rows[2]["bin_end"], 4.0);
        assert_eq!(doc["encoding"]["x"]["bin"]["binned"], true);
    }

    #[test]
    fn test_multi_series_skips_gaps() {
        let data = ChartData::MultiSeries {
            x_labels: vec!["Jan".to_string(), "Feb".to_string()],
            series: vec![
                Series { name: "Revenue".to_string(), values: vec![Some(120000.0), Some(135000.0)] },
                Series { name: "Expenses".to_string(), values: vec![None, Some(98000.0)] },
            ],
        };

        let doc = VegaLiteRenderer.document(&spec(ChartCapability::MultiLineChart, data));

        let rows = doc["data"]["values"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["series"], "Expenses");
        assert_eq!(doc["encoding"]["x"]["sort"], json!(["Jan", "Feb"]));
    }

    #[test]
    fn test_render_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("business_charts");

        let path = VegaLiteRenderer.render(&spec(ChartCapability::BarChart, sales()), &out).unwrap();

        assert!(path.starts_with(&out));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(Regex::new(r"^bar_chart_[0-9a-f]{8}\.vl\.json$").unwrap().is_match(&name));

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["title"], "Q4 Sales Performance");
    }
}
