//! Chart tools exposed to the model, one per enabled chart capability.

use super::capability::ChartCapability;
use super::data::{self, ChartData, ChartSpec};
use super::renderer::ChartRenderer;
use crate::error::{Result, VizAgentError};
use crate::llm::tools::{LlmTool, ToolDescriptor};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_BINS: usize = 10;

/// One chart-creation function exposed to the model.
///
/// Invalid data supplied by the model is reported back as a `"status": "error"`
/// result so the model can correct the call; only filesystem failures are errors.
#[derive(Clone)]
pub struct ChartTool {
    capability: ChartCapability,
    output_dir: PathBuf,
    renderer: Arc<dyn ChartRenderer>,
}

impl ChartTool {
    pub fn new(
        capability: ChartCapability,
        output_dir: impl Into<PathBuf>,
        renderer: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            capability,
            output_dir: output_dir.into(),
            renderer,
        }
    }

    pub fn capability(&self) -> ChartCapability {
        self.capability
    }

    fn default_title(&self) -> &'static str {
        match self.capability {
            ChartCapability::BarChart => "Bar Chart",
            ChartCapability::LineChart => "Line Chart",
            ChartCapability::ScatterPlot => "Scatter Plot",
            ChartCapability::PieChart => "Pie Chart",
            ChartCapability::Histogram => "Histogram",
            ChartCapability::MultiLineChart => "Multi-Line Chart",
        }
    }

    fn default_axes(&self) -> (&'static str, &'static str) {
        match self.capability {
            ChartCapability::BarChart => ("Categories", "Values"),
            ChartCapability::PieChart => ("Category", "Share"),
            ChartCapability::Histogram => ("Values", "Frequency"),
            ChartCapability::LineChart
            | ChartCapability::ScatterPlot
            | ChartCapability::MultiLineChart => ("X", "Y"),
        }
    }

    fn build_spec(&self, args: &HashMap<String, Value>) -> Result<ChartSpec> {
        let text = |key: &str, default: &str| {
            args.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let required = |key: &str| {
            args.get(key)
                .filter(|v| !v.is_null())
                .ok_or_else(|| VizAgentError::DataError(format!("missing required argument: {}", key)))
        };

        let data = match self.capability {
            ChartCapability::BarChart | ChartCapability::LineChart | ChartCapability::PieChart => {
                ChartData::Categorical(data::categorical(required("data")?)?)
            }
            ChartCapability::ScatterPlot => match (args.get("x_data"), args.get("y_data")) {
                (Some(x), Some(y)) => ChartData::Points(data::points(x, y)?),
                _ => {
                    // A single `data` object with `x` and `y` arrays is accepted too
                    let combined = data::decode(required("data")?)?;
                    ChartData::Points(data::points(&combined["x"], &combined["y"])?)
                }
            },
            ChartCapability::Histogram => {
                let values = data::numeric_series(required("data")?)?;
                let bins = match args.get("bins") {
                    None | Some(Value::Null) => DEFAULT_BINS,
                    Some(v) => {
                        let n = data::parse_number(v)?;
                        if n < 1.0 || n.fract() != 0.0 {
                            return Err(VizAgentError::DataError(format!(
                                "bins must be a positive whole number, got {}",
                                v
                            )));
                        }
                        if n > data::MAX_BINS as f64 {
                            return Err(VizAgentError::DataError(format!(
                                "bins must be at most {}, got {}",
                                data::MAX_BINS,
                                v
                            )));
                        }
                        n as usize
                    }
                };
                let bins = data::histogram(&values, bins)?;
                ChartData::Distribution { values, bins }
            }
            ChartCapability::MultiLineChart => {
                let (x_labels, series) =
                    data::multi_series(required("data")?, args.get("x_labels").filter(|v| !v.is_null()))?;
                ChartData::MultiSeries { x_labels, series }
            }
        };

        let (x_default, y_default) = self.default_axes();
        Ok(ChartSpec {
            capability: self.capability,
            title: text("title", self.default_title()),
            x_label: text("x_label", x_default),
            y_label: text("y_label", y_default),
            data,
        })
    }

    fn parameters(&self) -> Value {
        let mut properties = Map::new();
        let mut required = vec!["data"];

        match self.capability {
            ChartCapability::BarChart | ChartCapability::LineChart | ChartCapability::PieChart => {
                properties.insert(
                    "data".into(),
                    json!({
                        "type": "object",
                        "description": "Map of category label to numeric value, e.g. {\"Q1\": 120, \"Q2\": 135}. Keys are plotted in the given order.",
                        "additionalProperties": { "type": "number" }
                    }),
                );
            }
            ChartCapability::ScatterPlot => {
                required = vec!["x_data", "y_data"];
                properties.insert(
                    "x_data".into(),
                    json!({ "type": "array", "items": { "type": "number" }, "description": "Values for the x-axis" }),
                );
                properties.insert(
                    "y_data".into(),
                    json!({ "type": "array", "items": { "type": "number" }, "description": "Values for the y-axis, same length as x_data" }),
                );
            }
            ChartCapability::Histogram => {
                properties.insert(
                    "data".into(),
                    json!({ "type": "array", "items": { "type": "number" }, "description": "Raw values whose distribution is plotted" }),
                );
                properties.insert(
                    "bins".into(),
                    json!({ "type": "integer", "minimum": 1, "description": format!("Number of equal-width bins (default {})", DEFAULT_BINS) }),
                );
            }
            ChartCapability::MultiLineChart => {
                properties.insert(
                    "data".into(),
                    json!({
                        "type": "object",
                        "description": "Map of series name to either a map of x label to value, e.g. {\"Revenue\": {\"Jan\": 120, \"Feb\": 135}}, or an array of values",
                        "additionalProperties": {
                            "anyOf": [
                                { "type": "object", "additionalProperties": { "type": "number" } },
                                { "type": "array", "items": { "type": "number" } }
                            ]
                        }
                    }),
                );
                properties.insert(
                    "x_labels".into(),
                    json!({ "type": "array", "items": { "type": "string" }, "description": "Names of the x positions when series are given as arrays" }),
                );
            }
        }

        properties.insert("title".into(), json!({ "type": "string", "description": "Chart title" }));
        if self.capability != ChartCapability::PieChart {
            properties.insert("x_label".into(), json!({ "type": "string", "description": "X-axis label" }));
            properties.insert("y_label".into(), json!({ "type": "string", "description": "Y-axis label" }));
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    fn description(&self) -> &'static str {
        match self.capability {
            ChartCapability::BarChart => "Create a bar chart comparing numeric values across categories and save it to the chart output directory.",
            ChartCapability::LineChart => "Create a line chart showing how a value changes over ordered points such as months, and save it to the chart output directory.",
            ChartCapability::ScatterPlot => "Create a scatter plot of paired x/y observations to show the relationship between two variables, and save it to the chart output directory.",
            ChartCapability::PieChart => "Create a pie chart showing part-to-whole proportions and save it to the chart output directory.",
            ChartCapability::Histogram => "Create a histogram showing the distribution of a list of values and save it to the chart output directory.",
            ChartCapability::MultiLineChart => "Create a line chart with several named series over shared x labels, for comparing trends, and save it to the chart output directory.",
        }
    }
}

/// Figures the model can quote when describing the chart.
fn summarize(data: &ChartData) -> Value {
    match data {
        ChartData::Categorical(pairs) => {
            let total: f64 = pairs.iter().map(|(_, v)| v).sum();
            let max = pairs.iter().max_by(|a, b| a.1.total_cmp(&b.1));
            let min = pairs.iter().min_by(|a, b| a.1.total_cmp(&b.1));
            json!({
                "total": total,
                "max": max.map(|(l, v)| json!({ "label": l, "value": v })),
                "min": min.map(|(l, v)| json!({ "label": l, "value": v })),
            })
        }
        ChartData::Points(points) => json!({ "correlation": pearson(points) }),
        ChartData::Distribution { values, bins } => {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            json!({
                "mean": mean,
                "min": bins.edges.first(),
                "max": bins.edges.last(),
                "bin_edges": bins.edges,
                "counts": bins.counts,
            })
        }
        ChartData::MultiSeries { x_labels, series } => json!({
            "x_labels": x_labels,
            "series": series.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        }),
    }
}

fn pearson(points: &[(f64, f64)]) -> Option<f64> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    let denom = (var_x * var_y).sqrt();
    (denom > 0.0).then(|| cov / denom)
}

impl LlmTool for ChartTool {
    fn run(&self, args: &HashMap<String, Value>) -> Result<Value> {
        let chart_type = self.capability.kind();

        let spec = match self.build_spec(args) {
            Ok(spec) => spec,
            Err(VizAgentError::DataError(msg)) => {
                warn!(chart_type, error = %msg, "Rejected chart data");
                return Ok(json!({
                    "status": "error",
                    "chart_type": chart_type,
                    "error": msg,
                }));
            }
            Err(e) => return Err(e),
        };

        let path = self.renderer.render(&spec, &self.output_dir)?;
        info!(chart_type, path = %path.display(), "Chart created");

        Ok(json!({
            "status": "success",
            "chart_type": chart_type,
            "title": spec.title,
            "file_path": path.display().to_string(),
            "data_points": spec.data.data_points(),
            "summary": summarize(&spec.data),
        }))
    }

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::function(self.capability.tool_name(), self.description(), self.parameters())
    }

    fn matches(&self, name: &str) -> bool {
        name == self.capability.tool_name()
    }
}
