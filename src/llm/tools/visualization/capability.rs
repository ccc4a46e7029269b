//! The chart capability catalog and flag resolution.
//!
//! A capability is one chart-creation function that may be exposed to, or withheld
//! from, an agent. The catalog is fixed; a [`CapabilitySet`] is a bitmask over it,
//! so "enable all" is simply [`CapabilitySet::all`].

use crate::error::{Result, VizAgentError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartCapability {
    BarChart,
    LineChart,
    ScatterPlot,
    PieChart,
    Histogram,
    MultiLineChart,
}

impl ChartCapability {
    /// Every capability, in catalog order.
    pub const ALL: [ChartCapability; 6] = [
        ChartCapability::BarChart,
        ChartCapability::LineChart,
        ChartCapability::ScatterPlot,
        ChartCapability::PieChart,
        ChartCapability::Histogram,
        ChartCapability::MultiLineChart,
    ];

    /// Canonical kebab-case name, e.g. `bar-chart`.
    pub fn key(self) -> &'static str {
        match self {
            ChartCapability::BarChart => "bar-chart",
            ChartCapability::LineChart => "line-chart",
            ChartCapability::ScatterPlot => "scatter-plot",
            ChartCapability::PieChart => "pie-chart",
            ChartCapability::Histogram => "histogram",
            ChartCapability::MultiLineChart => "multi-line-chart",
        }
    }

    /// Snake-case kind used in artifact file names and tool results, e.g. `bar_chart`.
    pub fn kind(self) -> &'static str {
        match self {
            ChartCapability::BarChart => "bar_chart",
            ChartCapability::LineChart => "line_chart",
            ChartCapability::ScatterPlot => "scatter_plot",
            ChartCapability::PieChart => "pie_chart",
            ChartCapability::Histogram => "histogram",
            ChartCapability::MultiLineChart => "multi_line_chart",
        }
    }

    /// Action name the tool-dispatcher exposes, e.g. `create_bar_chart`.
    pub fn tool_name(self) -> String {
        format!("create_{}", self.kind())
    }

    /// Per-function flag name, e.g. `enable_create_bar_chart`.
    pub fn flag_name(self) -> String {
        format!("enable_create_{}", self.kind())
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for ChartCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ChartCapability {
    type Err = VizAgentError;

    /// Accepts `bar-chart`, `bar_chart`, `create_bar_chart` and `enable_create_bar_chart`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let kind = normalized.strip_prefix("enable_").unwrap_or(&normalized);
        let kind = kind.strip_prefix("create_").unwrap_or(kind);

        ChartCapability::ALL
            .into_iter()
            .find(|cap| cap.kind() == kind)
            .ok_or_else(|| VizAgentError::UnknownCapability(s.to_string()))
    }
}

/// A subset of the capability catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        CapabilitySet(0)
    }

    pub fn all() -> Self {
        ChartCapability::ALL.into_iter().collect()
    }

    /// Build a set from typed per-capability flags; `false` entries are skipped.
    pub fn from_flags(flags: impl IntoIterator<Item = (ChartCapability, bool)>) -> Self {
        flags.into_iter().filter(|(_, on)| *on).map(|(cap, _)| cap).collect()
    }

    pub fn insert(&mut self, cap: ChartCapability) {
        self.0 |= cap.bit();
    }

    pub fn remove(&mut self, cap: ChartCapability) {
        self.0 &= !cap.bit();
    }

    pub fn contains(&self, cap: ChartCapability) -> bool {
        self.0 & cap.bit() != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn intersection(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 & other.0)
    }

    pub fn difference(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 & !other.0)
    }

    /// Members in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = ChartCapability> + '_ {
        ChartCapability::ALL.into_iter().filter(move |cap| self.contains(*cap))
    }

    /// Canonical names of the members, in catalog order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.iter().map(ChartCapability::key).collect()
    }
}

impl FromIterator<ChartCapability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = ChartCapability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for cap in iter {
            set.insert(cap);
        }
        set
    }
}

/// Resolve the effective capability set from an "enable all" switch and named flags.
///
/// With `enable_all` every capability is enabled and `flags` is not consulted.
/// Otherwise the result is exactly the flags set to `true`. Names outside the
/// catalog are ignored and logged.
pub fn resolve(enable_all: bool, flags: &HashMap<String, bool>) -> CapabilitySet {
    if enable_all {
        return CapabilitySet::all();
    }

    let mut set = CapabilitySet::empty();
    for (name, enabled) in flags {
        match name.parse::<ChartCapability>() {
            Ok(cap) if *enabled => set.insert(cap),
            Ok(_) => {}
            Err(_) => warn!(flag = %name, "Ignoring unknown chart capability flag"),
        }
    }
    set
}

/// Parse a list of names into a set, ignoring (and logging) unknown names.
pub(crate) fn parse_names<S: AsRef<str>>(names: &[S], context: &str) -> CapabilitySet {
    names
        .iter()
        .filter_map(|name| match name.as_ref().parse::<ChartCapability>() {
            Ok(cap) => Some(cap),
            Err(_) => {
                warn!(name = name.as_ref(), context, "Ignoring unknown chart capability");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(entries: &[(&str, bool)]) -> HashMap<String, bool> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_enable_all_overrides_flags() {
        let f = flags(&[("bar-chart", false), ("histogram", false), ("pie-chart", true)]);

        let resolved = resolve(true, &f);

        assert_eq!(resolved, CapabilitySet::all());
        assert_eq!(resolved.len(), ChartCapability::ALL.len());
    }

    #[test]
    fn test_enable_all_with_empty_flags() {
        assert_eq!(resolve(true, &HashMap::new()), CapabilitySet::all());
    }

    #[test]
    fn test_flags_select_exactly_true_entries() {
        let f = flags(&[
            ("enable_create_bar_chart", true),
            ("enable_create_line_chart", true),
            ("enable_create_pie_chart", true),
            ("enable_create_scatter_plot", false),
            ("enable_create_histogram", false),
        ]);

        let resolved = resolve(false, &f);

        assert_eq!(resolved.keys(), vec!["bar-chart", "line-chart", "pie-chart"]);
    }

    #[test]
    fn test_empty_flags_resolve_to_empty_set() {
        let resolved = resolve(false, &HashMap::new());
        assert!(resolved.is_empty());
        assert_eq!(resolved.iter().count(), 0);
    }

    #[test]
    fn test_unknown_flags_are_ignored() {
        let f = flags(&[("create_3d_plot", true), ("heatmap", true), ("histogram", true)]);

        let resolved = resolve(false, &f);

        assert_eq!(resolved.keys(), vec!["histogram"]);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let f = flags(&[("scatter_plot", true), ("histogram", true), ("bar-chart", false)]);

        let first = resolve(false, &f);
        let second = resolve(false, &f);

        assert_eq!(first, second);
        assert_eq!(first.keys(), vec!["scatter-plot", "histogram"]);
    }

    #[test]
    fn test_every_name_form_parses() {
        for cap in ChartCapability::ALL {
            assert_eq!(cap.key().parse::<ChartCapability>().unwrap(), cap);
            assert_eq!(cap.kind().parse::<ChartCapability>().unwrap(), cap);
            assert_eq!(cap.tool_name().parse::<ChartCapability>().unwrap(), cap);
            assert_eq!(cap.flag_name().parse::<ChartCapability>().unwrap(), cap);
        }
        assert_eq!("Create_Pie_Chart".parse::<ChartCapability>().unwrap(), ChartCapability::PieChart);
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        match "create_violin_plot".parse::<ChartCapability>() {
            Err(VizAgentError::UnknownCapability(name)) => assert_eq!(name, "create_violin_plot"),
            other => panic!("Expected UnknownCapability, got {:?}", other),
        }
    }

    #[test]
    fn test_set_operations() {
        let basic = CapabilitySet::from_flags([
            (ChartCapability::BarChart, true),
            (ChartCapability::LineChart, true),
            (ChartCapability::Histogram, false),
        ]);
        let stats: CapabilitySet =
            [ChartCapability::LineChart, ChartCapability::Histogram].into_iter().collect();

        assert_eq!(basic.intersection(stats).keys(), vec!["line-chart"]);
        assert_eq!(basic.difference(stats).keys(), vec!["bar-chart"]);

        let mut set = basic;
        set.remove(ChartCapability::BarChart);
        assert!(!set.contains(ChartCapability::BarChart));
        assert!(set.contains(ChartCapability::LineChart));
    }

    #[test]
    fn test_tool_and_flag_names() {
        assert_eq!(ChartCapability::MultiLineChart.tool_name(), "create_multi_line_chart");
        assert_eq!(ChartCapability::ScatterPlot.flag_name(), "enable_create_scatter_plot");
        assert_eq!(ChartCapability::Histogram.to_string(), "histogram");
    }
}
