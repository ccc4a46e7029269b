//! Toolkit configuration: which chart capabilities are enabled and where charts go.

use super::capability::{parse_names, resolve, CapabilitySet, ChartCapability};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

fn default_output_dir() -> PathBuf {
    PathBuf::from("charts")
}

/// Which chart capabilities to expose, and where rendered charts go.
///
/// The serialized form uses the toolkit's keyword names, so a config can be
/// written as `{"all": true, "output_dir": "business_charts"}` or with individual
/// `enable_create_*` flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(rename = "all", default)]
    pub enable_all: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tools: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_tools: Vec<String>,

    #[serde(flatten)]
    pub flags: BTreeMap<String, bool>,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enable_all: false,
            output_dir: default_output_dir(),
            include_tools: None,
            exclude_tools: Vec::new(),
            flags: BTreeMap::new(),
        }
    }
}

impl VisualizationConfig {
    pub fn builder() -> VisualizationConfigBuilder {
        VisualizationConfigBuilder::default()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The capabilities a dispatcher should expose for this config.
    ///
    /// Flags are resolved first; `include_tools`, when present, then narrows the
    /// result and `exclude_tools` removes from it.
    pub fn enabled_capabilities(&self) -> CapabilitySet {
        let flags: HashMap<String, bool> =
            self.flags.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let mut enabled = resolve(self.enable_all, &flags);

        if let Some(ref include) = self.include_tools {
            enabled = enabled.intersection(parse_names(include, "include_tools"));
        }

        enabled.difference(parse_names(&self.exclude_tools, "exclude_tools"))
    }
}

/// Builder for [`VisualizationConfig`].
#[derive(Debug, Default)]
pub struct VisualizationConfigBuilder {
    config: VisualizationConfig,
}

impl VisualizationConfigBuilder {
    /// Enable every capability in the catalog.
    pub fn all(mut self) -> Self {
        self.config.enable_all = true;
        self
    }

    pub fn enable(self, cap: ChartCapability, enabled: bool) -> Self {
        self.flag(cap.flag_name(), enabled)
    }

    /// Set a flag by name; any accepted capability name form works.
    pub fn flag(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.config.flags.insert(name.into(), enabled);
        self
    }

    pub fn include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.include_tools = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.exclude_tools.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn build(self) -> VisualizationConfig {
        self.config
    }
}
