//! Chart-generation tools for agents.
//!
//! [`VisualizationTools`] turns a [`VisualizationConfig`] into the set of chart
//! tools a broker may dispatch to. Only the capabilities the config enables are
//! exposed; every rendered chart lands under the configured output directory.
//!
//! ```ignore
//! use vizagent::llm::tools::visualization::{VisualizationConfig, VisualizationTools};
//!
//! let toolkit = VisualizationTools::new(
//!     VisualizationConfig::builder().all().output_dir("business_charts").build(),
//! )?;
//! let tools = toolkit.tools();
//! ```

mod capability;
mod chart_tool;
mod config;
pub mod data;
mod renderer;

pub use capability::{resolve, CapabilitySet, ChartCapability};
pub use chart_tool::ChartTool;
pub use config::{VisualizationConfig, VisualizationConfigBuilder};
pub use data::{ChartData, ChartSpec};
pub use renderer::{ChartRenderer, VegaLiteRenderer};

use crate::error::Result;
use crate::llm::tools::LlmTool;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// The chart toolkit handed to an agent.
pub struct VisualizationTools {
    config: VisualizationConfig,
    enabled: CapabilitySet,
    renderer: Arc<dyn ChartRenderer>,
}

impl VisualizationTools {
    /// Create the toolkit with the default Vega-Lite renderer.
    pub fn new(config: VisualizationConfig) -> Result<Self> {
        Self::with_renderer(config, Arc::new(VegaLiteRenderer))
    }

    /// Create the toolkit with a custom renderer.
    ///
    /// The enabled set is resolved once here and the output directory is created.
    pub fn with_renderer(config: VisualizationConfig, renderer: Arc<dyn ChartRenderer>) -> Result<Self> {
        let enabled = config.enabled_capabilities();
        std::fs::create_dir_all(config.output_dir())?;

        if enabled.is_empty() {
            warn!(output_dir = %config.output_dir().display(), "No chart capabilities enabled");
        } else {
            info!(
                capabilities = ?enabled.keys(),
                output_dir = %config.output_dir().display(),
                "Visualization tools ready"
            );
        }

        Ok(Self {
            config,
            enabled,
            renderer,
        })
    }

    pub fn enabled(&self) -> CapabilitySet {
        self.enabled
    }

    pub fn output_dir(&self) -> &Path {
        self.config.output_dir()
    }

    pub fn config(&self) -> &VisualizationConfig {
        &self.config
    }

    /// One tool per enabled capability, in catalog order.
    pub fn tools(&self) -> Vec<Box<dyn LlmTool>> {
        self.enabled
            .iter()
            .map(|cap| {
                Box::new(ChartTool::new(cap, self.output_dir(), Arc::clone(&self.renderer)))
                    as Box<dyn LlmTool>
            })
            .collect()
    }
}
