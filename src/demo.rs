//! Business-reporting walkthrough for the chart tools.
//!
//! Each [`RunMode`] selects a toolkit preset: which chart capabilities the agent may
//! use, where charts are written, and the instructions the agent follows. [`run`]
//! then plays the fixed business scenarios against that agent, followed by a
//! multi-chart dashboard request.

use crate::agent::Agent;
use crate::error::Result;
use crate::llm::tools::visualization::{ChartCapability, VisualizationConfig, VisualizationTools};
use crate::llm::LlmBroker;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const SEPARATOR_WIDTH: usize = 60;

const EXPERT_INSTRUCTIONS: &[&str] = &[
    "You are a data visualization expert with access to all chart types.",
    "Use appropriate visualization functions for the data presented.",
    "Always provide meaningful titles, axis labels, and context.",
    "Suggest insights based on the data visualized.",
    "Format data appropriately for each chart type.",
];

const BASIC_INSTRUCTIONS: &[&str] = &[
    "You are a data visualization specialist focused on basic chart types.",
    "Use bar charts for categorical comparisons.",
    "Use line charts for trends over time.",
    "Use pie charts for part-to-whole relationships.",
    "Keep visualizations simple and clear.",
];

const SAFE_INSTRUCTIONS: &[&str] = &[
    "You are a business analyst creating straightforward visualizations.",
    "Focus on clear, easy-to-interpret charts.",
    "Avoid overly complex visualization types.",
    "Ensure charts are suitable for business presentations.",
];

const STATS_INSTRUCTIONS: &[&str] = &[
    "You are a statistical analyst focused on data distribution and correlation.",
    "Use scatter plots to show relationships between variables.",
    "Use histograms to show data distributions.",
    "Provide statistical insights based on the visualizations.",
];

const DASHBOARD_INSTRUCTIONS: &[&str] = &[
    "You are a Business Intelligence analyst.",
    "Create comprehensive visualizations for executive dashboards.",
    "Provide actionable insights and recommendations.",
    "Use appropriate chart types for different data scenarios.",
    "Always explain what the data reveals about business performance.",
];

/// Which agent configuration the walkthrough runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RunMode {
    /// Every chart type via the `all` switch
    #[default]
    All,
    /// Every chart type via explicit per-chart flags
    Full,
    /// Bar, line and pie charts only
    Basic,
    /// The five standard chart types
    Safe,
    /// Scatter plots and histograms
    Stats,
}

/// A toolkit configuration paired with the instructions for the agent that uses it.
#[derive(Debug, Clone)]
pub struct Preset {
    pub config: VisualizationConfig,
    pub instructions: &'static [&'static str],
}

impl Preset {
    /// The dashboard analyst: every chart type, charts under `dashboard_charts`.
    pub fn dashboard(output_root: &Path) -> Self {
        Self {
            config: VisualizationConfig::builder()
                .all()
                .output_dir(output_root.join("dashboard_charts"))
                .build(),
            instructions: DASHBOARD_INSTRUCTIONS,
        }
    }

    pub fn agent(&self, broker: LlmBroker) -> Result<Agent> {
        let toolkit = VisualizationTools::new(self.config.clone())?;
        Ok(Agent::builder(broker)
            .instructions(self.instructions.iter().copied())
            .tools(toolkit.tools())
            .markdown(true)
            .build())
    }
}

impl RunMode {
    pub fn preset(self, output_root: &Path) -> Preset {
        use ChartCapability::*;

        let builder = VisualizationConfig::builder();
        let (builder, dir, instructions) = match self {
            RunMode::All => (builder.all(), "business_charts", EXPERT_INSTRUCTIONS),
            RunMode::Full => (
                ChartCapability::ALL.into_iter().fold(builder, |b, cap| b.enable(cap, true)),
                "business_charts",
                EXPERT_INSTRUCTIONS,
            ),
            RunMode::Basic => (
                builder
                    .enable(BarChart, true)
                    .enable(LineChart, true)
                    .enable(PieChart, true)
                    .enable(ScatterPlot, false)
                    .enable(Histogram, false),
                "basic_charts",
                BASIC_INSTRUCTIONS,
            ),
            RunMode::Safe => (
                builder
                    .enable(BarChart, true)
                    .enable(LineChart, true)
                    .enable(ScatterPlot, true)
                    .enable(PieChart, true)
                    .enable(Histogram, true),
                "safe_charts",
                SAFE_INSTRUCTIONS,
            ),
            RunMode::Stats => (
                builder
                    .enable(ScatterPlot, true)
                    .enable(Histogram, true)
                    .enable(BarChart, false)
                    .enable(LineChart, false)
                    .enable(PieChart, false),
                "stats_charts",
                STATS_INSTRUCTIONS,
            ),
        };

        Preset {
            config: builder.output_dir(output_root.join(dir)).build(),
            instructions,
        }
    }
}

/// A titled prompt sent to the agent.
#[derive(Debug, Clone, Copy)]
pub struct Scenario {
    pub heading: &'static str,
    pub prompt: &'static str,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        heading: "Example 1: Creating a Sales Performance Chart",
        prompt: "Create a bar chart showing our Q4 sales performance:
- December: $45,000
- November: $38,000
- October: $42,000
- September: $35,000

Title it \"Q4 Sales Performance\" and provide insights about the trend.",
    },
    Scenario {
        heading: "Example 2: Market Share Pie Chart",
        prompt: "Create a pie chart showing our market share compared to competitors:
- Our Company: 35%
- Competitor A: 25%
- Competitor B: 20%
- Competitor C: 15%
- Others: 5%

Title it \"Market Share Analysis 2024\" and analyze our position.",
    },
    Scenario {
        heading: "Example 3: Revenue Growth Trend",
        prompt: "Create a line chart showing our monthly revenue growth over the past 6 months:
- January: $120,000
- February: $135,000
- March: $128,000
- April: $145,000
- May: $158,000
- June: $162,000

Title it \"Monthly Revenue Growth\" and identify trends and growth rate.",
    },
    Scenario {
        heading: "Example 4: Customer Satisfaction vs Sales Correlation",
        prompt: "Create a scatter plot to analyze the relationship between customer satisfaction scores and sales:

Customer satisfaction scores (x-axis): [7.2, 8.1, 6.9, 8.5, 7.8, 9.1, 6.5, 8.3, 7.6, 8.9, 7.1, 8.7]
Sales in thousands (y-axis): [45, 62, 38, 71, 53, 85, 32, 68, 48, 79, 41, 75]

Title it \"Customer Satisfaction vs Sales Performance\" and analyze the correlation.",
    },
    Scenario {
        heading: "Example 5: Score Distribution Histogram",
        prompt: "Create a histogram showing the distribution of customer review scores:
Data: [4.1, 4.5, 3.8, 4.7, 4.2, 4.9, 3.9, 4.6, 4.3, 4.8, 4.0, 4.4, 3.7, 4.5, 4.1, 4.6, 4.2, 4.7, 3.9, 4.3]

Use 6 bins, title it \"Customer Review Score Distribution\" and analyze the distribution pattern.",
    },
    Scenario {
        heading: "Example 6: Multi-Line Chart - Revenue vs Expenses Over Time",
        prompt: "Create a multi-line chart comparing our revenue and expenses over the past 6 months:

Revenue: Jan: $120,000, Feb: $135,000, Mar: $128,000, Apr: $145,000, May: $158,000, Jun: $162,000
Expenses: Jan: $95,000, Feb: $98,000, Mar: $102,000, Apr: $108,000, May: $110,000, Jun: $115,000
Profit: Jan: $25,000, Feb: $37,000, Mar: $26,000, Apr: $37,000, May: $48,000, Jun: $47,000

Title it \"Revenue vs Expenses vs Profit Trend\" and analyze the financial health.",
    },
    Scenario {
        heading: "Example 7: Multi-Line Chart - Product Performance Comparison",
        prompt: "Create a multi-line chart comparing monthly sales for three product lines:

Product A: Q1: 150, Q2: 180, Q3: 210, Q4: 250
Product B: Q1: 200, Q2: 190, Q3: 220, Q4: 230
Product C: Q1: 80, Q2: 120, Q3: 160, Q4: 200

Title it \"Quarterly Product Sales Comparison\" with x-axis \"Quarter\" and y-axis \"Units Sold\".
Identify which product is growing fastest.",
    },
];

pub const DASHBOARD_SCENARIO: Scenario = Scenario {
    heading: "ADVANCED EXAMPLE: Business Intelligence Dashboard",
    prompt: "I need to create a comprehensive quarterly business review. Please help me with these visualizations:

1. First, create a bar chart showing revenue by product line:
   - Software Licenses: $2.3M
   - Support Services: $1.8M
   - Consulting: $1.2M
   - Training: $0.7M

2. Then create a line chart showing our customer acquisition over the past 12 months:
   - Jan: 45, Feb: 52, Mar: 48, Apr: 61, May: 58, Jun: 67
   - Jul: 73, Aug: 69, Sep: 78, Oct: 84, Nov: 81, Dec: 89

3. Create a multi-line chart comparing website traffic sources over the past 6 months:
   - Organic Search: Jan: 12000, Feb: 13500, Mar: 14200, Apr: 15800, May: 16500, Jun: 17200
   - Paid Ads: Jan: 8000, Feb: 8500, Mar: 9200, Apr: 9800, May: 10100, Jun: 10500
   - Social Media: Jan: 3000, Feb: 3800, Mar: 4500, Apr: 5200, May: 6100, Jun: 7000

4. Finally, create a pie chart showing our expense breakdown:
   - Personnel: 45%
   - Technology: 25%
   - Marketing: 15%
   - Operations: 10%
   - Other: 5%

For each chart, provide business insights and recommendations for next quarter.",
};

#[derive(Debug, Clone)]
pub struct DemoOptions {
    pub stream: bool,
    pub skip_dashboard: bool,
    /// Directory the preset chart folders are created under
    pub output_root: PathBuf,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            stream: true,
            skip_dashboard: false,
            output_root: PathBuf::from("."),
        }
    }
}

/// Play every scenario against the agent for `mode`, then the dashboard request.
///
/// Scenarios run one after another; the first failure stops the walkthrough.
pub async fn run<W: Write>(mode: RunMode, broker: &LlmBroker, options: &DemoOptions, out: &mut W) -> Result<()> {
    let preset = mode.preset(&options.output_root);
    let agent = preset.agent(broker.clone())?;
    let separator = "=".repeat(SEPARATOR_WIDTH);

    info!(?mode, model = broker.model(), "Starting visualization walkthrough");

    for (i, scenario) in SCENARIOS.iter().enumerate() {
        if i > 0 {
            writeln!(out, "\n{}\n", separator)?;
        }
        writeln!(out, "{}", scenario.heading)?;
        agent.write_response(scenario.prompt, options.stream, out).await?;
    }

    writeln!(
        out,
        "\nAll examples completed. Check the '{}' folder for generated visualizations.",
        preset.config.output_dir().display()
    )?;

    if options.skip_dashboard {
        return Ok(());
    }

    writeln!(out, "\n{}", separator)?;
    writeln!(out, "{}", DASHBOARD_SCENARIO.heading)?;
    writeln!(out, "{}\n", separator)?;

    let dashboard = Preset::dashboard(&options.output_root).agent(broker.clone())?;
    dashboard.write_response(DASHBOARD_SCENARIO.prompt, options.stream, out).await?;

    Ok(())
}
