//! Chart composition.
//!
//! Turns a [`MetricTable`] into a Plotly-compatible figure. The JSON produced
//! here is handed to `Plotly.react` in the browser unchanged, so field names
//! follow Plotly's figure schema.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ChartKind, MetricTable};

pub const BACKGROUND: &str = "black";
pub const FOREGROUND: &str = "white";
pub const GRID: &str = "#333";
pub const PANEL_HEIGHT_PX: u32 = 350;
pub const EMPTY_MESSAGE: &str = "No data for selected date range";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Scatter,
    Bar,
}

/// One category plotted against date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: TraceKind,
    pub name: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl Font {
    fn themed() -> Self {
        Self {
            color: FOREGROUND.to_string(),
            size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub gridcolor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub showarrow: bool,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Title,
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub font: Font,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl Layout {
    /// Dark layout shared by every panel.
    pub fn themed(title: &str) -> Self {
        Self {
            title: Title {
                text: title.to_string(),
            },
            paper_bgcolor: BACKGROUND.to_string(),
            plot_bgcolor: BACKGROUND.to_string(),
            font: Font::themed(),
            xaxis: Axis {
                gridcolor: GRID.to_string(),
            },
            yaxis: Axis {
                gridcolor: GRID.to_string(),
            },
            height: PANEL_HEIGHT_PX,
            legend: None,
            barmode: None,
            annotations: Vec::new(),
        }
    }
}

/// Client-side options passed next to the figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(rename = "displayModeBar")]
    pub display_mode_bar: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            display_mode_bar: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    /// Total number of plotted values across all traces.
    pub fn point_count(&self) -> usize {
        self.data.iter().map(Trace::len).sum()
    }
}

/// Build the figure for one table.
///
/// An empty table yields a figure with no traces and a centered notice.
pub fn compose_chart(table: &MetricTable) -> Figure {
    let domain = table.domain;
    let mut layout = Layout::themed(domain.title());

    if table.is_empty() {
        layout.annotations.push(Annotation {
            text: EMPTY_MESSAGE.to_string(),
            showarrow: false,
            font: Font {
                color: FOREGROUND.to_string(),
                size: Some(16),
            },
        });
        return Figure {
            data: Vec::new(),
            layout,
        };
    }

    let (kind, mode) = match domain.chart_kind() {
        ChartKind::Line => (TraceKind::Scatter, Some("lines".to_string())),
        ChartKind::GroupedBar => {
            layout.barmode = Some("group".to_string());
            (TraceKind::Bar, None)
        }
    };
    layout.legend = Some(Legend {
        font: Font::themed(),
    });

    let data = table
        .series()
        .into_iter()
        .map(|series| Trace {
            kind,
            x: series.dates().collect(),
            y: series.values().collect(),
            name: series.category,
            mode: mode.clone(),
        })
        .collect();

    Figure { data, layout }
}
