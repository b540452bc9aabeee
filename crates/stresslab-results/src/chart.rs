//! Interactive chart construction.
//!
//! A [`Chart`] is a plotly.js figure built from a [`ResultsTable`]. Force
//! histories (`Time` and `Force` columns) become a line chart; anything else
//! becomes a wide-form scatter of every numeric column against row index.
//! [`Chart::to_html`] renders a standalone page that loads plotly.js from its
//! CDN.

use serde::Serialize;
use serde_json::{Value, json};

use crate::{ResultsTable, Result};

/// plotly.js bundle referenced by rendered pages.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const CHART_DIV_ID: &str = "stresslab-chart";

/// Line versus scatter rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Connected line, one trace.
    Line,
    /// Markers only, one trace per numeric column.
    Scatter,
}

impl ChartKind {
    fn plotly_mode(&self) -> &'static str {
        match self {
            ChartKind::Line => "lines",
            ChartKind::Scatter => "markers",
        }
    }
}

/// One series of the figure.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trace {
    /// Legend entry.
    pub name: String,
    /// X values.
    pub x: Vec<Value>,
    /// Y values.
    pub y: Vec<Value>,
}

/// A renderable chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Chart {
    /// Line or scatter.
    pub kind: ChartKind,
    /// Figure title.
    pub title: String,
    /// X axis title.
    pub x_label: String,
    /// Y axis title.
    pub y_label: String,
    /// Series to draw.
    pub traces: Vec<Trace>,
}

impl Chart {
    /// Pick and build the chart that suits this table.
    pub fn from_table(table: &ResultsTable) -> Self {
        match (table.column("Time"), table.column("Force")) {
            (Some(time), Some(force)) => Self {
                kind: ChartKind::Line,
                title: "Simulation Force Over Time".to_string(),
                x_label: "Time".to_string(),
                y_label: "Force".to_string(),
                traces: vec![Trace {
                    name: "Force".to_string(),
                    x: time.into_iter().cloned().collect(),
                    y: force.into_iter().cloned().collect(),
                }],
            },
            _ => Self::wide_scatter(table),
        }
    }

    fn wide_scatter(table: &ResultsTable) -> Self {
        let index: Vec<Value> = (0..table.len()).map(|i| json!(i)).collect();
        let traces = table
            .numeric_headers()
            .into_iter()
            .filter_map(|name| {
                let y = table.column(name)?.into_iter().cloned().collect();
                Some(Trace {
                    name: name.to_string(),
                    x: index.clone(),
                    y,
                })
            })
            .collect();

        Self {
            kind: ChartKind::Scatter,
            title: "Simulation Data".to_string(),
            x_label: "index".to_string(),
            y_label: "value".to_string(),
            traces,
        }
    }

    /// plotly.js `data` array.
    pub fn data(&self) -> Value {
        let mode = self.kind.plotly_mode();
        Value::Array(
            self.traces
                .iter()
                .map(|t| {
                    json!({
                        "type": "scatter",
                        "mode": mode,
                        "name": t.name,
                        "x": t.x,
                        "y": t.y,
                    })
                })
                .collect(),
        )
    }

    /// plotly.js `layout` object.
    pub fn layout(&self) -> Value {
        let mut layout = json!({
            "title": { "text": self.title },
            "xaxis": { "title": { "text": self.x_label } },
            "yaxis": { "title": { "text": self.y_label } },
        });
        if self.kind == ChartKind::Scatter {
            layout["legend"] = json!({ "title": { "text": "variable" } });
        }
        layout
    }

    /// Full standalone HTML page embedding the chart.
    pub fn to_html(&self) -> Result<String> {
        let data = script_safe(&serde_json::to_string(&self.data())?);
        let layout = script_safe(&serde_json::to_string(&self.layout())?);
        let title = escape_html(&self.title);

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>{title}</title>
<script src="{PLOTLY_CDN}" charset="utf-8"></script>
</head>
<body>
<div id="{CHART_DIV_ID}" class="plotly-graph-div" style="height:100vh; width:100%;"></div>
<script type="text/javascript">
Plotly.newPlot("{CHART_DIV_ID}", {data}, {layout}, {{"responsive": true}});
</script>
</body>
</html>
"#
        ))
    }
}

/// Keep embedded JSON from closing the surrounding `<script>` element.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================
