//! Figure data for web visualization
//!
//! Converts dashboard aggregates into a JSON-serializable figure format
//! suitable for Plotly.js. Every figure shares the dashboard's dark layout.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::sankey::DiagramSpec;
use crate::stats::{FacetSeries, GroupMean, ViolinSeries};
use crate::table::Value;

const BACKGROUND: &str = "#1F1F1F";
const FONT_FAMILY: &str = "Times New Roman";
const TEXT_COLOR: &str = "white";
const BAR_COLOR: &str = "#88A774";
const FALLBACK_COLORS: &[&str] = &["#4a74f5", "#a55af4", "#f5a64a", "#4af5c1"];

/// A complete Plotly figure
#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// One Plotly trace
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Bar {
        x: Vec<Value>,
        y: Vec<f64>,
        marker: Marker,
    },
    Sankey {
        node: SankeyNode,
        link: SankeyLink,
    },
    Scatter {
        name: String,
        x: Vec<Value>,
        y: Vec<Value>,
        mode: String,
        marker: Marker,
        xaxis: String,
        yaxis: String,
    },
    Violin {
        name: String,
        x: Vec<Value>,
        y: Vec<f64>,
        #[serde(rename = "box")]
        box_plot: Visible,
        points: String,
        marker: Marker,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl Marker {
    fn color(color: &str) -> Self {
        Self {
            color: color.to_string(),
            size: None,
            opacity: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Visible {
    pub visible: bool,
}

/// Line style of links or node outlines
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub color: String,
    pub width: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SankeyNode {
    pub label: Vec<String>,
    pub pad: f64,
    pub thickness: f64,
    pub line: Line,
}

#[derive(Debug, Clone, Serialize)]
pub struct SankeyLink {
    pub source: Vec<usize>,
    pub target: Vec<usize>,
    pub value: Vec<f64>,
    pub line: Line,
}

#[derive(Debug, Clone, Serialize)]
pub struct Title {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub family: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Margin {
    pub l: u32,
    pub r: u32,
    pub b: u32,
    pub t: u32,
    pub pad: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub tickcolor: String,
    pub gridcolor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl Axis {
    fn titled(title: &str) -> Self {
        Self {
            tickcolor: TEXT_COLOR.to_string(),
            gridcolor: TEXT_COLOR.to_string(),
            title: Some(Title {
                text: title.to_string(),
            }),
            domain: None,
            anchor: None,
        }
    }
}

/// Dashboard layout shared by every figure
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: Title,
    pub font: Font,
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub margin: Margin,
    pub width: u32,
    pub height: u32,
    /// Axes keyed by Plotly name (`xaxis`, `xaxis2`, `yaxis`, ...)
    #[serde(flatten)]
    pub axes: BTreeMap<String, Axis>,
}

impl Layout {
    fn dark(title: &str) -> Self {
        Self {
            title: Title {
                text: title.to_string(),
            },
            font: Font {
                family: FONT_FAMILY.to_string(),
                color: TEXT_COLOR.to_string(),
            },
            paper_bgcolor: BACKGROUND.to_string(),
            plot_bgcolor: BACKGROUND.to_string(),
            margin: Margin {
                l: 10,
                r: 10,
                b: 10,
                t: 50,
                pad: 4,
            },
            width: 800,
            height: 600,
            axes: BTreeMap::new(),
        }
    }

    fn with_axes(mut self, x_title: &str, y_title: &str) -> Self {
        self.axes.insert("xaxis".to_string(), Axis::titled(x_title));
        self.axes.insert("yaxis".to_string(), Axis::titled(y_title));
        self
    }
}

/// Color for a mode-like facet value
fn facet_color(facet: &Value, index: usize, major: &str, minor: &str) -> String {
    match facet.as_str() {
        Some("major") => major.to_string(),
        Some("minor") => minor.to_string(),
        _ => FALLBACK_COLORS[index % FALLBACK_COLORS.len()].to_string(),
    }
}

/// Bar chart of mean streams per month
pub fn bar_figure(means: &[GroupMean]) -> Figure {
    Figure {
        data: vec![Trace::Bar {
            x: means.iter().map(|m| m.key.clone()).collect(),
            y: means.iter().map(|m| m.mean).collect(),
            marker: Marker::color(BAR_COLOR),
        }],
        layout: Layout::dark("Graph of AVG Streams vs Month").with_axes("released_month", "streams"),
    }
}

/// Sankey figure from a diagram spec
pub fn sankey_figure(spec: &DiagramSpec, columns: &[&str]) -> Figure {
    let style = &spec.style;
    Figure {
        data: vec![Trace::Sankey {
            node: SankeyNode {
                label: spec.nodes.clone(),
                pad: style.node_pad,
                thickness: style.node_thickness,
                line: Line {
                    color: style.node_line.color.clone(),
                    width: style.node_line.width,
                },
            },
            link: SankeyLink {
                source: spec.links.iter().map(|l| l.source).collect(),
                target: spec.links.iter().map(|l| l.target).collect(),
                value: spec.links.iter().map(|l| l.value).collect(),
                line: Line {
                    color: style.link_line.color.clone(),
                    width: style.link_line.width,
                },
            },
        }],
        layout: Layout::dark(&format!("Sankey of {}", columns.join(" → "))),
    }
}

/// Scatter plot with one panel per facet value, markers sized by count
pub fn scatter_figure(series: &[FacetSeries], x: &str, y: &str) -> Figure {
    let panels = series.len().max(1);
    let width = 1.0 / panels as f64;
    let mut layout = Layout::dark(&format!("Scatter plot of {} vs. {} by Mode", y, x));

    let mut data = Vec::with_capacity(series.len());
    for (i, facet) in series.iter().enumerate() {
        let suffix = if i == 0 { String::new() } else { (i + 1).to_string() };
        let x_name = format!("xaxis{}", suffix);

        let mut axis = Axis::titled(&format!("{} ({})", x, facet.facet));
        axis.domain = Some([i as f64 * width + 0.02, (i + 1) as f64 * width - 0.02]);
        axis.anchor = Some("y".to_string());
        layout.axes.insert(x_name, axis);

        data.push(Trace::Scatter {
            name: facet.facet.to_string(),
            x: facet.points.iter().map(|p| p.x.clone()).collect(),
            y: facet.points.iter().map(|p| p.y.clone()).collect(),
            mode: "markers".to_string(),
            marker: Marker {
                color: facet_color(&facet.facet, i, "#88A774", "#B583A2"),
                size: Some(
                    facet
                        .points
                        .iter()
                        .map(|p| 6.0 * (p.count as f64).sqrt())
                        .collect(),
                ),
                opacity: Some(0.6),
            },
            xaxis: format!("x{}", suffix),
            yaxis: "y".to_string(),
        });
    }
    layout.axes.insert("yaxis".to_string(), Axis::titled(y));

    Figure { data, layout }
}

/// Violin plot of `y` per `x`, one violin group per color value
pub fn violin_figure(series: &[ViolinSeries], x: &str, y: &str) -> Figure {
    Figure {
        data: series
            .iter()
            .enumerate()
            .map(|(i, s)| Trace::Violin {
                name: s.group.to_string(),
                x: s.x.clone(),
                y: s.y.clone(),
                box_plot: Visible { visible: true },
                points: "all".to_string(),
                marker: Marker::color(&facet_color(&s.group, i, "blue", "red")),
            })
            .collect(),
        layout: Layout::dark(&format!("Violin plot of {} vs. {} by Mode", y, x)).with_axes(x, y),
    }
}

/// Write a figure as pretty-printed JSON
pub fn write_figure(figure: &Figure, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, figure)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sankey::{SankeyOptions, make_sankey};
    use crate::stats::ScatterPoint;
    use crate::table::Table;

    #[test]
    fn test_bar_figure_layout() {
        let means = vec![GroupMean {
            key: Value::Int(1),
            mean: 10.5,
        }];
        let json = serde_json::to_value(bar_figure(&means)).unwrap();

        assert_eq!(json["data"][0]["type"], "bar");
        assert_eq!(json["data"][0]["x"][0], 1);
        assert_eq!(json["data"][0]["y"][0], 10.5);
        assert_eq!(json["data"][0]["marker"]["color"], BAR_COLOR);
        assert_eq!(json["layout"]["paper_bgcolor"], BACKGROUND);
        assert_eq!(json["layout"]["font"]["family"], FONT_FAMILY);
        assert_eq!(json["layout"]["xaxis"]["tickcolor"], "white");
    }

    #[test]
    fn test_sankey_figure() {
        let table = Table::from_rows(
            ["a", "b"],
            vec![vec!["x".into(), "y".into()], vec!["x".into(), "z".into()]],
        )
        .unwrap();
        let spec = make_sankey(&table, &["a", "b"], None, &SankeyOptions::default()).unwrap();
        let json = serde_json::to_value(sankey_figure(&spec, &["a", "b"])).unwrap();

        let trace = &json["data"][0];
        assert_eq!(trace["type"], "sankey");
        assert_eq!(trace["node"]["label"], serde_json::json!(["x", "y", "z"]));
        assert_eq!(trace["node"]["thickness"], 50.0);
        assert_eq!(trace["link"]["source"], serde_json::json!([0, 0]));
        assert_eq!(trace["link"]["target"], serde_json::json!([1, 2]));
        assert_eq!(trace["link"]["line"]["width"], 2.0);
        assert_eq!(json["layout"]["title"]["text"], "Sankey of a → b");
    }

    #[test]
    fn test_scatter_figure_panels() {
        let series = vec![
            FacetSeries {
                facet: "major".into(),
                points: vec![ScatterPoint {
                    x: "a".into(),
                    y: Value::Int(120),
                    count: 4,
                }],
            },
            FacetSeries {
                facet: "minor".into(),
                points: vec![],
            },
        ];
        let json = serde_json::to_value(scatter_figure(&series, "key", "bpm")).unwrap();

        assert_eq!(json["data"][0]["xaxis"], "x");
        assert_eq!(json["data"][1]["xaxis"], "x2");
        assert_eq!(json["data"][0]["marker"]["color"], "#88A774");
        assert_eq!(json["data"][1]["marker"]["color"], "#B583A2");
        assert_eq!(json["data"][0]["marker"]["size"][0], 12.0);
        assert!(json["layout"]["xaxis2"].is_object());
    }

    #[test]
    fn test_violin_figure() {
        let series = vec![ViolinSeries {
            group: "minor".into(),
            x: vec!["c#".into()],
            y: vec![90.0],
        }];
        let json = serde_json::to_value(violin_figure(&series, "key", "bpm")).unwrap();
        assert_eq!(json["data"][0]["type"], "violin");
        assert_eq!(json["data"][0]["box"]["visible"], true);
        assert_eq!(json["data"][0]["marker"]["color"], "red");
    }

    #[test]
    fn test_write_figure() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bar.json");
        write_figure(&bar_figure(&[]), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["data"][0]["type"], "bar");
    }
}
