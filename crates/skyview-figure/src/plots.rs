//! Figure builders over a [`FrameProvider`].
//!
//! Each builder returns the description the bridge reconciles against and
//! the data payload the widget's sources would be filled from.

use serde::{Deserialize, Serialize};
use skyview_frame::{Aggregation, FrameProvider, Grid, Limits, Result};

use crate::model::{
    AxisScale, AxisSpec, DataSourceRef, Dimension, FigureDescription, Glyph, RendererSpec, Style,
};
use crate::theme::ThemeMode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    Scatter,
    #[default]
    Heatmap,
    Histogram,
}

impl PlotKind {
    pub fn name(self) -> &'static str {
        match self {
            PlotKind::Scatter => "scatter",
            PlotKind::Heatmap => "heatmap",
            PlotKind::Histogram => "histogram",
        }
    }
}

/// Snapshot of the plot controls a figure is built from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlotSettings {
    pub kind: PlotKind,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    pub bins: usize,
    pub colormap: String,
    pub log_x: bool,
    pub log_y: bool,
    pub flip_x: bool,
    pub flip_y: bool,
    pub theme: ThemeMode,
}

impl PlotSettings {
    pub fn new(kind: PlotKind, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            kind,
            x: x.into(),
            y: y.into(),
            color: None,
            bins: 200,
            colormap: "viridis".to_string(),
            log_x: false,
            log_y: false,
            flip_x: false,
            flip_y: false,
            theme: ThemeMode::Light,
        }
    }
}

/// Data the widget's sources would be populated with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataPayload {
    Points {
        x: Vec<f64>,
        y: Vec<f64>,
        color: Option<Vec<f64>>,
    },
    Image {
        grid: Grid,
    },
    Bars {
        edges: Vec<f64>,
        counts: Vec<u64>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlotOutput {
    pub description: FigureDescription,
    pub payload: DataPayload,
}

/// Build the figure selected by `settings.kind`.
pub fn build<F: FrameProvider>(frame: &F, settings: &PlotSettings) -> Result<PlotOutput> {
    let output = match settings.kind {
        PlotKind::Scatter => scatter(frame, settings),
        PlotKind::Heatmap => heatmap(frame, settings),
        PlotKind::Histogram => histogram(frame, settings),
    }?;
    log::debug!(
        "built {} figure for {} vs {} ({} renderer(s))",
        settings.kind.name(),
        settings.x,
        settings.y,
        output.description.renderers.len()
    );
    Ok(output)
}

fn axis(
    dimension: Dimension,
    label: &str,
    range: Option<Limits>,
    log: bool,
    flipped: bool,
) -> AxisSpec {
    AxisSpec {
        range,
        scale: if log { AxisScale::Log } else { AxisScale::Linear },
        flipped,
        ..AxisSpec::new(dimension, label)
    }
}

fn titled(settings: &PlotSettings) -> FigureDescription {
    FigureDescription::new()
        .with_title(format!("{} vs {}", settings.y, settings.x))
        .with_theme(settings.theme)
}

pub fn scatter<F: FrameProvider>(frame: &F, settings: &PlotSettings) -> Result<PlotOutput> {
    let x = frame.column(&settings.x)?.to_vec();
    let y = frame.column(&settings.y)?.to_vec();
    let color = match &settings.color {
        Some(name) => Some(frame.column(name)?.to_vec()),
        None => None,
    };

    let mut columns = vec![settings.x.clone(), settings.y.clone()];
    columns.extend(settings.color.iter().cloned());
    let style = Style {
        alpha: 0.6,
        size: 3.0,
        colormap: settings.color.as_ref().map(|_| settings.colormap.clone()),
        ..Style::default()
    };
    let renderer = RendererSpec::new(
        "scatter",
        Glyph::Scatter,
        DataSourceRef::new(format!("points:{}:{}", settings.x, settings.y), columns),
    )
    .with_style(style);

    let description = titled(settings)
        .with_renderer(renderer)
        .with_axis(axis(
            Dimension::X,
            &settings.x,
            frame.min_max(&settings.x).ok(),
            settings.log_x,
            settings.flip_x,
        ))
        .with_axis(axis(
            Dimension::Y,
            &settings.y,
            frame.min_max(&settings.y).ok(),
            settings.log_y,
            settings.flip_y,
        ));
    Ok(PlotOutput {
        description,
        payload: DataPayload::Points { x, y, color },
    })
}

/// Binned 2-D density. With a colour column the cells hold its mean.
pub fn heatmap<F: FrameProvider>(frame: &F, settings: &PlotSettings) -> Result<PlotOutput> {
    let limits_x = frame.min_max(&settings.x)?.widened();
    let limits_y = frame.min_max(&settings.y)?.widened();
    let aggregation = if settings.color.is_some() {
        Aggregation::Mean
    } else {
        Aggregation::Count
    };
    let grid = frame.bin_stat_2d(
        &settings.x,
        &settings.y,
        (limits_x, limits_y),
        (settings.bins, settings.bins),
        aggregation,
        settings.color.as_deref(),
    )?;

    let mut columns = vec![settings.x.clone(), settings.y.clone()];
    columns.extend(settings.color.iter().cloned());
    let renderer = RendererSpec::new(
        "heatmap",
        Glyph::Image,
        DataSourceRef::new(
            format!("grid:{}:{}:{}", settings.x, settings.y, settings.bins),
            columns,
        ),
    )
    .with_style(Style {
        colormap: Some(settings.colormap.clone()),
        ..Style::default()
    });

    let description = titled(settings)
        .with_renderer(renderer)
        .with_axis(axis(
            Dimension::X,
            &settings.x,
            Some(limits_x),
            settings.log_x,
            settings.flip_x,
        ))
        .with_axis(axis(
            Dimension::Y,
            &settings.y,
            Some(limits_y),
            settings.log_y,
            settings.flip_y,
        ));
    Ok(PlotOutput {
        description,
        payload: DataPayload::Image { grid },
    })
}

/// 1-D counts of `settings.x`; the y axis is the count.
pub fn histogram<F: FrameProvider>(frame: &F, settings: &PlotSettings) -> Result<PlotOutput> {
    let limits = frame.min_max(&settings.x)?.widened();
    let counts = frame.bin_count_1d(&settings.x, limits, settings.bins)?;
    let edges = limits.edges(settings.bins);

    let renderer = RendererSpec::new(
        "histogram",
        Glyph::Quad,
        DataSourceRef::new(
            format!("bars:{}:{}", settings.x, settings.bins),
            [settings.x.clone()],
        ),
    )
    .with_style(Style {
        fill_color: Some("steelblue".to_string()),
        line_color: Some("white".to_string()),
        ..Style::default()
    });

    let description = FigureDescription::new()
        .with_title(format!("{} distribution", settings.x))
        .with_theme(settings.theme)
        .with_renderer(renderer)
        .with_axis(axis(
            Dimension::X,
            &settings.x,
            Some(limits),
            settings.log_x,
            settings.flip_x,
        ))
        .with_axis(axis(Dimension::Y, "count", None, settings.log_y, false));
    Ok(PlotOutput {
        description,
        payload: DataPayload::Bars { edges, counts },
    })
}
