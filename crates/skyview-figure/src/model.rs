use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use skyview_frame::Limits;

use crate::theme::ThemeMode;

/// Kind of visual mark a renderer draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    Scatter,
    Image,
    Quad,
    Line,
}

/// Named data source plus the columns a renderer reads from it.
///
/// `revision` identifies the rows behind the source: two refs with the same
/// name and columns but different revisions point at different data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataSourceRef {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub revision: u64,
}

impl DataSourceRef {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            revision: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill_color: Option<String>,
    pub line_color: Option<String>,
    pub alpha: f32,
    pub size: f32,
    pub colormap: Option<String>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill_color: None,
            line_color: None,
            alpha: 1.0,
            size: 4.0,
            colormap: None,
        }
    }
}

impl Hash for Style {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fill_color.hash(state);
        self.line_color.hash(state);
        self.alpha.to_bits().hash(state);
        self.size.to_bits().hash(state);
        self.colormap.hash(state);
    }
}

/// One renderer in a figure description.
#[derive(Clone, Debug, PartialEq, Hash, Serialize, Deserialize)]
pub struct RendererSpec {
    pub id: String,
    pub glyph: Glyph,
    pub source: DataSourceRef,
    #[serde(default)]
    pub style: Style,
}

impl RendererSpec {
    pub fn new(id: impl Into<String>, glyph: Glyph, source: DataSourceRef) -> Self {
        Self {
            id: id.into(),
            glyph,
            source,
            style: Style::default(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub dimension: Dimension,
    pub label: String,
    pub range: Option<Limits>,
    #[serde(default)]
    pub scale: AxisScale,
    #[serde(default)]
    pub flipped: bool,
}

impl AxisSpec {
    pub fn new(dimension: Dimension, label: impl Into<String>) -> Self {
        Self {
            dimension,
            label: label.into(),
            range: None,
            scale: AxisScale::Linear,
            flipped: false,
        }
    }
}

impl Hash for AxisSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dimension.hash(state);
        self.label.hash(state);
        self.range
            .map(|limits| (limits.min.to_bits(), limits.max.to_bits()))
            .hash(state);
        self.scale.hash(state);
        self.flipped.hash(state);
    }
}

/// Desired visualization: renderers, axes and theme.
///
/// Built fresh by application code on every relevant change. The bridge only
/// reads it.
#[derive(Clone, Debug, Default, PartialEq, Hash, Serialize, Deserialize)]
pub struct FigureDescription {
    pub title: Option<String>,
    pub renderers: Vec<RendererSpec>,
    pub axes: Vec<AxisSpec>,
    #[serde(default)]
    pub theme: ThemeMode,
}

impl FigureDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_renderer(mut self, renderer: RendererSpec) -> Self {
        self.renderers.push(renderer);
        self
    }

    pub fn with_axis(mut self, axis: AxisSpec) -> Self {
        self.axes.push(axis);
        self
    }

    pub fn with_theme(mut self, theme: ThemeMode) -> Self {
        self.theme = theme;
        self
    }

    /// Stamp every renderer's source with the revision of the data it was
    /// built from.
    pub fn with_data_revision(mut self, revision: u64) -> Self {
        for renderer in &mut self.renderers {
            renderer.source.revision = revision;
        }
        self
    }

    pub fn renderer_ids(&self) -> Vec<&str> {
        self.renderers.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn axis(&self, dimension: Dimension) -> Option<&AxisSpec> {
        self.axes.iter().find(|axis| axis.dimension == dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(ids: &[&str]) -> FigureDescription {
        ids.iter().fold(FigureDescription::new(), |figure, id| {
            figure.with_renderer(RendererSpec::new(
                *id,
                Glyph::Scatter,
                DataSourceRef::new("catalog", ["ra", "dec"]),
            ))
        })
    }

    #[test]
    fn renderer_ids_preserve_order() {
        assert_eq!(marks(&["c", "d", "e"]).renderer_ids(), vec!["c", "d", "e"]);
    }

    #[test]
    fn description_round_trips_through_json() {
        let figure = marks(&["a"])
            .with_title("ra vs dec")
            .with_axis(AxisSpec {
                range: Some(Limits::new(0.0, 360.0).unwrap()),
                ..AxisSpec::new(Dimension::X, "ra")
            })
            .with_theme(ThemeMode::Dark);
        let json = serde_json::to_string(&figure).unwrap();
        assert!(json.contains("\"theme\":\"dark\""));
        let back: FigureDescription = serde_json::from_str(&json).unwrap();
        assert_eq!(back, figure);
    }

    #[test]
    fn missing_style_defaults_when_deserializing() {
        let json = r#"{"id":"s","glyph":"scatter","source":{"name":"cat","columns":["x"]}}"#;
        let spec: RendererSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.style, Style::default());
        assert_eq!(spec.source.revision, 0);
    }

    #[test]
    fn data_revision_distinguishes_otherwise_equal_figures() {
        let before = marks(&["a", "b"]).with_data_revision(1);
        let after = marks(&["a", "b"]).with_data_revision(2);

        assert_ne!(before, after);
        assert!(after.renderers.iter().all(|r| r.source.revision == 2));
        assert_eq!(before.renderer_ids(), after.renderer_ids());
    }
}
