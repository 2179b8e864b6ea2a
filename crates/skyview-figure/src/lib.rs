//! Figure descriptions: the value application code produces on every
//! relevant state change and the bridge reads when reconciling a widget.

mod model;
pub mod plots;
mod theme;

pub use model::{
    AxisScale, AxisSpec, DataSourceRef, Dimension, FigureDescription, Glyph, RendererSpec, Style,
};
pub use plots::{DataPayload, PlotKind, PlotOutput, PlotSettings};
pub use theme::{Theme, ThemeMode, ThemePair};
