use std::fmt::Debug;

use skyview_figure::{AxisSpec, RendererSpec, Theme};

use crate::WidgetError;

/// Mutable, externally-owned figure widget.
///
/// The renderer list is appendable and can have a prefix dropped; it can not
/// be swapped wholesale. [`WidgetHandle::replace_renderers`] and
/// [`WidgetHandle::replace_model`] exist only so implementations can refuse
/// them: both corrupt the widget framework's render bookkeeping.
pub trait WidgetHandle {
    type Renderer: Clone + Debug;

    fn renderers(&self) -> &[Self::Renderer];

    fn renderer_count(&self) -> usize {
        self.renderers().len()
    }

    /// Turn a descriptor into a widget-native renderer, not yet attached.
    fn materialize(&mut self, spec: &RendererSpec) -> Result<Self::Renderer, WidgetError>;

    /// Append renderers to the end of the list, in order.
    fn append_renderers(&mut self, renderers: Vec<Self::Renderer>) -> Result<(), WidgetError>;

    /// Drop the first `count` renderers.
    fn drop_leading(&mut self, count: usize) -> Result<(), WidgetError>;

    fn replace_renderers(&mut self, _renderers: Vec<Self::Renderer>) -> Result<(), WidgetError> {
        Err(WidgetError::UnsupportedOperation {
            op: "replace_renderers",
        })
    }

    fn replace_model(&mut self) -> Result<(), WidgetError> {
        Err(WidgetError::UnsupportedOperation {
            op: "replace_model",
        })
    }

    fn axes(&self) -> &[AxisSpec];

    /// Overwrite every axis. Axes carry no renderer state, so a wholesale
    /// swap is allowed here.
    fn set_axes(&mut self, axes: Vec<AxisSpec>) -> Result<(), WidgetError>;

    fn theme(&self) -> &Theme;

    fn set_theme(&mut self, theme: Theme) -> Result<(), WidgetError>;

    fn destroy_renderer(&mut self, renderer: &Self::Renderer) -> Result<(), WidgetError>;

    fn destroy_model(&mut self) -> Result<(), WidgetError>;

    fn close(&mut self) -> Result<(), WidgetError>;

    fn is_closed(&self) -> bool;
}
