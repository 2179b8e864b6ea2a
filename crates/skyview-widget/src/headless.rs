use std::fmt;

use skyview_figure::{AxisSpec, Dimension, FigureDescription, RendererSpec, Theme};

use crate::{WidgetError, WidgetHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(pub u64);

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Renderer materialized by a [`HeadlessWidget`].
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessRenderer {
    id: RendererId,
    spec: RendererSpec,
}

impl HeadlessRenderer {
    pub fn id(&self) -> RendererId {
        self.id
    }

    pub fn spec(&self) -> &RendererSpec {
        &self.spec
    }
}

/// Lifecycle calls observed by a [`HeadlessWidget`], in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetEvent {
    Appended(Vec<RendererId>),
    DroppedLeading(usize),
    AxesSet(Vec<Dimension>),
    ThemeSet(Theme),
    RendererDestroyed(RendererId),
    ModelDestroyed,
    Closed,
}

/// In-memory widget that enforces the widget model's rules.
///
/// Forbidden bulk replacements are refused, and lifecycle calls out of order
/// fail: nothing works after `close`, and renderers cannot be destroyed once
/// the model is gone.
#[derive(Debug)]
pub struct HeadlessWidget {
    renderers: Vec<HeadlessRenderer>,
    destroyed: Vec<RendererId>,
    axes: Vec<AxisSpec>,
    theme: Theme,
    next_id: u64,
    model_alive: bool,
    closed: bool,
    fail_append_after: Option<usize>,
    events: Vec<WidgetEvent>,
}

impl HeadlessWidget {
    pub fn new(theme: Theme) -> Self {
        Self {
            renderers: Vec::new(),
            destroyed: Vec::new(),
            axes: Vec::new(),
            theme,
            next_id: 1,
            model_alive: true,
            closed: false,
            fail_append_after: None,
            events: Vec::new(),
        }
    }

    /// Construct the widget the way a first mount does: fully rendered from
    /// the initial description. Construction is not recorded as events.
    pub fn from_description(description: &FigureDescription, theme: Theme) -> Self {
        let mut widget = Self::new(theme);
        let renderers = description
            .renderers
            .iter()
            .map(|spec| widget.allocate(spec))
            .collect();
        widget.renderers = renderers;
        widget.axes = description.axes.clone();
        widget
    }

    fn allocate(&mut self, spec: &RendererSpec) -> HeadlessRenderer {
        let id = RendererId(self.next_id);
        self.next_id += 1;
        HeadlessRenderer {
            id,
            spec: spec.clone(),
        }
    }

    fn ensure_usable(&self) -> Result<(), WidgetError> {
        if self.closed {
            return Err(WidgetError::Closed);
        }
        if !self.model_alive {
            return Err(WidgetError::ModelDestroyed);
        }
        Ok(())
    }

    /// Make the next append fail after attaching `count` renderers.
    pub fn fail_next_append_after(&mut self, count: usize) {
        self.fail_append_after = Some(count);
    }

    pub fn specs(&self) -> Vec<&RendererSpec> {
        self.renderers.iter().map(HeadlessRenderer::spec).collect()
    }

    pub fn renderer_names(&self) -> Vec<&str> {
        self.renderers.iter().map(|r| r.spec.id.as_str()).collect()
    }

    pub fn destroyed(&self) -> &[RendererId] {
        &self.destroyed
    }

    pub fn is_model_alive(&self) -> bool {
        self.model_alive
    }

    pub fn events(&self) -> &[WidgetEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<WidgetEvent> {
        std::mem::take(&mut self.events)
    }
}

impl WidgetHandle for HeadlessWidget {
    type Renderer = HeadlessRenderer;

    fn renderers(&self) -> &[HeadlessRenderer] {
        &self.renderers
    }

    fn materialize(&mut self, spec: &RendererSpec) -> Result<HeadlessRenderer, WidgetError> {
        self.ensure_usable()?;
        Ok(self.allocate(spec))
    }

    fn append_renderers(&mut self, renderers: Vec<HeadlessRenderer>) -> Result<(), WidgetError> {
        self.ensure_usable()?;
        let limit = self.fail_append_after.take();
        let mut attached = Vec::with_capacity(renderers.len());
        for (index, renderer) in renderers.into_iter().enumerate() {
            if limit == Some(index) {
                log::warn!("append interrupted after {index} renderer(s)");
                self.events.push(WidgetEvent::Appended(attached));
                return Err(WidgetError::Rejected {
                    id: renderer.spec.id.clone(),
                    reason: "append interrupted".to_string(),
                });
            }
            attached.push(renderer.id);
            self.renderers.push(renderer);
        }
        self.events.push(WidgetEvent::Appended(attached));
        Ok(())
    }

    fn drop_leading(&mut self, count: usize) -> Result<(), WidgetError> {
        self.ensure_usable()?;
        let count = count.min(self.renderers.len());
        self.renderers.drain(..count);
        self.events.push(WidgetEvent::DroppedLeading(count));
        Ok(())
    }

    fn axes(&self) -> &[AxisSpec] {
        &self.axes
    }

    fn set_axes(&mut self, axes: Vec<AxisSpec>) -> Result<(), WidgetError> {
        self.ensure_usable()?;
        self.events
            .push(WidgetEvent::AxesSet(axes.iter().map(|a| a.dimension).collect()));
        self.axes = axes;
        Ok(())
    }

    fn theme(&self) -> &Theme {
        &self.theme
    }

    fn set_theme(&mut self, theme: Theme) -> Result<(), WidgetError> {
        self.ensure_usable()?;
        self.events.push(WidgetEvent::ThemeSet(theme.clone()));
        self.theme = theme;
        Ok(())
    }

    fn destroy_renderer(&mut self, renderer: &HeadlessRenderer) -> Result<(), WidgetError> {
        self.ensure_usable()?;
        let attached = self.renderers.iter().any(|r| r.id == renderer.id);
        if !attached || self.destroyed.contains(&renderer.id) {
            return Err(WidgetError::RendererMissing {
                id: renderer.spec.id.clone(),
            });
        }
        self.destroyed.push(renderer.id);
        self.events.push(WidgetEvent::RendererDestroyed(renderer.id));
        Ok(())
    }

    fn destroy_model(&mut self) -> Result<(), WidgetError> {
        self.ensure_usable()?;
        self.model_alive = false;
        self.events.push(WidgetEvent::ModelDestroyed);
        Ok(())
    }

    fn close(&mut self) -> Result<(), WidgetError> {
        if self.closed {
            return Err(WidgetError::Closed);
        }
        self.closed = true;
        self.events.push(WidgetEvent::Closed);
        log::debug!(
            "headless widget closed, {} renderer(s) destroyed",
            self.destroyed.len()
        );
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyview_figure::{DataSourceRef, Glyph};

    fn spec(id: &str) -> RendererSpec {
        RendererSpec::new(id, Glyph::Scatter, DataSourceRef::new("cat", ["x", "y"]))
    }

    fn widget_with(ids: &[&str]) -> HeadlessWidget {
        let description = ids
            .iter()
            .fold(FigureDescription::new(), |d, id| d.with_renderer(spec(id)));
        HeadlessWidget::from_description(&description, Theme::light_minimal())
    }

    #[test]
    fn refuses_bulk_replacement() {
        let mut widget = widget_with(&["a"]);
        let replacement = vec![widget.materialize(&spec("b")).unwrap()];
        assert_eq!(
            widget.replace_renderers(replacement).unwrap_err(),
            WidgetError::UnsupportedOperation {
                op: "replace_renderers"
            }
        );
        assert!(matches!(
            widget.replace_model(),
            Err(WidgetError::UnsupportedOperation { .. })
        ));
        assert_eq!(widget.renderer_names(), vec!["a"]);
    }

    #[test]
    fn construction_is_not_recorded() {
        let widget = widget_with(&["a", "b"]);
        assert!(widget.events().is_empty());
        assert_eq!(widget.renderer_count(), 2);
    }

    #[test]
    fn append_then_drop_leading() {
        let mut widget = widget_with(&["a", "b"]);
        let fresh = vec![widget.materialize(&spec("c")).unwrap()];
        widget.append_renderers(fresh).unwrap();
        widget.drop_leading(2).unwrap();
        assert_eq!(widget.renderer_names(), vec!["c"]);
        assert_eq!(widget.drop_leading(5), Ok(()));
        assert_eq!(widget.renderer_count(), 0);
    }

    #[test]
    fn interrupted_append_leaves_partial_list() {
        let mut widget = widget_with(&["a"]);
        let fresh = vec![
            widget.materialize(&spec("b")).unwrap(),
            widget.materialize(&spec("c")).unwrap(),
        ];
        widget.fail_next_append_after(1);
        assert!(matches!(
            widget.append_renderers(fresh),
            Err(WidgetError::Rejected { .. })
        ));
        assert_eq!(widget.renderer_names(), vec!["a", "b"]);
    }

    #[test]
    fn axes_come_from_description_and_can_be_overwritten() {
        let description = FigureDescription::new()
            .with_renderer(spec("a"))
            .with_axis(AxisSpec::new(Dimension::X, "ra"));
        let mut widget = HeadlessWidget::from_description(&description, Theme::light_minimal());
        assert_eq!(widget.axes().len(), 1);

        let flipped = AxisSpec {
            flipped: true,
            ..AxisSpec::new(Dimension::Y, "dec")
        };
        widget
            .set_axes(vec![AxisSpec::new(Dimension::X, "ra"), flipped])
            .unwrap();

        assert!(widget.axes()[1].flipped);
        assert_eq!(
            widget.take_events(),
            vec![WidgetEvent::AxesSet(vec![Dimension::X, Dimension::Y])]
        );
    }

    #[test]
    fn destroying_renderers_after_model_fails() {
        let mut widget = widget_with(&["a"]);
        let first = widget.renderers()[0].clone();
        widget.destroy_model().unwrap();
        assert_eq!(
            widget.destroy_renderer(&first).unwrap_err(),
            WidgetError::ModelDestroyed
        );
    }

    #[test]
    fn nothing_works_after_close() {
        let mut widget = widget_with(&["a"]);
        widget.close().unwrap();
        assert!(widget.is_closed());
        assert_eq!(
            widget.set_theme(Theme::dark_minimal()).unwrap_err(),
            WidgetError::Closed
        );
        assert_eq!(widget.close().unwrap_err(), WidgetError::Closed);
    }

    #[test]
    fn destroying_twice_is_reported() {
        let mut widget = widget_with(&["a"]);
        let first = widget.renderers()[0].clone();
        widget.destroy_renderer(&first).unwrap();
        assert!(matches!(
            widget.destroy_renderer(&first),
            Err(WidgetError::RendererMissing { .. })
        ));
        assert_eq!(widget.destroyed(), &[first.id()]);
    }
}
