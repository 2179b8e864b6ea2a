use std::sync::Arc;

use skyview_bridge::{FigurePhase, FigureRenderable, RenderableRegistry};
use skyview_core::{DefaultScheduler, Runtime};
use skyview_figure::{DataSourceRef, FigureDescription, Glyph, RendererSpec, Theme, ThemePair};
use skyview_widget::{HeadlessWidget, WidgetEvent, WidgetHandle};

fn description(glyph: Glyph, ids: &[&str]) -> FigureDescription {
    ids.iter().fold(FigureDescription::new(), |d, id| {
        d.with_renderer(RendererSpec::new(
            *id,
            glyph,
            DataSourceRef::new("catalog", ["ra", "dec"]),
        ))
    })
}

#[test]
fn figure_survives_a_full_session() {
    let rt = Runtime::new(Arc::new(DefaultScheduler));
    let mut registry = RenderableRegistry::new();
    registry
        .register(
            "sky",
            FigureRenderable::new(
                description(Glyph::Image, &["heatmap"]),
                false,
                ThemePair::default(),
                |d, theme| HeadlessWidget::from_description(d, theme.clone()),
            ),
        )
        .unwrap();
    registry.mount("sky", &rt.handle()).unwrap();
    rt.flush();

    let figure = registry
        .get_mut::<FigureRenderable<HeadlessWidget>>("sky")
        .unwrap();
    figure.set_description(description(Glyph::Scatter, &["points", "fit"]));
    figure.set_dark(true);
    rt.flush();
    figure.set_description(description(Glyph::Quad, &["bars"]));
    rt.flush();

    let view = figure.view().cloned().unwrap();
    assert_eq!(view.phase(), FigurePhase::Ready);
    assert_eq!(view.failures(), 0);
    let (names, theme) = view
        .with_widget(|w| {
            (
                w.renderer_names().iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                w.theme().clone(),
            )
        })
        .unwrap();
    assert_eq!(names, vec!["bars"]);
    assert_eq!(theme, Theme::dark_minimal());

    registry.unmount_all().unwrap();
    let tail = view
        .with_widget(|w| w.events().iter().rev().take(2).cloned().collect::<Vec<_>>())
        .unwrap();
    assert_eq!(tail, vec![WidgetEvent::Closed, WidgetEvent::ModelDestroyed]);
    assert!(registry.is_empty());
}
