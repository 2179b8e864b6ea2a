use super::*;
use crate::catalog::synthetic_catalog;
use skyview_bridge::FigurePhase;
use skyview_figure::plots::DataPayload;
use skyview_figure::{Dimension, PlotKind, Theme, ThemeMode};
use skyview_frame::ColumnFrame;
use skyview_widget::{HeadlessWidget, WidgetHandle};

fn session_with(config: AppConfig) -> Session {
    let catalog = synthetic_catalog(2_000, 42).unwrap();
    let mut session = Session::new(config, catalog);
    session
        .mount_figure("sky", |description, theme| {
            HeadlessWidget::from_description(description, theme.clone())
        })
        .unwrap();
    session.pump();
    session
}

fn session() -> Session {
    session_with(AppConfig {
        default_bins: 32,
        ..AppConfig::default()
    })
}

fn grid_total(session: &Session) -> usize {
    let Some(DataPayload::Image { grid }) = session.payload("sky") else {
        panic!("heatmap must produce an image");
    };
    grid.values.iter().filter(|v| v.is_finite()).sum::<f64>() as usize
}

fn shown_revision(session: &Session) -> u64 {
    session
        .with_widget("sky", |w: &HeadlessWidget| w.specs()[0].source.revision)
        .unwrap()
}

fn renderer_names(session: &Session) -> Vec<String> {
    session
        .with_widget("sky", |w: &HeadlessWidget| {
            w.renderer_names().iter().map(|s| s.to_string()).collect()
        })
        .unwrap()
}

#[test]
fn mounted_figure_follows_default_plot() {
    let session = session();

    assert_eq!(
        session.phase::<HeadlessWidget>("sky"),
        Some(FigurePhase::Ready)
    );
    assert_eq!(renderer_names(&session), vec!["heatmap"]);
    assert!(matches!(
        session.payload("sky"),
        Some(DataPayload::Image { .. })
    ));
}

#[test]
fn changing_plot_kind_swaps_renderers() {
    let session = session();

    session.context().plot.kind.set_value(PlotKind::Scatter);
    session.pump();

    assert_eq!(renderer_names(&session), vec!["scatter"]);
    assert!(matches!(
        session.payload("sky"),
        Some(DataPayload::Points { .. })
    ));
}

#[test]
fn toggling_dark_mode_only_touches_theme() {
    let session = session();
    let view = session.view::<HeadlessWidget>("sky").unwrap();
    let renderer_passes = view.renderer_passes();

    session.context().plot.toggle_dark();
    session.pump();

    assert_eq!(
        session
            .with_widget("sky", |w: &HeadlessWidget| w.theme().clone())
            .unwrap(),
        Theme::dark_minimal()
    );
    assert_eq!(view.renderer_passes(), renderer_passes);
    assert_eq!(
        session.description("sky").unwrap().theme,
        ThemeMode::Dark
    );

    session.context().plot.bins.set_value(16);
    session.pump();
    assert_eq!(view.renderer_passes(), renderer_passes + 1);
    assert_eq!(
        session.description("sky").unwrap().theme,
        ThemeMode::Dark
    );
}

#[test]
fn configured_themes_are_used() {
    let session = session_with(AppConfig {
        dark_mode: true,
        dark_theme: Theme::new("night_sky"),
        default_bins: 16,
        ..AppConfig::default()
    });

    assert_eq!(
        session
            .with_widget("sky", |w: &HeadlessWidget| w.theme().name().to_string())
            .unwrap(),
        "night_sky"
    );
}

#[test]
fn subset_selection_rebuilds_from_filtered_rows() {
    let session = session();
    let view = session.view::<HeadlessWidget>("sky").unwrap();
    let renderer_passes = view.renderer_passes();
    let plot = &session.context().plot;
    plot.kind.set_value(PlotKind::Histogram);
    plot.x.set_value("redshift".to_string());

    let kept = session
        .context()
        .data
        .select_where("redshift", |z| z < 0.2)
        .unwrap();
    session.pump();

    let Some(DataPayload::Bars { counts, .. }) = session.payload("sky") else {
        panic!("histogram must produce bars");
    };
    assert_eq!(counts.iter().sum::<u64>() as usize, kept);
    assert!(kept < 2_000);
    assert_eq!(view.renderer_passes(), renderer_passes + 1);
    assert_eq!(renderer_names(&session), vec!["histogram"]);
    assert_eq!(shown_revision(&session), session.context().data.revision());
}

/// Rows 0 and 3 hold the extremes, so keeping only them leaves the axis
/// limits unchanged.
fn extremes_frame() -> ColumnFrame {
    ColumnFrame::new()
        .with_column("ra", vec![10.0, 20.0, 30.0, 40.0])
        .and_then(|f| f.with_column("dec", vec![-5.0, 0.0, 1.0, 5.0]))
        .and_then(|f| f.with_column("redshift", vec![0.05, 0.5, 0.5, 0.05]))
        .unwrap()
}

#[test]
fn subset_with_unchanged_limits_still_reaches_widget() {
    let mut session = Session::new(
        AppConfig {
            default_bins: 4,
            ..AppConfig::default()
        },
        extremes_frame(),
    );
    session
        .mount_figure("sky", |d, theme| HeadlessWidget::from_description(d, theme.clone()))
        .unwrap();
    session.pump();
    let view = session.view::<HeadlessWidget>("sky").unwrap();
    let axes_before = session.description("sky").unwrap().axes;
    let revision_before = shown_revision(&session);

    let kept = session
        .context()
        .data
        .select_where("redshift", |z| z < 0.1)
        .unwrap();
    session.pump();

    assert_eq!(kept, 2);
    assert_eq!(grid_total(&session), 2);
    assert_eq!(session.description("sky").unwrap().axes, axes_before);
    assert_eq!(view.renderer_passes(), 1);
    assert_eq!(view.axis_passes(), 0);
    assert_ne!(shown_revision(&session), revision_before);
}

#[test]
fn loading_a_dataset_resets_the_subset() {
    let session = session();
    let view = session.view::<HeadlessWidget>("sky").unwrap();
    let data = &session.context().data;
    data.select_where("redshift", |z| z < 0.2).unwrap();
    session.pump();
    let renderer_passes = view.renderer_passes();

    data.load(synthetic_catalog(500, 7).unwrap());
    session.pump();

    assert!(data.subset.with_untracked(Option::is_none));
    assert_eq!(grid_total(&session), 500);
    assert_eq!(view.renderer_passes(), renderer_passes + 1);
    assert_eq!(shown_revision(&session), data.revision());
}

#[test]
fn clearing_the_subset_rebuilds_from_the_full_frame() {
    let session = session();
    let view = session.view::<HeadlessWidget>("sky").unwrap();
    let data = &session.context().data;
    let kept = data.select_where("redshift", |z| z < 0.2).unwrap();
    session.pump();
    assert_eq!(grid_total(&session), kept);
    let renderer_passes = view.renderer_passes();

    data.clear_subset();
    session.pump();

    assert_eq!(grid_total(&session), 2_000);
    assert_eq!(view.renderer_passes(), renderer_passes + 1);
    assert_eq!(shown_revision(&session), data.revision());

    data.clear_subset();
    session.pump();
    assert_eq!(view.renderer_passes(), renderer_passes + 1);
}

#[test]
fn axis_controls_reach_widget_without_renderer_churn() {
    let session = session();
    let view = session.view::<HeadlessWidget>("sky").unwrap();
    let renderer_passes = view.renderer_passes();

    session.context().plot.flip_y.set_value(true);
    session.pump();

    assert_eq!(view.renderer_passes(), renderer_passes);
    assert_eq!(view.axis_passes(), 1);
    let flipped = session
        .with_widget("sky", |w: &HeadlessWidget| {
            w.axes()
                .iter()
                .find(|a| a.dimension == Dimension::Y)
                .map(|a| a.flipped)
        })
        .unwrap();
    assert_eq!(flipped, Some(true));
}

#[test]
fn failed_rebuild_raises_alert_and_keeps_figure() {
    let session = session();

    session.context().plot.x.set_value("no_such_column".to_string());
    session.pump();

    let alert = &session.context().alert;
    assert!(alert.is_open());
    assert_eq!(alert.severity.value(), Severity::Error);
    assert!(alert.message.value().contains("no_such_column"));
    assert_eq!(renderer_names(&session), vec!["heatmap"]);

    alert.dismiss();
    assert!(!alert.is_open());
}

#[test]
fn unmount_closes_widget_and_forgets_figure() {
    let mut session = session();
    let view = session.view::<HeadlessWidget>("sky").unwrap();

    session.unmount("sky").unwrap();

    assert_eq!(view.phase(), FigurePhase::TornDown);
    assert_eq!(view.with_widget(|w| w.is_closed()), Some(true));
    assert!(session.payload("sky").is_none());
    assert!(session.unmount("sky").is_err());
}

#[test]
fn mounting_same_id_twice_fails() {
    let mut session = session();

    let err = session
        .mount_figure("sky", |d, theme| HeadlessWidget::from_description(d, theme.clone()))
        .unwrap_err();

    assert!(err.to_string().contains("sky"));
}

#[test]
fn shutdown_unmounts_everything() {
    let mut session = session();
    session
        .mount_figure("second", |d, theme| {
            HeadlessWidget::from_description(d, theme.clone())
        })
        .unwrap();
    session.pump();

    session.shutdown().unwrap();

    assert!(session.registry().is_empty());
}
