use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use skyview_bridge::{BridgeError, FigureView};
use skyview_core::{mutableStateOf, MutableState, Runtime, RuntimeHandle, RuntimeScheduler};
use skyview_figure::{FigureDescription, Theme, ThemePair};
use skyview_widget::{HeadlessWidget, WidgetEvent, WidgetHandle};

/// Scheduler that only counts flush requests; the rule flushes explicitly.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    requests: AtomicUsize,
}

impl RecordingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl RuntimeScheduler for RecordingScheduler {
    fn request_flush(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Headless harness for exercising a mounted figure in tests.
///
/// `BridgeTestRule` owns a runtime, the description and dark-mode cells, and
/// a [`FigureView`] over a [`HeadlessWidget`]. Nothing reconciles until
/// [`BridgeTestRule::load`] plays the loader, and nothing is delivered until
/// [`BridgeTestRule::pump_until_idle`] drives the runtime.
pub struct BridgeTestRule {
    runtime: Runtime,
    scheduler: Arc<RecordingScheduler>,
    description: MutableState<FigureDescription>,
    dark: MutableState<bool>,
    themes: ThemePair,
    view: Option<FigureView<HeadlessWidget>>,
}

impl BridgeTestRule {
    /// Create a rule with the default `light_minimal`/`dark_minimal` pair.
    pub fn new() -> Self {
        Self::with_themes(ThemePair::default())
    }

    pub fn with_themes(themes: ThemePair) -> Self {
        let scheduler = Arc::new(RecordingScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        let handle = runtime.handle();
        Self {
            description: mutableStateOf(&handle, FigureDescription::new()),
            dark: mutableStateOf(&handle, false),
            runtime,
            scheduler,
            themes,
            view: None,
        }
    }

    /// Install `description` and mount the figure on first use. The widget
    /// is not constructed until [`BridgeTestRule::load`].
    pub fn set_content(&mut self, description: FigureDescription) -> &FigureView<HeadlessWidget> {
        self.description.set_value(description);
        let handle = self.runtime.handle();
        let description = self.description.as_state();
        let dark = self.dark.as_state();
        let themes = self.themes.clone();
        self.view
            .get_or_insert_with(|| FigureView::mount(&handle, "test-figure", description, dark, themes))
    }

    /// Play the loader: build the widget from the current description, then
    /// drive the runtime until idle.
    pub fn load(&mut self) -> Result<(), BridgeError> {
        let theme = self.current_theme();
        self.view()?
            .attach_with(|initial| HeadlessWidget::from_description(initial, theme))?;
        self.pump_until_idle();
        Ok(())
    }

    pub fn set_description(&self, description: FigureDescription) {
        self.description.set_value(description);
    }

    pub fn set_dark(&self, dark: bool) {
        self.dark.set_value(dark);
    }

    /// Deliver queued tasks and effects until none remain.
    pub fn pump_until_idle(&self) -> usize {
        let mut processed = 0;
        while !self.runtime.is_idle() {
            processed += self.runtime.flush();
        }
        processed
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    /// Flush requests raised since the rule was created.
    pub fn flush_requests(&self) -> usize {
        self.scheduler.requests()
    }

    pub fn view(&self) -> Result<&FigureView<HeadlessWidget>, BridgeError> {
        self.view.as_ref().ok_or_else(|| BridgeError::NotMounted {
            id: "test-figure".to_string(),
        })
    }

    /// Read the headless widget, if the loader has run.
    pub fn with_widget<R>(&self, f: impl FnOnce(&HeadlessWidget) -> R) -> Option<R> {
        self.view.as_ref().and_then(|view| view.with_widget(f))
    }

    pub fn renderer_names(&self) -> Vec<String> {
        self.with_widget(|w| w.renderer_names().iter().map(|s| s.to_string()).collect())
            .unwrap_or_default()
    }

    pub fn theme(&self) -> Option<Theme> {
        self.with_widget(|w| w.theme().clone())
    }

    /// Drain the widget's lifecycle log.
    pub fn take_events(&self) -> Vec<WidgetEvent> {
        self.view
            .as_ref()
            .and_then(|view| view.with_widget_mut(HeadlessWidget::take_events))
            .unwrap_or_default()
    }

    /// Dispose the figure's effects and tear the widget down.
    pub fn unmount(&mut self) -> Result<(), BridgeError> {
        self.view()?.unmount()
    }

    fn current_theme(&self) -> Theme {
        self.themes
            .select(self.dark.with_untracked(|dark| *dark))
            .clone()
    }
}

impl Default for BridgeTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `BridgeTestRule`.
pub fn run_test_figure<R>(f: impl FnOnce(&mut BridgeTestRule) -> R) -> R {
    let mut rule = BridgeTestRule::new();
    f(&mut rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyview_figure::{DataSourceRef, Glyph, RendererSpec};

    fn description(ids: &[&str]) -> FigureDescription {
        ids.iter().fold(FigureDescription::new(), |d, id| {
            d.with_renderer(RendererSpec::new(
                *id,
                Glyph::Line,
                DataSourceRef::new("catalog", ["redshift"]),
            ))
        })
    }

    #[test]
    fn bridge_test_rule_gates_on_load() {
        run_test_figure(|rule| {
            assert!(rule.view().is_err());
            rule.set_content(description(&["a", "b"]));
            rule.pump_until_idle();
            assert!(rule.with_widget(|_| ()).is_none());
            assert!(rule.flush_requests() > 0);

            rule.load().expect("load widget");
            assert_eq!(rule.renderer_names(), vec!["a", "b"]);

            rule.take_events();
            rule.set_description(description(&["c"]));
            rule.pump_until_idle();
            assert_eq!(rule.renderer_names(), vec!["c"]);
            assert_eq!(rule.take_events().len(), 2);
        });
    }

    #[test]
    fn loading_twice_is_refused() {
        run_test_figure(|rule| {
            rule.set_content(description(&["a"]));
            rule.load().expect("first load");
            assert!(matches!(
                rule.load(),
                Err(BridgeError::AlreadyMounted { .. })
            ));
        });
    }
}
