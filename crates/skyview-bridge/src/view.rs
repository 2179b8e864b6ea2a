use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use skyview_core::{
    dependency_key, effect, EffectHandle, EffectResult, Owned, RuntimeHandle, State,
};
use skyview_figure::{FigureDescription, ThemePair};
use skyview_widget::WidgetHandle;

use crate::loader::{initialize, ReadySetter, ReadyState};
use crate::reconcile::{reconcile_axes, reconcile_renderers, reconcile_theme, teardown};
use crate::BridgeError;

/// Lifecycle of one mounted figure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FigurePhase {
    Unmounted,
    Loading,
    Ready,
    Reconciling,
    TornDown,
}

struct ViewInner<W: WidgetHandle> {
    id: String,
    widget: Owned<Option<W>>,
    ready: ReadyState,
    setter: ReadySetter,
    description: State<FigureDescription>,
    dark: State<bool>,
    themes: ThemePair,
    /// What the widget is known to show; `None` when unknown.
    applied: RefCell<Option<FigureDescription>>,
    phase: Cell<FigurePhase>,
    renderer_passes: Cell<usize>,
    axis_passes: Cell<usize>,
    theme_passes: Cell<usize>,
    failures: Cell<usize>,
    effects: RefCell<Vec<EffectHandle>>,
}

impl<W: WidgetHandle> ViewInner<W> {
    /// Bring renderers and axes in line with the description, touching only
    /// the parts that differ from what the widget shows. `force` skips the
    /// comparison.
    fn sync_description(&self, force: bool) -> Result<bool, BridgeError> {
        if !self.ready.is_ready_untracked() {
            return Ok(false);
        }
        let description = self.description.with_untracked(Clone::clone);
        let (renderers_stale, axes_stale) = match self.applied.borrow().as_ref() {
            Some(applied) if !force => (
                applied.renderers != description.renderers,
                applied.axes != description.axes,
            ),
            _ => (true, true),
        };
        if !renderers_stale && !axes_stale {
            return Ok(false);
        }

        // A failed pass leaves the widget in an unknown state.
        self.applied.replace(None);
        self.with_reconciling(|widget| {
            if renderers_stale {
                reconcile_renderers(widget, &description)?;
            }
            if axes_stale {
                reconcile_axes(widget, &description)?;
            }
            Ok(())
        })?;
        if renderers_stale {
            self.renderer_passes.set(self.renderer_passes.get() + 1);
        }
        if axes_stale {
            self.axis_passes.set(self.axis_passes.get() + 1);
        }
        self.applied.replace(Some(description));
        Ok(true)
    }

    fn sync_theme(&self) -> Result<bool, BridgeError> {
        if !self.ready.is_ready_untracked() {
            return Ok(false);
        }
        let dark = self.dark.with_untracked(|dark| *dark);
        self.with_reconciling(|widget| {
            reconcile_theme(widget, dark, &self.themes.light, &self.themes.dark)
        })?;
        self.theme_passes.set(self.theme_passes.get() + 1);
        Ok(true)
    }

    fn with_reconciling(
        &self,
        pass: impl FnOnce(&mut W) -> Result<(), skyview_widget::WidgetError>,
    ) -> Result<(), BridgeError> {
        self.phase.set(FigurePhase::Reconciling);
        let result = self.widget.update(|slot| match slot.as_mut() {
            Some(widget) => pass(widget).map_err(BridgeError::from),
            None => Err(BridgeError::NotReady),
        });
        self.phase.set(FigurePhase::Ready);
        result
    }

    // Errors stop here. The next dependency change reconciles again.
    fn report(&self, what: &str, result: Result<bool, BridgeError>) {
        match result {
            Ok(true) => log::debug!("figure `{}`: {what} pass done", self.id),
            Ok(false) => {}
            Err(err) => {
                self.failures.set(self.failures.get() + 1);
                log::error!("figure `{}`: {what} pass failed: {err}", self.id);
            }
        }
    }
}

/// A figure wired onto the runtime.
///
/// Mounting registers two effects: one reconciles renderers and axes whenever
/// those parts of the description change, the other reconciles the theme whenever the dark
/// flag changes. Both are gated on the loader signal, so nothing touches the
/// widget before [`FigureView::attach`] runs.
pub struct FigureView<W: WidgetHandle + 'static> {
    inner: Rc<ViewInner<W>>,
}

impl<W: WidgetHandle + 'static> Clone for FigureView<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<W: WidgetHandle + 'static> FigureView<W> {
    pub fn mount(
        runtime: &RuntimeHandle,
        id: impl Into<String>,
        description: State<FigureDescription>,
        dark: State<bool>,
        themes: ThemePair,
    ) -> Self {
        let (ready, setter) = initialize(runtime, {
            let description = description.clone();
            move || description.with_untracked(Clone::clone)
        });
        let inner = Rc::new(ViewInner {
            id: id.into(),
            widget: Owned::new(None),
            ready,
            setter,
            description,
            dark,
            themes,
            applied: RefCell::new(None),
            phase: Cell::new(FigurePhase::Loading),
            renderer_passes: Cell::new(0),
            axis_passes: Cell::new(0),
            theme_passes: Cell::new(0),
            failures: Cell::new(0),
            effects: RefCell::new(Vec::new()),
        });

        // Keyed on what the widget can show: the theme has its own effect and
        // the title is fixed at construction.
        let description_effect = {
            let ready = inner.ready.clone();
            let description = inner.description.clone();
            let weak: Weak<ViewInner<W>> = Rc::downgrade(&inner);
            effect(
                runtime,
                move || {
                    let shown = description.with(|d| dependency_key(&(&d.renderers, &d.axes)));
                    (ready.is_ready(), shown)
                },
                move |_| {
                    if let Some(inner) = weak.upgrade() {
                        let result = inner.sync_description(false);
                        inner.report("description", result);
                    }
                    EffectResult::default()
                },
            )
        };
        let theme_effect = {
            let ready = inner.ready.clone();
            let dark = inner.dark.clone();
            let weak: Weak<ViewInner<W>> = Rc::downgrade(&inner);
            effect(
                runtime,
                move || (ready.is_ready(), dark.value()),
                move |_| {
                    if let Some(inner) = weak.upgrade() {
                        let result = inner.sync_theme();
                        inner.report("theme", result);
                    }
                    EffectResult::default()
                },
            )
        };
        inner
            .effects
            .borrow_mut()
            .extend([description_effect, theme_effect]);
        log::info!("figure `{}` mounted, waiting for loader", inner.id);
        Self { inner }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn phase(&self) -> FigurePhase {
        self.inner.phase.get()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.is_ready_untracked()
    }

    /// Loader callback: hand over the constructed widget and flip `ready`.
    ///
    /// Nothing is known about what `widget` shows, so the first pass
    /// reconciles it fully.
    pub fn attach(&self, widget: W) -> Result<(), BridgeError> {
        self.attach_showing(widget, None)
    }

    /// Construct the widget from the initial description, then attach it.
    ///
    /// The widget already shows that description, so the first pass after
    /// `ready` flips only touches what changed since.
    pub fn attach_with(
        &self,
        build: impl FnOnce(&FigureDescription) -> W,
    ) -> Result<(), BridgeError> {
        let initial = self.inner.ready.initial_description();
        let widget = build(&initial);
        self.attach_showing(widget, Some(initial))
    }

    fn attach_showing(
        &self,
        widget: W,
        shown: Option<FigureDescription>,
    ) -> Result<(), BridgeError> {
        match self.phase() {
            FigurePhase::Loading => {}
            FigurePhase::TornDown => {
                return Err(BridgeError::NotMounted {
                    id: self.inner.id.clone(),
                })
            }
            _ => {
                return Err(BridgeError::AlreadyMounted {
                    id: self.inner.id.clone(),
                })
            }
        }
        self.inner.widget.replace(Some(widget));
        self.inner.applied.replace(shown);
        self.inner.phase.set(FigurePhase::Ready);
        self.inner.setter.mark_ready();
        log::info!("figure `{}` ready", self.inner.id);
        Ok(())
    }

    /// Reconcile renderers and theme right now instead of on the next flush.
    pub fn refresh(&self) -> Result<(), BridgeError> {
        if !self.is_ready() || self.phase() == FigurePhase::TornDown {
            return Err(BridgeError::NotReady);
        }
        self.inner.sync_description(true)?;
        self.inner.sync_theme()?;
        Ok(())
    }

    /// Dispose the effects and tear the widget down.
    pub fn unmount(&self) -> Result<(), BridgeError> {
        if self.phase() == FigurePhase::TornDown {
            return Ok(());
        }
        let effects: Vec<EffectHandle> = self.inner.effects.borrow_mut().drain(..).collect();
        drop(effects);
        self.inner.setter.set(false);
        self.inner.phase.set(FigurePhase::TornDown);
        // The closed widget stays in place so its final state can be read.
        let result = self
            .inner
            .widget
            .update(|slot| slot.as_mut().map(teardown))
            .unwrap_or(Ok(()));
        log::info!("figure `{}` unmounted", self.inner.id);
        result.map_err(BridgeError::from)
    }

    pub fn with_widget<R>(&self, f: impl FnOnce(&W) -> R) -> Option<R> {
        self.inner.widget.with(|slot| slot.as_ref().map(f))
    }

    pub fn with_widget_mut<R>(&self, f: impl FnOnce(&mut W) -> R) -> Option<R> {
        self.inner.widget.update(|slot| slot.as_mut().map(f))
    }

    /// Completed renderer reconciliations.
    pub fn renderer_passes(&self) -> usize {
        self.inner.renderer_passes.get()
    }

    /// Completed axis reconciliations.
    pub fn axis_passes(&self) -> usize {
        self.inner.axis_passes.get()
    }

    /// Completed theme reconciliations.
    pub fn theme_passes(&self) -> usize {
        self.inner.theme_passes.get()
    }

    /// Reconciliation passes that raised.
    pub fn failures(&self) -> usize {
        self.inner.failures.get()
    }
}

impl<W: WidgetHandle + 'static> fmt::Debug for FigureView<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FigureView")
            .field("id", &self.inner.id)
            .field("phase", &self.phase())
            .field("renderer_passes", &self.renderer_passes())
            .field("axis_passes", &self.axis_passes())
            .field("theme_passes", &self.theme_passes())
            .finish()
    }
}
