//! Per-session application state.
//!
//! Everything a dashboard page reads or writes lives in an [`AppContext`]
//! built once per session and passed by reference. Each field group is a set
//! of state cells, so reading one inside an observer subscribes to it.

use std::fmt;
use std::rc::Rc;

use skyview_core::{mutableStateOf, MutableState, RuntimeHandle};
use skyview_figure::{PlotKind, PlotSettings, ThemeMode};
use skyview_frame::{ColumnFrame, FrameProvider, Result as FrameResult};

use crate::AppConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

/// The dismissible banner at the top of a page.
#[derive(Clone)]
pub struct Alert {
    pub message: MutableState<String>,
    pub severity: MutableState<Severity>,
    pub open: MutableState<bool>,
}

impl Alert {
    pub fn new(runtime: &RuntimeHandle) -> Self {
        Self {
            message: mutableStateOf(runtime, String::new()),
            severity: mutableStateOf(runtime, Severity::Info),
            open: mutableStateOf(runtime, false),
        }
    }

    pub fn show(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Error => log::error!("alert: {message}"),
            Severity::Warning => log::warn!("alert: {message}"),
            Severity::Info => log::info!("alert: {message}"),
        }
        self.message.set_if_changed(message);
        self.severity.set_if_changed(severity);
        self.open.set_if_changed(true);
    }

    pub fn dismiss(&self) {
        self.open.set_if_changed(false);
    }

    pub fn is_open(&self) -> bool {
        self.open.with_untracked(|open| *open)
    }
}

/// The loaded dataset and the active subset of it.
///
/// `revision` counts changes to the rows figures are built from. Write
/// through the methods below so it stays in step with `frame` and `subset`.
#[derive(Clone)]
pub struct DataState {
    pub frame: MutableState<Rc<ColumnFrame>>,
    pub subset: MutableState<Option<Rc<Vec<bool>>>>,
    revision: MutableState<u64>,
}

impl DataState {
    pub fn new(runtime: &RuntimeHandle, frame: ColumnFrame) -> Self {
        Self {
            frame: mutableStateOf(runtime, Rc::new(frame)),
            subset: mutableStateOf(runtime, None),
            revision: mutableStateOf(runtime, 0),
        }
    }

    fn bump_revision(&self) {
        self.revision.update(|revision| *revision += 1);
    }

    /// Swap in a new dataset. Any subset refers to the old rows and is dropped.
    pub fn load(&self, frame: ColumnFrame) {
        log::info!("loaded dataset with {} rows", frame.row_count());
        self.subset.set_value(None);
        self.frame.set_value(Rc::new(frame));
        self.bump_revision();
    }

    /// Restrict the active frame to rows where `predicate` holds on `column`.
    pub fn select_where(&self, column: &str, predicate: impl Fn(f64) -> bool) -> FrameResult<usize> {
        let mask = self
            .frame
            .with_untracked(|frame| frame.mask_where(column, predicate))?;
        let kept = mask.iter().filter(|&&keep| keep).count();
        if self.subset.set_if_changed(Some(Rc::new(mask))) {
            self.bump_revision();
        }
        Ok(kept)
    }

    pub fn clear_subset(&self) {
        if self.subset.set_if_changed(None) {
            self.bump_revision();
        }
    }

    /// Tracked read of the data revision.
    pub fn revision(&self) -> u64 {
        self.revision.value()
    }

    /// The frame figures are built from: the dataset, filtered by the subset.
    ///
    /// Tracked: an observer calling this replays when either changes.
    pub fn active(&self) -> FrameResult<Rc<ColumnFrame>> {
        let frame = self.frame.value();
        match self.subset.value() {
            Some(mask) => frame.filter(&mask).map(Rc::new),
            None => Ok(frame),
        }
    }
}

/// Plot controls.
#[derive(Clone)]
pub struct PlotState {
    pub kind: MutableState<PlotKind>,
    pub x: MutableState<String>,
    pub y: MutableState<String>,
    pub color: MutableState<Option<String>>,
    pub bins: MutableState<usize>,
    pub colormap: MutableState<String>,
    pub log_x: MutableState<bool>,
    pub log_y: MutableState<bool>,
    pub flip_x: MutableState<bool>,
    pub flip_y: MutableState<bool>,
    pub dark: MutableState<bool>,
}

impl PlotState {
    pub fn new(runtime: &RuntimeHandle, config: &AppConfig) -> Self {
        Self {
            kind: mutableStateOf(runtime, config.default_plot),
            x: mutableStateOf(runtime, config.default_x.clone()),
            y: mutableStateOf(runtime, config.default_y.clone()),
            color: mutableStateOf(runtime, None),
            bins: mutableStateOf(runtime, config.default_bins),
            colormap: mutableStateOf(runtime, config.default_colormap.clone()),
            log_x: mutableStateOf(runtime, false),
            log_y: mutableStateOf(runtime, false),
            flip_x: mutableStateOf(runtime, false),
            flip_y: mutableStateOf(runtime, false),
            dark: mutableStateOf(runtime, config.dark_mode),
        }
    }

    /// Snapshot the controls. Every cell except `dark` is read tracked; the
    /// theme is applied by the theme reconciliation, not by a rebuild.
    pub fn settings(&self) -> PlotSettings {
        PlotSettings {
            kind: self.kind.value(),
            x: self.x.value(),
            y: self.y.value(),
            color: self.color.value(),
            bins: self.bins.value(),
            colormap: self.colormap.value(),
            log_x: self.log_x.value(),
            log_y: self.log_y.value(),
            flip_x: self.flip_x.value(),
            flip_y: self.flip_y.value(),
            theme: ThemeMode::from_dark(self.dark.with_untracked(|dark| *dark)),
        }
    }

    pub fn toggle_dark(&self) {
        self.dark.update(|dark| *dark = !*dark);
    }
}

/// All state for one session.
pub struct AppContext {
    runtime: RuntimeHandle,
    config: AppConfig,
    pub alert: Alert,
    pub data: DataState,
    pub plot: PlotState,
}

impl AppContext {
    pub fn new(runtime: &RuntimeHandle, config: AppConfig, frame: ColumnFrame) -> Self {
        Self {
            runtime: runtime.clone(),
            alert: Alert::new(runtime),
            data: DataState::new(runtime, frame),
            plot: PlotState::new(runtime, &config),
            config,
        }
    }

    pub fn runtime(&self) -> &RuntimeHandle {
        &self.runtime
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("rows", &self.data.frame.with_untracked(|frame| frame.row_count()))
            .field("settings", &self.plot.settings())
            .field("alert_open", &self.alert.is_open())
            .finish()
    }
}
