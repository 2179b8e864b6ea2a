use std::fmt;

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use skyview_bridge::{FigurePhase, FigureRenderable, FigureView, RenderableRegistry};
use skyview_core::{watch, MutableState, Observer, Owned};
use skyview_figure::plots::{self, DataPayload};
use skyview_figure::{FigureDescription, Theme, ThemeMode};
use skyview_frame::ColumnFrame;
use skyview_runtime_std::StdRuntime;
use skyview_widget::WidgetHandle;

use crate::context::{AppContext, Severity};
use crate::AppConfig;

/// Observers feeding one mounted figure, plus what they last built.
struct FigureBinding {
    observers: Vec<Observer>,
    description: MutableState<FigureDescription>,
    payload: Owned<Option<DataPayload>>,
}

impl FigureBinding {
    fn dispose(&self) {
        for observer in &self.observers {
            observer.dispose();
        }
    }
}

/// One dashboard session: runtime, state and mounted figures.
///
/// Figures are rebuilt from [`AppContext::plot`] and [`AppContext::data`]
/// whenever either changes, and their widgets reconciled on the next
/// [`Session::pump`].
pub struct Session {
    runtime: StdRuntime,
    context: AppContext,
    registry: RenderableRegistry,
    bindings: IndexMap<String, FigureBinding>,
}

impl Session {
    pub fn new(config: AppConfig, frame: ColumnFrame) -> Self {
        let runtime = StdRuntime::new();
        let context = AppContext::new(&runtime.handle(), config, frame);
        Self {
            runtime,
            context,
            registry: RenderableRegistry::new(),
            bindings: IndexMap::new(),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn registry(&self) -> &RenderableRegistry {
        &self.registry
    }

    /// Register and mount a figure built from the plot controls.
    ///
    /// `factory` constructs the widget once the loader runs, from the first
    /// description and the theme for the current mode.
    pub fn mount_figure<W>(
        &mut self,
        id: &str,
        factory: impl Fn(&FigureDescription, &Theme) -> W + 'static,
    ) -> Result<()>
    where
        W: WidgetHandle + 'static,
    {
        let settings = self.context.plot.settings();
        let frame = self.context.data.active()?;
        let initial = plots::build(&*frame, &settings)
            .with_context(|| format!("failed to build initial {} figure", settings.kind.name()))?;

        let revision = self.context.data.revision();
        let figure = FigureRenderable::new(
            initial.description.with_data_revision(revision),
            settings.theme.is_dark(),
            self.context.config().themes(),
            factory,
        );
        self.registry.register(id, figure)?;
        self.registry.mount(id, &self.runtime.handle())?;

        let figure = self.registry.get::<FigureRenderable<W>>(id)?;
        let description = figure
            .description_state()
            .ok_or_else(|| anyhow!("figure `{id}` lost its description after mount"))?;
        let dark = figure
            .dark_state()
            .ok_or_else(|| anyhow!("figure `{id}` lost its dark flag after mount"))?;

        let handle = self.runtime.handle();
        let payload = Owned::new(Some(initial.payload));
        let rebuild = watch(&handle, {
            let plot = self.context.plot.clone();
            let data = self.context.data.clone();
            let alert = self.context.alert.clone();
            let description = description.clone();
            let payload = payload.clone();
            let id = id.to_string();
            move || {
                let settings = plot.settings();
                let revision = data.revision();
                let built = data
                    .active()
                    .and_then(|frame| plots::build(&*frame, &settings));
                match built {
                    Ok(output) => {
                        let next = output.description.with_data_revision(revision);
                        description.set_if_changed(next);
                        payload.replace(Some(output.payload));
                    }
                    Err(err) => alert.show(
                        Severity::Error,
                        format!("could not rebuild figure `{id}`: {err}"),
                    ),
                }
            }
        });
        // Keeps the description's theme current without a rebuild; the
        // renderer pass ignores the theme field.
        let mode = watch(&handle, {
            let plot_dark = self.context.plot.dark.clone();
            let description = description.clone();
            move || {
                let is_dark = plot_dark.value();
                dark.set_if_changed(is_dark);
                let theme = ThemeMode::from_dark(is_dark);
                if description.with_untracked(|d| d.theme != theme) {
                    description.update(|d| d.theme = theme);
                }
            }
        });
        self.bindings.insert(
            id.to_string(),
            FigureBinding {
                observers: vec![rebuild, mode],
                description,
                payload,
            },
        );
        log::info!("session mounted figure `{id}`");
        Ok(())
    }

    /// Run pending tasks and effects until the runtime is idle.
    pub fn pump(&self) -> usize {
        self.runtime.poll()
    }

    pub fn unmount(&mut self, id: &str) -> Result<()> {
        if let Some(binding) = self.bindings.shift_remove(id) {
            binding.dispose();
        }
        self.registry
            .unmount(id)
            .with_context(|| format!("failed to unmount `{id}`"))
    }

    /// Unmount every element, newest first.
    pub fn shutdown(&mut self) -> Result<()> {
        for (_, binding) in self.bindings.drain(..) {
            binding.dispose();
        }
        self.registry
            .unmount_all()
            .context("failed to shut the session down cleanly")
    }

    pub fn view<W: WidgetHandle + 'static>(&self, id: &str) -> Result<FigureView<W>> {
        let figure = self.registry.get::<FigureRenderable<W>>(id)?;
        figure
            .view()
            .cloned()
            .ok_or_else(|| anyhow!("figure `{id}` is not mounted"))
    }

    pub fn phase<W: WidgetHandle + 'static>(&self, id: &str) -> Option<FigurePhase> {
        self.registry
            .get::<FigureRenderable<W>>(id)
            .ok()
            .map(FigureRenderable::phase)
    }

    /// Read the widget behind figure `id`.
    pub fn with_widget<W, R>(&self, id: &str, f: impl FnOnce(&W) -> R) -> Result<R>
    where
        W: WidgetHandle + 'static,
    {
        Ok(self.registry.lookup_widget(id, f)?)
    }

    /// The description figure `id` is currently reconciled against.
    pub fn description(&self, id: &str) -> Option<FigureDescription> {
        self.bindings
            .get(id)
            .map(|binding| binding.description.with_untracked(Clone::clone))
    }

    /// The data payload last built for figure `id`.
    pub fn payload(&self, id: &str) -> Option<DataPayload> {
        self.bindings
            .get(id)
            .and_then(|binding| binding.payload.with(Clone::clone))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        if let Err(err) = self.shutdown() {
            log::warn!("{err:#}");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("runtime", &self.runtime)
            .field("registry", &self.registry)
            .finish()
    }
}
