//! Registry of mountable UI elements.
//!
//! Elements are dispatched through the [`Renderable`] trait instead of
//! branching on what kind of element an id refers to. A new element kind only
//! needs an implementation of the trait.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use skyview_core::{mutableStateOf, MutableState, RuntimeHandle};
use skyview_figure::{FigureDescription, Theme, ThemePair};
use skyview_widget::WidgetHandle;

use crate::view::{FigurePhase, FigureView};
use crate::BridgeError;

/// Something the registry can mount, update and unmount by id.
pub trait Renderable: Any {
    /// Short name used in logs and kind-mismatch errors.
    fn kind(&self) -> &'static str;

    fn is_mounted(&self) -> bool;

    fn mount(&mut self, id: &str, runtime: &RuntimeHandle) -> Result<(), BridgeError>;

    /// Push fresh inputs into a mounted element.
    fn update(&mut self, id: &str) -> Result<(), BridgeError>;

    fn unmount(&mut self, id: &str) -> Result<(), BridgeError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

type WidgetFactory<W> = Rc<dyn Fn(&FigureDescription, &Theme) -> W>;

/// A figure element backed by a [`FigureView`].
///
/// The description and the dark flag are state cells owned by the element, so
/// [`FigureRenderable::set_description`] and [`FigureRenderable::set_dark`]
/// schedule reconciliation through the runtime like any other state write.
pub struct FigureRenderable<W: WidgetHandle + 'static> {
    initial: FigureDescription,
    initial_dark: bool,
    themes: ThemePair,
    factory: WidgetFactory<W>,
    description: Option<MutableState<FigureDescription>>,
    dark: Option<MutableState<bool>>,
    view: Option<FigureView<W>>,
}

impl<W: WidgetHandle + 'static> FigureRenderable<W> {
    pub fn new(
        description: FigureDescription,
        dark: bool,
        themes: ThemePair,
        factory: impl Fn(&FigureDescription, &Theme) -> W + 'static,
    ) -> Self {
        Self {
            initial: description,
            initial_dark: dark,
            themes,
            factory: Rc::new(factory),
            description: None,
            dark: None,
            view: None,
        }
    }

    pub fn view(&self) -> Option<&FigureView<W>> {
        self.view.as_ref()
    }

    pub fn phase(&self) -> FigurePhase {
        self.view
            .as_ref()
            .map(FigureView::phase)
            .unwrap_or(FigurePhase::Unmounted)
    }

    /// The description cell while mounted. Writes schedule a renderer pass.
    pub fn description_state(&self) -> Option<MutableState<FigureDescription>> {
        self.description.clone()
    }

    /// The dark-mode cell while mounted. Writes schedule a theme pass.
    pub fn dark_state(&self) -> Option<MutableState<bool>> {
        self.dark.clone()
    }

    pub fn set_description(&mut self, description: FigureDescription) {
        match &self.description {
            Some(cell) => {
                cell.set_if_changed(description);
            }
            None => self.initial = description,
        }
    }

    pub fn set_dark(&mut self, dark: bool) {
        match &self.dark {
            Some(cell) => {
                cell.set_if_changed(dark);
            }
            None => self.initial_dark = dark,
        }
    }
}

impl<W: WidgetHandle + 'static> Renderable for FigureRenderable<W> {
    fn kind(&self) -> &'static str {
        "figure"
    }

    fn is_mounted(&self) -> bool {
        !matches!(self.phase(), FigurePhase::Unmounted | FigurePhase::TornDown)
    }

    fn mount(&mut self, id: &str, runtime: &RuntimeHandle) -> Result<(), BridgeError> {
        if self.is_mounted() {
            return Err(BridgeError::AlreadyMounted { id: id.to_string() });
        }
        let description = mutableStateOf(runtime, self.initial.clone());
        let dark = mutableStateOf(runtime, self.initial_dark);
        let view = FigureView::mount(
            runtime,
            id,
            description.as_state(),
            dark.as_state(),
            self.themes.clone(),
        );

        // The widget is built asynchronously, after the current flush starts.
        let loader = view.clone();
        let factory = Rc::clone(&self.factory);
        let theme = self.themes.select(self.initial_dark).clone();
        runtime.spawn_task(move || {
            let attached = loader.attach_with(|initial| factory(initial, &theme));
            if let Err(err) = attached {
                log::warn!("figure `{}` loader failed: {err}", loader.id());
            }
        });

        self.description = Some(description);
        self.dark = Some(dark);
        self.view = Some(view);
        Ok(())
    }

    fn update(&mut self, id: &str) -> Result<(), BridgeError> {
        match &self.view {
            Some(view) if view.phase() != FigurePhase::TornDown => view.refresh(),
            _ => Err(BridgeError::NotMounted { id: id.to_string() }),
        }
    }

    fn unmount(&mut self, id: &str) -> Result<(), BridgeError> {
        let Some(view) = self.view.take() else {
            return Err(BridgeError::NotMounted { id: id.to_string() });
        };
        if let Some(cell) = self.description.take() {
            self.initial = cell.with_untracked(Clone::clone);
        }
        if let Some(cell) = self.dark.take() {
            self.initial_dark = cell.with_untracked(|dark| *dark);
        }
        view.unmount()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<W: WidgetHandle + 'static> fmt::Debug for FigureRenderable<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FigureRenderable")
            .field("themes", &self.themes)
            .field("view", &self.view)
            .finish()
    }
}

/// Id-keyed collection of [`Renderable`] elements, in registration order.
#[derive(Default)]
pub struct RenderableRegistry {
    elements: IndexMap<String, Box<dyn Renderable>>,
}

impl RenderableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        element: impl Renderable,
    ) -> Result<(), BridgeError> {
        let id = id.into();
        if self.elements.contains_key(&id) {
            return Err(BridgeError::DuplicateElement { id });
        }
        log::debug!("registered {} element `{id}`", element.kind());
        self.elements.insert(id, Box::new(element));
        Ok(())
    }

    pub fn mount(&mut self, id: &str, runtime: &RuntimeHandle) -> Result<(), BridgeError> {
        self.element_mut(id)?.mount(id, runtime)
    }

    pub fn update(&mut self, id: &str) -> Result<(), BridgeError> {
        self.element_mut(id)?.update(id)
    }

    /// Unmount and forget the element.
    pub fn unmount(&mut self, id: &str) -> Result<(), BridgeError> {
        let mut element = self
            .elements
            .shift_remove(id)
            .ok_or_else(|| BridgeError::UnknownElement { id: id.to_string() })?;
        if element.is_mounted() {
            element.unmount(id)
        } else {
            Ok(())
        }
    }

    /// Unmount everything, newest first. Every element is visited even if an
    /// earlier one fails; the first failure is returned.
    pub fn unmount_all(&mut self) -> Result<(), BridgeError> {
        let mut first_error = None;
        while let Some((id, mut element)) = self.elements.pop() {
            if !element.is_mounted() {
                continue;
            }
            if let Err(err) = element.unmount(&id) {
                log::warn!("unmounting `{id}` failed: {err}");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn kind(&self, id: &str) -> Option<&'static str> {
        self.elements.get(id).map(|element| element.kind())
    }

    pub fn get<T: Renderable>(&self, id: &str) -> Result<&T, BridgeError> {
        let element = self
            .elements
            .get(id)
            .ok_or_else(|| BridgeError::UnknownElement { id: id.to_string() })?;
        let kind = element.kind();
        element
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| BridgeError::KindMismatch {
                id: id.to_string(),
                found: kind,
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn get_mut<T: Renderable>(&mut self, id: &str) -> Result<&mut T, BridgeError> {
        let element = self.element_mut(id)?;
        let kind = element.kind();
        element
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| BridgeError::KindMismatch {
                id: id.to_string(),
                found: kind,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Read the widget behind a mounted figure element.
    pub fn lookup_widget<W, R>(&self, id: &str, f: impl FnOnce(&W) -> R) -> Result<R, BridgeError>
    where
        W: WidgetHandle + 'static,
    {
        let figure = self.get::<FigureRenderable<W>>(id)?;
        figure
            .view()
            .and_then(|view| view.with_widget(f))
            .ok_or(BridgeError::NotReady)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut Box<dyn Renderable>, BridgeError> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| BridgeError::UnknownElement { id: id.to_string() })
    }
}

impl fmt::Debug for RenderableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.elements.iter().map(|(id, e)| (id, e.kind())))
            .finish()
    }
}
