//! The widget mutations the bridge performs.

use skyview_figure::{FigureDescription, Theme};
use skyview_widget::{WidgetError, WidgetHandle};

/// Make the widget's renderer list equal the description's renderers.
///
/// Records the current count `n`, appends every renderer from the
/// description, then drops the first `n`. The widget model rejects direct
/// replacement of the list or of the model, so this is the only path used.
///
/// There is no rollback: if the append fails midway the widget keeps a mix of
/// old and new renderers and the error is returned as-is.
pub fn reconcile_renderers<W: WidgetHandle>(
    widget: &mut W,
    description: &FigureDescription,
) -> Result<(), WidgetError> {
    let stale = widget.renderer_count();
    let fresh = description
        .renderers
        .iter()
        .map(|spec| widget.materialize(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let appended = fresh.len();
    widget.append_renderers(fresh)?;
    widget.drop_leading(stale)?;
    log::debug!("reconciled renderers: dropped {stale}, kept {appended}");
    Ok(())
}

/// Overwrite the widget axes with the description's.
pub fn reconcile_axes<W: WidgetHandle>(
    widget: &mut W,
    description: &FigureDescription,
) -> Result<(), WidgetError> {
    widget.set_axes(description.axes.clone())?;
    log::debug!("reconciled {} axis/axes", description.axes.len());
    Ok(())
}

/// Overwrite the widget theme with the one selected by `dark`.
pub fn reconcile_theme<W: WidgetHandle>(
    widget: &mut W,
    dark: bool,
    light_theme: &Theme,
    dark_theme: &Theme,
) -> Result<(), WidgetError> {
    let theme = if dark { dark_theme } else { light_theme };
    widget.set_theme(theme.clone())?;
    log::debug!("reconciled theme to {theme}");
    Ok(())
}

/// Destroy every renderer, then the model, then close the widget.
///
/// Best effort: a failing step is logged and the remaining steps still run in
/// order. The first failure is returned.
pub fn teardown<W: WidgetHandle>(widget: &mut W) -> Result<(), WidgetError> {
    let mut first_error = None;
    let mut note = |step: &str, result: Result<(), WidgetError>| {
        if let Err(err) = result {
            log::warn!("teardown step `{step}` failed: {err}");
            first_error.get_or_insert(err);
        }
    };

    let renderers = widget.renderers().to_vec();
    for renderer in &renderers {
        note("destroy_renderer", widget.destroy_renderer(renderer));
    }
    note("destroy_model", widget.destroy_model());
    note("close", widget.close());

    match first_error {
        Some(err) => Err(err),
        None => {
            log::debug!("tore down widget with {} renderer(s)", renderers.len());
            Ok(())
        }
    }
}
