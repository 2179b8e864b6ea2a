//! Headless catalog dashboard: builds a figure from a synthetic catalog,
//! drives a few control changes through the session and reports what the
//! widget ended up showing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use skyview_app::catalog::synthetic_catalog;
use skyview_app::{init_logging, AppConfig, Session};
use skyview_figure::PlotKind;
use skyview_widget::{HeadlessWidget, WidgetHandle};

const FIGURE_ID: &str = "sky";

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Plot {
    Scatter,
    Heatmap,
    Histogram,
}

impl From<Plot> for PlotKind {
    fn from(plot: Plot) -> Self {
        match plot {
            Plot::Scatter => PlotKind::Scatter,
            Plot::Heatmap => PlotKind::Heatmap,
            Plot::Histogram => PlotKind::Histogram,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "catalog-demo", version, about = "Headless skyview dashboard demo")]
struct Cli {
    /// JSON config file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rows in the synthetic catalog.
    #[arg(long, default_value_t = 10_000)]
    rows: usize,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Plot to switch to after the first render.
    #[arg(long, value_enum)]
    plot: Option<Plot>,

    /// Keep only objects below this redshift.
    #[arg(long)]
    max_redshift: Option<f64>,

    /// Toggle dark mode after the first render.
    #[arg(long)]
    dark: bool,

    /// Print the final figure description as JSON.
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    init_logging(&config.log_filter);

    let catalog = synthetic_catalog(cli.rows, cli.seed).context("failed to build catalog")?;
    let mut session = Session::new(config, catalog);
    session.mount_figure(FIGURE_ID, |description, theme| {
        HeadlessWidget::from_description(description, theme.clone())
    })?;
    session.pump();
    report(&session, "initial")?;

    let context = session.context();
    if let Some(plot) = cli.plot {
        context.plot.kind.set_value(plot.into());
    }
    if let Some(limit) = cli.max_redshift {
        let kept = context.data.select_where("redshift", |z| z < limit)?;
        log::info!("kept {kept} of {} rows below z={limit}", cli.rows);
    }
    if cli.dark {
        context.plot.toggle_dark();
    }
    let processed = session.pump();
    log::debug!("applied control changes in {processed} step(s)");
    report(&session, "final")?;

    if cli.dump {
        let view = session.view::<HeadlessWidget>(FIGURE_ID)?;
        let specs = view
            .with_widget(|w| w.specs().into_iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&specs)?);
    }

    let alert = &session.context().alert;
    if alert.is_open() {
        eprintln!("alert: {}", alert.message.value());
    }
    session.shutdown()?;
    Ok(())
}

fn report(session: &Session, stage: &str) -> Result<()> {
    let (names, theme) = session.with_widget(FIGURE_ID, |w: &HeadlessWidget| {
        (
            w.renderer_names().join(", "),
            w.theme().name().to_string(),
        )
    })?;
    let view = session.view::<HeadlessWidget>(FIGURE_ID)?;
    println!(
        "{stage}: renderers [{names}] theme {theme} \
         ({} renderer, {} axis, {} theme pass(es))",
        view.renderer_passes(),
        view.axis_passes(),
        view.theme_passes()
    );
    Ok(())
}
