use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skyview_bridge::{reconcile_renderers, reconcile_theme};
use skyview_figure::{DataSourceRef, FigureDescription, Glyph, RendererSpec, Theme};
use skyview_widget::HeadlessWidget;

const RENDERER_COUNTS: &[usize] = &[1, 4, 16, 64, 256];

fn description(count: usize, prefix: &str) -> FigureDescription {
    (0..count).fold(FigureDescription::new(), |description, index| {
        description.with_renderer(RendererSpec::new(
            format!("{prefix}{index}"),
            Glyph::Scatter,
            DataSourceRef::new("catalog", ["ra", "dec"]),
        ))
    })
}

fn bench_renderer_swap(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_renderers");
    for &count in RENDERER_COUNTS {
        let old = description(count, "old");
        let new = description(count, "new");
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            let mut widget = HeadlessWidget::from_description(&old, Theme::light_minimal());
            let mut flip = false;
            b.iter(|| {
                let target = if flip { &old } else { &new };
                flip = !flip;
                reconcile_renderers(&mut widget, black_box(target)).expect("reconcile");
                widget.take_events();
            });
        });
    }
    group.finish();
}

fn bench_theme_toggle(c: &mut Criterion) {
    let light = Theme::light_minimal();
    let dark = Theme::dark_minimal();
    let mut widget = HeadlessWidget::new(light.clone());
    let mut is_dark = false;
    c.bench_function("reconcile_theme", |b| {
        b.iter(|| {
            is_dark = !is_dark;
            reconcile_theme(&mut widget, black_box(is_dark), &light, &dark).expect("theme");
            widget.take_events();
        });
    });
}

criterion_group!(benches, bench_renderer_swap, bench_theme_toggle);
criterion_main!(benches);
