use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use socialmap_bench::generate_synthetic_cast;
use socialmap_graph::{FilterState, Viewer, ViewerConfig};
use socialmap_core::Role;

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_tick");
    for entity_count in [50usize, 200, 500] {
        let (entities, relationships) = generate_synthetic_cast(entity_count, 3);
        let mut viewer = Viewer::create(entities, &relationships, ViewerConfig::default()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(entity_count), &entity_count, |b, _| {
            b.iter(|| {
                // Keep alpha up so every iteration runs the full force pass.
                viewer.project(FilterState::all());
                viewer.tick();
                black_box(viewer.engine().alpha());
            })
        });
    }
    group.finish();
}

fn bench_filter_toggle(c: &mut Criterion) {
    let (entities, relationships) = generate_synthetic_cast(300, 3);
    let mut viewer = Viewer::create(entities, &relationships, ViewerConfig::default()).unwrap();

    c.bench_function("filter_toggle_300_entities", |b| {
        b.iter(|| {
            let hidden = viewer.project(FilterState::all().without_role(Role::Student));
            let shown = viewer.project(FilterState::all());
            black_box((hidden, shown));
        })
    });
}

criterion_group!(benches, bench_tick, bench_filter_toggle);
criterion_main!(benches);
