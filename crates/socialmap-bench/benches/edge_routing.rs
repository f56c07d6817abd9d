use criterion::{Criterion, black_box, criterion_group, criterion_main};
use socialmap_bench::generate_synthetic_cast;
use socialmap_graph::{Viewer, ViewerConfig};

fn bench_route_visible_edges(c: &mut Criterion) {
    let (entities, relationships) = generate_synthetic_cast(500, 4);
    let mut viewer = Viewer::create(entities, &relationships, ViewerConfig::default()).unwrap();
    for _ in 0..30 {
        viewer.tick();
    }

    c.bench_function("route_500_entities_4_links", |b| {
        b.iter(|| {
            let paths = viewer.paths();
            black_box(paths);
        })
    });

    c.bench_function("frame_500_entities_4_links", |b| {
        b.iter(|| black_box(viewer.frame()))
    });
}

criterion_group!(benches, bench_route_visible_edges);
criterion_main!(benches);
