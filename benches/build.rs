use criterion::{Criterion, black_box, criterion_group, criterion_main};

use occsvo::math::morton;
use occsvo::svo::{SvoBuilder, SvoReader};

fn sphere_raw(edge: u32) -> Vec<u64> {
    let center = (edge as f32 - 1.0) / 2.0;
    let radius = edge as f32 / 2.0 - 0.5;
    let mut raw = Vec::new();
    for z in 0..edge {
        for y in 0..edge {
            for x in 0..edge {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                let dz = z as f32 - center;
                if dx * dx + dy * dy + dz * dz <= radius * radius {
                    raw.push(morton::encode(x, y, z) | morton::FILL_BIT);
                }
            }
        }
    }
    raw.sort_unstable();
    raw
}

fn bench_svo_build_16(c: &mut Criterion) {
    let raw = sphere_raw(16);
    let dir = tempfile::tempdir().expect("tempdir");

    c.bench_function("svo_build_16", |b| {
        b.iter(|| {
            SvoBuilder::construct(
                dir.path(),
                "bench16",
                16u64.pow(3),
                morton::ignore_ordinal(16),
                black_box(raw.iter().copied()),
            )
            .expect("construct")
        });
    });
}

fn bench_svo_build_32(c: &mut Criterion) {
    let raw = sphere_raw(32);
    let dir = tempfile::tempdir().expect("tempdir");

    c.bench_function("svo_build_32", |b| {
        b.iter(|| {
            SvoBuilder::construct(
                dir.path(),
                "bench32",
                32u64.pow(3),
                morton::ignore_ordinal(32),
                black_box(raw.iter().copied()),
            )
            .expect("construct")
        });
    });
}

fn bench_collect_and_faces_32(c: &mut Criterion) {
    let raw = sphere_raw(32);
    let dir = tempfile::tempdir().expect("tempdir");
    SvoBuilder::construct(
        dir.path(),
        "bench32",
        32u64.pow(3),
        morton::ignore_ordinal(32),
        raw.iter().copied(),
    )
    .expect("construct");

    c.bench_function("svo_collect_and_faces_32", |b| {
        b.iter(|| {
            let mut reader = SvoReader::open(dir.path(), "bench32").expect("open");
            let tree = reader.collect_tree().expect("collect");
            black_box(tree.surface_voxels())
        });
    });
}

criterion_group!(
    benches,
    bench_svo_build_16,
    bench_svo_build_32,
    bench_collect_and_faces_32
);
criterion_main!(benches);
