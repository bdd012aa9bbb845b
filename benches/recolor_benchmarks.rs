//! Benchmarks for the accessibility color transforms and a full page paint.
//!
//! Buffers are full-HD sized, the size of one screen-filling page tile.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use page_oxide::rendering::recolor::{
    black_white, hue_shift_positive, invert, invert_lightness, invert_luma, paper_color,
    LumaCoefficients, PixelBuffer,
};
use page_oxide::{
    InMemoryPixmapStore, Page, PageCompositor, PaintFlags, PaintRequest, Rect, RenderConfig,
    RenderMode, Rgba8, Surface,
};

const WIDTH: usize = 1920;
const HEIGHT: usize = 1080;

/// Opaque gradient covering every hue sector.
fn gradient() -> Vec<u8> {
    let mut data = Vec::with_capacity(WIDTH * HEIGHT * 4);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255]);
        }
    }
    data
}

// ============================================================================
// Per-pixel transforms
// ============================================================================

fn bench_transforms(c: &mut Criterion) {
    let source = gradient();
    let mut group = c.benchmark_group("recolor_full_hd");
    group.throughput(Throughput::Elements((WIDTH * HEIGHT) as u64));

    let cases: [(&str, fn(&mut PixelBuffer<'_>)); 6] = [
        ("invert", invert),
        ("paper_color", |b| paper_color(b, Rgba8::rgb(20, 20, 40), Rgba8::rgb(250, 240, 200))),
        ("black_white", |b| black_white(b, 4, 127)),
        ("invert_lightness", invert_lightness),
        ("invert_luma", |b| invert_luma(b, LumaCoefficients::REC709)),
        ("hue_shift", hue_shift_positive),
    ];

    for (name, transform) in cases {
        group.bench_function(name, |bencher| {
            let mut data = source.clone();
            bencher.iter(|| {
                transform(&mut PixelBuffer::premultiplied(black_box(&mut data)));
            })
        });
    }

    group.finish();
}

// ============================================================================
// Page paint
// ============================================================================

fn bench_paint(c: &mut Criterion) {
    let mut bitmap = tiny_skia::Pixmap::new(WIDTH as u32, HEIGHT as u32).unwrap();
    bitmap.fill(tiny_skia::Color::WHITE);
    let mut store = InMemoryPixmapStore::new();
    store.insert_bitmap(0, bitmap);

    let page = Page::new(0, WIDTH as f64, HEIGHT as f64);
    let request = PaintRequest::new(
        Rect::new(0.0, 0.0, WIDTH as f64, HEIGHT as f64),
        1.0,
        PaintFlags::all(),
    );

    let mut group = c.benchmark_group("paint_full_hd");
    for (name, mode) in [
        ("normal", RenderMode::Normal),
        ("inverted", RenderMode::Inverted),
        ("invert_luma", RenderMode::InvertLuma),
    ] {
        let config = RenderConfig::new()
            .with_accessibility(true)
            .with_render_mode(mode);
        let compositor = PageCompositor::new(config);
        let mut surface = Surface::new(WIDTH as u32, HEIGHT as u32, 1.0).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| black_box(compositor.paint(&mut surface, &page, &store, &request)))
        });
    }
    group.finish();
}

criterion_group!(transform_benches, bench_transforms);
criterion_group!(paint_benches, bench_paint);

criterion_main!(transform_benches, paint_benches);
