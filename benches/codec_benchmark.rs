//! Performance benchmarks for the share-link codec and entry naming
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use qrypt::codec;
use qrypt::models::{DotType, ExportSize, HexColor, LogoMargin, StyleState};
use qrypt::services::{ImageFormat, entry_name};
use std::hint::black_box;

fn custom_style() -> StyleState {
    StyleState {
        color: HexColor::parse("#1a2b3c").unwrap(),
        bg_transparent: true,
        dot_type: DotType::ClassyRounded,
        export_size: ExportSize::new(1024).unwrap(),
        logo_margin: LogoMargin::new(12).unwrap(),
        ..Default::default()
    }
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_encode");

    for (name, style) in [("default", StyleState::default()), ("custom", custom_style())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &style, |b, style| {
            b.iter(|| black_box(codec::encode(black_box(style))));
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_decode");

    let fragments = [
        ("canonical", codec::share_fragment(&custom_style())),
        ("noisy", "#x=1&c=zzzzzz&d=bogus&c=ff0000&s=9999&lm=-3&&=&lbt=maybe".to_string()),
    ];

    for (name, fragment) in fragments.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), fragment, |b, fragment| {
            b.iter(|| black_box(codec::decode(black_box(fragment)).resolve()));
        });
    }

    group.finish();
}

fn bench_share_link(c: &mut Criterion) {
    let style = custom_style();

    c.bench_function("share_link", |b| {
        b.iter(|| black_box(codec::share_link(black_box("https://qrypt.app/#old"), &style)));
    });
}

fn bench_entry_name(c: &mut Criterion) {
    let payload = "https://example.com/some/long/path?with=query&and=more#fragment-that-gets-cut";

    c.bench_function("entry_name", |b| {
        b.iter(|| black_box(entry_name(black_box(42), black_box(payload), ImageFormat::Png)));
    });
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_share_link,
    bench_entry_name
);
criterion_main!(benches);
