//! Panel Detection Benchmarks
//!
//! Full page analysis (downsample, content mask, segmentation, ordering) and
//! archive extraction on synthetic inputs.
//!
//! Run with: `cargo bench --bench panel_detection`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::time::Duration;

use amnesia_comics::archive::{ArchiveExtractor, ZipExtractor};
use amnesia_comics::panels::{sort_panels, ContentAnalyzer, PanelDetector, ReadingDirection};

/// Page with a `columns` x `rows` grid of dark panels and 40 px gutters
fn create_grid_page(width: u32, height: u32, columns: u32, rows: u32) -> RgbaImage {
    let gutter = 40;
    let cell_w = (width - gutter) / columns;
    let cell_h = (height - gutter) / rows;

    RgbaImage::from_fn(width, height, |x, y| {
        let in_x = x >= gutter && (x - gutter) % cell_w < cell_w - gutter;
        let in_y = y >= gutter && (y - gutter) % cell_h < cell_h - gutter;
        let inside = x < gutter + cell_w * columns && y < gutter + cell_h * rows;
        if in_x && in_y && inside {
            Rgba([40, 40, 40, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

fn create_png(image: RgbaImage) -> Vec<u8> {
    let mut output = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .unwrap();
    output
}

/// Create a CBZ with `page_count` PNG pages
fn create_cbz(page_count: usize) -> Vec<u8> {
    use std::io::Write;
    use zip::{write::SimpleFileOptions, ZipWriter};

    let page = create_png(create_grid_page(800, 1200, 2, 3));
    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut zip = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default();

        for i in 0..page_count {
            zip.start_file(format!("pages/{:03}.png", i), options).unwrap();
            zip.write_all(&page).unwrap();
        }
        zip.start_file("ComicInfo.xml", options).unwrap();
        zip.write_all(b"<ComicInfo/>").unwrap();

        zip.finish().unwrap();
    }
    buffer
}

fn bench_detect(c: &mut Criterion) {
    let detector = PanelDetector::default();

    let mut group = c.benchmark_group("detect");
    group.measurement_time(Duration::from_secs(10));

    for (columns, rows) in [(1, 1), (2, 3), (3, 4)] {
        let page = DynamicImage::ImageRgba8(create_grid_page(1200, 1800, columns, rows));
        group.bench_with_input(
            BenchmarkId::new("grid", format!("{}x{}", columns, rows)),
            &page,
            |b, page| b.iter(|| detector.detect(black_box(page))),
        );
    }

    group.finish();
}

fn bench_pipeline_stages(c: &mut Criterion) {
    let analyzer = ContentAnalyzer::default();
    let page = DynamicImage::ImageRgba8(create_grid_page(1200, 1800, 2, 3));
    let png = create_png(create_grid_page(1200, 1800, 2, 3));
    let detector = PanelDetector::default();
    let panels = detector.detect(&page).panels;

    let mut group = c.benchmark_group("stages");

    group.bench_function("downsample", |b| {
        b.iter(|| analyzer.downsample(black_box(&page)))
    });

    group.bench_function("decode_and_detect", |b| {
        b.iter(|| detector.detect_bytes(black_box(&png)))
    });

    group.bench_function("sort_panels_rtl", |b| {
        b.iter(|| sort_panels(black_box(&panels), ReadingDirection::Rtl))
    });

    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let cbz = create_cbz(24);

    let mut group = c.benchmark_group("extract");
    group.throughput(Throughput::Bytes(cbz.len() as u64));

    group.bench_function("cbz_24_pages", |b| {
        b.iter(|| ZipExtractor.extract(black_box(&cbz)))
    });

    group.finish();
}

criterion_group!(benches, bench_detect, bench_pipeline_stages, bench_extract);
criterion_main!(benches);
