use color_tagger::{ClusterConfig, ColorExtractor, PipelineConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{Rgb, RgbImage};

/// Blue disc over a white backdrop, sized like a small product photo
fn product_photo() -> RgbImage {
    RgbImage::from_fn(400, 600, |x, y| {
        let dx = x as f32 - 200.0;
        let dy = y as f32 - 300.0;
        if dx * dx + dy * dy <= 150.0 * 150.0 {
            Rgb([20, 40, 200])
        } else {
            Rgb([250, 250, 250])
        }
    })
}

fn benchmark_color_analysis(c: &mut Criterion) {
    let samples = [
        [220.0, 30.0, 30.0],
        [30.0, 40.0, 220.0],
        [40.0, 180.0, 60.0],
        [240.0, 220.0, 50.0],
    ];
    let labels = ["red", "blue", "green", "yellow"];
    let config = PipelineConfig {
        cluster: ClusterConfig {
            seed: Some(1),
            ..ClusterConfig::default()
        },
        ..PipelineConfig::default()
    };
    let extractor = ColorExtractor::new(&samples, &labels, config).expect("valid sample table");
    let image = product_photo();

    c.bench_function("extract_single_image", |b| {
        b.iter(|| extractor.extract(black_box(&image)))
    });

    let batch = vec![image.clone(); 8];
    c.bench_function("extract_batch_8", |b| {
        b.iter(|| extractor.extract_batch(black_box(&batch)))
    });
}

criterion_group!(benches, benchmark_color_analysis);
criterion_main!(benches);
