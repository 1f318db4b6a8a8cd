use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use layerpack_core::{HandlerRegistry, Layer, Picture, PictureCodec, RasterContent, Rect};
use std::io::Cursor;
use std::sync::Arc;

fn codec() -> PictureCodec {
    PictureCodec::new(Arc::new(HandlerRegistry::with_defaults()))
}

/// `layers` rasters of `side`x`side` pixels each
fn picture(layers: usize, side: u32) -> Picture {
    let mut picture = Picture::new(side, side);
    for i in 0..layers {
        picture.add_layer(
            Layer::new(Box::new(RasterContent::filled(
                Rect::new(0, 0, side, side),
                [i as u8, 0x42, 0x42, 0xFF],
            )))
            .with_name(format!("Layer {}", i)),
        );
    }
    picture.set_active_layer(Some(0));
    picture
}

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    let codec = codec();

    for side in [16u32, 64, 256] {
        let picture = picture(8, side);
        let size = codec.save_to_bytes(&picture, None).unwrap().len();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &picture, |b, picture| {
            let mut out = Cursor::new(Vec::with_capacity(size));
            b.iter(|| {
                out.set_position(0);
                codec.save(black_box(picture), &mut out, None).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");
    let codec = codec();

    for side in [16u32, 64, 256] {
        let encoded = codec.save_to_bytes(&picture(8, side), None).unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &encoded, |b, data| {
            b.iter(|| codec.load_from_bytes(black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_load_single_layer(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_layer");
    let codec = codec();

    for layers in [8usize, 64, 512] {
        let encoded = codec.save_to_bytes(&picture(layers, 16), None).unwrap();
        let last = layers as u32 - 1;

        group.bench_with_input(BenchmarkId::from_parameter(layers), &encoded, |b, data| {
            b.iter(|| {
                codec
                    .load_layer(&mut Cursor::new(black_box(&data[..])), last)
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    let codec = codec();

    for side in [16u32, 256] {
        let encoded = codec.save_to_bytes(&picture(8, side), None).unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(side), &encoded, |b, data| {
            b.iter(|| {
                let summaries = codec.summarize(&mut Cursor::new(black_box(&data[..]))).unwrap();
                black_box(summaries);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_save,
    bench_load,
    bench_load_single_layer,
    bench_summarize
);
criterion_main!(benches);
