//! Save a two-layer picture to disk and load it back
//!
//! Run with: cargo run --example save_and_load
//! Set RUST_LOG=debug to see every phase of the container codec.

use layerpack_core::{
    file::{load_file, save_file},
    HandlerRegistry, Layer, Picture, PictureCodec, RasterContent, Rect,
};
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let codec = PictureCodec::new(Arc::new(HandlerRegistry::with_defaults()));

    let mut picture = Picture::new(100, 50);
    picture.add_layer(
        Layer::new(Box::new(RasterContent::filled(Rect::new(0, 0, 100, 50), [240, 240, 230, 255])))
            .with_name("Background"),
    );
    let sketch = picture.add_layer(
        Layer::new(Box::new(RasterContent::filled(Rect::new(20, 10, 40, 20), [20, 20, 20, 255])))
            .with_name("Sketch")
            .with_opacity(0.5)
            .with_visible(false),
    );
    picture.set_active_layer(Some(sketch));
    picture.metadata.insert("title".to_string(), "Demo".to_string());

    let path = std::env::temp_dir().join("layerpack-demo.lpk");
    let written = save_file(&codec, &picture, &path)?;
    println!("Wrote {} bytes to {}", written, path.display());

    for summary in codec.summarize(&mut std::fs::File::open(&path)?)? {
        println!(
            "  layer {}: type {} at {} ({} bytes) {}",
            summary.index, summary.type_id, summary.offset, summary.len, &summary.digest[..16]
        );
    }

    let loaded = load_file(&codec, &path)?;
    for (i, layer) in loaded.layers.iter().enumerate() {
        println!(
            "  {}: {:?} opacity {} {}",
            i,
            layer.name(),
            layer.properties.opacity,
            if layer.properties.visible { "visible" } else { "hidden" }
        );
    }
    println!("Active layer: {}", loaded.active_layer_index());

    std::fs::remove_file(&path)?;
    Ok(())
}
