//! Fuzzing entry points for layerpack-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_load

use layerpack_core::{HandlerRegistry, PictureCodec};
use std::io::Cursor;
use std::sync::Arc;

fn codec() -> PictureCodec {
    PictureCodec::new(Arc::new(HandlerRegistry::with_defaults()))
}

/// Load a full picture, then every layer on its own; should never panic
pub fn fuzz_load(data: &[u8]) {
    let codec = codec();
    let _ = codec.load_from_bytes(data);

    if let Ok(directory) = codec.read_directory(&mut Cursor::new(data)) {
        for index in 0..directory.layer_count() {
            let _ = codec.load_layer(&mut Cursor::new(data), index);
        }
    }
}

/// Summarize records without decoding bodies; should never panic
pub fn fuzz_inspect(data: &[u8]) {
    let _ = codec().summarize(&mut Cursor::new(data));
}

#[cfg(test)]
mod tests {
    use super::*;
    use layerpack_core::{Layer, Picture, RasterContent, Rect};

    fn valid() -> Vec<u8> {
        let picture = Picture::new(8, 8).with_layer(
            Layer::new(Box::new(RasterContent::blank(Rect::new(0, 0, 2, 2)))).with_name("Base"),
        );
        codec().save_to_bytes(&picture, None).unwrap().to_vec()
    }

    #[test]
    fn test_fuzz_load_empty() {
        fuzz_load(&[]);
    }

    #[test]
    fn test_fuzz_load_random() {
        fuzz_load(&[0x4C, 0x50, 0x01, 0x78]);
    }

    #[test]
    fn test_fuzz_load_every_truncation() {
        let data = valid();
        for len in 0..data.len() {
            fuzz_load(&data[..len]);
        }
    }

    #[test]
    fn test_fuzz_inspect_empty() {
        fuzz_inspect(&[]);
    }

    #[test]
    fn test_fuzz_inspect_random() {
        fuzz_inspect(&[0xFF; 1024]);
    }

    #[test]
    fn test_fuzz_inspect_bit_flips() {
        let data = valid();
        for i in 0..data.len() {
            let mut flipped = data.clone();
            flipped[i] ^= 0x80;
            fuzz_inspect(&flipped);
        }
    }
}
