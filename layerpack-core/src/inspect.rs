//! Record-level inspection without decoding layer bodies

use crate::constants::LAYER_START_MARKER;
use crate::cursor::read_i32;
use crate::directory::Directory;
use crate::error::CodecError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Seek, SeekFrom};

/// One layer record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSummary {
    /// Position of the layer in the picture
    pub index: u32,
    /// Absolute offset of the record
    pub offset: u64,
    /// Record length in bytes
    pub len: u64,
    /// Layer type id named by the record
    pub type_id: i32,
    /// BLAKE3 of the whole record, hex encoded
    pub digest: String,
}

/// Walk every record of the container at the reader's current position.
///
/// Markers and indices are checked; bodies are hashed, not decoded, so no
/// handler registry is needed.
pub fn summarize<R: Read + Seek + ?Sized>(
    reader: &mut R,
    max_layers: u32,
) -> Result<Vec<LayerSummary>> {
    let directory = Directory::read(reader, max_layers)?;
    let mut summaries = Vec::with_capacity(directory.layer_count() as usize);

    for span in directory.spans()? {
        reader.seek(SeekFrom::Start(span.offset))?;

        let marker = read_i32(reader)?;
        if marker != LAYER_START_MARKER {
            return Err(CodecError::BadLayerMarker {
                index: span.index,
                found: marker,
            });
        }
        let stored_index = read_i32(reader)?;
        if i64::from(stored_index) != i64::from(span.index) {
            return Err(CodecError::LayerIndexMismatch {
                expected: span.index,
                found: stored_index,
            });
        }
        let type_id = read_i32(reader)?;

        reader.seek(SeekFrom::Start(span.offset))?;
        let mut hasher = blake3::Hasher::new();
        let copied = io::copy(&mut (&mut *reader).take(span.len), &mut hasher)?;
        if copied != span.len {
            return Err(CodecError::RecordLengthMismatch {
                index: span.index,
                expected: span.end(),
                actual: span.offset + copied,
            });
        }

        summaries.push(LayerSummary {
            index: span.index,
            offset: span.offset,
            len: span.len,
            type_id,
            digest: hasher.finalize().to_hex().to_string(),
        });
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PictureCodec;
    use crate::raster::{RasterContent, RASTER_LAYER_TYPE};
    use crate::registry::HandlerRegistry;
    use crate::types::{Layer, Picture, Rect};
    use std::io::Cursor;
    use std::sync::Arc;

    fn saved() -> Vec<u8> {
        let picture = Picture::new(16, 16)
            .with_layer(Layer::new(Box::new(RasterContent::blank(Rect::new(0, 0, 2, 2)))))
            .with_layer(
                Layer::new(Box::new(RasterContent::filled(Rect::new(1, 1, 3, 1), [7; 4])))
                    .with_name("Ink"),
            );
        PictureCodec::new(Arc::new(HandlerRegistry::with_defaults()))
            .save_to_bytes(&picture, None)
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_summaries_cover_records() {
        let bytes = saved();
        let summaries = summarize(&mut Cursor::new(&bytes), 64).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].index, 0);
        assert_eq!(summaries[1].index, 1);
        assert!(summaries.iter().all(|s| s.type_id == RASTER_LAYER_TYPE));
        assert_eq!(summaries[0].offset + summaries[0].len, summaries[1].offset);
        assert_eq!(summaries[1].offset + summaries[1].len, bytes.len() as u64 - 4);

        let first = &bytes[summaries[0].offset as usize..summaries[1].offset as usize];
        assert_eq!(summaries[0].digest, blake3::hash(first).to_hex().to_string());
        assert_ne!(summaries[0].digest, summaries[1].digest);
    }

    #[test]
    fn test_bad_marker_reported() {
        let mut bytes = saved();
        let offset = summarize(&mut Cursor::new(&bytes), 64).unwrap()[1].offset as usize;
        bytes[offset] ^= 0xFF;
        assert!(matches!(
            summarize(&mut Cursor::new(&bytes), 64),
            Err(CodecError::BadLayerMarker { index: 1, .. })
        ));
    }
}
