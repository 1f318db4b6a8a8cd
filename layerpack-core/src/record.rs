//! Layer record codec
//!
//! A record is `[marker][index][type id][handler body][property block]`.

use crate::constants::{LAYER_START_MARKER, RECORD_PREFIX_SIZE};
use crate::cursor::{read_i32, WriteCursor, WriteSeek};
use crate::directory::LayerSpan;
use crate::error::CodecError;
use crate::properties::{decode_properties, encode_properties};
use crate::registry::{HandlerRegistry, LayerCodec};
use crate::types::Layer;
use crate::Result;
use bytes::{BufMut, BytesMut};
use std::io::{Read, Seek, SeekFrom};

#[cfg(feature = "logging")]
use tracing::trace;

/// Encode one layer record at the writer's current position.
///
/// The handler body is checked against `cursor`: the handler must leave the
/// stream strictly after where its body began.
pub fn encode_record(
    writer: &mut dyn WriteSeek,
    index: u32,
    layer: &Layer,
    codec: &dyn LayerCodec,
    cursor: &mut WriteCursor,
) -> Result<()> {
    let index_i32 = i32::try_from(index).map_err(|_| {
        CodecError::InvalidInput(format!("Layer index {} does not fit in int32", index))
    })?;

    let mut prefix = BytesMut::with_capacity(RECORD_PREFIX_SIZE as usize);
    prefix.put_i32(LAYER_START_MARKER);
    prefix.put_i32(index_i32);
    prefix.put_i32(codec.layer_type());
    writer.write_all(&prefix)?;

    let start = cursor.begin_body(writer.stream_position()?);
    codec.encode(layer.content.as_ref(), writer)?;
    let end = writer.stream_position()?;
    cursor.finish_body(index, start, end)?;

    #[cfg(feature = "logging")]
    trace!(
        "Layer {} body: {} bytes (type {})",
        index,
        end - start.position(),
        codec.layer_type()
    );

    encode_properties(writer, &layer.properties)?;
    cursor.commit(writer.stream_position()?);

    Ok(())
}

/// Decode the record described by `span`.
///
/// The handler body is read through a reader bounded to the record, and the
/// record must end exactly where the directory says it does.
pub fn decode_record<R: Read + Seek>(
    reader: &mut R,
    span: LayerSpan,
    registry: &HandlerRegistry,
    max_property_block: u32,
) -> Result<Layer> {
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
    let codec = registry.find_layer_decoder(type_id)?;

    let remaining = span.len - RECORD_PREFIX_SIZE;
    let content = {
        let mut body = (&mut *reader).take(remaining);
        codec.decode(&mut body, remaining)?
    };

    let mut layer = Layer::new(content);
    decode_properties(reader, &mut layer.properties, max_property_block)?;

    let end = reader.stream_position()?;
    if end != span.end() {
        return Err(CodecError::RecordLengthMismatch {
            index: span.index,
            expected: span.end(),
            actual: end,
        });
    }

    #[cfg(feature = "logging")]
    trace!(
        "Layer {} decoded: type {}, {} bytes, name {:?}",
        span.index,
        type_id,
        span.len,
        layer.properties.name
    );

    Ok(layer)
}
