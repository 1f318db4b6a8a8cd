//! Generic property block codec (name, opacity, visibility)

use crate::constants::{PROPS_FIXED_OVERHEAD, PROPS_MARKER, PROPS_MIN_BLOCK_LEN};
use crate::cursor::read_i32;
use crate::error::CodecError;
use crate::types::LayerProperties;
use crate::Result;
use bytes::{Buf, BufMut, BytesMut};
use std::io::{Read, Write};

/// Encode a property block and return the number of bytes written.
///
/// Layout:
/// 1. Block length (4 bytes, excludes itself)
/// 2. Marker (4 bytes): "PROP"
/// 3. Opacity (4 bytes, IEEE 754 single)
/// 4. Visibility (1 byte, nonzero = visible)
/// 5. Name length (4 bytes)
/// 6. Name (UTF-8)
pub fn encode_properties<W: Write + ?Sized>(
    writer: &mut W,
    properties: &LayerProperties,
) -> Result<u64> {
    let name = properties.name.as_bytes();
    let block_len = PROPS_FIXED_OVERHEAD + name.len();
    let lengths = (i32::try_from(block_len), i32::try_from(name.len()));
    let (block_len_i32, name_len_i32) = match lengths {
        (Ok(block), Ok(name)) => (block, name),
        _ => {
            return Err(CodecError::InvalidInput(format!(
                "Layer name of {} bytes is too long",
                name.len()
            )))
        }
    };

    let mut buf = BytesMut::with_capacity(4 + block_len);
    buf.put_i32(block_len_i32);
    buf.put_i32(PROPS_MARKER);
    buf.put_f32(properties.opacity);
    buf.put_u8(properties.visible as u8);
    buf.put_i32(name_len_i32);
    buf.put_slice(name);
    writer.write_all(&buf)?;

    Ok(buf.len() as u64)
}

/// Decode a property block into `properties` and return the number of bytes consumed.
///
/// An empty recorded name leaves `properties.name` untouched.
pub fn decode_properties<R: Read + ?Sized>(
    reader: &mut R,
    properties: &mut LayerProperties,
    max_block_len: u32,
) -> Result<u64> {
    let block_len = read_i32(reader)?;
    if block_len <= PROPS_MIN_BLOCK_LEN || block_len as u32 > max_block_len {
        return Err(CodecError::ImplausiblePropertyBlock(block_len));
    }

    let mut buf = BytesMut::zeroed(block_len as usize);
    reader.read_exact(&mut buf)?;

    let marker = buf.get_i32();
    if marker != PROPS_MARKER {
        return Err(CodecError::BadPropertyMarker(marker));
    }
    if (block_len as usize) < PROPS_FIXED_OVERHEAD {
        return Err(CodecError::ImplausiblePropertyBlock(block_len));
    }

    let opacity = buf.get_f32();
    let visible = buf.get_u8() != 0;
    let name_len = buf.get_i32();

    let expected = block_len as i64 - PROPS_FIXED_OVERHEAD as i64;
    if name_len as i64 != expected {
        return Err(CodecError::NameLengthMismatch {
            expected,
            actual: name_len,
        });
    }

    properties.opacity = opacity;
    properties.visible = visible;
    if name_len > 0 {
        properties.name = String::from_utf8(buf.to_vec()).map_err(|_| CodecError::InvalidName)?;
    }

    Ok(4 + block_len as u64)
}
