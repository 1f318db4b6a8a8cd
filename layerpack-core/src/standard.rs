//! Built-in container format carrying picture metadata as its custom payload

use crate::cursor::WriteSeek;
use crate::error::CodecError;
use crate::registry::{ContainerCodec, CustomData, PictureParts};
use crate::types::{Picture, Rect};
use crate::Result;
use bytes::{Buf, BufMut, BytesMut};
use std::collections::BTreeMap;
use std::io::Read;

#[cfg(feature = "logging")]
use tracing::warn;

/// Container type id of [`StandardContainer`]
pub const STANDARD_CONTAINER_TYPE: i32 = 1;

/// File extension of [`StandardContainer`]
pub const STANDARD_EXTENSION: &str = "lpk";

/// The default container format
///
/// Custom payload:
/// 1. Payload length (4 bytes, excludes itself)
/// 2. Entry count (4 bytes)
/// 3. Per entry: key length (4 bytes), key, value length (4 bytes), value
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardContainer;

impl ContainerCodec for StandardContainer {
    fn container_type(&self) -> i32 {
        STANDARD_CONTAINER_TYPE
    }

    fn extensions(&self) -> &[&str] {
        &[STANDARD_EXTENSION]
    }

    fn write_custom(&self, picture: &Picture, writer: &mut dyn WriteSeek) -> Result<()> {
        let payload = encode_metadata(&picture.metadata)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| CodecError::InvalidInput("Picture metadata is too large".to_string()))?;
        writer.write_all(&len.to_be_bytes())?;
        writer.write_all(&payload)?;
        Ok(())
    }

    fn read_custom(&self, reader: &mut dyn Read) -> Result<CustomData> {
        let mut len = [0u8; 4];
        reader.read_exact(&mut len)?;
        let len = u32::from_be_bytes(len) as usize;

        let mut payload = Vec::new();
        reader.take(len as u64).read_to_end(&mut payload)?;
        if payload.len() != len {
            return Err(CodecError::InvalidBody(format!(
                "Metadata payload declares {} bytes, found {}",
                len,
                payload.len()
            )));
        }

        Ok(Box::new(decode_metadata(&payload)?))
    }

    fn build_picture(&self, parts: PictureParts) -> Result<Picture> {
        let metadata = parts
            .custom
            .downcast::<BTreeMap<String, String>>()
            .map(|metadata| *metadata)
            .map_err(|_| CodecError::InvalidInput("Foreign custom payload".to_string()))?;

        let canvas = Rect::from_size(parts.size);
        if !canvas.contains(&parts.content_bounds) {
            #[cfg(feature = "logging")]
            warn!(
                "Layer content {:?} extends beyond the {}x{} canvas",
                parts.content_bounds, parts.size.width, parts.size.height
            );
        }

        let mut picture = Picture::new(parts.size.width, parts.size.height);
        picture.layers = parts.layers;
        picture.metadata = metadata;
        Ok(picture)
    }
}

fn encode_metadata(metadata: &BTreeMap<String, String>) -> Result<BytesMut> {
    let mut buf = BytesMut::new();
    buf.put_u32(to_u32(metadata.len())?);
    for (key, value) in metadata {
        for text in [key, value] {
            buf.put_u32(to_u32(text.len())?);
            buf.put_slice(text.as_bytes());
        }
    }
    Ok(buf)
}

fn decode_metadata(mut payload: &[u8]) -> Result<BTreeMap<String, String>> {
    let mut metadata = BTreeMap::new();
    let count = take_u32(&mut payload)?;
    for _ in 0..count {
        let key = take_string(&mut payload)?;
        let value = take_string(&mut payload)?;
        metadata.insert(key, value);
    }
    if payload.has_remaining() {
        return Err(CodecError::InvalidBody(format!(
            "{} trailing bytes after metadata",
            payload.remaining()
        )));
    }
    Ok(metadata)
}

fn take_u32(payload: &mut &[u8]) -> Result<u32> {
    if payload.remaining() < 4 {
        return Err(CodecError::InvalidBody("Truncated metadata".to_string()));
    }
    Ok(payload.get_u32())
}

fn take_string(payload: &mut &[u8]) -> Result<String> {
    let len = take_u32(payload)? as usize;
    if payload.remaining() < len {
        return Err(CodecError::InvalidBody("Truncated metadata".to_string()));
    }
    let text = String::from_utf8(payload[..len].to_vec())
        .map_err(|_| CodecError::InvalidBody("Metadata is not valid UTF-8".to_string()))?;
    payload.advance(len);
    Ok(text)
}

fn to_u32(len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| CodecError::InvalidInput("Picture metadata is too large".to_string()))
}
