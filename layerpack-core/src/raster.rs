//! Built-in raster layers: RGBA8 pixels with a CRC32C-checked body

use crate::constants::PROPS_MIN_ENCODED_SIZE;
use crate::cursor::{read_array, WriteSeek};
use crate::error::CodecError;
use crate::registry::LayerCodec;
use crate::types::{LayerContent, Rect};
use crate::Result;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::any::Any;
use std::io::Read;

/// Layer type id of [`RasterLayerCodec`]
pub const RASTER_LAYER_TYPE: i32 = 1;

/// Bytes per RGBA8 pixel
pub const BYTES_PER_PIXEL: u64 = 4;

/// Fixed body prefix: x, y, width, height, pixel length (4 bytes each)
const RASTER_PREFIX_SIZE: usize = 20;

/// Size of the CRC32C trailer
const CRC32C_SIZE: u64 = 4;

/// RGBA8 pixels positioned on the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterContent {
    bounds: Rect,
    pixels: Bytes,
}

impl RasterContent {
    /// Create raster content; `pixels` must hold exactly `width * height * 4` bytes
    pub fn new(bounds: Rect, pixels: Bytes) -> Result<Self> {
        let expected = pixel_len(&bounds);
        if pixels.len() as u64 != expected {
            return Err(CodecError::InvalidInput(format!(
                "Raster of {}x{} needs {} bytes, got {}",
                bounds.width,
                bounds.height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self { bounds, pixels })
    }

    /// Fully transparent raster covering `bounds`
    pub fn blank(bounds: Rect) -> Self {
        Self {
            bounds,
            pixels: Bytes::from(vec![0u8; pixel_len(&bounds) as usize]),
        }
    }

    /// Raster covering `bounds` filled with one colour
    pub fn filled(bounds: Rect, rgba: [u8; 4]) -> Self {
        let count = (bounds.width as usize) * (bounds.height as usize);
        Self {
            bounds,
            pixels: Bytes::from(rgba.repeat(count)),
        }
    }

    /// Pixel data, row-major RGBA8
    pub fn pixels(&self) -> &Bytes {
        &self.pixels
    }
}

impl LayerContent for RasterContent {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_content(&self) -> Box<dyn LayerContent> {
        Box::new(self.clone())
    }
}

/// Handler for [`RasterContent`]
///
/// Body layout:
/// 1. x, y (4 bytes each, big-endian)
/// 2. width, height (4 bytes each, big-endian)
/// 3. Pixel length (4 bytes)
/// 4. Pixels
/// 5. CRC32C of the pixels (4 bytes)
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterLayerCodec;

impl LayerCodec for RasterLayerCodec {
    fn layer_type(&self) -> i32 {
        RASTER_LAYER_TYPE
    }

    fn accepts(&self, content: &dyn LayerContent) -> bool {
        content.as_any().is::<RasterContent>()
    }

    fn encode(&self, content: &dyn LayerContent, writer: &mut dyn WriteSeek) -> Result<()> {
        let raster = content
            .as_any()
            .downcast_ref::<RasterContent>()
            .ok_or_else(|| CodecError::InvalidInput("Not raster content".to_string()))?;

        let dimension = |value: u32| {
            i32::try_from(value).map_err(|_| {
                CodecError::InvalidInput(format!("Raster dimension {} does not fit in int32", value))
            })
        };
        let pixel_len = u32::try_from(raster.pixels.len()).map_err(|_| {
            CodecError::InvalidInput(format!("Raster of {} bytes is too large", raster.pixels.len()))
        })?;

        let mut buf = BytesMut::with_capacity(RASTER_PREFIX_SIZE);
        buf.put_i32(raster.bounds.x);
        buf.put_i32(raster.bounds.y);
        buf.put_i32(dimension(raster.bounds.width)?);
        buf.put_i32(dimension(raster.bounds.height)?);
        buf.put_u32(pixel_len);
        writer.write_all(&buf)?;
        writer.write_all(&raster.pixels)?;
        writer.write_all(&crc32c::crc32c(&raster.pixels).to_be_bytes())?;

        Ok(())
    }

    fn decode(&self, body: &mut dyn Read, remaining: u64) -> Result<Box<dyn LayerContent>> {
        let prefix = read_array::<RASTER_PREFIX_SIZE, _>(body)?;
        let mut prefix = &prefix[..];
        let x = prefix.get_i32();
        let y = prefix.get_i32();
        let width = prefix.get_i32();
        let height = prefix.get_i32();
        let declared = prefix.get_u32() as u64;

        let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(CodecError::InvalidBody(format!(
                    "Negative raster size {}x{}",
                    width, height
                )))
            }
        };
        let bounds = Rect::new(x, y, width, height);

        if declared != pixel_len(&bounds) {
            return Err(CodecError::InvalidBody(format!(
                "Raster of {}x{} declares {} pixel bytes",
                width, height, declared
            )));
        }
        let needed = RASTER_PREFIX_SIZE as u64 + declared + CRC32C_SIZE + PROPS_MIN_ENCODED_SIZE;
        if needed > remaining {
            return Err(CodecError::InvalidBody(format!(
                "Raster needs {} bytes, record has {}",
                needed, remaining
            )));
        }

        let mut pixels = BytesMut::zeroed(declared as usize);
        body.read_exact(&mut pixels)?;
        let expected = u32::from_be_bytes(read_array::<4, _>(body)?);
        let actual = crc32c::crc32c(&pixels);
        if actual != expected {
            return Err(CodecError::ChecksumMismatch { expected, actual });
        }

        Ok(Box::new(RasterContent {
            bounds,
            pixels: pixels.freeze(),
        }))
    }
}

fn pixel_len(bounds: &Rect) -> u64 {
    bounds.width as u64 * bounds.height as u64 * BYTES_PER_PIXEL
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(raster: &RasterContent) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RasterLayerCodec.encode(raster, &mut out).unwrap();
        out.into_inner()
    }

    fn decode(bytes: &[u8]) -> Result<RasterContent> {
        let remaining = bytes.len() as u64 + PROPS_MIN_ENCODED_SIZE;
        let content = RasterLayerCodec.decode(&mut Cursor::new(bytes), remaining)?;
        Ok(content
            .as_any()
            .downcast_ref::<RasterContent>()
            .cloned()
            .unwrap())
    }

    #[test]
    fn test_body_layout() {
        let raster = RasterContent::filled(Rect::new(-1, 2, 2, 1), [1, 2, 3, 4]);
        let bytes = encode(&raster);

        assert_eq!(bytes.len(), RASTER_PREFIX_SIZE + 8 + 4);
        assert_eq!(&bytes[0..4], &(-1i32).to_be_bytes());
        assert_eq!(&bytes[16..20], &8u32.to_be_bytes());
        assert_eq!(&bytes[20..28], &[1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(&bytes[28..], &crc32c::crc32c(&bytes[20..28]).to_be_bytes());
    }

    #[test]
    fn test_decode_restores_content() {
        let raster = RasterContent::filled(Rect::new(5, 6, 3, 2), [9, 8, 7, 255]);
        assert_eq!(decode(&encode(&raster)).unwrap(), raster);
    }

    #[test]
    fn test_empty_raster_still_advances() {
        let bytes = encode(&RasterContent::blank(Rect::default()));
        assert_eq!(bytes.len(), RASTER_PREFIX_SIZE + 4);
    }

    #[test]
    fn test_corrupt_pixel_detected() {
        let mut bytes = encode(&RasterContent::blank(Rect::new(0, 0, 2, 2)));
        bytes[RASTER_PREFIX_SIZE + 3] ^= 0x01;
        assert!(matches!(decode(&bytes), Err(CodecError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_pixel_length_must_match_dimensions() {
        let mut bytes = encode(&RasterContent::blank(Rect::new(0, 0, 2, 2)));
        bytes[16..20].copy_from_slice(&12u32.to_be_bytes());
        assert!(matches!(decode(&bytes), Err(CodecError::InvalidBody(_))));
    }

    #[test]
    fn test_body_cannot_exceed_record() {
        let bytes = encode(&RasterContent::blank(Rect::new(0, 0, 2, 2)));
        let result = RasterLayerCodec.decode(&mut Cursor::new(&bytes), 10);
        assert!(matches!(result, Err(CodecError::InvalidBody(_))));
    }

    #[test]
    fn test_new_validates_length() {
        assert!(RasterContent::new(Rect::new(0, 0, 1, 1), Bytes::from_static(&[0; 4])).is_ok());
        assert!(RasterContent::new(Rect::new(0, 0, 1, 1), Bytes::from_static(&[0; 3])).is_err());
    }

    #[test]
    fn test_rejects_foreign_content() {
        #[derive(Debug, Clone)]
        struct Other;
        impl LayerContent for Other {
            fn bounds(&self) -> Rect {
                Rect::default()
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn clone_content(&self) -> Box<dyn LayerContent> {
                Box::new(Other)
            }
        }

        assert!(!RasterLayerCodec.accepts(&Other));
        let mut out = Cursor::new(Vec::new());
        assert!(RasterLayerCodec.encode(&Other, &mut out).is_err());
    }
}
