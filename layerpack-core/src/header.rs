//! Container header and offset table codec

use crate::constants::{offset_table_size, offset_table_start, FORMAT_REVISION, HEADER_SIZE, MAGIC};
use crate::cursor::{read_array, read_i64, ReservedRegion};
use crate::error::CodecError;
use crate::types::{ContainerHeader, Size};
use crate::Result;
use bytes::{Buf, BufMut, BytesMut};
use std::io::{Read, Seek, Write};

/// Encode the header, then reserve one zeroed offset slot per layer.
///
/// Layout:
/// 1. Magic (2 bytes): "LP"
/// 2. Revision (1 byte)
/// 3. Container type id (4 bytes, big-endian)
/// 4. Layer count (4 bytes, big-endian)
/// 5. Width, height (4 bytes each, big-endian)
/// 6. Offset table (8 bytes per layer, zero until patched)
pub fn encode_header<W: Write + Seek + ?Sized>(
    writer: &mut W,
    header: &ContainerHeader,
) -> Result<ReservedRegion> {
    let layer_count = to_i32("layer count", header.layer_count)?;
    let width = to_i32("width", header.size.width)?;
    let height = to_i32("height", header.size.height)?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE as usize);
    buf.put_slice(&header.magic);
    buf.put_u8(header.revision);
    buf.put_i32(header.container_type);
    buf.put_i32(layer_count);
    buf.put_i32(width);
    buf.put_i32(height);
    writer.write_all(&buf)?;

    ReservedRegion::reserve(writer, header.layer_count)
}

/// Decode and validate the header.
///
/// Magic and revision are checked before anything else is read.
pub fn decode_header<R: Read + ?Sized>(reader: &mut R, max_layers: u32) -> Result<ContainerHeader> {
    let magic = read_array::<2, R>(reader)?;
    if magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }

    let [revision] = read_array::<1, R>(reader)?;
    if revision != FORMAT_REVISION {
        return Err(CodecError::UnsupportedRevision(revision));
    }

    let fields = read_array::<16, R>(reader)?;
    let mut fields = &fields[..];
    let container_type = fields.get_i32();
    let layer_count = non_negative("layer count", fields.get_i32())?;
    let width = non_negative("width", fields.get_i32())?;
    let height = non_negative("height", fields.get_i32())?;

    if layer_count > max_layers {
        return Err(CodecError::LimitExceeded {
            what: "Layer count",
            value: layer_count as u64,
            limit: max_layers as u64,
        });
    }

    Ok(ContainerHeader {
        magic,
        revision,
        container_type,
        layer_count,
        size: Size::new(width, height),
    })
}

/// Read `layer_count` raw offsets. Values are validated later, when spans are computed.
pub fn read_offset_table<R: Read + ?Sized>(reader: &mut R, layer_count: u32) -> Result<Vec<i64>> {
    let mut offsets = Vec::with_capacity(layer_count as usize);
    for _ in 0..layer_count {
        offsets.push(read_i64(reader)?);
    }
    Ok(offsets)
}

/// Total size of the header plus an offset table for `layer_count` layers
pub fn header_and_table_size(layer_count: u32) -> u64 {
    offset_table_start(0) + offset_table_size(layer_count)
}

fn to_i32(field: &'static str, value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| CodecError::InvalidInput(format!("{} {} does not fit in int32", field, value)))
}

fn non_negative(field: &'static str, value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| CodecError::NegativeHeaderField { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded(header: &ContainerHeader) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        let region = encode_header(&mut out, header).unwrap();
        assert_eq!(region.start(), HEADER_SIZE);
        out.into_inner()
    }

    #[test]
    fn test_encode_layout() {
        let bytes = encoded(&ContainerHeader::new(7, 2, Size::new(100, 50)));

        assert_eq!(
            hex::encode(&bytes[..HEADER_SIZE as usize]),
            "4c5001\
             00000007\
             00000002\
             00000064\
             00000032"
        );
        assert_eq!(bytes.len() as u64, header_and_table_size(2));
        assert!(bytes[HEADER_SIZE as usize..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_round_trip() {
        let header = ContainerHeader::new(3, 4, Size::new(640, 480));
        let bytes = encoded(&header);
        let mut reader = Cursor::new(&bytes);

        let decoded = decode_header(&mut reader, 16).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(read_offset_table(&mut reader, 4).unwrap(), vec![0; 4]);
    }

    #[test]
    fn test_bad_magic_fails_before_revision() {
        // Only the magic bytes are present: a mismatch must not try to read further
        let result = decode_header(&mut Cursor::new(b"XP"), 16);
        assert_eq!(result, Err(CodecError::BadMagic(*b"XP")));
    }

    #[test]
    fn test_bad_revision() {
        let mut bytes = encoded(&ContainerHeader::new(1, 0, Size::new(1, 1)));
        bytes[2] = 9;
        let result = decode_header(&mut Cursor::new(&bytes), 16);
        assert_eq!(result, Err(CodecError::UnsupportedRevision(9)));
    }

    #[test]
    fn test_negative_fields_rejected() {
        let mut bytes = encoded(&ContainerHeader::new(1, 0, Size::new(1, 1)));
        bytes[11..15].copy_from_slice(&(-5i32).to_be_bytes());
        let result = decode_header(&mut Cursor::new(&bytes), 16);
        assert_eq!(
            result,
            Err(CodecError::NegativeHeaderField {
                field: "width",
                value: -5
            })
        );
    }

    #[test]
    fn test_layer_limit() {
        let bytes = encoded(&ContainerHeader::new(1, 5, Size::new(1, 1)));
        let result = decode_header(&mut Cursor::new(&bytes), 4);
        assert!(matches!(result, Err(CodecError::LimitExceeded { value: 5, limit: 4, .. })));
    }

    #[test]
    fn test_oversized_dimension_rejected_on_encode() {
        let mut out = Cursor::new(Vec::new());
        let header = ContainerHeader::new(1, 0, Size::new(u32::MAX, 1));
        assert!(matches!(
            encode_header(&mut out, &header),
            Err(CodecError::InvalidInput(_))
        ));
    }
}
