//! Constants and limits for the Layerpack container format
//!
//! All multi-byte values are big-endian.

/// First and second magic bytes at the very start of a container
pub const MAGIC: [u8; 2] = [b'L', b'P'];

/// Current format revision
pub const FORMAT_REVISION: u8 = 1;

/// Sentinel written at the start of every layer record ("LAYR")
pub const LAYER_START_MARKER: i32 = 0x4C41_5952;

/// Sentinel opening every generic property block ("PROP")
pub const PROPS_MARKER: i32 = 0x5052_4F50;

/// Header size: 2 (magic) + 1 (revision) + 4 (container type) + 4 (layer count)
/// + 4 (width) + 4 (height) = 19 bytes
pub const HEADER_SIZE: u64 = 19;

/// Size of one offset table entry
pub const OFFSET_ENTRY_SIZE: u64 = 8;

/// Size of the tail (active layer index)
pub const TAIL_SIZE: u64 = 4;

/// Layer record prefix: 4 (marker) + 4 (index) + 4 (layer type id)
pub const RECORD_PREFIX_SIZE: u64 = 12;

/// Fixed part of a property block after its length prefix:
/// 4 (marker) + 4 (opacity) + 1 (visibility) + 4 (name length)
pub const PROPS_FIXED_OVERHEAD: usize = 13;

/// A property block length must be strictly greater than this floor
/// (4 (opacity) + 1 (visibility) + 4 (name length))
pub const PROPS_MIN_BLOCK_LEN: i32 = 9;

/// Smallest possible property block including its length prefix
pub const PROPS_MIN_ENCODED_SIZE: u64 = 4 + PROPS_FIXED_OVERHEAD as u64;

/// Tail value meaning "no active layer"
pub const NO_ACTIVE_LAYER: i32 = -1;

/// Default upper bound on the layer count accepted by the decoder
pub const DEFAULT_MAX_LAYERS: u32 = 65_536;

/// Default upper bound on a property block length accepted by the decoder (1 MiB)
pub const DEFAULT_MAX_PROPERTY_BLOCK: u32 = 1024 * 1024;

/// Byte offset of the offset table relative to the container start
pub const fn offset_table_start(container_start: u64) -> u64 {
    container_start + HEADER_SIZE
}

/// Size of an offset table with `layer_count` entries
pub const fn offset_table_size(layer_count: u32) -> u64 {
    layer_count as u64 * OFFSET_ENTRY_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_spell_ascii() {
        assert_eq!(&LAYER_START_MARKER.to_be_bytes(), b"LAYR");
        assert_eq!(&PROPS_MARKER.to_be_bytes(), b"PROP");
    }

    #[test]
    fn test_property_floor_below_minimum_block() {
        assert!(PROPS_MIN_BLOCK_LEN < PROPS_FIXED_OVERHEAD as i32);
        assert_eq!(PROPS_MIN_ENCODED_SIZE, 17);
    }

    #[test]
    fn test_offset_table_geometry() {
        assert_eq!(offset_table_start(0), 19);
        assert_eq!(offset_table_start(100), 119);
        assert_eq!(offset_table_size(3), 24);
        assert_eq!(offset_table_size(0), 0);
    }
}
