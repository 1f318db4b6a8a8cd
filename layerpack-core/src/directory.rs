//! Layer directory: header, offset table and per-layer spans

use crate::constants::{PROPS_MIN_ENCODED_SIZE, RECORD_PREFIX_SIZE, TAIL_SIZE};
use crate::cursor::stream_len;
use crate::error::CodecError;
use crate::header::{decode_header, header_and_table_size, read_offset_table};
use crate::types::ContainerHeader;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek};

/// Smallest possible layer record
const MIN_RECORD_SIZE: u64 = RECORD_PREFIX_SIZE + PROPS_MIN_ENCODED_SIZE;

/// Byte range of one layer record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpan {
    /// Position of the layer in the picture
    pub index: u32,
    /// Absolute offset of the record's layer marker
    pub offset: u64,
    /// Record length, up to the next record or the tail
    pub len: u64,
}

impl LayerSpan {
    /// Absolute offset just past the record
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Header and raw offset table of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    /// Absolute offset of the first magic byte
    pub start: u64,
    /// Decoded header
    pub header: ContainerHeader,
    /// Offsets exactly as stored; validated by [`span`](Self::span)
    pub offsets: Vec<i64>,
    /// Total length of the stream
    pub stream_len: u64,
}

impl Directory {
    /// Read the header and offset table at the reader's current position.
    ///
    /// The reader is left just past the offset table.
    pub fn read<R: Read + Seek + ?Sized>(reader: &mut R, max_layers: u32) -> Result<Self> {
        let start = reader.stream_position()?;
        let header = decode_header(reader, max_layers)?;
        let offsets = read_offset_table(reader, header.layer_count)?;
        let stream_len = stream_len(reader)?;

        Ok(Self {
            start,
            header,
            offsets,
            stream_len,
        })
    }

    /// Number of layers
    pub fn layer_count(&self) -> u32 {
        self.header.layer_count
    }

    /// Absolute offset just past the offset table
    pub fn table_end(&self) -> u64 {
        self.start + header_and_table_size(self.header.layer_count)
    }

    /// Absolute offset of the tail
    pub fn tail_offset(&self) -> Result<u64> {
        self.stream_len
            .checked_sub(TAIL_SIZE)
            .filter(|&tail| tail >= self.table_end())
            .ok_or_else(|| {
                CodecError::Io(format!(
                    "Container truncated: {} bytes cannot hold a tail after offset {}",
                    self.stream_len,
                    self.table_end()
                ))
            })
    }

    /// Where the custom payload must end: the first record, or the tail if there are no layers
    pub fn payload_end(&self) -> Result<u64> {
        if self.offsets.is_empty() {
            self.tail_offset()
        } else {
            Ok(self.span(0)?.offset)
        }
    }

    /// Span of layer `index`.
    ///
    /// The record runs to the next layer's offset, or to the tail for the last
    /// layer. Offsets must lie after the table, be strictly increasing, and
    /// leave room for a minimal record.
    pub fn span(&self, index: u32) -> Result<LayerSpan> {
        let i = index as usize;
        let raw = *self.offsets.get(i).ok_or_else(|| {
            CodecError::InvalidInput(format!(
                "No layer {} in a container of {}",
                index,
                self.offsets.len()
            ))
        })?;
        let tail = self.tail_offset()?;

        let offset = self.checked_offset(index, raw, tail)?;
        let next = match self.offsets.get(i + 1) {
            Some(&next_raw) => self.checked_offset(index + 1, next_raw, tail)?,
            None => tail,
        };

        let len = next.saturating_sub(offset);
        if len < MIN_RECORD_SIZE {
            return Err(CodecError::InvalidOffset { index, offset: raw });
        }

        Ok(LayerSpan { index, offset, len })
    }

    /// Spans of every layer, in order
    pub fn spans(&self) -> Result<Vec<LayerSpan>> {
        (0..self.layer_count()).map(|index| self.span(index)).collect()
    }

    fn checked_offset(&self, index: u32, raw: i64, tail: u64) -> Result<u64> {
        u64::try_from(raw)
            .ok()
            .filter(|&offset| offset >= self.table_end() && offset < tail)
            .ok_or(CodecError::InvalidOffset { index, offset: raw })
    }
}
