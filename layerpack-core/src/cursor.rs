//! Stream position bookkeeping for two-phase writing
//!
//! - [`ReservedRegion`]: zeroed space reserved up front and overwritten once
//!   the real values are known (the offset table).
//! - [`WriteCursor`]: tracks the last position holding completely written data
//!   and checks the forward-progress contract of layer handlers.

use crate::constants::OFFSET_ENTRY_SIZE;
use crate::error::CodecError;
use crate::Result;
use std::io::{Read, Seek, SeekFrom, Write};

/// A writable, seekable stream usable behind `dyn`
pub trait WriteSeek: Write + Seek {}

impl<T: Write + Seek + ?Sized> WriteSeek for T {}

/// Fixed-size run of 64-bit slots reserved in the stream and patched later
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a reserved region must be patched once its values are known"]
pub struct ReservedRegion {
    start: u64,
    slots: u32,
}

impl ReservedRegion {
    /// Write `slots` zeroed 8-byte placeholders at the current position
    pub fn reserve<W: Write + Seek + ?Sized>(writer: &mut W, slots: u32) -> Result<Self> {
        let start = writer.stream_position()?;
        let zeros = [0u8; OFFSET_ENTRY_SIZE as usize];
        for _ in 0..slots {
            writer.write_all(&zeros)?;
        }
        Ok(Self { start, slots })
    }

    /// Absolute position of the first slot
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of slots
    pub fn slots(&self) -> u32 {
        self.slots
    }

    /// Overwrite the placeholders with `values`, then return to the position
    /// the writer was at before patching.
    ///
    /// This is the only backward seek of a save.
    pub fn patch<W: Write + Seek + ?Sized>(self, writer: &mut W, values: &[u64]) -> Result<()> {
        if values.len() != self.slots as usize {
            return Err(CodecError::InvalidInput(format!(
                "Patch needs {} values, got {}",
                self.slots,
                values.len()
            )));
        }

        let end = writer.stream_position()?;
        writer.seek(SeekFrom::Start(self.start))?;
        for &value in values {
            let value = i64::try_from(value).map_err(|_| {
                CodecError::InvalidInput(format!("Offset {} does not fit in int64", value))
            })?;
            writer.write_all(&value.to_be_bytes())?;
        }
        writer.seek(SeekFrom::Start(end))?;

        Ok(())
    }
}

/// Position where a layer handler started writing its body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyStart(u64);

impl BodyStart {
    /// Absolute stream position
    pub fn position(&self) -> u64 {
        self.0
    }
}

/// Tracks the safe position of a save and enforces handler progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteCursor {
    safe: u64,
}

impl WriteCursor {
    /// Start tracking with `safe` as the end of already written data
    pub fn new(safe: u64) -> Self {
        Self { safe }
    }

    /// Last position known to hold completely written data
    pub fn safe(&self) -> u64 {
        self.safe
    }

    /// Record where a handler body begins
    pub fn begin_body(&self, position: u64) -> BodyStart {
        BodyStart(position)
    }

    /// Check the position a handler left the stream at.
    ///
    /// The handler must have moved strictly forward of `start` and must not
    /// end behind the safe position.
    pub fn finish_body(&mut self, index: u32, start: BodyStart, end: u64) -> Result<()> {
        if end <= start.0 || end < self.safe {
            return Err(CodecError::HandlerContractViolation {
                index,
                start: start.0,
                end,
                safe: self.safe,
            });
        }
        self.safe = end;
        Ok(())
    }

    /// Advance the safe position after writing data the codec itself controls
    pub fn commit(&mut self, position: u64) {
        self.safe = self.safe.max(position);
    }
}

/// Read exactly `N` bytes
pub(crate) fn read_array<const N: usize, R: Read + ?Sized>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a big-endian `i32`
pub(crate) fn read_i32<R: Read + ?Sized>(reader: &mut R) -> Result<i32> {
    Ok(i32::from_be_bytes(read_array::<4, R>(reader)?))
}

/// Read a big-endian `i64`
pub(crate) fn read_i64<R: Read + ?Sized>(reader: &mut R) -> Result<i64> {
    Ok(i64::from_be_bytes(read_array::<8, R>(reader)?))
}

/// Total length of the stream, restoring the current position afterwards
pub(crate) fn stream_len<S: Seek + ?Sized>(stream: &mut S) -> Result<u64> {
    let here = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if here != len {
        stream.seek(SeekFrom::Start(here))?;
    }
    Ok(len)
}
