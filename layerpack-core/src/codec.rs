//! Save and load orchestration
//!
//! Save: header, reserved offset table, custom payload, layer records, tail,
//! then a single back-patch of the offset table.
//!
//! Load: header, offset table, custom payload, layer records (each bounded by
//! the offset table), tail, then the container builds the picture.

use crate::constants::{DEFAULT_MAX_LAYERS, DEFAULT_MAX_PROPERTY_BLOCK, NO_ACTIVE_LAYER};
use crate::cursor::{read_i32, stream_len, WriteCursor};
use crate::directory::Directory;
use crate::error::CodecError;
use crate::header::encode_header;
use crate::inspect::{summarize, LayerSummary};
use crate::record::{decode_record, encode_record};
use crate::registry::{HandlerRegistry, PictureParts};
use crate::types::{ContainerHeader, Layer, Picture, Rect};
use crate::Result;
use bytes::Bytes;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Decoder limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Largest layer count accepted from a header
    pub max_layers: u32,

    /// Largest property block length accepted from a record
    pub max_property_block: u32,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_layers: DEFAULT_MAX_LAYERS,
            max_property_block: DEFAULT_MAX_PROPERTY_BLOCK,
        }
    }
}

impl CodecOptions {
    /// Set the layer count limit
    pub fn max_layers(mut self, max_layers: u32) -> Self {
        self.max_layers = max_layers;
        self
    }

    /// Set the property block limit
    pub fn max_property_block(mut self, max_property_block: u32) -> Self {
        self.max_property_block = max_property_block;
        self
    }
}

/// Saves and loads pictures using an injected handler registry
#[derive(Debug, Clone)]
pub struct PictureCodec {
    registry: Arc<HandlerRegistry>,
    options: CodecOptions,
}

impl PictureCodec {
    /// Create a codec with default limits
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self::with_options(registry, CodecOptions::default())
    }

    /// Create a codec with explicit limits
    pub fn with_options(registry: Arc<HandlerRegistry>, options: CodecOptions) -> Self {
        Self { registry, options }
    }

    /// The handler registry
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// The decoder limits
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Save `picture` at the writer's current position and return the final
    /// stream length.
    ///
    /// The container handler is chosen by `extension`. The container must end
    /// the stream, so saving over longer existing data fails. On failure the
    /// writer is moved back to where it started; bytes already written are
    /// left in place.
    pub fn save<W: Write + Seek>(
        &self,
        picture: &Picture,
        writer: &mut W,
        extension: Option<&str>,
    ) -> Result<u64> {
        let start = writer.stream_position()?;
        #[cfg(feature = "logging")]
        debug!("Saving {} layers at {}", picture.layers.len(), start);

        match self.save_at(picture, writer, extension) {
            Ok(end) => Ok(end),
            Err(err) => {
                if let Err(_rollback) = writer.seek(SeekFrom::Start(start)) {
                    #[cfg(feature = "logging")]
                    warn!("Could not return writer to {} after failed save: {}", start, _rollback);
                }
                Err(err)
            }
        }
    }

    fn save_at<W: Write + Seek>(
        &self,
        picture: &Picture,
        writer: &mut W,
        extension: Option<&str>,
    ) -> Result<u64> {
        let container = self.registry.find_save_handler(picture, extension)?;
        let layer_count = u32::try_from(picture.layers.len()).map_err(|_| {
            CodecError::InvalidInput(format!("{} layers is too many", picture.layers.len()))
        })?;

        let header = ContainerHeader::new(container.container_type(), layer_count, picture.size);
        let table = encode_header(writer, &header)?;

        #[cfg(feature = "logging")]
        debug!(
            "Header written: container type {}, {} layers, {}x{}; offset table at {}",
            header.container_type,
            layer_count,
            header.size.width,
            header.size.height,
            table.start()
        );

        container.write_custom(picture, writer)?;

        let mut cursor = WriteCursor::new(writer.stream_position()?);
        let mut offsets = Vec::with_capacity(picture.layers.len());
        for (index, layer) in (0..layer_count).zip(&picture.layers) {
            let offset = writer.stream_position()?;
            offsets.push(offset);

            #[cfg(feature = "logging")]
            debug!("Layer {} record at {}", index, offset);

            let codec = self.registry.find_layer_encoder(index, layer)?;
            encode_record(writer, index, layer, codec, &mut cursor)?;
        }

        let active = picture.active_layer_index();
        writer.write_all(&active.to_be_bytes())?;
        #[cfg(feature = "logging")]
        debug!("Tail written: active layer {}", active);

        table.patch(writer, &offsets)?;
        let end = writer.stream_position()?;
        let len = stream_len(writer)?;
        if len > end {
            return Err(CodecError::InvalidInput(format!(
                "{} stale bytes follow the container end at {}",
                len - end,
                end
            )));
        }

        #[cfg(feature = "logging")]
        debug!("Offset table patched; container ends at {}", end);

        Ok(end)
    }

    /// Save into a new buffer
    pub fn save_to_bytes(&self, picture: &Picture, extension: Option<&str>) -> Result<Bytes> {
        let mut out = Cursor::new(Vec::new());
        self.save(picture, &mut out, extension)?;
        Ok(Bytes::from(out.into_inner()))
    }

    /// Load a picture starting at the reader's current position.
    ///
    /// The container must extend to the end of the stream: the last layer's
    /// record runs up to the tail in the final four bytes.
    pub fn load<R: Read + Seek>(&self, reader: &mut R) -> Result<Picture> {
        let directory = self.read_directory(reader)?;
        let header = &directory.header;

        #[cfg(feature = "logging")]
        debug!(
            "Header read at {}: container type {}, {} layers, {}x{}",
            directory.start,
            header.container_type,
            header.layer_count,
            header.size.width,
            header.size.height
        );

        let container = self.registry.find_load_handler(header.container_type)?;

        let payload_end = directory.payload_end()?;
        let payload_len = payload_end.saturating_sub(directory.table_end());
        let custom = {
            let mut payload = (&mut *reader).take(payload_len);
            container.read_custom(&mut payload).map_err(|err| match err {
                // The stream length is already known, so EOF here means the payload overran
                CodecError::Io(message) => CodecError::InvalidBody(format!(
                    "Custom payload overruns its {} bytes: {}",
                    payload_len, message
                )),
                other => other,
            })?
        };

        let mut layers = Vec::with_capacity(header.layer_count as usize);
        let mut content_bounds = Rect::default();
        for index in 0..header.layer_count {
            let span = directory.span(index)?;
            let layer =
                decode_record(reader, span, &self.registry, self.options.max_property_block)?;
            content_bounds = content_bounds.union(&layer.bounds());
            layers.push(layer);
        }

        reader.seek(SeekFrom::Start(directory.tail_offset()?))?;
        let active = read_i32(reader)?;

        #[cfg(feature = "logging")]
        debug!("Tail read: active layer {}", active);

        let mut picture = container.build_picture(PictureParts {
            size: header.size,
            content_bounds,
            layers,
            custom,
        })?;

        match usize::try_from(active) {
            Ok(index) if index < picture.layers.len() => picture.set_active_layer(Some(index)),
            _ => {
                if active != NO_ACTIVE_LAYER {
                    #[cfg(feature = "logging")]
                    warn!(
                        "Ignoring out-of-range active layer {} ({} layers)",
                        active,
                        picture.layers.len()
                    );
                }
            }
        }

        Ok(picture)
    }

    /// Load a picture from a buffer holding exactly one container
    pub fn load_from_bytes(&self, data: &[u8]) -> Result<Picture> {
        self.load(&mut Cursor::new(data))
    }

    /// Read only the header and offset table
    pub fn read_directory<R: Read + Seek>(&self, reader: &mut R) -> Result<Directory> {
        Directory::read(reader, self.options.max_layers)
    }

    /// Decode a single layer without touching the custom payload or other layers
    pub fn load_layer<R: Read + Seek>(&self, reader: &mut R, index: u32) -> Result<Layer> {
        let directory = self.read_directory(reader)?;
        let span = directory.span(index)?;

        #[cfg(feature = "logging")]
        debug!("Loading layer {} alone from {}", index, span.offset);

        decode_record(reader, span, &self.registry, self.options.max_property_block)
    }

    /// Record-level summary of every layer, without decoding bodies
    pub fn summarize<R: Read + Seek>(&self, reader: &mut R) -> Result<Vec<LayerSummary>> {
        summarize(reader, self.options.max_layers)
    }
}
