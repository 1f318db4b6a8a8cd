//! Pluggable container and layer handlers
//!
//! Handlers are registered explicitly, in order, and looked up by predicate
//! (save side) or by numeric type id (load side). The first match wins.

use crate::cursor::WriteSeek;
use crate::error::CodecError;
use crate::raster::RasterLayerCodec;
use crate::standard::StandardContainer;
use crate::types::{Layer, LayerContent, Picture, Rect, Size};
use crate::Result;
use std::any::Any;
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Container-specific data decoded from the custom payload, opaque to the codec
pub type CustomData = Box<dyn Any + Send>;

/// Everything decoded from a container, handed to the container's picture factory
#[derive(Debug)]
pub struct PictureParts {
    /// Canvas size from the header
    pub size: Size,
    /// Union of the decoded layers' bounds
    pub content_bounds: Rect,
    /// Layers in file order
    pub layers: Vec<Layer>,
    /// Result of [`ContainerCodec::read_custom`]
    pub custom: CustomData,
}

/// Encoder/decoder for one layer type id
pub trait LayerCodec: Send + Sync {
    /// Type id written into every record this handler encodes
    fn layer_type(&self) -> i32;

    /// True if this handler can persist `content`
    fn accepts(&self, content: &dyn LayerContent) -> bool;

    /// Write the record body.
    ///
    /// The stream must end strictly after where it started.
    fn encode(&self, content: &dyn LayerContent, writer: &mut dyn WriteSeek) -> Result<()>;

    /// Read a record body from a reader bounded to the rest of the record.
    ///
    /// `remaining` is the number of bytes left in the record, which includes the
    /// trailing property block; the body must leave that block unread.
    fn decode(&self, body: &mut dyn Read, remaining: u64) -> Result<Box<dyn LayerContent>>;
}

/// Top-level container format
pub trait ContainerCodec: Send + Sync {
    /// Type id written into the header
    fn container_type(&self) -> i32;

    /// File extensions this format is saved under; empty accepts any path
    fn extensions(&self) -> &[&str] {
        &[]
    }

    /// True if this format can persist `picture`
    fn accepts(&self, _picture: &Picture) -> bool {
        true
    }

    /// Write format-specific data between the offset table and the first layer
    fn write_custom(&self, _picture: &Picture, _writer: &mut dyn WriteSeek) -> Result<()> {
        Ok(())
    }

    /// Read what [`write_custom`](Self::write_custom) wrote, from a reader bounded
    /// to the space before the first layer
    fn read_custom(&self, _reader: &mut dyn Read) -> Result<CustomData> {
        Ok(Box::new(()))
    }

    /// Build the in-memory picture from decoded parts
    fn build_picture(&self, parts: PictureParts) -> Result<Picture>;
}

/// Ordered set of registered handlers
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    containers: Vec<Arc<dyn ContainerCodec>>,
    layers: Vec<Arc<dyn LayerCodec>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in [`StandardContainer`] and [`RasterLayerCodec`]
    pub fn with_defaults() -> Self {
        Self::new()
            .with_container(StandardContainer)
            .with_layer_codec(RasterLayerCodec)
    }

    /// Append a container handler
    pub fn register_container(&mut self, codec: impl ContainerCodec + 'static) -> &mut Self {
        self.containers.push(Arc::new(codec));
        self
    }

    /// Append a layer handler
    pub fn register_layer_codec(&mut self, codec: impl LayerCodec + 'static) -> &mut Self {
        self.layers.push(Arc::new(codec));
        self
    }

    /// Builder-style [`register_container`](Self::register_container)
    pub fn with_container(mut self, codec: impl ContainerCodec + 'static) -> Self {
        self.register_container(codec);
        self
    }

    /// Builder-style [`register_layer_codec`](Self::register_layer_codec)
    pub fn with_layer_codec(mut self, codec: impl LayerCodec + 'static) -> Self {
        self.register_layer_codec(codec);
        self
    }

    /// First container handler that accepts `picture` and declares `extension`.
    ///
    /// `None` means there is no target path, so extensions are not checked.
    pub fn find_save_handler(
        &self,
        picture: &Picture,
        extension: Option<&str>,
    ) -> Result<&dyn ContainerCodec> {
        let mut tried = Vec::new();
        for codec in &self.containers {
            let extensions = codec.extensions();
            let extension_ok = match extension {
                Some(ext) => {
                    extensions.is_empty() || extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
                }
                None => true,
            };
            if extension_ok && codec.accepts(picture) {
                return Ok(codec.as_ref());
            }
            tried.extend(extensions.iter().map(|e| e.to_string()));
        }

        Err(CodecError::NoSaveHandler {
            requested: extension.map(str::to_string),
            tried,
        })
    }

    /// Container handler that declared `type_id`
    pub fn find_load_handler(&self, type_id: i32) -> Result<&dyn ContainerCodec> {
        self.containers
            .iter()
            .find(|codec| codec.container_type() == type_id)
            .map(|codec| codec.as_ref())
            .ok_or(CodecError::UnsupportedContainerType(type_id))
    }

    /// First layer handler that accepts the content of `layer`
    pub fn find_layer_encoder(&self, index: u32, layer: &Layer) -> Result<&dyn LayerCodec> {
        self.layers
            .iter()
            .find(|codec| codec.accepts(layer.content.as_ref()))
            .map(|codec| codec.as_ref())
            .ok_or(CodecError::NoLayerEncoder(index))
    }

    /// Layer handler that declared `type_id`
    pub fn find_layer_decoder(&self, type_id: i32) -> Result<&dyn LayerCodec> {
        self.layers
            .iter()
            .find(|codec| codec.layer_type() == type_id)
            .map(|codec| codec.as_ref())
            .ok_or(CodecError::UnsupportedLayerType(type_id))
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field(
                "containers",
                &self.containers.iter().map(|c| c.container_type()).collect::<Vec<_>>(),
            )
            .field(
                "layers",
                &self.layers.iter().map(|c| c.layer_type()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
