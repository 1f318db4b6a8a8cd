//! # Layerpack Core
//!
//! A multi-layer picture container: a fixed header, an offset table that is
//! back-patched once all layers are written, a container-specific payload,
//! one self-delimiting record per layer, and a tail naming the active layer.
//!
//! ## Modules
//!
//! - `constants`: Wire constants and limits
//! - `types`: In-memory model (Picture, Layer, LayerProperties)
//! - `error`: Error type and classification
//! - `cursor`: Reserved regions and the handler write contract
//! - `header`: Container header and offset table
//! - `properties`: Generic property block
//! - `record`: Layer records
//! - `directory`: Offset validation and per-layer spans
//! - `registry`: Pluggable container and layer handlers
//! - `codec`: Save and load orchestration
//! - `inspect`: Record summaries without decoding
//! - `file`: Path-based helpers
//! - `raster`, `standard`: Built-in handlers
//!
//! ## Example
//!
//! ```
//! use layerpack_core::{HandlerRegistry, Layer, Picture, PictureCodec, RasterContent, Rect};
//! use std::sync::Arc;
//!
//! let codec = PictureCodec::new(Arc::new(HandlerRegistry::with_defaults()));
//! let mut picture = Picture::new(100, 50);
//! let background = RasterContent::blank(Rect::new(0, 0, 8, 8));
//! picture.add_layer(Layer::new(Box::new(background)).with_name("Background"));
//! picture.set_active_layer(Some(0));
//!
//! let bytes = codec.save_to_bytes(&picture, Some("lpk")).unwrap();
//! let loaded = codec.load_from_bytes(&bytes).unwrap();
//! assert_eq!(loaded.layers[0].name(), "Background");
//! assert_eq!(loaded.active_layer(), Some(0));
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod constants;
pub mod cursor;
pub mod directory;
pub mod error;
pub mod file;
pub mod header;
pub mod inspect;
pub mod properties;
pub mod raster;
pub mod record;
pub mod registry;
pub mod standard;
pub mod types;

// Re-export commonly used types
pub use codec::{CodecOptions, PictureCodec};
pub use directory::{Directory, LayerSpan};
pub use error::{CodecError, ErrorClass};
pub use inspect::LayerSummary;
pub use raster::{RasterContent, RasterLayerCodec};
pub use registry::{ContainerCodec, HandlerRegistry, LayerCodec, PictureParts};
pub use standard::StandardContainer;
pub use types::{ContainerHeader, Layer, LayerContent, LayerProperties, Picture, Rect, Size};

/// Result type alias for Layerpack operations
pub type Result<T> = core::result::Result<T, CodecError>;
