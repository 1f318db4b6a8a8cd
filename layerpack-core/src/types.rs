//! Core types: pictures, layers and the container header

use crate::constants::{FORMAT_REVISION, MAGIC, NO_ACTIVE_LAYER};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Size {
    /// Create a new size
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in canvas coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin covering `size`
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// True if the rectangle covers no pixels
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Smallest rectangle containing both; empty rectangles are ignored
    pub fn union(&self, other: &Rect) -> Rect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let left = (self.x as i64).min(other.x as i64);
        let top = (self.y as i64).min(other.y as i64);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect {
            x: left as i32,
            y: top as i32,
            width: (right - left).min(u32::MAX as i64) as u32,
            height: (bottom - top).min(u32::MAX as i64) as u32,
        }
    }

    /// True if `other` lies entirely inside this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }
}

/// Opaque layer payload, produced and consumed by a registered layer handler
///
/// Handlers recognise their own content by downcasting through [`as_any`](Self::as_any).
pub trait LayerContent: Any + fmt::Debug + Send + Sync {
    /// Area of the canvas this content covers
    fn bounds(&self) -> Rect;

    /// Upcast for downcasting to the concrete content type
    fn as_any(&self) -> &dyn Any;

    /// Clone into a new box
    fn clone_content(&self) -> Box<dyn LayerContent>;
}

impl Clone for Box<dyn LayerContent> {
    fn clone(&self) -> Self {
        self.clone_content()
    }
}

/// Generic per-layer metadata stored in every layer record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProperties {
    /// Display name, possibly empty
    pub name: String,
    /// Opacity, conventionally 0.0 to 1.0 (not enforced)
    pub opacity: f32,
    /// Visibility flag
    pub visible: bool,
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self {
            name: String::new(),
            opacity: 1.0,
            visible: true,
        }
    }
}

/// One drawable unit of a picture
#[derive(Debug, Clone)]
pub struct Layer {
    /// Name, opacity and visibility
    pub properties: LayerProperties,

    /// Handler-specific payload
    pub content: Box<dyn LayerContent>,
}

impl Layer {
    /// Create a visible, fully opaque, unnamed layer
    pub fn new(content: Box<dyn LayerContent>) -> Self {
        Self {
            properties: LayerProperties::default(),
            content,
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.properties.name = name.into();
        self
    }

    /// Set the opacity
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.properties.opacity = opacity;
        self
    }

    /// Set the visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.properties.visible = visible;
        self
    }

    /// Layer name
    pub fn name(&self) -> &str {
        &self.properties.name
    }

    /// Canvas area covered by the content
    pub fn bounds(&self) -> Rect {
        self.content.bounds()
    }

    /// Borrow the content as a concrete type
    pub fn content_as<T: LayerContent>(&self) -> Option<&T> {
        self.content.as_any().downcast_ref::<T>()
    }
}

/// An ordered stack of layers plus canvas size
///
/// Layer order is paint order: index 0 is painted first.
#[derive(Debug, Clone, Default)]
pub struct Picture {
    /// Canvas size
    pub size: Size,

    /// Layers in paint order
    pub layers: Vec<Layer>,

    /// Free-form key/value metadata carried by container formats that support it
    pub metadata: BTreeMap<String, String>,

    active_layer: Option<usize>,
}

impl Picture {
    /// Create an empty picture
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            ..Default::default()
        }
    }

    /// Append a layer on top of the stack and return its index
    pub fn add_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer);
        self.layers.len() - 1
    }

    /// Builder-style [`add_layer`](Self::add_layer)
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Index of the active layer, if any
    pub fn active_layer(&self) -> Option<usize> {
        self.active_layer
    }

    /// Select the active layer; out-of-range indices clear the selection
    pub fn set_active_layer(&mut self, index: Option<usize>) {
        self.active_layer = index.filter(|&i| i < self.layers.len());
    }

    /// Active layer index as stored in the tail, or [`NO_ACTIVE_LAYER`]
    pub fn active_layer_index(&self) -> i32 {
        self.active_layer
            .filter(|&i| i < self.layers.len())
            .and_then(|i| i32::try_from(i).ok())
            .unwrap_or(NO_ACTIVE_LAYER)
    }

    /// Union of all layer bounds
    pub fn content_bounds(&self) -> Rect {
        self.layers
            .iter()
            .fold(Rect::default(), |acc, layer| acc.union(&layer.bounds()))
    }
}

/// Fixed container header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHeader {
    /// Magic bytes
    pub magic: [u8; 2],

    /// Format revision
    pub revision: u8,

    /// Type id of the container handler that wrote the file
    pub container_type: i32,

    /// Number of layer records
    pub layer_count: u32,

    /// Canvas size
    pub size: Size,
}

impl ContainerHeader {
    /// Create a header for the current revision
    pub fn new(container_type: i32, layer_count: u32, size: Size) -> Self {
        Self {
            magic: MAGIC,
            revision: FORMAT_REVISION,
            container_type,
            layer_count,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Patch(Rect);

    impl LayerContent for Patch {
        fn bounds(&self) -> Rect {
            self.0
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn clone_content(&self) -> Box<dyn LayerContent> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_rect_union_ignores_empty() {
        let a = Rect::new(10, 10, 5, 5);
        assert_eq!(a.union(&Rect::default()), a);
        assert_eq!(Rect::default().union(&a), a);
    }

    #[test]
    fn test_rect_union_spans_both() {
        let a = Rect::new(-5, 0, 10, 10);
        let b = Rect::new(20, 30, 5, 5);
        assert_eq!(a.union(&b), Rect::new(-5, 0, 30, 35));
        assert!(a.union(&b).contains(&a));
        assert!(a.union(&b).contains(&b));
    }

    #[test]
    fn test_active_layer_out_of_range_is_cleared() {
        let mut picture = Picture::new(10, 10);
        picture.add_layer(Layer::new(Box::new(Patch(Rect::new(0, 0, 1, 1)))));
        picture.set_active_layer(Some(0));
        assert_eq!(picture.active_layer_index(), 0);
        picture.set_active_layer(Some(3));
        assert_eq!(picture.active_layer(), None);
        assert_eq!(picture.active_layer_index(), NO_ACTIVE_LAYER);
    }

    #[test]
    fn test_layer_downcast_and_clone() {
        let layer = Layer::new(Box::new(Patch(Rect::new(1, 2, 3, 4))))
            .with_name("Ink")
            .with_opacity(0.25)
            .with_visible(false);
        let copy = layer.clone();
        assert_eq!(copy.properties, layer.properties);
        assert_eq!(copy.content_as::<Patch>().map(|p| p.0), Some(Rect::new(1, 2, 3, 4)));
    }

    #[test]
    fn test_content_bounds() {
        let picture = Picture::new(100, 100)
            .with_layer(Layer::new(Box::new(Patch(Rect::new(0, 0, 10, 10)))))
            .with_layer(Layer::new(Box::new(Patch(Rect::new(50, 50, 10, 10)))));
        assert_eq!(picture.content_bounds(), Rect::new(0, 0, 60, 60));
    }
}
