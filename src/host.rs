use std::sync::Arc;

use lopdf::{Dictionary, ObjectId};

use crate::error::Result;
use crate::font::FontMetrics;
use crate::geometry::BoundsRect;
use crate::raster::RasterImage;

/// Resource dictionary a named entry lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceCategory {
    ExtGState,
    XObject,
    Font,
}

impl ResourceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::ExtGState => "ExtGState",
            ResourceCategory::XObject => "XObject",
            ResourceCategory::Font => "Font",
        }
    }

    pub(crate) fn name_prefix(&self) -> &'static str {
        match self {
            ResourceCategory::ExtGState => "GS",
            ResourceCategory::XObject => "Im",
            ResourceCategory::Font => "F",
        }
    }
}

/// What the bounds builder needs to know about a font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontInfo {
    /// Glyph box in 1/1000 em units.
    pub bbox: BoundsRect,
    /// Multibyte fonts never apply word spacing.
    pub multibyte: bool,
}

/// The document the builders write into.
///
/// A container is a page or a form XObject: anything that owns a resource
/// dictionary and receives content.
pub trait ContentHost {
    /// The page content is currently directed to, created on first use.
    fn current_page(&mut self) -> Result<ObjectId>;

    /// A new, empty form XObject with its own resources.
    fn new_form_xobject(&mut self) -> Result<ObjectId>;

    /// `(name, target)` pairs registered under `category` in `container`.
    fn resource_entries(
        &self,
        container: ObjectId,
        category: ResourceCategory,
    ) -> Result<Vec<(String, ObjectId)>>;

    fn has_resource(
        &self,
        container: ObjectId,
        category: ResourceCategory,
        name: &str,
    ) -> Result<bool>;

    fn add_resource(
        &mut self,
        container: ObjectId,
        category: ResourceCategory,
        name: &str,
        target: ObjectId,
    ) -> Result<()>;

    /// Stores a standalone dictionary (e.g. an ExtGState) and returns its id.
    fn add_object(&mut self, dict: Dictionary) -> ObjectId;

    fn add_image(&mut self, image: &RasterImage) -> Result<ObjectId>;

    fn add_font(&mut self, metrics: Arc<FontMetrics>) -> Result<ObjectId>;

    /// `Some(id)` when `id` is an image or form XObject.
    fn resolve_xobject(&self, id: ObjectId) -> Option<ObjectId>;

    /// Advance widths in 1/1000 em units, one per character.
    fn font_widths(&self, font: ObjectId, text: &str) -> Option<Vec<i32>>;

    fn font_info(&self, font: ObjectId) -> Option<FontInfo>;

    fn append_content(&mut self, container: ObjectId, content: Vec<u8>) -> Result<()>;

    /// Replaces the payload of a form XObject.
    fn set_form_content(&mut self, form: ObjectId, content: Vec<u8>) -> Result<()>;

    fn set_form_bbox(&mut self, form: ObjectId, bbox: &BoundsRect) -> Result<()>;

    /// Name already mapped to `target`, if any.
    fn find_resource(
        &self,
        container: ObjectId,
        category: ResourceCategory,
        target: ObjectId,
    ) -> Result<Option<String>> {
        Ok(self
            .resource_entries(container, category)?
            .into_iter()
            .find(|(_, id)| *id == target)
            .map(|(name, _)| name))
    }

    /// Existing name for `target`, or a fresh one registered now.
    fn find_or_add_resource(
        &mut self,
        container: ObjectId,
        category: ResourceCategory,
        target: ObjectId,
    ) -> Result<String> {
        if let Some(name) = self.find_resource(container, category, target)? {
            return Ok(name);
        }
        let base = format!("{}{}", category.name_prefix(), target.0);
        let mut name = base.clone();
        let mut suffix = 1;
        while self.has_resource(container, category, &name)? {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.add_resource(container, category, &name, target)?;
        log::trace!(
            "registered /{} {} -> {:?} in {:?}",
            category.as_str(),
            name,
            target,
            container
        );
        Ok(name)
    }
}
