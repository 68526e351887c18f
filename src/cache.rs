use std::collections::HashMap;
use std::sync::{Arc, Weak};

use lopdf::ObjectId;

use crate::error::Result;
use crate::font::FontMetrics;
use crate::raster::RasterImage;

struct ReferencedImage {
    image: Weak<RasterImage>,
    id: ObjectId,
}

/// Document-scoped memo of font metrics and embedded images.
///
/// Images are held weakly: an entry lives only while the caller keeps the
/// image alive, and dead entries are pruned on lookup.
#[derive(Default)]
pub struct DocumentCache {
    font_metrics: HashMap<String, Arc<FontMetrics>>,
    images: Vec<ReferencedImage>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics for `name`, running `load` only the first time.
    pub fn register_font_metrics(
        &mut self,
        name: &str,
        load: impl FnOnce() -> Result<FontMetrics>,
    ) -> Result<Arc<FontMetrics>> {
        if let Some(metrics) = self.font_metrics.get(name) {
            return Ok(metrics.clone());
        }
        let metrics = Arc::new(load()?);
        self.font_metrics.insert(name.to_string(), metrics.clone());
        Ok(metrics)
    }

    pub fn font_metrics(&self, name: &str) -> Option<Arc<FontMetrics>> {
        self.font_metrics.get(name).cloned()
    }

    /// Resource id previously recorded for this exact image allocation.
    pub fn referenced_image_id(&mut self, image: &Arc<RasterImage>) -> Option<ObjectId> {
        let before = self.images.len();
        self.images.retain(|entry| entry.image.strong_count() > 0);
        let pruned = before - self.images.len();
        if pruned > 0 {
            log::trace!("pruned {} dropped image(s) from cache", pruned);
        }
        let target = Arc::downgrade(image);
        self.images
            .iter()
            .find(|entry| entry.image.ptr_eq(&target))
            .map(|entry| entry.id)
    }

    pub fn add_referenced_image(&mut self, image: &Arc<RasterImage>, id: ObjectId) {
        let target = Arc::downgrade(image);
        if let Some(entry) = self.images.iter_mut().find(|entry| entry.image.ptr_eq(&target)) {
            entry.id = id;
            return;
        }
        self.images.insert(0, ReferencedImage { image: target, id });
    }

    /// Drops the entry for `image`, e.g. when the caller disposes of it.
    pub fn forget_image(&mut self, image: &Arc<RasterImage>) -> bool {
        let target = Arc::downgrade(image);
        let before = self.images.len();
        self.images.retain(|entry| !entry.image.ptr_eq(&target));
        self.images.len() != before
    }

    pub fn referenced_image_count(&self) -> usize {
        self.images.len()
    }

    /// Forgets every referenced image. Font metrics are kept.
    pub fn clear(&mut self) {
        self.images.clear();
    }
}
