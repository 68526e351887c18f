use std::sync::{Arc, Mutex, MutexGuard};

use lopdf::ObjectId;

use crate::cache::DocumentCache;
use crate::document::LopdfHost;
use crate::error::{ContentError, Result};
use crate::font::FontMetrics;
use crate::host::ContentHost;
use crate::raster::RasterImage;

#[derive(Debug, Clone)]
pub struct ContentOptions {
    // Record operator-nesting errors and log them on flush.
    pub validate: bool,
    // Errors beyond this count are summarized as a single "..." line.
    pub max_reported_errors: usize,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            validate: cfg!(debug_assertions),
            max_reported_errors: 20,
        }
    }
}

/// Shared handle to one document: the host, its resource cache and the
/// options every builder created from it follows.
pub struct DocContext<H: ContentHost = LopdfHost> {
    host: Arc<Mutex<H>>,
    cache: Arc<Mutex<DocumentCache>>,
    options: ContentOptions,
}

impl<H: ContentHost> Clone for DocContext<H> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            cache: self.cache.clone(),
            options: self.options.clone(),
        }
    }
}

impl<H: ContentHost> DocContext<H> {
    pub fn new(host: H) -> Self {
        Self::with_options(host, ContentOptions::default())
    }

    pub fn with_options(host: H, options: ContentOptions) -> Self {
        Self {
            host: Arc::new(Mutex::new(host)),
            cache: Arc::new(Mutex::new(DocumentCache::new())),
            options,
        }
    }

    pub fn options(&self) -> &ContentOptions {
        &self.options
    }

    pub fn host(&self) -> Result<MutexGuard<'_, H>> {
        self.host.lock().map_err(|_| ContentError::ContextPoisoned)
    }

    pub fn cache(&self) -> Result<MutexGuard<'_, DocumentCache>> {
        self.cache.lock().map_err(|_| ContentError::ContextPoisoned)
    }

    /// Embeds `image` once per document; later calls with the same
    /// allocation return the first resource id.
    ///
    /// The cache lock is held from lookup to registration and is always taken
    /// before the host lock.
    pub fn embed_image(&self, image: &Arc<RasterImage>) -> Result<ObjectId> {
        let mut cache = self.cache()?;
        if let Some(id) = cache.referenced_image_id(image) {
            return Ok(id);
        }
        let id = self.host()?.add_image(image)?;
        cache.add_referenced_image(image, id);
        Ok(id)
    }

    /// Font object for `name`, loading its metrics on first use.
    pub fn font(
        &self,
        name: &str,
        load: impl FnOnce() -> Result<FontMetrics>,
    ) -> Result<ObjectId> {
        let metrics = self.cache()?.register_font_metrics(name, load)?;
        self.host()?.add_font(metrics)
    }

    /// Takes the host back once every builder has been dropped.
    pub fn into_host(self) -> Result<H> {
        let mutex = Arc::try_unwrap(self.host).map_err(|_| ContentError::ContextShared)?;
        mutex.into_inner().map_err(|_| ContentError::ContextPoisoned)
    }
}
