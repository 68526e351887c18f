use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::error::{ContentError, Result};
use crate::font::FontMetrics;
use crate::geometry::BoundsRect;
use crate::host::{ContentHost, FontInfo, ResourceCategory};
use crate::raster::RasterImage;

const PROC_SET: [&str; 5] = ["PDF", "Text", "ImageB", "ImageC", "ImageI"];

/// `ContentHost` backed by an in-memory `lopdf::Document`.
///
/// Pages and forms keep inline `/Resources` dictionaries. The page tree and
/// catalog are linked by [`LopdfHost::finish`].
pub struct LopdfHost {
    doc: Document,
    pages_id: ObjectId,
    pages: Vec<ObjectId>,
    current: Option<ObjectId>,
    page_size: (f64, f64),
    fonts: HashMap<ObjectId, Arc<FontMetrics>>,
    font_ids: HashMap<String, ObjectId>,
}

impl Default for LopdfHost {
    fn default() -> Self {
        Self::new()
    }
}

impl LopdfHost {
    /// US Letter pages.
    pub fn new() -> Self {
        Self::with_page_size(612.0, 792.0)
    }

    pub fn with_page_size(width: f64, height: f64) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        Self {
            doc,
            pages_id,
            pages: Vec::new(),
            current: None,
            page_size: (width, height),
            fonts: HashMap::new(),
            font_ids: HashMap::new(),
        }
    }

    /// Appends a page and makes it current.
    pub fn add_page(&mut self) -> ObjectId {
        let (width, height) = self.page_size;
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => Dictionary::new(),
        });
        self.pages.push(page_id);
        self.current = Some(page_id);
        log::debug!("added page {} as {:?}", self.pages.len(), page_id);
        page_id
    }

    pub fn set_current_page(&mut self, page: ObjectId) -> Result<()> {
        if !self.pages.contains(&page) {
            return Err(ContentError::UnknownObject(page));
        }
        self.current = Some(page);
        Ok(())
    }

    pub fn pages(&self) -> &[ObjectId] {
        &self.pages
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Decoded content of a page or form.
    pub fn content_of(&self, container: ObjectId) -> Result<Vec<u8>> {
        match self.doc.get_object(container)? {
            Object::Dictionary(_) => Ok(self.doc.get_page_content(container)?),
            Object::Stream(stream) => Ok(stream.get_plain_content()?),
            _ => Err(ContentError::NotAContainer(container)),
        }
    }

    /// Links the page tree and catalog and hands back the document.
    pub fn finish(mut self) -> Document {
        let kids: Vec<Object> = self.pages.iter().map(|id| Object::Reference(*id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.pages.len() as i64,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }

    pub fn save_to<W: Write>(self, writer: &mut W) -> Result<()> {
        let mut doc = self.finish();
        doc.compress();
        doc.save_to(writer)?;
        Ok(())
    }

    fn container_dict(&self, container: ObjectId) -> Result<&Dictionary> {
        match self.doc.get_object(container)? {
            Object::Dictionary(dict) => Ok(dict),
            Object::Stream(stream) => Ok(&stream.dict),
            _ => Err(ContentError::NotAContainer(container)),
        }
    }

    fn container_dict_mut(&mut self, container: ObjectId) -> Result<&mut Dictionary> {
        match self.doc.get_object_mut(container)? {
            Object::Dictionary(dict) => Ok(dict),
            Object::Stream(stream) => Ok(&mut stream.dict),
            _ => Err(ContentError::NotAContainer(container)),
        }
    }

    fn resources(&self, container: ObjectId) -> Result<Option<&Dictionary>> {
        match self.container_dict(container)?.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => Ok(Some(dict)),
            Ok(Object::Reference(id)) => Ok(Some(self.doc.get_dictionary(*id)?)),
            _ => Ok(None),
        }
    }

    fn resources_mut(&mut self, container: ObjectId) -> Result<&mut Dictionary> {
        let shared = match self.container_dict(container)?.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        if let Some(id) = shared {
            return Ok(self.doc.get_dictionary_mut(id)?);
        }
        let dict = self.container_dict_mut(container)?;
        if !matches!(dict.get(b"Resources"), Ok(Object::Dictionary(_))) {
            dict.set("Resources", Dictionary::new());
        }
        Ok(dict.get_mut(b"Resources")?.as_dict_mut()?)
    }

    fn category(&self, container: ObjectId, category: ResourceCategory) -> Result<Option<&Dictionary>> {
        let Some(resources) = self.resources(container)? else {
            return Ok(None);
        };
        match resources.get(category.as_str().as_bytes()) {
            Ok(Object::Dictionary(dict)) => Ok(Some(dict)),
            Ok(Object::Reference(id)) => Ok(Some(self.doc.get_dictionary(*id)?)),
            _ => Ok(None),
        }
    }
}

fn base_font_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+'))
        .collect();
    if cleaned.is_empty() {
        "Font".to_string()
    } else {
        cleaned
    }
}

fn bbox_array(bbox: &BoundsRect) -> Vec<Object> {
    vec![
        bbox.x().into(),
        bbox.y().into(),
        bbox.right().into(),
        bbox.top().into(),
    ]
}

impl ContentHost for LopdfHost {
    fn current_page(&mut self) -> Result<ObjectId> {
        match self.current {
            Some(page) => Ok(page),
            None => Ok(self.add_page()),
        }
    }

    fn new_form_xobject(&mut self) -> Result<ObjectId> {
        let proc_set: Vec<Object> = PROC_SET.iter().map(|name| Object::Name(name.as_bytes().to_vec())).collect();
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => bbox_array(&BoundsRect::EMPTY),
            "Resources" => dictionary! {
                "ProcSet" => proc_set,
            },
        };
        let id = self.doc.add_object(Stream::new(dict, Vec::new()));
        log::trace!("created form XObject {:?}", id);
        Ok(id)
    }

    fn resource_entries(
        &self,
        container: ObjectId,
        category: ResourceCategory,
    ) -> Result<Vec<(String, ObjectId)>> {
        let Some(dict) = self.category(container, category)? else {
            return Ok(Vec::new());
        };
        Ok(dict
            .iter()
            .filter_map(|(name, value)| {
                value
                    .as_reference()
                    .ok()
                    .map(|id| (String::from_utf8_lossy(name).into_owned(), id))
            })
            .collect())
    }

    fn has_resource(
        &self,
        container: ObjectId,
        category: ResourceCategory,
        name: &str,
    ) -> Result<bool> {
        Ok(self
            .category(container, category)?
            .is_some_and(|dict| dict.has(name.as_bytes())))
    }

    fn add_resource(
        &mut self,
        container: ObjectId,
        category: ResourceCategory,
        name: &str,
        target: ObjectId,
    ) -> Result<()> {
        if !self.doc.objects.contains_key(&target) {
            return Err(ContentError::UnknownObject(target));
        }
        let key = category.as_str();
        let shared = match self.resources(container)?.map(|res| res.get(key.as_bytes())) {
            Some(Ok(Object::Reference(id))) => Some(*id),
            _ => None,
        };
        let entries = match shared {
            Some(id) => self.doc.get_dictionary_mut(id)?,
            None => {
                let resources = self.resources_mut(container)?;
                if !matches!(resources.get(key.as_bytes()), Ok(Object::Dictionary(_))) {
                    resources.set(key, Dictionary::new());
                }
                resources.get_mut(key.as_bytes())?.as_dict_mut()?
            }
        };
        entries.set(name, target);
        Ok(())
    }

    fn add_object(&mut self, dict: Dictionary) -> ObjectId {
        self.doc.add_object(dict)
    }

    fn add_image(&mut self, image: &RasterImage) -> Result<ObjectId> {
        let (width, height) = (i64::from(image.width()), i64::from(image.height()));
        let smask = match image.alpha() {
            Some(alpha) => {
                let mut stream = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => width,
                        "Height" => height,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    alpha.to_vec(),
                );
                stream.compress()?;
                Some(self.doc.add_object(stream))
            }
            None => None,
        };
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        if let Some(mask) = smask {
            dict.set("SMask", mask);
        }
        let mut stream = Stream::new(dict, image.rgb().to_vec());
        stream.compress()?;
        let id = self.doc.add_object(stream);
        log::trace!("embedded {}x{} image as {:?}", width, height, id);
        Ok(id)
    }

    fn add_font(&mut self, metrics: Arc<FontMetrics>) -> Result<ObjectId> {
        if let Some(id) = self.font_ids.get(metrics.name()) {
            return Ok(*id);
        }
        let base_font = base_font_name(metrics.name());
        let dict = if metrics.is_multibyte() {
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => Object::Name(base_font.into_bytes()),
                "Encoding" => "Identity-H",
            }
        } else {
            let widths: Vec<Object> = metrics.widths().iter().map(|w| i64::from(*w).into()).collect();
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => Object::Name(base_font.into_bytes()),
                "Encoding" => "WinAnsiEncoding",
                "FirstChar" => i64::from(metrics.first_char()),
                "LastChar" => i64::from(metrics.last_char()),
                "Widths" => widths,
            }
        };
        let id = self.doc.add_object(dict);
        self.font_ids.insert(metrics.name().to_string(), id);
        self.fonts.insert(id, metrics);
        Ok(id)
    }

    fn resolve_xobject(&self, id: ObjectId) -> Option<ObjectId> {
        let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;
        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") | Ok(b"Form") => Some(id),
            _ => None,
        }
    }

    fn font_widths(&self, font: ObjectId, text: &str) -> Option<Vec<i32>> {
        self.fonts.get(&font).map(|metrics| metrics.widths_for(text))
    }

    fn font_info(&self, font: ObjectId) -> Option<FontInfo> {
        self.fonts.get(&font).map(|metrics| FontInfo {
            bbox: metrics.glyph_bbox(),
            multibyte: metrics.is_multibyte(),
        })
    }

    fn append_content(&mut self, container: ObjectId, content: Vec<u8>) -> Result<()> {
        if matches!(self.doc.get_object(container)?, Object::Dictionary(_)) {
            self.doc.add_page_contents(container, content)?;
            return Ok(());
        }
        match self.doc.get_object_mut(container)? {
            Object::Stream(stream) => {
                let mut combined = stream.get_plain_content()?;
                combined.extend_from_slice(&content);
                stream.set_plain_content(combined);
            }
            _ => return Err(ContentError::NotAContainer(container)),
        }
        Ok(())
    }

    fn set_form_content(&mut self, form: ObjectId, content: Vec<u8>) -> Result<()> {
        match self.doc.get_object_mut(form)? {
            Object::Stream(stream) => {
                stream.set_plain_content(content);
                Ok(())
            }
            _ => Err(ContentError::NotAContainer(form)),
        }
    }

    fn set_form_bbox(&mut self, form: ObjectId, bbox: &BoundsRect) -> Result<()> {
        match self.doc.get_object_mut(form)? {
            Object::Stream(stream) => {
                stream.dict.set("BBox", bbox_array(bbox));
                Ok(())
            }
            _ => Err(ContentError::NotAContainer(form)),
        }
    }
}
