use std::collections::BTreeMap;

use lopdf::{Dictionary, Object, ObjectId, dictionary};

use crate::error::Result;
use crate::format::{quantize, quantize_key};
use crate::host::{ContentHost, ResourceCategory};

#[derive(Debug, Clone)]
pub(crate) struct ExtGState {
    pub name: String,
    pub dict: Dictionary,
}

/// Graphics-state dictionaries requested by one stream, named `GS<n>`.
///
/// Alpha entries are keyed by their written value, so two requests that
/// format identically share one resource.
#[derive(Debug, Default)]
pub(crate) struct GraphicsStateTable {
    fill_alpha: BTreeMap<i64, ExtGState>,
    stroke_alpha: BTreeMap<i64, ExtGState>,
    blend_modes: BTreeMap<String, ExtGState>,
    custom: Vec<ExtGState>,
    next_index: u32,
}

impl GraphicsStateTable {
    pub fn fill_alpha<H: ContentHost + ?Sized>(
        &mut self,
        alpha: f64,
        host: &H,
        container: ObjectId,
    ) -> Result<String> {
        let key = quantize_key(alpha);
        if let Some(state) = self.fill_alpha.get(&key) {
            return Ok(state.name.clone());
        }
        let name = self.next_name(host, container)?;
        let dict = dictionary! {
            "Type" => "ExtGState",
            "ca" => quantize(alpha),
        };
        self.fill_alpha.insert(key, ExtGState { name: name.clone(), dict });
        Ok(name)
    }

    pub fn stroke_alpha<H: ContentHost + ?Sized>(
        &mut self,
        alpha: f64,
        host: &H,
        container: ObjectId,
    ) -> Result<String> {
        let key = quantize_key(alpha);
        if let Some(state) = self.stroke_alpha.get(&key) {
            return Ok(state.name.clone());
        }
        let name = self.next_name(host, container)?;
        let dict = dictionary! {
            "Type" => "ExtGState",
            "CA" => quantize(alpha),
        };
        self.stroke_alpha.insert(key, ExtGState { name: name.clone(), dict });
        Ok(name)
    }

    pub fn blend_mode<H: ContentHost + ?Sized>(
        &mut self,
        mode: &str,
        host: &H,
        container: ObjectId,
    ) -> Result<String> {
        if let Some(state) = self.blend_modes.get(mode) {
            return Ok(state.name.clone());
        }
        let name = self.next_name(host, container)?;
        let dict = dictionary! {
            "Type" => "ExtGState",
            "BM" => Object::Name(mode.as_bytes().to_vec()),
        };
        self.blend_modes
            .insert(mode.to_string(), ExtGState { name: name.clone(), dict });
        Ok(name)
    }

    /// Arbitrary dictionaries always get a fresh name.
    pub fn custom<H: ContentHost + ?Sized>(
        &mut self,
        dict: Dictionary,
        host: &H,
        container: ObjectId,
    ) -> Result<String> {
        let name = self.next_name(host, container)?;
        self.custom.push(ExtGState { name: name.clone(), dict });
        Ok(name)
    }

    pub fn len(&self) -> usize {
        self.fill_alpha.len() + self.stroke_alpha.len() + self.blend_modes.len() + self.custom.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtGState> {
        self.fill_alpha
            .values()
            .chain(self.stroke_alpha.values())
            .chain(self.blend_modes.values())
            .chain(self.custom.iter())
    }

    /// Adds every entry not yet present to the container's `/ExtGState`.
    /// Returns how many were written.
    pub fn write_to<H: ContentHost + ?Sized>(&self, host: &mut H, container: ObjectId) -> Result<usize> {
        let mut written = 0;
        for state in self.iter() {
            if host.has_resource(container, ResourceCategory::ExtGState, &state.name)? {
                continue;
            }
            let id = host.add_object(state.dict.clone());
            host.add_resource(container, ResourceCategory::ExtGState, &state.name, id)?;
            written += 1;
        }
        Ok(written)
    }

    fn next_name<H: ContentHost + ?Sized>(&mut self, host: &H, container: ObjectId) -> Result<String> {
        loop {
            let name = format!("{}{}", ResourceCategory::ExtGState.name_prefix(), self.next_index);
            self.next_index += 1;
            if !host.has_resource(container, ResourceCategory::ExtGState, &name)? {
                return Ok(name);
            }
        }
    }
}
