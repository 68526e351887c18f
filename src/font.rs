use crate::error::{ContentError, Result};
use crate::geometry::BoundsRect;

// WinAnsiEncoding codes 0x80..=0x9F; the rest of the upper half is Latin-1.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20ac}'), None, Some('\u{201a}'), Some('\u{0192}'),
    Some('\u{201e}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02c6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017d}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201c}'),
    Some('\u{201d}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02dc}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203a}'),
    Some('\u{0153}'), None, Some('\u{017e}'), Some('\u{0178}'),
];

/// Written in place of characters the encoding cannot represent.
const REPLACEMENT_CODE: u8 = b'?';

/// WinAnsiEncoding code for `ch`, if the encoding has one.
pub fn win_ansi_code(ch: char) -> Option<u8> {
    let code = ch as u32;
    if code < 0x80 || (0xa0..=0xff).contains(&code) {
        return Some(code as u8);
    }
    WIN_ANSI_HIGH
        .iter()
        .position(|entry| *entry == Some(ch))
        .map(|idx| 0x80 + idx as u8)
}

/// Character a WinAnsiEncoding code stands for.
pub fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x80..=0x9f => WIN_ANSI_HIGH[(code - 0x80) as usize],
        _ => Some(code as char),
    }
}

/// How a font's show-strings are encoded: one code per character either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Single-byte `/WinAnsiEncoding`.
    #[default]
    WinAnsi,
    /// Two-byte big-endian codes, as written for `/Identity-H` fonts.
    TwoByte,
}

impl TextEncoding {
    pub fn for_font(multibyte: bool) -> Self {
        if multibyte {
            TextEncoding::TwoByte
        } else {
            TextEncoding::WinAnsi
        }
    }

    /// Character code `ch` is written as.
    pub fn code(self, ch: char) -> u32 {
        match self {
            TextEncoding::WinAnsi => u32::from(win_ansi_code(ch).unwrap_or(REPLACEMENT_CODE)),
            TextEncoding::TwoByte => {
                let code = ch as u32;
                if code > 0xffff { u32::from(REPLACEMENT_CODE) } else { code }
            }
        }
    }

    /// Show-string bytes for `text`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::WinAnsi => text.chars().map(|ch| self.code(ch) as u8).collect(),
            TextEncoding::TwoByte => text
                .chars()
                .flat_map(|ch| (self.code(ch) as u16).to_be_bytes())
                .collect(),
        }
    }
}

/// Advance widths and glyph box of a font, in 1/1000 em units.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    name: String,
    first_char: u32,
    widths: Vec<u16>,
    missing_width: u16,
    bbox: (i16, i16, i16, i16),
    multibyte: bool,
}

impl FontMetrics {
    /// Metrics for a simple font whose codes start at `first_char`.
    ///
    /// `bbox` is `(left, bottom, right, top)`.
    pub fn new(
        name: impl Into<String>,
        first_char: u32,
        widths: Vec<u16>,
        missing_width: u16,
        bbox: (i16, i16, i16, i16),
    ) -> Self {
        Self {
            name: name.into(),
            first_char,
            widths,
            missing_width,
            bbox,
            multibyte: false,
        }
    }

    pub fn with_multibyte(mut self, multibyte: bool) -> Self {
        self.multibyte = multibyte;
        self
    }

    /// Reads widths for codes 32..=255 and the global glyph box from a
    /// TrueType/OpenType program.
    pub fn from_truetype(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        let name = name.into();
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|err| ContentError::Font(format!("{name}: {err}")))?;
        let units_per_em = face.units_per_em().max(1);
        let scale = 1000.0 / units_per_em as f32;
        let first_char = 32u32;
        let last_char = 255u32;
        let widths = build_widths(&face, scale, first_char, last_char);
        let missing_width = widths.first().copied().unwrap_or(0);
        let bbox = face.global_bounding_box();
        let bbox = (
            scale_i16(bbox.x_min, scale),
            scale_i16(bbox.y_min, scale),
            scale_i16(bbox.x_max, scale),
            scale_i16(bbox.y_max, scale),
        );
        log::trace!(
            "loaded metrics for {name}: {} units/em, bbox {:?}",
            units_per_em,
            bbox
        );
        Ok(Self::new(name, first_char, widths, missing_width, bbox))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn first_char(&self) -> u32 {
        self.first_char
    }

    pub fn last_char(&self) -> u32 {
        self.first_char + self.widths.len().saturating_sub(1) as u32
    }

    pub fn widths(&self) -> &[u16] {
        &self.widths
    }

    pub fn missing_width(&self) -> u16 {
        self.missing_width
    }

    pub fn is_multibyte(&self) -> bool {
        self.multibyte
    }

    /// Glyph box in 1/1000 em units.
    pub fn glyph_bbox(&self) -> BoundsRect {
        let (left, bottom, right, top) = self.bbox;
        BoundsRect::from_corners(
            (left as f64, bottom as f64),
            (right as f64, top as f64),
        )
    }

    pub fn encoding(&self) -> TextEncoding {
        TextEncoding::for_font(self.multibyte)
    }

    pub fn advance_for_char(&self, ch: char) -> u16 {
        let code = self.encoding().code(ch);
        if code < self.first_char {
            return self.missing_width;
        }
        let idx = (code - self.first_char) as usize;
        self.widths.get(idx).copied().unwrap_or(self.missing_width)
    }

    /// One advance width per character of `text`.
    pub fn widths_for(&self, text: &str) -> Vec<i32> {
        text.chars()
            .map(|ch| self.advance_for_char(ch) as i32)
            .collect()
    }
}

fn build_widths(face: &ttf_parser::Face<'_>, scale: f32, first: u32, last: u32) -> Vec<u16> {
    let mut widths = Vec::with_capacity((last - first + 1) as usize);
    for code in first..=last {
        let width = u8::try_from(code)
            .ok()
            .and_then(win_ansi_char)
            .and_then(|ch| face.glyph_index(ch))
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(0);
        let scaled = (width as f32 * scale).round() as i32;
        widths.push(scaled.clamp(0, u16::MAX as i32) as u16);
    }
    widths
}

fn scale_i16(value: i16, scale: f32) -> i16 {
    let scaled = (value as f32 * scale).round() as i32;
    scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
