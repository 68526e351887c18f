use lopdf::{Dictionary, ObjectId};

use crate::bounded::FormXObject;
use crate::context::DocContext;
use crate::document::LopdfHost;
use crate::error::{ContentError, Result};
use crate::font::TextEncoding;
use crate::format::{escape_pdf_bytes, fmt_num, format_dash, hex_pdf_bytes};
use crate::geometry::{BoundsRect, EllipticalArc, Matrix};
use crate::host::{ContentHost, ResourceCategory};
use crate::path::Path;
use crate::resources::GraphicsStateTable;
use crate::validate::ContentValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt = 0,
    Round = 1,
    Square = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter = 0,
    Round = 1,
    Bevel = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextRenderingMode {
    #[default]
    Fill = 0,
    Stroke = 1,
    FillStroke = 2,
    Invisible = 3,
    FillClip = 4,
    StrokeClip = 5,
    FillStrokeClip = 6,
    Clip = 7,
}

impl TextRenderingMode {
    /// Whether glyph outlines are stroked in this mode.
    pub fn strokes(self) -> bool {
        matches!(
            self,
            TextRenderingMode::Stroke
                | TextRenderingMode::FillStroke
                | TextRenderingMode::StrokeClip
                | TextRenderingMode::FillStrokeClip
        )
    }
}

/// Where a stream's content and resources end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Whatever page the host considers current at the time of use.
    CurrentPage,
    Object(ObjectId),
}

impl Container {
    fn resolve<H: ContentHost + ?Sized>(self, host: &mut H) -> Result<ObjectId> {
        match self {
            Container::CurrentPage => host.current_page(),
            Container::Object(id) => Ok(id),
        }
    }
}

/// Drawing primitives shared by the plain and the bounds-tracking builder.
///
/// Coordinates are in the current user space. Operations that need the
/// document (resource lookups, font metrics) are fallible.
pub trait ContentOps {
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn bezier_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64);
    fn close_path(&mut self);

    fn stroke(&mut self);
    fn fill(&mut self);
    fn fill_even_odd(&mut self);
    fn clip(&mut self);
    fn clip_even_odd(&mut self);

    fn save_state(&mut self);
    fn restore_state(&mut self) -> Result<()>;
    fn transform(&mut self, matrix: &Matrix);

    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_miter_limit(&mut self, limit: f64);
    /// Dash operand text written verbatim, e.g. `[3 1] 0`.
    fn set_dash(&mut self, pattern: &str);
    fn set_rendering_intent(&mut self, intent: &str);

    fn set_stroke_gray(&mut self, gray: f64);
    fn set_fill_gray(&mut self, gray: f64);
    fn set_stroke_rgb(&mut self, r: f64, g: f64, b: f64);
    fn set_fill_rgb(&mut self, r: f64, g: f64, b: f64);
    fn set_stroke_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64);
    fn set_fill_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64);

    fn set_fill_alpha(&mut self, alpha: f64) -> Result<()>;
    fn set_stroke_alpha(&mut self, alpha: f64) -> Result<()>;
    fn set_blend_mode(&mut self, mode: &str) -> Result<()>;
    /// Registers `dict` as a new ExtGState and selects it.
    fn set_graphics_state(&mut self, dict: Dictionary) -> Result<()>;

    /// Paints an image XObject into the unit square of the current space.
    fn do_image(&mut self, image: ObjectId) -> Result<()>;
    fn do_form(&mut self, form: &FormXObject) -> Result<()>;

    fn begin_text(&mut self);
    fn end_text(&mut self);
    fn set_font(&mut self, font: ObjectId, size: f64) -> Result<()>;
    fn set_text_rendering_mode(&mut self, mode: TextRenderingMode);
    fn set_character_spacing(&mut self, spacing: f64);
    fn set_word_spacing(&mut self, spacing: f64);
    /// Percentage, 100 is unscaled.
    fn set_horizontal_scaling(&mut self, scale: f64);
    fn set_text_leading(&mut self, leading: f64);
    fn set_text_rise(&mut self, rise: f64);
    fn set_text_matrix(&mut self, matrix: &Matrix);
    fn text_move(&mut self, tx: f64, ty: f64);
    fn next_line(&mut self);
    /// Shows `text` in the current font's encoding, one code per character.
    fn show_text(&mut self, text: &str) -> Result<()>;

    /// Appends `arc` as bezier segments, optionally starting a new subpath
    /// at its first point.
    fn arc(&mut self, arc: &EllipticalArc, move_to_start: bool) {
        let points = arc.points();
        if move_to_start {
            self.move_to(points[0].0, points[0].1);
        }
        for segment in points[1..].chunks_exact(3) {
            self.bezier_to(
                segment[0].0,
                segment[0].1,
                segment[1].0,
                segment[1].1,
                segment[2].0,
                segment[2].1,
            );
        }
    }

    fn set_dash_array(&mut self, array: &[f64], phase: f64) {
        self.set_dash(&format_dash(array, phase));
    }

    /// Paints `image` into the rectangle that `placement` maps the unit
    /// square onto.
    fn draw_image(&mut self, image: ObjectId, placement: &Matrix) -> Result<()> {
        self.save_state();
        self.transform(placement);
        self.do_image(image)?;
        self.restore_state()
    }

    fn draw_form(&mut self, form: &FormXObject, placement: &Matrix) -> Result<()> {
        self.save_state();
        self.transform(placement);
        self.do_form(form)?;
        self.restore_state()
    }

    fn append_path(&mut self, path: &Path) {
        path.append_to(self);
    }
}

/// Accumulates content-stream tokens for one page or form.
///
/// Every token is written with a leading space. Nothing reaches the document
/// until [`ContentStream::flush`].
pub struct ContentStream<H: ContentHost = LopdfHost> {
    ctx: DocContext<H>,
    container: Container,
    contents: String,
    gstates: GraphicsStateTable,
    validator: ContentValidator,
    encoding: TextEncoding,
    saved_encodings: Vec<TextEncoding>,
}

impl<H: ContentHost> ContentStream<H> {
    /// Stream for the document's current page.
    pub fn new(ctx: &DocContext<H>) -> Self {
        Self::with_container(ctx, Container::CurrentPage)
    }

    pub fn for_container(ctx: &DocContext<H>, container: ObjectId) -> Self {
        Self::with_container(ctx, Container::Object(container))
    }

    fn with_container(ctx: &DocContext<H>, container: Container) -> Self {
        Self {
            ctx: ctx.clone(),
            container,
            contents: String::new(),
            gstates: GraphicsStateTable::default(),
            validator: ContentValidator::new(ctx.options().validate),
            encoding: TextEncoding::default(),
            saved_encodings: Vec::new(),
        }
    }

    pub fn context(&self) -> &DocContext<H> {
        &self.ctx
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Graphics-state resources requested so far.
    pub fn pending_graphics_states(&self) -> usize {
        self.gstates.len()
    }

    pub fn validation_errors(&self) -> &[String] {
        self.validator.errors()
    }

    /// Copies another stream's tokens verbatim.
    ///
    /// Resources named by `other` are not transferred.
    pub fn append_content(&mut self, other: &ContentStream<H>) {
        self.contents.push_str(&other.contents);
    }

    /// Writes pending resources and the buffered tokens into the container,
    /// then clears the buffer.
    ///
    /// Returns `false` when there was nothing to write; the container is
    /// still created if it did not exist.
    pub fn flush(&mut self) -> Result<bool> {
        let (container, written, bytes) = {
            let mut host = self.ctx.host()?;
            let container = self.container.resolve(&mut *host)?;
            if self.contents.is_empty() {
                return Ok(false);
            }
            let written = self.gstates.write_to(&mut *host, container)?;
            let bytes = std::mem::take(&mut self.contents).into_bytes();
            let len = bytes.len();
            host.append_content(container, bytes)?;
            (container, written, len)
        };
        log::debug!(
            "flushed {} bytes and {} graphics state(s) into {:?}",
            bytes,
            written,
            container
        );
        self.validator
            .report("content stream", self.ctx.options().max_reported_errors);
        Ok(true)
    }

    /// Replaces a form's payload with the buffered tokens and sets its box.
    /// The buffer is kept.
    pub(crate) fn write_form(&mut self, form: ObjectId, bbox: &BoundsRect) -> Result<()> {
        {
            let mut host = self.ctx.host()?;
            self.gstates.write_to(&mut *host, form)?;
            host.set_form_content(form, self.contents.as_bytes().to_vec())?;
            host.set_form_bbox(form, bbox)?;
        }
        log::debug!(
            "wrote {} bytes into form {:?} with bbox [{}]",
            self.contents.len(),
            form,
            bbox
        );
        self.validator
            .report("form XObject", self.ctx.options().max_reported_errors);
        Ok(())
    }

    fn emit(&mut self, operands: &[f64], op: &'static str) {
        for value in operands {
            self.contents.push(' ');
            self.contents.push_str(&fmt_num(*value));
        }
        self.contents.push(' ');
        self.contents.push_str(op);
        self.validator.check(op);
    }

    fn emit_named(&mut self, name: &str, operands: &[f64], op: &'static str) {
        self.contents.push_str(" /");
        self.contents.push_str(name);
        self.emit(operands, op);
    }

    fn select_graphics_state(
        &mut self,
        pick: impl FnOnce(&mut GraphicsStateTable, &H, ObjectId) -> Result<String>,
    ) -> Result<()> {
        let name = {
            let mut host = self.ctx.host()?;
            let container = self.container.resolve(&mut *host)?;
            pick(&mut self.gstates, &*host, container)?
        };
        self.emit_named(&name, &[], "gs");
        Ok(())
    }

    fn resource_name(&mut self, category: ResourceCategory, target: ObjectId) -> Result<String> {
        let mut host = self.ctx.host()?;
        let container = self.container.resolve(&mut *host)?;
        host.find_or_add_resource(container, category, target)
    }

    fn xobject_name(&mut self, id: ObjectId) -> Result<String> {
        let target = self
            .ctx
            .host()?
            .resolve_xobject(id)
            .ok_or(ContentError::UnknownXObject(id))?;
        self.resource_name(ResourceCategory::XObject, target)
    }
}

impl<H: ContentHost> ContentOps for ContentStream<H> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.emit(&[x, y], "m");
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.emit(&[x, y], "l");
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.emit(&[x, y, width, height], "re");
    }

    fn bezier_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.emit(&[x1, y1, x2, y2, x3, y3], "c");
    }

    fn close_path(&mut self) {
        self.emit(&[], "h");
    }

    fn stroke(&mut self) {
        self.emit(&[], "S");
    }

    fn fill(&mut self) {
        self.emit(&[], "f");
    }

    fn fill_even_odd(&mut self) {
        self.emit(&[], "f*");
    }

    fn clip(&mut self) {
        self.emit(&[], "W");
        self.emit(&[], "n");
    }

    fn clip_even_odd(&mut self) {
        self.emit(&[], "W*");
        self.emit(&[], "n");
    }

    fn save_state(&mut self) {
        self.emit(&[], "q");
        self.saved_encodings.push(self.encoding);
    }

    fn restore_state(&mut self) -> Result<()> {
        self.emit(&[], "Q");
        if let Some(encoding) = self.saved_encodings.pop() {
            self.encoding = encoding;
        }
        Ok(())
    }

    fn transform(&mut self, m: &Matrix) {
        self.emit(&[m.a, m.b, m.c, m.d, m.e, m.f], "cm");
    }

    fn set_line_width(&mut self, width: f64) {
        self.emit(&[width], "w");
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.emit(&[cap as i32 as f64], "J");
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.emit(&[join as i32 as f64], "j");
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.emit(&[limit], "M");
    }

    fn set_dash(&mut self, pattern: &str) {
        self.contents.push(' ');
        self.contents.push_str(pattern);
        self.emit(&[], "d");
    }

    fn set_rendering_intent(&mut self, intent: &str) {
        self.emit_named(intent, &[], "ri");
    }

    fn set_stroke_gray(&mut self, gray: f64) {
        self.emit(&[gray], "G");
    }

    fn set_fill_gray(&mut self, gray: f64) {
        self.emit(&[gray], "g");
    }

    fn set_stroke_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.emit(&[r, g, b], "RG");
    }

    fn set_fill_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.emit(&[r, g, b], "rg");
    }

    fn set_stroke_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.emit(&[c, m, y, k], "K");
    }

    fn set_fill_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.emit(&[c, m, y, k], "k");
    }

    fn set_fill_alpha(&mut self, alpha: f64) -> Result<()> {
        self.select_graphics_state(|table, host, container| table.fill_alpha(alpha, host, container))
    }

    fn set_stroke_alpha(&mut self, alpha: f64) -> Result<()> {
        self.select_graphics_state(|table, host, container| {
            table.stroke_alpha(alpha, host, container)
        })
    }

    fn set_blend_mode(&mut self, mode: &str) -> Result<()> {
        self.select_graphics_state(|table, host, container| table.blend_mode(mode, host, container))
    }

    fn set_graphics_state(&mut self, dict: Dictionary) -> Result<()> {
        self.select_graphics_state(|table, host, container| table.custom(dict, host, container))
    }

    fn do_image(&mut self, image: ObjectId) -> Result<()> {
        let name = self.xobject_name(image)?;
        self.emit_named(&name, &[], "Do");
        Ok(())
    }

    fn do_form(&mut self, form: &FormXObject) -> Result<()> {
        let name = self.xobject_name(form.id)?;
        self.emit_named(&name, &[], "Do");
        Ok(())
    }

    fn begin_text(&mut self) {
        self.emit(&[], "BT");
    }

    fn end_text(&mut self) {
        self.emit(&[], "ET");
    }

    fn set_font(&mut self, font: ObjectId, size: f64) -> Result<()> {
        let name = self.resource_name(ResourceCategory::Font, font)?;
        let multibyte = self
            .ctx
            .host()?
            .font_info(font)
            .is_some_and(|info| info.multibyte);
        self.encoding = TextEncoding::for_font(multibyte);
        self.emit_named(&name, &[size], "Tf");
        Ok(())
    }

    fn set_text_rendering_mode(&mut self, mode: TextRenderingMode) {
        self.emit(&[mode as i32 as f64], "Tr");
    }

    fn set_character_spacing(&mut self, spacing: f64) {
        self.emit(&[spacing], "Tc");
    }

    fn set_word_spacing(&mut self, spacing: f64) {
        self.emit(&[spacing], "Tw");
    }

    fn set_horizontal_scaling(&mut self, scale: f64) {
        self.emit(&[scale], "Tz");
    }

    fn set_text_leading(&mut self, leading: f64) {
        self.emit(&[leading], "TL");
    }

    fn set_text_rise(&mut self, rise: f64) {
        self.emit(&[rise], "Ts");
    }

    fn set_text_matrix(&mut self, m: &Matrix) {
        self.emit(&[m.a, m.b, m.c, m.d, m.e, m.f], "Tm");
    }

    fn text_move(&mut self, tx: f64, ty: f64) {
        self.emit(&[tx, ty], "Td");
    }

    fn next_line(&mut self) {
        self.emit(&[], "T*");
    }

    fn show_text(&mut self, text: &str) -> Result<()> {
        let bytes = self.encoding.encode(text);
        match self.encoding {
            TextEncoding::WinAnsi => {
                self.contents.push_str(" (");
                self.contents.push_str(&escape_pdf_bytes(&bytes));
                self.contents.push(')');
            }
            TextEncoding::TwoByte => {
                self.contents.push_str(" <");
                self.contents.push_str(&hex_pdf_bytes(&bytes));
                self.contents.push('>');
            }
        }
        self.emit(&[], "Tj");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContentOptions;
    use crate::font::FontMetrics;
    use crate::raster::RasterImage;
    use std::sync::Arc;

    fn context() -> DocContext {
        DocContext::with_options(
            LopdfHost::new(),
            ContentOptions {
                validate: true,
                ..ContentOptions::default()
            },
        )
    }

    fn page_content(ctx: DocContext) -> String {
        let host = ctx.into_host().expect("sole owner");
        let page = host.pages()[0];
        String::from_utf8(host.content_of(page).expect("content")).expect("utf8")
    }

    #[test]
    fn path_tokens_have_leading_spaces() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        cs.move_to(10.0, 20.0);
        cs.line_to(30.5, 40.0);
        cs.bezier_to(1.0, 2.0, 3.0, 4.0, 5.0, 6.123456);
        cs.close_path();
        cs.stroke();
        assert_eq!(cs.contents(), " 10 20 m 30.5 40 l 1 2 3 4 5 6.12346 c h S");
    }

    #[test]
    fn state_and_color_operators() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        cs.save_state();
        cs.transform(&Matrix::new(1.0, 0.0, 0.0, 1.0, 72.0, -36.0));
        cs.set_line_width(0.25);
        cs.set_line_cap(LineCap::Round);
        cs.set_line_join(LineJoin::Bevel);
        cs.set_miter_limit(4.0);
        cs.set_dash_array(&[3.0, 1.0], 0.0);
        cs.set_fill_rgb(1.0, 0.5, 0.0);
        cs.set_stroke_cmyk(0.0, 0.0, 0.0, 1.0);
        cs.set_fill_gray(0.2);
        cs.set_rendering_intent("Perceptual");
        cs.restore_state().expect("restore");
        assert_eq!(
            cs.contents(),
            " q 1 0 0 1 72 -36 cm 0.25 w 1 J 2 j 4 M [3 1] 0 d 1 0.5 0 rg 0 0 0 1 K 0.2 g /Perceptual ri Q"
        );
        assert!(cs.validation_errors().is_empty());
    }

    #[test]
    fn clip_ends_the_path_without_painting() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        cs.rect(0.0, 0.0, 10.0, 10.0);
        cs.clip();
        cs.rect(0.0, 0.0, 5.0, 5.0);
        cs.clip_even_odd();
        assert_eq!(cs.contents(), " 0 0 10 10 re W n 0 0 5 5 re W* n");
    }

    #[test]
    fn flushing_empty_stream_only_creates_the_page() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        assert!(!cs.flush().expect("flush"));
        assert!(!cs.flush().expect("flush"));
        drop(cs);
        let host = ctx.into_host().expect("sole owner");
        assert_eq!(host.pages().len(), 1);
        assert!(host.content_of(host.pages()[0]).expect("content").is_empty());
    }

    #[test]
    fn flush_appends_and_clears() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        cs.rect(1.0, 2.0, 3.0, 4.0);
        cs.fill();
        assert!(cs.flush().expect("flush"));
        assert!(cs.is_empty());
        cs.fill_even_odd();
        assert!(cs.flush().expect("flush"));
        drop(cs);
        assert_eq!(page_content(ctx), " 1 2 3 4 re f f*");
    }

    #[test]
    fn equal_alpha_shares_one_graphics_state() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        cs.set_fill_alpha(0.5).expect("alpha");
        cs.set_fill_alpha(0.5).expect("alpha");
        cs.set_stroke_alpha(0.5).expect("alpha");
        cs.set_blend_mode("Multiply").expect("blend");
        cs.set_blend_mode("Multiply").expect("blend");
        assert_eq!(cs.contents(), " /GS0 gs /GS0 gs /GS1 gs /GS2 gs /GS2 gs");
        assert_eq!(cs.pending_graphics_states(), 3);
        cs.flush().expect("flush");
        cs.flush().expect("flush");
        drop(cs);

        let host = ctx.into_host().expect("sole owner");
        let page = host.pages()[0];
        let states = host
            .resource_entries(page, ResourceCategory::ExtGState)
            .expect("entries");
        assert_eq!(states.len(), 3);
        let (_, gs0) = states.iter().find(|(name, _)| name == "GS0").expect("GS0");
        let dict = host.document().get_dictionary(*gs0).expect("dict");
        assert_eq!(dict.get(b"ca").and_then(|v| v.as_float()).ok(), Some(0.5));
    }

    #[test]
    fn custom_graphics_states_are_not_deduplicated() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        cs.set_graphics_state(lopdf::dictionary! { "LW" => 3 }).expect("gs");
        cs.set_graphics_state(lopdf::dictionary! { "LW" => 3 }).expect("gs");
        assert_eq!(cs.contents(), " /GS0 gs /GS1 gs");
    }

    #[test]
    fn same_image_is_one_resource_with_two_invocations() {
        let ctx = context();
        let image = Arc::new(RasterImage::from_rgb8(1, 1, vec![255, 0, 0]).expect("image"));
        let mut cs = ContentStream::new(&ctx);
        let id = ctx.embed_image(&image).expect("embed");
        cs.draw_image(id, &Matrix::scaling(50.0, 50.0)).expect("draw");
        let again = ctx.embed_image(&image).expect("embed");
        cs.draw_image(again, &Matrix::new(20.0, 0.0, 0.0, 10.0, 100.0, 100.0))
            .expect("draw");
        let name = format!("Im{}", id.0);
        assert_eq!(cs.contents().matches(&format!("/{name} Do")).count(), 2);
        cs.flush().expect("flush");
        drop(cs);

        let host = ctx.into_host().expect("sole owner");
        let xobjects = host
            .resource_entries(host.pages()[0], ResourceCategory::XObject)
            .expect("entries");
        assert_eq!(xobjects, vec![(name, id)]);
    }

    #[test]
    fn unknown_xobject_is_an_error() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        let err = cs.do_image((4242, 0)).unwrap_err();
        assert!(matches!(err, ContentError::UnknownXObject((4242, 0))));
        assert!(cs.is_empty());
    }

    #[test]
    fn text_object_tokens() {
        let ctx = context();
        let font = ctx
            .font("Mono", || {
                Ok(FontMetrics::new("Mono", 32, vec![600; 95], 600, (0, -200, 600, 800)))
            })
            .expect("font");
        let mut cs = ContentStream::new(&ctx);
        cs.begin_text();
        cs.set_font(font, 12.0).expect("font");
        cs.set_character_spacing(0.5);
        cs.set_word_spacing(1.0);
        cs.set_horizontal_scaling(90.0);
        cs.set_text_leading(14.0);
        cs.set_text_rise(2.0);
        cs.set_text_rendering_mode(TextRenderingMode::FillStroke);
        cs.set_text_matrix(&Matrix::translation(72.0, 700.0));
        cs.show_text("a(b)\\").expect("show");
        cs.next_line();
        cs.text_move(10.0, -5.0);
        cs.end_text();
        let expected = format!(
            " BT /F{} 12 Tf 0.5 Tc 1 Tw 90 Tz 14 TL 2 Ts 2 Tr 1 0 0 1 72 700 Tm (a\\(b\\)\\\\) Tj T* 10 -5 Td ET",
            font.0
        );
        assert_eq!(cs.contents(), expected);
        assert!(cs.validation_errors().is_empty());
    }

    #[test]
    fn show_strings_use_the_font_encoding() {
        let ctx = context();
        let simple = ctx
            .font("Latin", || {
                Ok(FontMetrics::new("Latin", 32, vec![500; 224], 500, (0, -200, 600, 800)))
            })
            .expect("font");
        let wide = ctx
            .font("Wide", || {
                Ok(FontMetrics::new("Wide", 0, vec![1000; 10], 1000, (0, -200, 1000, 800))
                    .with_multibyte(true))
            })
            .expect("font");
        let mut cs = ContentStream::new(&ctx);
        cs.begin_text();
        cs.set_font(simple, 10.0).expect("font");
        cs.show_text("\u{e9}\u{20ac}(").expect("show");
        cs.end_text();
        let expected = format!(
            " BT /F{} 10 Tf (\\351\\200\\() Tj ET",
            simple.0
        );
        assert_eq!(cs.contents(), expected);

        let mut cs = ContentStream::new(&ctx);
        cs.begin_text();
        cs.set_font(wide, 10.0).expect("font");
        cs.show_text("A\u{4e2d}").expect("show");
        cs.end_text();
        let expected = format!(" BT /F{} 10 Tf <00414E2D> Tj ET", wide.0);
        assert_eq!(cs.contents(), expected);
    }

    #[test]
    fn restore_brings_back_the_saved_encoding() {
        let ctx = context();
        let simple = ctx
            .font("Latin", || {
                Ok(FontMetrics::new("Latin", 32, vec![500; 224], 500, (0, -200, 600, 800)))
            })
            .expect("font");
        let wide = ctx
            .font("Wide", || {
                Ok(FontMetrics::new("Wide", 0, vec![1000; 10], 1000, (0, -200, 1000, 800))
                    .with_multibyte(true))
            })
            .expect("font");
        let mut cs = ContentStream::new(&ctx);
        cs.set_font(simple, 10.0).expect("font");
        cs.save_state();
        cs.set_font(wide, 10.0).expect("font");
        cs.restore_state().expect("restore");
        cs.begin_text();
        cs.show_text("\u{e9}").expect("show");
        cs.end_text();
        assert!(cs.contents().ends_with(" BT (\\351) Tj ET"));
    }

    #[test]
    fn arc_emits_eight_segments() {
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        cs.arc(&EllipticalArc::new(0.0, 0.0, 10.0, 5.0), true);
        let tokens: Vec<&str> = cs.contents().split_whitespace().collect();
        assert_eq!(tokens.iter().filter(|t| **t == "c").count(), EllipticalArc::SEGMENTS);
        assert_eq!(&tokens[..3], &["10", "0", "m"]);
    }

    #[test]
    fn nesting_errors_are_collected() {
        let _ = env_logger::builder().is_test(true).try_init();
        let ctx = context();
        let mut cs = ContentStream::new(&ctx);
        cs.begin_text();
        cs.rect(0.0, 0.0, 1.0, 1.0);
        cs.end_text();
        cs.show_text("x").expect("show");
        cs.restore_state().expect("plain streams do not track depth");
        assert_eq!(
            cs.validation_errors(),
            &[
                "Operator re inside text object".to_string(),
                "Text operator Tj outside text object".to_string(),
                "Invalid restore".to_string(),
            ]
        );
        assert!(cs.flush().expect("flush"));
        assert!(cs.validation_errors().is_empty());

        cs.end_text();
        assert_eq!(
            cs.validation_errors(),
            &["Text operator ET outside text object".to_string()]
        );
    }

    #[test]
    fn validation_can_be_disabled() {
        let ctx = DocContext::with_options(
            LopdfHost::new(),
            ContentOptions {
                validate: false,
                ..ContentOptions::default()
            },
        );
        let mut cs = ContentStream::new(&ctx);
        cs.restore_state().expect("restore");
        assert!(cs.validation_errors().is_empty());
    }

    #[test]
    fn appended_content_is_copied_verbatim() {
        let ctx = context();
        let mut a = ContentStream::new(&ctx);
        let mut b = ContentStream::new(&ctx);
        a.move_to(0.0, 0.0);
        b.line_to(1.0, 1.0);
        b.stroke();
        a.append_content(&b);
        assert_eq!(a.contents(), " 0 0 m 1 1 l S");
        assert_eq!(b.contents(), " 1 1 l S");
    }
}
