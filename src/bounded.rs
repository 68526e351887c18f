use lopdf::{Dictionary, ObjectId};

use crate::content::{ContentOps, ContentStream, LineCap, LineJoin, TextRenderingMode};
use crate::context::DocContext;
use crate::document::LopdfHost;
use crate::error::{ContentError, Result};
use crate::geometry::{BoundsRect, Matrix, cubic_bounds};
use crate::host::{ContentHost, FontInfo};

/// A written form XObject and the device-space box its content covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormXObject {
    pub id: ObjectId,
    pub bounds: BoundsRect,
}

#[derive(Debug, Clone)]
struct GeometryState {
    clip: BoundsRect,
    matrix: Matrix,
    line_width: f64,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f64,
    font: Option<(ObjectId, FontInfo)>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    rise: f64,
    render_mode: TextRenderingMode,
}

impl Default for GeometryState {
    fn default() -> Self {
        Self {
            clip: BoundsRect::UNBOUNDED,
            matrix: Matrix::IDENTITY,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: TextRenderingMode::Fill,
        }
    }
}

/// Content builder for a form XObject that also tracks the device-space
/// box of everything it paints.
///
/// Painted geometry is clipped to the active clip before it counts. Strokes
/// grow by half the line width scaled through the current matrix.
pub struct BoundedContent<H: ContentHost = LopdfHost> {
    stream: ContentStream<H>,
    form: ObjectId,
    saved: Vec<GeometryState>,
    state: GeometryState,
    current_point: (f64, f64),
    subpath_start: (f64, f64),
    path_bounds: BoundsRect,
    bounds: BoundsRect,
    text_matrix: Matrix,
    line_matrix: Matrix,
}

impl<H: ContentHost> BoundedContent<H> {
    /// Builder writing into a new, empty form XObject.
    pub fn new(ctx: &DocContext<H>) -> Result<Self> {
        let form = ctx.host()?.new_form_xobject()?;
        Ok(Self::for_form(ctx, form))
    }

    pub fn for_form(ctx: &DocContext<H>, form: ObjectId) -> Self {
        Self {
            stream: ContentStream::for_container(ctx, form),
            form,
            saved: Vec::new(),
            state: GeometryState::default(),
            current_point: (0.0, 0.0),
            subpath_start: (0.0, 0.0),
            path_bounds: BoundsRect::EMPTY,
            bounds: BoundsRect::EMPTY,
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
        }
    }

    pub fn form_id(&self) -> ObjectId {
        self.form
    }

    /// Everything painted so far, in the form's space.
    pub fn bounds(&self) -> BoundsRect {
        self.bounds
    }

    pub fn clip_bounds(&self) -> BoundsRect {
        self.state.clip
    }

    pub fn matrix(&self) -> Matrix {
        self.state.matrix
    }

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    pub fn line_cap(&self) -> LineCap {
        self.state.line_cap
    }

    pub fn line_join(&self) -> LineJoin {
        self.state.line_join
    }

    pub fn miter_limit(&self) -> f64 {
        self.state.miter_limit
    }

    /// Number of unmatched saves.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn contents(&self) -> &str {
        self.stream.contents()
    }

    pub fn validation_errors(&self) -> &[String] {
        self.stream.validation_errors()
    }

    /// Writes resources, content and `/BBox` into the form and returns a
    /// handle other builders can paint with. The buffer is kept, so writing
    /// again replaces the form with the longer content.
    pub fn write_to_form_xobject(&mut self) -> Result<FormXObject> {
        self.stream.write_form(self.form, &self.bounds)?;
        Ok(FormXObject {
            id: self.form,
            bounds: self.bounds,
        })
    }

    fn device_point(&self, x: f64, y: f64) -> (f64, f64) {
        self.state.matrix.apply(x, y)
    }

    fn include(&mut self, mut rect: BoundsRect) {
        rect.intersect(&self.state.clip);
        self.bounds.union(&rect);
    }

    fn stroke_outset(&self, rect: &mut BoundsRect) {
        let width = self.state.line_width;
        if width <= 0.0 {
            return;
        }
        let half = width / 2.0;
        rect.inflate(
            half * self.state.matrix.x_scale_squared().sqrt(),
            half * self.state.matrix.y_scale_squared().sqrt(),
        );
    }

    fn finish_path(&mut self, stroked: bool) {
        let mut rect = std::mem::replace(&mut self.path_bounds, BoundsRect::EMPTY);
        if stroked {
            self.stroke_outset(&mut rect);
        }
        self.include(rect);
    }

    fn clip_to_path(&mut self) {
        let path = std::mem::replace(&mut self.path_bounds, BoundsRect::EMPTY);
        self.state.clip.intersect(&path);
    }

    fn include_text(&mut self, text: &str) -> Result<()> {
        let count = text.chars().count();
        let Some((font, info)) = self.state.font else {
            return Ok(());
        };
        if count == 0 || self.state.font_size <= 0.0 {
            return Ok(());
        }
        let widths = self.stream.context().host()?.font_widths(font, text);
        let Some((last, rest)) = widths.as_deref().and_then(|w| w.split_last()) else {
            return Ok(());
        };

        let scale = self.state.font_size / 1000.0;
        let glyphs = info.bbox;
        let leading: f64 = rest.iter().map(|w| *w as f64).sum();
        let mut right = (leading + glyphs.right().max(*last as f64)) * scale;
        let mut advance = (leading + *last as f64) * scale;

        let tw = self.state.word_spacing;
        if tw != 0.0 && !info.multibyte {
            let spacing = text.chars().filter(|ch| *ch == ' ').count() as f64 * tw;
            right += if text.ends_with(' ') { spacing - tw } else { spacing };
            advance += spacing;
        }

        let tc = self.state.char_spacing;
        if count > 1 {
            right += (count - 1) as f64 * tc;
        }
        advance += count as f64 * tc;

        let mut placement = self.text_matrix.then(&self.state.matrix);
        placement.pre_translate(0.0, self.state.rise);
        let h = self.state.horizontal_scaling / 100.0;
        if self.state.horizontal_scaling != 100.0 {
            placement.pre_scale(h, 1.0);
            advance *= h;
        }
        self.text_matrix.pre_translate(advance, 0.0);

        let left = glyphs.x() * scale;
        let mut rect = placement.rect_bounds(
            left,
            glyphs.y() * scale,
            right - left,
            glyphs.height() * scale,
        );
        if self.state.render_mode.strokes() {
            self.stroke_outset(&mut rect);
        }
        self.include(rect);
        Ok(())
    }
}

impl<H: ContentHost> ContentOps for BoundedContent<H> {
    fn move_to(&mut self, x: f64, y: f64) {
        self.stream.move_to(x, y);
        self.current_point = self.device_point(x, y);
        self.subpath_start = self.current_point;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.stream.line_to(x, y);
        let to = self.device_point(x, y);
        self.path_bounds
            .union(&BoundsRect::from_corners(self.current_point, to));
        self.current_point = to;
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.stream.rect(x, y, width, height);
        let rect = self.state.matrix.rect_bounds(x, y, width, height);
        self.path_bounds.union(&rect);
        self.current_point = self.device_point(x, y);
        self.subpath_start = self.current_point;
    }

    fn bezier_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        self.stream.bezier_to(x1, y1, x2, y2, x3, y3);
        let p1 = self.device_point(x1, y1);
        let p2 = self.device_point(x2, y2);
        let p3 = self.device_point(x3, y3);
        self.path_bounds
            .union(&cubic_bounds(self.current_point, p1, p2, p3));
        self.current_point = p3;
    }

    fn close_path(&mut self) {
        self.stream.close_path();
        self.current_point = self.subpath_start;
    }

    fn stroke(&mut self) {
        self.stream.stroke();
        self.finish_path(true);
    }

    fn fill(&mut self) {
        self.stream.fill();
        self.finish_path(false);
    }

    fn fill_even_odd(&mut self) {
        self.stream.fill_even_odd();
        self.finish_path(false);
    }

    fn clip(&mut self) {
        self.stream.clip();
        self.clip_to_path();
    }

    fn clip_even_odd(&mut self) {
        self.stream.clip_even_odd();
        self.clip_to_path();
    }

    fn save_state(&mut self) {
        self.stream.save_state();
        self.saved.push(self.state.clone());
    }

    fn restore_state(&mut self) -> Result<()> {
        let previous = self.saved.pop().ok_or(ContentError::UnbalancedRestore)?;
        self.stream.restore_state()?;
        self.state = previous;
        Ok(())
    }

    fn transform(&mut self, matrix: &Matrix) {
        self.stream.transform(matrix);
        self.state.matrix = matrix.then(&self.state.matrix);
    }

    fn set_line_width(&mut self, width: f64) {
        self.stream.set_line_width(width);
        self.state.line_width = width.abs();
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.stream.set_line_cap(cap);
        self.state.line_cap = cap;
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.stream.set_line_join(join);
        self.state.line_join = join;
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.stream.set_miter_limit(limit);
        self.state.miter_limit = limit.abs();
    }

    fn set_dash(&mut self, pattern: &str) {
        self.stream.set_dash(pattern);
    }

    fn set_rendering_intent(&mut self, intent: &str) {
        self.stream.set_rendering_intent(intent);
    }

    fn set_stroke_gray(&mut self, gray: f64) {
        self.stream.set_stroke_gray(gray);
    }

    fn set_fill_gray(&mut self, gray: f64) {
        self.stream.set_fill_gray(gray);
    }

    fn set_stroke_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.stream.set_stroke_rgb(r, g, b);
    }

    fn set_fill_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.stream.set_fill_rgb(r, g, b);
    }

    fn set_stroke_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.stream.set_stroke_cmyk(c, m, y, k);
    }

    fn set_fill_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.stream.set_fill_cmyk(c, m, y, k);
    }

    fn set_fill_alpha(&mut self, alpha: f64) -> Result<()> {
        self.stream.set_fill_alpha(alpha)
    }

    fn set_stroke_alpha(&mut self, alpha: f64) -> Result<()> {
        self.stream.set_stroke_alpha(alpha)
    }

    fn set_blend_mode(&mut self, mode: &str) -> Result<()> {
        self.stream.set_blend_mode(mode)
    }

    fn set_graphics_state(&mut self, dict: Dictionary) -> Result<()> {
        self.stream.set_graphics_state(dict)
    }

    fn do_image(&mut self, image: ObjectId) -> Result<()> {
        self.stream.do_image(image)?;
        let rect = self.state.matrix.rect_bounds(0.0, 0.0, 1.0, 1.0);
        self.include(rect);
        Ok(())
    }

    fn do_form(&mut self, form: &FormXObject) -> Result<()> {
        self.stream.do_form(form)?;
        if !form.bounds.is_empty() {
            let b = form.bounds;
            let rect = self
                .state
                .matrix
                .rect_bounds(b.x(), b.y(), b.width(), b.height());
            self.include(rect);
        }
        Ok(())
    }

    fn begin_text(&mut self) {
        self.stream.begin_text();
        self.text_matrix = Matrix::IDENTITY;
        self.line_matrix = Matrix::IDENTITY;
    }

    fn end_text(&mut self) {
        self.stream.end_text();
    }

    fn set_font(&mut self, font: ObjectId, size: f64) -> Result<()> {
        self.stream.set_font(font, size)?;
        let info = self.stream.context().host()?.font_info(font);
        self.state.font = info.map(|info| (font, info));
        // a negative size mirrors the glyphs; the ink box is the same size
        self.state.font_size = size.abs();
        Ok(())
    }

    fn set_text_rendering_mode(&mut self, mode: TextRenderingMode) {
        self.stream.set_text_rendering_mode(mode);
        self.state.render_mode = mode;
    }

    fn set_character_spacing(&mut self, spacing: f64) {
        self.stream.set_character_spacing(spacing);
        self.state.char_spacing = spacing;
    }

    fn set_word_spacing(&mut self, spacing: f64) {
        self.stream.set_word_spacing(spacing);
        self.state.word_spacing = spacing;
    }

    fn set_horizontal_scaling(&mut self, scale: f64) {
        self.stream.set_horizontal_scaling(scale);
        self.state.horizontal_scaling = scale;
    }

    fn set_text_leading(&mut self, leading: f64) {
        self.stream.set_text_leading(leading);
        self.state.leading = leading;
    }

    fn set_text_rise(&mut self, rise: f64) {
        self.stream.set_text_rise(rise);
        self.state.rise = rise;
    }

    fn set_text_matrix(&mut self, matrix: &Matrix) {
        self.stream.set_text_matrix(matrix);
        self.text_matrix = *matrix;
        self.line_matrix = *matrix;
    }

    fn text_move(&mut self, tx: f64, ty: f64) {
        self.stream.text_move(tx, ty);
        self.line_matrix.pre_translate(tx, ty);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.stream.next_line();
        self.line_matrix.pre_translate(0.0, -self.state.leading);
        self.text_matrix = self.line_matrix;
    }

    fn show_text(&mut self, text: &str) -> Result<()> {
        self.stream.show_text(text)?;
        self.include_text(text)
    }
}
