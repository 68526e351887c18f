mod bounded;
mod cache;
mod content;
mod context;
mod document;
mod error;
mod font;
mod format;
mod geometry;
mod host;
mod path;
mod raster;
mod resources;
mod validate;

pub use bounded::{BoundedContent, FormXObject};
pub use cache::DocumentCache;
pub use content::{
    Container, ContentOps, ContentStream, LineCap, LineJoin, TextRenderingMode,
};
pub use context::{ContentOptions, DocContext};
pub use document::LopdfHost;
pub use error::{ContentError, Result};
pub use font::{FontMetrics, TextEncoding, win_ansi_char, win_ansi_code};
pub use format::{
    DECIMAL_PLACES, escape_pdf_bytes, fmt_num, format_dash, hex_pdf_bytes, quantize,
};
pub use geometry::{BoundsRect, EllipticalArc, Matrix, cubic_bounds};
pub use host::{ContentHost, FontInfo, ResourceCategory};
pub use lopdf::ObjectId;
pub use path::{FillRule, Path, PathSegment, point_type};
pub use raster::RasterImage;
