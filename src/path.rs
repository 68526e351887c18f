use crate::content::ContentOps;
use crate::error::{ContentError, Result};
use crate::geometry::EllipticalArc;

/// Point-type bytes accepted by [`Path::from_points`].
pub mod point_type {
    pub const START: u8 = 0x00;
    pub const LINE: u8 = 0x01;
    pub const BEZIER: u8 = 0x03;
    pub const TYPE_MASK: u8 = 0x07;
    pub const CLOSE_SUBPATH: u8 = 0x80;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    NonZero,
    #[default]
    EvenOdd,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    CurveTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    ClosePath,
}

/// A recorded path that can be replayed into any builder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
    fill_rule: FillRule,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = rule;
        self
    }

    /// Builds a path from parallel point and point-type arrays.
    ///
    /// A bezier takes three consecutive `BEZIER` points; `CLOSE_SUBPATH` may be
    /// or-ed onto the last point of a subpath.
    pub fn from_points(points: &[(f64, f64)], types: &[u8]) -> Result<Self> {
        if points.len() != types.len() {
            return Err(ContentError::MismatchedPathArrays {
                points: points.len(),
                types: types.len(),
            });
        }
        let mut path = Path::new();
        let mut i = 0;
        while i < points.len() {
            let kind = types[i] & point_type::TYPE_MASK;
            let (x, y) = points[i];
            let last = match kind {
                point_type::START => {
                    path.move_to(x, y);
                    i
                }
                point_type::LINE => {
                    path.line_to(x, y);
                    i
                }
                point_type::BEZIER => {
                    let end = i + 2;
                    let run = types.get(i..=end).ok_or(ContentError::InvalidPathPointType {
                        index: i,
                        value: types[i],
                    })?;
                    if let Some(offset) = run
                        .iter()
                        .position(|t| t & point_type::TYPE_MASK != point_type::BEZIER)
                    {
                        return Err(ContentError::InvalidPathPointType {
                            index: i + offset,
                            value: run[offset],
                        });
                    }
                    let (x2, y2) = points[i + 1];
                    let (x3, y3) = points[end];
                    path.curve_to(x, y, x2, y2, x3, y3);
                    end
                }
                _ => {
                    return Err(ContentError::InvalidPathPointType {
                        index: i,
                        value: types[i],
                    });
                }
            };
            if types[last] & point_type::CLOSE_SUBPATH != 0 {
                path.close();
            }
            i = last + 1;
        }
        Ok(path)
    }

    /// Closed polygon through `points`.
    pub fn polygon(points: &[(f64, f64)]) -> Self {
        let mut path = Path::new();
        let mut iter = points.iter();
        if let Some((x, y)) = iter.next() {
            path.move_to(*x, *y);
            for (x, y) in iter {
                path.line_to(*x, *y);
            }
            path.close();
        }
        path
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.segments.push(PathSegment::LineTo { x, y });
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.segments.push(PathSegment::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.segments.push(PathSegment::Rect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn arc(&mut self, arc: &EllipticalArc, move_to_start: bool) {
        let points = arc.points();
        if move_to_start {
            self.move_to(points[0].0, points[0].1);
        }
        for seg in points[1..].chunks_exact(3) {
            self.curve_to(seg[0].0, seg[0].1, seg[1].0, seg[1].1, seg[2].0, seg[2].1);
        }
    }

    pub fn close(&mut self) {
        self.segments.push(PathSegment::ClosePath);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Replays the segments without painting.
    pub fn append_to<C: ContentOps + ?Sized>(&self, out: &mut C) {
        for segment in &self.segments {
            match *segment {
                PathSegment::MoveTo { x, y } => out.move_to(x, y),
                PathSegment::LineTo { x, y } => out.line_to(x, y),
                PathSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => out.bezier_to(x1, y1, x2, y2, x, y),
                PathSegment::Rect {
                    x,
                    y,
                    width,
                    height,
                } => out.rect(x, y, width, height),
                PathSegment::ClosePath => out.close_path(),
            }
        }
    }

    pub fn fill<C: ContentOps + ?Sized>(&self, out: &mut C) {
        self.append_to(out);
        match self.fill_rule {
            FillRule::NonZero => out.fill(),
            FillRule::EvenOdd => out.fill_even_odd(),
        }
    }

    pub fn stroke<C: ContentOps + ?Sized>(&self, out: &mut C) {
        self.append_to(out);
        out.stroke();
    }

    pub fn clip<C: ContentOps + ?Sized>(&self, out: &mut C) {
        self.append_to(out);
        match self.fill_rule {
            FillRule::NonZero => out.clip(),
            FillRule::EvenOdd => out.clip_even_odd(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::point_type::*;
    use super::*;
    use crate::content::ContentStream;
    use crate::context::DocContext;
    use crate::document::LopdfHost;

    #[test]
    fn mismatched_arrays_are_rejected() {
        let err = Path::from_points(&[(0.0, 0.0), (1.0, 1.0)], &[START]).unwrap_err();
        assert!(matches!(
            err,
            ContentError::MismatchedPathArrays {
                points: 2,
                types: 1
            }
        ));
    }

    #[test]
    fn bezier_runs_take_three_points() {
        let path = Path::from_points(
            &[(0.0, 0.0), (1.0, 2.0), (3.0, 4.0), (5.0, 6.0)],
            &[START, BEZIER, BEZIER, BEZIER | CLOSE_SUBPATH],
        )
        .expect("path");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::MoveTo { x: 0.0, y: 0.0 },
                PathSegment::CurveTo {
                    x1: 1.0,
                    y1: 2.0,
                    x2: 3.0,
                    y2: 4.0,
                    x: 5.0,
                    y: 6.0
                },
                PathSegment::ClosePath,
            ]
        );
    }

    #[test]
    fn short_or_broken_bezier_runs_fail() {
        let short = Path::from_points(&[(0.0, 0.0), (1.0, 1.0)], &[START, BEZIER]).unwrap_err();
        assert!(matches!(short, ContentError::InvalidPathPointType { index: 1, .. }));

        let broken = Path::from_points(
            &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)],
            &[START, BEZIER, LINE, BEZIER],
        )
        .unwrap_err();
        assert!(matches!(
            broken,
            ContentError::InvalidPathPointType { index: 2, value: 1 }
        ));

        let unknown = Path::from_points(&[(0.0, 0.0)], &[0x05]).unwrap_err();
        assert!(matches!(unknown, ContentError::InvalidPathPointType { index: 0, value: 5 }));
    }

    #[test]
    fn fill_rule_picks_the_operator() {
        let ctx = DocContext::new(LopdfHost::new());
        let mut cs = ContentStream::new(&ctx);
        let tri = Path::polygon(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
        tri.fill(&mut cs);
        tri.clone().with_fill_rule(FillRule::NonZero).clip(&mut cs);
        let mut boxed = Path::new();
        boxed.rect(1.0, 1.0, 2.0, 2.0);
        cs.append_path(&boxed);
        boxed.stroke(&mut cs);
        assert_eq!(
            cs.contents(),
            " 0 0 m 10 0 l 5 8 l h f* 0 0 m 10 0 l 5 8 l h W n 1 1 2 2 re 1 1 2 2 re S"
        );
    }

    #[test]
    fn empty_polygon_is_empty() {
        assert!(Path::polygon(&[]).is_empty());
        let mut arc = Path::new();
        arc.arc(&EllipticalArc::new(0.0, 0.0, 1.0, 1.0), true);
        assert_eq!(arc.segments().len(), 1 + EllipticalArc::SEGMENTS);
    }
}
