use std::fmt;

use crate::format::fmt_num;

/// Affine transform `[a b c d e f]` as written by the `cm` and `Tm` operators.
///
/// Points map as `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotation_degrees(degrees: f64) -> Self {
        let radians = degrees.to_radians();
        let (sin, cos) = (libm::sin(radians), libm::cos(radians));
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Transform that applies `self` first and `next` second.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Prepends a translation, so it acts in this matrix's input space.
    pub fn pre_translate(&mut self, tx: f64, ty: f64) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    /// Prepends a scale, so it acts in this matrix's input space.
    pub fn pre_scale(&mut self, sx: f64, sy: f64) {
        self.a *= sx;
        self.b *= sx;
        self.c *= sy;
        self.d *= sy;
    }

    /// Squared horizontal stretch of a unit circle under this transform.
    pub fn x_scale_squared(&self) -> f64 {
        self.a * self.a + self.c * self.c
    }

    /// Squared vertical stretch of a unit circle under this transform.
    pub fn y_scale_squared(&self) -> f64 {
        self.b * self.b + self.d * self.d
    }

    /// Device-space bounds of the user-space rectangle at `(x, y)`.
    pub fn rect_bounds(&self, x: f64, y: f64, width: f64, height: f64) -> BoundsRect {
        let (tx, ty) = self.apply(x, y);
        let (wx, wy) = (width * self.a, width * self.b);
        let (hx, hy) = (height * self.c, height * self.d);
        BoundsRect::new(
            tx + wx.min(0.0) + hx.min(0.0),
            ty + wy.min(0.0) + hy.min(0.0),
            wx.abs() + hx.abs(),
            wy.abs() + hy.abs(),
        )
    }
}

/// Axis-aligned box stored as `[x0, x1] x [y0, y1]`.
///
/// An inverted axis means empty; infinite limits mean unbounded. Zero extent is
/// a real box (a horizontal line still has a y position).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsRect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Default for BoundsRect {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundsRect {
    pub const EMPTY: BoundsRect = BoundsRect {
        x0: f64::INFINITY,
        y0: f64::INFINITY,
        x1: f64::NEG_INFINITY,
        y1: f64::NEG_INFINITY,
    };

    pub const UNBOUNDED: BoundsRect = BoundsRect {
        x0: f64::NEG_INFINITY,
        y0: f64::NEG_INFINITY,
        x1: f64::INFINITY,
        y1: f64::INFINITY,
    };

    /// Box from a position and an extent; negative extents are normalized.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners((x, y), (x + width, y + height))
    }

    pub fn from_corners(p: (f64, f64), q: (f64, f64)) -> Self {
        Self {
            x0: p.0.min(q.0),
            y0: p.1.min(q.1),
            x1: p.0.max(q.0),
            y1: p.1.max(q.1),
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.x0 <= self.x1 && self.y0 <= self.y1)
    }

    pub fn is_unbounded(&self) -> bool {
        self.x0 == f64::NEG_INFINITY
            || self.y0 == f64::NEG_INFINITY
            || self.x1 == f64::INFINITY
            || self.y1 == f64::INFINITY
    }

    pub fn x(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.x0 }
    }

    pub fn y(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.y0 }
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.x1 - self.x0 }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.y1 - self.y0 }
    }

    pub fn right(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.x1 }
    }

    pub fn top(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.y1 }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn contains(&self, other: &BoundsRect) -> bool {
        other.is_empty()
            || (other.x0 >= self.x0
                && other.x1 <= self.x1
                && other.y0 >= self.y0
                && other.y1 <= self.y1)
    }

    /// Grows to cover `other`. Empty contributions are ignored.
    pub fn union(&mut self, other: &BoundsRect) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }
        self.x0 = self.x0.min(other.x0);
        self.y0 = self.y0.min(other.y0);
        self.x1 = self.x1.max(other.x1);
        self.y1 = self.y1.max(other.y1);
    }

    pub fn union_point(&mut self, x: f64, y: f64) {
        self.union(&BoundsRect::point(x, y));
    }

    /// Shrinks to the overlap with `other`; no overlap leaves the box empty.
    pub fn intersect(&mut self, other: &BoundsRect) {
        self.x0 = self.x0.max(other.x0);
        self.y0 = self.y0.max(other.y0);
        self.x1 = self.x1.min(other.x1);
        self.y1 = self.y1.min(other.y1);
        if self.is_empty() {
            *self = Self::EMPTY;
        }
    }

    pub fn intersection(&self, other: &BoundsRect) -> BoundsRect {
        let mut out = *self;
        out.intersect(other);
        out
    }

    pub fn inflate(&mut self, dx: f64, dy: f64) {
        if self.is_empty() {
            return;
        }
        self.x0 -= dx;
        self.x1 += dx;
        self.y0 -= dy;
        self.y1 += dy;
    }
}

impl fmt::Display for BoundsRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            fmt_num(self.x()),
            fmt_num(self.y()),
            fmt_num(self.right()),
            fmt_num(self.top())
        )
    }
}

const CUBIC_SUBDIVISIONS: u32 = 4;

/// Bounds of a cubic bezier given in device space.
///
/// Never smaller than the curve; tighter than the control hull whenever a
/// control point lies outside the endpoint range.
pub fn cubic_bounds(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64)) -> BoundsRect {
    let (x0, x1) = cubic_axis_extent(p0.0, p1.0, p2.0, p3.0, CUBIC_SUBDIVISIONS);
    let (y0, y1) = cubic_axis_extent(p0.1, p1.1, p2.1, p3.1, CUBIC_SUBDIVISIONS);
    BoundsRect { x0, y0, x1, y1 }
}

fn cubic_axis_extent(p0: f64, p1: f64, p2: f64, p3: f64, depth: u32) -> (f64, f64) {
    let lo = p0.min(p3);
    let hi = p0.max(p3);
    let inside = |v: f64| v >= lo && v <= hi;
    if inside(p1) && inside(p2) {
        return (lo, hi);
    }
    if depth == 0 {
        return (lo.min(p1).min(p2), hi.max(p1).max(p2));
    }
    let p01 = (p0 + p1) * 0.5;
    let p12 = (p1 + p2) * 0.5;
    let p23 = (p2 + p3) * 0.5;
    let p012 = (p01 + p12) * 0.5;
    let p123 = (p12 + p23) * 0.5;
    let mid = (p012 + p123) * 0.5;
    let (a0, a1) = cubic_axis_extent(p0, p01, p012, mid, depth - 1);
    let (b0, b1) = cubic_axis_extent(mid, p123, p23, p3, depth - 1);
    (a0.min(b0), a1.max(b1))
}

/// Elliptical arc approximated by a fixed number of cubic segments.
///
/// Angles are in degrees; the ellipse is rotated by `rotation` about its
/// center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalArc {
    pub cx: f64,
    pub cy: f64,
    pub rx: f64,
    pub ry: f64,
    pub start: f64,
    pub end: f64,
    pub rotation: f64,
}

impl EllipticalArc {
    pub const SEGMENTS: usize = 8;

    /// Full ellipse, swept from 0 to 360 degrees.
    pub fn new(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Self {
            cx,
            cy,
            rx,
            ry,
            start: 0.0,
            end: 360.0,
            rotation: 0.0,
        }
    }

    pub fn with_sweep(mut self, start: f64, end: f64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Start point followed by three points (two controls, one end) per
    /// segment.
    pub fn points(&self) -> [(f64, f64); Self::SEGMENTS * 3 + 1] {
        let start = self.start.to_radians();
        let delta = (self.end.to_radians() - start) / Self::SEGMENTS as f64;
        let half = delta * 0.5;
        let kappa = if half == 0.0 {
            0.0
        } else {
            4.0 * (1.0 - libm::cos(half)) / (3.0 * libm::sin(half))
        };

        let mut local = [(0.0, 0.0); Self::SEGMENTS * 3 + 1];
        for i in 0..=Self::SEGMENTS {
            let angle = start + delta * i as f64;
            let (sin, cos) = (libm::sin(angle), libm::cos(angle));
            let (x, y) = (self.rx * cos, self.ry * sin);
            let (dx, dy) = (-kappa * self.rx * sin, kappa * self.ry * cos);
            let n = i * 3;
            local[n] = (x, y);
            if i < Self::SEGMENTS {
                local[n + 1] = (x + dx, y + dy);
            }
            if i > 0 {
                local[n - 1] = (x - dx, y - dy);
            }
        }

        let placement =
            Matrix::rotation_degrees(self.rotation).then(&Matrix::translation(self.cx, self.cy));
        local.map(|(x, y)| placement.apply(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * (1.0 + a.abs().max(b.abs()))
    }

    fn random_matrix(rng: &mut StdRng) -> Matrix {
        Matrix::new(
            rng.random_range(-3.0..3.0),
            rng.random_range(-3.0..3.0),
            rng.random_range(-3.0..3.0),
            rng.random_range(-3.0..3.0),
            rng.random_range(-100.0..100.0),
            rng.random_range(-100.0..100.0),
        )
    }

    fn random_rect(rng: &mut StdRng) -> BoundsRect {
        BoundsRect::new(
            rng.random_range(-50.0..50.0),
            rng.random_range(-50.0..50.0),
            rng.random_range(0.0..40.0),
            rng.random_range(0.0..40.0),
        )
    }

    #[test]
    fn then_applies_left_matrix_first() {
        let scale = Matrix::scaling(2.0, 3.0);
        let shift = Matrix::translation(10.0, 20.0);
        assert_eq!(scale.then(&shift).apply(1.0, 1.0), (12.0, 23.0));
        assert_eq!(shift.then(&scale).apply(1.0, 1.0), (22.0, 63.0));
    }

    #[test]
    fn composition_is_associative() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let (a, b, c) = (
                random_matrix(&mut rng),
                random_matrix(&mut rng),
                random_matrix(&mut rng),
            );
            let left = a.then(&b).then(&c);
            let right = a.then(&b.then(&c));
            let (x, y) = (rng.random_range(-10.0..10.0), rng.random_range(-10.0..10.0));
            let (lx, ly) = left.apply(x, y);
            let (rx, ry) = right.apply(x, y);
            assert!(close(lx, rx) && close(ly, ry));
            let (sx, sy) = a.apply(x, y);
            let (sx, sy) = b.apply(sx, sy);
            let (sx, sy) = c.apply(sx, sy);
            assert!(close(lx, sx) && close(ly, sy));
        }
    }

    #[test]
    fn pre_operations_act_in_input_space() {
        let base = Matrix::new(0.0, 1.0, -1.0, 0.0, 5.0, 5.0);
        let mut m = base;
        m.pre_translate(2.0, 3.0);
        let (x, y) = base.apply(3.0, 4.0);
        assert_eq!(m.apply(1.0, 1.0), (x, y));

        let mut s = base;
        s.pre_scale(2.0, 0.5);
        assert_eq!(s.apply(1.0, 4.0), base.apply(2.0, 2.0));
    }

    #[test]
    fn rect_bounds_cover_transformed_corners() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let m = random_matrix(&mut rng);
            let (x, y) = (rng.random_range(-20.0..20.0), rng.random_range(-20.0..20.0));
            let (w, h) = (rng.random_range(-30.0..30.0), rng.random_range(-30.0..30.0));
            let mut expected = BoundsRect::EMPTY;
            for (px, py) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
                let (tx, ty) = m.apply(px, py);
                expected.union_point(tx, ty);
            }
            let got = m.rect_bounds(x, y, w, h);
            assert!(close(got.x(), expected.x()) && close(got.y(), expected.y()));
            assert!(close(got.right(), expected.right()) && close(got.top(), expected.top()));
        }
    }

    #[test]
    fn union_never_shrinks_and_intersection_never_grows() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let a = random_rect(&mut rng);
            let b = random_rect(&mut rng);
            let mut u = a;
            u.union(&b);
            assert!(u.contains(&a) && u.contains(&b));
            let i = a.intersection(&b);
            assert!(a.contains(&i) && b.contains(&i));
        }
    }

    #[test]
    fn empty_contributions_are_ignored() {
        let mut r = BoundsRect::new(1.0, 2.0, 3.0, 4.0);
        r.union(&BoundsRect::EMPTY);
        assert_eq!(r, BoundsRect::new(1.0, 2.0, 3.0, 4.0));

        let mut e = BoundsRect::EMPTY;
        e.union(&r);
        assert_eq!(e, r);
        assert_eq!(BoundsRect::EMPTY.width(), 0.0);
        assert_eq!(BoundsRect::EMPTY.to_string(), "0 0 0 0");
    }

    #[test]
    fn zero_height_contribution_keeps_its_position() {
        let mut r = BoundsRect::new(0.0, 0.0, 10.0, 10.0);
        r.union(&BoundsRect::from_corners((0.0, 50.0), (20.0, 50.0)));
        assert_eq!((r.x(), r.y(), r.right(), r.top()), (0.0, 0.0, 20.0, 50.0));
    }

    #[test]
    fn unbounded_only_shrinks_by_intersection() {
        let mut clip = BoundsRect::UNBOUNDED;
        assert!(clip.is_unbounded());
        clip.intersect(&BoundsRect::new(0.0, 0.0, 100.0, 50.0));
        assert_eq!(clip, BoundsRect::new(0.0, 0.0, 100.0, 50.0));
        clip.intersect(&BoundsRect::new(200.0, 0.0, 10.0, 10.0));
        assert!(clip.is_empty());
    }

    #[test]
    fn display_writes_pdf_box_order() {
        let r = BoundsRect::new(1.5, -2.0, 10.0, 4.25);
        assert_eq!(r.to_string(), "1.5 -2 11.5 2.25");
    }

    fn sample_cubic(p: [(f64, f64); 4], t: f64) -> (f64, f64) {
        let mt = 1.0 - t;
        let w = [mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t];
        (
            w[0] * p[0].0 + w[1] * p[1].0 + w[2] * p[2].0 + w[3] * p[3].0,
            w[0] * p[0].1 + w[1] * p[1].1 + w[2] * p[2].1 + w[3] * p[3].1,
        )
    }

    #[test]
    fn cubic_bounds_contain_the_curve_and_stay_tight() {
        let mut rng = StdRng::seed_from_u64(0xbe21e7);
        for _ in 0..200 {
            let mut p = [(0.0, 0.0); 4];
            for point in p.iter_mut() {
                *point = (
                    rng.random_range(-100.0..100.0),
                    rng.random_range(-100.0..100.0),
                );
            }
            let bounds = cubic_bounds(p[0], p[1], p[2], p[3]);
            let mut sampled = BoundsRect::EMPTY;
            for step in 0..=2_000 {
                let (x, y) = sample_cubic(p, step as f64 / 2_000.0);
                sampled.union_point(x, y);
                assert!(bounds.contains_point(x, y) || {
                    let mut grown = bounds;
                    grown.inflate(1e-9, 1e-9);
                    grown.contains_point(x, y)
                });
            }
            assert!(bounds.x() >= sampled.x() - 1.0);
            assert!(bounds.right() <= sampled.right() + 1.0);
            assert!(bounds.y() >= sampled.y() - 1.0);
            assert!(bounds.top() <= sampled.top() + 1.0);
        }
    }

    #[test]
    fn cubic_bounds_beat_the_control_hull() {
        let bounds = cubic_bounds((0.0, 0.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0));
        assert!(bounds.top() >= 75.0);
        assert!(bounds.top() < 76.0);
        assert_eq!(bounds.y(), 0.0);
    }

    fn arc_bounds(arc: &EllipticalArc) -> BoundsRect {
        let pts = arc.points();
        let mut out = BoundsRect::EMPTY;
        for seg in 0..EllipticalArc::SEGMENTS {
            let n = seg * 3;
            out.union(&cubic_bounds(pts[n], pts[n + 1], pts[n + 2], pts[n + 3]));
        }
        out
    }

    #[test]
    fn full_arc_matches_ellipse_bounds() {
        let arc = EllipticalArc::new(200.0, 300.0, 100.0, 50.0);
        let b = arc_bounds(&arc);
        let tol_x = 200.0 * 0.005;
        let tol_y = 100.0 * 0.005;
        assert!((b.x() - 100.0).abs() < tol_x && (b.right() - 300.0).abs() < tol_x);
        assert!((b.y() - 250.0).abs() < tol_y && (b.top() - 350.0).abs() < tol_y);
    }

    #[test]
    fn rotated_arc_swaps_extents() {
        let arc = EllipticalArc::new(0.0, 0.0, 100.0, 50.0).with_rotation(90.0);
        let b = arc_bounds(&arc);
        assert!((b.width() - 100.0).abs() < 1.0);
        assert!((b.height() - 200.0).abs() < 1.0);
    }

    #[test]
    fn arc_starts_and_ends_on_the_sweep() {
        let arc = EllipticalArc::new(10.0, 10.0, 5.0, 5.0).with_sweep(0.0, 90.0);
        let pts = arc.points();
        assert!(close(pts[0].0, 15.0) && close(pts[0].1, 10.0));
        let last = pts[pts.len() - 1];
        assert!((last.0 - 10.0).abs() < 1e-9 && (last.1 - 15.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_sweep_collapses_to_a_point() {
        let arc = EllipticalArc::new(0.0, 0.0, 5.0, 5.0).with_sweep(45.0, 45.0);
        let pts = arc.points();
        assert!(pts.iter().all(|p| close(p.0, pts[0].0) && close(p.1, pts[0].1)));
    }
}
