use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::SvgaResult;
use crate::model::ShapeKind;
use crate::render::path::parse_path;

/// Circle-to-cubic Bézier handle length factor.
pub const KAPPA: f64 = 0.5522848;

/// Build the outline of any shape variant.
pub fn shape_path(kind: &ShapeKind) -> SvgaResult<BezPath> {
    match kind {
        ShapeKind::Path { d } => parse_path(d),
        ShapeKind::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
        } => Ok(ellipse_path(*x, *y, *radius_x, *radius_y)),
        ShapeKind::Rect {
            x,
            y,
            width,
            height,
            corner_radius,
        } => Ok(rounded_rect_path(*x, *y, *width, *height, *corner_radius)),
    }
}

/// Ellipse centred at `(cx, cy)` as four cubic arcs.
pub fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> BezPath {
    let ox = rx * KAPPA;
    let oy = ry * KAPPA;
    let (xs, ys, xe, ye) = (cx - rx, cy - ry, cx + rx, cy + ry);

    let mut p = BezPath::new();
    p.move_to((xs, cy));
    p.curve_to((xs, cy - oy), (cx - ox, ys), (cx, ys));
    p.curve_to((cx + ox, ys), (xe, cy - oy), (xe, cy));
    p.curve_to((xe, cy + oy), (cx + ox, ye), (cx, ye));
    p.curve_to((cx - ox, ye), (xs, cy + oy), (xs, cy));
    p.close_path();
    p
}

/// Clamp a corner radius so that `2 * radius` never exceeds the shorter side.
pub fn clamp_corner_radius(width: f64, height: f64, radius: f64) -> f64 {
    let limit = width.abs().min(height.abs()) / 2.0;
    radius.max(0.0).min(limit)
}

/// Rectangle with four rounded corners (one arc per corner, clockwise from top-left).
pub fn rounded_rect_path(x: f64, y: f64, width: f64, height: f64, radius: f64) -> BezPath {
    let r = clamp_corner_radius(width, height, radius);
    let (l, t, rt, b) = (x, y, x + width, y + height);

    let mut p = BezPath::new();
    p.move_to((l + r, t));
    p.line_to((rt - r, t));
    corner(&mut p, Point::new(rt, t), Point::new(rt, t + r), r);
    p.line_to((rt, b - r));
    corner(&mut p, Point::new(rt, b), Point::new(rt - r, b), r);
    p.line_to((l + r, b));
    corner(&mut p, Point::new(l, b), Point::new(l, b - r), r);
    p.line_to((l, t + r));
    corner(&mut p, Point::new(l, t), Point::new(l + r, t), r);
    p.close_path();
    p
}

/// Quarter arc from the path's current point around `apex` to `end`.
fn corner(p: &mut BezPath, apex: Point, end: Point, r: f64) {
    if r <= 0.0 {
        return;
    }
    let start = match p.elements().last() {
        Some(el) => el.end_point().unwrap_or(apex),
        None => apex,
    };
    let c1 = start.lerp(apex, KAPPA);
    let c2 = end.lerp(apex, KAPPA);
    p.curve_to(c1, c2, end);
}
