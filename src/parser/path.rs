//! Vector path reconstruction.
//!
//! Painted paths become rectangular primitives: each subpath is reduced to
//! its bounding box, then classified as a filled [`ShapeRun`] or a stroked
//! [`BorderRun`]. Strokes thinner than their own width are hairlines and are
//! emitted as solid shapes instead of borders.

use crate::model::{BorderRun, BoundingBox, CssColor, Element, ShapeRun};

use super::raw::{PathOp, Point, RawDrawing, RawRect};

/// Split a path into subpaths and return the bounding rectangle of each.
///
/// A subpath ends at a move, a close, a rectangle or the end of the path.
/// Subpaths with fewer than two distinct points are dropped, as are
/// rectangles with zero extent on both axes.
pub fn subpath_bounds(ops: &[PathOp]) -> Vec<RawRect> {
    let mut rects = Vec::new();
    let mut points: Vec<Point> = Vec::new();

    let flush = |points: &mut Vec<Point>, rects: &mut Vec<RawRect>| {
        if distinct_points(points) >= 2 {
            if let Some(rect) = RawRect::bounding(points) {
                if rect.width() > 0.0 || rect.height() > 0.0 {
                    rects.push(rect);
                }
            }
        }
        points.clear();
    };

    for op in ops {
        match *op {
            PathOp::MoveTo(p) => {
                flush(&mut points, &mut rects);
                points.push(p);
            }
            PathOp::LineTo(p) => points.push(p),
            PathOp::CurveTo(c1, c2, p) => points.extend([c1, c2, p]),
            PathOp::Rect(rect) => {
                flush(&mut points, &mut rects);
                if rect.width() > 0.0 || rect.height() > 0.0 {
                    rects.push(rect);
                }
            }
            PathOp::Close | PathOp::NoOp => flush(&mut points, &mut rects),
        }
    }
    flush(&mut points, &mut rects);

    rects
}

fn distinct_points(points: &[Point]) -> usize {
    let mut seen: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if !seen.contains(p) {
            seen.push(*p);
        }
    }
    seen.len()
}

/// Convert one painted path into page primitives.
///
/// Fills come before strokes for the same subpath so that a filled and
/// stroked box paints its outline on top.
pub fn drawing_elements(
    drawing: &RawDrawing,
    page_height: f64,
    min_stroke_width: f64,
) -> Vec<Element> {
    let mut elements = Vec::new();

    for rect in subpath_bounds(&drawing.ops) {
        let bbox = BoundingBox::from_pdf_rect(rect.x0, rect.y0, rect.x1, rect.y1, page_height);
        if !bbox.is_finite() {
            continue;
        }

        if let Some(fill) = drawing.fill {
            if bbox.width > 0.0 && bbox.height > 0.0 {
                elements.push(Element::Shape(ShapeRun {
                    bbox,
                    fill: CssColor::from_unit(fill.r, fill.g, fill.b, drawing.fill_opacity),
                }));
            }
        }

        if let Some(stroke) = drawing.stroke {
            if !(drawing.stroke_width.is_finite() && drawing.stroke_width > 0.0) {
                continue;
            }
            let width = drawing.stroke_width.max(min_stroke_width);
            let color = CssColor::from_unit(stroke.r, stroke.g, stroke.b, drawing.stroke_opacity);
            elements.push(stroke_element(bbox, color, width));
        }
    }

    elements
}

/// A stroke around `bbox`: a border when the box is wider and taller than
/// the stroke, otherwise a solid bar centered on the path.
fn stroke_element(bbox: BoundingBox, color: CssColor, width: f64) -> Element {
    if bbox.width <= width || bbox.height <= width {
        let bar_width = bbox.width.max(width);
        let bar_height = bbox.height.max(width);
        Element::Shape(ShapeRun {
            bbox: BoundingBox::new(
                bbox.left - (bar_width - bbox.width) / 2.0,
                bbox.top - (bar_height - bbox.height) / 2.0,
                bar_width,
                bar_height,
            ),
            fill: color,
        })
    } else {
        Element::Border(BorderRun {
            bbox: bbox.inflate(width / 2.0),
            color,
            width,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::raw::RawColor;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_subpaths_split_on_move_and_close() {
        let ops = vec![
            PathOp::MoveTo(p(0.0, 0.0)),
            PathOp::LineTo(p(10.0, 0.0)),
            PathOp::LineTo(p(10.0, 10.0)),
            PathOp::Close,
            PathOp::MoveTo(p(20.0, 20.0)),
            PathOp::LineTo(p(30.0, 25.0)),
        ];
        let rects = subpath_bounds(&ops);
        assert_eq!(
            rects,
            vec![
                RawRect::new(0.0, 0.0, 10.0, 10.0),
                RawRect::new(20.0, 20.0, 30.0, 25.0)
            ]
        );
    }

    #[test]
    fn test_single_point_subpath_dropped() {
        let ops = vec![
            PathOp::MoveTo(p(5.0, 5.0)),
            PathOp::LineTo(p(5.0, 5.0)),
            PathOp::Close,
        ];
        assert!(subpath_bounds(&ops).is_empty());
    }

    #[test]
    fn test_curve_control_points_extend_bounds() {
        let ops = vec![
            PathOp::MoveTo(p(0.0, 0.0)),
            PathOp::CurveTo(p(0.0, 20.0), p(10.0, 20.0), p(10.0, 0.0)),
        ];
        assert_eq!(subpath_bounds(&ops), vec![RawRect::new(0.0, 0.0, 10.0, 20.0)]);
    }

    #[test]
    fn test_zero_area_rect_dropped() {
        let ops = vec![
            PathOp::Rect(RawRect::new(3.0, 3.0, 3.0, 3.0)),
            PathOp::Rect(RawRect::new(0.0, 0.0, 50.0, 0.0)),
        ];
        assert_eq!(subpath_bounds(&ops), vec![RawRect::new(0.0, 0.0, 50.0, 0.0)]);
    }

    #[test]
    fn test_filled_rect_becomes_shape() {
        let drawing = RawDrawing {
            ops: vec![PathOp::Rect(RawRect::new(10.0, 20.0, 110.0, 70.0))],
            fill: Some(RawColor::rgb(1.0, 0.0, 0.0)),
            ..Default::default()
        };
        let elements = drawing_elements(&drawing, 300.0, 1.0);
        assert_eq!(elements.len(), 1);
        match &elements[0] {
            Element::Shape(shape) => {
                assert_eq!(shape.bbox, BoundingBox::new(10.0, 230.0, 100.0, 50.0));
                assert_eq!(shape.fill.to_css(), "rgb(255, 0, 0)");
            }
            other => panic!("expected shape, got {:?}", other),
        }
    }

    #[test]
    fn test_stroked_rect_becomes_border() {
        let drawing = RawDrawing {
            ops: vec![PathOp::Rect(RawRect::new(10.0, 10.0, 60.0, 40.0))],
            stroke: Some(RawColor::gray(0.0)),
            stroke_width: 2.0,
            ..Default::default()
        };
        let elements = drawing_elements(&drawing, 100.0, 1.0);
        match &elements[..] {
            [Element::Border(border)] => {
                assert_eq!(border.width, 2.0);
                assert_eq!(border.bbox, BoundingBox::new(9.0, 59.0, 52.0, 32.0));
            }
            other => panic!("expected one border, got {:?}", other),
        }
    }

    #[test]
    fn test_hairline_becomes_shape() {
        let drawing = RawDrawing {
            ops: vec![PathOp::MoveTo(p(0.0, 50.0)), PathOp::LineTo(p(100.0, 50.0))],
            stroke: Some(RawColor::gray(0.0)),
            stroke_width: 0.5,
            ..Default::default()
        };
        let elements = drawing_elements(&drawing, 100.0, 1.0);
        match &elements[..] {
            [Element::Shape(shape)] => {
                assert_eq!(shape.bbox, BoundingBox::new(0.0, 49.5, 100.0, 1.0));
            }
            other => panic!("expected one shape, got {:?}", other),
        }
    }

    #[test]
    fn test_fill_and_stroke_emit_both() {
        let drawing = RawDrawing {
            ops: vec![PathOp::Rect(RawRect::new(0.0, 0.0, 40.0, 40.0))],
            fill: Some(RawColor::gray(1.0)),
            stroke: Some(RawColor::gray(0.0)),
            stroke_width: 1.0,
            ..Default::default()
        };
        let elements = drawing_elements(&drawing, 40.0, 1.0);
        assert_eq!(elements.len(), 2);
        assert!(matches!(elements[0], Element::Shape(_)));
        assert!(matches!(elements[1], Element::Border(_)));
    }

    #[test]
    fn test_zero_width_stroke_ignored() {
        let drawing = RawDrawing {
            ops: vec![PathOp::Rect(RawRect::new(0.0, 0.0, 40.0, 40.0))],
            stroke: Some(RawColor::gray(0.0)),
            stroke_width: 0.0,
            ..Default::default()
        };
        assert!(drawing_elements(&drawing, 40.0, 1.0).is_empty());
    }

    #[test]
    fn test_translucent_fill() {
        let drawing = RawDrawing {
            ops: vec![PathOp::Rect(RawRect::new(0.0, 0.0, 10.0, 10.0))],
            fill: Some(RawColor::rgb(0.0, 0.0, 1.0)),
            fill_opacity: 0.5,
            ..Default::default()
        };
        let elements = drawing_elements(&drawing, 10.0, 1.0);
        match &elements[..] {
            [Element::Shape(shape)] => assert_eq!(shape.fill.to_css(), "rgba(0, 0, 255, 0.5)"),
            other => panic!("expected one shape, got {:?}", other),
        }
    }
}
