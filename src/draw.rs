//! Construction of scene primitives from graph entities.
//!
//! These helpers return the primitives they create instead of mutating the
//! scene, so the caller decides whether each batch is staged (temporary) or
//! committed (permanent) and can later remove exactly what was created.

use kurbo::Point;

use crate::{
    error::FieldframeResult,
    geometry::{arrow_stub, shrink},
    model::{FieldTriangle, PlanGraph, PortalId},
    scene::{FillStyle, LineStyle, MarkerStyle, Primitive},
};

/// Stroke width of the arrowhead stub, thicker than the edge itself.
const ARROW_WIDTH_PX: f64 = 6.0;

/// A straight segment between two portals in the given style. When
/// `directional`, a short thick stub near the target end suggests an
/// arrowhead. Does not mutate the graph.
pub fn edge_primitives(
    graph: &PlanGraph,
    s: PortalId,
    t: PortalId,
    style: LineStyle,
    directional: bool,
) -> FieldframeResult<Vec<Primitive>> {
    let from = graph.portal(s)?.xy;
    let to = graph.portal(t)?.xy;

    let mut out = vec![Primitive::Segment { from, to, style }];
    if directional {
        let (stub_from, stub_to) = arrow_stub(from, to);
        out.push(Primitive::Segment {
            from: stub_from,
            to: stub_to,
            style: LineStyle {
                color: style.color,
                width_px: ARROW_WIDTH_PX,
                dash: None,
            },
        });
    }
    Ok(out)
}

pub fn marker(at: Point, style: MarkerStyle) -> Primitive {
    Primitive::Marker { at, style }
}

/// A filled field polygon, shrunk toward its centroid so the fill stays inside
/// the links bounding it. Borderless; the fill color carries the alpha.
pub fn field_polygon(
    graph: &PlanGraph,
    tri: &FieldTriangle,
    fill: FillStyle,
) -> FieldframeResult<Primitive> {
    let mut points = Vec::with_capacity(3);
    for v in tri.vertices() {
        points.push(graph.portal(v)?.xy);
    }
    Ok(Primitive::Polygon {
        points: shrink(&points),
        fill,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Portal, Special};
    use crate::scene::Rgba8;

    fn graph_two() -> PlanGraph {
        let mut graph = PlanGraph::default();
        for (i, (x, y)) in [(0.0, 0.0), (10.0, 0.0)].into_iter().enumerate() {
            graph.portals.insert(
                PortalId(i as u32),
                Portal {
                    name: format!("P{i}"),
                    xy: Point::new(x, y),
                    pll: "0,0".to_string(),
                    special: Special::None,
                },
            );
        }
        graph
    }

    fn style() -> LineStyle {
        LineStyle {
            color: Rgba8::new(0, 0, 0, 255),
            width_px: 2.0,
            dash: None,
        }
    }

    #[test]
    fn plain_edge_is_one_segment() {
        let graph = graph_two();
        let prims = edge_primitives(&graph, PortalId(0), PortalId(1), style(), false).unwrap();
        assert_eq!(prims.len(), 1);
        match &prims[0] {
            Primitive::Segment { from, to, .. } => {
                assert_eq!(*from, Point::new(0.0, 0.0));
                assert_eq!(*to, Point::new(10.0, 0.0));
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn directional_edge_adds_thick_stub() {
        let graph = graph_two();
        let prims = edge_primitives(&graph, PortalId(0), PortalId(1), style(), true).unwrap();
        assert_eq!(prims.len(), 2);
        match &prims[1] {
            Primitive::Segment { from, style, .. } => {
                assert_eq!(*from, Point::new(9.5, 0.0));
                assert_eq!(style.width_px, ARROW_WIDTH_PX);
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn edge_to_unknown_portal_is_graph_error() {
        let graph = graph_two();
        assert!(edge_primitives(&graph, PortalId(0), PortalId(7), style(), false).is_err());
    }

    #[test]
    fn field_polygon_is_shrunk_triangle() {
        let mut graph = graph_two();
        graph.portals.insert(
            PortalId(2),
            Portal {
                name: "P2".to_string(),
                xy: Point::new(5.0, 9.0),
                pll: "0,0".to_string(),
                special: Special::None,
            },
        );
        let tri = FieldTriangle([PortalId(0), PortalId(1), PortalId(2)]);
        let prim = field_polygon(
            &graph,
            &tri,
            FillStyle {
                color: Rgba8::new(255, 0, 0, 128),
            },
        )
        .unwrap();
        let Primitive::Polygon { points, .. } = prim else {
            panic!("expected polygon");
        };
        assert_eq!(points.len(), 3);
        // Strictly inside the original triangle: x of the first vertex moved
        // toward the centroid (5, 3).
        assert!(points[0].x > 0.0 && points[0].y > 0.0);
    }
}
