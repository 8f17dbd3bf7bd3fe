//! Planar and geographic geometry helpers shared by the renderer and the export
//! serializer.

pub use kurbo::{Point, Rect, Vec2};

/// Geographic coordinates in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two geographic points, in meters.
pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Scale a polygon by 0.9 around its centroid (mean of all vertices).
///
/// Keeps filled field regions visually inside the link segments that bound them.
/// Order of the returned points matches the input. Does not validate input;
/// an empty slice is the caller's bug.
pub fn shrink(points: &[Point]) -> Vec<Point> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.y).sum::<f64>() / n;

    points
        .iter()
        .map(|p| Point::new(cx + 0.9 * (p.x - cx), cy + 0.9 * (p.y - cy)))
        .collect()
}

/// The short thick segment drawn near the target end of a directional edge to
/// imitate an arrowhead: from 5% back of the target to 40% back, along the
/// source->target direction.
pub fn arrow_stub(from: Point, to: Point) -> (Point, Point) {
    let d = to - from;
    (to - 0.05 * d, to - 0.4 * d)
}

/// Maps world (planar, y-up) coordinates onto the pixel canvas (y-down),
/// preserving aspect ratio and centering the world bounding box with a margin.
/// Computed once per run from the portal positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    pub fn fit(world: Rect, width: u32, height: u32, margin_frac: f64) -> Self {
        let avail_w = f64::from(width) * (1.0 - 2.0 * margin_frac);
        let avail_h = f64::from(height) * (1.0 - 2.0 * margin_frac);

        // A single portal (or a degenerate colinear world) still needs a finite
        // scale; clamp the denominators instead of special-casing.
        let world_w = world.width().max(1e-9);
        let world_h = world.height().max(1e-9);
        let scale = (avail_w / world_w).min(avail_h / world_h);

        let wc = world.center();
        let cx = f64::from(width) / 2.0;
        let cy = f64::from(height) / 2.0;

        Self {
            scale,
            offset_x: cx - scale * wc.x,
            offset_y: cy + scale * wc.y,
        }
    }

    /// World point to pixel point (y flipped).
    pub fn map(&self, p: Point) -> Point {
        Point::new(
            self.offset_x + self.scale * p.x,
            self.offset_y - self.scale * p.y,
        )
    }
}
