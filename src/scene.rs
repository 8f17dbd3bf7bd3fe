//! Retained scene state for the shared drawing surface.
//!
//! The renderer is the sole mutator: permanent primitives accumulate for the
//! rest of the run, transient primitives live for exactly one frame and are
//! then either discarded or promoted. After every sub-step resolution the
//! transient list is empty, which makes the "no leaked temporary artifacts"
//! invariant directly checkable.

use kurbo::Point;

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarkerStyle {
    pub color: Rgba8,
    pub radius_px: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineStyle {
    pub color: Rgba8,
    pub width_px: f64,
    /// `Some([on, off])` renders a dashed stroke.
    pub dash: Option<[f64; 2]>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FillStyle {
    pub color: Rgba8,
}

/// One retained draw command, in world coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Primitive {
    Marker { at: Point, style: MarkerStyle },
    Segment { from: Point, to: Point, style: LineStyle },
    Polygon { points: Vec<Point>, fill: FillStyle },
}

/// The drawing surface state: permanent artifacts, the transient artifacts of
/// the sub-step in flight, and the current title.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    permanent: Vec<Primitive>,
    transient: Vec<Primitive>,
    title: String,
}

/// An immutable snapshot of the scene, ready for rasterization. Permanent
/// primitives come first, then transient ones, in insertion order.
#[derive(Clone, Debug)]
pub struct SceneSnapshot {
    pub title: String,
    pub primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Append a primitive that stays for the rest of the run.
    pub fn commit(&mut self, prim: Primitive) {
        self.permanent.push(prim);
    }

    pub fn commit_all(&mut self, prims: Vec<Primitive>) {
        self.permanent.extend(prims);
    }

    /// Append a primitive pending removal or promotion after the next frame.
    pub fn stage(&mut self, prim: Primitive) {
        self.transient.push(prim);
    }

    pub fn stage_all(&mut self, prims: Vec<Primitive>) {
        self.transient.extend(prims);
    }

    /// Drop every staged primitive.
    pub fn discard_transient(&mut self) {
        self.transient.clear();
    }

    /// Move every staged primitive into the permanent list, keeping order.
    pub fn promote_transient(&mut self) {
        self.permanent.append(&mut self.transient);
    }

    pub fn transient_is_empty(&self) -> bool {
        self.transient.is_empty()
    }

    pub fn permanent(&self) -> &[Primitive] {
        &self.permanent
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        let mut primitives = Vec::with_capacity(self.permanent.len() + self.transient.len());
        primitives.extend(self.permanent.iter().cloned());
        primitives.extend(self.transient.iter().cloned());
        SceneSnapshot {
            title: self.title.clone(),
            primitives,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(x: f64) -> Primitive {
        Primitive::Marker {
            at: Point::new(x, 0.0),
            style: MarkerStyle {
                color: Rgba8::new(0, 0, 0, 255),
                radius_px: 4.0,
            },
        }
    }

    #[test]
    fn discard_leaves_only_permanent() {
        let mut scene = Scene::new();
        scene.commit(marker(1.0));
        scene.stage(marker(2.0));
        assert_eq!(scene.snapshot().primitives.len(), 2);

        scene.discard_transient();
        assert!(scene.transient_is_empty());
        assert_eq!(scene.snapshot().primitives.len(), 1);
    }

    #[test]
    fn promote_moves_staged_in_order() {
        let mut scene = Scene::new();
        scene.stage(marker(1.0));
        scene.stage(marker(2.0));
        scene.promote_transient();

        assert!(scene.transient_is_empty());
        let snap = scene.snapshot();
        assert_eq!(snap.primitives.len(), 2);
        assert_eq!(snap.primitives[0], marker(1.0));
        assert_eq!(snap.primitives[1], marker(2.0));
    }

    #[test]
    fn snapshot_orders_permanent_before_transient() {
        let mut scene = Scene::new();
        scene.stage(marker(9.0));
        scene.commit(marker(1.0));
        let snap = scene.snapshot();
        assert_eq!(snap.primitives[0], marker(1.0));
        assert_eq!(snap.primitives[1], marker(9.0));
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let mut scene = Scene::new();
        scene.stage(marker(1.0));
        scene.set_title("before");
        let snap = scene.snapshot();
        scene.discard_transient();
        scene.set_title("after");
        assert_eq!(snap.title, "before");
        assert_eq!(snap.primitives.len(), 1);
    }
}
