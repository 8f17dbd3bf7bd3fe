//! The workplan renderer: a sequential state machine that turns the ordered
//! plan into scene snapshots, one per meaningful event, plus a start and a
//! finish frame.
//!
//! The pass is split in two so the transition logic is testable without any
//! rasterization: [`plan_frames`] is pure (graph + plan in, snapshots out),
//! [`render_workplan_steps`] is the I/O shell that rasterizes and writes the
//! numbered PNG files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::{
    draw::{edge_primitives, field_polygon, marker},
    error::{FieldframeError, FieldframeResult},
    geometry::{Point, Rect, Viewport},
    model::{Faction, PlanGraph, PortalId, Special, Workplan},
    raster::{CpuRasterizer, FrameRGBA, write_png},
    scene::{FillStyle, LineStyle, MarkerStyle, Rgba8, Scene, SceneSnapshot},
};

/// Uncaptured portal marker, as on the start frame.
const UNCAPTURED_MARKER: MarkerStyle = MarkerStyle {
    color: Rgba8::new(0, 0, 0, 255),
    radius_px: 4.0,
};

/// Dotted magenta travel line shown for one frame when moving between two
/// ordinary portals.
const TRAVEL_STYLE: LineStyle = LineStyle {
    color: Rgba8::new(191, 0, 191, 255),
    width_px: 2.0,
    dash: Some([6.0, 4.0]),
};

/// Neutral link color while the throw is being shown, before the faction
/// color takes over.
const LINK_PENDING_STYLE: LineStyle = LineStyle {
    color: Rgba8::new(0, 0, 0, 255),
    width_px: 2.0,
    dash: None,
};

/// Bright warning fill for fields on the frame where they first appear.
const NEW_FIELD_FILL: FillStyle = FillStyle {
    color: Rgba8::new(255, 0, 0, 128),
};

/// Distances at or under this many meters are near enough that the title
/// omits them.
const NEAR_DISTANCE_M: u64 = 40;

/// Explicit renderer state threaded through step processing.
#[derive(Clone, Debug, Default)]
pub struct RenderState {
    /// Previous acted-on portal, if any.
    pub prev: Option<PortalId>,
    /// Special marker of the previous portal.
    pub prev_special: Special,
    /// Portals acted on at least once. Only ever grows.
    pub visited: BTreeSet<PortalId>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// What arriving at a portal means, derived from its special marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepAction {
    Capture,
    DestroyBlocker,
    TravelToWaypoint,
}

impl StepAction {
    pub fn for_special(special: Special) -> Self {
        match special {
            Special::None => StepAction::Capture,
            Special::Blocker => StepAction::DestroyBlocker,
            Special::WaypointStart | Special::WaypointEnd => StepAction::TravelToWaypoint,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StepAction::Capture => "Capture",
            StepAction::DestroyBlocker => "Destroy blocker",
            StepAction::TravelToWaypoint => "Travel to waypoint",
        }
    }
}

/// The four-way title policy for a point-change frame.
///
/// First visits lead with the action; revisits are pure movement. The
/// distance is only worth showing when it exceeds [`NEAR_DISTANCE_M`].
pub fn title_for(action: StepAction, name: &str, dist_m: u64, already_visited: bool) -> String {
    if already_visited {
        if dist_m > NEAR_DISTANCE_M {
            format!("Travel to {name} ({dist_m} m)")
        } else {
            format!("Move to {name}")
        }
    } else if dist_m > NEAR_DISTANCE_M {
        format!("{} {name} ({dist_m} m)", action.label())
    } else {
        format!("{} {name}", action.label())
    }
}

/// Run the full state machine and return one snapshot per emitted frame.
///
/// Frame order: start frame, then per step a point-change frame (only when the
/// acted-on portal changed) and a link frame (only when the step throws a
/// link), then the finish frame. Pure except for graph lookups; any unknown id
/// aborts with a graph error.
pub fn plan_frames(
    graph: &PlanGraph,
    faction: Faction,
    plan: &Workplan,
) -> FieldframeResult<Vec<SceneSnapshot>> {
    if plan.is_empty() {
        return Err(FieldframeError::validation("workplan is empty"));
    }

    let mut scene = Scene::new();
    let mut frames = Vec::new();

    for portal in graph.portals.values() {
        if portal.special == Special::None {
            scene.commit(marker(portal.xy, UNCAPTURED_MARKER));
        }
    }
    scene.set_title("Portals before capture");
    frames.push(scene.snapshot());

    let mut state = RenderState::new();
    let mut last = None;

    for step in plan.iter() {
        let p = step.portal;
        // The finish frame names the plan's last point of interest: the link
        // target when the final step throws a link, the portal itself
        // otherwise.
        last = Some(step.link_to.unwrap_or(p));

        if state.prev != Some(p) {
            let portal = graph.portal(p)?;
            let special = portal.special;

            if special == Special::None {
                scene.commit(marker(portal.xy, faction.marker_style()));
            }

            match state.prev {
                Some(prev) => {
                    let action = StepAction::for_special(special);
                    // The travel line only illustrates movement between two
                    // ordinary captured portals; leaving a waypoint or blocker
                    // draws none.
                    if action == StepAction::Capture && state.prev_special == Special::None {
                        scene.stage_all(edge_primitives(graph, prev, p, TRAVEL_STYLE, true)?);
                    }
                    let dist = graph.distance_m(prev, p)?;
                    scene.set_title(title_for(
                        action,
                        &portal.name,
                        dist,
                        state.visited.contains(&p),
                    ));
                }
                None => scene.set_title(format!("Start at {}", portal.name)),
            }

            frames.push(scene.snapshot());
            scene.discard_transient();

            state.visited.insert(p);
            state.prev = Some(p);
            state.prev_special = special;
        }

        let Some(q) = step.link_to else { continue };

        scene.set_title(format!("Link to {}", graph.portal(q)?.name));
        scene.stage_all(edge_primitives(graph, p, q, LINK_PENDING_STYLE, true)?);
        if step.new_fields {
            for tri in &graph.link(p, q)?.fields {
                scene.stage(field_polygon(graph, tri, NEW_FIELD_FILL)?);
            }
        }
        frames.push(scene.snapshot());

        // Resolve the transient artifacts: the pending link and any new-field
        // shading go away, the final faction-colored versions stay.
        scene.discard_transient();
        scene.commit_all(edge_primitives(graph, p, q, faction.link_style(), false)?);
        if step.new_fields {
            for tri in &graph.link(p, q)?.fields {
                scene.commit(field_polygon(graph, tri, faction.field_fill())?);
            }
        }
        debug_assert!(scene.transient_is_empty());
    }

    let last = last.ok_or_else(|| FieldframeError::validation("workplan is empty"))?;
    scene.set_title(format!("Finish at {}", graph.portal(last)?.name));
    debug_assert!(scene.transient_is_empty());
    frames.push(scene.snapshot());

    Ok(frames)
}

/// Output controls for [`render_workplan_steps`].
#[derive(Clone, Copy, Debug)]
pub struct StepRenderOpts {
    /// Dots per inch of the 11x8 inch canvas.
    pub dpi: u32,
    /// PNG-encode already-rendered frames on the rayon pool. The state
    /// machine and rasterization stay strictly sequential either way.
    pub parallel_encode: bool,
}

impl Default for StepRenderOpts {
    fn default() -> Self {
        Self {
            dpi: 96,
            parallel_encode: false,
        }
    }
}

/// World bounding box of every portal in the graph.
fn world_bounds(graph: &PlanGraph) -> Rect {
    let mut points = graph.portals.values().map(|p| p.xy);
    let first = points.next().unwrap_or(Point::ZERO);
    points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p))
}

/// Render the workplan into `outdir` as `step_000.png`, `step_001.png`, ...
/// in emission order, creating the directory if absent. Returns the written
/// paths. A failed run leaves an incomplete, non-authoritative sequence
/// behind; callers should discard the directory.
pub fn render_workplan_steps(
    graph: &PlanGraph,
    faction: Faction,
    plan: &Workplan,
    outdir: &Path,
    opts: StepRenderOpts,
) -> FieldframeResult<Vec<PathBuf>> {
    tracing::info!(outdir = %outdir.display(), "generating step-by-step pngs of the workplan");

    std::fs::create_dir_all(outdir).map_err(|e| {
        FieldframeError::render(format!(
            "failed to create output directory '{}': {e}",
            outdir.display()
        ))
    })?;

    let frames = plan_frames(graph, faction, plan)?;

    let width = 11 * opts.dpi;
    let height = 8 * opts.dpi;
    let viewport = Viewport::fit(world_bounds(graph), width, height, 0.05);
    let mut raster = CpuRasterizer::new(width, height)?;

    let mut paths = Vec::with_capacity(frames.len());
    let mut frozen: Vec<(PathBuf, FrameRGBA)> = Vec::new();

    for (i, snap) in frames.iter().enumerate() {
        let path = outdir.join(format!("step_{i:03}.png"));
        let frame = raster.render(&viewport, snap)?;
        if opts.parallel_encode {
            frozen.push((path.clone(), frame));
        } else {
            write_png(&path, &frame)?;
        }
        paths.push(path);
    }

    if opts.parallel_encode {
        frozen
            .par_iter()
            .try_for_each(|(path, frame)| write_png(path, frame))?;
    }

    tracing::info!(frames = paths.len(), "saved step-by-step pngs");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldTriangle, Link, Portal, WorkplanStep};

    fn portal(name: &str, x: f64, y: f64, pll: &str, special: Special) -> Portal {
        Portal {
            name: name.to_string(),
            xy: Point::new(x, y),
            pll: pll.to_string(),
            special,
        }
    }

    /// Three ordinary portals, A-B carrying one field {A,B,C}.
    fn triangle_graph() -> PlanGraph {
        let mut graph = PlanGraph::default();
        graph
            .portals
            .insert(PortalId(0), portal("A", 0.0, 0.0, "55.750,37.610", Special::None));
        graph
            .portals
            .insert(PortalId(1), portal("B", 100.0, 0.0, "55.751,37.610", Special::None));
        graph
            .portals
            .insert(PortalId(2), portal("C", 50.0, 90.0, "55.7505,37.612", Special::None));
        graph.links.insert(
            (PortalId(0), PortalId(1)),
            Link {
                fields: vec![FieldTriangle([PortalId(0), PortalId(1), PortalId(2)])],
            },
        );
        graph.links.insert((PortalId(1), PortalId(2)), Link::default());
        graph
    }

    fn step(p: u32, q: Option<u32>, f: bool) -> WorkplanStep {
        WorkplanStep {
            portal: PortalId(p),
            link_to: q.map(PortalId),
            new_fields: f,
        }
    }

    #[test]
    fn title_policy_four_ways() {
        assert_eq!(
            title_for(StepAction::Capture, "Library", 55, false),
            "Capture Library (55 m)"
        );
        assert_eq!(
            title_for(StepAction::Capture, "Library", 12, false),
            "Capture Library"
        );
        assert_eq!(
            title_for(StepAction::Capture, "Library", 55, true),
            "Travel to Library (55 m)"
        );
        assert_eq!(
            title_for(StepAction::Capture, "Library", 12, true),
            "Move to Library"
        );
    }

    #[test]
    fn title_uses_special_action_labels() {
        assert_eq!(
            title_for(StepAction::DestroyBlocker, "Gate", 90, false),
            "Destroy blocker Gate (90 m)"
        );
        assert_eq!(
            title_for(StepAction::TravelToWaypoint, "Car", 10, false),
            "Travel to waypoint Car"
        );
    }

    #[test]
    fn action_from_special() {
        assert_eq!(StepAction::for_special(Special::None), StepAction::Capture);
        assert_eq!(
            StepAction::for_special(Special::Blocker),
            StepAction::DestroyBlocker
        );
        assert_eq!(
            StepAction::for_special(Special::WaypointStart),
            StepAction::TravelToWaypoint
        );
        assert_eq!(
            StepAction::for_special(Special::WaypointEnd),
            StepAction::TravelToWaypoint
        );
    }

    #[test]
    fn frame_count_matches_formula() {
        let graph = triangle_graph();
        // N = 3 steps, every step changes portal (C = 3), K = 2 link steps.
        let plan = Workplan(vec![
            step(0, Some(1), true),
            step(1, Some(2), false),
            step(2, None, false),
        ]);
        let frames = plan_frames(&graph, Faction::Enl, &plan).unwrap();
        assert_eq!(frames.len(), 1 + 3 + 2 + 1);
    }

    #[test]
    fn repeated_portal_emits_no_point_change_frame() {
        let graph = triangle_graph();
        // Two consecutive link-only steps from the same portal: one
        // point-change frame, two link frames.
        let plan = Workplan(vec![step(0, Some(1), false), step(0, Some(1), false)]);
        let frames = plan_frames(&graph, Faction::Enl, &plan).unwrap();
        assert_eq!(frames.len(), 1 + 1 + 2 + 1);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let graph = triangle_graph();
        assert!(plan_frames(&graph, Faction::Enl, &Workplan(vec![])).is_err());
    }

    #[test]
    fn unknown_portal_aborts() {
        let graph = triangle_graph();
        let plan = Workplan(vec![step(9, None, false)]);
        assert!(plan_frames(&graph, Faction::Enl, &plan).is_err());
    }

    #[test]
    fn start_and_finish_titles() {
        let graph = triangle_graph();
        let plan = Workplan(vec![step(0, None, false), step(1, None, false)]);
        let frames = plan_frames(&graph, Faction::Enl, &plan).unwrap();
        assert_eq!(frames[0].title, "Portals before capture");
        assert_eq!(frames[1].title, "Start at A");
        assert_eq!(frames.last().unwrap().title, "Finish at B");
    }

    #[test]
    fn travel_line_lives_for_exactly_one_frame() {
        let graph = triangle_graph();
        let plan = Workplan(vec![step(0, None, false), step(1, None, false)]);
        let frames = plan_frames(&graph, Faction::Enl, &plan).unwrap();

        let dashed = |snap: &SceneSnapshot| {
            snap.primitives
                .iter()
                .filter(|p| matches!(p, crate::scene::Primitive::Segment { style, .. } if style.dash.is_some()))
                .count()
        };
        // Frame 2 is the arrival at B: the dotted travel line is visible.
        assert_eq!(dashed(&frames[2]), 1);
        // Gone again on the finish frame.
        assert_eq!(dashed(&frames[3]), 0);
    }

    #[test]
    fn no_travel_line_when_leaving_waypoint() {
        let mut graph = triangle_graph();
        graph.portals.insert(
            PortalId(3),
            portal("Car", -50.0, 0.0, "55.749,37.608", Special::WaypointStart),
        );
        let plan = Workplan(vec![step(3, None, false), step(0, None, false)]);
        let frames = plan_frames(&graph, Faction::Enl, &plan).unwrap();

        let any_dashed = frames.iter().any(|snap| {
            snap.primitives.iter().any(
                |p| matches!(p, crate::scene::Primitive::Segment { style, .. } if style.dash.is_some()),
            )
        });
        assert!(!any_dashed);
        // Arriving at A from the waypoint still captures and titles normally.
        assert_eq!(frames[2].title, "Capture A (167 m)");
    }
}
