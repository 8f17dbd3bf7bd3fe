//! Fieldframe turns a completed capture workplan over a portal graph into an
//! ordered sequence of still PNG frames, plus a JSON export of every realized
//! field polygon.
//!
//! # Pipeline overview
//!
//! 1. **Load**: a [`PlanBundle`] document (graph + workplan, produced by the
//!    external planning collaborator) is parsed and validated.
//! 2. **Plan**: [`plan_frames`] runs the sequential step state machine over a
//!    retained [`Scene`], emitting one immutable [`SceneSnapshot`] per
//!    meaningful event plus a start and a finish frame.
//! 3. **Rasterize**: [`CpuRasterizer`] draws each snapshot on the shared CPU
//!    surface (`vello_cpu`) and reads back premultiplied RGBA8.
//! 4. **Write**: frames land as `step_000.png`, `step_001.png`, ... in
//!    emission order; [`write_fields_json`] exports the field polygons.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: the same bundle renders the same frame sequence; the
//!   state machine is strictly sequential, only the final PNG encode of
//!   already-frozen frames may run on the rayon pool.
//! - **No partial success**: the first data or I/O error aborts the run, and
//!   a failed run's output directory is not a valid result set.

#![forbid(unsafe_code)]

mod draw;
mod error;
mod export;
mod geometry;
mod model;
mod raster;
mod scene;
mod steps;

pub use draw::{edge_primitives, field_polygon, marker};
pub use error::{FieldframeError, FieldframeResult};
pub use export::{FieldRecord, field_records, write_fields_json};
pub use geometry::{LatLng, Viewport, arrow_stub, haversine_m, shrink};
pub use model::{
    Faction, FieldTriangle, Link, LinkSpec, PlanBundle, PlanGraph, Portal, PortalId, PortalSpec,
    Special, Workplan, WorkplanStep,
};
pub use raster::{CpuRasterizer, FrameRGBA, write_png};
pub use scene::{
    FillStyle, LineStyle, MarkerStyle, Primitive, Rgba8, Scene, SceneSnapshot,
};
pub use steps::{
    RenderState, StepAction, StepRenderOpts, plan_frames, render_workplan_steps, title_for,
};
