//! Data model for the capture plan: the portal graph, the workplan, and the
//! faction palette.
//!
//! The graph and the plan are produced by an external collaborator (graph
//! construction and plan optimization are out of scope here) and are read-only
//! to the renderer. [`PlanBundle`] is the serde document tying the two together
//! for the CLI.

use std::collections::BTreeMap;

use kurbo::Point;

use crate::{
    error::{FieldframeError, FieldframeResult},
    geometry::{LatLng, haversine_m},
    scene::{FillStyle, LineStyle, MarkerStyle, Rgba8},
};

/// Identity of one portal, assigned by the graph collaborator.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct PortalId(pub u32);

impl std::fmt::Display for PortalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role marker for non-capture points on the route.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Special {
    #[default]
    None,
    Blocker,
    WaypointStart,
    WaypointEnd,
}

/// One labeled point of the plan graph.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Portal {
    pub name: String,
    /// Planar coordinates (projected by the collaborator), y-up.
    pub xy: Point,
    /// Geographic coordinates as a "lat,lng" string, exactly as received.
    pub pll: String,
    #[serde(default)]
    pub special: Special,
}

impl Portal {
    /// Parse the "lat,lng" string. Malformed strings are data errors.
    pub fn latlng(&self) -> FieldframeResult<LatLng> {
        let (lat, lng) = self
            .pll
            .split_once(',')
            .ok_or_else(|| FieldframeError::graph(format!("malformed pll '{}'", self.pll)))?;
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| FieldframeError::graph(format!("malformed pll '{}'", self.pll)))
        };
        Ok(LatLng {
            lat: parse(lat)?,
            lng: parse(lng)?,
        })
    }
}

/// Three mutually linked portals forming one filled field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FieldTriangle(pub [PortalId; 3]);

impl FieldTriangle {
    pub fn vertices(&self) -> [PortalId; 3] {
        self.0
    }
}

/// A link between two portals, carrying the fields completed when it is thrown.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Link {
    #[serde(default)]
    pub fields: Vec<FieldTriangle>,
}

/// The completed plan graph. Read-only to the renderer; lookups of ids the
/// collaborator never defined are data errors that abort the run.
#[derive(Clone, Debug, Default)]
pub struct PlanGraph {
    pub portals: BTreeMap<PortalId, Portal>,
    pub links: BTreeMap<(PortalId, PortalId), Link>,
}

impl PlanGraph {
    pub fn portal(&self, id: PortalId) -> FieldframeResult<&Portal> {
        self.portals
            .get(&id)
            .ok_or_else(|| FieldframeError::graph(format!("unknown portal {id}")))
    }

    pub fn link(&self, p: PortalId, q: PortalId) -> FieldframeResult<&Link> {
        self.links
            .get(&(p, q))
            .ok_or_else(|| FieldframeError::graph(format!("unknown link {p} -> {q}")))
    }

    /// Great-circle distance between two portals in whole meters.
    ///
    /// Stands in for the collaborator's position-only distance lookup; reads
    /// nothing but the two portals' geographic coordinates.
    pub fn distance_m(&self, p: PortalId, q: PortalId) -> FieldframeResult<u64> {
        let a = self.portal(p)?.latlng()?;
        let b = self.portal(q)?.latlng()?;
        Ok(haversine_m(a, b).round() as u64)
    }
}

/// One entry of the workplan: act at `portal`, optionally throw a link to
/// `link_to`. `new_fields` is meaningful only when `link_to` is present.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct WorkplanStep {
    pub portal: PortalId,
    #[serde(default)]
    pub link_to: Option<PortalId>,
    #[serde(default)]
    pub new_fields: bool,
}

/// The ordered capture plan. Order is the authoritative execution order and is
/// preserved exactly in rendering.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Workplan(pub Vec<WorkplanStep>);

impl Workplan {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkplanStep> {
        self.0.iter()
    }
}

/// One of the two teams. Each maps to a fixed marker color, a fixed final
/// link/field color, and a fixed export hex tint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Enl,
    Res,
}

impl Faction {
    /// Marker style for a captured ordinary portal.
    pub fn marker_style(self) -> MarkerStyle {
        let color = match self {
            Faction::Enl => Rgba8::new(0, 128, 0, 255),
            Faction::Res => Rgba8::new(0, 0, 255, 255),
        };
        MarkerStyle {
            color,
            radius_px: 4.0,
        }
    }

    /// Final (permanent) link style.
    pub fn link_style(self) -> LineStyle {
        let color = match self {
            Faction::Enl => Rgba8::new(0, 128, 0, 255),
            Faction::Res => Rgba8::new(0, 0, 255, 255),
        };
        LineStyle {
            color,
            width_px: 2.0,
            dash: None,
        }
    }

    /// Final (permanent) translucent field fill.
    pub fn field_fill(self) -> FillStyle {
        let color = match self {
            Faction::Enl => Rgba8::new(0, 255, 0, 77),
            Faction::Res => Rgba8::new(0, 0, 255, 77),
        };
        FillStyle { color }
    }

    /// Fixed tint used by the field polygon export.
    pub fn hex(self) -> &'static str {
        match self {
            Faction::Enl => "#51c34a",
            Faction::Res => "#4aa8c3",
        }
    }
}

/// Portal entry of the serde input document.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PortalSpec {
    pub name: String,
    pub xy: [f64; 2],
    pub pll: String,
    #[serde(default)]
    pub special: Special,
}

/// Link entry of the serde input document.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LinkSpec {
    pub from: PortalId,
    pub to: PortalId,
    #[serde(default)]
    pub fields: Vec<FieldTriangle>,
}

/// The collaborator's graph and workplan in one document, as consumed by the
/// CLI. Portal ids are indices into `portals`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PlanBundle {
    pub portals: Vec<PortalSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub steps: Workplan,
}

impl PlanBundle {
    /// Referential integrity of the whole document: every id used by links,
    /// fields, and steps must name a portal.
    pub fn validate(&self) -> FieldframeResult<()> {
        if self.portals.is_empty() {
            return Err(FieldframeError::validation("bundle has no portals"));
        }

        let known = |id: PortalId| (id.0 as usize) < self.portals.len();
        for link in &self.links {
            if !known(link.from) || !known(link.to) {
                return Err(FieldframeError::validation(format!(
                    "link {} -> {} references an unknown portal",
                    link.from, link.to
                )));
            }
            for tri in &link.fields {
                if tri.vertices().iter().any(|&v| !known(v)) {
                    return Err(FieldframeError::validation(format!(
                        "field on link {} -> {} references an unknown portal",
                        link.from, link.to
                    )));
                }
            }
        }
        for step in self.steps.iter() {
            if !known(step.portal) {
                return Err(FieldframeError::validation(format!(
                    "step references unknown portal {}",
                    step.portal
                )));
            }
            if let Some(q) = step.link_to
                && !known(q)
            {
                return Err(FieldframeError::validation(format!(
                    "step at {} links to unknown portal {q}",
                    step.portal
                )));
            }
        }
        Ok(())
    }

    /// Build the runtime graph from the document.
    pub fn graph(&self) -> PlanGraph {
        let mut graph = PlanGraph::default();
        for (i, spec) in self.portals.iter().enumerate() {
            graph.portals.insert(
                PortalId(i as u32),
                Portal {
                    name: spec.name.clone(),
                    xy: Point::new(spec.xy[0], spec.xy[1]),
                    pll: spec.pll.clone(),
                    special: spec.special,
                },
            );
        }
        for link in &self.links {
            graph.links.insert(
                (link.from, link.to),
                Link {
                    fields: link.fields.clone(),
                },
            );
        }
        graph
    }
}
