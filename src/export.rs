//! Field polygon export: every field triangle of the completed graph as a
//! geometry-with-color JSON document.
//!
//! Independent of the workplan; this reflects only the final, fully realized
//! graph.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::{
    error::{FieldframeError, FieldframeResult},
    geometry::LatLng,
    model::{Faction, PlanGraph},
};

/// One exported field polygon.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldRecord {
    #[serde(rename = "type")]
    pub kind: String,
    /// The three vertices' geographic coordinates. `latLngs` is accepted as
    /// an alias when parsing older documents.
    #[serde(alias = "latLngs")]
    pub coordinates: Vec<LatLng>,
    /// Faction hex tint.
    pub color: String,
}

/// Flatten every field triangle attached to any link, in link order.
pub fn field_records(graph: &PlanGraph, faction: Faction) -> FieldframeResult<Vec<FieldRecord>> {
    let mut out = Vec::new();
    for link in graph.links.values() {
        for tri in &link.fields {
            let mut coordinates = Vec::with_capacity(3);
            for v in tri.vertices() {
                coordinates.push(graph.portal(v)?.latlng()?);
            }
            out.push(FieldRecord {
                kind: "polygon".to_string(),
                coordinates,
                color: faction.hex().to_string(),
            });
        }
    }
    Ok(out)
}

/// Write the full collection as a single JSON document.
pub fn write_fields_json(graph: &PlanGraph, faction: Faction, path: &Path) -> FieldframeResult<()> {
    let records = field_records(graph, faction)?;
    let file = File::create(path).map_err(|e| {
        FieldframeError::render(format!("failed to create '{}': {e}", path.display()))
    })?;
    serde_json::to_writer(BufWriter::new(file), &records)
        .map_err(|e| FieldframeError::serde(format!("failed to encode field records: {e}")))?;

    tracing::info!(path = %path.display(), fields = records.len(), "wrote json map dump");
    Ok(())
}
