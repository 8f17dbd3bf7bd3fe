use fieldframe::{
    Faction, FieldRecord, FieldTriangle, Link, PlanGraph, Portal, PortalId, Special,
    write_fields_json,
};
use kurbo::Point;

#[test]
fn export_document_round_trips_from_disk() {
    let mut graph = PlanGraph::default();
    let plls = ["55.751,37.618", "55.752,37.620", "55.753,37.616"];
    for (i, pll) in plls.iter().enumerate() {
        graph.portals.insert(
            PortalId(i as u32),
            Portal {
                name: format!("P{i}"),
                xy: Point::new(i as f64, 0.0),
                pll: pll.to_string(),
                special: Special::None,
            },
        );
    }
    graph.links.insert(
        (PortalId(0), PortalId(1)),
        Link {
            fields: vec![FieldTriangle([PortalId(0), PortalId(1), PortalId(2)])],
        },
    );

    let path = std::env::temp_dir().join(format!("fieldframe_export_{}.json", std::process::id()));
    write_fields_json(&graph, Faction::Enl, &path).unwrap();

    let s = std::fs::read_to_string(&path).unwrap();
    let records: Vec<FieldRecord> = serde_json::from_str(&s).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, "polygon");
    assert_eq!(records[0].color, "#51c34a");
    assert_eq!(records[0].coordinates.len(), 3);
    assert_eq!(records[0].coordinates[1].lat, 55.752);
    assert_eq!(records[0].coordinates[1].lng, 37.620);

    std::fs::remove_file(&path).unwrap();
}
