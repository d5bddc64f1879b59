use geo::{Rect, coord};
use serde_json::{Map, Value, json};
use storm_core::config::NetworkConfig;
use storm_core::coords::Node;
use storm_core::error::NetworkError;
use storm_core::graph::Claim;
use storm_core::layer::*;
use storm_core::points::PointRole;
use storm_core::{Network, ResolveMethod};
use std::io;
use std::sync::{Arc, Mutex};

const CRS: &str = "EPSG:32145";

fn props(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn make_line(id: i64, vertices: &[[f64; 2]]) -> LineFeature {
    LineFeature {
        properties: props(json!({ "OBJECTID": id })),
        geometry: LineGeometry::LineString(vertices.to_vec()),
    }
}

fn make_point(id: i64, type_code: i64, at: [f64; 2]) -> PointFeature {
    PointFeature {
        properties: props(json!({ "OBJECTID": id, "Type": type_code })),
        geometry: PointGeometry::Point(at),
    }
}

fn lines(features: Vec<LineFeature>) -> LineLayer {
    LineLayer {
        crs: Some(CRS.to_string()),
        features,
    }
}

fn points(features: Vec<PointFeature>) -> PointLayer {
    PointLayer {
        crs: Some(CRS.to_string()),
        features,
    }
}

fn catchment(min: [f64; 2], max: [f64; 2]) -> Catchment {
    let rect = Rect::new(coord! { x: min[0], y: min[1] }, coord! { x: max[0], y: max[1] });
    Catchment::new(Some(CRS.to_string()), rect.to_polygon())
}

/// Two catch basins draining along one pipe run, through a manhole, to an outfall.
///
/// ```text
/// 20840 (-10,0) -- 20847 (0,0) -- (10,0) -- 20900 (20,0) -- 21134 (30,0)
///                                               |
///                                    20850 (20,10)
/// ```
fn outfall_network() -> Network {
    let line_layer = lines(vec![
        make_line(1, &[[-10.0, 0.0], [0.0, 0.0], [10.0, 0.0], [20.0, 0.0]]),
        make_line(2, &[[20.0, 0.0], [30.0, 0.0]]),
        make_line(3, &[[20.0, 10.0], [20.0, 0.0]]),
    ]);
    let point_layer = points(vec![
        make_point(20840, 2, [-10.0, 0.0]),
        make_point(20847, 2, [0.0, 0.0]),
        make_point(20850, 8, [20.0, 10.0]),
        make_point(20900, 4, [20.0, 0.0]),
        make_point(21134, 9, [30.0, 0.0]),
    ]);
    Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap()
}

fn resolved_outfall_network() -> Network {
    let mut network = outfall_network();
    network.resolve_directions(ResolveMethod::FromSources).unwrap();
    network
}

// -- construction --

#[test]
fn test_crs_mismatch_is_reported_before_columns() {
    // the line layer is also missing its index column; CRS is checked first
    let line_layer = LineLayer {
        crs: Some("EPSG:4326".to_string()),
        features: vec![LineFeature {
            properties: Map::new(),
            geometry: LineGeometry::LineString(vec![[0.0, 0.0], [1.0, 0.0]]),
        }],
    };
    let point_layer = points(vec![make_point(1, 2, [0.0, 0.0])]);
    let err = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap_err();
    assert!(matches!(err, NetworkError::CrsMismatch { .. }));
}

#[test]
fn test_missing_line_index_column() {
    let mut line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    line_layer.features[0].properties = props(json!({ "FID": 1 }));
    let point_layer = points(vec![make_point(1, 2, [0.0, 0.0])]);
    let err = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        NetworkError::MissingColumn { layer: "storm_lines", ref column } if column == "OBJECTID"
    ));
}

#[test]
fn test_missing_type_column() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    let mut point_layer = points(vec![make_point(1, 2, [0.0, 0.0])]);
    point_layer.features[0].properties = props(json!({ "OBJECTID": 1 }));
    let err = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        NetworkError::MissingColumn { layer: "storm_pts", ref column } if column == "Type"
    ));
}

#[test]
fn test_precomputed_roles_require_both_flags_without_type_column() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    let point_layer = points(vec![PointFeature {
        properties: props(json!({ "OBJECTID": 1, "IS_SINK": true })),
        geometry: PointGeometry::Point([0.0, 0.0]),
    }]);
    let config = NetworkConfig {
        type_column: String::new(),
        ..NetworkConfig::default()
    };
    let err = Network::new(&line_layer, &point_layer, &config).unwrap_err();
    assert!(matches!(
        err,
        NetworkError::MissingColumn { ref column, .. } if column == "IS_SOURCE"
    ));
}

#[test]
fn test_non_boolean_flag_column() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    let point_layer = points(vec![
        PointFeature {
            properties: props(json!({ "OBJECTID": 1, "Type": 2, "IS_SOURCE": false })),
            geometry: PointGeometry::Point([0.0, 0.0]),
        },
        PointFeature {
            properties: props(json!({ "OBJECTID": 2, "Type": 5, "IS_SOURCE": 1 })),
            geometry: PointGeometry::Point([1.0, 0.0]),
        },
    ]);
    let err = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        NetworkError::NotBoolean { ref column, ref id } if column == "IS_SOURCE" && *id == FeatureId::Int(2)
    ));
}

#[test]
fn test_precomputed_flag_overrides_type_code() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    let point_layer = points(vec![
        PointFeature {
            properties: props(json!({ "OBJECTID": 1, "Type": 2, "IS_SOURCE": true })),
            geometry: PointGeometry::Point([0.0, 0.0]),
        },
        PointFeature {
            properties: props(json!({ "OBJECTID": 2, "Type": 5, "IS_SOURCE": false })),
            geometry: PointGeometry::Point([1.0, 0.0]),
        },
    ]);
    let network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
    // IS_SINK is still derived from the type code
    assert_eq!(network.point(&FeatureId::Int(1)).unwrap().role(), PointRole::Both);
    assert_eq!(network.point(&FeatureId::Int(2)).unwrap().role(), PointRole::Neither);
}

#[test]
fn test_text_type_code_loads_as_neither() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    let point_layer = points(vec![
        make_point(1, 2, [0.0, 0.0]),
        PointFeature {
            properties: props(json!({ "OBJECTID": 2, "Type": "CB" })),
            geometry: PointGeometry::Point([1.0, 0.0]),
        },
    ]);
    let network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
    assert_eq!(network.point(&FeatureId::Int(1)).unwrap().role(), PointRole::Sink);
    let text = network.point(&FeatureId::Int(2)).unwrap();
    assert_eq!(text.role(), PointRole::Neither);
    assert_eq!(text.type_code, None);
}

#[test]
fn test_duplicate_point_id_is_rejected() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    let point_layer = points(vec![make_point(5, 2, [0.0, 0.0]), make_point(5, 9, [1.0, 0.0])]);
    let err = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap_err();
    assert!(matches!(err, NetworkError::DuplicateId { layer: "storm_pts", .. }));
}

#[test]
fn test_summary_counts() {
    let summary = outfall_network().summary();
    assert_eq!(summary.lines, 3);
    assert_eq!(summary.segments, 5);
    assert_eq!(summary.nodes, 6);
    assert_eq!(summary.edges, 10);
    assert_eq!(summary.bidirected_pairs, 5);
    assert_eq!(summary.points, 5);
    assert_eq!(summary.points_in_graph, 5);
    assert_eq!(summary.sources, 1);
    assert_eq!(summary.sinks, 3);
    assert!(!summary.directions_resolved);
}

// -- resolution --

#[test]
fn test_from_sources_orients_every_edge_toward_the_outfall() {
    let network = resolved_outfall_network();
    let graph = network.graph();

    assert!(network.directions_resolved());
    assert_eq!(graph.bidirected_pairs(), 0);
    assert_eq!(graph.edge_count(), 5);
    for segment in graph.segments() {
        let a = graph.node_id(&segment.from).unwrap();
        let b = graph.node_id(&segment.to).unwrap();
        // every line is digitized in the flow direction
        assert!(graph.has_edge(a, b), "{} -> {}", segment.from, segment.to);
        assert_eq!(graph.claim(a, b), Some(&Claim::Source(FeatureId::Int(21134))));
    }
}

#[test]
fn test_resolution_is_idempotent() {
    let mut network = resolved_outfall_network();
    let before: Vec<(Node, Node)> = network.graph().edges().collect();

    let report = network.resolve_directions(ResolveMethod::FromSources).unwrap();
    assert_eq!(report.edges_pruned, 0);
    assert_eq!(report.sources_resolved, vec![FeatureId::Int(21134)]);
    let after: Vec<(Node, Node)> = network.graph().edges().collect();
    assert_eq!(before, after);
}

#[test]
fn test_resolve_upstream_rejects_non_source() {
    let mut network = outfall_network();
    let err = network.resolve_upstream(&FeatureId::Int(20847)).unwrap_err();
    assert!(matches!(err, NetworkError::NotASource(_)));
    let err = network.resolve_upstream(&FeatureId::Int(1)).unwrap_err();
    assert!(matches!(err, NetworkError::UnknownPoint(_)));
}

#[test]
fn test_source_outside_graph_is_skipped() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    let point_layer = points(vec![
        make_point(1, 2, [0.0, 0.0]),
        make_point(2, 5, [1.0, 0.0]),
        make_point(3, 5, [50.0, 50.0]),
    ]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
    let report = network.resolve_directions(ResolveMethod::FromSources).unwrap();
    assert_eq!(report.sources_resolved, vec![FeatureId::Int(2)]);
    assert_eq!(report.sources_missing, vec![FeatureId::Int(3)]);
    assert_eq!(report.edges_pruned, 1);
}

#[test]
fn test_vertex_order_and_reversed() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]])]);
    let point_layer = points(vec![make_point(1, 2, [0.0, 0.0]), make_point(2, 5, [2.0, 0.0])]);
    let config = NetworkConfig::default();

    let mut forward = Network::new(&line_layer, &point_layer, &config).unwrap();
    let report = forward.resolve_directions(ResolveMethod::VertexOrder).unwrap();
    assert_eq!(report.edges_pruned, 2);
    let (a, c) = (Node::exact(0.0, 0.0), Node::exact(2.0, 0.0));
    let g = forward.graph();
    assert!(g.has_edge(g.node_id(&a).unwrap(), g.node_id(&Node::exact(1.0, 0.0)).unwrap()));

    let mut reversed = Network::new(&line_layer, &point_layer, &config).unwrap();
    reversed.resolve_directions(ResolveMethod::VertexOrderReversed).unwrap();
    let g = reversed.graph();
    assert!(g.has_edge(g.node_id(&c).unwrap(), g.node_id(&Node::exact(1.0, 0.0)).unwrap()));
    assert_eq!(
        g.claim(g.node_id(&c).unwrap(), g.node_id(&Node::exact(1.0, 0.0)).unwrap()),
        Some(&Claim::Line(FeatureId::Int(1)))
    );
}

#[test]
fn test_vertex_order_conflict_leaves_graph_untouched() {
    let line_layer = lines(vec![
        make_line(1, &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]),
        make_line(2, &[[2.0, 0.0], [1.0, 0.0]]),
    ]);
    let point_layer = points(vec![make_point(1, 2, [0.0, 0.0])]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();

    let err = network.resolve_directions(ResolveMethod::VertexOrder).unwrap_err();
    assert!(matches!(
        err,
        NetworkError::DirectionConflict {
            claimed_by: Claim::Line(FeatureId::Int(1)),
            contested_by: Claim::Line(FeatureId::Int(2)),
            ..
        }
    ));
    assert!(!network.directions_resolved());
    assert_eq!(network.graph().bidirected_pairs(), 2);
}

#[test]
fn test_vertex_order_cannot_reverse_source_claims() {
    let line_layer = lines(vec![make_line(1, &[[1.0, 0.0], [0.0, 0.0]])]);
    let point_layer = points(vec![make_point(1, 2, [0.0, 0.0]), make_point(2, 5, [1.0, 0.0])]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();

    network.resolve_directions(ResolveMethod::FromSources).unwrap();
    let err = network.resolve_directions(ResolveMethod::VertexOrder).unwrap_err();
    assert!(matches!(
        err,
        NetworkError::DirectionConflict { claimed_by: Claim::Source(_), .. }
    ));
}

// -- traversal --

#[test]
fn test_get_outlet_follows_flow_to_outfall() {
    let network = resolved_outfall_network();
    assert_eq!(
        network.get_outlet(&FeatureId::Int(20847)).unwrap(),
        Some(FeatureId::Int(21134))
    );
    assert_eq!(
        network.get_outlet(&FeatureId::Int(20850)).unwrap(),
        Some(FeatureId::Int(21134))
    );
    // the outfall is its own outlet
    assert_eq!(
        network.get_outlet(&FeatureId::Int(21134)).unwrap(),
        Some(FeatureId::Int(21134))
    );
}

#[test]
fn test_get_outlet_requires_resolution() {
    let network = outfall_network();
    let err = network.get_outlet(&FeatureId::Int(20847)).unwrap_err();
    assert!(matches!(err, NetworkError::Unresolved(_)));
}

#[test]
fn test_get_outlet_unknown_point() {
    let network = resolved_outfall_network();
    let err = network.get_outlet(&FeatureId::Int(1)).unwrap_err();
    assert!(matches!(err, NetworkError::UnknownPoint(FeatureId::Int(1))));
}

#[test]
fn test_point_off_the_graph_has_no_outlet_or_downstream() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0]])]);
    let point_layer = points(vec![make_point(1, 5, [1.0, 0.0]), make_point(2, 2, [7.0, 7.0])]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
    network.resolve_directions(ResolveMethod::FromSources).unwrap();

    assert!(!network.has_point(&FeatureId::Int(2)));
    assert!(network.point(&FeatureId::Int(2)).is_some());
    assert_eq!(network.get_outlet(&FeatureId::Int(2)).unwrap(), None);
    assert!(network.find_downstream(&FeatureId::Int(2)).unwrap().is_none());
}

#[test]
fn test_outlet_without_point_is_an_error() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]])]);
    let point_layer = points(vec![make_point(1, 2, [0.0, 0.0])]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
    network.resolve_directions(ResolveMethod::VertexOrder).unwrap();

    let err = network.get_outlet(&FeatureId::Int(1)).unwrap_err();
    assert!(matches!(err, NetworkError::NoPointAtOutlet { x, .. } if (x - 2.0).abs() < 1e-9));
}

#[test]
fn test_source_on_a_loop_has_no_outlet() {
    let line_layer = lines(vec![make_line(
        1,
        &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]],
    )]);
    let point_layer = points(vec![make_point(1, 5, [0.0, 0.0])]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
    network.resolve_directions(ResolveMethod::FromSources).unwrap();

    let err = network.get_outlet(&FeatureId::Int(1)).unwrap_err();
    assert!(matches!(err, NetworkError::NoOutlet(_)));
}

/// Catch basin 245051 drains through a manhole to culvert inlet 244132, which
/// continues on to outfall 244200.
fn culvert_network() -> Network {
    let line_layer = lines(vec![
        make_line(10, &[[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]]),
        make_line(11, &[[10.0, 0.0], [20.0, 0.0]]),
    ]);
    let point_layer = points(vec![
        make_point(245051, 2, [0.0, 0.0]),
        make_point(245060, 4, [5.0, 0.0]),
        make_point(244132, 5, [10.0, 0.0]),
        make_point(244200, 9, [20.0, 0.0]),
    ]);
    Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap()
}

#[test]
fn test_find_downstream_returns_first_source() {
    let mut network = culvert_network();
    let found = network.find_downstream(&FeatureId::Int(245051)).unwrap();
    assert_eq!(found.map(|p| p.id.clone()), Some(FeatureId::Int(244132)));

    network.resolve_directions(ResolveMethod::VertexOrder).unwrap();
    let found = network.find_downstream(&FeatureId::Int(245051)).unwrap();
    assert_eq!(found.map(|p| p.id.clone()), Some(FeatureId::Int(244132)));
    let found = network.find_downstream(&FeatureId::Int(244132)).unwrap();
    assert_eq!(found.map(|p| p.id.clone()), Some(FeatureId::Int(244200)));
    assert!(network.find_downstream(&FeatureId::Int(244200)).unwrap().is_none());
}

#[test]
fn test_find_downstream_unknown_point() {
    let network = culvert_network();
    let err = network.find_downstream(&FeatureId::Int(7)).unwrap_err();
    assert!(matches!(err, NetworkError::UnknownPoint(_)));
}

/// A catch basin at a fork whose branches end at separate outfalls.
fn forked_network(east_first: bool) -> Network {
    let east = make_line(1, &[[0.0, 0.0], [10.0, 0.0]]);
    let north = make_line(2, &[[0.0, 0.0], [0.0, 10.0]]);
    let line_layer = lines(if east_first { vec![east, north] } else { vec![north, east] });
    let point_layer = points(vec![
        make_point(1, 2, [0.0, 0.0]),
        make_point(2, 9, [10.0, 0.0]),
        make_point(3, 9, [0.0, 10.0]),
    ]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
    network.resolve_directions(ResolveMethod::VertexOrder).unwrap();
    network
}

#[test]
fn test_fork_takes_first_outlet_in_preorder() {
    let network = forked_network(true);
    assert_eq!(network.get_outlet(&FeatureId::Int(1)).unwrap(), Some(FeatureId::Int(2)));

    let network = forked_network(false);
    assert_eq!(network.get_outlet(&FeatureId::Int(1)).unwrap(), Some(FeatureId::Int(3)));
}

#[test]
fn test_shared_outfall_coordinate_returns_earlier_point() {
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [10.0, 0.0]])]);
    let build = |order: [i64; 2]| {
        let point_layer = points(vec![
            make_point(1, 2, [0.0, 0.0]),
            make_point(order[0], 9, [10.0, 0.0]),
            make_point(order[1], 4, [10.0, 0.0]),
        ]);
        let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
        network.resolve_directions(ResolveMethod::FromSources).unwrap();
        network
    };

    let network = build([21134, 21135]);
    assert_eq!(network.get_outlet(&FeatureId::Int(1)).unwrap(), Some(FeatureId::Int(21134)));
    let network = build([21135, 21134]);
    assert_eq!(network.get_outlet(&FeatureId::Int(1)).unwrap(), Some(FeatureId::Int(21135)));
}

#[test]
fn test_find_downstream_only_checks_first_point_at_a_coordinate() {
    // manhole 2 is listed before culvert inlet 3 at (10,0)
    let line_layer = lines(vec![make_line(1, &[[0.0, 0.0], [10.0, 0.0], [20.0, 0.0]])]);
    let point_layer = points(vec![
        make_point(1, 2, [0.0, 0.0]),
        make_point(2, 4, [10.0, 0.0]),
        make_point(3, 5, [10.0, 0.0]),
        make_point(4, 9, [20.0, 0.0]),
    ]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();
    network.resolve_directions(ResolveMethod::VertexOrder).unwrap();

    let found = network.find_downstream(&FeatureId::Int(1)).unwrap();
    assert_eq!(found.map(|p| p.id.clone()), Some(FeatureId::Int(4)));
    let at = Node::rounded(10.0, 0.0, 3);
    let ids: Vec<_> = network.points_at(&at).map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec![FeatureId::Int(2), FeatureId::Int(3)]);
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Warnings logged while `f` runs.
fn warnings_during(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_shared_coordinate_warns_once_per_query() {
    // two sinks share every vertex of a loop that the search walks around before
    // reaching the outfall
    let line_layer = lines(vec![
        make_line(1, &[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]),
        make_line(2, &[[10.0, 0.0], [20.0, 0.0]]),
    ]);
    let point_layer = points(vec![
        make_point(1, 2, [0.0, 0.0]),
        make_point(2, 8, [10.0, 0.0]),
        make_point(3, 8, [10.0, 0.0]),
        make_point(4, 9, [20.0, 0.0]),
        make_point(5, 9, [20.0, 0.0]),
    ]);
    let mut network = Network::new(&line_layer, &point_layer, &NetworkConfig::default()).unwrap();

    let logs = warnings_during(|| {
        let found = network.find_downstream(&FeatureId::Int(1)).unwrap();
        assert_eq!(found.map(|p| p.id.clone()), Some(FeatureId::Int(4)));
    });
    assert_eq!(logs.matches("points share coordinate").count(), 1, "{logs}");

    network.resolve_directions(ResolveMethod::FromSources).unwrap();
    let logs = warnings_during(|| {
        assert_eq!(network.get_outlet(&FeatureId::Int(1)).unwrap(), Some(FeatureId::Int(4)));
    });
    assert_eq!(logs.matches("points share coordinate").count(), 1, "{logs}");
}

// -- catchment boundary --

#[test]
fn test_clip_points_includes_boundary() {
    let network = outfall_network();
    let clipped = network.clip_points(&catchment([0.0, -5.0], [20.0, 5.0])).unwrap();
    let ids: Vec<&FeatureId> = clipped.iter().map(|p| &p.id).collect();
    assert_eq!(ids, vec![&FeatureId::Int(20847), &FeatureId::Int(20900)]);
}

#[test]
fn test_outlet_points_leave_the_catchment() {
    let network = resolved_outfall_network();
    let outlets = network.get_outlet_points(&catchment([-5.0, -5.0], [5.0, 5.0])).unwrap();
    assert_eq!(outlets, vec![FeatureId::Int(21134)]);

    // two sinks draining to the same outfall report it once
    let outlets = network.get_outlet_points(&catchment([-15.0, -5.0], [5.0, 5.0])).unwrap();
    assert_eq!(outlets, vec![FeatureId::Int(21134)]);
}

#[test]
fn test_inlet_points_drain_into_the_catchment() {
    let network = resolved_outfall_network();
    let inlets = network.get_inlet_points(&catchment([25.0, -5.0], [35.0, 5.0])).unwrap();
    assert_eq!(
        inlets,
        vec![
            FeatureId::Int(20840),
            FeatureId::Int(20847),
            FeatureId::Int(20850),
            FeatureId::Int(20900),
        ]
    );
}

#[test]
fn test_boundary_node_counts_as_outside_for_inlets() {
    let network = resolved_outfall_network();
    // 20900 sits on the western edge, so it both clips in and reports as an inlet
    let inlets = network.get_inlet_points(&catchment([20.0, -5.0], [35.0, 5.0])).unwrap();
    assert!(inlets.contains(&FeatureId::Int(20900)));
    assert!(inlets.contains(&FeatureId::Int(20847)));
    assert!(inlets.contains(&FeatureId::Int(20850)));
    assert!(!inlets.contains(&FeatureId::Int(21134)));
}

#[test]
fn test_self_contained_catchment_has_no_inlets_or_outlets() {
    let network = resolved_outfall_network();
    let everything = catchment([-20.0, -20.0], [40.0, 20.0]);
    assert!(network.get_outlet_points(&everything).unwrap().is_empty());
    assert!(network.get_inlet_points(&everything).unwrap().is_empty());
}

#[test]
fn test_inlet_points_require_resolution() {
    let network = outfall_network();
    let err = network
        .get_inlet_points(&catchment([25.0, -5.0], [35.0, 5.0]))
        .unwrap_err();
    assert!(matches!(err, NetworkError::Unresolved(_)));
}

#[test]
fn test_catchment_crs_must_match() {
    let network = resolved_outfall_network();
    let mut other = catchment([-5.0, -5.0], [5.0, 5.0]);
    other.crs = Some("EPSG:4326".to_string());
    let err = network.get_outlet_points(&other).unwrap_err();
    assert!(matches!(err, NetworkError::CatchmentCrsMismatch { .. }));
}
