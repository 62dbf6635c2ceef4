mod golden;

use std::io::Write;
use std::path::{Path, PathBuf};

use cadview_core::geometry::Point2;
use cadview_core::scene::{Drawing, Entity, Extents, Scene};
use cadview_io::{DocumentLoader, DrawingFacade, IoError, parse_dxf, parse_dxf_with_report};
use golden::assert_golden;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

fn load_scene(path: &Path) -> Scene {
    match DrawingFacade::new().load(path).expect("读取 DXF 失败") {
        Drawing::Dxf(scene) => scene,
        Drawing::Svg(_) => panic!("期望得到 DXF 场景"),
    }
}

fn entities(body: &str) -> String {
    format!("0\nSECTION\n2\nENTITIES\n{body}0\nENDSEC\n0\nEOF\n")
}

#[test]
fn load_basic_entities_matches_expected_scene() {
    let scene = load_scene(&fixture("basic_entities.dxf"));
    assert_golden("basic_entities", &scene);
}

#[test]
fn tags_outside_entities_never_emit_entities() {
    let source = "0\nSECTION\n2\nHEADER\n0\nLINE\n10\n0\n20\n0\n11\n5\n21\n5\n0\nENDSEC\n\
                  0\nSECTION\n2\nTABLES\n0\nCIRCLE\n8\nHIDDEN\n10\n1\n20\n1\n40\n3\n0\nENDSEC\n\
                  0\nLINE\n10\n0\n20\n0\n11\n9\n21\n9\n0\nEOF\n";
    let scene = parse_dxf(source);
    assert!(scene.entities().is_empty());
    assert_eq!(scene.layers().count(), 0);
    assert_eq!(scene.extents(), Extents::PLACEHOLDER);
}

#[test]
fn single_line_yields_exact_entity_and_extents() {
    let scene = parse_dxf(&entities("0\nLINE\n10\n0\n20\n0\n11\n10\n21\n0\n"));
    assert_eq!(scene.entities().len(), 1);
    match &scene.entities()[0] {
        Entity::Line(line) => {
            assert_eq!(line.start, Point2::new(0.0, 0.0));
            assert_eq!(line.end, Point2::new(10.0, 0.0));
            assert_eq!(line.layer, "0");
            assert!(line.color.is_none());
        }
        other => panic!("期望线段，实际为 {other:?}"),
    }
    assert_eq!(scene.extents().min, Point2::new(0.0, 0.0));
    assert_eq!(scene.extents().max, Point2::new(10.0, 0.0));
}

#[test]
fn closed_lwpolyline_collects_every_vertex() {
    let scene = parse_dxf(&entities(
        "0\nLWPOLYLINE\n8\nDUCT\n90\n3\n70\n1\n10\n0\n20\n0\n10\n4\n20\n0\n10\n4\n20\n3\n",
    ));
    let mut polylines = scene.entities().iter().filter_map(|entity| match entity {
        Entity::Polyline(polyline) => Some(polyline),
        _ => None,
    });
    let polyline = polylines.next().expect("未找到多段线实体");
    assert!(polylines.next().is_none(), "期望仅有一个多段线实体");
    assert_eq!(polyline.points.len(), 3);
    assert!(polyline.closed);
    assert_eq!(polyline.points[2], Point2::new(4.0, 3.0));
    assert_eq!(scene.extents().max, Point2::new(4.0, 3.0));
}

#[test]
fn open_lwpolyline_ignores_other_flag_bits() {
    let scene = parse_dxf(&entities(
        "0\nLWPOLYLINE\n70\n128\n10\n0\n20\n0\n10\n1\n20\n1\n",
    ));
    match &scene.entities()[0] {
        Entity::Polyline(polyline) => assert!(!polyline.closed),
        other => panic!("期望多段线，实际为 {other:?}"),
    }
}

#[test]
fn circle_expands_extents_by_radius() {
    let scene = parse_dxf(&entities("0\nCIRCLE\n10\n5\n20\n5\n40\n2\n"));
    assert_eq!(scene.extents().min, Point2::new(3.0, 3.0));
    assert_eq!(scene.extents().max, Point2::new(7.0, 7.0));
}

#[test]
fn empty_and_entityless_input_yield_placeholder() {
    for source in [
        "",
        "0\nSECTION\n2\nENTITIES\n0\nENDSEC\n0\nEOF\n",
        "this is not a drawing\nat all\n",
    ] {
        let (scene, report) = parse_dxf_with_report(source);
        assert!(scene.entities().is_empty(), "source {source:?}");
        assert_eq!(scene.extents(), Extents::PLACEHOLDER);
        assert_eq!(report.entity_count, 0);
    }
}

#[test]
fn last_entity_without_terminator_is_kept() {
    let scene = load_scene(&fixture("unterminated_crlf.dxf"));
    assert_eq!(scene.entities().len(), 2);
    match scene.entities().last() {
        Some(Entity::Circle(circle)) => {
            assert_eq!(circle.center, Point2::new(5.0, 5.0));
            assert_eq!(circle.layer, "TERMINALS");
        }
        other => panic!("期望最后一个实体为圆，实际为 {other:?}"),
    }
    let layers: Vec<&str> = scene.layers().collect();
    assert_eq!(layers, vec!["0", "TERMINALS"]);
    assert_eq!(scene.extents().min, Point2::new(0.0, 0.0));
    assert_eq!(scene.extents().max, Point2::new(10.0, 7.0));
}

#[test]
fn facade_reads_temp_file_and_rejects_other_extensions() {
    let mut file = tempfile::Builder::new()
        .suffix(".DXF")
        .tempfile()
        .expect("create temp file");
    write!(file, "{}", entities("0\nCIRCLE\n10\n0\n20\n0\n40\n1\n")).unwrap();
    let scene = load_scene(file.path());
    assert_eq!(scene.entities().len(), 1);

    let err = DrawingFacade::new()
        .load(Path::new("panel.dwg"))
        .unwrap_err();
    assert!(matches!(err, IoError::UnsupportedFormat { .. }));
}

#[test]
fn missing_file_reports_read_error() {
    let err = DrawingFacade::new()
        .load(&fixture("does_not_exist.dxf"))
        .unwrap_err();
    match err {
        IoError::ReadError { path, .. } => assert!(path.ends_with("does_not_exist.dxf")),
        other => panic!("期望读取错误，实际为 {other:?}"),
    }
}

#[test]
fn svg_file_is_loaded_as_opaque_markup() {
    let mut file = tempfile::Builder::new()
        .suffix(".svg")
        .tempfile()
        .expect("create temp file");
    let markup = "<svg viewBox=\"0 0 10 10\"><path d=\"M0 0L10 10\"/></svg>";
    write!(file, "{markup}").unwrap();
    match DrawingFacade::new().load(file.path()).expect("读取 SVG 失败") {
        Drawing::Svg(svg) => assert_eq!(svg.as_str(), markup),
        Drawing::Dxf(_) => panic!("期望 SVG 透传"),
    }
}
