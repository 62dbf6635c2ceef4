use std::fs;
use std::path::PathBuf;

use cadview_core::geometry::Point2;
use cadview_core::scene::{Entity, Scene};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GoldenScene {
    layers: Vec<String>,
    extents: GoldenExtents,
    entities: Vec<GoldenEntity>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenExtents {
    min: [f64; 2],
    max: [f64; 2],
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GoldenEntity {
    kind: String,
    layer: String,
    color: Option<String>,
    data: Value,
}

/// 将场景与 `tests/data/golden/{name}.json` 比较。文件缺失时写入当前结果并失败，
/// 提示人工确认。
pub fn assert_golden(name: &str, scene: &Scene) {
    let snapshot = GoldenScene::from_scene(scene);
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/golden");
    if let Err(err) = fs::create_dir_all(&base_dir) {
        panic!("无法创建黄金数据目录 {}: {err}", base_dir.display());
    }
    let golden_path = base_dir.join(format!("{name}.json"));
    let serialized = serde_json::to_string_pretty(&snapshot).expect("序列化黄金快照失败");

    if !golden_path.exists() {
        fs::write(&golden_path, &serialized)
            .unwrap_or_else(|err| panic!("写入黄金文件 {} 失败: {err}", golden_path.display()));
        panic!(
            "黄金文件 {} 不存在，已自动生成。请确认内容后重新运行测试。",
            golden_path.display()
        );
    }

    let expected_str = fs::read_to_string(&golden_path)
        .unwrap_or_else(|err| panic!("读取黄金文件 {} 失败: {err}", golden_path.display()));
    let expected: GoldenScene = serde_json::from_str(&expected_str)
        .unwrap_or_else(|err| panic!("解析黄金文件 {} 失败: {err}", golden_path.display()));

    if expected != snapshot {
        let diff_path = base_dir.join(format!("{name}.actual.json"));
        fs::write(&diff_path, &serialized).expect("写入差异文件失败");
        panic!(
            "黄金文件 {} 与当前解析结果不一致。已生成对照输出 {}。",
            golden_path.display(),
            diff_path.display()
        );
    }
}

impl GoldenScene {
    fn from_scene(scene: &Scene) -> Self {
        let extents = scene.extents();
        Self {
            layers: scene.layers().map(str::to_string).collect(),
            extents: GoldenExtents {
                min: point_to_array(extents.min),
                max: point_to_array(extents.max),
            },
            entities: scene.entities().iter().map(entity_to_golden).collect(),
        }
    }
}

fn entity_to_golden(entity: &Entity) -> GoldenEntity {
    let data = match entity {
        Entity::Line(line) => json!({
            "start": point_to_array(line.start),
            "end": point_to_array(line.end)
        }),
        Entity::Polyline(polyline) => {
            let points: Vec<[f64; 2]> = polyline.points.iter().map(|p| point_to_array(*p)).collect();
            json!({
                "points": points,
                "closed": polyline.closed
            })
        }
        Entity::Circle(circle) => json!({
            "center": point_to_array(circle.center),
            "radius": circle.radius
        }),
        Entity::Arc(arc) => json!({
            "center": point_to_array(arc.center),
            "radius": arc.radius,
            "start_angle": arc.start_angle,
            "end_angle": arc.end_angle
        }),
        Entity::Text(text) => json!({
            "insert": point_to_array(text.insert),
            "height": text.height,
            "content": text.content
        }),
    };
    GoldenEntity {
        kind: entity.kind_name().to_string(),
        layer: entity.layer_name().to_string(),
        color: entity.color().map(|rgb| rgb.to_hex()),
        data,
    }
}

fn point_to_array(point: Point2) -> [f64; 2] {
    [point.x(), point.y()]
}
