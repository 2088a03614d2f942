use glam::{Mat4, Vec3, Vec4};
use log::info;

use brick_renderer::asset::{MeshData, MeshKey, PartLibrary, TextureKey};
use brick_renderer::renderer::primitives::box_mesh;
use brick_renderer::renderer::Vertex;
use brick_renderer::scene::{ColorPair, Node, Primitive, TextureFrame};

/// Studs are 20 units apart and a brick is 24 units tall.
const STUD: f32 = 20.0;
const BRICK_HEIGHT: f32 = 24.0;

#[derive(Clone, Copy, Debug)]
pub enum DemoScene {
    SingleBrick,
    Wall { rows: u32, columns: u32 },
    Document,
}

impl DemoScene {
    pub const ALL: [DemoScene; 3] = [
        DemoScene::SingleBrick,
        DemoScene::Wall {
            rows: 8,
            columns: 12,
        },
        DemoScene::Document,
    ];

    pub fn build(self, library: &mut PartLibrary, texture: TextureKey) -> Node {
        info!("Building demo scene {:?}", self);
        let brick = library.insert(brick_mesh(2, 4));
        let plate = library.insert(brick_mesh(1, 2));
        match self {
            DemoScene::SingleBrick => setup_single_brick(library, brick),
            DemoScene::Wall { rows, columns } => setup_wall(library, brick, rows, columns),
            DemoScene::Document => setup_document(library, brick, plate, texture),
        }
    }
}

/// A `width` by `depth` stud brick centered on the origin.
pub fn brick_mesh(width: u32, depth: u32) -> MeshData {
    let scale = Vec3::new(width as f32 * STUD, BRICK_HEIGHT, depth as f32 * STUD);
    let unit = box_mesh();
    let vertices = unit
        .vertices
        .iter()
        .map(|vertex| Vertex {
            pos: (vertex.position() * scale).to_array(),
            ..*vertex
        })
        .collect();
    MeshData::new(vertices, unit.triangle_indices, unit.line_indices)
}

fn part(library: &PartLibrary, key: MeshKey) -> Node {
    Node::part(library.mesh_ref(key))
}

fn setup_single_brick(library: &PartLibrary, brick: MeshKey) -> Node {
    Node::group().with_child(part(library, brick).with_color(ColorPair::rgb(0.8, 0.1, 0.1)))
}

fn setup_wall(library: &PartLibrary, brick: MeshKey, rows: u32, columns: u32) -> Node {
    let palette = [
        ColorPair::rgb(0.8, 0.1, 0.1),
        ColorPair::rgb(0.9, 0.8, 0.1),
        ColorPair::rgb(0.1, 0.3, 0.8),
    ];
    let mut wall = Node::group();
    for row in 0..rows {
        let offset = if row % 2 == 0 { 0.0 } else { STUD };
        let mut course = Node::step().with_transform(Mat4::from_translation(Vec3::new(
            offset,
            -(row as f32) * BRICK_HEIGHT,
            0.0,
        )));
        for column in 0..columns {
            let color = palette[((row + column) as usize) % palette.len()];
            course = course.with_child(
                part(library, brick)
                    .with_color(color)
                    .with_transform(Mat4::from_translation(Vec3::new(
                        column as f32 * 2.0 * STUD,
                        0.0,
                        0.0,
                    ))),
            );
        }
        wall = wall.with_child(course);
    }
    wall
}

/// Exercises most directive kinds: steps, mirrored and translucent parts,
/// inline edge lines, a textured decal, a hidden part and a drag handle.
fn setup_document(
    library: &PartLibrary,
    brick: MeshKey,
    plate: MeshKey,
    texture: TextureKey,
) -> Node {
    let base = Node::step()
        .with_child(part(library, brick).with_color(ColorPair::rgb(0.3, 0.3, 0.3)))
        .with_child(
            part(library, brick)
                .with_color(ColorPair::rgb(0.3, 0.3, 0.3))
                .with_transform(
                    Mat4::from_translation(Vec3::new(-4.0 * STUD, 0.0, 0.0))
                        * Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)),
                ),
        );

    let glass = ColorPair::new(Vec4::new(0.6, 0.8, 1.0, 0.5), Vec4::new(0.2, 0.3, 0.4, 1.0));
    let upper = Node::step()
        .with_transform(Mat4::from_translation(Vec3::new(0.0, -BRICK_HEIGHT, 0.0)))
        .with_child(part(library, plate).with_color(glass))
        .with_child(part(library, plate).hidden(true))
        .with_child(Node::drag_handle(Vec3::new(0.0, -BRICK_HEIGHT, 0.0), 7.0));

    let half = 2.0 * STUD;
    let outline = Node::primitives(vec![
        Primitive::line(Vec3::new(-half, 12.0, -half), Vec3::new(half, 12.0, -half)),
        Primitive::line(Vec3::new(half, 12.0, -half), Vec3::new(half, 12.0, half)),
        Primitive::line(Vec3::new(half, 12.0, half), Vec3::new(-half, 12.0, half)),
        Primitive::line(Vec3::new(-half, 12.0, half), Vec3::new(-half, 12.0, -half)),
    ])
    .collecting();

    let decal = Node::texture(TextureFrame::new(
        texture,
        Vec4::new(1.0 / (2.0 * half), 0.0, 0.0, 0.5),
        Vec4::new(0.0, 0.0, 1.0 / (2.0 * half), 0.5),
    ))
    .collecting()
    .with_color(ColorPair::rgb(1.0, 1.0, 1.0))
    .with_child(Node::primitive(Primitive::quad(
        Vec3::new(-half, 13.0, -half),
        Vec3::new(-half, 13.0, half),
        Vec3::new(half, 13.0, half),
        Vec3::new(half, 13.0, -half),
    )));

    Node::group()
        .with_child(base)
        .with_child(upper)
        .with_child(outline)
        .with_child(decal)
}
