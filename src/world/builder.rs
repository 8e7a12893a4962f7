//! Procedural construction of the rainforest clearing

use std::f32::consts::{FRAC_PI_3, FRAC_PI_4, FRAC_PI_6, FRAC_PI_8, PI, TAU};

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use image::{Rgba, RgbaImage};
use rand::Rng;

use super::{place, ScatterCategory, WorldConfig};
use crate::error::DuplicateTagError;
use crate::mirror::canvas::{rgb, Canvas, TextRasterizer};
use crate::resources::{hex_color, Material, Mesh, Side, TextureData};
use crate::scene::{
    AmbientLight, DirectionalLight, Fog, SceneGraph, SceneLights, SceneNode, SpotLight,
    TextureSource, Transform,
};
use crate::surface::{InteractiveSurface, SurfaceAction, ASSISTANT_PANEL_TAG, VIDEO_SCREEN_TAG};

/// Mirror binding feeding the video screen
pub const VIDEO_MIRROR: usize = 0;
/// Mirror binding feeding the assistant panel
pub const ASSISTANT_MIRROR: usize = 1;

const BACKGROUND: u32 = 0x0a380a;
const STAGE_CENTER: Vec3 = Vec3::new(0.0, 0.0, -4.0);
const HOLLOW_CENTER: Vec3 = Vec3::new(-3.5, 1.5, -3.5);
/// Distance from the hollow's axis to the front of the assistant panel
const PANEL_OFFSET: f32 = 1.05;

/// Where an overlay widget sits in the world
///
/// `world` maps widget pixels (centred, +Y up) into world space, so a widget of `pixel_size`
/// covers the same area as its mirrored surface.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayAnchor {
    /// Name of the widget shown at this anchor
    pub widget: String,
    pub world: Mat4,
    pub pixel_size: (u32, u32),
}

/// Everything produced by one build
#[derive(Debug)]
pub struct World {
    pub graph: SceneGraph,
    pub lights: SceneLights,
    pub surfaces: Vec<InteractiveSurface>,
    pub overlay_anchors: Vec<OverlayAnchor>,
    /// Decorations whose placement hit the attempt cap
    pub fallback_placements: usize,
}

/// Builds a [`World`] from a config and a random source
#[derive(Debug, Clone, Default)]
pub struct WorldBuilder {
    config: WorldConfig,
}

impl WorldBuilder {
    pub fn new(config: WorldConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn build(&self, rng: &mut impl Rng) -> Result<World, DuplicateTagError> {
        let mut graph = SceneGraph::new();
        let mut fallbacks = 0;

        self.add_ground(&mut graph, rng)?;

        let categories: [(&str, &ScatterCategory, DecorationFn); 5] = [
            ("trees", &self.config.trees, tree),
            ("bushes", &self.config.bushes, bush),
            ("vines", &self.config.vines, vine),
            ("rocks", &self.config.rocks, rock),
            ("flowers", &self.config.flowers, flower),
        ];
        for (name, category, decorate) in categories {
            let mut group = SceneNode::group(name, Transform::default());
            for _ in 0..category.count {
                let placement = place(rng, category);
                fallbacks += placement.fallback as usize;
                group.add_child(decorate(&mut graph, rng, placement.position));
            }
            graph.add_node(group)?;
        }
        fallbacks += add_butterflies(&mut graph, rng, &self.config.butterflies);

        let pond_mesh = graph.add_mesh(Mesh::disc(3.0, 32));
        let pond_material =
            graph.add_material(Material::standard("pond", 0x1e90ff, 0.2).with_opacity(0.7));
        graph.add_node(SceneNode::mesh(
            "pond",
            pond_mesh,
            pond_material,
            Transform::from_position(Vec3::new(8.0, 0.05, -8.0)),
        ))?;

        let mut surfaces = Vec::new();
        let mut overlay_anchors = Vec::new();
        self.add_video_stage(&mut graph, &mut surfaces, &mut overlay_anchors)?;
        self.add_assistant_hollow(&mut graph, rng, &mut surfaces, &mut overlay_anchors)?;

        let lights = self.lights(rng);

        if fallbacks > 0 {
            log::warn!("{fallbacks} decorations were pushed to their clearance boundary");
        }
        log::info!(
            "World built: {} nodes, {} meshes, {} materials",
            graph.node_count(),
            graph.meshes().len(),
            graph.materials().len()
        );

        Ok(World {
            graph,
            lights,
            surfaces,
            overlay_anchors,
            fallback_placements: fallbacks,
        })
    }

    fn add_ground(&self, graph: &mut SceneGraph, rng: &mut impl Rng) -> Result<(), DuplicateTagError> {
        let floor_mesh = graph.add_mesh(Mesh::disc(30.0, 32));
        let floor_material = graph.add_material(Material::standard("forest-floor", 0x553311, 0.9));
        graph.add_node(SceneNode::mesh(
            "forest-floor",
            floor_mesh,
            floor_material,
            Transform::default(),
        ))?;

        let litter = graph.add_texture(TextureSource::Static(leaf_litter(rng, 256)));
        let details_mesh = graph.add_mesh(Mesh::plane(60.0, 60.0, 1));
        let details_material = graph.add_material(
            Material::standard("ground-details", 0x2d1e0f, 1.0)
                .with_side(Side::Double)
                .blended()
                .with_texture(litter),
        );
        graph.add_node(SceneNode::mesh(
            "ground-details",
            details_mesh,
            details_material,
            Transform::from_position(Vec3::new(0.0, 0.01, 0.0)),
        ))?;

        let sky_mesh = graph.add_mesh(Mesh::hemisphere(40.0, 32, 16));
        let sky_material = graph.add_material(
            Material::standard("canopy", 0x88aa44, 1.0).with_side(Side::Back),
        );
        graph.add_node(SceneNode::mesh("canopy", sky_mesh, sky_material, Transform::default()))?;
        Ok(())
    }

    fn add_video_stage(
        &self,
        graph: &mut SceneGraph,
        surfaces: &mut Vec<InteractiveSurface>,
        anchors: &mut Vec<OverlayAnchor>,
    ) -> Result<(), DuplicateTagError> {
        let bark = graph.add_material(Material::standard("stump-bark", 0x8b4513, 0.9));
        let moss = graph.add_material(Material::standard("moss", 0x2e8b57, 0.8));
        let wood = graph.add_material(Material::standard("frame-wood", 0x8b4513, 0.8));

        let stump = graph.add_mesh(Mesh::frustum(1.2, 1.5, 1.2, 16, false));
        let moss_ring = graph.add_mesh(Mesh::frustum(1.21, 1.51, 0.1, 16, false));
        let frame = graph.add_mesh(Mesh::cube());

        let stage = SceneNode::group("video-stage", Transform::from_position(STAGE_CENTER))
            .with_child(SceneNode::mesh(
                "stump",
                stump,
                bark,
                Transform::from_position(Vec3::new(0.0, 0.6, 0.0)),
            ))
            .with_child(SceneNode::mesh(
                "moss",
                moss_ring,
                moss,
                Transform::from_position(Vec3::new(0.0, 1.15, 0.0)),
            ))
            .with_child(SceneNode::mesh(
                "frame",
                frame,
                wood,
                Transform::from_position(Vec3::new(0.0, 2.2, 0.0))
                    .with_scale(Vec3::new(2.2, 1.3, 0.1)),
            ));
        graph.add_node(stage)?;

        let video_texture = graph.add_texture(TextureSource::Mirror(VIDEO_MIRROR));
        let screen_mesh = graph.add_mesh(Mesh::quad(2.0, 1.125));
        let screen_material = graph.add_material(
            Material::new("video-screen")
                .unlit()
                .with_texture(video_texture),
        );
        let screen = graph.add_node(
            SceneNode::mesh(
                "video-screen",
                screen_mesh,
                screen_material,
                Transform::from_position(Vec3::new(0.0, 2.2, -3.94)),
            )
            .with_tag(VIDEO_SCREEN_TAG),
        )?;
        surfaces.push(InteractiveSurface::new(
            VIDEO_SCREEN_TAG,
            screen,
            SurfaceAction::TogglePlayback,
        ));

        anchors.push(OverlayAnchor {
            widget: "video".into(),
            world: Mat4::from_scale_rotation_translation(
                Vec3::splat(0.001),
                Quat::IDENTITY,
                Vec3::new(0.0, 2.2, -3.95),
            ),
            pixel_size: (1920, 1080),
        });
        Ok(())
    }

    fn add_assistant_hollow(
        &self,
        graph: &mut SceneGraph,
        rng: &mut impl Rng,
        surfaces: &mut Vec<InteractiveSurface>,
        anchors: &mut Vec<OverlayAnchor>,
    ) -> Result<(), DuplicateTagError> {
        let facing = Quat::from_rotation_y(FRAC_PI_6);

        let outer = graph.add_mesh(Mesh::frustum(1.0, 1.0, 2.5, 32, true));
        let inner = graph.add_mesh(Mesh::frustum(0.9, 0.9, 2.5, 32, true));
        let outer_material = graph.add_material(
            Material::standard("hollow-bark", 0x8b4513, 0.9).with_side(Side::Double),
        );
        let inner_material = graph.add_material(
            Material::standard("hollow-inner", 0x654321, 0.7).with_side(Side::Double),
        );
        let hollow = SceneNode::group(
            "assistant-hollow",
            Transform::from_position_rotation(HOLLOW_CENTER, facing),
        )
        .with_child(SceneNode::mesh("hollow-outer", outer, outer_material, Transform::default()))
        .with_child(SceneNode::mesh("hollow-inner", inner, inner_material, Transform::default()));
        graph.add_node(hollow)?;

        let panel_position = HOLLOW_CENTER + facing * Vec3::new(0.0, 0.0, PANEL_OFFSET);
        let assistant_texture = graph.add_texture(TextureSource::Mirror(ASSISTANT_MIRROR));
        let panel_mesh = graph.add_mesh(Mesh::quad(1.5, 2.0));
        let panel_material = graph.add_material(
            Material::new("assistant-panel")
                .unlit()
                .with_texture(assistant_texture),
        );
        let panel = graph.add_node(
            SceneNode::mesh(
                "assistant-panel",
                panel_mesh,
                panel_material,
                Transform::from_position_rotation(panel_position, facing),
            )
            .with_tag(ASSISTANT_PANEL_TAG),
        )?;
        surfaces.push(InteractiveSurface::new(
            ASSISTANT_PANEL_TAG,
            panel,
            SurfaceAction::ToggleAssistant,
        ));
        anchors.push(OverlayAnchor {
            widget: "assistant-panel".into(),
            world: Mat4::from_scale_rotation_translation(
                Vec3::splat(1.5 / 600.0),
                facing,
                panel_position,
            ),
            pixel_size: (600, 800),
        });

        let sign = TextureData::from_image(
            paint_title_sign(rng, TextRasterizer::shared()),
            "title-sign",
        );
        let sign_texture = graph.add_texture(TextureSource::Static(sign));
        let sign_mesh = graph.add_mesh(Mesh::quad(1.5, 0.375));
        let sign_material = graph.add_material(
            Material::new("title-sign")
                .unlit()
                .with_side(Side::Double)
                .blended()
                .with_texture(sign_texture),
        );
        graph.add_node(SceneNode::mesh(
            "title-sign",
            sign_mesh,
            sign_material,
            Transform::from_position_rotation(Vec3::new(-3.5, 2.8, -3.5), facing),
        ))?;
        Ok(())
    }

    fn lights(&self, rng: &mut impl Rng) -> SceneLights {
        let spots = (0..self.config.spot_lights)
            .map(|_| SpotLight {
                position: Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(5.0..10.0),
                    rng.gen_range(-10.0..10.0),
                ),
                target: Vec3::ZERO,
                color: hex_color(0xffffaa),
                intensity: 0.5,
                range: 20.0,
                angle: FRAC_PI_8,
                penumbra: 0.5,
            })
            .collect();

        SceneLights {
            background: hex_color(BACKGROUND),
            ambient: AmbientLight {
                color: hex_color(0x90c090),
                intensity: 0.4,
            },
            directional: DirectionalLight {
                position: Vec3::new(1.0, 10.0, 1.0),
                color: hex_color(0xffeedd),
                intensity: 0.8,
            },
            spots,
            fog: (self.config.fog_density > 0.0).then(|| Fog {
                color: hex_color(BACKGROUND),
                density: self.config.fog_density,
            }),
        }
    }
}

type DecorationFn = fn(&mut SceneGraph, &mut dyn rand::RngCore, Vec2) -> SceneNode;

fn random_green(rng: &mut dyn rand::RngCore, green: std::ops::Range<f32>) -> Vec4 {
    Vec4::new(
        rng.gen_range(0.1..0.3),
        rng.gen_range(green),
        rng.gen_range(0.1..0.2),
        1.0,
    )
}

fn tree(graph: &mut SceneGraph, rng: &mut dyn rand::RngCore, at: Vec2) -> SceneNode {
    let height = rng.gen_range(5.0..15.0);
    let trunk = graph.add_mesh(Mesh::frustum(
        rng.gen_range(0.3..0.6),
        rng.gen_range(0.5..1.0),
        height,
        8,
        false,
    ));
    let bark = graph.add_material(Material::standard("trunk", 0x8b4513, 0.9));
    let foliage = graph.add_mesh(Mesh::sphere(rng.gen_range(2.0..5.0), 8, 8));
    let leaves = graph.add_material(
        Material::new("foliage")
            .with_base_color(random_green(rng, 0.5..0.8))
            .with_roughness(1.0),
    );

    let mut node = SceneNode::group("tree", Transform::from_position(Vec3::new(at.x, 0.0, at.y)))
        .with_child(SceneNode::mesh(
            "trunk",
            trunk,
            bark,
            Transform::from_position(Vec3::new(0.0, height / 2.0, 0.0)),
        ));
    for _ in 0..rng.gen_range(3..=5) {
        let offset = Vec3::new(
            rng.gen_range(-1.0..1.0),
            height - 1.0 + rng.gen_range(0.0..2.0),
            rng.gen_range(-1.0..1.0),
        );
        node.add_child(SceneNode::mesh("foliage", foliage, leaves, Transform::from_position(offset)));
    }
    node
}

fn bush(graph: &mut SceneGraph, rng: &mut dyn rand::RngCore, at: Vec2) -> SceneNode {
    let size = rng.gen_range(0.5..1.5);
    let mesh = graph.add_mesh(Mesh::sphere(size, 8, 8));
    let material = graph.add_material(
        Material::new("bush")
            .with_base_color(random_green(rng, 0.4..0.8))
            .with_roughness(1.0),
    );
    let mut node = SceneNode::group("bush", Transform::from_position(Vec3::new(at.x, 0.0, at.y)));
    for _ in 0..rng.gen_range(2..=4) {
        let offset = Vec3::new(
            rng.gen_range(-0.25..0.25),
            size * 0.7,
            rng.gen_range(-0.25..0.25),
        );
        node.add_child(SceneNode::mesh("bush-cluster", mesh, material, Transform::from_position(offset)));
    }
    node
}

fn vine(graph: &mut SceneGraph, rng: &mut dyn rand::RngCore, at: Vec2) -> SceneNode {
    let y = rng.gen_range(5.0..15.0);
    let segments = rng.gen_range(10..20);
    let length = rng.gen_range(3.0..8.0);
    let path: Vec<Vec3> = (0..=segments)
        .map(|j| {
            let t = j as f32 / segments as f32;
            let (s, c) = (t * TAU).sin_cos();
            Vec3::new(s * 0.5, -t * length, c * 0.5)
        })
        .collect();
    let mesh = graph.add_mesh(Mesh::tube(&path, 0.05, 8));
    let material = graph.add_material(Material::standard("vine", 0x2e8b57, 0.8));
    SceneNode::group("vine", Transform::from_position(Vec3::new(at.x, y, at.y)))
        .with_child(SceneNode::mesh("vine-strand", mesh, material, Transform::default()))
}

fn rock(graph: &mut SceneGraph, rng: &mut dyn rand::RngCore, at: Vec2) -> SceneNode {
    let mesh = graph.add_mesh(Mesh::rock(rng.gen_range(0.5..1.0)));
    let material = graph.add_material(Material::standard("rock", 0x888888, 0.9));
    let rotation = Vec3::new(
        rng.gen_range(0.0..PI),
        rng.gen_range(0.0..PI),
        rng.gen_range(0.0..PI),
    );
    let scale = Vec3::new(
        rng.gen_range(1.0..1.5),
        rng.gen_range(0.8..1.2),
        rng.gen_range(1.0..1.5),
    );
    SceneNode::group("rock", Transform::from_position(Vec3::new(at.x, 0.0, at.y))).with_child(
        SceneNode::mesh(
            "rock-body",
            mesh,
            material,
            Transform::from_components(Vec3::new(0.0, 0.25, 0.0), rotation, scale),
        ),
    )
}

fn flower(graph: &mut SceneGraph, rng: &mut dyn rand::RngCore, at: Vec2) -> SceneNode {
    let stem = graph.add_mesh(Mesh::cylinder(0.02, 0.5, 8));
    let stem_material = graph.add_material(Material::standard("stem", 0x228b22, 0.8));
    let petal = graph.add_mesh(Mesh::disc(0.1, 8));
    let petal_material = graph.add_material(
        Material::new("petal")
            .with_base_color(Vec4::new(
                rng.gen_range(0.8..1.0),
                rng.gen_range(0.0..0.8),
                rng.gen_range(0.0..0.8),
                1.0,
            ))
            .with_roughness(0.8)
            .with_side(Side::Double),
    );

    let mut node = SceneNode::group("flower", Transform::from_position(Vec3::new(at.x, 0.0, at.y)))
        .with_child(SceneNode::mesh(
            "stem",
            stem,
            stem_material,
            Transform::from_position(Vec3::new(0.0, 0.25, 0.0)),
        ));
    for j in 0..6 {
        let rotation = Quat::from_rotation_y(j as f32 * FRAC_PI_3) * Quat::from_rotation_x(FRAC_PI_4);
        node.add_child(SceneNode::mesh(
            "petal",
            petal,
            petal_material,
            Transform::from_position_rotation(Vec3::new(0.0, 0.5, 0.0), rotation),
        ));
    }
    node
}

/// One point cloud for the whole swarm; returns the number of fallback placements
fn add_butterflies(graph: &mut SceneGraph, rng: &mut impl Rng, category: &ScatterCategory) -> usize {
    if category.count == 0 {
        return 0;
    }
    let mut fallbacks = 0;
    let mut points = Vec::with_capacity(category.count);
    let mut colors = Vec::with_capacity(category.count);
    for _ in 0..category.count {
        let placement = place(rng, category);
        fallbacks += placement.fallback as usize;
        points.push(Vec3::new(
            placement.position.x,
            rng.gen_range(1.0..6.0),
            placement.position.y,
        ));
        colors.push(Vec4::new(
            rng.gen_range(0.5..1.0),
            rng.gen_range(0.5..1.0),
            rng.gen_range(0.5..1.0),
            1.0,
        ));
    }
    let mesh = graph.add_mesh(Mesh::point_cloud(&points, &colors));
    let material = graph.add_material(Material::new("butterflies").unlit().with_opacity(0.8));
    // Group name matches the other categories so the swarm is found the same way
    let group = SceneNode::group("butterflies", Transform::default())
        .with_child(SceneNode::mesh("swarm", mesh, material, Transform::default()));
    if let Err(e) = graph.add_node(group) {
        log::warn!("Butterflies not added: {e}");
    }
    fallbacks
}

/// Speckled alpha mask for the leaf litter over the forest floor
fn leaf_litter(rng: &mut impl Rng, size: u32) -> TextureData {
    let image = RgbaImage::from_fn(size, size, |_, _| {
        let alpha = if rng.gen_bool(0.3) { rng.gen::<u8>() } else { 0 };
        Rgba([255, 255, 255, alpha])
    });
    TextureData::from_image(image, "leaf-litter")
}

/// Green leaf sign with the assistant's title
fn paint_title_sign(rng: &mut impl Rng, text: Option<&TextRasterizer>) -> RgbaImage {
    let (w, h) = (512u32, 128u32);
    let mut image = RgbaImage::new(w, h);
    let mut canvas = Canvas::new(&mut image);
    canvas.clear(rgb(0x006400));
    let (wf, hf) = (w as f32, h as f32);
    for _ in 0..10 {
        let control = [
            Vec2::new(rng.gen_range(0.0..wf), 0.0),
            Vec2::new(rng.gen_range(0.0..wf), rng.gen_range(0.0..hf)),
            Vec2::new(rng.gen_range(0.0..wf), rng.gen_range(0.0..hf)),
            Vec2::new(rng.gen_range(0.0..wf), hf),
        ];
        canvas.stroke_bezier(control, 2.0, rgb(0x004d00));
    }
    if let Some(text) = text {
        canvas.draw_text_centered(text, "Voice Assistant", 36.0, wf / 2.0, hf / 2.0, rgb(0xffffff), true);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PrimitiveTopology;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(seed: u64) -> World {
        WorldBuilder::new(WorldConfig::default())
            .build(&mut StdRng::seed_from_u64(seed))
            .unwrap()
    }

    fn category<'w>(world: &'w World, name: &str) -> &'w SceneNode {
        world
            .graph
            .root()
            .children
            .iter()
            .find(|n| n.name == name)
            .unwrap()
    }

    #[test]
    fn decorations_respect_their_clearance() {
        let world = build(3);
        let config = WorldConfig::default();
        for (name, expected) in [
            ("trees", &config.trees),
            ("bushes", &config.bushes),
            ("vines", &config.vines),
            ("rocks", &config.rocks),
            ("flowers", &config.flowers),
        ] {
            let group = category(&world, name);
            assert_eq!(group.children.len(), expected.count, "{name}");
            for child in &group.children {
                let p = child.transform.position;
                assert!(
                    Vec2::new(p.x, p.z).length() >= expected.clearance - 1e-4,
                    "{name} at {p}"
                );
            }
        }
    }

    #[test]
    fn butterflies_are_a_single_point_cloud() {
        let world = build(5);
        let swarm = &category(&world, "butterflies").children[0];
        let mesh = world.graph.mesh(swarm.mesh.unwrap()).unwrap();
        assert_eq!(mesh.topology, PrimitiveTopology::PointList);
        assert_eq!(mesh.vertex_count(), 30);
        assert!(mesh.vertices.iter().all(|v| (1.0..6.0).contains(&v.position.y)));
    }

    #[test]
    fn both_surfaces_are_tagged_and_textured_by_mirrors() {
        let world = build(1);
        let tags: Vec<&str> = world.surfaces.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, [VIDEO_SCREEN_TAG, ASSISTANT_PANEL_TAG]);

        for (tag, binding) in [(VIDEO_SCREEN_TAG, VIDEO_MIRROR), (ASSISTANT_PANEL_TAG, ASSISTANT_MIRROR)] {
            let node = world.graph.find_by_tag(tag).unwrap();
            let material = world.graph.material(node.material.unwrap()).unwrap();
            assert!(material.unlit);
            let slot = material.texture.unwrap();
            assert!(matches!(world.graph.textures()[slot], TextureSource::Mirror(b) if b == binding));
        }
    }

    #[test]
    fn the_assistant_panel_faces_out_of_the_hollow() {
        let world = build(1);
        let path = world.graph.path_of(ASSISTANT_PANEL_TAG).unwrap();
        let centre = world.graph.world_matrix(path).unwrap().transform_point3(Vec3::ZERO);
        let radial = Vec2::new(centre.x - HOLLOW_CENTER.x, centre.z - HOLLOW_CENTER.z);
        assert!((radial.length() - PANEL_OFFSET).abs() < 1e-4);
        assert_eq!(world.overlay_anchors.len(), 2);
        assert_eq!(world.overlay_anchors[1].world.transform_point3(Vec3::ZERO), centre);
    }

    #[test]
    fn same_seed_same_world() {
        let a = build(42);
        let b = build(42);
        assert_eq!(a.graph.node_count(), b.graph.node_count());
        assert_eq!(a.lights.spots.len(), 10);
        for (x, y) in a.lights.spots.iter().zip(&b.lights.spots) {
            assert_eq!(x.position, y.position);
        }
        let trees_a: Vec<Vec3> = category(&a, "trees").children.iter().map(|n| n.transform.position).collect();
        let trees_b: Vec<Vec3> = category(&b, "trees").children.iter().map(|n| n.transform.position).collect();
        assert_eq!(trees_a, trees_b);
    }

    #[test]
    fn bare_world_keeps_the_stage() {
        let world = WorldBuilder::new(WorldConfig::bare())
            .build(&mut StdRng::seed_from_u64(0))
            .unwrap();
        assert!(category(&world, "trees").children.is_empty());
        assert!(world.graph.find_by_tag(VIDEO_SCREEN_TAG).is_some());
        assert!(world.lights.spots.is_empty());
        assert_eq!(world.fallback_placements, 0);
    }
}
