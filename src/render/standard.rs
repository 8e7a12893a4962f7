//! The standard path: forward-lit scene rendering into the swapchain

use std::collections::HashMap;

use glam::Vec3;

use super::{RenderPath, RenderPathKind};
use crate::backend::*;
use crate::mirror::MirrorSystem;
use crate::resources::{GpuTexture, TextureData};
use crate::scene::{
    Camera, CameraUniformData, DrawItem, LightsUniformData, SceneGraph, SceneLights,
    TextureSource, TransformUniformData,
};

const SCENE_SHADER: &str = r#"
struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    near_far: vec4<f32>,
}

struct SpotLight {
    position_range: vec4<f32>,
    color_intensity: vec4<f32>,
    direction: vec4<f32>,
    cone: vec4<f32>,
}

struct LightsUniform {
    ambient: vec4<f32>,
    directional_direction: vec4<f32>,
    directional_color: vec4<f32>,
    fog: vec4<f32>,
    counts: vec4<u32>,
    spots: array<SpotLight, 16>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
}

struct MaterialUniform {
    base_color: vec4<f32>,
    // x = roughness, y = unlit
    params: vec4<f32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var<uniform> lights: LightsUniform;
@group(1) @binding(0) var<uniform> object: ObjectUniform;
@group(2) @binding(0) var<uniform> material: MaterialUniform;
@group(2) @binding(1) var base_texture: texture_2d<f32>;
@group(2) @binding(2) var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world_pos = object.model * vec4<f32>(in.position, 1.0);
    out.world_position = world_pos.xyz;
    out.clip_position = camera.view_proj * world_pos;
    out.world_normal = normalize((object.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    let texel = textureSample(base_texture, base_sampler, in.uv);
    let albedo = material.base_color * texel * in.color;
    if material.params.y > 0.5 {
        return albedo;
    }

    var normal = normalize(in.world_normal);
    if !front {
        normal = -normal;
    }

    var light = lights.ambient.rgb * lights.ambient.w;
    let sun = max(dot(normal, -lights.directional_direction.xyz), 0.0);
    light += lights.directional_color.rgb * lights.directional_color.w * sun;

    let count = min(lights.counts.x, 16u);
    for (var i = 0u; i < count; i++) {
        let spot = lights.spots[i];
        let to_light = spot.position_range.xyz - in.world_position;
        let dist = length(to_light);
        let l = to_light / max(dist, 0.0001);
        let cone = smoothstep(spot.cone.y, spot.cone.x, dot(-l, spot.direction.xyz));
        let falloff = clamp(1.0 - dist / spot.position_range.w, 0.0, 1.0);
        let diffuse = max(dot(normal, l), 0.0);
        light += spot.color_intensity.rgb * spot.color_intensity.w * diffuse * cone * falloff;
    }

    let view_dir = normalize(camera.position.xyz - in.world_position);
    let reflected = reflect(lights.directional_direction.xyz, normal);
    let shininess = mix(64.0, 4.0, material.params.x);
    let specular = pow(max(dot(view_dir, reflected), 0.0), shininess) * (1.0 - material.params.x) * 0.25;
    var color = albedo.rgb * light + lights.directional_color.rgb * specular;

    let fog_distance = distance(camera.position.xyz, in.world_position);
    let fog_amount = lights.fog.w * fog_distance;
    let fog = clamp(1.0 - exp(-fog_amount * fog_amount), 0.0, 1.0);
    color = mix(color, lights.fog.rgb, fog);

    return vec4<f32>(color, albedo.a);
}
"#;

/// Pipelines are shared by every object with the same rasterization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub cull: CullMode,
    pub topology: PrimitiveTopology,
    pub blended: bool,
}

struct GpuMesh {
    vertex_buffer: BufferHandle,
    /// `None` for point lists, which draw unindexed
    index_buffer: Option<BufferHandle>,
    count: u32,
    topology: PrimitiveTopology,
}

struct GpuMaterial {
    buffer: BufferHandle,
    bind_group: BindGroupHandle,
    cull: CullMode,
    blended: bool,
}

struct GpuObject {
    buffer: BufferHandle,
    bind_group: BindGroupHandle,
    item: DrawItem,
    centre: Vec3,
}

/// GPU state for drawing the scene graph
pub struct StandardPath {
    pipelines: HashMap<PipelineKey, RenderPipelineHandle>,
    layouts: [BindGroupLayoutHandle; 3],
    camera_buffer: BufferHandle,
    lights_buffer: BufferHandle,
    frame_bind_group: BindGroupHandle,
    sampler: SamplerHandle,
    white: GpuTexture,
    static_textures: HashMap<usize, GpuTexture>,
    meshes: Vec<Option<GpuMesh>>,
    materials: Vec<GpuMaterial>,
    objects: Vec<GpuObject>,
    depth: Option<GpuDepth>,
    clear_color: [f32; 4],
    width: u32,
    height: u32,
    released: bool,
}

struct GpuDepth {
    texture: TextureHandle,
    view: TextureViewHandle,
}

impl StandardPath {
    /// Upload the graph's meshes, materials and static textures and build the pipelines
    ///
    /// Mirror texture slots bind the mirror system's textures, so those must exist already.
    pub fn new(
        backend: &mut Backend,
        graph: &SceneGraph,
        lights: &SceneLights,
        mirrors: &MirrorSystem,
        width: u32,
        height: u32,
    ) -> BackendResult<Self> {
        let frame_layout = backend.create_bind_group_layout(&[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStageFlags::VERTEX_FRAGMENT,
                ty: BindingType::UniformBuffer,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::UniformBuffer,
            },
        ])?;
        let object_layout = backend.create_bind_group_layout(&[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStageFlags::VERTEX,
            ty: BindingType::UniformBuffer,
        }])?;
        let material_layout = backend.create_bind_group_layout(&[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::UniformBuffer,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::Texture,
            },
            BindGroupLayoutEntry {
                binding: 2,
                visibility: ShaderStageFlags::FRAGMENT,
                ty: BindingType::Sampler,
            },
        ])?;

        let camera_buffer = backend.create_buffer(&BufferDescriptor {
            label: Some("Camera Buffer".into()),
            size: std::mem::size_of::<CameraUniformData>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })?;
        let lights_buffer = backend.create_buffer_init(
            &BufferDescriptor {
                label: Some("Lights Buffer".into()),
                size: std::mem::size_of::<LightsUniformData>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            bytemuck::bytes_of(&lights.uniform_data()),
        )?;
        let frame_bind_group = backend.create_bind_group(
            frame_layout,
            &[
                (0, BindGroupEntry::Buffer(camera_buffer)),
                (1, BindGroupEntry::Buffer(lights_buffer)),
            ],
        )?;

        let sampler = backend.create_sampler(&SamplerDescriptor {
            label: Some("Surface Sampler".into()),
            ..Default::default()
        })?;
        let white = GpuTexture::create(backend, &TextureData::white())?;

        let mut static_textures = HashMap::new();
        for (slot, source) in graph.textures().iter().enumerate() {
            if let TextureSource::Static(data) = source {
                static_textures.insert(slot, GpuTexture::create(backend, data)?);
            }
        }

        let mut meshes = Vec::with_capacity(graph.meshes().len());
        for (id, mesh) in graph.meshes().iter().enumerate() {
            if mesh.vertex_count() == 0 {
                meshes.push(None);
                continue;
            }
            let vertex_buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("Vertex Buffer {id} ({})", mesh.name)),
                    size: mesh.vertex_bytes().len() as u64,
                    usage: BufferUsage::VERTEX,
                },
                mesh.vertex_bytes(),
            )?;
            let (index_buffer, count) = match mesh.topology {
                PrimitiveTopology::TriangleList => (
                    Some(backend.create_buffer_init(
                        &BufferDescriptor {
                            label: Some(format!("Index Buffer {id}")),
                            size: mesh.index_bytes().len() as u64,
                            usage: BufferUsage::INDEX,
                        },
                        mesh.index_bytes(),
                    )?),
                    mesh.index_count() as u32,
                ),
                PrimitiveTopology::PointList => (None, mesh.vertex_count() as u32),
            };
            meshes.push(Some(GpuMesh {
                vertex_buffer,
                index_buffer,
                count,
                topology: mesh.topology,
            }));
        }

        let mut materials = Vec::with_capacity(graph.materials().len());
        for (id, material) in graph.materials().iter().enumerate() {
            let view = match material.texture.map(|slot| (slot, graph.textures().get(slot))) {
                None => white.view,
                Some((slot, Some(TextureSource::Static(_)))) => static_textures
                    .get(&slot)
                    .map_or(white.view, |t| t.view),
                Some((_, Some(TextureSource::Mirror(binding)))) => {
                    mirrors.texture_view(*binding).unwrap_or_else(|| {
                        log::warn!("Material {}: mirror {binding} has no texture", material.name);
                        white.view
                    })
                }
                Some((slot, None)) => {
                    log::warn!("Material {}: texture slot {slot} does not exist", material.name);
                    white.view
                }
            };
            let buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("Material Buffer {id} ({})", material.name)),
                    size: std::mem::size_of_val(&material.uniform_data()) as u64,
                    usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                },
                bytemuck::bytes_of(&material.uniform_data()),
            )?;
            let bind_group = backend.create_bind_group(
                material_layout,
                &[
                    (0, BindGroupEntry::Buffer(buffer)),
                    (1, BindGroupEntry::Texture(view)),
                    (2, BindGroupEntry::Sampler(sampler)),
                ],
            )?;
            materials.push(GpuMaterial {
                buffer,
                bind_group,
                cull: material.side.cull_mode(),
                blended: material.transparent,
            });
        }

        let mut objects = Vec::new();
        for (index, item) in graph.flatten().into_iter().enumerate() {
            let centre = graph
                .mesh_bounds(item.mesh)
                .filter(|b| !b.is_empty())
                .map_or(Vec3::ZERO, |b| (b.min + b.max) * 0.5);
            let uniform = TransformUniformData::from_matrix(item.world);
            let buffer = backend.create_buffer_init(
                &BufferDescriptor {
                    label: Some(format!("Object Buffer {index}")),
                    size: std::mem::size_of::<TransformUniformData>() as u64,
                    usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                },
                bytemuck::bytes_of(&uniform),
            )?;
            let bind_group =
                backend.create_bind_group(object_layout, &[(0, BindGroupEntry::Buffer(buffer))])?;
            objects.push(GpuObject {
                buffer,
                bind_group,
                centre: item.world.transform_point3(centre),
                item,
            });
        }

        let mut path = Self {
            pipelines: HashMap::new(),
            layouts: [frame_layout, object_layout, material_layout],
            camera_buffer,
            lights_buffer,
            frame_bind_group,
            sampler,
            white,
            static_textures,
            meshes,
            materials,
            objects,
            depth: None,
            clear_color: lights.background.extend(1.0).to_array(),
            width: 0,
            height: 0,
            released: false,
        };

        let keys: Vec<PipelineKey> = path
            .objects
            .iter()
            .filter_map(|o| path.key_for(&o.item))
            .collect();
        for key in keys {
            path.pipeline(backend, key)?;
        }
        path.resize(backend, width.max(1), height.max(1))?;

        log::info!(
            "Standard path ready: {} objects, {} pipelines",
            path.objects.len(),
            path.pipelines.len()
        );
        Ok(path)
    }

    fn key_for(&self, item: &DrawItem) -> Option<PipelineKey> {
        let mesh = self.meshes.get(item.mesh)?.as_ref()?;
        let material = self.materials.get(item.material)?;
        Some(PipelineKey {
            cull: material.cull,
            topology: mesh.topology,
            blended: material.blended,
        })
    }

    fn pipeline(&mut self, backend: &mut Backend, key: PipelineKey) -> BackendResult<RenderPipelineHandle> {
        if let Some(&pipeline) = self.pipelines.get(&key) {
            return Ok(pipeline);
        }
        let pipeline = backend.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(format!("Scene Pipeline {key:?}")),
            shader: SCENE_SHADER.into(),
            vertex_layouts: vec![Vertex::layout()],
            bind_group_layouts: self.layouts.to_vec(),
            primitive_topology: key.topology,
            cull_mode: key.cull,
            depth_stencil: Some(DepthStencilState {
                format: TextureFormat::Depth32Float,
                depth_write_enabled: !key.blended,
                depth_compare: CompareFunction::Less,
            }),
            color_target: ColorTargetState {
                format: backend.swapchain_format(),
                blend: key.blended.then_some(BlendState::AlphaBlending),
            },
        })?;
        self.pipelines.insert(key, pipeline);
        Ok(pipeline)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Draw the scene into `frame`'s swapchain view; returns the number of draw calls
    pub fn render(&self, backend: &mut Backend, frame: &FrameContext, camera: &Camera) -> usize {
        let Some(depth) = self.depth.as_ref() else {
            return 0;
        };
        backend.write_buffer(self.camera_buffer, 0, bytemuck::bytes_of(&camera.uniform_data()));

        // Opaque first, then blended surfaces far to near
        let mut order: Vec<(usize, PipelineKey)> = self
            .objects
            .iter()
            .enumerate()
            .filter_map(|(i, o)| self.key_for(&o.item).map(|k| (i, k)))
            .collect();
        let eye = camera.position;
        order.sort_by(|(a, ka), (b, kb)| {
            ka.blended.cmp(&kb.blended).then_with(|| {
                if ka.blended {
                    let da = self.objects[*a].centre.distance_squared(eye);
                    let db = self.objects[*b].centre.distance_squared(eye);
                    db.total_cmp(&da)
                } else {
                    std::cmp::Ordering::Equal
                }
            })
        });

        backend.begin_render_pass(&RenderPassDescriptor {
            label: Some("Scene Pass".into()),
            color_attachments: vec![ColorAttachment {
                view: frame.swapchain_view,
                load_op: LoadOp::Clear(self.clear_color),
            }],
            depth_stencil_attachment: Some(DepthStencilAttachment {
                view: depth.view,
                depth_clear_value: 1.0,
            }),
        });
        backend.set_viewport(0.0, 0.0, frame.width as f32, frame.height as f32);
        backend.set_bind_group(0, self.frame_bind_group);

        let mut draws = 0;
        let mut bound: Option<RenderPipelineHandle> = None;
        for (index, key) in order {
            let object = &self.objects[index];
            let (Some(Some(mesh)), Some(material), Some(&pipeline)) = (
                self.meshes.get(object.item.mesh),
                self.materials.get(object.item.material),
                self.pipelines.get(&key),
            ) else {
                continue;
            };
            if bound != Some(pipeline) {
                backend.set_render_pipeline(pipeline);
                bound = Some(pipeline);
            }
            backend.set_bind_group(1, object.bind_group);
            backend.set_bind_group(2, material.bind_group);
            backend.set_vertex_buffer(0, mesh.vertex_buffer);
            match mesh.index_buffer {
                Some(indices) => {
                    backend.set_index_buffer(indices, IndexFormat::Uint32);
                    backend.draw_indexed(0..mesh.count, 0..1);
                }
                None => backend.draw(0..mesh.count, 0..1),
            }
            draws += 1;
        }

        backend.end_render_pass();
        draws
    }

    fn destroy_depth(&mut self, backend: &mut Backend) {
        if let Some(depth) = self.depth.take() {
            backend.destroy_texture(depth.texture);
        }
    }
}

impl RenderPath for StandardPath {
    fn kind(&self) -> RenderPathKind {
        RenderPathKind::Standard
    }

    fn resize(&mut self, backend: &mut Backend, width: u32, height: u32) -> BackendResult<()> {
        if self.released {
            return Ok(());
        }
        if self.depth.is_some() && (width, height) == (self.width, self.height) {
            return Ok(());
        }
        self.destroy_depth(backend);
        let texture = backend.create_texture(&TextureDescriptor::depth(width, height))?;
        let view = backend.create_texture_view(texture)?;
        self.depth = Some(GpuDepth { texture, view });
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn release(&mut self, backend: &mut Backend) {
        if self.released {
            return;
        }
        self.released = true;
        self.destroy_depth(backend);
        for object in self.objects.drain(..) {
            backend.destroy_bind_group(object.bind_group);
            backend.destroy_buffer(object.buffer);
        }
        for material in self.materials.drain(..) {
            backend.destroy_bind_group(material.bind_group);
            backend.destroy_buffer(material.buffer);
        }
        for mesh in self.meshes.drain(..).flatten() {
            backend.destroy_buffer(mesh.vertex_buffer);
            if let Some(indices) = mesh.index_buffer {
                backend.destroy_buffer(indices);
            }
        }
        for (_, texture) in self.static_textures.drain() {
            texture.destroy(backend);
        }
        backend.destroy_texture(self.white.handle);
        backend.destroy_bind_group(self.frame_bind_group);
        backend.destroy_buffer(self.camera_buffer);
        backend.destroy_buffer(self.lights_buffer);
        backend.destroy_sampler(self.sampler);
        for (_, pipeline) in self.pipelines.drain() {
            backend.destroy_render_pipeline(pipeline);
        }
        for layout in self.layouts {
            backend.destroy_bind_group_layout(layout);
        }
        log::debug!("Standard path released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Material, Mesh, Side};
    use crate::scene::{SceneNode, Transform};
    use crate::world::{WorldBuilder, WorldConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_graph() -> (SceneGraph, SceneLights) {
        let world = WorldBuilder::new(WorldConfig::bare())
            .build(&mut StdRng::seed_from_u64(0))
            .unwrap();
        (world.graph, world.lights)
    }

    #[test]
    fn pipelines_are_shared_per_state() {
        let mut graph = SceneGraph::new();
        let quad = graph.add_mesh(Mesh::quad(1.0, 1.0));
        let front = graph.add_material(Material::default());
        let double = graph.add_material(Material::default().with_side(Side::Double));
        for (i, material) in [front, front, double].into_iter().enumerate() {
            graph
                .add_node(SceneNode::mesh(&format!("q{i}"), quad, material, Transform::default()))
                .unwrap();
        }
        let (_, lights) = small_graph();

        let mut backend = Backend::Dummy(DummyBackend::new(64, 64));
        let path =
            StandardPath::new(&mut backend, &graph, &lights, &MirrorSystem::new(), 64, 64).unwrap();
        assert_eq!(path.object_count(), 3);
        assert_eq!(path.pipeline_count(), 2);
    }

    #[test]
    fn renders_every_object_and_releases_everything() {
        let (graph, lights) = small_graph();
        let mut backend = Backend::Dummy(DummyBackend::new(320, 240));
        let mut path =
            StandardPath::new(&mut backend, &graph, &lights, &MirrorSystem::new(), 320, 240).unwrap();

        let frame = backend.begin_frame().unwrap();
        let draws = path.render(&mut backend, &frame, &Camera::default());
        backend.end_frame().unwrap();
        assert_eq!(draws, path.object_count());

        path.release(&mut backend);
        path.release(&mut backend);
        let dummy = backend.as_dummy().unwrap();
        assert_eq!(dummy.live_buffers(), 0);
        assert_eq!(dummy.live_textures(), 0);
        assert_eq!(dummy.live_bind_groups(), 0);
        assert_eq!(dummy.live_pipeline_objects(), 0);
    }

    #[test]
    fn resize_replaces_the_depth_target() {
        let (graph, lights) = small_graph();
        let mut backend = Backend::Dummy(DummyBackend::new(320, 240));
        let mut path =
            StandardPath::new(&mut backend, &graph, &lights, &MirrorSystem::new(), 320, 240).unwrap();
        let before = backend.as_dummy().unwrap().live_textures();
        path.resize(&mut backend, 800, 600).unwrap();
        assert_eq!(path.output_size(), (800, 600));
        assert_eq!(backend.as_dummy().unwrap().live_textures(), before);
    }
}
