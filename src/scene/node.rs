//! Scene graph: an owned tree of nodes plus the mesh, material and texture tables they index

use std::collections::HashMap;

use glam::Mat4;

use super::{Aabb, Transform};
use crate::error::DuplicateTagError;
use crate::resources::{Material, Mesh, TextureData};

/// Where a material's texture slot gets its pixels from
#[derive(Debug, Clone)]
pub enum TextureSource {
    /// Uploaded once when the standard path is created
    Static(TextureData),
    /// Re-uploaded from a mirror binding (index into the mirror system)
    Mirror(usize),
}

/// A node in the scene tree
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<usize>,
    pub material: Option<usize>,
    pub tag: Option<String>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// An empty grouping node
    pub fn group(name: &str, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform,
            ..Default::default()
        }
    }

    /// A renderable node
    pub fn mesh(name: &str, mesh: usize, material: usize, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform,
            mesh: Some(mesh),
            material: Some(material),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    fn collect_tags<'a>(&'a self, path: &mut Vec<usize>, out: &mut Vec<(&'a str, NodePath)>) {
        if let Some(tag) = &self.tag {
            out.push((tag, NodePath(path.clone())));
        }
        for (i, child) in self.children.iter().enumerate() {
            path.push(i);
            child.collect_tags(path, out);
            path.pop();
        }
    }
}

/// Child indices from the root down to a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

/// A renderable node resolved to world space
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub path: NodePath,
    pub world: Mat4,
    pub mesh: usize,
    pub material: usize,
}

/// Owns the node tree and the resources nodes refer to
#[derive(Debug, Default)]
pub struct SceneGraph {
    root: SceneNode,
    meshes: Vec<Mesh>,
    bounds: Vec<Aabb>,
    materials: Vec<Material>,
    textures: Vec<TextureSource>,
    tags: HashMap<String, NodePath>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            root: SceneNode::group("root", Transform::default()),
            ..Default::default()
        }
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> usize {
        self.bounds.push(mesh.bounds());
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    pub fn add_texture(&mut self, source: TextureSource) -> usize {
        self.textures.push(source);
        self.textures.len() - 1
    }

    /// Attach a subtree under the root, indexing every tag it carries
    ///
    /// Fails without modifying the graph if any tag is already taken (or repeats
    /// inside the subtree).
    pub fn add_node(&mut self, node: SceneNode) -> Result<NodePath, DuplicateTagError> {
        let index = self.root.children.len();
        let mut found = Vec::new();
        node.collect_tags(&mut vec![index], &mut found);

        let mut seen = std::collections::HashSet::new();
        for (tag, _) in &found {
            if self.tags.contains_key(*tag) || !seen.insert(*tag) {
                return Err(DuplicateTagError {
                    tag: tag.to_string(),
                });
            }
        }
        let found: Vec<(String, NodePath)> = found
            .into_iter()
            .map(|(tag, path)| (tag.to_string(), path))
            .collect();
        self.tags.extend(found);

        self.root.children.push(node);
        Ok(NodePath(vec![index]))
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    pub fn node(&self, path: &NodePath) -> Option<&SceneNode> {
        path.0
            .iter()
            .try_fold(&self.root, |node, &i| node.children.get(i))
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Option<&mut SceneNode> {
        path.0
            .iter()
            .try_fold(&mut self.root, |node, &i| node.children.get_mut(i))
    }

    pub fn path_of(&self, tag: &str) -> Option<&NodePath> {
        self.tags.get(tag)
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&SceneNode> {
        self.path_of(tag).and_then(|path| self.node(path))
    }

    /// Composition of the transforms from the root down to the node
    pub fn world_matrix(&self, path: &NodePath) -> Option<Mat4> {
        let mut node = &self.root;
        let mut world = node.transform.matrix();
        for &i in &path.0 {
            node = node.children.get(i)?;
            world *= node.transform.matrix();
        }
        Some(world)
    }

    /// Visit every node depth-first with its world matrix
    pub fn walk(&self, mut visit: impl FnMut(&NodePath, &SceneNode, Mat4)) {
        fn recurse(
            node: &SceneNode,
            parent: Mat4,
            path: &mut Vec<usize>,
            visit: &mut dyn FnMut(&NodePath, &SceneNode, Mat4),
        ) {
            let world = parent * node.transform.matrix();
            visit(&NodePath(path.clone()), node, world);
            for (i, child) in node.children.iter().enumerate() {
                path.push(i);
                recurse(child, world, path, visit);
                path.pop();
            }
        }
        recurse(&self.root, Mat4::IDENTITY, &mut Vec::new(), &mut visit);
    }

    /// Every node with both a mesh and a material, in draw order
    pub fn flatten(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.walk(|path, node, world| {
            if let (Some(mesh), Some(material)) = (node.mesh, node.material) {
                items.push(DrawItem {
                    path: path.clone(),
                    world,
                    mesh,
                    material,
                });
            }
        });
        items
    }

    pub fn mesh(&self, id: usize) -> Option<&Mesh> {
        self.meshes.get(id)
    }

    pub fn mesh_bounds(&self, id: usize) -> Option<&Aabb> {
        self.bounds.get(id)
    }

    pub fn material(&self, id: usize) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn textures(&self) -> &[TextureSource] {
        &self.textures
    }

    /// Number of nodes including the root
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _, _| count += 1);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec3;

    #[test]
    fn world_matrix_composes_ancestors() {
        let mut graph = SceneGraph::new();
        let mesh = graph.add_mesh(Mesh::cube());
        let material = graph.add_material(Material::default());
        let child = SceneNode::mesh(
            "child",
            mesh,
            material,
            Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
        )
        .with_tag("child");
        let parent = SceneNode::group("parent", Transform::from_position(Vec3::new(2.0, 0.0, 0.0)))
            .with_child(child);
        graph.add_node(parent).unwrap();

        let path = graph.path_of("child").unwrap().clone();
        let world = graph.world_matrix(&path).unwrap();
        let origin = world.transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin.x, 2.0);
        assert_relative_eq!(origin.y, 1.0);
        assert_eq!(graph.flatten().len(), 1);
    }

    #[test]
    fn duplicate_tags_are_rejected_atomically() {
        let mut graph = SceneGraph::new();
        graph
            .add_node(SceneNode::group("a", Transform::default()).with_tag("video-screen"))
            .unwrap();
        let err = graph
            .add_node(SceneNode::group("b", Transform::default()).with_tag("video-screen"))
            .unwrap_err();
        assert_eq!(err.tag, "video-screen");
        assert_eq!(graph.root().children.len(), 1);

        let twice = SceneNode::group("c", Transform::default())
            .with_tag("x")
            .with_child(SceneNode::group("d", Transform::default()).with_tag("x"));
        assert!(graph.add_node(twice).is_err());
        assert!(graph.path_of("x").is_none());
    }
}
