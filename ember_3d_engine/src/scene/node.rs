/// Node - element of the scene hierarchy.
///
/// Nodes live in the scene's arena and reference each other by `NodeKey`.
/// A node carries an optional transform component, a kind (what it draws or
/// contributes) and optional lifecycle callbacks.

use std::fmt;
use slotmap::new_key_type;
use crate::graphics::{FrameTime, Model};
use super::camera::Camera3D;
use super::light::Light;
use super::renderable::{Renderable, Skybox, Sprite2D};
use super::transform::{NodeTransform, Transform2D, Transform3D};

new_key_type! {
    /// Stable key of a node in a `Scene`
    pub struct NodeKey;
}

/// Callback fired when a node gains or loses its parent
pub type NodeCallback = Box<dyn FnMut(&mut Node)>;

/// Callback fired once per frame before the node draws
pub type UpdateCallback = Box<dyn FnMut(&mut Node, &FrameTime)>;

/// What a node is
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Grouping only
    Empty,
    Camera(Camera3D),
    Object(Model),
    Light(Light),
    Skybox(Skybox),
    Sprite(Sprite2D),
}

/// A scene graph node
pub struct Node {
    name: String,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub transform: NodeTransform,
    pub kind: NodeKind,
    on_ready: Option<NodeCallback>,
    on_removed: Option<NodeCallback>,
    on_update: Option<UpdateCallback>,
}

impl Node {
    /// Empty node without a transform
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            transform: NodeTransform::None,
            kind: NodeKind::Empty,
            on_ready: None,
            on_removed: None,
            on_update: None,
        }
    }

    /// Empty 3D node
    pub fn spatial(name: &str, transform: Transform3D) -> Self {
        Self::new(name).with_transform(transform)
    }

    /// Empty 2D node
    pub fn planar(name: &str, transform: Transform2D) -> Self {
        Self::new(name).with_transform_2d(transform)
    }

    pub fn camera(name: &str, camera: Camera3D, transform: Transform3D) -> Self {
        Self::spatial(name, transform).with_kind(NodeKind::Camera(camera))
    }

    pub fn object(name: &str, model: Model, transform: Transform3D) -> Self {
        Self::spatial(name, transform).with_kind(NodeKind::Object(model))
    }

    pub fn light(name: &str, light: Light, transform: Transform3D) -> Self {
        Self::spatial(name, transform).with_kind(NodeKind::Light(light))
    }

    pub fn skybox(name: &str, skybox: Skybox) -> Self {
        Self::new(name).with_kind(NodeKind::Skybox(skybox))
    }

    pub fn sprite(name: &str, sprite: Sprite2D, transform: Transform2D) -> Self {
        Self::planar(name, transform).with_kind(NodeKind::Sprite(sprite))
    }

    // ===== BUILDERS =====

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_transform(mut self, transform: Transform3D) -> Self {
        self.transform = NodeTransform::Spatial(transform);
        self
    }

    pub fn with_transform_2d(mut self, transform: Transform2D) -> Self {
        self.transform = NodeTransform::Planar(transform);
        self
    }

    pub fn with_on_ready(mut self, callback: impl FnMut(&mut Node) + 'static) -> Self {
        self.on_ready = Some(Box::new(callback));
        self
    }

    pub fn with_on_removed(mut self, callback: impl FnMut(&mut Node) + 'static) -> Self {
        self.on_removed = Some(Box::new(callback));
        self
    }

    pub fn with_on_update(mut self, callback: impl FnMut(&mut Node, &FrameTime) + 'static) -> Self {
        self.on_update = Some(Box::new(callback));
        self
    }

    // ===== ACCESSORS =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn transform_3d(&self) -> Option<&Transform3D> {
        self.transform.as_3d()
    }

    pub fn transform_3d_mut(&mut self) -> Option<&mut Transform3D> {
        self.transform.as_3d_mut()
    }

    pub fn transform_2d(&self) -> Option<&Transform2D> {
        self.transform.as_2d()
    }

    pub fn transform_2d_mut(&mut self) -> Option<&mut Transform2D> {
        self.transform.as_2d_mut()
    }

    pub fn as_light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn camera_lens(&self) -> Option<&Camera3D> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    /// Draw behaviour of this node, if any
    pub fn renderable(&self) -> Option<&dyn Renderable> {
        match &self.kind {
            NodeKind::Object(model) => Some(model),
            NodeKind::Skybox(skybox) => Some(skybox),
            NodeKind::Sprite(sprite) => Some(sprite),
            NodeKind::Empty | NodeKind::Camera(_) | NodeKind::Light(_) => None,
        }
    }

    // ===== CALLBACKS =====

    pub(crate) fn fire_ready(&mut self) {
        if let Some(mut callback) = self.on_ready.take() {
            callback(self);
            self.on_ready.get_or_insert(callback);
        }
    }

    pub(crate) fn fire_removed(&mut self) {
        if let Some(mut callback) = self.on_removed.take() {
            callback(self);
            self.on_removed.get_or_insert(callback);
        }
    }

    pub(crate) fn fire_update(&mut self, frame: &FrameTime) {
        if let Some(mut callback) = self.on_update.take() {
            callback(self, frame);
            self.on_update.get_or_insert(callback);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("transform", &self.transform)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
