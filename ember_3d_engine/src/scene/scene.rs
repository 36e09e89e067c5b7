/// Scene - node arena, hierarchy, light registries and the render passes.
///
/// Nodes are stored in a SlotMap and linked by `NodeKey`. A node has at most
/// one parent: `push_child` detaches it from its previous parent first.
/// Cycles are not detected.
///
/// Attaching a subtree registers every light inside it into its per-kind
/// registry, and detaching a subtree deregisters all of them. A light used
/// as the root itself is never registered. The registry index is the
/// light's shadow atlas slot, so removing a light shifts the following ones
/// down by one.

use glam::{Mat4, Vec3};
use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::graphics::{FrameTime, GraphicsManager, ShadowAtlasKind, ATLAS_DEPTH_ATTACHMENT};
use crate::{engine_bail, engine_debug, engine_warn};
use super::camera::Camera3D;
use super::light::{
    light_direction, world_rotation_matrix, DirectionalLightState, FrameLights, LightKind,
    LightSource, PointLightState, SpotLightState,
};
use super::node::{Node, NodeKey, NodeKind};
use super::render_pass::RenderPass;
use super::renderable::DrawContext;
use super::shadow::{fit_directional_light_space, frustum_corners};
use super::transform::NodeTransform;

const SOURCE: &str = "ember3d::Scene";

/// Camera matrices shared by every draw of a frame
#[derive(Debug, Clone, Copy)]
struct PassMatrices {
    view: Mat4,
    projection_3d: Mat4,
    projection_2d: Mat4,
}

/// A scene graph
#[derive(Debug)]
pub struct Scene {
    name: String,
    nodes: SlotMap<NodeKey, Node>,
    root: Option<NodeKey>,
    main_camera: Option<NodeKey>,
    point_lights: Vec<NodeKey>,
    spot_lights: Vec<NodeKey>,
    directional_lights: Vec<NodeKey>,
    ambient_light: Vec3,
}

impl Scene {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: SlotMap::with_key(),
            root: None,
            main_camera: None,
            point_lights: Vec::new(),
            spot_lights: Vec::new(),
            directional_lights: Vec::new(),
            ambient_light: Vec3::splat(0.1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== ARENA =====

    /// Insert a detached node
    pub fn add_node(&mut self, node: Node) -> NodeKey {
        self.nodes.insert(node)
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn check(&self, key: NodeKey) -> Result<()> {
        if !self.nodes.contains_key(key) {
            engine_bail!(SOURCE, Error::InvalidNode(format!("{:?} is not in scene '{}'", key, self.name)));
        }
        Ok(())
    }

    // ===== ROOT & CAMERA =====

    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    pub fn set_root(&mut self, key: NodeKey) -> Result<()> {
        self.check(key)?;
        self.root = Some(key);
        Ok(())
    }

    /// Insert `node` and make it the root
    pub fn add_root(&mut self, node: Node) -> NodeKey {
        let key = self.nodes.insert(node);
        self.root = Some(key);
        key
    }

    pub fn main_camera(&self) -> Option<NodeKey> {
        self.main_camera
    }

    /// Select the camera used by the shadow and main passes
    pub fn set_main_camera(&mut self, key: NodeKey) -> Result<()> {
        self.check(key)?;
        if self.nodes[key].camera_lens().is_none() {
            engine_bail!(SOURCE, Error::InvalidNode(format!(
                "'{}' is not a camera", self.nodes[key].name()
            )));
        }
        self.main_camera = Some(key);
        Ok(())
    }

    pub fn ambient_light(&self) -> Vec3 {
        self.ambient_light
    }

    pub fn set_ambient_light(&mut self, color: Vec3) {
        self.ambient_light = color;
    }

    // ===== HIERARCHY =====

    /// Attach `child` under `parent`, detaching it from its previous parent
    pub fn push_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.check(parent)?;
        self.check(child)?;
        if parent == child {
            engine_bail!(SOURCE, Error::InvalidNode("a node cannot parent itself".to_string()));
        }

        if let Some(previous) = self.nodes[child].parent {
            self.remove_child(previous, child)?;
        }

        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        for key in self.subtree(child) {
            if let Some(kind) = self.nodes[key].as_light().map(|l| l.kind()) {
                self.register_light(kind, key);
            }
        }
        self.nodes[child].fire_ready();
        Ok(())
    }

    /// Detach `child` from `parent`; returns false when it was not a child
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<bool> {
        self.check(parent)?;
        self.check(child)?;
        let children = &mut self.nodes[parent].children;
        let Some(index) = children.iter().position(|c| *c == child) else {
            return Ok(false);
        };
        children.remove(index);

        self.nodes[child].parent = None;
        for key in self.subtree(child) {
            if let Some(kind) = self.nodes[key].as_light().map(|l| l.kind()) {
                self.deregister_light(kind, key);
            }
        }
        self.nodes[child].fire_removed();
        Ok(true)
    }

    /// Detach the first child of `parent` named `name`
    pub fn remove_child_by_name(&mut self, parent: NodeKey, name: &str) -> Result<Option<NodeKey>> {
        self.check(parent)?;
        let found = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes.get(*c).is_some_and(|n| n.name() == name));
        match found {
            Some(child) => {
                self.remove_child(parent, child)?;
                Ok(Some(child))
            }
            None => Ok(None),
        }
    }

    pub fn has_child(&self, parent: NodeKey, child: NodeKey) -> bool {
        self.nodes.get(parent).is_some_and(|p| p.children.contains(&child))
    }

    pub fn has_child_named(&self, parent: NodeKey, name: &str) -> bool {
        self.nodes.get(parent).is_some_and(|p| {
            p.children
                .iter()
                .any(|c| self.nodes.get(*c).is_some_and(|n| n.name() == name))
        })
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map(|n| n.children()).unwrap_or(&[])
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    /// First node named `name` in depth-first pre-order from the root
    pub fn get_node(&self, name: &str) -> Option<NodeKey> {
        let mut stack = vec![self.root?];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if node.name() == name {
                return Some(key);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// `key` and its descendants in depth-first pre-order
    fn subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut keys = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            keys.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        keys
    }

    /// Detach `key` and remove it and its whole subtree from the arena
    ///
    /// GPU resources referenced by the removed nodes stay alive in the
    /// GraphicsManager.
    pub fn despawn(&mut self, key: NodeKey) -> Result<usize> {
        self.check(key)?;
        if let Some(parent) = self.nodes[key].parent {
            self.remove_child(parent, key)?;
        }

        let mut removed = 0;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            if let Some(kind) = node.as_light().map(|l| l.kind()) {
                self.deregister_light(kind, current);
            }
            if self.main_camera == Some(current) {
                self.main_camera = None;
            }
            if self.root == Some(current) {
                self.root = None;
            }
            stack.extend(node.children.iter().copied());
            removed += 1;
        }
        engine_debug!(SOURCE, "Despawned {} nodes from scene '{}'", removed, self.name);
        Ok(removed)
    }

    // ===== TRANSFORMS =====

    /// Composition of every 3D ancestor's local matrix with the node's own
    pub fn world_matrix(&self, key: NodeKey) -> Mat4 {
        self.compose(key, |t| t.as_3d().map(|t| t.local_matrix()))
    }

    /// Composition of every 2D ancestor's local matrix with the node's own
    pub fn world_matrix_2d(&self, key: NodeKey) -> Mat4 {
        self.compose(key, |t| t.as_2d().map(|t| t.local_matrix()))
    }

    fn compose<F>(&self, key: NodeKey, local: F) -> Mat4
    where
        F: Fn(&NodeTransform) -> Option<Mat4>,
    {
        let mut world = Mat4::IDENTITY;
        let mut current = Some(key);
        while let Some(k) = current {
            let Some(node) = self.nodes.get(k) else {
                break;
            };
            if let Some(matrix) = local(&node.transform) {
                world = matrix * world;
            }
            current = node.parent;
        }
        world
    }

    // ===== LIGHTS =====

    fn registry_mut(&mut self, kind: LightKind) -> &mut Vec<NodeKey> {
        match kind {
            LightKind::Point => &mut self.point_lights,
            LightKind::Spot => &mut self.spot_lights,
            LightKind::Directional => &mut self.directional_lights,
        }
    }

    fn register_light(&mut self, kind: LightKind, key: NodeKey) {
        let registry = self.registry_mut(kind);
        if !registry.contains(&key) {
            registry.push(key);
        }
    }

    fn deregister_light(&mut self, kind: LightKind, key: NodeKey) {
        self.registry_mut(kind).retain(|k| *k != key);
    }

    pub fn point_lights(&self) -> &[NodeKey] {
        &self.point_lights
    }

    pub fn spot_lights(&self) -> &[NodeKey] {
        &self.spot_lights
    }

    pub fn directional_lights(&self) -> &[NodeKey] {
        &self.directional_lights
    }

    pub fn point_light_count(&self) -> usize {
        self.point_lights.len()
    }

    pub fn spot_light_count(&self) -> usize {
        self.spot_lights.len()
    }

    pub fn directional_light_count(&self) -> usize {
        self.directional_lights.len()
    }

    /// Registry slot of a light, which is also its shadow atlas slot
    pub fn light_slot(&self, key: NodeKey) -> Option<usize> {
        let kind = self.nodes.get(key)?.as_light()?.kind();
        let registry = match kind {
            LightKind::Point => &self.point_lights,
            LightKind::Spot => &self.spot_lights,
            LightKind::Directional => &self.directional_lights,
        };
        registry.iter().position(|k| *k == key)
    }

    /// Refresh point shadow caches, fit directional volumes, snapshot lights
    fn prepare_lights(&mut self, gm: &GraphicsManager, view: &Mat4, projection: &Mat4, far: f32, camera_position: Vec3) -> FrameLights {
        let config = gm.config();
        let mut lights = FrameLights {
            ambient_light: self.ambient_light,
            camera_position,
            point_atlas: gm.point_atlas().map(|a| a.texture()),
            directional_atlas: gm.directional_atlas().map(|a| a.texture()),
            shadow_map_size: config.shadow_map_size as f32,
            ..FrameLights::default()
        };

        for (slot, key) in self.point_lights.clone().into_iter().enumerate() {
            let parent_world = self.parent(key).map_or(Mat4::IDENTITY, |p| self.world_matrix(p));
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            let local_position = node.transform_3d().map_or(Vec3::ZERO, |t| t.position);
            let Some(light) = node.light_mut() else {
                continue;
            };
            let properties = light.properties;
            if let LightSource::Point { range, shadow } = &mut light.source {
                shadow.refresh(*range, config.point_shadow_near, local_position, parent_world);
                lights.point.push(PointLightState {
                    properties,
                    position: shadow.world_position(),
                    range: *range,
                    shadow_layer: slot as u32 * ShadowAtlasKind::Point.layers_per_light(),
                    faces: *shadow.faces(),
                });
            }
        }

        for key in &self.spot_lights {
            let world = self.world_matrix(*key);
            let Some(light) = self.nodes.get(*key).and_then(|n| n.as_light()) else {
                continue;
            };
            if let LightSource::Spot { range, cookie_radius } = light.source {
                lights.spot.push(SpotLightState {
                    properties: light.properties,
                    position: world.w_axis.truncate(),
                    rotation: world_rotation_matrix(&world),
                    range,
                    cookie_radius,
                });
            }
        }

        let corners = frustum_corners(view, projection);
        for (slot, key) in self.directional_lights.clone().into_iter().enumerate() {
            let world = self.world_matrix(key);
            let direction = light_direction(&world);
            let fitted = fit_directional_light_space(
                direction,
                &corners,
                far,
                config.directional_z_margin,
                config.up_fallback_threshold,
            );
            let Some(light) = self.nodes.get_mut(key).and_then(|n| n.light_mut()) else {
                continue;
            };
            if let LightSource::Directional { light_space } = &mut light.source {
                *light_space = fitted;
                lights.directional.push(DirectionalLightState {
                    properties: light.properties,
                    direction,
                    rotation: world_rotation_matrix(&world),
                    shadow_layer: slot as u32 * ShadowAtlasKind::Directional.layers_per_light(),
                    light_space: fitted,
                });
            }
        }
        lights
    }

    // ===== RENDERING =====

    /// Shadow passes then the main pass
    ///
    /// Without a root this logs a warning and draws nothing. Without a main
    /// camera it fails.
    pub fn render(&mut self, gm: &mut GraphicsManager, frame: &FrameTime) -> Result<()> {
        let Some(root) = self.root else {
            engine_warn!(SOURCE, "Scene '{}' has no root node, nothing to render", self.name);
            return Ok(());
        };
        let Some(camera_key) = self.main_camera else {
            engine_bail!(SOURCE, Error::MissingCamera(self.name.clone()));
        };
        let Some(lens) = self.nodes.get(camera_key).and_then(|n| n.camera_lens()).copied() else {
            engine_bail!(SOURCE, Error::MissingCamera(self.name.clone()));
        };

        let camera_world = self.world_matrix(camera_key);
        let matrices = PassMatrices {
            view: Camera3D::view(&camera_world),
            projection_3d: lens.projection(gm.aspect_ratio()),
            projection_2d: gm.projection_2d(),
        };
        let lights = self.prepare_lights(
            gm,
            &matrices.view,
            &matrices.projection_3d,
            lens.far,
            camera_world.w_axis.truncate(),
        );

        if !lights.point.is_empty() {
            self.render_point_shadows(gm, root, &matrices, &lights, frame)?;
        }
        if !lights.directional.is_empty() {
            self.render_directional_shadows(gm, root, &matrices, &lights, frame)?;
        }

        gm.set_depth_test(true);
        self.traverse(gm, root, RenderPass::Main, &matrices, &lights, frame)
    }

    fn render_point_shadows(
        &mut self,
        gm: &mut GraphicsManager,
        root: NodeKey,
        matrices: &PassMatrices,
        lights: &FrameLights,
        frame: &FrameTime,
    ) -> Result<()> {
        let Some(framebuffer) = gm.point_atlas().map(|a| a.framebuffer_name()) else {
            return Ok(());
        };
        let program = gm.config().point_shadow_program.clone();
        let mut shader = gm.scoped_shader(&program)?;
        let mut target = shader.scoped_framebuffer(framebuffer)?;

        for light in &lights.point {
            target.set_uniform("origin", light.position);
            target.set_uniform("range", light.range);
            for (face, matrix) in light.faces.iter().enumerate() {
                target.set_attachment_layer(framebuffer, ATLAS_DEPTH_ATTACHMENT, light.shadow_layer + face as u32)?;
                target.clear_framebuffer();
                target.set_uniform("u_light_space_matrix", *matrix);
                self.traverse(&mut target, root, RenderPass::ShadowPoint, matrices, lights, frame)?;
            }
        }
        Ok(())
    }

    fn render_directional_shadows(
        &mut self,
        gm: &mut GraphicsManager,
        root: NodeKey,
        matrices: &PassMatrices,
        lights: &FrameLights,
        frame: &FrameTime,
    ) -> Result<()> {
        let Some(framebuffer) = gm.directional_atlas().map(|a| a.framebuffer_name()) else {
            return Ok(());
        };
        let program = gm.config().directional_shadow_program.clone();
        let mut shader = gm.scoped_shader(&program)?;
        let mut target = shader.scoped_framebuffer(framebuffer)?;

        for light in &lights.directional {
            target.set_attachment_layer(framebuffer, ATLAS_DEPTH_ATTACHMENT, light.shadow_layer)?;
            target.clear_framebuffer();
            target.set_uniform("u_light_space_matrix", light.light_space);
            self.traverse(&mut target, root, RenderPass::ShadowDirectional, matrices, lights, frame)?;
        }
        Ok(())
    }

    /// Depth-first pre-order walk: update callback, draw, then children
    fn traverse(
        &mut self,
        gm: &mut GraphicsManager,
        root: NodeKey,
        pass: RenderPass,
        matrices: &PassMatrices,
        lights: &FrameLights,
        frame: &FrameTime,
    ) -> Result<()> {
        let mut stack = vec![(root, Mat4::IDENTITY, Mat4::IDENTITY)];
        while let Some((key, parent_3d, parent_2d)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            if pass.runs_update_callbacks() {
                node.fire_update(frame);
            }

            let (world_3d, world_2d) = match &node.transform {
                NodeTransform::Spatial(t) => (parent_3d * t.local_matrix(), parent_2d),
                NodeTransform::Planar(t) => (parent_3d, parent_2d * t.local_matrix()),
                NodeTransform::None => (parent_3d, parent_2d),
            };

            if let Some(renderable) = node.renderable() {
                let world = match node.kind {
                    NodeKind::Sprite(_) => world_2d,
                    _ => world_3d,
                };
                let ctx = DrawContext {
                    pass,
                    world,
                    view: matrices.view,
                    projection_3d: matrices.projection_3d,
                    projection_2d: matrices.projection_2d,
                    lights,
                    frame,
                };
                renderable.draw(gm, &ctx)?;
            }

            stack.extend(node.children.iter().rev().map(|c| (*c, world_3d, world_2d)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
