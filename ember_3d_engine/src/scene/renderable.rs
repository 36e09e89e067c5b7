/// Renderable - per-kind draw behaviour of scene nodes.
///
/// The scene walks the graph and hands each drawable node a `DrawContext`
/// carrying the pass, the node's world matrix and the frame's camera and
/// light state. Shadow passes arrive with the shadow program already active
/// and the atlas framebuffer bound.

use glam::{Mat3, Mat4};
use crate::error::Result;
use crate::gpu::{BlendMode, DepthFunc, TextureKey};
use crate::graphics::{FrameTime, GraphicsManager, Model};
use crate::engine_bail;
use super::light::FrameLights;
use super::render_pass::RenderPass;

const SOURCE: &str = "ember3d::Renderable";

/// Per-draw inputs
pub struct DrawContext<'a> {
    pub pass: RenderPass,
    /// 3D world matrix for spatial nodes, 2D world matrix for planar nodes
    pub world: Mat4,
    pub view: Mat4,
    pub projection_3d: Mat4,
    pub projection_2d: Mat4,
    pub lights: &'a FrameLights,
    pub frame: &'a FrameTime,
}

/// Something a node can draw
pub trait Renderable {
    fn draw(&self, gm: &mut GraphicsManager, ctx: &DrawContext<'_>) -> Result<()>;
}

impl Renderable for Model {
    fn draw(&self, gm: &mut GraphicsManager, ctx: &DrawContext<'_>) -> Result<()> {
        if ctx.pass.is_shadow() {
            gm.set_uniform("u_model", ctx.world);
            return gm.draw_mesh(self.mesh);
        }

        let depth_test = gm.fixed_function_state().depth_test;
        let blend = gm.blend_mode();
        let drawn = self.draw_lit(gm, ctx);
        gm.set_blend(blend);
        gm.set_depth_test(depth_test);
        gm.clear_shader();
        drawn
    }
}

impl Model {
    fn draw_lit(&self, gm: &mut GraphicsManager, ctx: &DrawContext<'_>) -> Result<()> {
        self.material.bind(gm)?;
        let bounds = gm.mesh(self.mesh).map(|mesh| mesh.bounds().transformed(&ctx.world));
        ctx.lights.write_uniforms(gm, bounds);
        gm.set_uniform("u_model", ctx.world);
        gm.set_uniform("u_view", ctx.view);
        gm.set_uniform("u_projection", ctx.projection_3d);
        gm.draw_mesh(self.mesh)
    }
}

/// Cubemap backdrop drawn behind everything else
#[derive(Debug, Clone, PartialEq)]
pub struct Skybox {
    pub texture: TextureKey,
    pub program: String,
}

impl Skybox {
    pub fn new(texture: TextureKey, program: &str) -> Self {
        Self { texture, program: program.to_string() }
    }
}

impl Renderable for Skybox {
    fn draw(&self, gm: &mut GraphicsManager, ctx: &DrawContext<'_>) -> Result<()> {
        if !ctx.pass.draws_overlays() {
            return Ok(());
        }
        if !gm.has_shader_program(&self.program) {
            engine_bail!(SOURCE, crate::error::Error::MissingShaderProgram(self.program.clone()));
        }
        let cube = gm.cube_mesh(&self.program)?;

        let depth_func = gm.fixed_function_state().depth_func;
        gm.set_depth_func(DepthFunc::LessEqual);
        if let Err(e) = gm.use_shader(&self.program) {
            gm.set_depth_func(depth_func);
            return Err(e);
        }
        gm.set_uniform("skybox_texture", self.texture);
        // Rotation only, the box follows the camera
        gm.set_uniform("u_view", Mat4::from_mat3(Mat3::from_mat4(ctx.view)));
        gm.set_uniform("u_projection", ctx.projection_3d);
        let drawn = gm.draw_mesh(cube);
        gm.set_depth_func(depth_func);
        gm.clear_shader();
        drawn
    }
}

/// Textured quad placed in surface pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite2D {
    pub texture: TextureKey,
    pub program: String,
}

impl Sprite2D {
    pub fn new(texture: TextureKey, program: &str) -> Self {
        Self { texture, program: program.to_string() }
    }
}

impl Renderable for Sprite2D {
    fn draw(&self, gm: &mut GraphicsManager, ctx: &DrawContext<'_>) -> Result<()> {
        if !ctx.pass.draws_overlays() {
            return Ok(());
        }
        if !gm.has_shader_program(&self.program) {
            engine_bail!(SOURCE, crate::error::Error::MissingShaderProgram(self.program.clone()));
        }
        let quad = gm.quad_mesh(&self.program)?;

        let blend = gm.blend_mode();
        gm.set_blend(Some(BlendMode::Alpha));
        if let Err(e) = gm.use_shader(&self.program) {
            gm.set_blend(blend);
            return Err(e);
        }
        gm.set_uniform("sprite_texture", self.texture);
        gm.set_uniform("u_model", ctx.world);
        gm.set_uniform("u_projection", ctx.projection_2d);
        let drawn = gm.draw_mesh(quad);
        gm.clear_shader();
        gm.set_blend(blend);
        drawn
    }
}
