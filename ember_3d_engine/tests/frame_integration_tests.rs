//! Integration tests for a full frame
//!
//! Builds a scene through the public API only (skybox, lit object, point and
//! directional lights, 2D overlay) and checks the draw sequence recorded by
//! the in-memory GPU context.

use ember_3d_engine::ember3d::gpu::{BlendMode, DepthFunc, MockGpuContext, TextureDesc};
use ember_3d_engine::ember3d::graphics::{
    cube_mesh_data, GraphicsManager, Material, MaterialInput, Model, FORWARD_PROGRAM,
    SKYBOX_PROGRAM, SPRITE_PROGRAM,
};
use ember_3d_engine::ember3d::scene::{
    Camera3D, Light, LightProperties, Node, NodeKey, Scene, Skybox, Sprite2D, Transform2D,
    Transform3D,
};
use ember_3d_engine::ember3d::{Error, GraphicsConfig};
use ember_3d_engine::glam::{Quat, Vec2, Vec3};

const VS: &str = "in vec3 a_position; in vec3 a_normal; in vec2 a_uv; \
                  uniform mat4 u_model; uniform mat4 u_view; uniform mat4 u_projection;";
const FORWARD_FS: &str = "camera_position environment shadow_map_size point_lights_count point_lights \
                          u_point_light_space_matrix point_light_shadow_maps spot_lights_count \
                          spot_lights directional_lights_count directional_lights \
                          u_directional_light_space_matrix directional_light_shadow_maps material";
const SHADOW_VS: &str = "in vec3 a_position; uniform mat4 u_model; uniform mat4 u_light_space_matrix;";

struct World {
    gm: GraphicsManager,
    scene: Scene,
    lamp: NodeKey,
    sun: NodeKey,
}

fn mock(gm: &GraphicsManager) -> &MockGpuContext {
    gm.context_as::<MockGpuContext>().unwrap()
}

fn build_world() -> World {
    let context = MockGpuContext::with_display_size(800, 600);
    let mut gm = GraphicsManager::new(Box::new(context), GraphicsConfig::default().with_shadow_map_size(512)).unwrap();
    gm.create_forward_program(VS, FORWARD_FS).unwrap();
    gm.create_point_shadow_program(SHADOW_VS, "origin range").unwrap();
    gm.create_directional_shadow_program(SHADOW_VS, "void main() {}").unwrap();
    gm.create_sprite_program(VS, "sprite_texture").unwrap();
    gm.create_skybox_program(VS, "skybox_texture").unwrap();

    let sky_texture = gm.create_texture("sky", &TextureDesc::cube_map(64, None)).unwrap();
    let logo = gm.create_texture("logo", &TextureDesc::color(32, 32, None)).unwrap();
    let mesh = gm.create_mesh(FORWARD_PROGRAM, &cube_mesh_data()).unwrap();

    let mut scene = Scene::new("demo");
    let root = scene.add_root(Node::spatial("root", Transform3D::IDENTITY));
    let sky = scene.add_node(Node::skybox("sky", Skybox::new(sky_texture, SKYBOX_PROGRAM)));
    let camera = scene.add_node(Node::camera(
        "camera",
        Camera3D::default(),
        Transform3D::from_position(Vec3::new(0.0, 2.0, 8.0)),
    ));
    let crate_node = scene.add_node(Node::object(
        "crate",
        Model::new(
            mesh,
            Material::new("wood", FORWARD_PROGRAM).with_albedo(MaterialInput::Value(Vec3::new(0.6, 0.4, 0.2))),
        ),
        Transform3D::IDENTITY,
    ));
    let lamp = scene.add_node(Node::light(
        "lamp",
        Light::point(LightProperties::new(Vec3::new(1.0, 0.9, 0.7)), 15.0),
        Transform3D::from_position(Vec3::new(2.0, 3.0, 0.0)),
    ));
    let sun = scene.add_node(Node::light(
        "sun",
        Light::directional(LightProperties::default()),
        Transform3D::IDENTITY.with_rotation(Quat::from_rotation_z(-std::f32::consts::FRAC_PI_3)),
    ));
    let hud = scene.add_node(Node::sprite(
        "logo",
        Sprite2D::new(logo, SPRITE_PROGRAM),
        Transform2D::from_position(Vec2::new(16.0, 16.0)).with_scale(Vec2::splat(32.0)),
    ));

    for child in [sky, camera, crate_node, lamp, sun, hud] {
        scene.push_child(root, child).unwrap();
    }
    scene.set_main_camera(camera).unwrap();

    World { gm, scene, lamp, sun }
}

#[test]
fn test_full_frame_draw_sequence() {
    let mut world = build_world();

    world.gm.render_frame(&mut world.scene, 0.0, |_, _| {}).unwrap();

    let point_name = world.gm.point_atlas().unwrap().framebuffer_name();
    let point_fb = world.gm.framebuffer(point_name).map(|f| f.handle());
    let calls = mock(&world.gm).draw_calls();
    // 6 point faces + 1 directional layer for the crate, then sky, crate, logo
    assert_eq!(calls.len(), 10);
    assert!(calls[..6].iter().all(|c| c.framebuffer.is_some() && c.framebuffer == point_fb));
    assert!(calls[6].framebuffer.is_some() && calls[6].framebuffer != point_fb);

    let main = &calls[7..];
    assert!(main.iter().all(|c| c.framebuffer.is_none()));
    assert_eq!(main[0].state.depth_func, DepthFunc::LessEqual);
    assert_eq!(main[1].state.depth_func, DepthFunc::Less);
    assert_eq!(main[2].blend, Some(BlendMode::Alpha));
    assert_eq!(mock(&world.gm).blend(), None);
}

#[test]
fn test_state_is_clean_between_frames() {
    let mut world = build_world();

    for i in 0..3 {
        let frame = world.gm.render_frame(&mut world.scene, i as f64 * 0.02, |_, _| {}).unwrap();
        assert_eq!(frame.frame_index, i);
        assert!(world.gm.active_shader().is_none());
        assert!(world.gm.active_framebuffer().is_none());
        assert_eq!(mock(&world.gm).bound_framebuffer(), None);
    }
}

#[test]
fn test_removing_lights_shrinks_atlases() {
    let mut world = build_world();
    world.gm.render_frame(&mut world.scene, 0.0, |_, _| {}).unwrap();
    assert_eq!(world.gm.point_atlas().unwrap().layers(), 6);

    world.scene.despawn(world.lamp).unwrap();
    world.scene.despawn(world.sun).unwrap();
    let textures_before = mock(&world.gm).live_textures();
    world.gm.context_as_mut::<MockGpuContext>().unwrap().reset_recording();
    world.gm.render_frame(&mut world.scene, 0.02, |_, _| {}).unwrap();

    assert_eq!(world.gm.point_atlas().unwrap().light_count(), 0);
    assert_eq!(world.gm.directional_atlas().unwrap().light_count(), 0);
    assert_eq!(mock(&world.gm).live_textures(), textures_before);
    // Only the main pass remains: sky, crate, logo
    let calls = mock(&world.gm).draw_calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.framebuffer.is_none()));
}

#[test]
fn test_update_closure_can_move_nodes() {
    let mut world = build_world();
    let lamp = world.lamp;

    world
        .gm
        .render_frame(&mut world.scene, 0.0, |scene, _| {
            if let Some(t) = scene.node_mut(lamp).and_then(|n| n.transform_3d_mut()) {
                t.position = Vec3::new(0.0, 50.0, 0.0);
            }
        })
        .unwrap();

    assert_eq!(
        world.scene.world_matrix(lamp).w_axis.truncate(),
        Vec3::new(0.0, 50.0, 0.0)
    );
}

#[test]
fn test_missing_camera_after_despawn() {
    let mut world = build_world();
    let camera = world.scene.get_node("camera").unwrap();
    world.scene.despawn(camera).unwrap();

    let result = world.gm.render_frame(&mut world.scene, 0.0, |_, _| {});

    assert_eq!(result, Err(Error::MissingCamera("demo".to_string())));
}

#[test]
fn test_release_all_frees_gpu_objects() {
    let mut world = build_world();
    world.gm.render_frame(&mut world.scene, 0.0, |_, _| {}).unwrap();

    world.gm.release_all();

    let gpu = mock(&world.gm);
    assert_eq!(gpu.live_programs(), 0);
    assert_eq!(gpu.live_textures(), 0);
    assert_eq!(gpu.live_framebuffers(), 0);
    assert_eq!(gpu.live_meshes(), 0);
}
