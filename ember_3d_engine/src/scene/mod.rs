/// Scene graph: nodes, transforms, cameras, lights, shadows and traversal.

pub mod transform;
pub mod camera;
pub mod light;
pub mod shadow;
pub mod render_pass;
pub mod renderable;
pub mod node;
pub mod scene;

pub use transform::{NodeTransform, Transform2D, Transform3D};
pub use camera::Camera3D;
pub use light::{
    light_direction, DirectionalLightState, FrameLights, Light, LightKind, LightProperties,
    LightSource, PointLightState, SpotLightState,
};
pub use shadow::{
    fit_directional_light_space, frustum_corners, point_face_matrices, select_cube_face,
    PointShadow, POINT_FACES,
};
pub use render_pass::RenderPass;
pub use renderable::{DrawContext, Renderable, Skybox, Sprite2D};
pub use node::{Node, NodeCallback, NodeKey, NodeKind, UpdateCallback};
pub use scene::Scene;
