/// Pass a scene traversal runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPass {
    /// Forward shading into the back buffer
    Main,
    /// Depth-only into a directional atlas layer
    ShadowDirectional,
    /// Depth-only into one face of a point atlas slot
    ShadowPoint,
}

impl RenderPass {
    pub fn is_shadow(&self) -> bool {
        !matches!(self, RenderPass::Main)
    }

    /// Update callbacks fire once per frame, during the main pass
    pub fn runs_update_callbacks(&self) -> bool {
        matches!(self, RenderPass::Main)
    }

    /// Sprites and skyboxes are skipped by shadow passes
    pub fn draws_overlays(&self) -> bool {
        matches!(self, RenderPass::Main)
    }
}
