//! Render Module
//!
//! Scene meshes and the two renderers that draw them: [`GpuRenderer`]
//! (wgpu, into a winit window) and [`HeadlessRenderer`] (records frames).
//! The simulation loop only sees the [`SceneRenderer`] trait.

pub mod gpu;
pub mod headless;
pub mod scene;

pub use gpu::{FrameUniforms, GpuRenderer};
pub use headless::{HeadlessRenderer, RecordedFrame};
pub use scene::{Mesh, MeshInstance, Scene, SceneVertex, box_mesh, grid_mesh, rgb_hex};

use crate::camera::CameraPose;

/// Errors raised while creating the GPU renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    UnsupportedSurface,
}

/// Something that can draw a frame of mesh instances.
///
/// Frame-level failures (a lost surface, say) are handled inside the
/// renderer; a tick never fails because of rendering.
pub trait SceneRenderer {
    /// Draw one frame seen from `camera`.
    fn render(&mut self, camera: &CameraPose, instances: &[MeshInstance]);

    /// Tear down per-scene state so a fresh scene can be drawn.
    fn reset(&mut self);
}
