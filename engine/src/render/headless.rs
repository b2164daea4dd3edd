//! Headless renderer
//!
//! Records what would have been drawn instead of drawing it. Used by tests
//! and by runs without a window.

use glam::Mat4;

use super::SceneRenderer;
use super::scene::MeshInstance;
use crate::camera::CameraPose;

/// Summary of one rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub camera: CameraPose,
    pub transforms: Vec<Mat4>,
    pub triangles: usize,
}

/// [`SceneRenderer`] that keeps a log of frames.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRenderer {
    frames: Vec<RecordedFrame>,
    resets: usize,
    /// Oldest frames are dropped past this many; 0 keeps everything
    history: usize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `history` frames.
    pub fn with_history(history: usize) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RecordedFrame> {
        self.frames.last()
    }

    /// How many times the render surface was torn down.
    pub fn resets(&self) -> usize {
        self.resets
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn render(&mut self, camera: &CameraPose, instances: &[MeshInstance]) {
        if self.history > 0 && self.frames.len() == self.history {
            self.frames.remove(0);
        }
        self.frames.push(RecordedFrame {
            camera: *camera,
            transforms: instances.iter().map(|i| i.transform).collect(),
            triangles: instances.iter().map(|i| i.mesh.triangle_count()).sum(),
        });
    }

    fn reset(&mut self) {
        self.frames.clear();
        self.resets += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::camera::follow_pose;
    use crate::render::box_mesh;

    #[test]
    fn test_records_frames_and_resets() {
        let mut renderer = HeadlessRenderer::with_history(2);
        let pose = follow_pose(Vec3::ZERO, Vec3::ZERO, 0.0, 400.0);
        let instance = MeshInstance {
            mesh: Arc::new(box_mesh(Vec3::ONE, [1.0; 4])),
            transform: Mat4::IDENTITY,
        };

        for _ in 0..3 {
            renderer.render(&pose, std::slice::from_ref(&instance));
        }
        assert_eq!(renderer.frames().len(), 2);
        assert_eq!(renderer.last_frame().map(|f| f.triangles), Some(12));

        renderer.reset();
        assert!(renderer.frames().is_empty());
        assert_eq!(renderer.resets(), 1);
    }
}
