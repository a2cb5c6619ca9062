use std::cell::Cell;

use glam::{Mat4, Vec3};

/// View and projection for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

impl CameraMatrices {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Perspective camera looking at a target.
///
/// The projection is built once from fov/aspect/near/far and rebuilt only by
/// [`set_aspect`](Self::set_aspect). The view matrix is computed lazily after the
/// position or target changes.
#[derive(Debug, Clone)]
pub struct Camera {
    fov_y: f32,
    near: f32,
    far: f32,
    projection: Mat4,

    position: Vec3,
    target: Vec3,
    up: Vec3,
    view: Cell<Option<Mat4>>,
}

impl Camera {
    /// `fov_y` in radians; `width`/`height` give the aspect ratio.
    pub fn new(fov_y: f32, width: f32, height: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y,
            near,
            far,
            projection: perspective(fov_y, width, height, near, far),
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            view: Cell::new(None),
        }
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view(&self) -> Mat4 {
        if let Some(v) = self.view.get() {
            return v;
        }
        let v = Mat4::look_at_rh(self.position, self.target, self.up);
        self.view.set(Some(v));
        v
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.view.set(None);
    }

    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        self.view.set(None);
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.projection = perspective(self.fov_y, width, height, self.near, self.far);
    }

    /// Matrices for a camera mounted on a scene node whose world transform is `rig`.
    pub fn matrices(&self, rig: Mat4) -> CameraMatrices {
        CameraMatrices {
            view: self.view() * rig.inverse(),
            projection: self.projection,
        }
    }
}

fn perspective(fov_y: f32, width: f32, height: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov_y, width.max(1.0) / height.max(1.0), near, far)
}
