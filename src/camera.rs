//! Perspective orbit camera with damped drag/zoom, plus screen → world rays
//! for picking.

use glam::{Mat4, Vec3, Vec4};

const FOV_Y_DEGREES: f32 = 60.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;
const ROTATE_SPEED: f32 = 0.005;
const ZOOM_SPEED: f32 = 0.1;
const MIN_DISTANCE: f32 = 5.0;
const MAX_DISTANCE: f32 = 150.0;

pub struct OrbitCamera {
    pub target: Vec3,
    pub aspect: f32,
    /// Angle around the y axis, radians.
    yaw: f32,
    /// Elevation above the x/z plane, radians.
    pitch: f32,
    distance: f32,
    /// Fraction of the pending motion applied (and removed) per frame.
    damping: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    zoom_velocity: f32,
}

impl OrbitCamera {
    /// Camera at `eye` looking at the origin.
    pub fn new(eye: Vec3, aspect: f32) -> Self {
        let distance = eye.length().max(MIN_DISTANCE);
        OrbitCamera {
            target: Vec3::ZERO,
            aspect,
            yaw: eye.x.atan2(eye.z),
            pitch: (eye.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
            damping: 0.05,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + self.distance * Vec3::new(sin_yaw * cos_pitch, sin_pitch, cos_yaw * cos_pitch)
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), self.aspect, NEAR, FAR);
        proj * view
    }

    /// Queue a rotation from a pointer drag of (`dx`, `dy`) pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.yaw_velocity -= dx * ROTATE_SPEED;
        self.pitch_velocity += dy * ROTATE_SPEED;
    }

    /// Queue a zoom; positive `lines` moves closer.
    pub fn scroll(&mut self, lines: f32) {
        self.zoom_velocity -= lines * ZOOM_SPEED;
    }

    /// Apply a damped share of the queued motion. Call once per frame.
    pub fn update(&mut self) {
        self.yaw += self.yaw_velocity * self.damping;
        self.pitch = (self.pitch + self.pitch_velocity * self.damping).clamp(-1.5, 1.5);
        self.distance = (self.distance * (1.0 + self.zoom_velocity * self.damping))
            .clamp(MIN_DISTANCE, MAX_DISTANCE);

        let keep = 1.0 - self.damping;
        self.yaw_velocity *= keep;
        self.pitch_velocity *= keep;
        self.zoom_velocity *= keep;
    }

    /// World-space ray through a pixel of a `width x height` viewport.
    pub fn screen_ray(&self, x: f32, y: f32, width: f32, height: f32) -> (Vec3, Vec3) {
        let ndc_x = 2.0 * x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height;

        // wgpu clip space has z in [0, 1]
        let inv = self.view_proj().inverse();
        let near = inv * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        (near, (far - near).normalize())
    }
}
