use glam::{Mat4, Vec3};

/// Pitch is clamped just short of straight up/down so the basis never degenerates.
pub const PITCH_LIMIT: f32 = 1.5707;

/// Camera position plus yaw/pitch in radians.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraPose {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
        }
    }

    /// Matrix uploaded as `u_rotationMatrix`: pitch about X, then yaw about Y.
    ///
    /// The shader multiplies direction vectors from the left (`v * M`), so camera space maps to
    /// world space through the transpose; see [`CameraPose::to_world`].
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.pitch) * Mat4::from_rotation_y(self.yaw)
    }

    /// Rotates a camera-space direction into world space the same way the shader does.
    pub fn to_world(&self, direction: Vec3) -> Vec3 {
        self.rotation_matrix().transpose().transform_vector3(direction)
    }

    pub fn forward(&self) -> Vec3 {
        self.to_world(Vec3::NEG_Z)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.0, 2.0), 0.0, 0.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CameraMovement {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub sprint: bool,
}

impl CameraMovement {
    pub fn any(&self) -> bool {
        self.move_forward
            || self.move_backward
            || self.move_left
            || self.move_right
            || self.move_up
            || self.move_down
    }
}

/// Free-fly controller: mouse look plus WASD style movement relative to the view direction.
#[derive(Debug, Clone, Copy)]
pub struct CameraController {
    pub pose: CameraPose,
    pub mouse_sensitivity: f32,
    pub move_speed: f32,
    pub sprint_multiplier: f32,
}

impl CameraController {
    pub fn new(pose: CameraPose) -> Self {
        Self {
            pose,
            mouse_sensitivity: 0.002,
            move_speed: 1.0,
            sprint_multiplier: 5.0,
        }
    }

    pub fn with_tuning(mut self, mouse_sensitivity: f32, move_speed: f32, sprint_multiplier: f32) -> Self {
        self.mouse_sensitivity = mouse_sensitivity;
        self.move_speed = move_speed;
        self.sprint_multiplier = sprint_multiplier;
        self
    }

    /// Applies a cursor offset from the capture point. Returns true if the orientation changed.
    pub fn look(&mut self, dx: f32, dy: f32) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.pose.yaw += dx * self.mouse_sensitivity;
        self.pose.pitch = (self.pose.pitch + dy * self.mouse_sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        true
    }

    pub fn update_movement(&mut self, input: &CameraMovement, frame_dt: f32) -> bool {
        if !input.any() {
            return false;
        }
        let forward = self.pose.forward();
        let up = Vec3::Y;
        let right = forward.cross(up);

        let mut direction = Vec3::ZERO;
        if input.move_forward {
            direction += forward;
        }
        if input.move_backward {
            direction -= forward;
        }
        if input.move_right {
            direction += right;
        }
        if input.move_left {
            direction -= right;
        }
        if input.move_up {
            direction += up;
        }
        if input.move_down {
            direction -= up;
        }

        if direction.length_squared() <= 0.0 {
            return false;
        }
        let multiplier = if input.sprint { self.sprint_multiplier } else { 1.0 };
        self.pose.position += direction.normalize() * frame_dt * self.move_speed * multiplier;
        true
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(CameraPose::default())
    }
}
