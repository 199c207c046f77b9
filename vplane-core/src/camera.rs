/// Camera state and the per-tick camera update
use nalgebra::{Point3, Vector2, Vector3};
use std::collections::HashSet;
use std::f64::consts::FRAC_PI_2;

use crate::error::{Error, Result};
use crate::geometry::{modulate_horizontal, Plane};

/// Keeps the pitch away from ±90°, where `tan` of the vertical angle diverges
pub const PITCH_MARGIN: f64 = 0.01;

/// A directional input held by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    RotateLeft,
    RotateRight,
    RotateUp,
    RotateDown,
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
}

/// The set of intents active during a tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSet {
    active: HashSet<Intent>,
}

impl IntentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, intent: Intent) {
        self.active.insert(intent);
    }

    pub fn release(&mut self, intent: Intent) {
        self.active.remove(&intent);
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn contains(&self, intent: Intent) -> bool {
        self.active.contains(&intent)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// +1, -1 or 0 depending on which of two opposing intents is held
    fn axis(&self, positive: Intent, negative: Intent) -> f64 {
        match (self.contains(positive), self.contains(negative)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// (horizontal, vertical) angular velocity in radians per tick
    pub fn rotation_speeds(&self, tuning: &CameraTuning) -> (f64, f64) {
        (
            self.axis(Intent::RotateLeft, Intent::RotateRight) * tuning.pan_speed,
            self.axis(Intent::RotateUp, Intent::RotateDown) * tuning.pan_speed,
        )
    }

    /// Camera-relative planar translation: x is forward, y is left
    pub fn translation(&self) -> Vector3<f64> {
        Vector3::new(
            self.axis(Intent::MoveForward, Intent::MoveBack),
            self.axis(Intent::MoveLeft, Intent::MoveRight),
            0.0,
        )
    }
}

impl FromIterator<Intent> for IntentSet {
    fn from_iter<I: IntoIterator<Item = Intent>>(iter: I) -> Self {
        Self {
            active: iter.into_iter().collect(),
        }
    }
}

/// Per-tick camera speeds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTuning {
    pub pan_speed: f64,
    pub move_speed: f64,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            pan_speed: 0.02,
            move_speed: 0.1,
        }
    }
}

/// The center and equation of the view plane for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPlane {
    pub center: Point3<f64>,
    pub plane: Plane,
}

/// Camera position, orientation and the velocities applied on the last tick
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub position: Point3<f64>,
    /// Viewing direction; horizontal part has unit length, z is `tan(pitch)`
    pub orientation: Vector3<f64>,
    pub horizontal_angle: f64,
    pub vertical_angle: f64,
    pub horizontal_speed: f64,
    pub vertical_speed: f64,
    /// World-space translation applied on the last tick
    pub translation: Vector3<f64>,
    /// Field of view in radians
    pub fov: f64,
}

impl CameraState {
    /// Place a camera at `position` looking along `look` (any finite, non-zero length).
    pub fn new(position: Point3<f64>, look: Vector3<f64>, fov: f64) -> Result<Self> {
        let length = look.norm();
        if !length.is_finite() || length == 0.0 {
            return Err(Error::DegenerateOrientation);
        }
        let horizontal_angle = look.y.atan2(look.x);
        let vertical_angle = clamp_pitch(look.z.atan2(look.xy().norm()));

        Ok(Self {
            position,
            orientation: orientation_from_angles(horizontal_angle, vertical_angle),
            horizontal_angle,
            vertical_angle,
            horizontal_speed: 0.0,
            vertical_speed: 0.0,
            translation: Vector3::zeros(),
            fov,
        })
    }

    /// Advance the camera by one tick under the given intents
    pub fn advance(&self, intents: &IntentSet, tuning: &CameraTuning) -> Self {
        let (horizontal_speed, vertical_speed) = intents.rotation_speeds(tuning);
        let horizontal_angle = self.horizontal_angle + horizontal_speed;
        let vertical_angle = clamp_pitch(self.vertical_angle + vertical_speed);
        let orientation = orientation_from_angles(horizontal_angle, vertical_angle);

        let mut local = intents.translation();
        if local.x != 0.0 || local.y != 0.0 {
            local = modulate_horizontal(&local);
        }
        let local = local.xy() * tuning.move_speed;
        let translation = rotate_into_world(&orientation, &local);

        Self {
            position: self.position + translation,
            orientation,
            horizontal_angle,
            vertical_angle,
            horizontal_speed,
            vertical_speed,
            translation,
            fov: self.fov,
        }
    }

    /// The plane one unit ahead of the camera, perpendicular to the orientation
    pub fn view_plane(&self) -> ViewPlane {
        let magnitude = self.orientation.norm();
        let center = if magnitude == 0.0 {
            self.position
        } else {
            self.position + self.orientation / magnitude
        };
        ViewPlane {
            center,
            plane: Plane::from_normal_and_point(self.orientation, &center),
        }
    }
}

fn clamp_pitch(angle: f64) -> f64 {
    let limit = FRAC_PI_2 - PITCH_MARGIN;
    angle.clamp(-limit, limit)
}

fn orientation_from_angles(horizontal: f64, vertical: f64) -> Vector3<f64> {
    modulate_horizontal(&Vector3::new(horizontal.cos(), horizontal.sin(), vertical.tan()))
}

/// Rotate a camera-relative (forward, left) offset so forward follows the yaw
fn rotate_into_world(orientation: &Vector3<f64>, local: &Vector2<f64>) -> Vector3<f64> {
    Vector3::new(
        orientation.x * local.x - orientation.y * local.y,
        orientation.y * local.x + orientation.x * local.y,
        0.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_4, PI};

    fn camera() -> CameraState {
        CameraState::new(Point3::new(0.0, 0.0, 1.2), Vector3::new(1.0, 1.0, 0.0), PI).unwrap()
    }

    #[test]
    fn test_new_camera_orientation() {
        let camera = camera();
        assert_relative_eq!(camera.horizontal_angle, FRAC_PI_4);
        assert_relative_eq!(camera.vertical_angle, 0.0);
        let h = 0.5f64.sqrt();
        assert_relative_eq!(camera.orientation, Vector3::new(h, h, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_look_is_rejected() {
        let result = CameraState::new(Point3::origin(), Vector3::zeros(), PI);
        assert!(matches!(result, Err(Error::DegenerateOrientation)));
    }

    #[test]
    fn test_non_finite_look_is_rejected() {
        for look in [
            Vector3::new(f64::NAN, 0.0, 0.0),
            Vector3::new(1.0, f64::INFINITY, 0.0),
        ] {
            let result = CameraState::new(Point3::origin(), look, PI);
            assert!(matches!(result, Err(Error::DegenerateOrientation)), "{look:?}");
        }
    }

    #[test]
    fn test_idle_advance_keeps_position() {
        let camera = camera();
        let next = camera.advance(&IntentSet::new(), &CameraTuning::default());
        assert_eq!(next.position, camera.position);
        assert_relative_eq!(next.orientation, camera.orientation, epsilon = 1e-12);
        assert_eq!(next.translation, Vector3::zeros());
    }

    #[test]
    fn test_rotate_left_increases_yaw() {
        let intents: IntentSet = [Intent::RotateLeft].into_iter().collect();
        let next = camera().advance(&intents, &CameraTuning::default());
        assert_relative_eq!(next.horizontal_angle, FRAC_PI_4 + 0.02);
        assert_relative_eq!(next.horizontal_speed, 0.02);
        assert_relative_eq!(next.orientation.xy().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_opposing_rotations_cancel() {
        let intents: IntentSet = [Intent::RotateLeft, Intent::RotateRight].into_iter().collect();
        let next = camera().advance(&intents, &CameraTuning::default());
        assert_eq!(next.horizontal_speed, 0.0);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let intents: IntentSet = [Intent::RotateUp].into_iter().collect();
        let mut camera = camera();
        for _ in 0..200 {
            camera = camera.advance(&intents, &CameraTuning::default());
        }
        assert_relative_eq!(camera.vertical_angle, FRAC_PI_2 - PITCH_MARGIN);
        assert!(camera.orientation.z.is_finite());
        assert!(camera.orientation.z > 0.0);
    }

    #[test]
    fn test_pitch_is_clamped_downwards() {
        let intents: IntentSet = [Intent::RotateDown].into_iter().collect();
        let mut camera = camera();
        for _ in 0..200 {
            camera = camera.advance(&intents, &CameraTuning::default());
        }
        assert_relative_eq!(camera.vertical_angle, -(FRAC_PI_2 - PITCH_MARGIN));
        assert!(camera.orientation.z < 0.0);
        assert_relative_eq!(camera.orientation.xy().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_follows_yaw() {
        let intents: IntentSet = [Intent::MoveForward].into_iter().collect();
        let next = camera().advance(&intents, &CameraTuning::default());
        let step = 0.1 * 0.5f64.sqrt();
        assert_relative_eq!(next.position, Point3::new(step, step, 1.2), epsilon = 1e-12);
    }

    #[test]
    fn test_diagonal_move_has_unit_speed() {
        let intents: IntentSet = [Intent::MoveForward, Intent::MoveLeft].into_iter().collect();
        let next = camera().advance(&intents, &CameraTuning::default());
        assert_relative_eq!(next.translation.norm(), 0.1, epsilon = 1e-12);
        assert_eq!(next.position.z, 1.2);
    }

    #[test]
    fn test_strafe_left_is_perpendicular() {
        let camera = CameraState::new(Point3::origin(), Vector3::x(), PI).unwrap();
        let intents: IntentSet = [Intent::MoveLeft].into_iter().collect();
        let next = camera.advance(&intents, &CameraTuning::default());
        assert_relative_eq!(next.position, Point3::new(0.0, 0.1, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_view_plane_center() {
        let camera = CameraState::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 2.0, 0.0), PI).unwrap();
        let view = camera.view_plane();
        assert_relative_eq!(view.center, Point3::new(1.0, 3.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(view.plane.evaluate(&view.center), 0.0, epsilon = 1e-12);
    }
}
