/// View-plane projection of world points onto the screen
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::camera::{CameraState, ViewPlane};
use crate::geometry::{angle_between, distance};

/// Largest pixel offset from the screen center on either axis
pub const PIXEL_CLAMP: f64 = 30_000.0;

/// Screen size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point2<f64> {
        Point2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// A world point mapped to pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    pub screen: Point2<f64>,
    pub behind: bool,
}

/// Signed distances on the view plane, measured from its center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneOffset {
    pub horizontal: f64,
    pub vertical: f64,
}

/// Projects world points for one camera state.
///
/// The view plane and field-of-view scale are computed once on construction,
/// so a projector should be rebuilt whenever the camera moves.
#[derive(Debug, Clone)]
pub struct Projector {
    position: Point3<f64>,
    orientation: Vector3<f64>,
    view: ViewPlane,
    viewport: Viewport,
    fov_scale: f64,
}

impl Projector {
    pub fn new(camera: &CameraState, viewport: Viewport) -> Self {
        Self {
            position: camera.position,
            orientation: camera.orientation,
            view: camera.view_plane(),
            viewport,
            fov_scale: (camera.fov / 2.0).sin(),
        }
    }

    /// Distance from the camera, used as the depth of primitives
    pub fn distance_to(&self, point: &Point3<f64>) -> f64 {
        distance(&self.position, point)
    }

    /// Whether `point` lies at or beyond 90° from the viewing direction
    pub fn is_behind(&self, point: &Point3<f64>) -> bool {
        match angle_between(&self.orientation, &(point - self.position)) {
            Some(angle) => angle >= FRAC_PI_2,
            None => true,
        }
    }

    /// Where the ray from the camera through `point` meets the view plane,
    /// decomposed along the horizon line. `None` if the ray never meets it.
    pub fn plane_offset(&self, point: &Point3<f64>) -> Option<PlaneOffset> {
        let center = self.view.center;
        let hit = self.view.plane.intersect_ray(&self.position, point)?;

        // Closest point to `hit` on the horizontal line through the center,
        // running perpendicular to the horizontal viewing direction.
        let (p, q) = (self.orientation.x, self.orientation.y);
        let horizontal_norm = p * p + q * q;
        let lambda = if horizontal_norm == 0.0 {
            0.0
        } else {
            (q * center.x - q * hit.x + p * hit.y - p * center.y) / horizontal_norm
        };
        let horizon = Point3::new(center.x - lambda * q, center.y + lambda * p, center.z);

        let mut horizontal = distance(&center, &horizon);
        if lambda > 0.0 {
            horizontal = -horizontal;
        }
        let mut vertical = distance(&horizon, &hit);
        if hit.z < horizon.z {
            vertical = -vertical;
        }
        Some(PlaneOffset {
            horizontal,
            vertical,
        })
    }

    /// Convert a view-plane offset into a clamped pixel offset from the
    /// screen center. Both axes scale by the screen width.
    pub fn pixel_offset(&self, offset: PlaneOffset) -> (f64, f64) {
        let half_width = self.viewport.width as f64 / 2.0;
        let x = offset.horizontal / self.fov_scale * half_width;
        let y = offset.vertical / self.fov_scale * half_width;
        clamp_offset(x, y)
    }

    pub fn project(&self, point: &Point3<f64>) -> ProjectedPoint {
        let center = self.viewport.center();
        let Some(offset) = self.plane_offset(point) else {
            return ProjectedPoint {
                screen: center,
                behind: true,
            };
        };
        let (dx, dy) = self.pixel_offset(offset);
        ProjectedPoint {
            screen: Point2::new(center.x + dx, center.y - dy),
            behind: self.is_behind(point),
        }
    }

    /// Project every point, preserving count and order
    pub fn project_all(&self, points: &[Point3<f64>]) -> Vec<ProjectedPoint> {
        points.iter().map(|point| self.project(point)).collect()
    }
}

/// Limit each axis to `PIXEL_CLAMP`, scaling the other axis by the same
/// factor so the direction from the center is kept.
fn clamp_offset(x: f64, y: f64) -> (f64, f64) {
    let (mut x, mut y) = (saturate(x), saturate(y));
    if y.abs() > PIXEL_CLAMP {
        let factor = PIXEL_CLAMP / y.abs();
        x *= factor;
        y = PIXEL_CLAMP.copysign(y);
        log::trace!("clamped vertical pixel offset by {factor}");
    }
    if x.abs() > PIXEL_CLAMP {
        let factor = PIXEL_CLAMP / x.abs();
        y *= factor;
        x = PIXEL_CLAMP.copysign(x);
        log::trace!("clamped horizontal pixel offset by {factor}");
    }
    (x, y)
}

/// Replace infinities with the largest finite value of the same sign and NaN with 0
fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}
