/// Vector and plane helpers used by the projector
use nalgebra::{Point3, Vector3};

/// Cosine between a ray and a plane's normal below which the ray counts as parallel
const PARALLEL_EPSILON: f64 = 1e-12;

/// Euclidean distance between two points
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (a - b).norm()
}

/// Angle between two vectors in radians, `None` if either has zero length
pub fn angle_between(v: &Vector3<f64>, w: &Vector3<f64>) -> Option<f64> {
    let magnitudes = v.norm() * w.norm();
    if magnitudes == 0.0 {
        return None;
    }
    let cos = (v.dot(w) / magnitudes).clamp(-1.0, 1.0);
    Some(cos.acos())
}

/// Rescale the horizontal (x, y) part of a vector to unit length, keeping z.
///
/// A vector with no horizontal extent is returned unchanged.
pub fn modulate_horizontal(v: &Vector3<f64>) -> Vector3<f64> {
    let magnitude = v.xy().norm();
    if magnitude == 0.0 {
        return *v;
    }
    Vector3::new(v.x / magnitude, v.y / magnitude, v.z)
}

/// A plane `a·x + b·y + c·z + d = 0` with `(a, b, c)` stored as `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub d: f64,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vector3<f64>, point: &Point3<f64>) -> Self {
        let d = -normal.dot(&point.coords);
        Self { normal, d }
    }

    /// Signed value of the plane equation at `point`
    pub fn evaluate(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.d
    }

    /// Intersect the line through `origin` and `through` with this plane.
    ///
    /// Returns `None` when the line is parallel to the plane, which includes
    /// the case where both points coincide.
    pub fn intersect_ray(&self, origin: &Point3<f64>, through: &Point3<f64>) -> Option<Point3<f64>> {
        let direction = through - origin;
        let denominator = self.normal.dot(&direction);
        if denominator.abs() <= PARALLEL_EPSILON * self.normal.norm() * direction.norm() {
            return None;
        }
        let lambda = -self.evaluate(through) / denominator;
        Some(through + direction * lambda)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_distance() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 6.0, 3.0);
        assert_relative_eq!(distance(&a, &b), 5.0);
    }

    #[test]
    fn test_angle_between() {
        let x = Vector3::x();
        assert_relative_eq!(angle_between(&x, &Vector3::y()).unwrap(), FRAC_PI_2);
        assert_relative_eq!(angle_between(&x, &-x).unwrap(), PI);
        assert_relative_eq!(angle_between(&x, &(x * 3.0)).unwrap(), 0.0);
        assert!(angle_between(&x, &Vector3::zeros()).is_none());
    }

    #[test]
    fn test_modulate_horizontal() {
        let v = modulate_horizontal(&Vector3::new(3.0, 4.0, 7.0));
        assert_relative_eq!(v, Vector3::new(0.6, 0.8, 7.0));

        let vertical = Vector3::new(0.0, 0.0, 2.0);
        assert_eq!(modulate_horizontal(&vertical), vertical);
    }

    #[test]
    fn test_plane_from_normal_and_point() {
        let plane = Plane::from_normal_and_point(Vector3::new(1.0, 1.0, 0.0), &Point3::new(2.0, 0.0, 5.0));
        assert_relative_eq!(plane.d, -2.0);
        assert_relative_eq!(plane.evaluate(&Point3::new(0.0, 2.0, -3.0)), 0.0);
    }

    #[test]
    fn test_intersect_ray() {
        let plane = Plane::from_normal_and_point(Vector3::x(), &Point3::new(1.0, 0.0, 0.0));
        let hit = plane
            .intersect_ray(&Point3::origin(), &Point3::new(4.0, 2.0, -4.0))
            .unwrap();
        assert_relative_eq!(hit, Point3::new(1.0, 0.5, -1.0));
    }

    #[test]
    fn test_intersect_parallel_ray() {
        let plane = Plane::from_normal_and_point(Vector3::x(), &Point3::new(1.0, 0.0, 0.0));
        assert!(plane
            .intersect_ray(&Point3::origin(), &Point3::new(0.0, 3.0, 1.0))
            .is_none());
        assert!(plane.intersect_ray(&Point3::origin(), &Point3::origin()).is_none());
    }

    #[test]
    fn test_intersect_short_ray() {
        let plane = Plane::from_normal_and_point(Vector3::x(), &Point3::new(1.0, 0.0, 0.0));
        let hit = plane
            .intersect_ray(&Point3::origin(), &Point3::new(1e-13, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(hit, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-9);
    }
}
