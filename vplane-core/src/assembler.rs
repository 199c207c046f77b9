/// Turning projected points into drawable primitives
use nalgebra::{Point2, Point3, Vector2};
use serde::{Deserialize, Serialize};

use crate::color::{darken, Color};
use crate::geometry::distance;
use crate::projection::{ProjectedPoint, Viewport};
use crate::scene::SceneObject;

/// Darkening applied to every edge, in percent
const LINE_DARKEN: f64 = 50.0;
/// Darkening per unit of camera distance, in percent
const DISTANCE_DARKEN: f64 = 3.0;
/// Darkening per surface index for index-based shading, in percent
const INDEX_DARKEN: f64 = 5.0;

/// How filled faces are tinted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadingStrategy {
    /// Base color, unchanged
    None,
    /// Darker with average camera distance
    DistanceBased,
    /// Darker with the surface's position in the object's surface list
    #[default]
    IndexBased,
}

/// Per-frame settings for primitive assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyOptions {
    pub viewport: Viewport,
    pub marker_radius: u32,
    pub shading: ShadingStrategy,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            marker_radius: 4,
            shading: ShadingStrategy::default(),
        }
    }
}

/// Screen-space geometry handed to a rasterizer
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Marker {
        center: Point2<f64>,
        radius: u32,
        color: Color,
    },
    Line {
        color: Color,
        from: Point2<f64>,
        to: Point2<f64>,
    },
    Face {
        color: Color,
        points: Vec<Point2<f64>>,
    },
}

/// A primitive together with the camera distance it is sorted by
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub depth: f64,
    pub primitive: Primitive,
}

/// What one object contributed to a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub markers: usize,
    pub lines: usize,
    pub faces: usize,
    pub clipped_lines: usize,
    pub dropped: usize,
}

impl AssemblyStats {
    pub fn emitted(&self) -> usize {
        self.markers + self.lines + self.faces
    }

    pub fn merge(&mut self, other: &AssemblyStats) {
        self.markers += other.markers;
        self.lines += other.lines;
        self.faces += other.faces;
        self.clipped_lines += other.clipped_lines;
        self.dropped += other.dropped;
    }
}

/// Move a behind-camera endpoint to the screen edge.
///
/// The segment is extended from the visible endpoint `front`, away from the
/// projection of the hidden endpoint `behind`, until it reaches the first of
/// the left/right or top/bottom screen edges. This is a screen-space stand-in
/// for clipping against the camera plane. Returns `None` when both endpoints
/// project to the same pixel and no direction can be derived.
pub fn clip_to_screen_edge(
    front: Point2<f64>,
    behind: Point2<f64>,
    viewport: Viewport,
) -> Option<Point2<f64>> {
    let direction: Vector2<f64> = front - behind;
    if direction.x == 0.0 && direction.y == 0.0 {
        return None;
    }

    let edge_distance = |position: f64, delta: f64, size: f64| {
        if delta > 0.0 {
            ((size - position) / delta).max(0.0)
        } else if delta < 0.0 {
            (-position / delta).max(0.0)
        } else {
            f64::INFINITY
        }
    };
    let to_vertical_edge = edge_distance(front.x, direction.x, viewport.width as f64);
    let to_horizontal_edge = edge_distance(front.y, direction.y, viewport.height as f64);

    Some(front + direction * to_vertical_edge.min(to_horizontal_edge))
}

/// Append the markers, lines and faces of one object to `out`.
///
/// `projected` must hold one entry per point of `object`, in order. A
/// connection or surface that references a missing point is counted as
/// dropped.
pub fn assemble(
    object: &SceneObject,
    projected: &[ProjectedPoint],
    camera_position: &Point3<f64>,
    options: &AssemblyOptions,
    out: &mut Vec<Drawable>,
) -> AssemblyStats {
    debug_assert_eq!(object.points.len(), projected.len());

    // projection and depth of one point, `None` for an unknown index
    let vertex = |index: usize| -> Option<(ProjectedPoint, f64)> {
        let point = projected.get(index)?;
        let world = object.points.get(index)?;
        Some((*point, distance(camera_position, world)))
    };
    let mut stats = AssemblyStats::default();

    if object.draw_markers {
        for (point, world) in projected.iter().zip(&object.points) {
            if point.behind {
                stats.dropped += 1;
                continue;
            }
            let depth = distance(camera_position, world);
            out.push(Drawable {
                depth,
                primitive: Primitive::Marker {
                    center: point.screen,
                    radius: options.marker_radius,
                    color: darken(object.color, depth * DISTANCE_DARKEN),
                },
            });
            stats.markers += 1;
        }
    }

    for &(a, b) in &object.connections {
        let (Some((start, start_depth)), Some((end, end_depth))) = (vertex(a), vertex(b)) else {
            log::debug!("object '{}': skipping edge ({a}, {b}) with unknown point", object.name);
            stats.dropped += 1;
            continue;
        };
        let endpoints = match (start.behind, end.behind) {
            (true, true) => None,
            (false, false) => Some((start.screen, end.screen)),
            (true, false) => clip_to_screen_edge(end.screen, start.screen, options.viewport)
                .map(|clipped| (clipped, end.screen)),
            (false, true) => clip_to_screen_edge(start.screen, end.screen, options.viewport)
                .map(|clipped| (start.screen, clipped)),
        };
        let Some((from, to)) = endpoints else {
            stats.dropped += 1;
            continue;
        };
        if start.behind || end.behind {
            stats.clipped_lines += 1;
        }
        out.push(Drawable {
            depth: start_depth.max(end_depth),
            primitive: Primitive::Line {
                color: darken(object.color, LINE_DARKEN),
                from,
                to,
            },
        });
        stats.lines += 1;
    }

    for (surface, indices) in object.surfaces.iter().enumerate() {
        let vertices: Option<Vec<_>> = indices.iter().map(|&index| vertex(index)).collect();
        let Some(vertices) = vertices.filter(|vertices| vertices.len() >= 3) else {
            log::debug!("object '{}': skipping malformed surface {surface}", object.name);
            stats.dropped += 1;
            continue;
        };
        if vertices.iter().any(|(point, _)| point.behind) {
            stats.dropped += 1;
            continue;
        }
        let points = vertices.iter().map(|(point, _)| point.screen).collect();
        let depth = vertices.iter().map(|(_, depth)| depth).sum::<f64>() / vertices.len() as f64;
        let color = match options.shading {
            ShadingStrategy::None => object.color,
            ShadingStrategy::DistanceBased => darken(object.color, depth * DISTANCE_DARKEN),
            ShadingStrategy::IndexBased => darken(object.color, surface as f64 * INDEX_DARKEN),
        };
        out.push(Drawable {
            depth,
            primitive: Primitive::Face { color, points },
        });
        stats.faces += 1;
    }

    log::trace!(
        "object '{}': {} markers, {} lines ({} clipped), {} faces, {} dropped",
        object.name,
        stats.markers,
        stats.lines,
        stats.clipped_lines,
        stats.faces,
        stats.dropped
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn viewport() -> Viewport {
        Viewport::new(1280, 720)
    }

    fn on_screen_edge(point: Point2<f64>) -> bool {
        let eps = 1e-9;
        let on_vertical = (point.x.abs() < eps || (point.x - 1280.0).abs() < eps)
            && (-eps..=720.0 + eps).contains(&point.y);
        let on_horizontal = (point.y.abs() < eps || (point.y - 720.0).abs() < eps)
            && (-eps..=1280.0 + eps).contains(&point.x);
        on_vertical || on_horizontal
    }

    #[test]
    fn test_clip_reaches_screen_edge() {
        let front = Point2::new(640.0, 360.0);
        for behind in [
            Point2::new(900.0, 400.0),
            Point2::new(100.0, 350.0),
            Point2::new(650.0, 1000.0),
            Point2::new(600.0, -200.0),
            Point2::new(640.0, 0.0),
            Point2::new(-30_000.0, 360.0),
        ] {
            let clipped = clip_to_screen_edge(front, behind, viewport()).unwrap();
            assert!(on_screen_edge(clipped), "{behind:?} clipped to {clipped:?}");
        }
    }

    #[test]
    fn test_clip_extends_away_from_hidden_endpoint() {
        let clipped = clip_to_screen_edge(Point2::new(640.0, 360.0), Point2::new(740.0, 360.0), viewport()).unwrap();
        assert_relative_eq!(clipped, Point2::new(0.0, 360.0));
    }

    #[test]
    fn test_clip_takes_nearest_edge() {
        // Heading down-left from near the bottom edge hits y = 720 before x = 0.
        let clipped = clip_to_screen_edge(Point2::new(640.0, 700.0), Point2::new(650.0, 690.0), viewport()).unwrap();
        assert_relative_eq!(clipped, Point2::new(620.0, 720.0));
    }

    #[test]
    fn test_clip_degenerate() {
        let p = Point2::new(10.0, 10.0);
        assert!(clip_to_screen_edge(p, p, viewport()).is_none());
    }

    fn projected(x: f64, y: f64, behind: bool) -> ProjectedPoint {
        ProjectedPoint {
            screen: Point2::new(x, y),
            behind,
        }
    }

    fn triangle(draw_markers: bool) -> SceneObject {
        SceneObject::new(
            "triangle",
            vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
            ],
            vec![(0, 1), (1, 2), (2, 0)],
            vec![vec![0, 1, 2]],
            Color::rgb(200, 100, 50),
            draw_markers,
        )
        .unwrap()
    }

    #[test]
    fn test_all_visible() {
        let object = triangle(true);
        let points = [
            projected(100.0, 100.0, false),
            projected(200.0, 100.0, false),
            projected(150.0, 200.0, false),
        ];
        let mut out = Vec::new();
        let stats = assemble(&object, &points, &Point3::origin(), &AssemblyOptions::default(), &mut out);

        assert_eq!(stats.markers, 3);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.faces, 1);
        assert_eq!(stats.dropped, 0);
        assert_eq!(out.len(), 7);

        // first marker sits at distance 1 → darkened by 3%
        assert_eq!(
            out[0].primitive,
            Primitive::Marker {
                center: Point2::new(100.0, 100.0),
                radius: 4,
                color: Color::rgb(194, 97, 48),
            }
        );
        // line depth is the farther endpoint
        assert_relative_eq!(out[3].depth, 2.0);
        assert_relative_eq!(out[5].depth, 3.0);
        assert!(matches!(out[3].primitive, Primitive::Line { color, .. } if color == Color::rgb(100, 50, 25)));
        // face depth is the mean distance; first surface keeps the base color
        assert_relative_eq!(out[6].depth, 2.0);
        assert!(matches!(
            &out[6].primitive,
            Primitive::Face { color, points } if *color == object.color && points.len() == 3
        ));
    }

    #[test]
    fn test_behind_geometry_is_dropped_or_clipped() {
        let object = triangle(true);
        let points = [
            projected(640.0, 360.0, false),
            projected(900.0, 360.0, true),
            projected(100.0, 100.0, true),
        ];
        let mut out = Vec::new();
        let stats = assemble(&object, &points, &Point3::origin(), &AssemblyOptions::default(), &mut out);

        assert_eq!(stats.markers, 1);
        // (0,1) and (2,0) are clipped, (1,2) has both ends hidden
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.clipped_lines, 2);
        assert_eq!(stats.faces, 0);
        assert_eq!(stats.dropped, 2 + 1 + 1);

        let lines: Vec<_> = out
            .iter()
            .filter_map(|d| match d.primitive {
                Primitive::Line { from, to, .. } => Some((from, to)),
                _ => None,
            })
            .collect();
        assert_relative_eq!(lines[0].0, Point2::new(640.0, 360.0));
        assert_relative_eq!(lines[0].1, Point2::new(0.0, 360.0));
        assert_relative_eq!(lines[1].1, Point2::new(640.0, 360.0));
        assert!(on_screen_edge(lines[1].0));
    }

    #[test]
    fn test_markers_disabled() {
        let object = triangle(false);
        let points = [
            projected(1.0, 1.0, false),
            projected(2.0, 2.0, false),
            projected(3.0, 1.0, false),
        ];
        let mut out = Vec::new();
        let stats = assemble(&object, &points, &Point3::origin(), &AssemblyOptions::default(), &mut out);
        assert_eq!(stats.markers, 0);
        assert_eq!(stats.emitted(), 4);
    }

    #[test]
    fn test_unknown_indices_are_dropped() {
        // built without `SceneObject::new`, so nothing validated the indices
        let object = SceneObject {
            name: "broken".into(),
            points: vec![Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
            connections: vec![(0, 1), (0, 3)],
            surfaces: vec![vec![0, 1, 5], vec![0, 1]],
            color: Color::WHITE,
            draw_markers: false,
        };
        let points = [projected(1.0, 1.0, false), projected(2.0, 2.0, false)];
        let mut out = Vec::new();
        let stats = assemble(&object, &points, &Point3::origin(), &AssemblyOptions::default(), &mut out);

        assert_eq!(stats.lines, 1);
        assert_eq!(stats.faces, 0);
        assert_eq!(stats.dropped, 3);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_shading_strategies() {
        let mut object = triangle(false);
        object.connections.clear();
        object.surfaces.push(vec![2, 1, 0]);
        let points = [
            projected(1.0, 1.0, false),
            projected(2.0, 2.0, false),
            projected(3.0, 1.0, false),
        ];
        let face_colors = |shading| {
            let options = AssemblyOptions {
                shading,
                ..AssemblyOptions::default()
            };
            let mut out = Vec::new();
            assemble(&object, &points, &Point3::origin(), &options, &mut out);
            out.into_iter()
                .map(|d| match d.primitive {
                    Primitive::Face { color, .. } => color,
                    other => panic!("unexpected {other:?}"),
                })
                .collect::<Vec<_>>()
        };

        assert_eq!(face_colors(ShadingStrategy::None), vec![object.color, object.color]);
        assert_eq!(
            face_colors(ShadingStrategy::IndexBased),
            vec![object.color, darken(object.color, 5.0)]
        );
        assert_eq!(
            face_colors(ShadingStrategy::DistanceBased),
            vec![darken(object.color, 6.0), darken(object.color, 6.0)]
        );
    }
}
