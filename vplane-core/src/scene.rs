/// Scene objects, the demo scene and the scene text format
use nalgebra::Point3;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag},
    character::complete::{char, space1, u64 as parse_u64, u8 as parse_u8},
    combinator::{all_consuming, map, map_res, opt},
    multi::many1,
    number::complete::double,
    sequence::{delimited, preceded, tuple},
    IResult,
};
use std::fs;
use std::path::Path;

use crate::color::Color;
use crate::error::{Error, Result};

/// A wireframe/surface object in world space.
///
/// Points are addressed by index from `connections` and `surfaces`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub points: Vec<Point3<f64>>,
    pub connections: Vec<(usize, usize)>,
    pub surfaces: Vec<Vec<usize>>,
    pub color: Color,
    pub draw_markers: bool,
}

impl SceneObject {
    /// Build an object, checking that every index refers to an existing point
    /// and every surface has at least three vertices.
    pub fn new(
        name: impl Into<String>,
        points: Vec<Point3<f64>>,
        connections: Vec<(usize, usize)>,
        surfaces: Vec<Vec<usize>>,
        color: Color,
        draw_markers: bool,
    ) -> Result<Self> {
        let object = Self {
            name: name.into(),
            points,
            connections,
            surfaces,
            color,
            draw_markers,
        };
        object.validate()?;
        Ok(object)
    }

    fn validate(&self) -> Result<()> {
        let count = self.points.len();
        let out_of_range = |kind: &'static str, index: usize| Error::IndexOutOfRange {
            object: self.name.clone(),
            kind,
            index,
            count,
        };

        for &(a, b) in &self.connections {
            for index in [a, b] {
                if index >= count {
                    return Err(out_of_range("connection", index));
                }
            }
        }

        for (surface, indices) in self.surfaces.iter().enumerate() {
            if indices.len() < 3 {
                return Err(Error::SurfaceTooSmall {
                    object: self.name.clone(),
                    surface,
                    len: indices.len(),
                });
            }
            if let Some(&index) = indices.iter().find(|&&index| index >= count) {
                return Err(out_of_range("surface", index));
            }
        }
        Ok(())
    }
}

/// The static list of objects rendered every tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self { objects }
    }

    pub fn add(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn point_count(&self) -> usize {
        self.objects.iter().map(|object| object.points.len()).sum()
    }

    /// Load a scene from a text file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        parse_scene(&text)
    }

    /// A tetrahedron, a cube, a pyramid and a house on a ground grid
    pub fn demo() -> Self {
        let mut scene = Self::default();
        for object in demo_objects() {
            scene.add(object);
        }
        scene.add(ground_grid(50, 1.0));
        scene
    }
}

fn points(coords: &[(f64, f64, f64)]) -> Vec<Point3<f64>> {
    coords.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect()
}

fn demo_objects() -> Vec<SceneObject> {
    vec![
        SceneObject {
            name: "tetrahedron".into(),
            points: points(&[(5.0, 5.0, 0.0), (5.0, 6.0, 0.0), (6.0, 5.0, 0.0), (5.0, 5.0, 2.0)]),
            connections: vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)],
            surfaces: vec![vec![1, 2, 3]],
            color: Color::rgb(42, 157, 143),
            draw_markers: true,
        },
        SceneObject {
            name: "cube".into(),
            points: points(&[
                (4.0, 6.0, 0.0),
                (4.0, 5.0, 0.0),
                (3.0, 6.0, 0.0),
                (3.0, 5.0, 0.0),
                (4.0, 6.0, 0.75),
                (4.0, 5.0, 0.75),
                (3.0, 6.0, 0.75),
                (3.0, 5.0, 0.75),
            ]),
            connections: vec![
                (0, 1),
                (0, 2),
                (3, 1),
                (3, 2),
                (4, 5),
                (4, 6),
                (7, 5),
                (7, 6),
                (0, 4),
                (1, 5),
                (2, 6),
                (3, 7),
            ],
            surfaces: vec![vec![2, 3, 7, 6], vec![0, 1, 4], vec![0, 1, 3, 2]],
            color: Color::rgb(231, 111, 81),
            draw_markers: true,
        },
        SceneObject {
            name: "pyramid".into(),
            points: points(&[
                (2.0, 2.0, 0.0),
                (4.0, 2.0, 0.0),
                (4.0, 4.0, 0.0),
                (2.0, 4.0, 0.0),
                (3.0, 3.0, 2.0),
            ]),
            connections: vec![(0, 1), (1, 2), (2, 3), (3, 0), (0, 4), (1, 4), (2, 4), (3, 4)],
            surfaces: vec![vec![0, 1, 4], vec![1, 2, 4], vec![2, 3, 4], vec![3, 0, 4]],
            color: Color::rgb(255, 215, 0),
            draw_markers: true,
        },
        SceneObject {
            name: "house".into(),
            points: points(&[
                (1.0, 1.0, 0.0),
                (1.0, 3.0, 0.0),
                (0.0, 3.0, 0.0),
                (0.0, 1.0, 0.0),
                (1.0, 1.0, 2.0),
                (1.0, 3.0, 2.0),
                (0.0, 3.0, 2.0),
                (0.0, 1.0, 2.0),
                (0.5, 2.0, 3.0),
            ]),
            connections: vec![
                // floor
                (0, 1),
                (1, 2),
                (2, 3),
                (3, 0),
                // ceiling
                (4, 5),
                (5, 6),
                (6, 7),
                (7, 4),
                // walls
                (0, 4),
                (1, 5),
                (2, 6),
                (3, 7),
                // roof
                (4, 8),
                (5, 8),
                (6, 8),
                (7, 8),
            ],
            surfaces: vec![
                vec![0, 1, 5, 4],
                vec![1, 2, 6, 5],
                vec![2, 3, 7, 6],
                vec![3, 0, 4, 7],
                vec![4, 5, 8],
                vec![5, 6, 8],
                vec![6, 7, 8],
                vec![7, 4, 8],
            ],
            color: Color::rgb(124, 252, 0),
            draw_markers: true,
        },
    ]
}

/// A square grid of `lines` lines per axis on the z = 0 plane
pub fn ground_grid(lines: usize, spacing: f64) -> SceneObject {
    let extent = (lines / 2) as f64 * spacing;
    let mut points = Vec::with_capacity(lines * 4);
    let mut connections = Vec::with_capacity(lines * 2);

    for i in 0..lines / 2 {
        let offset = i as f64 * spacing;
        let segments = [
            ((extent, offset), (-extent, offset)),
            ((extent, -offset), (-extent, -offset)),
            ((offset, extent), (offset, -extent)),
            ((-offset, extent), (-offset, -extent)),
        ];
        for ((x1, y1), (x2, y2)) in segments {
            let start = points.len();
            points.push(Point3::new(x1, y1, 0.0));
            points.push(Point3::new(x2, y2, 0.0));
            connections.push((start, start + 1));
        }
    }

    SceneObject {
        name: "ground".into(),
        points,
        connections,
        surfaces: Vec::new(),
        color: Color::WHITE,
        draw_markers: false,
    }
}

/// One line of a scene file
#[derive(Debug, Clone, PartialEq)]
enum Directive {
    Object {
        name: String,
        color: Color,
        markers: bool,
    },
    Point(Point3<f64>),
    Edge(usize, usize),
    Face(Vec<usize>),
    End,
}

fn index(input: &str) -> IResult<&str, usize> {
    map_res(parse_u64, usize::try_from)(input)
}

fn object_header(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("object")(input)?;
    let (input, name) = preceded(space1, delimited(char('"'), is_not("\""), char('"')))(input)?;
    let (input, _) = preceded(space1, tag("color"))(input)?;
    let (input, (r, g, b)) = tuple((
        preceded(space1, parse_u8),
        preceded(space1, parse_u8),
        preceded(space1, parse_u8),
    ))(input)?;
    let (input, markers) = opt(preceded(space1, tag("markers")))(input)?;
    Ok((
        input,
        Directive::Object {
            name: name.to_string(),
            color: Color::rgb(r, g, b),
            markers: markers.is_some(),
        },
    ))
}

fn point(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("point")(input)?;
    let (input, (x, y, z)) = tuple((
        preceded(space1, double),
        preceded(space1, double),
        preceded(space1, double),
    ))(input)?;
    Ok((input, Directive::Point(Point3::new(x, y, z))))
}

fn edge(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("edge")(input)?;
    let (input, (a, b)) = tuple((preceded(space1, index), preceded(space1, index)))(input)?;
    Ok((input, Directive::Edge(a, b)))
}

fn face(input: &str) -> IResult<&str, Directive> {
    let (input, _) = tag("face")(input)?;
    let (input, indices) = many1(preceded(space1, index))(input)?;
    Ok((input, Directive::Face(indices)))
}

fn directive(input: &str) -> IResult<&str, Directive> {
    alt((object_header, point, edge, face, map(tag("end"), |_| Directive::End)))(input)
}

/// An object block that has been opened but not yet closed with `end`
struct ObjectBlock {
    name: String,
    color: Color,
    markers: bool,
    line: usize,
    points: Vec<Point3<f64>>,
    connections: Vec<(usize, usize)>,
    surfaces: Vec<Vec<usize>>,
}

impl ObjectBlock {
    fn finish(self) -> Result<SceneObject> {
        SceneObject::new(
            self.name,
            self.points,
            self.connections,
            self.surfaces,
            self.color,
            self.markers,
        )
    }
}

/// Parse the scene text format:
///
/// ```text
/// # comment
/// object "cube" color 231 111 81 markers
///   point 4 6 0
///   edge 0 1
///   face 2 3 7 6
/// end
/// ```
pub fn parse_scene(input: &str) -> Result<Scene> {
    let mut scene = Scene::default();
    let mut open: Option<ObjectBlock> = None;

    for (number, raw) in input.lines().enumerate() {
        let line = number + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let parse_error = |message: String| Error::SceneParse { line, message };
        let outside = || parse_error(format!("'{text}' outside of an object block"));

        let (_, parsed) = all_consuming(directive)(text)
            .map_err(|e| parse_error(format!("unrecognised directive '{text}' ({e})")))?;

        match parsed {
            Directive::Object { name, color, markers } => {
                if let Some(block) = &open {
                    return Err(parse_error(format!(
                        "object '{}' opened on line {} is missing 'end'",
                        block.name, block.line
                    )));
                }
                open = Some(ObjectBlock {
                    name,
                    color,
                    markers,
                    line,
                    points: Vec::new(),
                    connections: Vec::new(),
                    surfaces: Vec::new(),
                });
            }
            Directive::Point(p) => open.as_mut().ok_or_else(outside)?.points.push(p),
            Directive::Edge(a, b) => open.as_mut().ok_or_else(outside)?.connections.push((a, b)),
            Directive::Face(indices) => open.as_mut().ok_or_else(outside)?.surfaces.push(indices),
            Directive::End => {
                let block = open.take().ok_or_else(outside)?;
                scene.add(block.finish()?);
            }
        }
    }

    if let Some(block) = open {
        return Err(Error::SceneParse {
            line: block.line,
            message: format!("object '{}' is missing 'end'", block.name),
        });
    }

    log::debug!(
        "parsed scene with {} objects and {} points",
        scene.objects.len(),
        scene.point_count()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r#"
# a single marked triangle
object "triangle" color 255 0 0 markers
  point 0 0 0
  point 1 0 0
  point 0 1.5 -2
  edge 0 1
  edge 1 2
  face 0 1 2
end
"#;

    #[test]
    fn test_parse_scene() {
        let scene = parse_scene(TRIANGLE).unwrap();
        assert_eq!(scene.objects.len(), 1);
        let object = &scene.objects[0];
        assert_eq!(object.name, "triangle");
        assert_eq!(object.color, Color::rgb(255, 0, 0));
        assert!(object.draw_markers);
        assert_eq!(object.points[2], Point3::new(0.0, 1.5, -2.0));
        assert_eq!(object.connections, vec![(0, 1), (1, 2)]);
        assert_eq!(object.surfaces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_markers_default_off() {
        let scene = parse_scene("object \"line\" color 1 2 3\npoint 0 0 0\npoint 1 1 1\nedge 0 1\nend\n").unwrap();
        assert!(!scene.objects[0].draw_markers);
        assert!(scene.objects[0].surfaces.is_empty());
    }

    #[test]
    fn test_parse_reports_line() {
        let err = parse_scene("object \"x\" color 1 2 3\npoint 0 zero 0\nend\n").unwrap_err();
        assert!(matches!(err, Error::SceneParse { line: 2, .. }));
    }

    #[test]
    fn test_parse_missing_end() {
        let err = parse_scene("object \"x\" color 1 2 3\npoint 0 0 0\n").unwrap_err();
        assert!(matches!(err, Error::SceneParse { line: 1, .. }));
    }

    #[test]
    fn test_parse_directive_outside_object() {
        let err = parse_scene("point 0 0 0\n").unwrap_err();
        assert!(matches!(err, Error::SceneParse { line: 1, .. }));
    }

    #[test]
    fn test_edge_index_out_of_range() {
        let err = parse_scene("object \"x\" color 1 2 3\npoint 0 0 0\nedge 0 4\nend\n").unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 4, count: 1, .. }));
    }

    #[test]
    fn test_oversized_index_is_a_parse_error() {
        let text = "object \"x\" color 1 2 3\npoint 0 0 0\nedge 0 99999999999999999999\nend\n";
        let err = parse_scene(text).unwrap_err();
        assert!(matches!(err, Error::SceneParse { line: 3, .. }));
    }

    #[test]
    fn test_load_shipped_scene_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../scenes/tetrahedra.txt");
        let scene = Scene::from_file(path).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.point_count(), 8);
        assert_eq!(scene.objects[0].name, "teal");
        assert!(scene.objects[0].draw_markers);
        assert_eq!(scene.objects[1].surfaces, vec![vec![0, 1, 3]]);
    }

    #[test]
    fn test_missing_scene_file() {
        let err = Scene::from_file("no/such/scene.txt").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_surface_too_small() {
        let result = SceneObject::new(
            "flat",
            points(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0)]),
            vec![],
            vec![vec![0, 1]],
            Color::WHITE,
            false,
        );
        assert!(matches!(result, Err(Error::SurfaceTooSmall { surface: 0, len: 2, .. })));
    }

    #[test]
    fn test_demo_scene_is_valid() {
        let scene = Scene::demo();
        assert_eq!(scene.objects.len(), 5);
        for object in &scene.objects {
            assert!(object.validate().is_ok(), "{} is invalid", object.name);
        }
    }

    #[test]
    fn test_ground_grid() {
        let grid = ground_grid(50, 1.0);
        assert_eq!(grid.points.len(), 200);
        assert_eq!(grid.connections.len(), 100);
        assert!(!grid.draw_markers);
        assert!(grid.points.iter().all(|p| p.z == 0.0 && p.x.abs() <= 25.0 && p.y.abs() <= 25.0));
    }
}
