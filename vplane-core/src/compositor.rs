/// Depth sorting and dispatch to a rasterizer (painter's algorithm)
use nalgebra::Point2;

use crate::assembler::{assemble, AssemblyStats, Drawable, Primitive};
use crate::camera::CameraState;
use crate::color::Color;
use crate::config::RenderConfig;
use crate::projection::Projector;
use crate::scene::Scene;

/// Pixel-level drawing backend.
///
/// Implementors know nothing about 3D; they receive primitives farthest
/// first and each draw simply covers what was drawn before it.
pub trait Rasterizer {
    type Error;

    fn fill_circle(&mut self, center: Point2<f64>, radius: u32, color: Color) -> Result<(), Self::Error>;

    fn line(&mut self, from: Point2<f64>, to: Point2<f64>, color: Color) -> Result<(), Self::Error>;

    fn fill_polygon(&mut self, points: &[Point2<f64>], color: Color) -> Result<(), Self::Error>;
}

/// All primitives of one frame
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    drawables: Vec<Drawable>,
    sorted: bool,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, drawable: Drawable) {
        self.drawables.push(drawable);
        self.sorted = false;
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// Order by depth, farthest first. Equal depths keep insertion order.
    pub fn sort(&mut self) {
        if !self.sorted {
            self.drawables.sort_by(|a, b| b.depth.total_cmp(&a.depth));
            self.sorted = true;
        }
    }

    /// Sort, then hand every primitive to the rasterizer in draw order
    pub fn present<R: Rasterizer>(&mut self, rasterizer: &mut R) -> Result<(), R::Error> {
        self.sort();
        for drawable in &self.drawables {
            match &drawable.primitive {
                Primitive::Marker { center, radius, color } => rasterizer.fill_circle(*center, *radius, *color)?,
                Primitive::Line { color, from, to } => rasterizer.line(*from, *to, *color)?,
                Primitive::Face { color, points } => rasterizer.fill_polygon(points, *color)?,
            }
        }
        Ok(())
    }
}

impl Extend<Drawable> for RenderQueue {
    fn extend<I: IntoIterator<Item = Drawable>>(&mut self, iter: I) {
        self.drawables.extend(iter);
        self.sorted = false;
    }
}

/// Project, assemble and depth-sort every object of the scene for one tick
pub fn render_frame(camera: &CameraState, scene: &Scene, config: &RenderConfig) -> (RenderQueue, AssemblyStats) {
    let options = config.assembly_options();
    let projector = Projector::new(camera, options.viewport);
    let mut drawables = Vec::with_capacity(scene.point_count() * 2);
    let mut stats = AssemblyStats::default();

    for object in &scene.objects {
        let projected = projector.project_all(&object.points);
        let object_stats = assemble(object, &projected, &camera.position, &options, &mut drawables);
        stats.merge(&object_stats);
    }

    let mut queue = RenderQueue {
        drawables,
        sorted: false,
    };
    queue.sort();
    log::trace!(
        "frame: {} primitives ({} markers, {} lines, {} faces), {} dropped",
        queue.len(),
        stats.markers,
        stats.lines,
        stats.faces,
        stats.dropped
    );
    (queue, stats)
}
