/// VPlane Core Library - view-plane projection and painter's-algorithm compositing
///
/// Each tick the camera is advanced from the held intents, every scene point
/// is projected onto the view plane one unit ahead of the camera, objects are
/// assembled into markers, lines and faces, and the whole frame is sorted
/// farthest first for a rasterizer to draw.

pub mod assembler;
pub mod camera;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod geometry;
pub mod projection;
pub mod scene;

// Re-export commonly used types
pub use assembler::{
    assemble, clip_to_screen_edge, AssemblyOptions, AssemblyStats, Drawable, Primitive, ShadingStrategy,
};
pub use camera::{CameraState, CameraTuning, Intent, IntentSet, ViewPlane};
pub use color::{darken, Color};
pub use compositor::{render_frame, Rasterizer, RenderQueue};
pub use config::RenderConfig;
pub use error::{Error, Result};
pub use projection::{ProjectedPoint, Projector, Viewport, PIXEL_CLAMP};
pub use scene::{parse_scene, Scene, SceneObject};
