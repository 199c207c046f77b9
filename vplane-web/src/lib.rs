/// VPlane Web - canvas 2D renderer for browsers
///
/// The JS side forwards `KeyboardEvent.code` values to `key_down`/`key_up`
/// and calls `tick()` once per animation frame.

use nalgebra::Point2;
use std::f64::consts::TAU;
use vplane_core::{render_frame, CameraState, Color, Intent, IntentSet, Rasterizer, RenderConfig, Scene};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Map a `KeyboardEvent.code` to the camera intent it drives
pub fn intent_for_code(code: &str) -> Option<Intent> {
    match code {
        "ArrowLeft" => Some(Intent::RotateLeft),
        "ArrowRight" => Some(Intent::RotateRight),
        "ArrowUp" => Some(Intent::RotateUp),
        "ArrowDown" => Some(Intent::RotateDown),
        "KeyW" => Some(Intent::MoveForward),
        "KeyS" => Some(Intent::MoveBack),
        "KeyA" => Some(Intent::MoveLeft),
        "KeyD" => Some(Intent::MoveRight),
        _ => None,
    }
}

/// Rasterizer drawing onto an HTML canvas
pub struct CanvasRasterizer<'a> {
    context: &'a CanvasRenderingContext2d,
}

impl<'a> CanvasRasterizer<'a> {
    pub fn new(context: &'a CanvasRenderingContext2d) -> Self {
        Self { context }
    }

    #[allow(deprecated)]
    fn set_color(&self, color: Color) {
        let css = JsValue::from_str(&color.to_string());
        self.context.set_fill_style(&css);
        self.context.set_stroke_style(&css);
    }
}

impl Rasterizer for CanvasRasterizer<'_> {
    type Error = JsValue;

    fn fill_circle(&mut self, center: Point2<f64>, radius: u32, color: Color) -> Result<(), JsValue> {
        self.set_color(color);
        self.context.begin_path();
        self.context.arc(center.x, center.y, radius as f64, 0.0, TAU)?;
        self.context.fill();
        Ok(())
    }

    fn line(&mut self, from: Point2<f64>, to: Point2<f64>, color: Color) -> Result<(), JsValue> {
        self.set_color(color);
        self.context.begin_path();
        self.context.move_to(from.x, from.y);
        self.context.line_to(to.x, to.y);
        self.context.stroke();
        Ok(())
    }

    fn fill_polygon(&mut self, points: &[Point2<f64>], color: Color) -> Result<(), JsValue> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        self.set_color(color);
        self.context.begin_path();
        self.context.move_to(first.x, first.y);
        for point in rest {
            self.context.line_to(point.x, point.y);
        }
        self.context.close_path();
        self.context.fill();
        Ok(())
    }
}

#[wasm_bindgen]
pub struct WebRenderer {
    context: CanvasRenderingContext2d,
    scene: Scene,
    config: RenderConfig,
    camera: CameraState,
    intents: IntentSet,
}

#[wasm_bindgen]
impl WebRenderer {
    /// Attach to the canvas with the given element id and load the demo scene
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebRenderer, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("no document available"))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id '{canvas_id}'")))?
            .dyn_into()?;
        let context: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into()?;

        let config = RenderConfig {
            width: canvas.width(),
            height: canvas.height(),
            ..RenderConfig::default()
        };
        let camera = config.initial_camera().map_err(to_js)?;
        log::debug!("web renderer attached to '{canvas_id}' ({}x{})", config.width, config.height);

        Ok(WebRenderer {
            context,
            scene: Scene::demo(),
            config,
            camera,
            intents: IntentSet::new(),
        })
    }

    /// Replace the scene with one in the scene text format
    pub fn load_scene(&mut self, text: &str) -> Result<(), JsValue> {
        self.scene = vplane_core::parse_scene(text).map_err(to_js)?;
        Ok(())
    }

    /// Apply renderer settings from a TOML document, keeping the canvas size
    pub fn configure(&mut self, toml: &str) -> Result<(), JsValue> {
        let config = RenderConfig {
            width: self.config.width,
            height: self.config.height,
            ..RenderConfig::from_toml(toml).map_err(to_js)?
        };
        config.validate().map_err(to_js)?;
        self.camera = config.initial_camera().map_err(to_js)?;
        self.config = config;
        Ok(())
    }

    pub fn key_down(&mut self, code: &str) {
        if let Some(intent) = intent_for_code(code) {
            self.intents.press(intent);
        }
    }

    pub fn key_up(&mut self, code: &str) {
        if let Some(intent) = intent_for_code(code) {
            self.intents.release(intent);
        }
    }

    /// Advance the camera one tick and redraw the frame
    pub fn tick(&mut self) -> Result<(), JsValue> {
        self.camera = self.camera.advance(&self.intents, &self.config.tuning());
        let (mut frame, _) = render_frame(&self.camera, &self.scene, &self.config);

        #[allow(deprecated)]
        self.context.set_fill_style(&JsValue::from_str(&Color::BLACK.to_string()));
        self.context
            .fill_rect(0.0, 0.0, self.config.width as f64, self.config.height as f64);

        frame.present(&mut CanvasRasterizer::new(&self.context))
    }
}

fn to_js(error: vplane_core::Error) -> JsValue {
    JsValue::from_str(&error.to_string())
}
