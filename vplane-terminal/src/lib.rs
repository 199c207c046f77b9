/// Terminal frontend: input, frame loop and character-cell rasterizer
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use std::collections::HashMap;
use std::io::{stdout, Write};
use std::time::{Duration, Instant};
use vplane_core::{render_frame, AssemblyStats, CameraState, Intent, IntentSet, RenderConfig, Scene};

pub mod renderer;

pub use renderer::CellCanvas;

/// Ticks a key stays held when the terminal does not report releases
const DEFAULT_HOLD_TICKS: u64 = 8;

/// Map a key to the camera intent it drives
pub fn intent_for(code: KeyCode) -> Option<Intent> {
    match code {
        KeyCode::Left => Some(Intent::RotateLeft),
        KeyCode::Right => Some(Intent::RotateRight),
        KeyCode::Up => Some(Intent::RotateUp),
        KeyCode::Down => Some(Intent::RotateDown),
        KeyCode::Char('w') | KeyCode::Char('W') => Some(Intent::MoveForward),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Intent::MoveBack),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Intent::MoveLeft),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(Intent::MoveRight),
        _ => None,
    }
}

/// Tracks which intents are held.
///
/// Most terminals only report presses (and auto-repeat), so without release
/// events a press keeps its intent active for `hold_ticks` ticks and each
/// repeat extends it.
#[derive(Debug, Clone)]
pub struct KeyLatch {
    hold_ticks: Option<u64>,
    expiry: HashMap<Intent, u64>,
}

impl KeyLatch {
    /// Intents stay active until released
    pub fn until_release() -> Self {
        Self {
            hold_ticks: None,
            expiry: HashMap::new(),
        }
    }

    /// Intents expire `hold_ticks` ticks after the last press
    pub fn with_hold(hold_ticks: u64) -> Self {
        Self {
            hold_ticks: Some(hold_ticks),
            expiry: HashMap::new(),
        }
    }

    pub fn press(&mut self, intent: Intent, tick: u64) {
        let until = match self.hold_ticks {
            Some(hold) => tick.saturating_add(hold),
            None => u64::MAX,
        };
        self.expiry.insert(intent, until);
    }

    pub fn release(&mut self, intent: Intent) {
        self.expiry.remove(&intent);
    }

    /// The intents active on `tick`, dropping any that have expired
    pub fn active(&mut self, tick: u64) -> IntentSet {
        self.expiry.retain(|_, until| *until >= tick);
        self.expiry.keys().copied().collect()
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: Scene,
    config: RenderConfig,
    camera: CameraState,
    latch: KeyLatch,
    canvas: CellCanvas,
    running: bool,
    tick: u64,
    stats: AssemblyStats,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(scene: Scene, config: RenderConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let camera = config.initial_camera()?;
        let (width, height) = terminal::size()?;

        Ok(Self {
            scene,
            camera,
            latch: KeyLatch::with_hold(DEFAULT_HOLD_TICKS),
            canvas: CellCanvas::new(width as usize, height as usize, config.viewport()),
            config,
            running: true,
            tick: 0,
            stats: AssemblyStats::default(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.latch = KeyLatch::until_release();
        }
        log::info!(
            "terminal renderer started ({} objects, key release events: {enhanced})",
            self.scene.objects.len()
        );

        let result = self.main_loop();

        // Cleanup
        if enhanced {
            execute!(stdout(), PopKeyboardEnhancementFlags)?;
        }
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> anyhow::Result<()> {
        let target_frame_time = Duration::from_secs(1) / self.config.tick_rate;

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) => match code {
                KeyCode::Char('q') | KeyCode::Esc if kind != KeyEventKind::Release => {
                    self.running = false;
                }
                _ => {
                    if let Some(intent) = intent_for(code) {
                        match kind {
                            KeyEventKind::Release => self.latch.release(intent),
                            KeyEventKind::Press | KeyEventKind::Repeat => self.latch.press(intent, self.tick),
                        }
                    }
                }
            },
            Event::Resize(width, height) => {
                log::debug!("terminal resized to {width}x{height}");
                self.canvas.resize(width as usize, height as usize);
            }
            _ => {}
        }
    }

    fn update(&mut self) {
        let intents = self.latch.active(self.tick);
        self.camera = self.camera.advance(&intents, &self.config.tuning());
        self.tick += 1;
    }

    fn render(&mut self) -> anyhow::Result<()> {
        let (mut frame, stats) = render_frame(&self.camera, &self.scene, &self.config);
        self.stats = stats;

        // Clear canvas
        self.canvas.clear();

        // Painter's algorithm: farthest first
        match frame.present(&mut self.canvas) {
            Ok(()) => {}
            Err(never) => match never {},
        }

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.canvas.draw(&mut stdout)?;

        // Draw UI overlay
        let position = self.camera.position;
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "VPlane | FPS: {:.1} | pos ({:.1}, {:.1}, {:.1}) | {} drawn, {} culled | Arrows=Look WASD=Move Q=Quit",
                self.fps,
                position.x,
                position.y,
                position.z,
                self.stats.emitted(),
                self.stats.dropped
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
