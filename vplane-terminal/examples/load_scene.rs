/// Example: Load and render a scene file in the terminal
///
/// Usage: cargo run --example load_scene -- path/to/scene.txt

use anyhow::Context;
use std::env;
use vplane_core::{RenderConfig, Scene};
use vplane_terminal::TerminalApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scene-file>", args[0]);
        eprintln!("\nNo scene file provided, using demo scene...");
        let mut app = TerminalApp::new(Scene::demo(), RenderConfig::default())?;
        return app.run();
    }

    let scene_path = &args[1];

    println!("Loading scene file: {}", scene_path);

    let scene = Scene::from_file(scene_path).with_context(|| format!("failed to load scene {scene_path}"))?;

    println!("Loaded {} objects, {} points", scene.objects.len(), scene.point_count());
    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(scene, RenderConfig::default())?;
    app.run()?;

    println!("Thank you for using VPlane!");
    Ok(())
}
