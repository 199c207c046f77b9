/// VPlane Terminal Demo - walk through the demo scene
///
/// Usage: vplane-terminal [config.toml] [scene.txt]
///
/// Controls:
///   - Arrow Keys: Look around
///   - WASD: Move
///   - Q/ESC: Quit

use anyhow::Context;
use std::env;
use vplane_core::{RenderConfig, Scene};
use vplane_terminal::TerminalApp;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut config = RenderConfig::default();
    let mut scene = None;
    for arg in env::args().skip(1) {
        if arg.ends_with(".toml") {
            config = RenderConfig::load(&arg).with_context(|| format!("failed to load config {arg}"))?;
        } else {
            scene = Some(Scene::from_file(&arg).with_context(|| format!("failed to load scene {arg}"))?);
        }
    }
    let scene = scene.unwrap_or_else(Scene::demo);

    println!("VPlane Terminal Renderer - {} objects loaded", scene.objects.len());
    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    // Run the terminal app
    let mut app = TerminalApp::new(scene, config)?;
    app.run()?;

    println!("Thank you for using VPlane!");
    Ok(())
}
