//! Hello-triangle demo application
//!
//! Initializes the renderer against a fixed-size window and draws a single
//! shader-generated triangle until the window closes (or Escape is pressed).

use tri_engine::core::config::AppConfig;
use tri_engine::render::{Renderer, Window};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_or_default("triangle.toml")?;

    log::info!("Creating window...");
    let mut window = Window::new(
        &config.window.title,
        config.window.width,
        config.window.height,
    )?;

    log::info!("Creating Vulkan renderer...");
    let mut renderer = Renderer::new(&mut window, &config)?;
    log::info!("Renderer initialized, entering main loop");

    while !window.should_close() {
        window.poll_events();
        window.process_events();
        renderer.draw_frame()?;
    }

    log::info!("Window closed, shutting down");
    Ok(())
}
