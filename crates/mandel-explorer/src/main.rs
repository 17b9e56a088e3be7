use anyhow::{Context, Result};
use winit::dpi::LogicalSize;

use mandel_engine::device::GpuInit;
use mandel_engine::logging::{LoggingConfig, init_logging};
use mandel_engine::window::{Runtime, RuntimeConfig};
use mandel_explorer::ExplorerApp;

const TITLE: &str = "Mandelbrot Set";

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = RuntimeConfig {
        title: TITLE.to_string(),
        initial_size: LogicalSize::new(800.0, 600.0),
    };

    Runtime::run(config, GpuInit::default(), ExplorerApp::new(TITLE))
        .context("mandelbrot explorer stopped")
}
