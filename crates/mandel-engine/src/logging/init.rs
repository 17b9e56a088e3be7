use std::sync::Once;

/// Logger settings.
///
/// `env_filter` uses `env_logger` directive syntax, e.g.
/// `"mandel_engine=debug,mandel_explorer=trace"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    /// ANSI coloring.
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Crates whose info output drowns the render loop's own messages.
const NOISY_GPU_CRATES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

static INIT: Once = Once::new();

/// Installs the global logger. Later calls do nothing.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then `info` with
/// the GPU backend crates lowered to `warn`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.env_filter.or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => {
                builder.filter_level(log::LevelFilter::Info);
                for name in NOISY_GPU_CRATES {
                    builder.filter_module(name, log::LevelFilter::Warn);
                }
            }
        }

        builder.write_style(config.write_style).init();

        log::debug!("logging initialized");
    });
}
