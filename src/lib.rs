//! Instanced renderer for hierarchical brick-model documents.

pub mod asset;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod settings;

pub use renderer::{DrawMode, FrameStats, RenderBackend, RenderError, Renderer, SharedRenderer};
pub use settings::RenderSettings;

/// Installs `env_logger` at `Info`, honouring `RUST_LOG`. Safe to call more
/// than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
