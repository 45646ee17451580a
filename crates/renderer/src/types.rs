use std::path::PathBuf;
use std::time::Duration;

/// Everything the render thread needs to open its window and drive frames.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Window title.
    pub title: String,
    /// Wait for vertical blank when presenting.
    pub vsync: bool,
    /// Fixed vertex-stage source paired with every fragment program.
    pub vertex_path: PathBuf,
    /// Sleep between event polls while rendering is paused.
    pub paused_poll_interval: Duration,
}

impl Default for RendererConfig {
    /// Provides an 800x800 window with vsync and no vertex source selected.
    fn default() -> Self {
        Self {
            surface_size: (800, 800),
            title: "shadart".to_string(),
            vsync: true,
            vertex_path: PathBuf::new(),
            paused_poll_interval: Duration::from_millis(16),
        }
    }
}
