use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::paths::ENV_CONFIG;

#[derive(Parser, Debug)]
#[command(
    name = "shadart",
    author,
    version,
    about = "Live-reloading fragment shader viewer",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,
    #[command(flatten)]
    pub run: RunArgs,
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Overrides layered on top of the configuration file.
#[derive(Parser, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Configuration file (TOML). Defaults to the platform config directory.
    #[arg(long, env = ENV_CONFIG, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Directory containing fragment shaders and the vertex shader.
    #[arg(long, value_name = "DIR", global = true)]
    pub shader_dir: Option<PathBuf>,

    /// File name of the vertex shader inside the shader directory.
    #[arg(long = "vertex", value_name = "FILE", global = true)]
    pub vertex_shader: Option<String>,

    /// Window size in pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size, global = true)]
    pub size: Option<SurfaceSize>,

    /// Window title.
    #[arg(long, value_name = "TITLE", global = true)]
    pub title: Option<String>,

    /// Present without waiting for vertical blank.
    #[arg(long, global = true)]
    pub no_vsync: bool,
}

#[derive(Parser, Debug, Default, Clone)]
pub struct RunArgs {
    /// Skip the startup menu and open this fragment shader.
    #[arg(long, value_name = "FILE")]
    pub shader: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the shader catalog and exit.
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(spec: &str) -> Result<SurfaceSize, String> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x720".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;

    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }

    Ok(SurfaceSize { width, height })
}
