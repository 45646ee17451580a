use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;
use tracing::debug;
use viewerconfig::ViewerConfig;

use crate::cli::ConfigArgs;

pub const ENV_CONFIG: &str = "SHADART_CONFIG";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "Shadart";
const APPLICATION: &str = "shadart";
const CONFIG_FILE: &str = "config.toml";

/// Platform configuration file, e.g. `~/.config/shadart/config.toml`.
pub fn default_config_file() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(project_dirs.config_dir().join(CONFIG_FILE))
}

/// Loads the configuration and applies command-line overrides.
///
/// An explicitly named file must exist; the platform default may be absent.
pub fn resolve_config(args: &ConfigArgs) -> Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => load_explicit(path)?,
        None => {
            let path = default_config_file()?;
            debug!(path = %path.display(), "loading configuration");
            ViewerConfig::load(&path)
                .with_context(|| format!("failed to load {}", path.display()))?
        }
    };

    if let Some(dir) = &args.shader_dir {
        config.shader_dir = dir.clone();
    }
    if let Some(vertex) = &args.vertex_shader {
        config.vertex_shader = vertex.clone();
    }
    if let Some(size) = args.size {
        config.window.width = size.width;
        config.window.height = size.height;
    }
    if let Some(title) = &args.title {
        config.window.title = title.clone();
    }
    if args.no_vsync {
        config.window.vsync = false;
    }

    config.validate().context("invalid command-line override")?;
    Ok(config)
}

fn load_explicit(path: &Path) -> Result<ViewerConfig> {
    debug!(path = %path.display(), "loading configuration");
    if !path.is_file() {
        anyhow::bail!("configuration file {} does not exist", path.display());
    }
    ViewerConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Resolves `--shader FILE`: as given if it exists, otherwise inside `shader_dir`.
pub fn resolve_shader_path(config: &ViewerConfig, requested: &Path) -> PathBuf {
    if requested.is_absolute() || requested.exists() {
        return requested.to_path_buf();
    }
    config.shader_dir.join(requested)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::cli::SurfaceSize;

    #[test]
    fn overrides_apply_on_top_of_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "shader_dir = \"/srv/shaders\"\n[window]\ntitle = \"file\"\n").unwrap();

        let args = ConfigArgs {
            config: Some(path),
            title: Some("cli".into()),
            size: Some(SurfaceSize {
                width: 300,
                height: 200,
            }),
            no_vsync: true,
            ..ConfigArgs::default()
        };
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.shader_dir, PathBuf::from("/srv/shaders"));
        assert_eq!(config.window.title, "cli");
        assert_eq!((config.window.width, config.window.height), (300, 200));
        assert!(!config.window.vsync);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let args = ConfigArgs {
            config: Some(dir.path().join("absent.toml")),
            ..ConfigArgs::default()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn invalid_vertex_override_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();
        let args = ConfigArgs {
            config: Some(path),
            vertex_shader: Some("nested/vertex.vs".into()),
            ..ConfigArgs::default()
        };
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn shader_path_falls_back_to_shader_dir() {
        let dir = TempDir::new().unwrap();
        let config = ViewerConfig {
            shader_dir: dir.path().to_path_buf(),
            ..ViewerConfig::default()
        };
        assert_eq!(
            resolve_shader_path(&config, Path::new("not-here.frag")),
            dir.path().join("not-here.frag")
        );
        let absolute = dir.path().join("x.frag");
        assert_eq!(resolve_shader_path(&config, &absolute), absolute);
    }
}
