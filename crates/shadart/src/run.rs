use std::io::{self, BufReader};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::bounded;
use renderer::{RenderRuntime, RendererConfig};
use session::{
    CatalogOrder, CommandLoop, Console, Menu, MenuChoice, SessionState, ShaderCatalog,
};
use tracing_subscriber::EnvFilter;
use viewerconfig::{CatalogOrderSetting, ViewerConfig};

use crate::cli::{ConfigArgs, RunArgs};
use crate::paths::{resolve_config, resolve_shader_path};

/// How long to wait for the console thread before telling the operator it is
/// still blocked on input.
const CONSOLE_GRACE: Duration = Duration::from_millis(200);

pub fn initialise_tracing(verbose: bool) {
    let default_filter = if verbose {
        "debug,naga=warn,wgpu_core=warn,wgpu_hal=warn,winit=warn"
    } else {
        "info,naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn catalog_for(config: &ViewerConfig) -> ShaderCatalog {
    let order = match config.catalog.order {
        CatalogOrderSetting::Sorted => CatalogOrder::Sorted,
        CatalogOrderSetting::Filesystem => CatalogOrder::Filesystem,
    };
    ShaderCatalog::new(&config.shader_dir, config.vertex_shader.clone()).with_order(order)
}

fn renderer_config(config: &ViewerConfig) -> RendererConfig {
    RendererConfig {
        surface_size: (config.window.width, config.window.height),
        title: config.window.title.clone(),
        vsync: config.window.vsync,
        vertex_path: config.vertex_path(),
        paused_poll_interval: config.render.paused_poll_interval,
    }
}

/// Prints the catalog the startup menu would offer.
pub fn list(args: &ConfigArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let catalog = catalog_for(&config);
    let entries = catalog.list().context("failed to list shaders")?;
    if entries.is_empty() {
        println!("No shaders found in {}", catalog.directory().display());
        return Ok(());
    }
    for entry in entries {
        println!("{}. {}", entry.index, entry.display_name());
    }
    Ok(())
}

pub fn run(config_args: ConfigArgs, args: RunArgs) -> Result<()> {
    let config = resolve_config(&config_args)?;
    tracing::debug!(
        shader_dir = %config.shader_dir.display(),
        vertex = %config.vertex_path().display(),
        width = config.window.width,
        height = config.window.height,
        "resolved configuration"
    );

    let session = Arc::new(SessionState::new());
    let menu = Menu::new(catalog_for(&config), config.new_shader_name.clone());
    let mut console = Console::new(BufReader::new(io::stdin()), io::stdout());

    let initial = match &args.shader {
        Some(requested) => resolve_shader_path(&config, requested),
        None => match menu
            .run(&mut console, &session)
            .context("console input failed")?
        {
            MenuChoice::Open(path) => path,
            MenuChoice::Quit => return Ok(()),
        },
    };

    session.request_load(&initial);
    tracing::info!(shader = %initial.display(), "starting session");

    let runtime = RenderRuntime::spawn(renderer_config(&config), Arc::clone(&session))
        .map_err(|err| anyhow!(err))
        .context("failed to start renderer")?;

    let (done_tx, done_rx) = bounded(1);
    let console_session = Arc::clone(&session);
    let commands = thread::Builder::new()
        .name("shadart-console".into())
        .spawn(move || {
            let result = CommandLoop::new(console, console_session, menu).run();
            let _ = done_tx.send(());
            result
        })
        .map_err(|err| anyhow!("failed to spawn console thread: {err}"))?;

    let stats = runtime.join()?;
    tracing::debug!(frames = stats.frames_presented, "renderer stopped");

    if done_rx.recv_timeout(CONSOLE_GRACE).is_err() {
        println!("Render window closed; press Enter to exit.");
    }
    commands
        .join()
        .map_err(|err| anyhow!("console thread panicked: {err:?}"))?
        .context("console input failed")?;

    Ok(())
}
