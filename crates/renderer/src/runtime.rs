use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use session::{
    BackendInitFailed, RenderLoop, RenderLoopOptions, RenderStats, SessionState, SystemTimeSource,
};

use crate::backend::WindowBackend;
use crate::types::RendererConfig;

/// Handle to the dedicated render thread.
///
/// The thread creates its own window and GPU context; [`RenderRuntime::spawn`]
/// only returns once that has succeeded or failed.
pub struct RenderRuntime {
    session: Arc<SessionState>,
    join_handle: Option<JoinHandle<RenderStats>>,
}

impl RenderRuntime {
    pub fn spawn(
        config: RendererConfig,
        session: Arc<SessionState>,
    ) -> Result<Self, BackendInitFailed> {
        let (ready_tx, ready_rx) = bounded(1);
        let thread_session = Arc::clone(&session);
        let handle = thread::Builder::new()
            .name("shadart-render".into())
            .spawn(move || run_render_thread(config, thread_session, ready_tx))
            .map_err(|err| BackendInitFailed(format!("failed to spawn render thread: {err}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                session,
                join_handle: Some(handle),
            }),
            Ok(Err(err)) => {
                let _ = handle.join();
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(BackendInitFailed(
                    "render thread exited before initialising".to_string(),
                ))
            }
        }
    }

    /// Waits for the render loop to observe quit and release its resources.
    pub fn join(mut self) -> Result<RenderStats> {
        match self.join_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|err| anyhow!("render thread panicked: {err:?}")),
            None => Ok(RenderStats::default()),
        }
    }
}

impl Drop for RenderRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            self.session.request_quit();
            let _ = handle.join();
        }
    }
}

fn run_render_thread(
    config: RendererConfig,
    session: Arc<SessionState>,
    ready_tx: Sender<Result<(), BackendInitFailed>>,
) -> RenderStats {
    let backend = match WindowBackend::new(&config) {
        Ok(backend) => backend,
        Err(err) => {
            tracing::error!("failed to initialise renderer: {err:#}");
            session.mark_render_finished();
            let _ = ready_tx.send(Err(BackendInitFailed(format!("{err:#}"))));
            return RenderStats::default();
        }
    };
    let _ = ready_tx.send(Ok(()));

    let render_loop = RenderLoop::new(
        backend,
        config.vertex_path,
        session,
        Box::new(SystemTimeSource::new()),
        RenderLoopOptions {
            paused_poll_interval: config.paused_poll_interval,
        },
    );
    let stats = render_loop.run();
    tracing::info!(
        frames = stats.frames_presented,
        loads = stats.loads_applied,
        failures = stats.loads_failed,
        "render thread finished"
    );
    stats
}
