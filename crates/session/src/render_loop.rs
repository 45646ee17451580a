//! Frame driver for the dedicated render thread.
//!
//! Each iteration of [`RenderLoop::step`]:
//!
//! ```text
//!   poll_events ──▶ frame_directive (one lock) ──▶ quit? ──▶ exit
//!                                                 paused? ─▶ idle, no swap, no draw
//!                                                 pending? ─▶ ShaderSlot::load ─▶ ack_load
//!                                                 present(active or clear-only)
//! ```
//!
//! Compiling and presenting happen with no lock held; the loop only touches
//! [`SessionState`] through copy-out reads and the acknowledgement write.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::clock::BoxedTimeSource;
use crate::error::FrameError;
use crate::program::{CompiledProgram, ProgramCompiler};
use crate::slot::ShaderSlot;
use crate::state::{LoadOutcome, PendingLoad, SessionState};

/// Uniform carrying seconds since rendering started.
pub const TIME_UNIFORM: &str = "uTime";
/// Uniform carrying the viewport size in pixels.
pub const RESOLUTION_UNIFORM: &str = "uResolution";

/// What the windowing side reported while pumping events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendSignal {
    /// Window close button, Escape, or the platform asked us to stop.
    pub close_requested: bool,
}

/// Window, surface and draw submission as seen by the render loop.
///
/// Everything behind this trait is bound to the render thread.
pub trait FrameBackend: ProgramCompiler {
    /// Processes pending window/input events, including resizes.
    fn poll_events(&mut self) -> BackendSignal;

    /// Current drawable size in pixels.
    fn viewport(&self) -> (u32, u32);

    /// Draws one frame with `program`, or clears when there is none, then presents.
    fn present(
        &mut self,
        program: Option<&CompiledProgram<Self::Handle>>,
    ) -> Result<(), FrameError>;

    /// Frees loop-owned GPU resources such as the quad buffers.
    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLoopOptions {
    /// Sleep between event polls while paused.
    pub paused_poll_interval: Duration,
}

impl Default for RenderLoopOptions {
    fn default() -> Self {
        Self {
            paused_poll_interval: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Exit,
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_presented: u64,
    pub loads_applied: u64,
    pub loads_failed: u64,
}

pub struct RenderLoop<B: FrameBackend> {
    backend: B,
    slot: ShaderSlot<B::Handle>,
    session: Arc<SessionState>,
    clock: BoxedTimeSource,
    options: RenderLoopOptions,
    stats: RenderStats,
    released: bool,
}

impl<B: FrameBackend> RenderLoop<B> {
    pub fn new(
        backend: B,
        vertex_path: impl Into<PathBuf>,
        session: Arc<SessionState>,
        clock: BoxedTimeSource,
        options: RenderLoopOptions,
    ) -> Self {
        Self {
            backend,
            slot: ShaderSlot::new(vertex_path),
            session,
            clock,
            options,
            stats: RenderStats::default(),
            released: false,
        }
    }

    pub fn slot(&self) -> &ShaderSlot<B::Handle> {
        &self.slot
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Runs frames until quit is observed, then releases every GPU resource.
    pub fn run(mut self) -> RenderStats {
        self.clock.reset();
        while self.step() == Step::Continue {}
        self.shutdown();
        self.stats
    }

    /// Executes one iteration of the frame sequence.
    pub fn step(&mut self) -> Step {
        let signal = self.backend.poll_events();
        if signal.close_requested {
            info!("window close requested");
            self.session.request_quit();
        }

        let directive = self.session.frame_directive();
        if directive.quit {
            return Step::Exit;
        }

        if !directive.running {
            thread::sleep(self.options.paused_poll_interval);
            return Step::Continue;
        }

        if let Some(pending) = directive.pending {
            self.apply(pending);
        }

        self.draw()
    }

    fn apply(&mut self, pending: PendingLoad) {
        let PendingLoad { path, generation } = pending;
        debug!(path = %path.display(), generation, "applying load request");

        let outcome = match self.slot.load(&mut self.backend, &path) {
            Ok(()) => {
                self.stats.loads_applied += 1;
                info!(path = %path.display(), generation, "shader program loaded");
                LoadOutcome::succeeded(&path, generation)
            }
            Err(err) => {
                self.stats.loads_failed += 1;
                let kept = self
                    .slot
                    .active_source_path()
                    .map(|active| active.display().to_string());
                error!(
                    path = %path.display(),
                    generation,
                    stage = %err.stage(),
                    kept = ?kept,
                    "shader program failed to compile:\n{}",
                    err.diagnostic()
                );
                LoadOutcome::failed(&path, generation, err)
            }
        };
        self.session.ack_load(generation, outcome);
    }

    fn draw(&mut self) -> Step {
        let (width, height) = self.backend.viewport();
        let sample = self.clock.sample();
        if let Some(program) = self.slot.active_mut() {
            let uniforms = program.uniforms_mut();
            uniforms.set_f32(TIME_UNIFORM, sample.seconds);
            uniforms.set_vec2(RESOLUTION_UNIFORM, [width as f32, height as f32]);
        }

        match self.backend.present(self.slot.active()) {
            Ok(()) => {
                self.stats.frames_presented += 1;
                Step::Continue
            }
            Err(FrameError::Recoverable(reason)) => {
                warn!(%reason, "frame dropped; retrying next frame");
                Step::Continue
            }
            Err(FrameError::Fatal(reason)) => {
                error!(%reason, "rendering stopped");
                self.session.request_quit();
                Step::Exit
            }
        }
    }

    /// Releases the active program and loop-owned resources exactly once.
    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.slot.release(&mut self.backend);
        self.backend.release();
        self.session.mark_render_finished();
        debug!(
            frames = self.stats.frames_presented,
            loads = self.stats.loads_applied,
            failures = self.stats.loads_failed,
            "render loop finished"
        );
    }
}
