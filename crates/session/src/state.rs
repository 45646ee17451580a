//! Shared control block between the render thread and the command thread.
//!
//! Every field lives behind one mutex. Callers never hold the lock across I/O:
//! the render loop copies a [`FrameDirective`] out, compiles or draws without
//! the lock, then writes the acknowledgement back with [`SessionState::ack_load`].
//!
//! Load requests are resolved last-writer-wins through two generation
//! counters. `requested_generation` is bumped by every [`SessionState::request_load`];
//! `active_generation` only moves when the render side acknowledges. A swap is
//! pending iff the two differ, and only the newest requested path is ever
//! visible to the poller, so intermediate requests are dropped rather than
//! queued.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::CompileError;

/// A load request the render loop has not acknowledged yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub path: PathBuf,
    pub generation: u64,
}

/// Result of the most recently applied load, kept for operator status reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub generation: u64,
    pub result: Result<(), CompileError>,
}

/// Consistent copy of everything the render loop needs at the top of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDirective {
    pub quit: bool,
    pub running: bool,
    pub pending: Option<PendingLoad>,
}

/// Copy of the whole control block for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub requested_path: Option<PathBuf>,
    pub active_path: Option<PathBuf>,
    pub active_generation: u64,
    pub requested_generation: u64,
    pub running: bool,
    pub quit: bool,
    pub render_finished: bool,
    pub last_load: Option<LoadOutcome>,
}

#[derive(Debug)]
struct Inner {
    requested_path: Option<PathBuf>,
    active_path: Option<PathBuf>,
    active_generation: u64,
    requested_generation: u64,
    running: bool,
    quit: bool,
    render_finished: bool,
    last_load: Option<LoadOutcome>,
}

#[derive(Debug)]
pub struct SessionState {
    inner: Mutex<Inner>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Creates a running session with no program requested.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                requested_path: None,
                active_path: None,
                active_generation: 0,
                requested_generation: 0,
                running: true,
                quit: false,
                render_finished: false,
                last_load: None,
            }),
        }
    }

    /// Records `path` as the program to show next and returns its generation.
    ///
    /// Never blocks on the render side; an unapplied earlier request is simply
    /// superseded.
    pub fn request_load(&self, path: impl Into<PathBuf>) -> u64 {
        let path = path.into();
        let mut inner = self.inner.lock();
        inner.requested_generation = inner.requested_generation.saturating_add(1);
        tracing::debug!(
            path = %path.display(),
            generation = inner.requested_generation,
            "load requested"
        );
        inner.requested_path = Some(path);
        inner.requested_generation
    }

    /// Re-requests whatever path was requested last, if any.
    pub fn request_reload(&self) -> Option<u64> {
        let path = self.inner.lock().requested_path.clone()?;
        Some(self.request_load(path))
    }

    /// Returns the newest unacknowledged request, if one exists.
    pub fn poll_pending_load(&self) -> Option<PendingLoad> {
        let inner = self.inner.lock();
        Self::pending_of(&inner)
    }

    fn pending_of(inner: &Inner) -> Option<PendingLoad> {
        if inner.requested_generation == inner.active_generation {
            return None;
        }
        inner.requested_path.as_ref().map(|path| PendingLoad {
            path: path.clone(),
            generation: inner.requested_generation,
        })
    }

    /// Marks `generation` as applied (successfully or terminally failed).
    ///
    /// Acknowledging an older generation than the newest request leaves the
    /// newer one pending. Generations never move backwards.
    pub fn ack_load(&self, generation: u64, outcome: LoadOutcome) {
        let mut inner = self.inner.lock();
        let generation = generation.min(inner.requested_generation);
        if generation > inner.active_generation {
            inner.active_generation = generation;
        }
        if outcome.result.is_ok() {
            inner.active_path = Some(outcome.path.clone());
        }
        inner.last_load = Some(outcome);
    }

    pub fn set_running(&self, running: bool) {
        self.inner.lock().running = running;
    }

    /// Flips the running flag and returns the new value.
    pub fn toggle_running(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.running = !inner.running;
        inner.running
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().running
    }

    /// One-way transition; once set the session never un-quits.
    pub fn request_quit(&self) {
        let mut inner = self.inner.lock();
        if !inner.quit {
            tracing::debug!("session quit requested");
        }
        inner.quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.inner.lock().quit
    }

    pub fn mark_render_finished(&self) {
        let mut inner = self.inner.lock();
        inner.render_finished = true;
        inner.quit = true;
    }

    pub fn render_finished(&self) -> bool {
        self.inner.lock().render_finished
    }

    /// Reads quit, running and the pending request under a single lock.
    pub fn frame_directive(&self) -> FrameDirective {
        let inner = self.inner.lock();
        FrameDirective {
            quit: inner.quit,
            running: inner.running,
            pending: Self::pending_of(&inner),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        SessionSnapshot {
            requested_path: inner.requested_path.clone(),
            active_path: inner.active_path.clone(),
            active_generation: inner.active_generation,
            requested_generation: inner.requested_generation,
            running: inner.running,
            quit: inner.quit,
            render_finished: inner.render_finished,
            last_load: inner.last_load.clone(),
        }
    }
}

impl LoadOutcome {
    pub fn succeeded(path: &Path, generation: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            generation,
            result: Ok(()),
        }
    }

    pub fn failed(path: &Path, generation: u64, err: CompileError) -> Self {
        Self {
            path: path.to_path_buf(),
            generation,
            result: Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::error::CompileStage;

    #[test]
    fn only_last_request_is_visible_to_poller() {
        let state = SessionState::new();
        state.request_load("a.frag");
        state.request_load("b.frag");
        let last = state.request_load("c.frag");

        let pending = state.poll_pending_load().unwrap();
        assert_eq!(pending.path, PathBuf::from("c.frag"));
        assert_eq!(pending.generation, last);
        assert_eq!(last, 3);
    }

    #[test]
    fn poll_does_not_consume_request() {
        let state = SessionState::new();
        state.request_load("a.frag");
        assert!(state.poll_pending_load().is_some());
        assert!(state.poll_pending_load().is_some());
    }

    #[test]
    fn ack_clears_pending_and_records_active_path() {
        let state = SessionState::new();
        let generation = state.request_load("a.frag");
        state.ack_load(
            generation,
            LoadOutcome::succeeded(Path::new("a.frag"), generation),
        );

        assert!(state.poll_pending_load().is_none());
        let snapshot = state.snapshot();
        assert_eq!(snapshot.active_path, Some(PathBuf::from("a.frag")));
        assert_eq!(snapshot.active_generation, generation);
    }

    #[test]
    fn failed_ack_keeps_previous_active_path() {
        let state = SessionState::new();
        let first = state.request_load("a.frag");
        state.ack_load(first, LoadOutcome::succeeded(Path::new("a.frag"), first));
        let second = state.request_load("bad.frag");
        let err = CompileError::new(CompileStage::Fragment, "syntax error");
        state.ack_load(
            second,
            LoadOutcome::failed(Path::new("bad.frag"), second, err.clone()),
        );

        let snapshot = state.snapshot();
        assert!(state.poll_pending_load().is_none());
        assert_eq!(snapshot.active_path, Some(PathBuf::from("a.frag")));
        assert_eq!(snapshot.last_load.unwrap().result, Err(err));
    }

    #[test]
    fn acking_stale_generation_leaves_newer_request_pending() {
        let state = SessionState::new();
        let stale = state.request_load("a.frag");
        let pending = state.poll_pending_load().unwrap();
        let newer = state.request_load("b.frag");

        state.ack_load(
            pending.generation,
            LoadOutcome::succeeded(&pending.path, stale),
        );

        let next = state.poll_pending_load().unwrap();
        assert_eq!(next.generation, newer);
        assert_eq!(next.path, PathBuf::from("b.frag"));
    }

    #[test]
    fn retry_after_failure_bumps_generation() {
        let state = SessionState::new();
        let first = state.request_load("bad.frag");
        state.ack_load(
            first,
            LoadOutcome::failed(
                Path::new("bad.frag"),
                first,
                CompileError::new(CompileStage::Link, "mismatch"),
            ),
        );
        assert!(state.poll_pending_load().is_none());

        let retry = state.request_reload().unwrap();
        assert!(retry > first);
        assert_eq!(
            state.poll_pending_load().unwrap().path,
            PathBuf::from("bad.frag")
        );
    }

    #[test]
    fn reload_without_request_is_none() {
        let state = SessionState::new();
        assert!(state.request_reload().is_none());
    }

    #[test]
    fn quit_is_one_way() {
        let state = SessionState::new();
        assert!(!state.should_quit());
        state.request_quit();
        state.request_quit();
        state.set_running(true);
        assert!(state.should_quit());
    }

    #[test]
    fn toggle_running_flips_flag() {
        let state = SessionState::new();
        assert!(state.is_running());
        assert!(!state.toggle_running());
        assert!(!state.is_running());
        assert!(state.toggle_running());
    }

    #[test]
    fn render_finished_implies_quit() {
        let state = SessionState::new();
        state.mark_render_finished();
        assert!(state.render_finished());
        assert!(state.should_quit());
    }

    #[test]
    fn directive_is_consistent_under_concurrent_writes() {
        let state = Arc::new(SessionState::new());
        let writer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for index in 0..2_000u32 {
                    state.request_load(format!("{index}.frag"));
                }
            })
        };

        let mut last_generation = 0;
        while !writer.is_finished() {
            let directive = state.frame_directive();
            if let Some(pending) = directive.pending {
                assert!(pending.generation >= last_generation);
                let expected = format!("{}.frag", pending.generation - 1);
                assert_eq!(pending.path, PathBuf::from(expected));
                last_generation = pending.generation;
            }
        }
        writer.join().unwrap();
        assert_eq!(state.poll_pending_load().unwrap().generation, 2_000);
    }
}
