//! Two-thread shutdown behaviour with the render loop and command loop running
//! concurrently against one shared session.

use std::fs;
use std::io::{self, BufRead, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use session::{
    BackendSignal, CommandLoop, CompileError, CompiledProgram, Console, FixedTimeSource,
    FrameBackend, FrameError, Menu, ProgramCompiler, ProgramSource, RenderLoop,
    RenderLoopOptions, SessionState, ShaderCatalog, UniformCache,
};
use tempfile::TempDir;

/// Counts lifecycle calls; the close flag simulates the window's close button.
#[derive(Clone, Default)]
struct Probe {
    close: Arc<AtomicBool>,
    releases: Arc<AtomicU32>,
    disposed: Arc<AtomicU32>,
    presents: Arc<AtomicU32>,
}

struct HeadlessBackend {
    probe: Probe,
    next: u32,
}

impl ProgramCompiler for HeadlessBackend {
    type Handle = u32;

    fn compile(
        &mut self,
        vertex: &ProgramSource,
        fragment: &ProgramSource,
    ) -> Result<CompiledProgram<u32>, CompileError> {
        self.next += 1;
        Ok(CompiledProgram::new(
            self.next,
            &vertex.path,
            &fragment.path,
            UniformCache::default(),
        ))
    }

    fn dispose(&mut self, _program: CompiledProgram<u32>) {
        self.probe.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

impl FrameBackend for HeadlessBackend {
    fn poll_events(&mut self) -> BackendSignal {
        BackendSignal {
            close_requested: self.probe.close.load(Ordering::SeqCst),
        }
    }

    fn viewport(&self) -> (u32, u32) {
        (64, 64)
    }

    fn present(&mut self, _program: Option<&CompiledProgram<u32>>) -> Result<(), FrameError> {
        self.probe.presents.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1));
        Ok(())
    }

    fn release(&mut self) {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Blocking stdin stand-in: each received string is one chunk of input, and
/// dropping the sender is end of input.
struct ChannelReader {
    lines: Receiver<String>,
    buffer: Vec<u8>,
    pos: usize,
}

impl ChannelReader {
    fn new() -> (Sender<String>, Self) {
        let (tx, rx) = unbounded();
        (
            tx,
            Self {
                lines: rx,
                buffer: Vec::new(),
                pos: 0,
            },
        )
    }
}

impl Read for ChannelReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for ChannelReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.buffer.len() {
            match self.lines.recv() {
                Ok(chunk) => {
                    self.buffer = chunk.into_bytes();
                    self.pos = 0;
                }
                Err(_) => return Ok(&[]),
            }
        }
        Ok(&self.buffer[self.pos..])
    }

    fn consume(&mut self, amount: usize) {
        self.pos += amount;
    }
}

struct Harness {
    dir: TempDir,
    session: Arc<SessionState>,
    probe: Probe,
    render: thread::JoinHandle<()>,
    commands: thread::JoinHandle<String>,
    input: Option<Sender<String>>,
}

fn shader_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("vertex.vs"), "void main() {}").unwrap();
    fs::write(dir.path().join("a.frag"), "void main() {}").unwrap();
    dir
}

fn start() -> Harness {
    let dir = shader_dir();
    let session = Arc::new(SessionState::new());
    session.request_load(dir.path().join("a.frag"));
    let probe = Probe::default();

    let render = {
        let backend = HeadlessBackend {
            probe: probe.clone(),
            next: 0,
        };
        let render_loop = RenderLoop::new(
            backend,
            dir.path().join("vertex.vs"),
            Arc::clone(&session),
            Box::new(FixedTimeSource::new(0.0)),
            RenderLoopOptions {
                paused_poll_interval: Duration::from_millis(1),
            },
        );
        thread::spawn(move || {
            render_loop.run();
        })
    };

    let (input, reader) = ChannelReader::new();
    let commands = {
        let menu = Menu::new(ShaderCatalog::new(dir.path(), "vertex.vs"), "fragment.frag");
        let session = Arc::clone(&session);
        thread::spawn(move || {
            let mut commands = CommandLoop::new(Console::new(reader, Vec::new()), session, menu);
            commands.run().unwrap();
            String::from_utf8(commands.into_console().into_output()).unwrap()
        })
    };

    Harness {
        dir,
        session,
        probe,
        render,
        commands,
        input: Some(input),
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(2));
    }
}

fn active_path(session: &SessionState) -> Option<PathBuf> {
    session.snapshot().active_path
}

fn assert_released_once(probe: &Probe) {
    assert_eq!(probe.releases.load(Ordering::SeqCst), 1);
    assert_eq!(probe.disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn console_quit_stops_render_thread() {
    let mut harness = start();
    wait_until(|| active_path(&harness.session).is_some());

    let input = harness.input.take().unwrap();
    input.send("q\n".to_string()).unwrap();

    harness.render.join().unwrap();
    harness.commands.join().unwrap();
    assert!(harness.session.render_finished());
    assert_released_once(&harness.probe);
}

#[test]
fn console_eof_stops_render_thread() {
    let mut harness = start();
    wait_until(|| active_path(&harness.session).is_some());

    drop(harness.input.take());

    harness.render.join().unwrap();
    harness.commands.join().unwrap();
    assert!(harness.session.should_quit());
    assert_released_once(&harness.probe);
}

#[test]
fn window_close_waits_for_next_console_line() {
    let mut harness = start();
    wait_until(|| harness.probe.presents.load(Ordering::SeqCst) > 2);

    harness.probe.close.store(true, Ordering::SeqCst);
    harness.render.join().unwrap();
    assert!(harness.session.render_finished());
    assert_released_once(&harness.probe);

    // The command thread is still parked in its read; any line releases it and
    // the command is discarded because the session already ended.
    assert!(!harness.commands.is_finished());
    let input = harness.input.take().unwrap();
    input.send("p\n".to_string()).unwrap();
    harness.commands.join().unwrap();
    assert!(harness.session.is_running());
}

#[test]
fn paused_session_keeps_polling_and_can_quit() {
    let mut harness = start();
    wait_until(|| active_path(&harness.session).is_some());

    let input = harness.input.take().unwrap();
    input.send("p\n".to_string()).unwrap();
    wait_until(|| !harness.session.is_running());
    let presented = harness.probe.presents.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(20));
    assert!(harness.probe.presents.load(Ordering::SeqCst) <= presented + 1);

    harness.probe.close.store(true, Ordering::SeqCst);
    harness.render.join().unwrap();
    input.send("\n".to_string()).unwrap();
    harness.commands.join().unwrap();
    assert_released_once(&harness.probe);
}

#[test]
fn window_close_during_menu_releases_console_after_one_line() {
    let mut harness = start();
    wait_until(|| active_path(&harness.session).is_some());

    let input = harness.input.take().unwrap();
    input.send("m\n".to_string()).unwrap();
    wait_until(|| !harness.session.is_running());

    harness.probe.close.store(true, Ordering::SeqCst);
    harness.render.join().unwrap();
    assert_released_once(&harness.probe);

    // A blank line would normally re-prompt the menu; with the session over it
    // ends the command thread instead.
    assert!(!harness.commands.is_finished());
    input.send("\n".to_string()).unwrap();
    let output = harness.commands.join().unwrap();

    assert!(!output.contains("Please choose A, B or C."));
    assert!(!harness.session.is_running());
    assert_eq!(
        active_path(&harness.session),
        Some(harness.dir.path().join("a.frag"))
    );
}
