//! Live-reload session core for the shadart fragment-shader viewer.
//!
//! Two threads share one [`SessionState`]:
//!
//! * the render thread drives [`RenderLoop`], which owns the window backend
//!   and the [`ShaderSlot`] holding the active program;
//! * the command thread drives [`CommandLoop`], reading operator input and
//!   turning it into load, reload, pause and quit requests.
//!
//! Nothing here depends on a graphics API. Backends plug in through
//! [`ProgramCompiler`] and [`FrameBackend`].

pub mod catalog;
pub mod clock;
pub mod command;
pub mod console;
pub mod error;
pub mod menu;
pub mod program;
pub mod render_loop;
pub mod slot;
pub mod state;
pub mod templates;
pub mod uniforms;

pub use catalog::{is_bare_file_name, CatalogEntry, CatalogOrder, ShaderCatalog};
pub use clock::{BoxedTimeSource, FixedTimeSource, SystemTimeSource, TimeSample, TimeSource};
pub use command::{Command, CommandLoop};
pub use console::Console;
pub use error::{BackendInitFailed, CatalogError, CompileError, CompileStage, FrameError};
pub use menu::{Menu, MenuChoice};
pub use program::{CompiledProgram, ProgramCompiler, ProgramSource};
pub use render_loop::{
    BackendSignal, FrameBackend, RenderLoop, RenderLoopOptions, RenderStats, Step,
    RESOLUTION_UNIFORM, TIME_UNIFORM,
};
pub use slot::ShaderSlot;
pub use state::{FrameDirective, LoadOutcome, PendingLoad, SessionSnapshot, SessionState};
pub use uniforms::{UniformCache, UniformKind, UniformLocation};
