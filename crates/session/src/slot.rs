//! Single-owner holder for the active compiled program.
//!
//! ```text
//!   Empty ──load ok──▶ Active(p1) ──load ok──▶ Active(p2)   (p1 disposed after p2 is bound)
//!     │                   │
//!     └──load err──▶ Empty └──load err──▶ Active(p1)        (p1 untouched)
//! ```
//!
//! A replacement is compiled completely before anything about the slot
//! changes, so a reader of [`ShaderSlot::active`] only ever sees a fully linked
//! program or nothing.

use std::path::{Path, PathBuf};

use crate::error::{CompileError, CompileStage};
use crate::program::{CompiledProgram, ProgramCompiler, ProgramSource};

#[derive(Debug)]
pub struct ShaderSlot<H> {
    vertex_path: PathBuf,
    active: Option<CompiledProgram<H>>,
}

impl<H> ShaderSlot<H> {
    pub fn new(vertex_path: impl Into<PathBuf>) -> Self {
        Self {
            vertex_path: vertex_path.into(),
            active: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none()
    }

    pub fn active(&self) -> Option<&CompiledProgram<H>> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut CompiledProgram<H>> {
        self.active.as_mut()
    }

    pub fn active_source_path(&self) -> Option<&Path> {
        self.active.as_ref().map(CompiledProgram::fragment_path)
    }

    /// Compiles `fragment_path` against the fixed vertex source and swaps it in.
    ///
    /// On failure the slot is left exactly as it was.
    pub fn load<C>(&mut self, compiler: &mut C, fragment_path: &Path) -> Result<(), CompileError>
    where
        C: ProgramCompiler<Handle = H>,
    {
        let vertex = ProgramSource::read(CompileStage::Vertex, &self.vertex_path)?;
        let fragment = ProgramSource::read(CompileStage::Fragment, fragment_path)?;
        let program = compiler.compile(&vertex, &fragment)?;

        if let Some(previous) = self.active.replace(program) {
            tracing::debug!(
                previous = %previous.fragment_path().display(),
                "disposing superseded program"
            );
            compiler.dispose(previous);
        }
        Ok(())
    }

    /// Disposes the active program, leaving the slot empty.
    pub fn release<C>(&mut self, compiler: &mut C)
    where
        C: ProgramCompiler<Handle = H>,
    {
        if let Some(program) = self.active.take() {
            compiler.dispose(program);
        }
    }
}
