use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CompileError, CompileStage};
use crate::uniforms::UniformCache;

/// Source text of one pipeline stage together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    pub path: PathBuf,
    pub text: String,
}

impl ProgramSource {
    /// Reads `path`, reporting failures as a compile error for `stage`.
    pub fn read(stage: CompileStage, path: &Path) -> Result<Self, CompileError> {
        let text =
            fs::read_to_string(path).map_err(|err| CompileError::from_read(stage, path, &err))?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }
}

/// A linked program plus the sources and uniform cache it was built from.
///
/// The handle is opaque to the session; only the [`ProgramCompiler`] that
/// produced it knows how to draw with it or release it.
#[derive(Debug)]
pub struct CompiledProgram<H> {
    handle: H,
    vertex_path: PathBuf,
    fragment_path: PathBuf,
    uniforms: UniformCache,
}

impl<H> CompiledProgram<H> {
    pub fn new(
        handle: H,
        vertex_path: impl Into<PathBuf>,
        fragment_path: impl Into<PathBuf>,
        uniforms: UniformCache,
    ) -> Self {
        Self {
            handle,
            vertex_path: vertex_path.into(),
            fragment_path: fragment_path.into(),
            uniforms,
        }
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn vertex_path(&self) -> &Path {
        &self.vertex_path
    }

    pub fn fragment_path(&self) -> &Path {
        &self.fragment_path
    }

    pub fn uniforms(&self) -> &UniformCache {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut UniformCache {
        &mut self.uniforms
    }

    pub fn into_handle(self) -> H {
        self.handle
    }
}

/// Turns a vertex/fragment pair into a program and releases programs again.
///
/// Implementations must convert every backend failure into
/// [`CompileError::CompileFailed`] naming the first stage that failed; nothing
/// may panic or unwind past `compile`.
pub trait ProgramCompiler {
    type Handle;

    fn compile(
        &mut self,
        vertex: &ProgramSource,
        fragment: &ProgramSource,
    ) -> Result<CompiledProgram<Self::Handle>, CompileError>;

    /// Frees the GPU-side objects behind a program that is no longer bound.
    fn dispose(&mut self, program: CompiledProgram<Self::Handle>);
}
