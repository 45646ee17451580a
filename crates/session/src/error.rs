use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Pipeline stage a compile diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileStage {
    Vertex,
    Fragment,
    Link,
}

impl fmt::Display for CompileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileStage::Vertex => f.write_str("vertex"),
            CompileStage::Fragment => f.write_str("fragment"),
            CompileStage::Link => f.write_str("link"),
        }
    }
}

/// Failure to turn a vertex/fragment source pair into a usable program.
///
/// Missing or unreadable sources are reported through the same variant with a
/// synthetic diagnostic so callers only ever handle one recoverable shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("{stage} stage failed:\n{diagnostic}")]
    CompileFailed {
        stage: CompileStage,
        diagnostic: String,
    },
}

impl CompileError {
    pub fn new(stage: CompileStage, diagnostic: impl Into<String>) -> Self {
        CompileError::CompileFailed {
            stage,
            diagnostic: diagnostic.into(),
        }
    }

    /// Maps a failed source read onto the stage that needed it.
    pub fn from_read(stage: CompileStage, path: &Path, err: &io::Error) -> Self {
        let diagnostic = match err.kind() {
            io::ErrorKind::NotFound => format!("file not found: {}", path.display()),
            _ => format!("failed to read {}: {err}", path.display()),
        };
        Self::new(stage, diagnostic)
    }

    pub fn stage(&self) -> CompileStage {
        match self {
            CompileError::CompileFailed { stage, .. } => *stage,
        }
    }

    pub fn diagnostic(&self) -> &str {
        match self {
            CompileError::CompileFailed { diagnostic, .. } => diagnostic,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("selection {index} is out of range (catalog has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("failed to list shader directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Window or GPU context creation failed; the session cannot start.
#[derive(Debug, Clone, thiserror::Error)]
#[error("graphics backend failed to initialise: {0}")]
pub struct BackendInitFailed(pub String);

/// Outcome of a single frame submission that did not present.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The frame was dropped; the next one may succeed (lost surface, timeout).
    #[error("frame skipped: {0}")]
    Recoverable(String),
    /// The backend cannot continue rendering.
    #[error("rendering cannot continue: {0}")]
    Fatal(String),
}
