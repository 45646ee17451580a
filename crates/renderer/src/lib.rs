//! wgpu/winit backend for the shadart session core.
//!
//! The renderer owns everything bound to the render thread: the winit event
//! loop and window, the wgpu device and surface, the full-screen quad and every
//! compiled pipeline. It plugs into the session through
//! [`session::ProgramCompiler`] and [`session::FrameBackend`].
//!
//! Operator GLSL is written against desktop GL conventions (`#version 330`,
//! loose `uniform float uTime;`). The compile module rewrites it into Vulkan-style
//! GLSL with the built-in uniforms in a std140 block, checks each stage with
//! naga for per-stage diagnostics and reflects the block layout into the
//! session's uniform cache.

mod backend;
mod compile;
mod context;
mod pipeline;
mod quad;
mod runtime;
mod types;

pub use backend::WindowBackend;
pub use pipeline::GpuProgram;
pub use runtime::RenderRuntime;
pub use types::RendererConfig;
