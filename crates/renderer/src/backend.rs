use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use session::{
    BackendSignal, CompileError, CompiledProgram, FrameBackend, FrameError, ProgramCompiler,
    ProgramSource,
};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{EventLoop, EventLoopBuilder};
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use crate::context::GpuContext;
use crate::pipeline::{self, GpuProgram, PipelineLayouts};
use crate::quad::Quad;
use crate::types::RendererConfig;

/// Window, surface and GPU objects owned by the render thread.
///
/// Field order matters: GPU objects drop before the window they draw into.
pub struct WindowBackend {
    layouts: PipelineLayouts,
    quad: Option<Quad>,
    context: GpuContext,
    window: Arc<Window>,
    event_loop: EventLoop<()>,
    close_requested: bool,
}

impl WindowBackend {
    /// Opens the window and initialises the GPU context on the calling thread.
    pub fn new(config: &RendererConfig) -> Result<Self> {
        let event_loop = build_event_loop()?;

        let (width, height) = config.surface_size;
        let window = WindowBuilder::new()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height))
            .build(&event_loop)
            .map_err(|err| anyhow!("failed to create window: {err}"))?;
        let window = Arc::new(window);

        let context = GpuContext::new(window.as_ref(), window.inner_size(), config.vsync)?;
        let layouts = PipelineLayouts::new(&context.device);
        let quad = Quad::new(&context.device);

        tracing::info!(
            width = context.size.width,
            height = context.size.height,
            format = ?context.surface_format,
            "window ready"
        );

        Ok(Self {
            layouts,
            quad: Some(quad),
            context,
            window,
            event_loop,
            close_requested: false,
        })
    }
}

fn build_event_loop() -> Result<EventLoop<()>> {
    let mut builder = EventLoopBuilder::new();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }

    #[cfg(target_os = "windows")]
    {
        use winit::platform::windows::EventLoopBuilderExtWindows;
        EventLoopBuilderExtWindows::with_any_thread(&mut builder, true);
    }

    builder
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && matches!(event.logical_key, Key::Named(NamedKey::Escape))
}

impl ProgramCompiler for WindowBackend {
    type Handle = GpuProgram;

    fn compile(
        &mut self,
        vertex: &ProgramSource,
        fragment: &ProgramSource,
    ) -> Result<CompiledProgram<GpuProgram>, CompileError> {
        let (program, uniforms) = pipeline::build(
            &self.context.device,
            &self.layouts,
            self.context.surface_format,
            vertex,
            fragment,
        )?;
        Ok(CompiledProgram::new(
            program,
            &vertex.path,
            &fragment.path,
            uniforms,
        ))
    }

    fn dispose(&mut self, program: CompiledProgram<GpuProgram>) {
        program.into_handle().destroy();
    }
}

impl FrameBackend for WindowBackend {
    fn poll_events(&mut self) -> BackendSignal {
        let window_id = self.window.id();
        let mut close = false;
        let mut resized = None;

        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _elwt| {
                if let Event::WindowEvent {
                    window_id: id,
                    event,
                } = event
                {
                    if id != window_id {
                        return;
                    }
                    match event {
                        WindowEvent::CloseRequested | WindowEvent::Destroyed => close = true,
                        WindowEvent::KeyboardInput { event, .. } if is_escape(&event) => {
                            close = true
                        }
                        WindowEvent::Resized(size) => resized = Some(size),
                        _ => {}
                    }
                }
            });

        if let PumpStatus::Exit(code) = status {
            tracing::debug!(code, "event loop exited");
            close = true;
        }
        if let Some(size) = resized {
            tracing::debug!(width = size.width, height = size.height, "window resized");
            self.context.resize(size);
        }
        self.close_requested |= close;

        BackendSignal {
            close_requested: self.close_requested,
        }
    }

    fn viewport(&self) -> (u32, u32) {
        (self.context.size.width, self.context.size.height)
    }

    fn present(&mut self, program: Option<&CompiledProgram<GpuProgram>>) -> Result<(), FrameError> {
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Err(FrameError::Recoverable(
                    "surface lost; reconfigured".to_string(),
                ));
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(FrameError::Fatal("surface out of memory".to_string()));
            }
            Err(other) => return Err(FrameError::Recoverable(other.to_string())),
        };

        if let Some(program) = program {
            self.context.queue.write_buffer(
                &program.handle().uniform_buffer,
                0,
                program.uniforms().bytes(),
            );
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shader pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let (Some(program), Some(quad)) = (program, self.quad.as_ref()) {
                let gpu = program.handle();
                pass.set_pipeline(&gpu.pipeline);
                pass.set_bind_group(0, &gpu.bind_group, &[]);
                pass.set_vertex_buffer(0, quad.vertices.slice(..));
                pass.set_index_buffer(quad.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..quad.index_count(), 0, 0..1);
            }
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }

    fn release(&mut self) {
        if let Some(quad) = self.quad.take() {
            quad.destroy();
            tracing::debug!("released quad buffers");
        }
    }
}
