use std::borrow::Cow;

use session::{
    CompileError, CompileStage, ProgramSource, UniformCache, RESOLUTION_UNIFORM, TIME_UNIFORM,
};
use wgpu::naga::ShaderStage;

use crate::compile::{self, PreparedStage, UNIFORM_BINDING};
use crate::quad;

/// GPU objects behind one compiled vertex/fragment pair.
pub struct GpuProgram {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) uniform_buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
}

impl GpuProgram {
    pub(crate) fn destroy(self) {
        self.uniform_buffer.destroy();
    }
}

pub(crate) struct PipelineLayouts {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
}

impl PipelineLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: UNIFORM_BINDING,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shader pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        Self {
            uniform_layout,
            pipeline_layout,
        }
    }
}

/// Compiles both stages, then links them into a render pipeline.
///
/// Each stage is checked with naga first so failures carry per-stage
/// diagnostics; anything wgpu rejects afterwards is reported as a link error.
pub(crate) fn build(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    surface_format: wgpu::TextureFormat,
    vertex: &ProgramSource,
    fragment: &ProgramSource,
) -> Result<(GpuProgram, UniformCache), CompileError> {
    let vertex_stage = compile::prepare(CompileStage::Vertex, &vertex.text);
    let (vertex_module, _) = compile::check(&vertex_stage)?;
    let fragment_stage = compile::prepare(CompileStage::Fragment, &fragment.text);
    let (fragment_module, _) = compile::check(&fragment_stage)?;

    let mut uniforms = compile::reflect_uniforms(&fragment_module);
    let reflected = |cache: &UniformCache| {
        cache.location(TIME_UNIFORM).is_some() || cache.location(RESOLUTION_UNIFORM).is_some()
    };
    if !reflected(&uniforms) {
        uniforms = compile::reflect_uniforms(&vertex_module);
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let program = link(
        device,
        layouts,
        surface_format,
        &vertex_stage,
        &fragment_stage,
        uniforms.bytes().len(),
    );
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(CompileError::new(CompileStage::Link, err.to_string()));
    }

    Ok((program, uniforms))
}

fn link(
    device: &wgpu::Device,
    layouts: &PipelineLayouts,
    surface_format: wgpu::TextureFormat,
    vertex: &PreparedStage,
    fragment: &PreparedStage,
    uniform_size: usize,
) -> GpuProgram {
    let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("shadart vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(vertex.source.as_str()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    });
    let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("shadart fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(fragment.source.as_str()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("shader pipeline"),
        layout: Some(&layouts.pipeline_layout),
        vertex: wgpu::VertexState {
            module: &vertex_module,
            entry_point: Some("main"),
            buffers: &[quad::vertex_layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    });

    let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("shader uniforms"),
        size: uniform_size as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("shader uniforms"),
        layout: &layouts.uniform_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: UNIFORM_BINDING,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    GpuProgram {
        pipeline,
        uniform_buffer,
        bind_group,
    }
}
