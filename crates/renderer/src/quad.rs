use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Corner of the full-screen quad, fed to vertex attribute location 0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    pub position: [f32; 3],
}

pub(crate) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
    },
];

pub(crate) const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

pub(crate) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// Two triangles covering clip space, created once per window.
pub(crate) struct Quad {
    pub vertices: wgpu::Buffer,
    pub indices: wgpu::Buffer,
}

impl Quad {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vertices, indices }
    }

    pub(crate) fn index_count(&self) -> u32 {
        QUAD_INDICES.len() as u32
    }

    pub(crate) fn destroy(self) {
        self.vertices.destroy();
        self.indices.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_cover_both_triangles() {
        assert!(QUAD_INDICES.iter().all(|&i| (i as usize) < QUAD_VERTICES.len()));
        assert_eq!(vertex_layout().array_stride, 12);
    }
}
