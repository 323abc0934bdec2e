use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Vertex of the fullscreen plane used by every simulation pass.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 2],
}

/// Vertex of the unit display cube.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
}

const PLANE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![
    0 => Float32x2,
];

const CUBE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![
    0 => Float32x3,
];

/// An indexed mesh: one vertex buffer, one u16 index buffer.
pub struct Geometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Geometry {
    /// Clip-space quad covering the whole target.
    pub fn fullscreen_plane(device: &wgpu::Device) -> Self {
        let vertices = [
            PlaneVertex {
                position: [-1.0, -1.0],
            },
            PlaneVertex {
                position: [1.0, -1.0],
            },
            PlaneVertex {
                position: [1.0, 1.0],
            },
            PlaneVertex {
                position: [-1.0, 1.0],
            },
        ];
        let indices: [u16; 6] = [0, 1, 2, 2, 3, 0];
        Self::from_parts(
            device,
            "plane",
            bytemuck::cast_slice(&vertices),
            &indices,
        )
    }

    /// Unit cube centered at the origin (half extent 0.5), wound CCW so
    /// back-face culling keeps the outside.
    pub fn unit_cube(device: &wgpu::Device) -> Self {
        let p = 0.5_f32;
        #[rustfmt::skip]
        let vertices = [
            // +Z face
            CubeVertex { position: [-p, -p,  p] },
            CubeVertex { position: [ p, -p,  p] },
            CubeVertex { position: [ p,  p,  p] },
            CubeVertex { position: [-p,  p,  p] },
            // -Z face
            CubeVertex { position: [ p, -p, -p] },
            CubeVertex { position: [-p, -p, -p] },
            CubeVertex { position: [-p,  p, -p] },
            CubeVertex { position: [ p,  p, -p] },
            // +X face
            CubeVertex { position: [ p, -p,  p] },
            CubeVertex { position: [ p, -p, -p] },
            CubeVertex { position: [ p,  p, -p] },
            CubeVertex { position: [ p,  p,  p] },
            // -X face
            CubeVertex { position: [-p, -p, -p] },
            CubeVertex { position: [-p, -p,  p] },
            CubeVertex { position: [-p,  p,  p] },
            CubeVertex { position: [-p,  p, -p] },
            // +Y face
            CubeVertex { position: [-p,  p,  p] },
            CubeVertex { position: [ p,  p,  p] },
            CubeVertex { position: [ p,  p, -p] },
            CubeVertex { position: [-p,  p, -p] },
            // -Y face
            CubeVertex { position: [-p, -p, -p] },
            CubeVertex { position: [ p, -p, -p] },
            CubeVertex { position: [ p, -p,  p] },
            CubeVertex { position: [-p, -p,  p] },
        ];
        #[rustfmt::skip]
        let indices: [u16; 36] = [
            0,1,2, 2,3,0,       // +Z
            4,5,6, 6,7,4,       // -Z
            8,9,10, 10,11,8,    // +X
            12,13,14, 14,15,12, // -X
            16,17,18, 18,19,16, // +Y
            20,21,22, 22,23,20, // -Y
        ];
        Self::from_parts(device, "cube", bytemuck::cast_slice(&vertices), &indices)
    }

    fn from_parts(
        device: &wgpu::Device,
        label: &str,
        vertex_bytes: &[u8],
        indices: &[u16],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn plane_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PlaneVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &PLANE_ATTRS,
        }
    }

    pub fn cube_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &CUBE_ATTRS,
        }
    }
}
