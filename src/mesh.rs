//! Procedural meshes and GPU vertex/index buffers.
//!
//! All geometry in the demos is generated at startup: a UV sphere, a ground
//! plane, a torus and the gizmo's axis arrows. Generation is split from
//! upload so the vertex math stays testable without a GPU device.

use cgmath::Vector3;
use wgpu::util::DeviceExt;

/// A single mesh vertex: object-space position and normal.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Vertex and index buffers for one uploaded mesh.
#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, name: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }

    pub fn sphere(device: &wgpu::Device, radius: f32, sectors: u32, stacks: u32) -> Self {
        let (vertices, indices) = sphere_mesh(radius, sectors, stacks);
        Self::new(device, "sphere", &vertices, &indices)
    }

    pub fn plane(device: &wgpu::Device, size: f32) -> Self {
        let (vertices, indices) = plane_mesh(size);
        Self::new(device, "plane", &vertices, &indices)
    }

    pub fn torus(
        device: &wgpu::Device,
        radius: f32,
        tube: f32,
        tubular_segments: u32,
        radial_segments: u32,
    ) -> Self {
        let (vertices, indices) = torus_mesh(radius, tube, tubular_segments, radial_segments);
        Self::new(device, "torus", &vertices, &indices)
    }

    pub fn arrow(device: &wgpu::Device, length: f32, girth: f32) -> Self {
        let (vertices, indices) = arrow_mesh(length, girth);
        Self::new(device, "arrow", &vertices, &indices)
    }
}

/// Two counter-clockwise triangles per quad of a `(rows + 1) x (cols + 1)`
/// vertex grid, rows being the slower-varying parameter.
fn grid_indices(rows: u32, cols: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity((rows * cols * 6) as usize);
    for i in 0..rows {
        for j in 0..cols {
            let a = i * (cols + 1) + j;
            let b = (i + 1) * (cols + 1) + j;
            indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    indices
}

/// A UV sphere centred on the origin. Stacks run from the +Y pole down,
/// sectors around the Y axis.
pub fn sphere_mesh(radius: f32, sectors: u32, stacks: u32) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(((stacks + 1) * (sectors + 1)) as usize);
    for i in 0..=stacks {
        let phi = std::f32::consts::PI * i as f32 / stacks as f32;
        for j in 0..=sectors {
            let theta = std::f32::consts::TAU * j as f32 / sectors as f32;
            let normal = Vector3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            vertices.push(Vertex {
                position: (normal * radius).into(),
                normal: normal.into(),
            });
        }
    }
    (vertices, grid_indices(stacks, sectors))
}

/// A `size` x `size` ground plane in the XZ plane, normal +Y.
pub fn plane_mesh(size: f32) -> (Vec<Vertex>, Vec<u32>) {
    let h = size / 2.0;
    let up = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex { position: [-h, 0.0, -h], normal: up },
        Vertex { position: [-h, 0.0, h], normal: up },
        Vertex { position: [h, 0.0, h], normal: up },
        Vertex { position: [h, 0.0, -h], normal: up },
    ];
    (vertices, vec![0, 1, 2, 0, 2, 3])
}

/// A torus around the Y axis: `radius` from the centre to the middle of the
/// tube, `tube` the radius of the tube itself.
pub fn torus_mesh(
    radius: f32,
    tube: f32,
    tubular_segments: u32,
    radial_segments: u32,
) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices =
        Vec::with_capacity(((tubular_segments + 1) * (radial_segments + 1)) as usize);
    for i in 0..=tubular_segments {
        let u = std::f32::consts::TAU * i as f32 / tubular_segments as f32;
        for j in 0..=radial_segments {
            let v = std::f32::consts::TAU * j as f32 / radial_segments as f32;
            let normal = Vector3::new(v.cos() * u.cos(), v.sin(), v.cos() * u.sin());
            let position = Vector3::new(
                (radius + tube * v.cos()) * u.cos(),
                tube * v.sin(),
                (radius + tube * v.cos()) * u.sin(),
            );
            vertices.push(Vertex {
                position: position.into(),
                normal: normal.into(),
            });
        }
    }
    (vertices, grid_indices(tubular_segments, radial_segments))
}

/// An axis-aligned box between `min` and `max` with flat per-face normals.
pub fn cuboid_mesh(min: Vector3<f32>, max: Vector3<f32>) -> (Vec<Vertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    // axis: which coordinate is fixed; sign: which side of the box
    for (axis, sign) in [(0, 1.0), (0, -1.0), (1, 1.0), (1, -1.0), (2, 1.0), (2, -1.0)] {
        let mut normal = [0.0f32; 3];
        normal[axis] = sign;
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;
        let base = vertices.len() as u32;
        for (du, dv) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let mut p = [0.0f32; 3];
            p[axis] = if sign > 0.0 { max[axis] } else { min[axis] };
            p[u] = min[u] + du * (max[u] - min[u]);
            p[v] = min[v] + dv * (max[v] - min[v]);
            vertices.push(Vertex {
                position: p,
                normal,
            });
        }
        // flip winding on the negative faces so all faces front outwards
        if sign > 0.0 {
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        } else {
            indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
        }
    }
    (vertices, indices)
}

/// A gizmo arrow along +X: a thin shaft with a thicker head. Rotated into
/// place per axis via the instance transform.
pub fn arrow_mesh(length: f32, girth: f32) -> (Vec<Vertex>, Vec<u32>) {
    let split = length * 0.75;
    let (mut vertices, mut indices) = cuboid_mesh(
        Vector3::new(0.0, -girth, -girth),
        Vector3::new(split, girth, girth),
    );
    let head = girth * 2.5;
    let (head_vertices, head_indices) = cuboid_mesh(
        Vector3::new(split, -head, -head),
        Vector3::new(length, head, head),
    );
    let offset = vertices.len() as u32;
    vertices.extend(head_vertices);
    indices.extend(head_indices.into_iter().map(|i| i + offset));
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    #[test]
    fn sphere_has_unit_radial_normals() {
        let (vertices, _) = sphere_mesh(2.0, 16, 16);
        for v in &vertices {
            let n = Vector3::from(v.normal);
            let p = Vector3::from(v.position);
            assert!((n.magnitude() - 1.0).abs() < 1e-5);
            assert!((p - n * 2.0).magnitude() < 1e-4);
        }
    }

    #[test]
    fn grid_counts_line_up() {
        let (vertices, indices) = sphere_mesh(1.0, 32, 32);
        assert_eq!(vertices.len(), 33 * 33);
        assert_eq!(indices.len(), 32 * 32 * 6);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn arrow_spans_its_length_along_x() {
        // shaft box + head box
        let (vertices, indices) = arrow_mesh(1.2, 0.03);
        assert_eq!(vertices.len(), 48);
        assert_eq!(indices.len(), 72);
        let max_x = vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert!((max_x - 1.2).abs() < 1e-6);
        assert!(vertices.iter().all(|v| v.position[0] >= 0.0));
    }

    #[test]
    fn torus_normals_point_away_from_tube_centre() {
        let (vertices, _) = torus_mesh(0.6, 0.25, 24, 12);
        for v in &vertices {
            let p = Vector3::from(v.position);
            // centre of the tube ring closest to this vertex
            let flat = Vector3::new(p.x, 0.0, p.z);
            let ring = if flat.magnitude() > 1e-6 {
                flat.normalize() * 0.6
            } else {
                flat
            };
            let expected = (p - ring).normalize();
            assert!((expected - Vector3::from(v.normal)).magnitude() < 1e-3);
        }
    }
}
