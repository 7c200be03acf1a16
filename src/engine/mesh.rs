use crate::engine::assets::AssetError;

/// Floats per vertex: position then colour.
pub const STRIDE: usize = 6;

pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / STRIDE
    }

    pub fn cube(size: f32, r: f32, g: f32, b: f32) -> Self {
        let mut builder = MeshBuilder::new();
        builder.add_box([0.0, 0.0, 0.0], [size, size, size], [r, g, b]);
        builder.build()
    }

    pub fn from_gltf(bytes: &[u8]) -> Result<Self, AssetError> {
        let (document, buffers, _) =
            gltf::import_slice(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b[..]));

                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .ok_or_else(|| AssetError::Decode("primitive without positions".into()))?
                    .collect();
                let colors = reader.read_colors(0).map(|iter| iter.into_rgb_f32().collect());
                let source_indices = reader.read_indices().map(|iter| iter.into_u32().collect());
                append_primitive(&mut vertices, &mut indices, &positions, colors, source_indices)?;
            }
        }

        if indices.is_empty() {
            return Err(AssetError::Decode("model has no triangles".into()));
        }
        Ok(Mesh { vertices, indices })
    }
}

/// Appends one decoded primitive, rebasing its indices past what is
/// already in `vertices`. Missing colours default to white, missing
/// indices to a plain triangle list.
fn append_primitive(
    vertices: &mut Vec<f32>,
    indices: &mut Vec<u16>,
    positions: &[[f32; 3]],
    colors: Option<Vec<[f32; 3]>>,
    source_indices: Option<Vec<u32>>,
) -> Result<(), AssetError> {
    let colors = colors.unwrap_or_else(|| vec![[1.0, 1.0, 1.0]; positions.len()]);
    if colors.len() != positions.len() {
        return Err(AssetError::Decode(format!(
            "{} colours for {} positions",
            colors.len(),
            positions.len()
        )));
    }

    let base = vertices.len() / STRIDE;
    let total = base + positions.len();
    if total > u16::MAX as usize + 1 {
        return Err(AssetError::TooManyVertices(total));
    }

    let rebased: Vec<u16> = match source_indices {
        Some(source) => source
            .into_iter()
            .map(|index| match index as usize {
                i if i < positions.len() => Ok((base + i) as u16),
                i => Err(AssetError::Decode(format!(
                    "index {} out of range for {} positions",
                    i,
                    positions.len()
                ))),
            })
            .collect::<Result<_, _>>()?,
        None => (base..total).map(|i| i as u16).collect(),
    };

    for (pos, color) in positions.iter().zip(colors.iter()) {
        vertices.extend_from_slice(&[
            pos[0], pos[1], pos[2],
            color[0], color[1], color[2],
        ]);
    }
    indices.extend(rebased);
    Ok(())
}

/// Accumulates shaded boxes and pyramids into one indexed mesh.
#[derive(Default)]
pub struct MeshBuilder {
    vertices: Vec<f32>,
    indices: Vec<u16>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_quad(&mut self, corners: [[f32; 3]; 4], color: [f32; 3], brightness: f32) {
        let base = (self.vertices.len() / STRIDE) as u16;
        let [r, g, b] = color.map(|c| c * brightness);
        for [x, y, z] in corners {
            self.vertices.extend_from_slice(&[x, y, z, r, g, b]);
        }
        self.indices.extend_from_slice(&[
            base, base + 1, base + 2,
            base, base + 2, base + 3,
        ]);
    }

    fn add_triangle(&mut self, corners: [[f32; 3]; 3], color: [f32; 3], brightness: f32) {
        let base = (self.vertices.len() / STRIDE) as u16;
        let [r, g, b] = color.map(|c| c * brightness);
        for [x, y, z] in corners {
            self.vertices.extend_from_slice(&[x, y, z, r, g, b]);
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    /// Axis-aligned box; each face gets a fixed brightness to fake lighting.
    pub fn add_box(&mut self, center: [f32; 3], size: [f32; 3], color: [f32; 3]) -> &mut Self {
        let [ox, oy, oz] = center;
        let [hx, hy, hz] = size.map(|s| s / 2.0);
        let p = |x: f32, y: f32, z: f32| [ox + x, oy + y, oz + z];

        self.add_quad([p(-hx, -hy, hz), p(hx, -hy, hz), p(hx, hy, hz), p(-hx, hy, hz)], color, 0.9);
        self.add_quad([p(hx, -hy, -hz), p(-hx, -hy, -hz), p(-hx, hy, -hz), p(hx, hy, -hz)], color, 0.7);
        self.add_quad([p(-hx, hy, hz), p(hx, hy, hz), p(hx, hy, -hz), p(-hx, hy, -hz)], color, 1.1);
        self.add_quad([p(-hx, -hy, -hz), p(hx, -hy, -hz), p(hx, -hy, hz), p(-hx, -hy, hz)], color, 0.4);
        self.add_quad([p(hx, -hy, hz), p(hx, -hy, -hz), p(hx, hy, -hz), p(hx, hy, hz)], color, 0.8);
        self.add_quad([p(-hx, -hy, -hz), p(-hx, -hy, hz), p(-hx, hy, hz), p(-hx, hy, -hz)], color, 0.6);
        self
    }

    /// Square-based pyramid standing on `base_center`.
    pub fn add_pyramid(&mut self, base_center: [f32; 3], width: f32, height: f32, color: [f32; 3]) -> &mut Self {
        let [ox, oy, oz] = base_center;
        let h = width / 2.0;
        let apex = [ox, oy + height, oz];
        let c = |x: f32, z: f32| [ox + x, oy, oz + z];

        self.add_triangle([c(-h, h), c(h, h), apex], color, 0.9);
        self.add_triangle([c(h, h), c(h, -h), apex], color, 0.8);
        self.add_triangle([c(h, -h), c(-h, -h), apex], color, 0.7);
        self.add_triangle([c(-h, -h), c(-h, h), apex], color, 0.6);
        self.add_quad([c(-h, -h), c(h, -h), c(h, h), c(-h, h)], color, 0.4);
        self
    }

    pub fn build(self) -> Mesh {
        Mesh { vertices: self.vertices, indices: self.indices }
    }
}

pub fn placeholder_tree() -> Mesh {
    let mut b = MeshBuilder::new();
    b.add_box([0.0, 0.5, 0.0], [0.25, 1.0, 0.25], [0.35, 0.22, 0.12])
        .add_pyramid([0.0, 0.8, 0.0], 1.2, 1.4, [0.1, 0.35, 0.15])
        .add_pyramid([0.0, 1.5, 0.0], 0.9, 1.1, [0.12, 0.42, 0.18]);
    b.build()
}

pub fn placeholder_grass() -> Mesh {
    let mut b = MeshBuilder::new();
    for (x, z, h) in [(-0.15, 0.05, 0.35), (0.1, -0.1, 0.45), (0.05, 0.15, 0.3)] {
        b.add_pyramid([x, 0.0, z], 0.12, h, [0.25, 0.55, 0.2]);
    }
    b.build()
}

pub fn placeholder_rock() -> Mesh {
    let mut b = MeshBuilder::new();
    b.add_box([0.0, 0.0, 0.0], [1.0, 0.6, 0.8], [0.42, 0.4, 0.38])
        .add_box([0.15, 0.3, -0.05], [0.55, 0.3, 0.5], [0.48, 0.46, 0.44]);
    b.build()
}

pub fn spike() -> Mesh {
    let mut b = MeshBuilder::new();
    b.add_pyramid([0.0, -0.6, 0.0], 0.8, 1.2, [0.85, 0.15, 0.25]);
    b.build()
}

pub fn column() -> Mesh {
    let mut b = MeshBuilder::new();
    b.add_box([0.0, 0.0, 0.0], [0.6, 1.5, 0.6], [0.3, 0.75, 0.4]);
    b.build()
}

pub fn body() -> Mesh {
    let mut b = MeshBuilder::new();
    b.add_box([0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.35, 0.15, 0.55]);
    b.build()
}

pub fn head() -> Mesh {
    let mut b = MeshBuilder::new();
    b.add_box([0.0, 0.0, 0.0], [0.6, 0.6, 0.6], [0.4, 0.2, 0.6])
        .add_box([-0.15, 0.08, -0.31], [0.1, 0.1, 0.04], [1.0, 0.9, 0.2])
        .add_box([0.15, 0.08, -0.31], [0.1, 0.1, 0.04], [1.0, 0.9, 0.2]);
    b.build()
}

/// First-person cockpit: only what sits below and ahead of the eye.
pub fn placeholder_car() -> Mesh {
    let mut b = MeshBuilder::new();
    b.add_box([0.0, 0.0, -1.0], [1.8, 0.5, 2.2], [0.55, 0.08, 0.1])
        .add_box([0.0, 0.35, -0.2], [1.6, 0.2, 0.6], [0.1, 0.1, 0.12])
        .add_box([0.0, 0.6, -0.55], [1.5, 0.45, 0.06], [0.35, 0.45, 0.55])
        .add_box([-0.7, 0.1, -2.1], [0.3, 0.12, 0.05], [1.0, 1.0, 0.7])
        .add_box([0.7, 0.1, -2.1], [0.3, 0.12, 0.05], [1.0, 1.0, 0.7]);
    b.build()
}

pub fn placeholder_motorcycle() -> Mesh {
    let mut b = MeshBuilder::new();
    b.add_box([0.0, 0.0, -0.6], [0.3, 0.25, 1.2], [0.15, 0.15, 0.18])
        .add_box([0.0, 0.25, -1.0], [0.9, 0.06, 0.06], [0.6, 0.6, 0.62])
        .add_box([0.0, 0.3, -1.15], [0.25, 0.18, 0.08], [0.2, 0.2, 0.25])
        .add_box([0.0, 0.22, -1.22], [0.16, 0.12, 0.04], [1.0, 1.0, 0.7])
        .add_box([0.0, -0.25, -1.4], [0.12, 0.55, 0.55], [0.08, 0.08, 0.08]);
    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(mesh: &Mesh) {
        assert_eq!(mesh.vertices.len() % STRIDE, 0);
        assert_eq!(mesh.indices.len() % 3, 0);
        let count = mesh.vertex_count();
        assert!(mesh.indices.iter().all(|&i| (i as usize) < count));
    }

    #[test]
    fn box_has_six_shaded_faces() {
        let cube = Mesh::cube(2.0, 1.0, 0.5, 0.25);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert_well_formed(&cube);
        for v in cube.vertices.chunks(STRIDE) {
            assert!(v[0].abs() == 1.0 && v[1].abs() == 1.0 && v[2].abs() == 1.0);
        }
        // top face is the brightest
        let top = cube.vertices.chunks(STRIDE).nth(8).unwrap();
        assert!((top[3] - 1.1).abs() < 1e-6);
    }

    #[test]
    fn builder_offsets_boxes() {
        let mut b = MeshBuilder::new();
        b.add_box([10.0, 0.0, 0.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]);
        let mesh = b.build();
        assert!(mesh.vertices.chunks(STRIDE).all(|v| (v[0] - 10.0).abs() <= 0.5));
    }

    #[test]
    fn pyramid_apex_is_on_top() {
        let mut b = MeshBuilder::new();
        b.add_pyramid([0.0, 0.0, 0.0], 1.0, 2.0, [1.0, 0.0, 0.0]);
        let mesh = b.build();
        assert_well_formed(&mesh);
        let top = mesh.vertices.chunks(STRIDE).map(|v| v[1]).fold(f32::MIN, f32::max);
        assert_eq!(top, 2.0);
    }

    #[test]
    fn placeholders_are_well_formed() {
        for mesh in [
            placeholder_tree(),
            placeholder_grass(),
            placeholder_rock(),
            spike(),
            column(),
            body(),
            head(),
            placeholder_car(),
            placeholder_motorcycle(),
        ] {
            assert!(!mesh.indices.is_empty());
            assert_well_formed(&mesh);
        }
    }

    const TRIANGLE: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];

    #[test]
    fn primitives_are_rebased_and_default_to_white() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        append_primitive(&mut vertices, &mut indices, &TRIANGLE, None, Some(vec![0, 1, 2])).unwrap();
        append_primitive(&mut vertices, &mut indices, &TRIANGLE, None, None).unwrap();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(vertices.len(), 6 * STRIDE);
        assert!(vertices.chunks(STRIDE).all(|v| v[3..] == [1.0, 1.0, 1.0]));
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        append_primitive(&mut vertices, &mut indices, &TRIANGLE, None, None).unwrap();
        // 3 would silently point into the previous primitive once rebased
        let result = append_primitive(&mut vertices, &mut indices, &TRIANGLE, None, Some(vec![0, 1, 3]));
        assert!(matches!(result, Err(AssetError::Decode(_))));

        let huge = append_primitive(&mut vertices, &mut indices, &TRIANGLE, None, Some(vec![0, 1, 70_000]));
        assert!(matches!(huge, Err(AssetError::Decode(_))));
        assert_eq!(indices.len(), 3);
        assert_eq!(vertices.len(), 3 * STRIDE);
    }

    #[test]
    fn short_colour_stream_is_rejected() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        let colors = Some(vec![[1.0, 0.0, 0.0]; 2]);
        let result = append_primitive(&mut vertices, &mut indices, &TRIANGLE, colors, None);
        assert!(matches!(result, Err(AssetError::Decode(_))));
        assert!(vertices.is_empty() && indices.is_empty());
    }

    #[test]
    fn vertex_overflow_is_reported() {
        let mut vertices = vec![0.0; (u16::MAX as usize - 1) * STRIDE];
        let mut indices = Vec::new();
        let result = append_primitive(&mut vertices, &mut indices, &TRIANGLE, None, None);
        assert!(matches!(result, Err(AssetError::TooManyVertices(65_537))));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        match Mesh::from_gltf(b"definitely not a glb") {
            Err(AssetError::Decode(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|m| m.vertex_count())),
        }
    }
}
