//! File: scene.rs
//! The two things this program knows how to draw: a flat textured quad and a spinning textured
//! cube. Geometry and matrices are plain data so they can be checked without a GL context.

use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec3};

use crate::graphics::opengl::{
    GlElementBuffer, GlRenderer, GlVertexArray, GlVertexBuffer, GlVertexLayout
};
use crate::graphics::shader::GlShader;
use crate::graphics::utils::GlResult;

/// Side length of the quad, in pixels.
pub const QUAD_SIZE: f32 = 256.0;

const FIELD_OF_VIEW: f32 = 45.0;
const CUBE_DISTANCE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    Quad,
    Cube
}

impl FromStr for SceneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quad" => Ok(SceneKind::Quad),
            "cube" => Ok(SceneKind::Cube),
            _ => Err(format!("unknown scene \"{}\" (expected \"quad\" or \"cube\")", s))
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneKind::Quad => f.write_str("quad"),
            SceneKind::Cube => f.write_str("cube")
        }
    }
}

/// Vertex and index data for a mesh, and how the vertices are laid out.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub layout: GlVertexLayout
}

impl Geometry {
    /// Number of floats per vertex.
    pub fn vertex_len(&self) -> usize {
        self.layout.stride() / std::mem::size_of::<f32>()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.vertex_len()
    }

    /// A `QUAD_SIZE` square with its bottom-left corner at the origin.
    ///
    /// Each vertex is a 2D position followed by texture coordinates.
    pub fn quad() -> Self {
        let vertices = vec![
            // Position                 Texture
            0.0,       0.0,             0.0, 0.0,
            QUAD_SIZE, 0.0,             1.0, 0.0,
            QUAD_SIZE, QUAD_SIZE,       1.0, 1.0,
            0.0,       QUAD_SIZE,       0.0, 1.0
        ];

        let indices = vec![
            0, 1, 2,
            2, 3, 0
        ];

        let mut layout = GlVertexLayout::new();
        layout.push::<f32>(2).push::<f32>(2);

        Geometry { vertices, indices, layout }
    }

    /// A unit cube centered on the origin, with the whole texture on every face.
    ///
    /// Faces don't share vertices since each corner needs different texture coordinates per
    /// face. Corners go counter-clockwise when the face is seen from outside.
    pub fn cube() -> Self {
        const FACES: [[[f32; 3]; 4]; 6] = [
            // front
            [[-0.5, -0.5,  0.5], [ 0.5, -0.5,  0.5], [ 0.5,  0.5,  0.5], [-0.5,  0.5,  0.5]],
            // back
            [[ 0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5,  0.5, -0.5], [ 0.5,  0.5, -0.5]],
            // left
            [[-0.5, -0.5, -0.5], [-0.5, -0.5,  0.5], [-0.5,  0.5,  0.5], [-0.5,  0.5, -0.5]],
            // right
            [[ 0.5, -0.5,  0.5], [ 0.5, -0.5, -0.5], [ 0.5,  0.5, -0.5], [ 0.5,  0.5,  0.5]],
            // top
            [[-0.5,  0.5,  0.5], [ 0.5,  0.5,  0.5], [ 0.5,  0.5, -0.5], [-0.5,  0.5, -0.5]],
            // bottom
            [[-0.5, -0.5, -0.5], [ 0.5, -0.5, -0.5], [ 0.5, -0.5,  0.5], [-0.5, -0.5,  0.5]]
        ];
        const TEX_COORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut vertices = Vec::with_capacity(6 * 4 * 5);
        let mut indices = Vec::with_capacity(6 * 6);

        for (n, face) in FACES.iter().enumerate() {
            for (corner, uv) in face.iter().zip(TEX_COORDS.iter()) {
                vertices.extend_from_slice(corner);
                vertices.extend_from_slice(uv);
            }

            let base = (n * 4) as u32;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        let mut layout = GlVertexLayout::new();
        layout.push::<f32>(3).push::<f32>(2);

        Geometry { vertices, indices, layout }
    }

    pub fn for_scene(kind: SceneKind) -> Self {
        match kind {
            SceneKind::Quad => Self::quad(),
            SceneKind::Cube => Self::cube()
        }
    }
}

/// Projection for a framebuffer of the given size.
///
/// The quad is drawn in pixel coordinates with the origin at the bottom left; the cube gets a
/// perspective projection.
pub fn projection(kind: SceneKind, width: u32, height: u32) -> Mat4 {
    let (width, height) = (width.max(1) as f32, height.max(1) as f32);

    match kind {
        SceneKind::Quad => Mat4::orthographic_rh_gl(0.0, width, 0.0, height, -1.0, 1.0),
        SceneKind::Cube => Mat4::perspective_rh_gl(
            FIELD_OF_VIEW.to_radians(),
            width / height,
            0.1,
            100.0
        )
    }
}

/// View times model, `elapsed` seconds into the run.
pub fn model_view(kind: SceneKind, elapsed: f32) -> Mat4 {
    match kind {
        SceneKind::Quad => Mat4::IDENTITY,
        SceneKind::Cube => {
            let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -CUBE_DISTANCE));
            let model = Mat4::from_rotation_y(elapsed) * Mat4::from_rotation_x(elapsed * 0.5);
            view * model
        }
    }
}

/// Ramps the red channel of the tint up and down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    value: f32,
    increment: f32
}

impl Pulse {
    pub const STEP: f32 = 0.01;

    pub fn new() -> Self {
        Pulse { value: 0.0, increment: Self::STEP }
    }

    pub fn value(&self) -> f32 { self.value }

    pub fn step(&mut self) {
        self.value += self.increment;

        if self.value > 1.0 {
            self.increment = -Self::STEP;
        } else if self.value < 0.0 {
            self.increment = Self::STEP;
        }
    }

    /// The tint for the current value.
    pub fn color(&self) -> [f32; 4] {
        [self.value, 0.3, 0.8, 1.0]
    }
}

impl Default for Pulse {
    fn default() -> Self { Self::new() }
}

/// Geometry uploaded to the graphics card.
pub struct Mesh {
    vao: GlVertexArray,
    vbo: GlVertexBuffer,
    ebo: GlElementBuffer
}

impl Mesh {
    pub fn upload(geometry: &Geometry) -> GlResult<Self> {
        let vao = GlVertexArray::generate()?;
        let vbo = GlVertexBuffer::init(&geometry.vertices)?;
        vao.add_buffer(&vbo, &geometry.layout)?;

        // Bound while the vertex array is, so the array remembers it
        let ebo = GlElementBuffer::init(&geometry.indices)?;

        vao.unbind()?;
        vbo.unbind()?;
        ebo.unbind()?;

        Ok(Mesh { vao, vbo, ebo })
    }
}

pub struct Scene {
    kind: SceneKind,
    mesh: Mesh,
    renderer: GlRenderer,
    projection: Mat4
}

impl Scene {
    pub fn new(kind: SceneKind, width: u32, height: u32) -> GlResult<Self> {
        let geometry = Geometry::for_scene(kind);
        let mesh = Mesh::upload(&geometry)?;
        let renderer = match kind {
            SceneKind::Quad => GlRenderer::new(),
            SceneKind::Cube => GlRenderer::with_depth()?
        };

        log::debug!(
            "uploaded {} scene: {} vertices in buffer {}, {} indices in buffer {}, vertex array {}",
            kind, geometry.vertex_count(), mesh.vbo.id(), mesh.ebo.count(), mesh.ebo.id(), mesh.vao.id()
        );

        Ok(Scene { kind, mesh, renderer, projection: projection(kind, width, height) })
    }

    pub fn kind(&self) -> SceneKind { self.kind }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection = projection(self.kind, width, height);
    }

    pub fn mvp(&self, elapsed: f32) -> Mat4 {
        self.projection * model_view(self.kind, elapsed)
    }

    pub fn clear(&self) -> GlResult<()> {
        self.renderer.clear()
    }

    pub fn draw(&self, shader: &GlShader) -> GlResult<()> {
        self.renderer.draw(&self.mesh.vao, &self.mesh.ebo, shader)
    }
}
