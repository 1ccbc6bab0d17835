//! A simple set of wrappers around the OpenGL API.
//!
//! Each wrapper owns exactly one OpenGL object: it creates the object when built, binds and
//! unbinds it on request, and deletes it when dropped. There's no pooling or sharing; if two
//! things need the same buffer, they borrow the wrapper.
//!
//! Obviously, a knowledge of OpenGL is *necessary* to understand any of this. [Learn OpenGL][learnopengl]
//! is a classic set of tutorials on the concepts, and [docs.gl][docsgl] documents every call used
//! here.
//!
//! [learnopengl]: https://learnopengl.com/
//! [docsgl]: http://docs.gl/

use std::ffi::c_void;
use std::mem::size_of;
use std::path::Path;
use std::ptr::null;

use gl;
use gl::types::*;
use thiserror::Error;

use pipeline::DriverError;

use super::shader::GlShader;
use super::utils::{check_release, GlResult};

/// Owns a [vertex buffer object (VBO)][vbo]: interleaved vertex attributes (positions, texture
/// coordinates, whatever the layout says) stored on the graphics card.
///
/// [vbo]: https://en.wikipedia.org/wiki/Vertex_buffer_object
pub struct GlVertexBuffer {
    id: GLuint
}

impl GlVertexBuffer {
    pub fn id(&self) -> GLuint { self.id }

    pub fn init(data: &[f32]) -> GlResult<Self> {
        let vbo = Self::generate()?;
        vbo.bind()?;
        gl_call!(gl::BufferData(
            gl::ARRAY_BUFFER,
            (data.len() * size_of::<f32>()) as GLsizeiptr,
            data.as_ptr() as *const c_void,
            gl::STATIC_DRAW
        ))?;

        Ok(vbo)
    }

    pub fn generate() -> GlResult<Self> {
        let mut id = 0;
        gl_call!(gl::GenBuffers(1, &mut id))?;
        Ok(Self { id })
    }

    pub fn bind(&self) -> GlResult<()> {
        gl_call!(gl::BindBuffer(gl::ARRAY_BUFFER, self.id))
    }

    pub fn unbind(&self) -> GlResult<()> {
        gl_call!(gl::BindBuffer(gl::ARRAY_BUFFER, 0))
    }
}

impl Drop for GlVertexBuffer {
    fn drop(&mut self) {
        check_release("vertex buffer", self.id, gl_call!(gl::DeleteBuffers(1, &self.id)));
    }
}

/// Owns an index buffer (`GL_ELEMENT_ARRAY_BUFFER`). Triangles name their corners by index, so the
/// quad's two triangles share two vertices instead of uploading six.
pub struct GlElementBuffer {
    id: GLuint,
    count: usize
}

impl GlElementBuffer {
    pub fn id(&self) -> GLuint { self.id }

    /// Number of indices in the buffer.
    pub fn count(&self) -> usize { self.count }

    pub fn init(data: &[u32]) -> GlResult<Self> {
        let mut id = 0;
        gl_call!(gl::GenBuffers(1, &mut id))?;

        let ebo = Self { id, count: data.len() };
        ebo.bind()?;
        gl_call!(gl::BufferData(
            gl::ELEMENT_ARRAY_BUFFER,
            (data.len() * size_of::<u32>()) as GLsizeiptr,
            data.as_ptr() as *const c_void,
            gl::STATIC_DRAW
        ))?;

        Ok(ebo)
    }

    pub fn bind(&self) -> GlResult<()> {
        gl_call!(gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, self.id))
    }

    pub fn unbind(&self) -> GlResult<()> {
        gl_call!(gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0))
    }
}

impl Drop for GlElementBuffer {
    fn drop(&mut self) {
        check_release("element buffer", self.id, gl_call!(gl::DeleteBuffers(1, &self.id)));
    }
}

/// A Rust type that can be a component of a vertex attribute.
pub trait VertexComponent {
    const GL_TYPE: GLenum;
    const NORMALIZED: GLboolean;
}

impl VertexComponent for f32 {
    const GL_TYPE: GLenum = gl::FLOAT;
    const NORMALIZED: GLboolean = gl::FALSE;
}

impl VertexComponent for u32 {
    const GL_TYPE: GLenum = gl::UNSIGNED_INT;
    const NORMALIZED: GLboolean = gl::FALSE;
}

impl VertexComponent for u8 {
    const GL_TYPE: GLenum = gl::UNSIGNED_BYTE;
    const NORMALIZED: GLboolean = gl::TRUE;
}

/// One attribute of a vertex layout, as passed to [gl::VertexAttribPointer][glvertexattribpointer]
/// when a vertex array reads it out of the interleaved data.
///
/// [glvertexattribpointer]: http://docs.gl/gl3/glVertexAttribPointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlVertexAttribute {
    pub index: GLuint,
    pub size: GLint,
    pub kind: GLenum,
    pub normalized: GLboolean,
    pub stride: GLsizei,
    pub start: usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LayoutElement {
    kind: GLenum,
    count: GLint,
    normalized: GLboolean,
    bytes: usize
}

/// Describes how the vertices in a buffer are laid out, one attribute after another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlVertexLayout {
    elements: Vec<LayoutElement>,
    stride: usize
}

impl GlVertexLayout {
    pub fn new() -> Self { Self::default() }

    /// Appends an attribute made of `count` components of type `T`.
    pub fn push<T: VertexComponent>(&mut self, count: GLint) -> &mut Self {
        let bytes = count as usize * size_of::<T>();
        self.elements.push(LayoutElement {
            kind: T::GL_TYPE,
            count,
            normalized: T::NORMALIZED,
            bytes
        });
        self.stride += bytes;

        self
    }

    /// Size of one whole vertex in bytes.
    pub fn stride(&self) -> usize { self.stride }

    pub fn attributes(&self) -> Vec<GlVertexAttribute> {
        let mut start = 0;
        self.elements.iter()
            .enumerate()
            .map(|(i, e)| {
                let attribute = GlVertexAttribute {
                    index: i as GLuint,
                    size: e.count,
                    kind: e.kind,
                    normalized: e.normalized,
                    stride: self.stride as GLsizei,
                    start
                };
                start += e.bytes;
                attribute
            })
            .collect()
    }
}

/// A vertex array object: remembers which buffer the vertex attributes come from and how to
/// read them, so drawing only needs this bound.
pub struct GlVertexArray {
    id: GLuint
}

impl GlVertexArray {
    pub fn id(&self) -> GLuint { self.id }

    pub fn generate() -> GlResult<Self> {
        let mut id = 0;
        gl_call!(gl::GenVertexArrays(1, &mut id))?;
        Ok(Self { id })
    }

    pub fn add_buffer(&self, vbo: &GlVertexBuffer, layout: &GlVertexLayout) -> GlResult<()> {
        self.bind()?;
        vbo.bind()?;

        for attribute in layout.attributes() {
            gl_call!(gl::EnableVertexAttribArray(attribute.index))?;
            gl_call!(gl::VertexAttribPointer(
                attribute.index,
                attribute.size,
                attribute.kind,
                attribute.normalized,
                attribute.stride,
                attribute.start as *const c_void
            ))?;
        }

        Ok(())
    }

    pub fn bind(&self) -> GlResult<()> {
        gl_call!(gl::BindVertexArray(self.id))
    }

    pub fn unbind(&self) -> GlResult<()> {
        gl_call!(gl::BindVertexArray(0))
    }
}

impl Drop for GlVertexArray {
    fn drop(&mut self) {
        check_release("vertex array", self.id, gl_call!(gl::DeleteVertexArrays(1, &self.id)));
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("error loading texture {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError
    },

    #[error(transparent)]
    Driver(#[from] DriverError)
}

/// A 2D RGBA texture. The fragment shader samples it through the `u_Texture` sampler, bound to
/// whichever texture unit `bind` was given.
pub struct GlTexture {
    id: GLuint,
    width: u32,
    height: u32
}

impl GlTexture {
    pub fn id(&self) -> GLuint { self.id }

    pub fn size(&self) -> (u32, u32) { (self.width, self.height) }

    /// Loads an image file into an RGBA8 texture.
    ///
    /// Images are stored top row first but OpenGL puts texture row 0 at the bottom, so the image
    /// is flipped while loading.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let pixels = image::open(path)
            .map_err(|source| TextureError::Image { path: path.display().to_string(), source })?
            .flipv()
            .to_rgba8();
        let (width, height) = pixels.dimensions();

        let mut id = 0;
        gl_call!(gl::GenTextures(1, &mut id))?;
        let texture = GlTexture { id, width, height };

        gl_call!(gl::BindTexture(gl::TEXTURE_2D, id))?;
        gl_call!(gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint))?;
        gl_call!(gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint))?;
        gl_call!(gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint))?;
        gl_call!(gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint))?;

        gl_call!(gl::TexImage2D(
            gl::TEXTURE_2D,
            0,
            gl::RGBA8 as GLint,
            width as GLsizei,
            height as GLsizei,
            0,
            gl::RGBA,
            gl::UNSIGNED_BYTE,
            pixels.as_raw().as_ptr() as *const c_void
        ))?;
        texture.unbind()?;

        log::debug!("loaded {}x{} texture {} from {}", width, height, id, path.display());

        Ok(texture)
    }

    /// Binds the texture to texture unit `slot`.
    pub fn bind(&self, slot: u32) -> GlResult<()> {
        gl_call!(gl::ActiveTexture(gl::TEXTURE0 + slot))?;
        gl_call!(gl::BindTexture(gl::TEXTURE_2D, self.id))
    }

    pub fn unbind(&self) -> GlResult<()> {
        gl_call!(gl::BindTexture(gl::TEXTURE_2D, 0))
    }
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        check_release("texture", self.id, gl_call!(gl::DeleteTextures(1, &self.id)));
    }
}

/// Clears the screen and issues draw calls.
#[derive(Debug, Default)]
pub struct GlRenderer {
    depth: bool
}

impl GlRenderer {
    pub fn new() -> Self { Self::default() }

    /// A renderer that also clears the depth buffer and turns on depth testing.
    pub fn with_depth() -> GlResult<Self> {
        gl_call!(gl::Enable(gl::DEPTH_TEST))?;
        Ok(Self { depth: true })
    }

    pub fn clear(&self) -> GlResult<()> {
        let mut mask = gl::COLOR_BUFFER_BIT;
        if self.depth {
            mask |= gl::DEPTH_BUFFER_BIT;
        }

        gl_call!(gl::Clear(mask))
    }

    pub fn draw(&self, vao: &GlVertexArray, ebo: &GlElementBuffer, shader: &GlShader) -> GlResult<()> {
        shader.bind()?;
        vao.bind()?;
        ebo.bind()?;

        gl_call!(gl::DrawElements(
            gl::TRIANGLES,
            ebo.count() as GLsizei,
            gl::UNSIGNED_INT,
            null()
        ))
    }
}

/// Turns on standard alpha blending.
pub fn enable_blending() -> GlResult<()> {
    gl_call!(gl::Enable(gl::BLEND))?;
    gl_call!(gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA))
}

pub fn set_viewport(width: u32, height: u32) -> GlResult<()> {
    gl_call!(gl::Viewport(0, 0, width as GLsizei, height as GLsizei))
}
