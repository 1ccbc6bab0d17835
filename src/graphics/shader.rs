use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gl;
use gl::types::*;
use glam::Mat4;
use thiserror::Error;

use pipeline::{BuildError, Program, SourceError};

use super::driver::GlDriver;
use super::utils::GlResult;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("error building {}: {source}", path.display())]
    Build {
        path: PathBuf,
        #[source]
        source: BuildError
    }
}

/// A linked shader program loaded from a `.shader` file, plus a cache of its uniform locations.
pub struct GlShader<'d> {
    program: Program<'d, GlDriver>,
    path: PathBuf,
    uniforms: RefCell<HashMap<String, GLint>>
}

impl<'d> GlShader<'d> {
    pub fn from_file<P: AsRef<Path>>(driver: &'d GlDriver, path: P) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let sources = pipeline::load(path)?;
        let program = pipeline::build(driver, &sources)
            .map_err(|source| ShaderError::Build { path: path.to_path_buf(), source })?;

        log::info!("built shader program {} from {}", program.handle(), path.display());

        Ok(GlShader {
            program,
            path: path.to_path_buf(),
            uniforms: RefCell::new(HashMap::new())
        })
    }

    pub fn id(&self) -> GLuint { self.program.handle() }

    pub fn path(&self) -> &Path { &self.path }

    pub fn bind(&self) -> GlResult<()> {
        self.program.driver().use_program(self.id())
    }

    pub fn unbind(&self) -> GlResult<()> {
        self.program.driver().use_program(0)
    }

    pub fn set_uniform_1i(&self, name: &str, value: i32) -> GlResult<()> {
        let location = self.uniform_location(name)?;
        gl_call!(gl::Uniform1i(location, value))
    }

    pub fn set_uniform_4f(&self, name: &str, v0: f32, v1: f32, v2: f32, v3: f32) -> GlResult<()> {
        let location = self.uniform_location(name)?;
        gl_call!(gl::Uniform4f(location, v0, v1, v2, v3))
    }

    pub fn set_uniform_mat4(&self, name: &str, matrix: &Mat4) -> GlResult<()> {
        let location = self.uniform_location(name)?;
        let columns = matrix.to_cols_array();
        gl_call!(gl::UniformMatrix4fv(location, 1, gl::FALSE, columns.as_ptr()))
    }

    /// Looks `name` up once and remembers the answer. Unknown uniforms are warned about once and
    /// then cached as `-1`, which OpenGL silently ignores.
    fn uniform_location(&self, name: &str) -> GlResult<GLint> {
        if let Some(&location) = self.uniforms.borrow().get(name) {
            return Ok(location);
        }

        let location = self.program.driver().uniform_location(self.id(), name)?;
        if location == -1 {
            log::warn!("uniform '{}' doesn't exist in {}", name, self.path.display());
        }

        self.uniforms.borrow_mut().insert(name.to_string(), location);

        Ok(location)
    }
}
