//! [`pipeline::Driver`] on top of the real OpenGL API.

use std::ffi::CString;

use gl;
use gl::types::*;

use pipeline::{Driver, DriverError, ShaderKind};

use super::utils::{check_release, info_log_to_string, GlResult};

/// The OpenGL context that's current on this thread.
///
/// Holds no state: every call goes straight to the loaded `gl` function pointers, so it only works
/// after `gl::load_with` and only on the thread that owns the context.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlDriver;

impl GlDriver {
    fn shader_type(kind: ShaderKind) -> GLenum {
        match kind {
            ShaderKind::Vertex => gl::VERTEX_SHADER,
            ShaderKind::Fragment => gl::FRAGMENT_SHADER
        }
    }

    fn shader_param(shader: GLuint, param: GLenum) -> GlResult<GLint> {
        let mut value = 0;
        gl_call!(gl::GetShaderiv(shader, param, &mut value))?;
        Ok(value)
    }

    fn program_param(program: GLuint, param: GLenum) -> GlResult<GLint> {
        let mut value = 0;
        gl_call!(gl::GetProgramiv(program, param, &mut value))?;
        Ok(value)
    }
}

impl Driver for GlDriver {
    type Shader = GLuint;
    type Program = GLuint;

    fn create_shader(&self, kind: ShaderKind) -> GlResult<GLuint> {
        gl_call!(gl::CreateShader(Self::shader_type(kind)))
    }

    fn shader_source(&self, shader: GLuint, source: &str) -> GlResult<()> {
        // Length is passed explicitly, so the source needn't be NUL-terminated
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        gl_call!(gl::ShaderSource(shader, 1, &ptr, &len))
    }

    fn compile_shader(&self, shader: GLuint) -> GlResult<()> {
        gl_call!(gl::CompileShader(shader))
    }

    fn compile_status(&self, shader: GLuint) -> GlResult<bool> {
        Ok(Self::shader_param(shader, gl::COMPILE_STATUS)? == gl::TRUE as GLint)
    }

    fn shader_info_log(&self, shader: GLuint) -> GlResult<String> {
        let len = Self::shader_param(shader, gl::INFO_LOG_LENGTH)?;
        let mut buf = vec![0u8; len.max(1) as usize];
        let mut written = 0;
        gl_call!(gl::GetShaderInfoLog(shader, buf.len() as GLsizei, &mut written, buf.as_mut_ptr() as *mut GLchar))?;

        Ok(info_log_to_string(buf, written))
    }

    fn delete_shader(&self, shader: GLuint) {
        check_release("shader", shader, gl_call!(gl::DeleteShader(shader)));
    }

    fn create_program(&self) -> GlResult<GLuint> {
        gl_call!(gl::CreateProgram())
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) -> GlResult<()> {
        gl_call!(gl::AttachShader(program, shader))
    }

    fn link_program(&self, program: GLuint) -> GlResult<()> {
        gl_call!(gl::LinkProgram(program))
    }

    fn link_status(&self, program: GLuint) -> GlResult<bool> {
        Ok(Self::program_param(program, gl::LINK_STATUS)? == gl::TRUE as GLint)
    }

    fn validate_program(&self, program: GLuint) -> GlResult<()> {
        gl_call!(gl::ValidateProgram(program))
    }

    fn validate_status(&self, program: GLuint) -> GlResult<bool> {
        Ok(Self::program_param(program, gl::VALIDATE_STATUS)? == gl::TRUE as GLint)
    }

    fn program_info_log(&self, program: GLuint) -> GlResult<String> {
        let len = Self::program_param(program, gl::INFO_LOG_LENGTH)?;
        let mut buf = vec![0u8; len.max(1) as usize];
        let mut written = 0;
        gl_call!(gl::GetProgramInfoLog(program, buf.len() as GLsizei, &mut written, buf.as_mut_ptr() as *mut GLchar))?;

        Ok(info_log_to_string(buf, written))
    }

    fn delete_program(&self, program: GLuint) {
        check_release("program", program, gl_call!(gl::DeleteProgram(program)));
    }
}

impl GlDriver {
    /// Looks up a uniform in a linked program. `-1` means the program has no active uniform by
    /// that name.
    pub fn uniform_location(&self, program: GLuint, name: &str) -> GlResult<GLint> {
        let name = CString::new(name).map_err(|_| DriverError {
            code: gl::INVALID_VALUE,
            name: "INVALID_VALUE",
            call: "CString::new(name)",
            file: file!(),
            line: line!()
        })?;

        gl_call!(gl::GetUniformLocation(program, name.as_ptr()))
    }

    pub fn use_program(&self, program: GLuint) -> GlResult<()> {
        gl_call!(gl::UseProgram(program))
    }
}
