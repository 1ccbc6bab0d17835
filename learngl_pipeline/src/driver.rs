//! The slice of the graphics driver that building a program needs.
//!
//! Handles are plain copyable ids, like the `GLuint`s OpenGL hands out. Ownership of those ids is
//! tracked one level up, by [`CompiledShader`](crate::CompiledShader) and
//! [`Program`](crate::Program).

use std::fmt;

use thiserror::Error;

use crate::source::ShaderKind;

/// An error the driver reported while (or right after) running a call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[OpenGL Error] (0x{code:04X} {name}) {call} at {file}:{line}")]
pub struct DriverError {
    /// The raw error code, e.g. `0x0500` for `GL_INVALID_ENUM`.
    pub code: u32,
    /// The symbolic name of `code`, if the driver knows one.
    pub name: &'static str,
    /// Source text of the call that tripped the error.
    pub call: &'static str,
    pub file: &'static str,
    pub line: u32
}

pub type DriverResult<T> = Result<T, DriverError>;

pub trait Driver {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;

    fn create_shader(&self, kind: ShaderKind) -> DriverResult<Self::Shader>;
    fn shader_source(&self, shader: Self::Shader, source: &str) -> DriverResult<()>;
    fn compile_shader(&self, shader: Self::Shader) -> DriverResult<()>;
    fn compile_status(&self, shader: Self::Shader) -> DriverResult<bool>;
    fn shader_info_log(&self, shader: Self::Shader) -> DriverResult<String>;

    /// Release a shader object. Called from `Drop`, so it can't fail loudly.
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> DriverResult<Self::Program>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) -> DriverResult<()>;
    fn link_program(&self, program: Self::Program) -> DriverResult<()>;
    fn link_status(&self, program: Self::Program) -> DriverResult<bool>;
    fn validate_program(&self, program: Self::Program) -> DriverResult<()>;
    fn validate_status(&self, program: Self::Program) -> DriverResult<bool>;
    fn program_info_log(&self, program: Self::Program) -> DriverResult<String>;

    fn delete_program(&self, program: Self::Program);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn driver_error_names_the_call_site() {
        let err = DriverError {
            code: 0x0501,
            name: "INVALID_VALUE",
            call: "gl::Uniform1i(location, value)",
            file: "src/graphics/shader.rs",
            line: 42
        };

        assert_eq!(
            err.to_string(),
            "[OpenGL Error] (0x0501 INVALID_VALUE) gl::Uniform1i(location, value) at src/graphics/shader.rs:42"
        );
    }
}
