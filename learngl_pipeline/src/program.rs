//! Compiling shader stages and linking them into a program.
//!
//! Both kinds of driver object are wrapped in owning handles that delete themselves when dropped,
//! so nothing leaks when a step fails halfway through.

use std::fmt;

use thiserror::Error;

use crate::driver::{Driver, DriverError};
use crate::source::{ShaderKind, ShaderSources};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to compile {kind} shader:\n{log}")]
    Compile { kind: ShaderKind, log: String },

    #[error("expected a {expected} shader, got a {found} shader")]
    WrongStage { expected: ShaderKind, found: ShaderKind },

    #[error("failed to link program:\n{log}")]
    Link { log: String },

    #[error(transparent)]
    Driver(#[from] DriverError)
}

/// A successfully compiled shader stage.
pub struct CompiledShader<'d, D: Driver> {
    driver: &'d D,
    handle: D::Shader,
    kind: ShaderKind
}

impl<'d, D: Driver> CompiledShader<'d, D> {
    pub fn handle(&self) -> D::Shader { self.handle }

    pub fn kind(&self) -> ShaderKind { self.kind }
}

impl<'d, D: Driver> fmt::Debug for CompiledShader<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledShader")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<'d, D: Driver> Drop for CompiledShader<'d, D> {
    fn drop(&mut self) {
        self.driver.delete_shader(self.handle);
    }
}

/// A linked program, ready to be bound for drawing.
pub struct Program<'d, D: Driver> {
    driver: &'d D,
    handle: D::Program
}

impl<'d, D: Driver> Program<'d, D> {
    pub fn handle(&self) -> D::Program { self.handle }

    pub fn driver(&self) -> &'d D { self.driver }
}

impl<'d, D: Driver> fmt::Debug for Program<'d, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("handle", &self.handle)
            .finish()
    }
}

impl<'d, D: Driver> Drop for Program<'d, D> {
    fn drop(&mut self) {
        self.driver.delete_program(self.handle);
    }
}

/// Compiles `source` as a `kind` shader.
///
/// If the driver rejects the source, its info log is logged and returned in the error, and the
/// shader object is deleted before returning.
pub fn compile<'d, D: Driver>(
    driver: &'d D,
    kind: ShaderKind,
    source: &str
) -> Result<CompiledShader<'d, D>, BuildError> {
    let shader = CompiledShader {
        driver,
        handle: driver.create_shader(kind)?,
        kind
    };

    driver.shader_source(shader.handle, source)?;
    driver.compile_shader(shader.handle)?;

    if !driver.compile_status(shader.handle)? {
        let log = driver.shader_info_log(shader.handle)?;
        log::error!("failed to compile {} shader\n{}", kind, log);

        return Err(BuildError::Compile { kind, log });
    }

    log::debug!("compiled {} shader {:?}", kind, shader.handle);

    Ok(shader)
}

/// Links a vertex and a fragment stage into a program.
///
/// The stages are consumed: once linked they aren't needed, so they are deleted whether linking
/// worked or not. A failed validation is only logged.
pub fn link<'d, D: Driver>(
    vertex: CompiledShader<'d, D>,
    fragment: CompiledShader<'d, D>
) -> Result<Program<'d, D>, BuildError> {
    for (stage, expected) in [(&vertex, ShaderKind::Vertex), (&fragment, ShaderKind::Fragment)].iter() {
        if stage.kind != *expected {
            return Err(BuildError::WrongStage { expected: *expected, found: stage.kind });
        }
    }

    let driver = vertex.driver;
    let program = Program {
        driver,
        handle: driver.create_program()?
    };

    driver.attach_shader(program.handle, vertex.handle)?;
    driver.attach_shader(program.handle, fragment.handle)?;
    driver.link_program(program.handle)?;

    if !driver.link_status(program.handle)? {
        let log = driver.program_info_log(program.handle)?;
        log::error!("failed to link program\n{}", log);

        return Err(BuildError::Link { log });
    }

    driver.validate_program(program.handle)?;
    if !driver.validate_status(program.handle)? {
        let log = driver.program_info_log(program.handle)?;
        log::warn!("program {:?} failed validation\n{}", program.handle, log);
    }

    log::debug!("linked program {:?}", program.handle);

    Ok(program)
}

/// Compiles both stages of `sources` and links them.
pub fn build<'d, D: Driver>(driver: &'d D, sources: &ShaderSources) -> Result<Program<'d, D>, BuildError> {
    let vertex = compile(driver, ShaderKind::Vertex, &sources.vertex)?;
    let fragment = compile(driver, ShaderKind::Fragment, &sources.fragment)?;

    link(vertex, fragment)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::driver::DriverResult;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        CreateShader(ShaderKind, u32),
        DeleteShader(u32),
        CreateProgram(u32),
        Attach(u32, u32),
        Link(u32),
        Validate(u32),
        DeleteProgram(u32)
    }

    /// Records every call and rejects whatever it's told to.
    #[derive(Default)]
    struct FakeDriver {
        next_id: Cell<u32>,
        calls: RefCell<Vec<Call>>,
        kinds: RefCell<Vec<(u32, ShaderKind)>>,
        reject: Option<ShaderKind>,
        fail_link: bool,
        fail_validate: bool,
        fail_create_program: bool
    }

    impl FakeDriver {
        fn next(&self) -> u32 {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            id
        }

        fn record(&self, call: Call) {
            self.calls.borrow_mut().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn deleted_shaders(&self) -> Vec<u32> {
            self.calls().into_iter()
                .filter_map(|c| match c { Call::DeleteShader(id) => Some(id), _ => None })
                .collect()
        }

        fn deleted_programs(&self) -> Vec<u32> {
            self.calls().into_iter()
                .filter_map(|c| match c { Call::DeleteProgram(id) => Some(id), _ => None })
                .collect()
        }

        fn driver_error(call: &'static str) -> DriverError {
            DriverError { code: 0x0505, name: "OUT_OF_MEMORY", call, file: file!(), line: line!() }
        }
    }

    impl Driver for FakeDriver {
        type Shader = u32;
        type Program = u32;

        fn create_shader(&self, kind: ShaderKind) -> DriverResult<u32> {
            let id = self.next();
            self.kinds.borrow_mut().push((id, kind));
            self.record(Call::CreateShader(kind, id));
            Ok(id)
        }

        fn shader_source(&self, _shader: u32, _source: &str) -> DriverResult<()> { Ok(()) }

        fn compile_shader(&self, _shader: u32) -> DriverResult<()> { Ok(()) }

        fn compile_status(&self, shader: u32) -> DriverResult<bool> {
            let kind = self.kinds.borrow().iter()
                .find(|(id, _)| *id == shader)
                .map(|(_, kind)| *kind);

            Ok(kind != self.reject)
        }

        fn shader_info_log(&self, shader: u32) -> DriverResult<String> {
            Ok(format!("0:1({}): error: syntax error", shader))
        }

        fn delete_shader(&self, shader: u32) {
            self.record(Call::DeleteShader(shader));
        }

        fn create_program(&self) -> DriverResult<u32> {
            if self.fail_create_program {
                return Err(Self::driver_error("create_program()"));
            }

            let id = self.next();
            self.record(Call::CreateProgram(id));
            Ok(id)
        }

        fn attach_shader(&self, program: u32, shader: u32) -> DriverResult<()> {
            self.record(Call::Attach(program, shader));
            Ok(())
        }

        fn link_program(&self, program: u32) -> DriverResult<()> {
            self.record(Call::Link(program));
            Ok(())
        }

        fn link_status(&self, _program: u32) -> DriverResult<bool> { Ok(!self.fail_link) }

        fn validate_program(&self, program: u32) -> DriverResult<()> {
            self.record(Call::Validate(program));
            Ok(())
        }

        fn validate_status(&self, _program: u32) -> DriverResult<bool> { Ok(!self.fail_validate) }

        fn program_info_log(&self, _program: u32) -> DriverResult<String> {
            Ok(String::from("error: vertex output v_TexCoord not read by fragment shader"))
        }

        fn delete_program(&self, program: u32) {
            self.record(Call::DeleteProgram(program));
        }
    }

    fn sources() -> ShaderSources {
        ShaderSources {
            vertex: String::from("void main() {}\n"),
            fragment: String::from("void main() {}\n")
        }
    }

    #[test]
    fn rejected_source_returns_error_and_deletes_shader() {
        let driver = FakeDriver { reject: Some(ShaderKind::Fragment), ..Default::default() };
        let err = compile(&driver, ShaderKind::Fragment, "not glsl").unwrap_err();

        match err {
            BuildError::Compile { kind, log } => {
                assert_eq!(kind, ShaderKind::Fragment);
                assert!(log.contains("syntax error"));
            },
            e => panic!("unexpected error: {}", e)
        }

        assert_eq!(driver.calls(), vec![
            Call::CreateShader(ShaderKind::Fragment, 1),
            Call::DeleteShader(1)
        ]);
    }

    #[test]
    fn compiled_shader_is_deleted_on_drop() {
        let driver = FakeDriver::default();
        let shader = compile(&driver, ShaderKind::Vertex, "void main() {}").unwrap();

        assert_eq!(shader.kind(), ShaderKind::Vertex);
        assert!(driver.deleted_shaders().is_empty());

        drop(shader);
        assert_eq!(driver.deleted_shaders(), vec![1]);
    }

    #[test]
    fn builds_program_and_deletes_stages() {
        let driver = FakeDriver::default();
        let program = build(&driver, &sources()).unwrap();

        assert_eq!(program.handle(), 3);
        assert_eq!(driver.calls()[..7], [
            Call::CreateShader(ShaderKind::Vertex, 1),
            Call::CreateShader(ShaderKind::Fragment, 2),
            Call::CreateProgram(3),
            Call::Attach(3, 1),
            Call::Attach(3, 2),
            Call::Link(3),
            Call::Validate(3)
        ]);

        // Stages go away as soon as the program is linked
        let mut deleted = driver.deleted_shaders();
        deleted.sort();
        assert_eq!(deleted, vec![1, 2]);
        assert_eq!(driver.calls().len(), 9);

        drop(program);
        assert_eq!(driver.deleted_programs(), vec![3]);
    }

    #[test]
    fn vertex_failure_stops_before_fragment() {
        let driver = FakeDriver { reject: Some(ShaderKind::Vertex), ..Default::default() };
        let err = build(&driver, &sources()).unwrap_err();

        assert!(matches!(err, BuildError::Compile { kind: ShaderKind::Vertex, .. }));
        assert_eq!(driver.calls(), vec![
            Call::CreateShader(ShaderKind::Vertex, 1),
            Call::DeleteShader(1)
        ]);
    }

    #[test]
    fn fragment_failure_still_deletes_vertex_stage() {
        let driver = FakeDriver { reject: Some(ShaderKind::Fragment), ..Default::default() };
        let err = build(&driver, &sources()).unwrap_err();

        assert!(matches!(err, BuildError::Compile { kind: ShaderKind::Fragment, .. }));

        let mut deleted = driver.deleted_shaders();
        deleted.sort();
        assert_eq!(deleted, vec![1, 2]);
        assert!(!driver.calls().iter().any(|c| matches!(c, Call::CreateProgram(_))));
    }

    #[test]
    fn link_failure_deletes_program_and_stages() {
        let driver = FakeDriver { fail_link: true, ..Default::default() };
        let err = build(&driver, &sources()).unwrap_err();

        match err {
            BuildError::Link { log } => assert!(log.contains("v_TexCoord")),
            e => panic!("unexpected error: {}", e)
        }

        assert_eq!(driver.deleted_programs(), vec![3]);

        let mut deleted = driver.deleted_shaders();
        deleted.sort();
        assert_eq!(deleted, vec![1, 2]);
    }

    #[test]
    fn failed_validation_is_not_an_error() {
        let driver = FakeDriver { fail_validate: true, ..Default::default() };
        let program = build(&driver, &sources()).unwrap();

        assert_eq!(program.handle(), 3);
        assert!(driver.deleted_programs().is_empty());
    }

    #[test]
    fn driver_error_is_propagated_and_stages_released() {
        let driver = FakeDriver { fail_create_program: true, ..Default::default() };
        let err = build(&driver, &sources()).unwrap_err();

        match err {
            BuildError::Driver(e) => assert_eq!(e.call, "create_program()"),
            e => panic!("unexpected error: {}", e)
        }

        assert_eq!(driver.deleted_shaders().len(), 2);
    }

    #[test]
    fn stages_must_be_passed_in_order() {
        let driver = FakeDriver::default();
        let vertex = compile(&driver, ShaderKind::Vertex, "").unwrap();
        let fragment = compile(&driver, ShaderKind::Fragment, "").unwrap();

        let err = link(fragment, vertex).unwrap_err();

        assert!(matches!(
            err,
            BuildError::WrongStage { expected: ShaderKind::Vertex, found: ShaderKind::Fragment }
        ));
        assert_eq!(driver.deleted_shaders().len(), 2);
    }
}
