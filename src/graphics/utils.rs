use std::ffi::CStr;
use std::os::raw::c_char;

use gl;
use gl::types::*;

use pipeline::DriverError;

pub type GlResult<T> = Result<T, DriverError>;

/// Runs an OpenGL call and checks the error flag afterwards.
///
/// Any errors already pending are cleared first, so whatever turns up belongs to this call. Every
/// error that turns up is logged with the call's source text and location, and the first one is
/// returned. Evaluates to `GlResult<T>` where `T` is the call's return type.
macro_rules! gl_call {
    ($call:expr) => {{
        $crate::graphics::utils::clear_errors();
        #[allow(unused_unsafe)]
        let value = unsafe { $call };
        $crate::graphics::utils::check_errors(stringify!($call), file!(), line!()).map(|_| value)
    }};
}

/// Reports a failed delete. Called from `Drop`, where the error can't be returned. Returns whether
/// the object leaked.
pub fn check_release(what: &str, id: GLuint, result: GlResult<()>) -> bool {
    match result {
        Ok(()) => false,
        Err(e) => {
            log::warn!("leaking {} {}: {}", what, id, e);
            true
        }
    }
}

pub fn clear_errors() {
    unsafe {
        while gl::GetError() != gl::NO_ERROR {}
    }
}

pub fn check_errors(call: &'static str, file: &'static str, line: u32) -> GlResult<()> {
    let mut first = None;

    loop {
        let code = unsafe { gl::GetError() };
        if code == gl::NO_ERROR {
            break;
        }

        let err = DriverError { code, name: error_name(code), call, file, line };
        log::error!("{}", err);

        first.get_or_insert(err);
    }

    match first {
        Some(err) => Err(err),
        None => Ok(())
    }
}

pub fn error_name(code: GLenum) -> &'static str {
    match code {
        gl::INVALID_ENUM => "INVALID_ENUM",
        gl::INVALID_VALUE => "INVALID_VALUE",
        gl::INVALID_OPERATION => "INVALID_OPERATION",
        gl::STACK_OVERFLOW => "STACK_OVERFLOW",
        gl::STACK_UNDERFLOW => "STACK_UNDERFLOW",
        gl::OUT_OF_MEMORY => "OUT_OF_MEMORY",
        gl::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
        _ => "UNKNOWN"
    }
}

/// Reads one of the strings from `glGetString`, e.g. `gl::VERSION`.
pub fn get_string(name: GLenum) -> GlResult<String> {
    let ptr = gl_call!(gl::GetString(name))?;

    if ptr.is_null() {
        return Ok(String::new());
    }

    Ok(unsafe { CStr::from_ptr(ptr as *const c_char) }
        .to_string_lossy()
        .into_owned())
}

/// Turns a buffer filled in by one of the `Get*InfoLog` calls into a string, dropping the NUL
/// terminator and anything after it.
pub fn info_log_to_string(mut buf: Vec<u8>, written: GLsizei) -> String {
    buf.truncate(written.max(0) as usize);
    if let Some(nul) = buf.iter().position(|&b| b == 0) {
        buf.truncate(nul);
    }

    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn failed_release_is_reported_as_a_leak() {
        let err = DriverError {
            code: gl::INVALID_VALUE,
            name: "INVALID_VALUE",
            call: "gl::DeleteBuffers(1, &self.id)",
            file: "src/graphics/opengl.rs",
            line: 70
        };

        assert!(check_release("vertex buffer", 3, Err(err)));
        assert!(!check_release("vertex buffer", 3, Ok(())));
    }

    #[test]
    fn names_known_error_codes() {
        assert_eq!(error_name(0x0500), "INVALID_ENUM");
        assert_eq!(error_name(0x0502), "INVALID_OPERATION");
        assert_eq!(error_name(0x0506), "INVALID_FRAMEBUFFER_OPERATION");
        assert_eq!(error_name(0x1234), "UNKNOWN");
    }

    #[test]
    fn info_log_stops_at_written_length() {
        let buf = b"0:3(1): error: syntax error\0garbage".to_vec();

        assert_eq!(info_log_to_string(buf.clone(), 27), "0:3(1): error: syntax error");
        assert_eq!(info_log_to_string(buf, 35), "0:3(1): error: syntax error");
        assert_eq!(info_log_to_string(vec![], 0), "");
    }
}
